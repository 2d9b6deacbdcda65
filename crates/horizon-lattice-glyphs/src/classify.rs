//! Routing of glyph ids to remote ranges or local synthesis.

use std::ops::RangeInclusive;

use crate::types::{GLYPHS_PER_RANGE, GlyphId, MAX_GLYPH_ID};
use crate::unicode_block::UnicodeBlock;

/// Where a glyph id is resolved from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GlyphRoute {
    /// Rendered locally with the configured ideograph font family.
    LocalSynthesis,
    /// Fetched from the glyph service as part of the given range.
    RemoteRange(u32),
    /// Beyond the ranges the glyph service can serve.
    Unsupported,
}

/// Index of the 256-codepoint range containing `id`.
#[inline]
pub fn range_index(id: GlyphId) -> u32 {
    id / GLYPHS_PER_RANGE
}

/// First and last codepoint of a range.
#[inline]
pub fn range_bounds(range: u32) -> RangeInclusive<GlyphId> {
    let begin = range.saturating_mul(GLYPHS_PER_RANGE);
    begin..=begin.saturating_add(GLYPHS_PER_RANGE - 1)
}

/// Check whether `id` is rendered locally when local synthesis is enabled.
#[inline]
pub fn is_local_ideograph(id: GlyphId, local_synthesis: bool) -> bool {
    local_synthesis && UnicodeBlock::local_ideograph_block(id).is_some()
}

/// Decide how a glyph id is resolved.
///
/// `local_synthesis` is whether a local ideograph font family is configured.
pub fn classify(id: GlyphId, local_synthesis: bool) -> GlyphRoute {
    if is_local_ideograph(id, local_synthesis) {
        return GlyphRoute::LocalSynthesis;
    }

    let range = range_index(id);
    if u64::from(range) * u64::from(GLYPHS_PER_RANGE) > u64::from(MAX_GLYPH_ID) {
        return GlyphRoute::Unsupported;
    }

    GlyphRoute::RemoteRange(range)
}
