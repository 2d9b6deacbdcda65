//! Unicode block lookup for scripts rendered locally.

use std::ops::RangeInclusive;

use crate::types::GlyphId;

/// Unicode blocks whose glyphs are synthesized locally instead of fetched.
///
/// These scripts have thousands of codepoints spread over dozens of ranges,
/// so fetching them remotely would cost one request per 256 characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnicodeBlock {
    /// CJK Unified Ideographs (U+4E00..U+9FFF).
    CjkUnifiedIdeographs,
    /// Hangul Syllables (U+AC00..U+D7AF).
    HangulSyllables,
    /// Hiragana (U+3040..U+309F).
    Hiragana,
    /// Katakana (U+30A0..U+30FF).
    Katakana,
}

impl UnicodeBlock {
    /// Blocks routed to local synthesis.
    pub const LOCAL_IDEOGRAPH_BLOCKS: [UnicodeBlock; 4] = [
        UnicodeBlock::CjkUnifiedIdeographs,
        UnicodeBlock::HangulSyllables,
        UnicodeBlock::Hiragana,
        UnicodeBlock::Katakana,
    ];

    /// The block's name as listed in the Unicode standard.
    pub fn name(self) -> &'static str {
        match self {
            UnicodeBlock::CjkUnifiedIdeographs => "CJK Unified Ideographs",
            UnicodeBlock::HangulSyllables => "Hangul Syllables",
            UnicodeBlock::Hiragana => "Hiragana",
            UnicodeBlock::Katakana => "Katakana",
        }
    }

    /// Codepoints covered by this block.
    pub fn codepoints(self) -> RangeInclusive<GlyphId> {
        match self {
            UnicodeBlock::CjkUnifiedIdeographs => 0x4E00..=0x9FFF,
            UnicodeBlock::HangulSyllables => 0xAC00..=0xD7AF,
            UnicodeBlock::Hiragana => 0x3040..=0x309F,
            UnicodeBlock::Katakana => 0x30A0..=0x30FF,
        }
    }

    /// Check whether `id` belongs to this block.
    #[inline]
    pub fn contains(self, id: GlyphId) -> bool {
        self.codepoints().contains(&id)
    }

    /// Find the locally rendered block containing `id`, if any.
    pub fn local_ideograph_block(id: GlyphId) -> Option<UnicodeBlock> {
        Self::LOCAL_IDEOGRAPH_BLOCKS
            .into_iter()
            .find(|block| block.contains(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_boundaries() {
        assert!(UnicodeBlock::CjkUnifiedIdeographs.contains(0x4E00));
        assert!(UnicodeBlock::CjkUnifiedIdeographs.contains(0x9FFF));
        assert!(!UnicodeBlock::CjkUnifiedIdeographs.contains(0xA000));
        assert!(UnicodeBlock::Hiragana.contains(0x3042)); // あ
        assert!(UnicodeBlock::Katakana.contains(0x30A2)); // ア
        assert!(UnicodeBlock::HangulSyllables.contains(0xD55C)); // 한
    }

    #[test]
    fn test_local_ideograph_block_lookup() {
        assert_eq!(
            UnicodeBlock::local_ideograph_block(0x4E2D),
            Some(UnicodeBlock::CjkUnifiedIdeographs)
        );
        assert_eq!(UnicodeBlock::local_ideograph_block('A' as u32), None);
        assert_eq!(UnicodeBlock::local_ideograph_block(0x3000), None);
    }
}
