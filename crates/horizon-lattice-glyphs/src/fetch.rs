//! The remote glyph range fetcher seam.

use futures_util::future::BoxFuture;

use crate::classify::range_bounds;
use crate::error::FetchError;
use crate::types::GlyphRange;

/// Fetches one 256-codepoint glyph range for one font stack.
///
/// The returned map is keyed by absolute codepoint. A `None` value means the
/// service confirmed the glyph does not exist. Errors are reported for the
/// whole range; retries, if any, are the implementation's business.
///
/// The future must be `'static` because the fetch runs on its own task and
/// completes even if every caller that wanted it has gone away.
pub trait GlyphRangeFetcher: Send + Sync {
    /// Fetch `range` of `stack` from the service at `url`.
    ///
    /// `url` is the configured template; see [`glyph_range_url`].
    fn fetch(
        &self,
        stack: &str,
        range: u32,
        url: &str,
    ) -> BoxFuture<'static, Result<GlyphRange, FetchError>>;
}

/// Expand a glyph URL template for one range.
///
/// `{fontstack}` is replaced with the stack name and `{range}` with
/// `"<first>-<last>"` codepoints of the range.
pub fn glyph_range_url(template: &str, stack: &str, range: u32) -> String {
    let bounds = range_bounds(range);
    template
        .replace("{fontstack}", stack)
        .replace("{range}", &format!("{}-{}", bounds.start(), bounds.end()))
}
