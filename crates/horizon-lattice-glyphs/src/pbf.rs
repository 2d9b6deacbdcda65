//! Decoding of glyph range protobufs as served by map glyph services.
//!
//! The payload is a `glyphs` message holding one `fontstack` per stack, each
//! with the glyphs of one range. Bitmaps carry a 3 pixel SDF border on every
//! side that is not counted in the glyph's width and height.

use prost::Message;

use crate::classify::range_bounds;
use crate::error::FetchError;
use crate::types::{AlphaImage, GlyphMetrics, GlyphRange, StyleGlyph};

/// SDF border around every served glyph bitmap, in pixels.
pub const GLYPH_PBF_BORDER: u32 = 3;

/// Largest glyph box width or height accepted from a payload, in pixels.
pub const MAX_GLYPH_PBF_SIZE: u32 = 255;

#[derive(Clone, PartialEq, Message)]
struct GlyphsMessage {
    #[prost(message, repeated, tag = "1")]
    stacks: Vec<FontStackMessage>,
}

#[derive(Clone, PartialEq, Message)]
struct FontStackMessage {
    #[prost(string, optional, tag = "1")]
    name: Option<String>,
    #[prost(string, optional, tag = "2")]
    range: Option<String>,
    #[prost(message, repeated, tag = "3")]
    glyphs: Vec<GlyphMessage>,
}

#[derive(Clone, PartialEq, Message)]
struct GlyphMessage {
    #[prost(uint32, optional, tag = "1")]
    id: Option<u32>,
    #[prost(bytes = "vec", optional, tag = "2")]
    bitmap: Option<Vec<u8>>,
    #[prost(uint32, optional, tag = "3")]
    width: Option<u32>,
    #[prost(uint32, optional, tag = "4")]
    height: Option<u32>,
    #[prost(sint32, optional, tag = "5")]
    left: Option<i32>,
    #[prost(sint32, optional, tag = "6")]
    top: Option<i32>,
    #[prost(uint32, optional, tag = "7")]
    advance: Option<u32>,
}

impl GlyphMessage {
    fn into_style_glyph(self, id: u32) -> Result<StyleGlyph, FetchError> {
        let width = self.width.unwrap_or(0);
        let height = self.height.unwrap_or(0);
        if width > MAX_GLYPH_PBF_SIZE || height > MAX_GLYPH_PBF_SIZE {
            return Err(FetchError::Decode(format!(
                "glyph {id} has a {width}x{height} box, larger than {MAX_GLYPH_PBF_SIZE}px"
            )));
        }

        let bitmap = if width == 0 || height == 0 {
            AlphaImage::default()
        } else {
            let size = |n: u32| n + 2 * GLYPH_PBF_BORDER;
            match self.bitmap {
                Some(data) => AlphaImage::from_vec(size(width), size(height), data),
                None => AlphaImage::new(size(width), size(height)),
            }
        };

        Ok(StyleGlyph {
            id,
            bitmap,
            metrics: GlyphMetrics {
                width,
                height,
                left: self.left.unwrap_or(0),
                top: self.top.unwrap_or(0),
                advance: self.advance.unwrap_or(0),
            },
        })
    }
}

/// Decode the glyphs of `range` from a glyph protobuf.
///
/// Every codepoint of the range is present in the result; codepoints the
/// payload does not contain map to `None`. Glyphs outside the range and
/// glyphs without an id are skipped. A glyph box wider or taller than
/// [`MAX_GLYPH_PBF_SIZE`] fails the whole range.
pub fn decode_glyph_range(bytes: &[u8], range: u32) -> Result<GlyphRange, FetchError> {
    let message =
        GlyphsMessage::decode(bytes).map_err(|err| FetchError::Decode(err.to_string()))?;

    let bounds = range_bounds(range);
    let mut glyphs: GlyphRange = bounds.clone().map(|id| (id, None)).collect();

    for stack in message.stacks {
        for glyph in stack.glyphs {
            let Some(id) = glyph.id else {
                continue;
            };
            if !bounds.contains(&id) {
                tracing::warn!(
                    stack = stack.name.as_deref().unwrap_or_default(),
                    range,
                    id,
                    "glyph payload contains a glyph outside the requested range"
                );
                continue;
            }
            glyphs.insert(id, Some(glyph.into_style_glyph(id)?));
        }
    }

    Ok(glyphs)
}
