//! Glyph data types shared by the fetch, synthesis and cache layers.

use std::collections::HashMap;

/// A glyph identifier: the Unicode codepoint the glyph renders.
///
/// Only the Basic Multilingual Plane (`0..=65535`) can be served remotely.
pub type GlyphId = u32;

/// Highest glyph id that can be fetched from a glyph service.
pub const MAX_GLYPH_ID: GlyphId = 65535;

/// Number of consecutive codepoints served by one remote range request.
pub const GLYPHS_PER_RANGE: u32 = 256;

/// A single-channel (alpha) image owned by its holder.
///
/// Glyph bitmaps are signed distance fields stored one byte per pixel,
/// row-major with no padding.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AlphaImage {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl AlphaImage {
    /// Create a zero-filled image.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; width as usize * height as usize],
        }
    }

    /// Create an image from raw samples.
    ///
    /// The sample buffer is zero-padded or truncated to `width * height` bytes.
    pub fn from_vec(width: u32, height: u32, mut data: Vec<u8>) -> Self {
        let expected = width as usize * height as usize;
        if data.len() != expected {
            tracing::warn!(
                width,
                height,
                len = data.len(),
                "alpha image data does not match its dimensions"
            );
            data.resize(expected, 0);
        }
        Self {
            width,
            height,
            data,
        }
    }

    /// Width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Check if this image has no pixels.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The raw samples.
    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Mutable access to the raw samples.
    #[inline]
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Sample at `(x, y)`, or `None` outside the image.
    pub fn get(&self, x: u32, y: u32) -> Option<u8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.data
            .get(y as usize * self.width as usize + x as usize)
            .copied()
    }

    /// Consume the image and return its samples.
    pub fn into_raw(self) -> Vec<u8> {
        self.data
    }
}

/// Layout metrics of a glyph, in pixels at the SDF font size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct GlyphMetrics {
    /// Width of the glyph box.
    pub width: u32,
    /// Height of the glyph box.
    pub height: u32,
    /// Horizontal bearing from the pen position.
    pub left: i32,
    /// Vertical bearing, relative to the glyph service origin.
    pub top: i32,
    /// Horizontal advance.
    pub advance: u32,
}

/// A renderable glyph: its id, SDF bitmap and layout metrics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleGlyph {
    /// The codepoint this glyph renders.
    pub id: GlyphId,
    /// The signed distance field bitmap.
    pub bitmap: AlphaImage,
    /// Layout metrics.
    pub metrics: GlyphMetrics,
}

impl StyleGlyph {
    /// Copy this glyph under a different id.
    ///
    /// The bitmap is a fresh allocation; metrics are plain values.
    pub fn with_id(&self, id: GlyphId) -> Self {
        Self {
            id,
            bitmap: self.bitmap.clone(),
            metrics: self.metrics,
        }
    }
}

/// The result of one range fetch: codepoint to glyph, `None` when the
/// service confirmed the glyph is not present.
pub type GlyphRange = HashMap<GlyphId, Option<StyleGlyph>>;

/// A batch request: font stack to the codepoints wanted from it.
pub type GlyphRequest = HashMap<String, Vec<GlyphId>>;

/// A batch response: font stack to codepoint to glyph.
///
/// Confirmed-absent glyphs are present as `None` rather than omitted.
pub type GlyphResponse = HashMap<String, HashMap<GlyphId, Option<StyleGlyph>>>;
