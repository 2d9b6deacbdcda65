//! Local glyph synthesis with a signed distance field rasterizer.
//!
//! Glyphs for scripts with very large repertoires (and glyphs the glyph
//! service does not have) are drawn locally. A rasterizer is expensive to
//! build, so one is created per font stack and reused; its font weight is
//! derived from the stack name.
//!
//! Rasterizer output is loosely specified: any field may be missing. The
//! conversion to a [`StyleGlyph`] in [`RasterizedSdf::into_style_glyph`] is the
//! single place where the documented defaults are applied.

use std::sync::Arc;

use crate::error::{GlyphError, GlyphResult};
use crate::types::{AlphaImage, GlyphId, GlyphMetrics, StyleGlyph};

/// Bitmap width and height used when the rasterizer reports none.
pub const DEFAULT_BITMAP_SIZE: u32 = 30;
/// Glyph box width and height used when the rasterizer reports none.
pub const DEFAULT_GLYPH_SIZE: u32 = 24;
/// Left bearing used when the rasterizer reports none.
pub const DEFAULT_GLYPH_LEFT: i32 = 0;
/// Advance used when the rasterizer reports none.
pub const DEFAULT_GLYPH_ADVANCE: u32 = 24;
/// Top bearing used when the rasterizer reports none.
pub const DEFAULT_GLYPH_TOP: i32 = -8;
/// Subtracted from the rasterizer's top bearing.
///
/// Local glyphs measure `top` from the alphabetic baseline while served glyphs
/// measure it from an origin above the em box. This value sits between the
/// DIN Pro and Arial Unicode origins, closer to Arial Unicode.
pub const TOP_BASELINE_ADJUSTMENT: i32 = 25;

/// Font weight used for local rasterization (100-900).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FontWeight(pub u16);

impl FontWeight {
    /// Extra-light weight (200).
    pub const EXTRA_LIGHT: Self = Self(200);
    /// Normal/regular weight (400).
    pub const NORMAL: Self = Self(400);
    /// Medium weight (500).
    pub const MEDIUM: Self = Self(500);
    /// Black/heavy weight (900).
    pub const BLACK: Self = Self(900);

    /// Derive the weight from a font stack name.
    ///
    /// Matching is a case-insensitive substring test, checked in the order
    /// bold, medium, light.
    pub fn from_stack(stack: &str) -> Self {
        let stack = stack.to_lowercase();
        if stack.contains("bold") {
            Self::BLACK
        } else if stack.contains("medium") {
            Self::MEDIUM
        } else if stack.contains("light") {
            Self::EXTRA_LIGHT
        } else {
            Self::NORMAL
        }
    }

    /// Get the numeric weight value.
    pub const fn value(self) -> u16 {
        self.0
    }
}

impl Default for FontWeight {
    fn default() -> Self {
        Self::NORMAL
    }
}

/// Rasterization parameters shared by every local rasterizer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SdfOptions {
    /// Font size in pixels.
    pub font_size: u32,
    /// Padding around the glyph box, in pixels.
    pub buffer: u32,
    /// Distance, in pixels, covered by the full range of SDF values.
    pub radius: f64,
    /// Fraction of the value range reserved for the inside of the glyph.
    pub cutoff: f64,
}

impl Default for SdfOptions {
    fn default() -> Self {
        Self {
            font_size: 24,
            buffer: 3,
            radius: 8.0,
            cutoff: 0.25,
        }
    }
}

/// Everything needed to construct one rasterizer.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterizerSpec {
    /// Rasterization parameters.
    pub options: SdfOptions,
    /// Font family to draw with.
    pub font_family: String,
    /// Font weight to draw with.
    pub font_weight: FontWeight,
}

/// Raw rasterizer output. Any field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RasterizedSdf {
    /// Bitmap width in pixels.
    pub width: Option<u32>,
    /// Bitmap height in pixels.
    pub height: Option<u32>,
    /// Raw alpha samples, row-major.
    pub data: Option<Vec<u8>>,
    /// Glyph box width.
    pub glyph_width: Option<u32>,
    /// Glyph box height.
    pub glyph_height: Option<u32>,
    /// Glyph left bearing.
    pub glyph_left: Option<i32>,
    /// Glyph top bearing, measured from the alphabetic baseline.
    pub glyph_top: Option<i32>,
    /// Glyph horizontal advance.
    pub glyph_advance: Option<u32>,
}

impl RasterizedSdf {
    /// Convert to a [`StyleGlyph`], applying defaults and the baseline adjustment.
    ///
    /// A field reported as zero counts as missing, so a blank glyph still gets
    /// a default glyph box and advance.
    pub fn into_style_glyph(self, id: GlyphId) -> StyleGlyph {
        let width = or_default(self.width, DEFAULT_BITMAP_SIZE);
        let height = or_default(self.height, DEFAULT_BITMAP_SIZE);
        let bitmap = match self.data {
            Some(data) => AlphaImage::from_vec(width, height, data),
            None => AlphaImage::new(width, height),
        };

        StyleGlyph {
            id,
            bitmap,
            metrics: GlyphMetrics {
                width: or_default(self.glyph_width, DEFAULT_GLYPH_SIZE),
                height: or_default(self.glyph_height, DEFAULT_GLYPH_SIZE),
                left: or_default(self.glyph_left, DEFAULT_GLYPH_LEFT),
                top: or_default(
                    self.glyph_top.map(|top| top - TOP_BASELINE_ADJUSTMENT),
                    DEFAULT_GLYPH_TOP,
                ),
                advance: or_default(self.glyph_advance, DEFAULT_GLYPH_ADVANCE),
            },
        }
    }
}

fn or_default<T: Default + PartialEq>(value: Option<T>, default: T) -> T {
    value.filter(|v| *v != T::default()).unwrap_or(default)
}

/// Draws single glyphs as signed distance fields.
///
/// Drawing only reads the rasterizer's font configuration, so one instance
/// may serve concurrent requests.
pub trait SdfRasterizer: Send + Sync {
    /// Draw the glyph for `id`.
    fn draw(&self, id: GlyphId) -> RasterizedSdf;
}

/// Builds rasterizers on demand.
pub trait RasterizerFactory: Send + Sync {
    /// Construct a rasterizer for the given family, weight and parameters.
    fn create(&self, spec: &RasterizerSpec) -> Arc<dyn SdfRasterizer>;
}

/// Produces locally drawn glyphs for a configured font family.
#[derive(Clone)]
pub struct LocalSynthesizer {
    font_family: Option<String>,
    options: SdfOptions,
    factory: Option<Arc<dyn RasterizerFactory>>,
}

impl LocalSynthesizer {
    /// Create a synthesizer.
    ///
    /// Synthesis is available only when both a font family and a factory are set.
    pub fn new(
        font_family: Option<String>,
        options: SdfOptions,
        factory: Option<Arc<dyn RasterizerFactory>>,
    ) -> Self {
        Self {
            font_family,
            options,
            factory,
        }
    }

    /// Whether ideographic scripts are routed to local synthesis.
    #[inline]
    pub fn routes_ideographs(&self) -> bool {
        self.font_family.is_some()
    }

    /// The configured local font family.
    pub fn font_family(&self) -> Option<&str> {
        self.font_family.as_deref()
    }

    /// Rasterization parameters.
    pub fn options(&self) -> SdfOptions {
        self.options
    }

    /// Describe the rasterizer to build for `stack`.
    pub fn spec_for(&self, stack: &str) -> GlyphResult<RasterizerSpec> {
        let font_family = self
            .font_family
            .clone()
            .ok_or(GlyphError::SynthesisUnavailable)?;
        Ok(RasterizerSpec {
            options: self.options,
            font_family,
            font_weight: FontWeight::from_stack(stack),
        })
    }

    /// Build a rasterizer for `stack`.
    pub fn build_rasterizer(&self, stack: &str) -> GlyphResult<Arc<dyn SdfRasterizer>> {
        let factory = self
            .factory
            .as_ref()
            .ok_or(GlyphError::SynthesisUnavailable)?;
        let spec = self.spec_for(stack)?;
        tracing::info!(
            stack,
            family = %spec.font_family,
            weight = spec.font_weight.value(),
            "building local glyph rasterizer"
        );
        Ok(factory.create(&spec))
    }

    /// Draw `id` with `rasterizer`.
    pub fn synthesize(&self, rasterizer: &dyn SdfRasterizer, id: GlyphId) -> StyleGlyph {
        rasterizer.draw(id).into_style_glyph(id)
    }
}

impl std::fmt::Debug for LocalSynthesizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalSynthesizer")
            .field("font_family", &self.font_family)
            .field("options", &self.options)
            .field("has_factory", &self.factory.is_some())
            .finish()
    }
}
