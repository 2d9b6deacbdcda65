//! Glyph outline coverage.
//!
//! Outlines are collected in font units into a `tiny_skia` path and filled
//! into an 8-bit anti-aliased mask with the non-zero winding rule.

use resvg::tiny_skia::{FillRule, Mask, Path, PathBuilder, Transform};

/// Collects a glyph outline, in font units, as a fillable path.
#[derive(Debug, Default)]
pub(crate) struct OutlinePath {
    builder: PathBuilder,
}

impl OutlinePath {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// The collected path, or `None` for an empty outline.
    pub(crate) fn finish(self) -> Option<Path> {
        self.builder.finish()
    }
}

impl ttf_parser::OutlineBuilder for OutlinePath {
    fn move_to(&mut self, x: f32, y: f32) {
        self.builder.move_to(x, y);
    }

    fn line_to(&mut self, x: f32, y: f32) {
        self.builder.line_to(x, y);
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        self.builder.quad_to(x1, y1, x, y);
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        self.builder.cubic_to(x1, y1, x2, y2, x, y);
    }

    fn close(&mut self) {
        self.builder.close();
    }
}

/// Map font units to bitmap pixels: scale by `scale`, shift right by `dx`
/// and flip y so that the font baseline lands `top` rows down.
pub(crate) fn glyph_transform(scale: f64, dx: f64, top: f64) -> Transform {
    let scale = scale as f32;
    Transform::from_row(scale, 0.0, 0.0, -scale, dx as f32, top as f32)
}

/// Fraction of each pixel covered by `path` after `transform`.
///
/// Row-major, `width * height` values in `0.0..=1.0`.
pub(crate) fn coverage(path: &Path, transform: Transform, width: u32, height: u32) -> Vec<f64> {
    let Some(mut mask) = Mask::new(width, height) else {
        return vec![0.0; width as usize * height as usize];
    };
    mask.fill_path(path, FillRule::Winding, true, transform);
    mask.data().iter().map(|&a| f64::from(a) / 255.0).collect()
}
