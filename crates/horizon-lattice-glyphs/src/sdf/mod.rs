//! Signed distance field rasterization of system fonts.
//!
//! [`TinySdf`] draws one glyph at a time into a small alpha bitmap whose
//! samples encode the distance to the glyph outline: values above
//! `255 * (1 - cutoff)` are inside, values fall off over `radius` pixels.
//! Faces are located with `fontdb`, outlines read with `ttf-parser` and
//! filled with `tiny_skia` before the distance transform.

mod edt;
mod raster;

use std::sync::Arc;

use fontdb::{Database, Family, Query};

use crate::synth::{RasterizedSdf, RasterizerFactory, RasterizerSpec, SdfOptions, SdfRasterizer};
use crate::types::GlyphId;

use self::edt::{EdtScratch, INF, edt};
use self::raster::{OutlinePath, coverage, glyph_transform};

/// A signed distance field glyph rasterizer for one font face.
pub struct TinySdf {
    db: Arc<Database>,
    face: Option<fontdb::ID>,
    options: SdfOptions,
}

impl TinySdf {
    /// Create a rasterizer for the face best matching `spec`.
    ///
    /// Falls back to the database's sans-serif family. If no face matches at
    /// all, every draw reports an empty result.
    pub fn new(db: Arc<Database>, spec: &RasterizerSpec) -> Self {
        let families = [Family::Name(&spec.font_family), Family::SansSerif];
        let query = Query {
            families: &families,
            weight: fontdb::Weight(spec.font_weight.value()),
            stretch: fontdb::Stretch::Normal,
            style: fontdb::Style::Normal,
        };
        let face = db.query(&query);
        if face.is_none() {
            tracing::warn!(
                family = %spec.font_family,
                weight = spec.font_weight.value(),
                "no font face found for local glyph rasterization"
            );
        }

        Self {
            db,
            face,
            options: spec.options,
        }
    }

    /// Whether a font face was found.
    pub fn has_face(&self) -> bool {
        self.face.is_some()
    }

    /// Side length of the drawing canvas.
    pub fn size(&self) -> u32 {
        self.options.font_size + 4 * self.options.buffer
    }

    fn render(&self, face: &ttf_parser::Face<'_>, glyph: ttf_parser::GlyphId) -> RasterizedSdf {
        let SdfOptions {
            font_size, buffer, ..
        } = self.options;
        let scale = f64::from(font_size) / f64::from(face.units_per_em());
        let limit = self.size().saturating_sub(buffer);

        let mut outline = OutlinePath::new();
        let bbox = face.outline_glyph(glyph, &mut outline);
        let advance = face
            .glyph_hor_advance(glyph)
            .map_or(0, |advance| (f64::from(advance) * scale).round() as u32);

        let (ascent, descent, ink_left, ink_width) = bbox.map_or((0.0, 0.0, 0.0, 0.0), |rect| {
            (
                f64::from(rect.y_max) * scale,
                -f64::from(rect.y_min) * scale,
                f64::from(rect.x_min) * scale,
                f64::from(rect.width()) * scale,
            )
        });

        let glyph_top = ascent.ceil() as i32;
        let glyph_width = ink_width.ceil().clamp(0.0, f64::from(limit)) as u32;
        let glyph_height = (glyph_top + descent.ceil() as i32).clamp(0, limit as i32) as u32;
        let width = glyph_width + 2 * buffer;
        let height = glyph_height + 2 * buffer;

        let data = match outline.finish() {
            Some(path) if glyph_width > 0 && glyph_height > 0 => {
                let transform = glyph_transform(scale, -ink_left, f64::from(glyph_top));
                let alpha = coverage(&path, transform, glyph_width, glyph_height);
                distance_field(&alpha, glyph_width as usize, glyph_height as usize, &self.options)
            }
            _ => vec![0; (width * height) as usize],
        };

        RasterizedSdf {
            width: Some(width),
            height: Some(height),
            data: Some(data),
            glyph_width: Some(glyph_width),
            glyph_height: Some(glyph_height),
            glyph_left: Some(0),
            glyph_top: Some(glyph_top),
            glyph_advance: Some(advance),
        }
    }
}

impl SdfRasterizer for TinySdf {
    fn draw(&self, id: GlyphId) -> RasterizedSdf {
        let (Some(face_id), Some(ch)) = (self.face, char::from_u32(id)) else {
            return RasterizedSdf::default();
        };

        self.db
            .with_face_data(face_id, |data, index| {
                let face = ttf_parser::Face::parse(data, index).ok()?;
                let glyph = face.glyph_index(ch)?;
                Some(self.render(&face, glyph))
            })
            .flatten()
            .unwrap_or_else(|| {
                tracing::debug!(id, "glyph not available in local font");
                RasterizedSdf::default()
            })
    }
}

impl std::fmt::Debug for TinySdf {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TinySdf")
            .field("face", &self.face)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

/// Convert glyph coverage to a distance field bitmap.
///
/// `alpha` covers the `glyph_width` x `glyph_height` glyph box; the result
/// adds `buffer` pixels on every side.
fn distance_field(
    alpha: &[f64],
    glyph_width: usize,
    glyph_height: usize,
    options: &SdfOptions,
) -> Vec<u8> {
    let buffer = options.buffer as usize;
    let width = glyph_width + 2 * buffer;
    let height = glyph_height + 2 * buffer;
    let len = width * height;

    let mut outer = vec![INF; len];
    let mut inner = vec![0.0; len];
    for y in 0..glyph_height {
        for x in 0..glyph_width {
            let a = alpha[y * glyph_width + x];
            if a == 0.0 {
                continue;
            }
            let j = (y + buffer) * width + x + buffer;
            if a >= 1.0 {
                outer[j] = 0.0;
                inner[j] = INF;
            } else {
                let d = 0.5 - a;
                outer[j] = if d > 0.0 { d * d } else { 0.0 };
                inner[j] = if d < 0.0 { d * d } else { 0.0 };
            }
        }
    }

    let mut scratch = EdtScratch::new(width.max(height));
    edt(&mut outer, 0, 0, width, height, width, &mut scratch);
    edt(
        &mut inner,
        buffer,
        buffer,
        glyph_width,
        glyph_height,
        width,
        &mut scratch,
    );

    outer
        .iter()
        .zip(&inner)
        .map(|(&o, &i)| {
            let d = o.sqrt() - i.sqrt();
            (255.0 - 255.0 * (d / options.radius + options.cutoff))
                .round()
                .clamp(0.0, 255.0) as u8
        })
        .collect()
}

/// Builds [`TinySdf`] rasterizers from a shared font database.
pub struct TinySdfFactory {
    db: Arc<Database>,
}

impl TinySdfFactory {
    /// Create a factory drawing from `db`.
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Create a factory drawing from the fonts installed on the system.
    ///
    /// Loading system fonts may take around a second.
    pub fn with_system_fonts() -> Self {
        let mut db = Database::new();
        db.load_system_fonts();
        tracing::info!(faces = db.len(), "loaded system fonts for glyph synthesis");
        Self::new(Arc::new(db))
    }

    /// The font database.
    pub fn database(&self) -> &Database {
        &self.db
    }
}

impl RasterizerFactory for TinySdfFactory {
    fn create(&self, spec: &RasterizerSpec) -> Arc<dyn SdfRasterizer> {
        Arc::new(TinySdf::new(Arc::clone(&self.db), spec))
    }
}

impl std::fmt::Debug for TinySdfFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TinySdfFactory")
            .field("faces", &self.db.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synth::FontWeight;

    fn spec() -> RasterizerSpec {
        RasterizerSpec {
            options: SdfOptions::default(),
            font_family: "Noto Sans CJK SC".into(),
            font_weight: FontWeight::NORMAL,
        }
    }

    #[test]
    fn test_empty_database_draws_nothing() {
        let factory = TinySdfFactory::new(Arc::new(Database::new()));
        let rasterizer = factory.create(&spec());
        assert_eq!(rasterizer.draw(0x4E2D), RasterizedSdf::default());

        let sdf = TinySdf::new(Arc::new(Database::new()), &spec());
        assert!(!sdf.has_face());
        assert_eq!(sdf.size(), 36);
    }

    #[test]
    fn test_distance_field_of_box() {
        let options = SdfOptions::default();
        let (w, h) = (6, 6);
        // A 4x4 filled square inside an empty one pixel ring.
        let alpha: Vec<f64> = (0..w * h)
            .map(|i| {
                let (x, y) = (i % w, i / w);
                if (1..5).contains(&x) && (1..5).contains(&y) { 1.0 } else { 0.0 }
            })
            .collect();
        let field = distance_field(&alpha, w, h, &options);

        let width = w + 6;
        assert_eq!(field.len(), width * (h + 6));

        // One pixel inside the outline.
        let edge = field[4 * width + 4];
        assert_eq!(edge, 223);

        // Two pixels inside reaches the top of the range.
        let center = field[5 * width + 5];
        assert_eq!(center, 255);

        // Outside the glyph values drop below the edge threshold.
        let outside = field[0];
        assert!(outside < 191);
        let corner_distance = 32.0_f64.sqrt();
        assert_eq!(
            outside,
            (255.0 - 255.0 * (corner_distance / 8.0 + 0.25)).round() as u8
        );
    }

    #[test]
    fn test_distance_field_partial_coverage() {
        let options = SdfOptions::default();
        let alpha = vec![0.5];
        let field = distance_field(&alpha, 1, 1, &options);
        // Half covered: no inside or outside distance at the pixel itself.
        assert_eq!(field[3 * 7 + 3], (255.0 - 255.0 * 0.25_f64).round() as u8);
    }
}
