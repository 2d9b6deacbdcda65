//! Glyph provisioning for Horizon Lattice map labels.
//!
//! Label rendering needs signed distance field bitmaps and metrics for every
//! character it lays out. This crate supplies them per font stack:
//!
//! - **Remote ranges**: glyphs are fetched from a glyph service in blocks of
//!   256 codepoints, one request per (stack, range) no matter how many
//!   callers are waiting on it.
//! - **Local synthesis**: ideographic scripts (CJK, Hangul, Hiragana,
//!   Katakana) can be drawn locally instead, as can glyphs the service
//!   confirms it does not have.
//! - **Caching**: every resolved glyph, present or absent, is remembered for
//!   the lifetime of the manager.
//!
//! # Getting Started
//!
//! ```no_run
//! use std::collections::HashMap;
//! use std::sync::Arc;
//! use horizon_lattice_glyphs::{GlyphManager, GlyphManagerConfig, GlyphRangeFetcher};
//!
//! # async fn example(fetcher: Arc<dyn GlyphRangeFetcher>) -> horizon_lattice_glyphs::GlyphResult<()> {
//! let config = GlyphManagerConfig::new()
//!     .with_service_url("https://tiles.example.com/fonts/{fontstack}/{range}.pbf")
//!     .with_local_ideograph_font_family("Noto Sans CJK SC");
//! let manager = GlyphManager::with_system_fonts(config, fetcher);
//!
//! let request = HashMap::from([("Open Sans Regular".to_string(), vec![0x48, 0x4E2D])]);
//! let glyphs = manager.get_glyphs(&request).await?;
//!
//! for (id, glyph) in &glyphs["Open Sans Regular"] {
//!     match glyph {
//!         Some(glyph) => println!("{id}: {}x{}", glyph.bitmap.width(), glyph.bitmap.height()),
//!         None => println!("{id}: not available"),
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Features
//!
//! - `tiny-sdf` (default): [`sdf::TinySdf`], a rasterizer drawing from fonts
//!   found with `fontdb`.
//! - `http`: [`http::HttpGlyphFetcher`], a `reqwest` based fetcher for
//!   glyph services serving protobuf ranges.

mod cache;
mod classify;
mod error;
mod fetch;
mod manager;
pub mod pbf;
mod synth;
mod types;
mod unicode_block;

#[cfg(feature = "http")]
pub mod http;
#[cfg(feature = "tiny-sdf")]
pub mod sdf;

pub use cache::{GlyphCache, GlyphCacheStats};
pub use classify::{GlyphRoute, classify, is_local_ideograph, range_bounds, range_index};
pub use error::{FetchError, GlyphError, GlyphResult};
pub use fetch::{GlyphRangeFetcher, glyph_range_url};
pub use manager::{GlyphManager, GlyphManagerConfig, SettledGlyphResponse};
pub use synth::{
    DEFAULT_BITMAP_SIZE, DEFAULT_GLYPH_ADVANCE, DEFAULT_GLYPH_LEFT, DEFAULT_GLYPH_SIZE,
    DEFAULT_GLYPH_TOP, FontWeight, LocalSynthesizer, RasterizedSdf, RasterizerFactory,
    RasterizerSpec, SdfOptions, SdfRasterizer, TOP_BASELINE_ADJUSTMENT,
};
pub use types::{
    AlphaImage, GLYPHS_PER_RANGE, GlyphId, GlyphMetrics, GlyphRange, GlyphRequest,
    GlyphResponse, MAX_GLYPH_ID, StyleGlyph,
};
pub use unicode_block::UnicodeBlock;
