//! Resolve the glyphs of a string from a glyph service.
//!
//! Run with:
//! cargo run -p horizon-lattice-glyphs --features http --example fetch_glyphs -- \
//!     "https://tiles.example.com/fonts/{fontstack}/{range}.pbf" "Open Sans Regular" "Hello 世界"

use std::collections::HashMap;
use std::sync::Arc;

use horizon_lattice_glyphs::http::HttpGlyphFetcher;
use horizon_lattice_glyphs::{GlyphManager, GlyphManagerConfig};

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let mut args = std::env::args().skip(1);
    let url = args
        .next()
        .expect("usage: fetch_glyphs <url template> [font stack] [text]");
    let stack = args.next().unwrap_or_else(|| "Open Sans Regular".to_string());
    let text = args.next().unwrap_or_else(|| "Hello 世界".to_string());

    let fetcher = HttpGlyphFetcher::new().expect("Failed to create HTTP client");
    let config = GlyphManagerConfig::new()
        .with_service_url(url)
        .with_local_ideograph_font_family("sans-serif");
    let manager = GlyphManager::with_system_fonts(config, Arc::new(fetcher));

    let ids: Vec<u32> = text.chars().map(u32::from).collect();
    let request = HashMap::from([(stack.clone(), ids.clone())]);
    let response = manager
        .get_glyphs(&request)
        .await
        .expect("Failed to resolve glyphs");

    for id in ids {
        let ch = char::from_u32(id).unwrap_or('?');
        match &response[&stack][&id] {
            Some(glyph) => println!(
                "{ch:?} U+{id:04X}: bitmap {}x{}, advance {}",
                glyph.bitmap.width(),
                glyph.bitmap.height(),
                glyph.metrics.advance
            ),
            None => println!("{ch:?} U+{id:04X}: not available"),
        }
    }

    println!("{:?}", manager.stats());
}
