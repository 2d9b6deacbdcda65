//! Batch glyph provisioning.
//!
//! [`GlyphManager`] is the entry point used by a label renderer: it takes
//! every (font stack, codepoint) pair a set of labels needs, resolves them
//! concurrently through the shared [`GlyphCache`], and hands back one
//! response keyed by stack and codepoint.
//!
//! # Example
//!
//! ```no_run
//! use std::collections::HashMap;
//! use std::sync::Arc;
//! use horizon_lattice_glyphs::{GlyphManager, GlyphManagerConfig, GlyphRangeFetcher};
//!
//! # async fn example(fetcher: Arc<dyn GlyphRangeFetcher>) -> horizon_lattice_glyphs::GlyphResult<()> {
//! let config = GlyphManagerConfig::default()
//!     .with_service_url("https://tiles.example.com/fonts/{fontstack}/{range}.pbf");
//! let manager = GlyphManager::new(config, fetcher);
//!
//! let request = HashMap::from([
//!     ("Open Sans Regular".to_string(), vec![72, 105]),
//!     ("Open Sans Bold".to_string(), vec![33]),
//! ]);
//! let glyphs = manager.get_glyphs(&request).await?;
//! assert!(glyphs["Open Sans Regular"].contains_key(&72));
//! # Ok(())
//! # }
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use futures_util::future::{join_all, try_join_all};

use crate::cache::{GlyphCache, GlyphCacheStats};
use crate::error::GlyphResult;
use crate::fetch::GlyphRangeFetcher;
use crate::synth::{LocalSynthesizer, RasterizerFactory, SdfOptions};
use crate::types::{GlyphId, GlyphRequest, GlyphResponse, StyleGlyph};

/// A batch response where every glyph settled independently.
pub type SettledGlyphResponse = HashMap<String, HashMap<GlyphId, GlyphResult<Option<StyleGlyph>>>>;

/// Configuration for the glyph manager.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GlyphManagerConfig {
    /// Glyph service URL template with `{fontstack}` and `{range}` placeholders.
    /// Default: none (remote fetching disabled).
    pub service_url: Option<String>,
    /// Font family used to draw CJK, Hangul, Hiragana and Katakana glyphs
    /// locally. Default: none (those scripts are fetched like any other).
    pub local_ideograph_font_family: Option<String>,
    /// Parameters for local SDF rasterization.
    pub sdf: SdfOptions,
}

impl GlyphManagerConfig {
    /// Create a configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the glyph service URL template.
    #[must_use]
    pub fn with_service_url(mut self, url: impl Into<String>) -> Self {
        self.service_url = Some(url.into());
        self
    }

    /// Set the font family for locally drawn ideographs.
    #[must_use]
    pub fn with_local_ideograph_font_family(mut self, family: impl Into<String>) -> Self {
        self.local_ideograph_font_family = Some(family.into());
        self
    }

    /// Set the local SDF rasterization parameters.
    #[must_use]
    pub fn with_sdf_options(mut self, options: SdfOptions) -> Self {
        self.sdf = options;
        self
    }
}

/// Resolves batches of glyphs for label rendering.
///
/// Cloning is cheap; clones share the same cache.
#[derive(Clone, Debug)]
pub struct GlyphManager {
    cache: GlyphCache,
}

impl GlyphManager {
    /// Create a manager without a local rasterizer.
    ///
    /// If a local ideograph family is configured, glyphs routed to local
    /// synthesis resolve as absent.
    pub fn new(config: GlyphManagerConfig, fetcher: Arc<dyn GlyphRangeFetcher>) -> Self {
        Self::build(config, fetcher, None)
    }

    /// Create a manager that draws local glyphs with rasterizers from `factory`.
    pub fn with_rasterizer_factory(
        config: GlyphManagerConfig,
        fetcher: Arc<dyn GlyphRangeFetcher>,
        factory: Arc<dyn RasterizerFactory>,
    ) -> Self {
        Self::build(config, fetcher, Some(factory))
    }

    /// Create a manager that draws local glyphs from the system's fonts.
    ///
    /// Loading the system font database may take around a second.
    #[cfg(feature = "tiny-sdf")]
    pub fn with_system_fonts(
        config: GlyphManagerConfig,
        fetcher: Arc<dyn GlyphRangeFetcher>,
    ) -> Self {
        let factory: Arc<dyn RasterizerFactory> =
            Arc::new(crate::sdf::TinySdfFactory::with_system_fonts());
        Self::build(config, fetcher, Some(factory))
    }

    fn build(
        config: GlyphManagerConfig,
        fetcher: Arc<dyn GlyphRangeFetcher>,
        factory: Option<Arc<dyn RasterizerFactory>>,
    ) -> Self {
        let synthesizer =
            LocalSynthesizer::new(config.local_ideograph_font_family, config.sdf, factory);
        Self {
            cache: GlyphCache::new(fetcher, synthesizer, config.service_url),
        }
    }

    /// Set the glyph service URL template. `None` disables remote fetching.
    ///
    /// Takes effect for resolutions that start after the call.
    pub fn set_service_url(&self, url: Option<String>) {
        self.cache.set_service_url(url);
    }

    /// The glyph service URL template.
    pub fn service_url(&self) -> Option<String> {
        self.cache.service_url()
    }

    /// The underlying cache.
    pub fn cache(&self) -> &GlyphCache {
        &self.cache
    }

    /// Get cache statistics.
    pub fn stats(&self) -> GlyphCacheStats {
        self.cache.stats()
    }

    /// Resolve every glyph in `request`.
    ///
    /// All glyphs are resolved concurrently. The call fails with the first
    /// error any glyph reports; glyphs already resolved for the batch are
    /// discarded, though they stay cached. Glyphs confirmed absent are
    /// returned as `None`.
    pub async fn get_glyphs(&self, request: &GlyphRequest) -> GlyphResult<GlyphResponse> {
        let items = flatten(request);
        tracing::debug!(
            stacks = request.len(),
            glyphs = items.len(),
            "resolving glyph batch"
        );

        let resolved = try_join_all(
            items
                .into_iter()
                .map(|(stack, id)| self.resolve_item(stack, id)),
        )
        .await?;

        let mut response = GlyphResponse::new();
        for (stack, id, glyph) in resolved {
            response
                .entry(stack.to_string())
                .or_default()
                .insert(id, glyph);
        }
        Ok(response)
    }

    /// Resolve every glyph in `request`, reporting each outcome separately.
    ///
    /// Unlike [`get_glyphs`](Self::get_glyphs), one failing glyph does not
    /// fail the others.
    pub async fn get_glyphs_settled(&self, request: &GlyphRequest) -> SettledGlyphResponse {
        let items = flatten(request);
        let settled = join_all(items.into_iter().map(|(stack, id)| async move {
            (stack, id, self.cache.resolve(stack, id).await)
        }))
        .await;

        let mut response = SettledGlyphResponse::new();
        for (stack, id, result) in settled {
            response
                .entry(stack.to_string())
                .or_default()
                .insert(id, result);
        }
        response
    }

    async fn resolve_item<'a>(
        &self,
        stack: &'a str,
        id: GlyphId,
    ) -> GlyphResult<(&'a str, GlyphId, Option<StyleGlyph>)> {
        let glyph = self.cache.resolve(stack, id).await?;
        Ok((stack, id, glyph))
    }
}

/// Unique (stack, id) pairs of a request.
fn flatten(request: &GlyphRequest) -> Vec<(&str, GlyphId)> {
    let mut seen = HashSet::new();
    let mut items = Vec::new();
    for (stack, ids) in request {
        for &id in ids {
            if seen.insert((stack.as_str(), id)) {
                items.push((stack.as_str(), id));
            }
        }
    }
    items
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flatten_dedupes_pairs() {
        let request = GlyphRequest::from([
            ("Arial".to_string(), vec![65, 66, 65]),
            ("Arial Bold".to_string(), vec![65]),
        ]);

        let mut items = flatten(&request);
        items.sort();
        assert_eq!(
            items,
            vec![("Arial", 65), ("Arial", 66), ("Arial Bold", 65)]
        );
    }

    #[test]
    fn test_config_builder() {
        let config = GlyphManagerConfig::new()
            .with_service_url("https://example.com/{fontstack}/{range}.pbf")
            .with_local_ideograph_font_family("Noto Sans CJK JP");

        assert_eq!(
            config.service_url.as_deref(),
            Some("https://example.com/{fontstack}/{range}.pbf")
        );
        assert_eq!(
            config.local_ideograph_font_family.as_deref(),
            Some("Noto Sans CJK JP")
        );
        assert_eq!(config.sdf, SdfOptions::default());
    }
}
