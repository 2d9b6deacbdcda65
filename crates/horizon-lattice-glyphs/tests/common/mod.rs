//! Test doubles shared by the integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc;
use std::time::Duration;

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use horizon_lattice_glyphs::{
    AlphaImage, FetchError, GlyphCacheStats, GlyphId, GlyphMetrics, GlyphRange,
    GlyphRangeFetcher, RasterizedSdf, RasterizerFactory, RasterizerSpec, SdfRasterizer,
    StyleGlyph, range_bounds,
};
use parking_lot::Mutex;
use tokio::sync::Semaphore;

pub const SERVICE_URL: &str = "https://tiles.example.com/fonts/{fontstack}/{range}.pbf";

/// Glyph the mock service serves for `id`.
pub fn served_glyph(id: GlyphId) -> StyleGlyph {
    StyleGlyph {
        id,
        bitmap: AlphaImage::from_vec(2, 2, vec![id as u8; 4]),
        metrics: GlyphMetrics {
            width: 10,
            height: 12,
            left: 1,
            top: -10,
            advance: 11,
        },
    }
}

/// A glyph service double that counts fetches.
///
/// Serves every codepoint accepted by its filter. Rejected codepoints are
/// reported absent, or left out of the range entirely when sparse. With a
/// gate, responses are held until the test adds permits.
pub struct MockFetcher {
    calls: Mutex<Vec<(String, u32, String)>>,
    serves: fn(GlyphId) -> bool,
    sparse: bool,
    error: Option<FetchError>,
    gate: Option<Arc<Semaphore>>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            serves: |_| true,
            sparse: false,
            error: None,
            gate: None,
        }
    }

    pub fn serving(mut self, serves: fn(GlyphId) -> bool) -> Self {
        self.serves = serves;
        self
    }

    pub fn sparse(mut self) -> Self {
        self.sparse = true;
        self
    }

    pub fn failing(mut self, error: FetchError) -> Self {
        self.error = Some(error);
        self
    }

    pub fn gated(mut self, gate: Arc<Semaphore>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn fetch_count(&self) -> usize {
        self.calls.lock().len()
    }

    pub fn calls(&self) -> Vec<(String, u32, String)> {
        self.calls.lock().clone()
    }
}

impl GlyphRangeFetcher for MockFetcher {
    fn fetch(
        &self,
        stack: &str,
        range: u32,
        url: &str,
    ) -> BoxFuture<'static, Result<GlyphRange, FetchError>> {
        self.calls
            .lock()
            .push((stack.to_string(), range, url.to_string()));

        let gate = self.gate.clone();
        let error = self.error.clone();
        let serves = self.serves;
        let sparse = self.sparse;

        async move {
            if let Some(gate) = gate {
                let _permit = gate.acquire().await.expect("gate closed");
            }
            if let Some(error) = error {
                return Err(error);
            }
            Ok(range_bounds(range)
                .filter(|&id| !sparse || serves(id))
                .map(|id| (id, serves(id).then(|| served_glyph(id))))
                .collect())
        }
        .boxed()
    }
}

/// A rasterizer double recording what it was asked to build and draw.
#[derive(Default)]
pub struct MockRasterizerFactory {
    specs: Mutex<Vec<RasterizerSpec>>,
    draws: Arc<AtomicUsize>,
}

impl MockRasterizerFactory {
    pub fn create_count(&self) -> usize {
        self.specs.lock().len()
    }

    pub fn specs(&self) -> Vec<RasterizerSpec> {
        self.specs.lock().clone()
    }

    pub fn draw_count(&self) -> usize {
        self.draws.load(Ordering::SeqCst)
    }
}

impl RasterizerFactory for MockRasterizerFactory {
    fn create(&self, spec: &RasterizerSpec) -> Arc<dyn SdfRasterizer> {
        self.specs.lock().push(spec.clone());
        Arc::new(MockRasterizer {
            draws: Arc::clone(&self.draws),
        })
    }
}

struct MockRasterizer {
    draws: Arc<AtomicUsize>,
}

impl SdfRasterizer for MockRasterizer {
    fn draw(&self, _id: GlyphId) -> RasterizedSdf {
        self.draws.fetch_add(1, Ordering::SeqCst);
        RasterizedSdf {
            width: Some(30),
            height: Some(30),
            data: Some(vec![200; 900]),
            glyph_width: Some(24),
            glyph_height: Some(24),
            glyph_left: Some(0),
            glyph_top: Some(21),
            glyph_advance: Some(24),
        }
    }
}

/// A rasterizer factory whose `create` blocks until the test releases it.
pub struct BlockingRasterizerFactory {
    inner: MockRasterizerFactory,
    entered: AtomicBool,
    release: Mutex<mpsc::Receiver<()>>,
}

impl BlockingRasterizerFactory {
    pub fn new() -> (mpsc::Sender<()>, Self) {
        let (tx, rx) = mpsc::channel();
        let factory = Self {
            inner: MockRasterizerFactory::default(),
            entered: AtomicBool::new(false),
            release: Mutex::new(rx),
        };
        (tx, factory)
    }

    pub fn entered(&self) -> bool {
        self.entered.load(Ordering::SeqCst)
    }

    pub fn create_count(&self) -> usize {
        self.inner.create_count()
    }
}

impl RasterizerFactory for BlockingRasterizerFactory {
    fn create(&self, spec: &RasterizerSpec) -> Arc<dyn SdfRasterizer> {
        self.entered.store(true, Ordering::SeqCst);
        let _ = self.release.lock().recv();
        self.inner.create(spec)
    }
}

/// Wait until the cache statistics satisfy `ready`.
pub async fn wait_for_stats(stats: impl Fn() -> GlyphCacheStats, ready: impl Fn(GlyphCacheStats) -> bool) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !ready(stats()) {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    })
    .await
    .expect("timed out waiting for glyph cache");
}
