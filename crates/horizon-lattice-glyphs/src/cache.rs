//! Per-stack glyph cache with range request coalescing.
//!
//! Each font stack owns a [`CacheEntry`] holding resolved glyphs, the ranges
//! already loaded, the ranges currently in flight with their waiters, and the
//! stack's local rasterizer. A range has an entry in `requests` exactly while
//! its fetch is running; every caller that needs the range in that window is
//! appended to the waiter list instead of issuing another fetch.
//!
//! Fetches run on their own Tokio task. A caller that is dropped mid-flight
//! does not cancel the fetch: the result still lands in the cache and is
//! delivered to whichever waiters remain.
//!
//! Absence reported by the glyph service is not final when a local font
//! family is configured: such glyphs are synthesized locally once and the
//! synthesized glyph replaces the absent entry.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tokio::sync::oneshot;

use crate::classify::{GlyphRoute, classify, is_local_ideograph, range_bounds};
use crate::error::{FetchError, GlyphError, GlyphResult};
use crate::fetch::GlyphRangeFetcher;
use crate::synth::{LocalSynthesizer, SdfRasterizer};
use crate::types::{GlyphId, GlyphRange, MAX_GLYPH_ID, StyleGlyph};

/// What every waiter on a range receives when its fetch settles.
type RangeOutcome = Result<Arc<GlyphRange>, GlyphError>;

/// A caller suspended on an in-flight range.
type Waiter = oneshot::Sender<RangeOutcome>;

/// A stack's lazily built rasterizer, locked on its own while it is built.
type RasterizerSlot = Arc<Mutex<Option<Arc<dyn SdfRasterizer>>>>;

/// Statistics about glyph cache usage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GlyphCacheStats {
    /// Resolutions answered from already cached glyphs.
    pub cache_hits: u64,
    /// Remote range fetches started.
    pub range_fetches: u64,
    /// Resolutions that joined a fetch already in flight.
    pub coalesced_requests: u64,
    /// Glyphs drawn by a local rasterizer.
    pub local_syntheses: u64,
    /// Range fetches that ended in an error.
    pub failed_fetches: u64,
}

/// Cached state for one font stack.
#[derive(Default)]
struct CacheEntry {
    /// `None` means the glyph was looked up and is known to be absent.
    glyphs: HashMap<GlyphId, Option<StyleGlyph>>,
    /// Ranges whose fetch completed successfully.
    ranges: HashSet<u32>,
    /// Waiters per range; a key exists only while that range is in flight.
    requests: HashMap<u32, Vec<Waiter>>,
    /// Built on first local synthesis for this stack.
    rasterizer: RasterizerSlot,
}

#[derive(Default)]
struct CacheState {
    entries: HashMap<String, CacheEntry>,
    stats: GlyphCacheStats,
}

impl CacheState {
    fn entry(&mut self, stack: &str) -> &mut CacheEntry {
        self.entries.entry(stack.to_string()).or_default()
    }
}

struct Shared {
    state: Mutex<CacheState>,
    service_url: RwLock<Option<String>>,
    fetcher: Arc<dyn GlyphRangeFetcher>,
    synthesizer: LocalSynthesizer,
}

/// How a single resolution proceeds after inspecting the cache.
enum Plan {
    Ready(Option<StyleGlyph>),
    Synthesize,
    Wait {
        range: u32,
        rx: oneshot::Receiver<RangeOutcome>,
    },
    Fetch {
        range: u32,
        url: String,
        rx: oneshot::Receiver<RangeOutcome>,
    },
}

/// Glyph cache and request coalescer.
///
/// Cloning is cheap; clones share the same cache.
#[derive(Clone)]
pub struct GlyphCache {
    shared: Arc<Shared>,
}

impl GlyphCache {
    /// Create an empty cache.
    pub fn new(
        fetcher: Arc<dyn GlyphRangeFetcher>,
        synthesizer: LocalSynthesizer,
        service_url: Option<String>,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(CacheState::default()),
                service_url: RwLock::new(service_url),
                fetcher,
                synthesizer,
            }),
        }
    }

    /// Set the glyph service URL template. `None` disables remote fetching.
    pub fn set_service_url(&self, url: Option<String>) {
        *self.shared.service_url.write() = url;
    }

    /// The glyph service URL template.
    pub fn service_url(&self) -> Option<String> {
        self.shared.service_url.read().clone()
    }

    /// The local synthesizer.
    pub fn synthesizer(&self) -> &LocalSynthesizer {
        &self.shared.synthesizer
    }

    /// Resolve one glyph, suspending while its range is fetched.
    ///
    /// Returns `Ok(None)` when the glyph is confirmed absent and cannot be
    /// synthesized locally.
    ///
    /// # Panics
    ///
    /// Starting a range fetch spawns a Tokio task, so this must be polled
    /// within a Tokio runtime.
    pub async fn resolve(&self, stack: &str, id: GlyphId) -> GlyphResult<Option<StyleGlyph>> {
        match self.plan(stack, id)? {
            Plan::Ready(glyph) => Ok(glyph),
            Plan::Synthesize => Ok(self.synthesize(stack, id)),
            Plan::Wait { range, rx } => self.await_range(stack, id, range, rx).await,
            Plan::Fetch { range, url, rx } => {
                self.spawn_fetch(stack, range, &url);
                self.await_range(stack, id, range, rx).await
            }
        }
    }

    /// Inspect the cache and register as a waiter if a fetch is needed.
    fn plan(&self, stack: &str, id: GlyphId) -> GlyphResult<Plan> {
        let local = self.shared.synthesizer.routes_ideographs();
        let mut state = self.shared.state.lock();

        let cached = state.entry(stack).glyphs.get(&id).cloned();
        match cached {
            Some(Some(glyph)) => {
                state.stats.cache_hits += 1;
                tracing::trace!(stack, id, "glyph cache hit");
                return Ok(Plan::Ready(Some(glyph)));
            }
            Some(None) if local => return Ok(Plan::Synthesize),
            Some(None) => {
                state.stats.cache_hits += 1;
                return Ok(Plan::Ready(None));
            }
            None => {}
        }

        let range = match classify(id, local) {
            GlyphRoute::LocalSynthesis => return Ok(Plan::Synthesize),
            GlyphRoute::Unsupported => {
                return Err(GlyphError::UnsupportedCodepoint {
                    id,
                    max: MAX_GLYPH_ID,
                });
            }
            GlyphRoute::RemoteRange(range) => range,
        };

        // The range loaded without this glyph.
        if state.entry(stack).ranges.contains(&range) {
            return Ok(Plan::Synthesize);
        }

        let url = self
            .shared
            .service_url
            .read()
            .clone()
            .ok_or(GlyphError::NoServiceConfigured)?;

        let (tx, rx) = oneshot::channel();
        let requests = &mut state.entry(stack).requests;
        let joined = match requests.get_mut(&range) {
            Some(waiters) => {
                waiters.push(tx);
                true
            }
            None => {
                requests.insert(range, vec![tx]);
                false
            }
        };

        if joined {
            state.stats.coalesced_requests += 1;
            tracing::debug!(stack, id, range, "joining in-flight glyph range request");
            Ok(Plan::Wait { range, rx })
        } else {
            state.stats.range_fetches += 1;
            Ok(Plan::Fetch { range, url, rx })
        }
    }

    /// Start the fetch for `range` on its own task.
    fn spawn_fetch(&self, stack: &str, range: u32, url: &str) {
        tracing::debug!(stack, range, "fetching glyph range");
        let request = self.shared.fetcher.fetch(stack, range, url);
        let in_flight = InFlightRange {
            cache: self.clone(),
            stack: stack.to_string(),
            range,
            settled: false,
        };
        tokio::spawn(async move {
            let result = request.await;
            in_flight.settle(result);
        });
    }

    /// Store a finished fetch and wake every waiter in registration order.
    fn complete_range(&self, stack: &str, range: u32, result: Result<GlyphRange, FetchError>) {
        let local = self.shared.synthesizer.routes_ideographs();
        let outcome: RangeOutcome = result.map(Arc::new).map_err(|source| {
            GlyphError::FetchFailed {
                stack: stack.to_string(),
                range,
                source,
            }
        });

        let waiters = {
            let mut state = self.shared.state.lock();
            match &outcome {
                Ok(glyphs) => {
                    let bounds = range_bounds(range);
                    let entry = state.entry(stack);
                    for (&id, glyph) in glyphs.iter() {
                        if !bounds.contains(&id) {
                            tracing::warn!(stack, range, id, "ignoring glyph outside its range");
                            continue;
                        }
                        if is_local_ideograph(id, local) {
                            continue;
                        }
                        entry
                            .glyphs
                            .insert(id, glyph.as_ref().map(|glyph| glyph.with_id(id)));
                    }
                    entry.ranges.insert(range);
                    tracing::debug!(stack, range, glyphs = glyphs.len(), "glyph range loaded");
                }
                Err(err) => {
                    state.stats.failed_fetches += 1;
                    tracing::warn!(stack, range, error = %err, "glyph range request failed");
                }
            }
            state
                .entry(stack)
                .requests
                .remove(&range)
                .unwrap_or_default()
        };

        for waiter in waiters {
            // The receiver is gone if its caller was dropped.
            let _ = waiter.send(outcome.clone());
        }
    }

    /// Forget an in-flight range whose fetch task ended without a result.
    ///
    /// Dropping the waiters wakes them with [`GlyphError::FetchAborted`] and a
    /// later request may fetch the range again.
    fn abandon_range(&self, stack: &str, range: u32) {
        let waiters = self.shared.state.lock().entry(stack).requests.remove(&range);
        tracing::warn!(
            stack,
            range,
            waiters = waiters.as_ref().map_or(0, Vec::len),
            "glyph range request abandoned"
        );
    }

    async fn await_range(
        &self,
        stack: &str,
        id: GlyphId,
        range: u32,
        rx: oneshot::Receiver<RangeOutcome>,
    ) -> GlyphResult<Option<StyleGlyph>> {
        let glyphs = rx.await.map_err(|_| GlyphError::FetchAborted {
            stack: stack.to_string(),
            range,
        })??;

        match glyphs.get(&id) {
            Some(Some(glyph)) => Ok(Some(glyph.with_id(id))),
            _ => Ok(self.synthesize(stack, id)),
        }
    }

    /// Draw `id` locally and store the result.
    ///
    /// Stores and returns `None` when local synthesis is not configured.
    fn synthesize(&self, stack: &str, id: GlyphId) -> Option<StyleGlyph> {
        let rasterizer = match self.rasterizer_for(stack) {
            Ok(rasterizer) => rasterizer,
            Err(err) => {
                tracing::debug!(stack, id, error = %err, "glyph left unresolved");
                self.shared.state.lock().entry(stack).glyphs.insert(id, None);
                return None;
            }
        };

        let glyph = self.shared.synthesizer.synthesize(rasterizer.as_ref(), id);

        let mut state = self.shared.state.lock();
        state.entry(stack).glyphs.insert(id, Some(glyph.clone()));
        state.stats.local_syntheses += 1;
        Some(glyph)
    }

    /// The stack's rasterizer, built on first use.
    ///
    /// Building happens under the stack's slot lock only, so other stacks
    /// keep resolving while a font is being looked up.
    fn rasterizer_for(&self, stack: &str) -> GlyphResult<Arc<dyn SdfRasterizer>> {
        let slot = Arc::clone(&self.shared.state.lock().entry(stack).rasterizer);
        let mut built = slot.lock();
        if let Some(rasterizer) = built.as_ref() {
            return Ok(Arc::clone(rasterizer));
        }
        let rasterizer = self.shared.synthesizer.build_rasterizer(stack)?;
        Ok(Arc::clone(built.get_or_insert(rasterizer)))
    }

    /// Get cache statistics.
    pub fn stats(&self) -> GlyphCacheStats {
        self.shared.state.lock().stats
    }

    /// Reset cache statistics.
    pub fn reset_stats(&self) {
        self.shared.state.lock().stats = GlyphCacheStats::default();
    }

    /// Number of font stacks with a cache entry.
    pub fn stack_count(&self) -> usize {
        self.shared.state.lock().entries.len()
    }

    /// Check whether `range` of `stack` has been loaded.
    pub fn is_range_loaded(&self, stack: &str, range: u32) -> bool {
        self.shared
            .state
            .lock()
            .entries
            .get(stack)
            .is_some_and(|entry| entry.ranges.contains(&range))
    }

    /// Ranges of `stack` with a fetch in flight, in ascending order.
    pub fn in_flight_ranges(&self, stack: &str) -> Vec<u32> {
        let state = self.shared.state.lock();
        let mut ranges: Vec<u32> = state
            .entries
            .get(stack)
            .map(|entry| entry.requests.keys().copied().collect())
            .unwrap_or_default();
        ranges.sort_unstable();
        ranges
    }

    /// The cached state of a glyph: `None` if never resolved, `Some(None)`
    /// if known to be absent.
    pub fn cached_glyph(&self, stack: &str, id: GlyphId) -> Option<Option<StyleGlyph>> {
        self.shared
            .state
            .lock()
            .entries
            .get(stack)
            .and_then(|entry| entry.glyphs.get(&id).cloned())
    }
}

impl std::fmt::Debug for GlyphCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlyphCache")
            .field("service_url", &self.service_url())
            .field("synthesizer", &self.shared.synthesizer)
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}

/// Owned by a range's fetch task; releases the range's waiters if the task
/// ends without settling (for example when the fetch panics).
struct InFlightRange {
    cache: GlyphCache,
    stack: String,
    range: u32,
    settled: bool,
}

impl InFlightRange {
    fn settle(mut self, result: Result<GlyphRange, FetchError>) {
        self.settled = true;
        self.cache.complete_range(&self.stack, self.range, result);
    }
}

impl Drop for InFlightRange {
    fn drop(&mut self) {
        if !self.settled {
            self.cache.abandon_range(&self.stack, self.range);
        }
    }
}
