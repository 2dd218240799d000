//! Viewport-driven thumbnail loading.
//!
//! Fetches are issued only when scrolling settles and cancelled as soon as
//! it starts again. Completions are delivered back to the owner of the
//! [`ViewportLoader`], which applies them through the [`BindingGuard`].

use std::ops::Range;
use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::mpsc;

use super::{
    BindingGuard, Completion, FetchError, FetchHandle, Fetcher, ImageCache, TargetId,
    TaskRegistry, Thumbnail,
};

/// Scroll state reported by the list widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScrollState {
    /// Not moving
    #[default]
    Settled,
    /// Moving under direct user input
    Dragging,
    /// Moving on momentum
    Flinging,
}

impl ScrollState {
    /// Whether the list is moving.
    pub const fn is_moving(self) -> bool {
        !matches!(self, Self::Settled)
    }

    /// Display name
    pub const fn name(self) -> &'static str {
        match self {
            Self::Settled => "settled",
            Self::Dragging => "dragging",
            Self::Flinging => "flinging",
        }
    }
}

/// What a freshly bound target should show right now.
#[derive(Debug, Clone)]
pub enum Preview {
    /// The thumbnail is cached
    Ready(Thumbnail),
    /// Show the placeholder until a load completes
    Placeholder,
}

/// The list widget, as seen by the loader.
pub trait DisplaySurface {
    /// The target currently showing `key`, if it is on screen.
    fn find_target_for_key(&self, key: &str) -> Option<TargetId>;

    /// Show `thumbnail` on `target`.
    fn set_image(&mut self, target: TargetId, thumbnail: &Thumbnail);
}

/// Outcome of one delivered completion.
#[derive(Debug, Clone)]
pub enum LoadResult {
    /// Shown on a target
    Applied {
        /// Loaded key
        key: String,
        /// Target it was applied to
        target: TargetId,
    },
    /// Cached, but no target currently shows the key
    Stale {
        /// Loaded key
        key: String,
    },
    /// Cancelled while in flight; cached if it succeeded, never applied
    Cancelled {
        /// Loaded key
        key: String,
    },
    /// Loading failed
    Failed {
        /// Key that failed
        key: String,
        /// Why
        error: FetchError,
    },
}

/// Coordinates the cache, the task registry and the binding guard for a
/// scrolling list of keys.
///
/// All methods run on the coordinating context; fetches run on the tokio
/// runtime given at construction.
pub struct ViewportLoader<F: Fetcher> {
    fetcher: Arc<F>,
    cache: ImageCache,
    registry: TaskRegistry,
    completions: mpsc::UnboundedReceiver<Completion>,
    bindings: BindingGuard,
    keys: Vec<String>,
    visible: Range<usize>,
    scroll_state: ScrollState,
    first_range_seen: bool,
}

impl<F: Fetcher> ViewportLoader<F> {
    /// Create a loader spawning fetches onto `runtime`.
    pub fn new(fetcher: Arc<F>, cache: ImageCache, runtime: Handle) -> Self {
        let (registry, completions) = TaskRegistry::new(runtime);
        Self {
            fetcher,
            cache,
            registry,
            completions,
            bindings: BindingGuard::new(),
            keys: Vec::new(),
            visible: 0..0,
            scroll_state: ScrollState::Settled,
            first_range_seen: false,
        }
    }

    /// Replace the item keys, e.g. after a feed refresh.
    ///
    /// Outstanding fetches are cancelled and the next non-empty visible range
    /// bootstraps loading again.
    pub fn set_keys(&mut self, keys: Vec<String>) {
        self.registry.cancel_all();
        self.keys = keys;
        self.visible = 0..0;
        self.first_range_seen = false;
    }

    /// Item keys, indexed by list position.
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// Key at list position `index`.
    pub fn key_at(&self, index: usize) -> Option<&str> {
        self.keys.get(index).map(String::as_str)
    }

    /// The thumbnail for `key` if cached, otherwise a placeholder marker.
    pub fn cached_or_placeholder(&self, key: &str) -> Preview {
        self.cache
            .get(key)
            .map_or(Preview::Placeholder, Preview::Ready)
    }

    /// Record that `target` now shows `key` and return what to render.
    pub fn bind_target(&mut self, target: TargetId, key: &str) -> Preview {
        self.bindings.bind(target, key);
        self.cached_or_placeholder(key)
    }

    /// Record that `target` no longer shows anything.
    pub fn unbind_target(&mut self, target: TargetId) {
        self.bindings.unbind(target);
    }

    /// The visible range changed.
    ///
    /// The first non-empty range counts as a settle event, since no scroll
    /// event precedes the first render.
    pub fn on_visible_range_changed(
        &mut self,
        start: usize,
        end: usize,
        surface: &mut impl DisplaySurface,
    ) {
        self.visible = self.clamp(start, end);
        if !self.first_range_seen && !self.visible.is_empty() {
            self.first_range_seen = true;
            tracing::debug!("Initial range {:?}, loading", self.visible);
            self.load_visible(self.visible.start, self.visible.end, surface);
        }
    }

    /// The scroll state changed.
    ///
    /// Settling loads the last visible range; starting to move cancels every
    /// outstanding fetch. Repeated reports of the same state are ignored.
    pub fn on_scroll_state_changed(
        &mut self,
        state: ScrollState,
        surface: &mut impl DisplaySurface,
    ) {
        if state == self.scroll_state {
            return;
        }
        self.scroll_state = state;
        tracing::debug!("Scroll state -> {}", state.name());

        if state.is_moving() {
            self.cancel_all();
        } else {
            self.load_visible(self.visible.start, self.visible.end, surface);
        }
    }

    /// Show cached thumbnails and start fetches for every uncached key in
    /// `[start, end)`. Returns the number of fetches started or joined.
    pub fn load_visible(
        &self,
        start: usize,
        end: usize,
        surface: &mut impl DisplaySurface,
    ) -> usize {
        let range = self.clamp(start, end);
        let mut fetching = 0;

        for index in range {
            let key = self.keys[index].clone();
            if let Some(thumbnail) = self.cache.get(&key) {
                tracing::debug!("Cache hit for {key}");
                self.apply(&key, &thumbnail, surface);
            } else {
                self.start_fetch(&key);
                fetching += 1;
            }
        }

        fetching
    }

    /// Cancel every outstanding fetch. Returns how many were cancelled.
    pub fn cancel_all(&self) -> usize {
        self.registry.cancel_all()
    }

    /// Apply every completion delivered so far, without blocking.
    pub fn poll_completions(&mut self, surface: &mut impl DisplaySurface) -> Vec<LoadResult> {
        let mut results = Vec::new();
        while let Ok(completion) = self.completions.try_recv() {
            results.push(self.deliver(completion, surface));
        }
        results
    }

    /// Wait for the next completion and apply it.
    ///
    /// Returns `None` only if the registry has gone away.
    pub async fn next_completion(
        &mut self,
        surface: &mut impl DisplaySurface,
    ) -> Option<LoadResult> {
        let completion = self.completions.recv().await?;
        Some(self.deliver(completion, surface))
    }

    /// Abort all outstanding work.
    pub fn shutdown(&self) {
        self.registry.shutdown();
    }

    /// The shared cache.
    pub const fn cache(&self) -> &ImageCache {
        &self.cache
    }

    /// The task registry.
    pub const fn registry(&self) -> &TaskRegistry {
        &self.registry
    }

    /// Current target bindings.
    pub const fn bindings(&self) -> &BindingGuard {
        &self.bindings
    }

    /// Last reported scroll state.
    pub const fn scroll_state(&self) -> ScrollState {
        self.scroll_state
    }

    /// Last reported visible range, clamped to the key list.
    pub fn visible_range(&self) -> Range<usize> {
        self.visible.clone()
    }

    fn start_fetch(&self, key: &str) -> FetchHandle {
        let fetcher = Arc::clone(&self.fetcher);
        let cache = self.cache.clone();
        self.registry.start_or_join(key, move |key| async move {
            let result = fetcher.fetch(&key).await;
            // Caching does not depend on the task still being wanted.
            if let Ok(thumbnail) = &result {
                cache.put(&key, thumbnail.clone());
            }
            result
        })
    }

    fn deliver(&self, completion: Completion, surface: &mut impl DisplaySurface) -> LoadResult {
        let Completion {
            key,
            task,
            cancelled,
            result,
        } = completion;

        if cancelled {
            tracing::debug!("Discarding result of cancelled fetch {task} for {key}");
            return LoadResult::Cancelled { key };
        }

        match result {
            Ok(thumbnail) => match self.apply(&key, &thumbnail, surface) {
                Some(target) => LoadResult::Applied { key, target },
                None => LoadResult::Stale { key },
            },
            Err(error) => {
                tracing::warn!("Failed to load thumbnail {key}: {error}");
                LoadResult::Failed { key, error }
            }
        }
    }

    fn apply(
        &self,
        key: &str,
        thumbnail: &Thumbnail,
        surface: &mut impl DisplaySurface,
    ) -> Option<TargetId> {
        let target = surface.find_target_for_key(key)?;
        self.bindings
            .try_apply(target, key, thumbnail, |target, thumbnail| {
                surface.set_image(target, thumbnail);
            })
            .then_some(target)
    }

    fn clamp(&self, start: usize, end: usize) -> Range<usize> {
        let end = end.min(self.keys.len());
        start.min(end)..end
    }
}
