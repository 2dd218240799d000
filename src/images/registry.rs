//! Registry of in-flight thumbnail fetches.
//!
//! At most one live task exists per key. Tasks run on a tokio runtime and
//! report back over a channel; cancellation is cooperative and only stops a
//! result from being applied, not the download itself.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::{FetchError, Thumbnail};

/// Result produced by one fetch.
pub type FetchResult = Result<Thumbnail, FetchError>;

/// Identifier of one fetch task, unique within a registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u64);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Lifecycle of a fetch task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchState {
    /// Registered, not yet polled
    #[default]
    Pending,
    /// Fetch in progress
    Running,
    /// Fetch produced a thumbnail
    Completed,
    /// Cancellation was requested
    Cancelled,
    /// Fetch produced an error
    Failed,
}

impl FetchState {
    /// Whether no further transitions are possible.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::Failed)
    }

    const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Running | Self::Cancelled)
                | (Self::Running, Self::Completed | Self::Failed | Self::Cancelled)
        )
    }
}

/// A finished fetch, delivered to the coordinating context.
#[derive(Debug)]
pub struct Completion {
    /// Key the fetch was started for
    pub key: String,
    /// Task that produced this result
    pub task: TaskId,
    /// Whether cancellation was requested before the fetch resolved
    pub cancelled: bool,
    /// What the fetch produced
    pub result: FetchResult,
}

struct TaskShared {
    key: String,
    id: TaskId,
    state: watch::Sender<FetchState>,
    cancel: CancellationToken,
    work: Mutex<Option<JoinHandle<()>>>,
}

impl TaskShared {
    fn transition(&self, next: FetchState) -> bool {
        self.state.send_if_modified(|current| {
            if current.can_transition_to(next) {
                *current = next;
                true
            } else {
                false
            }
        })
    }
}

/// Handle to a registered fetch task. Clones refer to the same task.
#[derive(Clone)]
pub struct FetchHandle {
    shared: Arc<TaskShared>,
}

impl FetchHandle {
    /// Key this task fetches.
    pub fn key(&self) -> &str {
        &self.shared.key
    }

    /// Task identifier.
    pub fn id(&self) -> TaskId {
        self.shared.id
    }

    /// Current lifecycle state.
    pub fn state(&self) -> FetchState {
        *self.shared.state.borrow()
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.shared.cancel.is_cancelled()
    }

    /// Request cooperative cancellation.
    ///
    /// Returns `true` if the task moved to [`FetchState::Cancelled`].
    pub fn cancel(&self) -> bool {
        self.shared.cancel.cancel();
        self.shared.transition(FetchState::Cancelled)
    }

    /// Whether two handles refer to the same task.
    pub fn same_task(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }

    /// Wait for the task to reach a terminal state.
    pub async fn finished(&self) -> FetchState {
        let mut rx = self.shared.state.subscribe();
        match rx.wait_for(|state| state.is_terminal()).await {
            Ok(state) => *state,
            Err(_) => self.state(),
        }
    }

    fn abort(&self) {
        if let Some(work) = self.shared.work.lock().take() {
            work.abort();
        }
    }
}

impl fmt::Debug for FetchHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchHandle")
            .field("key", &self.shared.key)
            .field("id", &self.shared.id)
            .field("state", &self.state())
            .finish()
    }
}

#[derive(Default)]
struct RegistryInner {
    tasks: HashMap<String, FetchHandle>,
    next_id: u64,
}

impl RegistryInner {
    /// Deregister `key` only if it still refers to task `id`.
    fn release(&mut self, key: &str, id: TaskId) {
        if self.tasks.get(key).is_some_and(|handle| handle.id() == id) {
            self.tasks.remove(key);
        }
    }
}

/// Tracks live fetch tasks, one per key.
pub struct TaskRegistry {
    inner: Arc<Mutex<RegistryInner>>,
    runtime: Handle,
    completions: mpsc::UnboundedSender<Completion>,
}

impl TaskRegistry {
    /// Create a registry that spawns onto `runtime`.
    ///
    /// Every task that runs its fetch sends exactly one [`Completion`] on the
    /// returned receiver.
    pub fn new(runtime: Handle) -> (Self, mpsc::UnboundedReceiver<Completion>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let registry = Self {
            inner: Arc::new(Mutex::new(RegistryInner::default())),
            runtime,
            completions: tx,
        };
        (registry, rx)
    }

    /// Join the live task for `key`, or start one running `fetch_fn(key)`.
    ///
    /// A task whose cancellation was requested is no longer live; a new one
    /// replaces it.
    pub fn start_or_join<F, Fut>(&self, key: &str, fetch_fn: F) -> FetchHandle
    where
        F: FnOnce(String) -> Fut,
        Fut: Future<Output = FetchResult> + Send + 'static,
    {
        let handle = {
            let mut inner = self.inner.lock();
            if let Some(existing) = inner.tasks.get(key) {
                if !existing.is_cancelled() {
                    tracing::debug!("Joining fetch {} for {key}", existing.id());
                    return existing.clone();
                }
                tracing::debug!("Replacing cancelled fetch {} for {key}", existing.id());
            }

            let id = TaskId(inner.next_id);
            inner.next_id += 1;

            let handle = FetchHandle {
                shared: Arc::new(TaskShared {
                    key: key.to_string(),
                    id,
                    state: watch::Sender::new(FetchState::Pending),
                    cancel: CancellationToken::new(),
                    work: Mutex::new(None),
                }),
            };
            inner.tasks.insert(key.to_string(), handle.clone());
            handle
        };

        tracing::debug!("Starting fetch {} for {key}", handle.id());
        let work = self.runtime.spawn(run_task(
            handle.clone(),
            fetch_fn(key.to_string()),
            Arc::downgrade(&self.inner),
            self.completions.clone(),
        ));
        *handle.shared.work.lock() = Some(work);

        handle
    }

    /// Cancel every live task and forget it. Returns how many were cancelled.
    pub fn cancel_all(&self) -> usize {
        let cancelled: Vec<FetchHandle> = self
            .inner
            .lock()
            .tasks
            .drain()
            .map(|(_, handle)| handle)
            .collect();

        for handle in &cancelled {
            handle.cancel();
        }
        if !cancelled.is_empty() {
            tracing::info!("Cancelled {} outstanding fetches", cancelled.len());
        }
        cancelled.len()
    }

    /// Cancel every live task and abort its work outright.
    pub fn shutdown(&self) {
        let tasks: Vec<FetchHandle> = self
            .inner
            .lock()
            .tasks
            .drain()
            .map(|(_, handle)| handle)
            .collect();

        for handle in &tasks {
            handle.cancel();
            handle.abort();
        }
        tracing::debug!("Task registry shut down ({} tasks aborted)", tasks.len());
    }

    /// Live task for `key`, if any.
    pub fn get(&self, key: &str) -> Option<FetchHandle> {
        self.inner.lock().tasks.get(key).cloned()
    }

    /// Whether a live task exists for `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.inner.lock().tasks.contains_key(key)
    }

    /// Number of live tasks.
    pub fn len(&self) -> usize {
        self.inner.lock().tasks.len()
    }

    /// Whether there are no live tasks.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().tasks.is_empty()
    }
}

async fn run_task<Fut>(
    handle: FetchHandle,
    fetch: Fut,
    registry: Weak<Mutex<RegistryInner>>,
    completions: mpsc::UnboundedSender<Completion>,
) where
    Fut: Future<Output = FetchResult> + Send,
{
    if !handle.shared.transition(FetchState::Running) {
        tracing::debug!("Fetch {} for {} cancelled before start", handle.id(), handle.key());
        if let Some(registry) = registry.upgrade() {
            registry.lock().release(handle.key(), handle.id());
        }
        return;
    }

    let result = fetch.await;

    let cancelled = handle.is_cancelled();
    let outcome = if result.is_ok() {
        FetchState::Completed
    } else {
        FetchState::Failed
    };
    // A cancelled task stays Cancelled; this transition is then a no-op.
    handle.shared.transition(outcome);

    if let Some(registry) = registry.upgrade() {
        registry.lock().release(handle.key(), handle.id());
    }

    let _ = completions.send(Completion {
        key: handle.key().to_string(),
        task: handle.id(),
        cancelled,
        result,
    });
}
