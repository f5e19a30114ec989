//! Best-effort execution of work that outlives the response.

use std::sync::Mutex;

/// A detached unit of work. Tasks carry their own error handling and
/// resolve to `()`.
#[cfg(not(target_arch = "wasm32"))]
pub type BackgroundTask = futures::future::BoxFuture<'static, ()>;

/// A detached unit of work. Tasks carry their own error handling and
/// resolve to `()`.
#[cfg(target_arch = "wasm32")]
pub type BackgroundTask = futures::future::LocalBoxFuture<'static, ()>;

/// Accepts fire-and-forget tasks.
///
/// Submission never fails; a task that is never polled (runtime shutdown,
/// instance teardown) is simply abandoned.
pub trait BackgroundExecutor {
    /// Submit a task. `name` is used for logging only.
    fn submit(&self, name: &str, task: BackgroundTask);
}

/// Collects tasks during a request and runs them once the response has
/// been delivered.
#[derive(Default)]
pub struct DeferredTasks {
    tasks: Mutex<Vec<(String, BackgroundTask)>>,
}

impl DeferredTasks {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of queued tasks.
    pub fn len(&self) -> usize {
        self.tasks.lock().map(|t| t.len()).unwrap_or(0)
    }

    /// Whether no task is queued.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Names of queued tasks, in submission order.
    pub fn names(&self) -> Vec<String> {
        self.tasks
            .lock()
            .map(|t| t.iter().map(|(name, _)| name.clone()).collect())
            .unwrap_or_default()
    }

    /// Run queued tasks one after another, including tasks queued while
    /// running. Returns how many ran.
    pub async fn run_all(&self) -> usize {
        let mut ran = 0;
        loop {
            let batch: Vec<(String, BackgroundTask)> = match self.tasks.lock() {
                Ok(mut tasks) => tasks.drain(..).collect(),
                Err(_) => return ran,
            };
            if batch.is_empty() {
                return ran;
            }
            for (_, task) in batch {
                task.await;
                ran += 1;
            }
        }
    }
}

impl BackgroundExecutor for DeferredTasks {
    fn submit(&self, name: &str, task: BackgroundTask) {
        if let Ok(mut tasks) = self.tasks.lock() {
            tasks.push((name.to_string(), task));
        }
    }
}

/// Spawns each task detached on a tokio runtime.
#[cfg(not(target_arch = "wasm32"))]
pub struct TokioExecutor {
    handle: tokio::runtime::Handle,
    spawned: Mutex<Vec<tokio::task::JoinHandle<()>>>,
}

#[cfg(not(target_arch = "wasm32"))]
impl TokioExecutor {
    /// Spawn onto the given runtime.
    pub fn new(handle: tokio::runtime::Handle) -> Self {
        Self {
            handle,
            spawned: Mutex::new(Vec::new()),
        }
    }

    /// Spawn onto the runtime driving the caller, if any.
    pub fn current() -> Option<Self> {
        tokio::runtime::Handle::try_current().ok().map(Self::new)
    }

    /// Wait for every task spawned so far. Panicked tasks are skipped.
    pub async fn join_all(&self) {
        let handles: Vec<_> = match self.spawned.lock() {
            Ok(mut spawned) => spawned.drain(..).collect(),
            Err(_) => return,
        };
        for handle in handles {
            let _ = handle.await;
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl BackgroundExecutor for TokioExecutor {
    fn submit(&self, _name: &str, task: BackgroundTask) {
        let handle = self.handle.spawn(task);
        if let Ok(mut spawned) = self.spawned.lock() {
            spawned.retain(|h| !h.is_finished());
            spawned.push(handle);
        }
    }
}
