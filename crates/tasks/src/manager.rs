use std::{
    any::Any,
    future::Future,
    panic,
    pin::pin,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc,
    },
    time::{Duration, Instant},
};

use futures_util::{future::select, FutureExt};
use tokio::{
    runtime::Handle,
    sync::{mpsc, Notify},
};
use tracing::*;

/// Why a critical task brought the process down.
#[derive(Debug, thiserror::Error)]
pub enum CriticalTaskError {
    #[error("critical task `{task}` panicked: {}", .reason.as_deref().unwrap_or("<non-string payload>"))]
    Panicked {
        task: String,
        reason: Option<String>,
    },

    #[error("critical task `{task}` failed: {error}")]
    Failed { task: String, error: anyhow::Error },
}

impl CriticalTaskError {
    fn from_panic(task: &str, payload: Box<dyn Any + Send>) -> Self {
        let reason = match payload.downcast::<String>() {
            Ok(s) => Some(*s),
            Err(payload) => payload.downcast::<&str>().ok().map(|s| s.to_string()),
        };
        Self::Panicked {
            task: task.to_string(),
            reason,
        }
    }

    pub fn task_name(&self) -> &str {
        match self {
            Self::Panicked { task, .. } | Self::Failed { task, .. } => task,
        }
    }
}

/// Process-wide shutdown trigger.
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    fired: Arc<AtomicBool>,
    notify: Arc<Notify>,
}

impl ShutdownSignal {
    fn new() -> Self {
        Self {
            fired: Arc::new(AtomicBool::new(false)),
            notify: Arc::new(Notify::new()),
        }
    }

    /// Send shutdown signal
    pub fn send(&self) {
        self.fired.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    pub fn is_sent(&self) -> bool {
        self.fired.load(Ordering::SeqCst)
    }

    async fn wait(&self) {
        loop {
            // Register before checking the flag so a send in between isn't lost.
            let notified = self.notify.notified();
            if self.is_sent() {
                return;
            }
            notified.await;
        }
    }
}

/// Handed to tasks that want to observe shutdown. Counts as a pending task
/// until dropped.
#[derive(Debug)]
pub struct ShutdownGuard {
    signal: ShutdownSignal,
    pending: Arc<AtomicUsize>,
}

impl ShutdownGuard {
    fn new(signal: ShutdownSignal, pending: Arc<AtomicUsize>) -> Self {
        pending.fetch_add(1, Ordering::SeqCst);
        Self { signal, pending }
    }

    /// Check if shutdown signal has been sent
    pub fn should_shutdown(&self) -> bool {
        self.signal.is_sent()
    }

    /// Waits until shutdown signal is sent
    pub async fn wait_for_shutdown(&self) {
        self.signal.wait().await
    }
}

impl Drop for ShutdownGuard {
    fn drop(&mut self) {
        self.pending.fetch_sub(1, Ordering::SeqCst);
    }
}

pub struct TaskManager {
    tokio_handle: Handle,
    failures_tx: mpsc::UnboundedSender<CriticalTaskError>,
    failures_rx: mpsc::UnboundedReceiver<CriticalTaskError>,
    shutdown_signal: ShutdownSignal,
    pending_tasks: Arc<AtomicUsize>,
}

impl TaskManager {
    pub fn new(tokio_handle: Handle) -> Self {
        let (failures_tx, failures_rx) = mpsc::unbounded_channel();

        Self {
            tokio_handle,
            failures_tx,
            failures_rx,
            shutdown_signal: ShutdownSignal::new(),
            pending_tasks: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn executor(&self) -> TaskExecutor {
        TaskExecutor {
            tokio_handle: self.tokio_handle.clone(),
            failures_tx: self.failures_tx.clone(),
            shutdown_signal: self.shutdown_signal.clone(),
            pending_tasks: self.pending_tasks.clone(),
        }
    }

    /// Get shutdown signal trigger
    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.shutdown_signal.clone()
    }

    /// Sends shutdown on the first ctrl-c.
    pub fn start_signal_listeners(&self) {
        let shutdown_signal = self.shutdown_signal();

        self.tokio_handle.spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("got INT, initiating shutdown");
                shutdown_signal.send();
            }
        });
    }

    /// Blocks until either a critical task fails or shutdown is requested,
    /// then signals shutdown to everyone and waits up to `shutdown_timeout`
    /// for guarded tasks to wind down.
    ///
    /// Returns the first critical failure, if that's what ended the wait.
    pub fn monitor(mut self, shutdown_timeout: Option<Duration>) -> Result<(), CriticalTaskError> {
        let signal = self.shutdown_signal.clone();
        let res = self.tokio_handle.clone().block_on(async {
            tokio::select! {
                failure = self.failures_rx.recv() => match failure {
                    Some(err) => Err(err),
                    None => Ok(()),
                },
                _ = signal.wait() => Ok(()),
            }
        });

        self.shutdown_signal.send();
        if !self.wait_for_graceful_shutdown(shutdown_timeout) {
            info!("shutdown timeout expired, forcing shutdown");
        }

        res
    }

    fn wait_for_graceful_shutdown(&self, timeout: Option<Duration>) -> bool {
        let deadline = timeout.map(|t| Instant::now() + t);
        while self.pending_tasks.load(Ordering::SeqCst) > 0 {
            if deadline.is_some_and(|d| Instant::now() > d) {
                debug!("graceful shutdown timed out");
                return false;
            }
            std::thread::sleep(Duration::from_millis(10));
        }

        debug!("gracefully shut down");
        true
    }
}

/// Spawns critical tasks onto the runtime.
#[derive(Debug, Clone)]
pub struct TaskExecutor {
    tokio_handle: Handle,
    failures_tx: mpsc::UnboundedSender<CriticalTaskError>,
    shutdown_signal: ShutdownSignal,
    pending_tasks: Arc<AtomicUsize>,
}

impl TaskExecutor {
    /// Spawns `fut` as a critical task that is dropped when shutdown is sent.
    pub fn spawn_critical_async(
        &self,
        name: impl Into<String>,
        fut: impl Future<Output = anyhow::Result<()>> + Send + 'static,
    ) -> tokio::task::JoinHandle<()> {
        let signal = self.shutdown_signal.clone();
        let supervised = self.supervise(name.into(), fut);

        self.tokio_handle.spawn(async move {
            let task = pin!(supervised);
            let shutdown = pin!(signal.wait());
            let _ = select(shutdown, task).await;
        })
    }

    /// Spawns a critical task that is handed a [`ShutdownGuard`] and is
    /// expected to wind itself down.
    pub fn spawn_critical_async_with_shutdown<F>(
        &self,
        name: impl Into<String>,
        async_func: impl FnOnce(ShutdownGuard) -> F,
    ) -> tokio::task::JoinHandle<()>
    where
        F: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let fut = async_func(self.shutdown_guard());
        self.tokio_handle.spawn(self.supervise(name.into(), fut))
    }

    /// Creates a guard for code that isn't spawned through this executor but
    /// still wants to observe shutdown.
    pub fn shutdown_guard(&self) -> ShutdownGuard {
        ShutdownGuard::new(self.shutdown_signal.clone(), self.pending_tasks.clone())
    }

    fn supervise(
        &self,
        name: String,
        fut: impl Future<Output = anyhow::Result<()>> + Send + 'static,
    ) -> impl Future<Output = ()> + Send + 'static {
        let failures_tx = self.failures_tx.clone();

        async move {
            let failure = match panic::AssertUnwindSafe(fut).catch_unwind().await {
                Ok(Ok(())) => return,
                Ok(Err(error)) => CriticalTaskError::Failed { task: name, error },
                Err(payload) => CriticalTaskError::from_panic(&name, payload),
            };

            error!("{failure}");
            let _ = failures_tx.send(failure);
        }
    }
}
