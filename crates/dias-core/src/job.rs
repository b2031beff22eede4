//! Background execution of one assembly at a time.
//!
//! A worker thread runs the job and hands its outcome to a monitor thread
//! over a one-slot channel; the monitor invokes the completion callback.
//! Submissions while a job is in flight are rejected, not queued.

use crate::AssemblyOutcome;
use crate::AssemblyRequest;
use crate::CancellationToken;
use crate::PackageAssembler;
use crate::PackageError;
use crate::Result;
use std::any::Any;
use std::panic;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::PoisonError;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::thread;
use std::thread::JoinHandle;

/// Runs at most one job at a time on a dedicated worker thread.
///
/// # Examples
///
/// ```
/// use dias_core::AssemblyOutcome;
/// use dias_core::JobRunner;
/// use std::sync::mpsc;
///
/// let runner = JobRunner::new();
/// let (tx, rx) = mpsc::channel();
/// runner.submit(
///     |_token| AssemblyOutcome::Failed { message: "nothing to do".into() },
///     move |outcome| tx.send(outcome.message()).unwrap(),
/// )?;
/// runner.wait();
/// assert_eq!(rx.recv().unwrap(), "nothing to do");
/// # Ok::<(), dias_core::PackageError>(())
/// ```
#[derive(Debug, Default)]
pub struct JobRunner {
    running: Arc<AtomicBool>,
    cancel: CancellationToken,
    monitor: Mutex<Option<JoinHandle<()>>>,
}

impl JobRunner {
    /// Creates an idle runner.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts `job` on a worker thread; `on_complete` runs exactly once with
    /// its outcome, on the monitor thread.
    ///
    /// A panicking job is reported as [`AssemblyOutcome::Failed`].
    ///
    /// # Errors
    ///
    /// Returns [`PackageError::JobRejected`] while another job is running,
    /// or an I/O error if a thread cannot be spawned.
    pub fn submit<J, C>(&self, job: J, on_complete: C) -> Result<()>
    where
        J: FnOnce(CancellationToken) -> AssemblyOutcome + Send + 'static,
        C: FnOnce(AssemblyOutcome) + Send + 'static,
    {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            tracing::warn!("a package job is already running, submission rejected");
            return Err(PackageError::JobRejected);
        }

        self.cancel.reset();

        let (tx, rx) = crossbeam_channel::bounded::<AssemblyOutcome>(1);
        let token = self.cancel.clone();
        let worker = thread::Builder::new()
            .name("dias-worker".to_string())
            .spawn(move || {
                let outcome = panic::catch_unwind(AssertUnwindSafe(|| job(token)))
                    .unwrap_or_else(|payload| AssemblyOutcome::Failed {
                        message: format!("Package creation failed: {}", panic_message(&*payload)),
                    });
                let _ = tx.send(outcome);
            })
            .map_err(|e| {
                self.running.store(false, Ordering::SeqCst);
                PackageError::Io(e)
            })?;

        let running = Arc::clone(&self.running);
        // The slot stays locked until the handle is stored, so a submission
        // made from `on_complete` lands after this one.
        let mut slot = self.monitor_slot();
        let monitor = thread::Builder::new()
            .name("dias-monitor".to_string())
            .spawn(move || {
                let outcome = rx.recv().unwrap_or_else(|_| AssemblyOutcome::Failed {
                    message: "Package creation failed: worker exited without a result"
                        .to_string(),
                });
                let _ = worker.join();
                running.store(false, Ordering::SeqCst);
                tracing::debug!(success = outcome.is_success(), "job finished");
                on_complete(outcome);
            })
            .map_err(|e| {
                self.running.store(false, Ordering::SeqCst);
                PackageError::Io(e)
            })?;

        *slot = Some(monitor);
        drop(slot);
        tracing::debug!("job submitted");
        Ok(())
    }

    /// Submits an assembly run wired to this runner's cancellation token.
    ///
    /// # Errors
    ///
    /// Same as [`submit`](Self::submit).
    pub fn submit_assembly<C>(
        &self,
        assembler: PackageAssembler,
        request: AssemblyRequest,
        on_complete: C,
    ) -> Result<()>
    where
        C: FnOnce(AssemblyOutcome) + Send + 'static,
    {
        self.submit(
            move |token| assembler.with_cancellation(token).assemble(&request),
            on_complete,
        )
    }

    /// Returns `true` while a job is in flight.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Requests cancellation of the running job.
    pub fn cancel(&self) {
        if self.is_running() {
            tracing::info!("cancellation requested");
        }
        self.cancel.cancel();
    }

    /// Token shared with the running job.
    #[must_use]
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Blocks until the current job and its completion callback finished,
    /// including any job the callback submitted in turn.
    pub fn wait(&self) {
        loop {
            let Some(handle) = self.monitor_slot().take() else {
                break;
            };
            if handle.join().is_err() {
                tracing::error!("completion callback panicked");
            }
        }
    }

    fn monitor_slot(&self) -> std::sync::MutexGuard<'_, Option<JoinHandle<()>>> {
        self.monitor.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "job panicked".to_string())
}
