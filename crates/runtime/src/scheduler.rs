//! Cooperative task scheduling.
//!
//! Tasks are tokio tasks: they run until they reach a suspension point
//! (an `.await` on a channel, a stream, a timer or [`yield_now`]) and are
//! never preempted in between. A [`Scheduler`] owns the pool of OS threads
//! the tasks are multiplexed on; one worker gives a single-threaded
//! cooperative scheduler.

use std::future::Future;
use std::io;
use std::time::Duration;

use thiserror::Error;
use tokio::runtime::{Builder, Handle, Runtime};
use tokio::task::JoinHandle;
use tracing::trace;

use crate::Deadline;

/// Owns the execution contexts tasks are scheduled on.
#[derive(Debug)]
pub struct Scheduler {
    runtime: Runtime,
}

impl Scheduler {
    /// Builds a scheduler with `workers` OS threads.
    ///
    /// A single worker runs every task on the calling thread.
    pub fn new(workers: usize) -> io::Result<Self> {
        let runtime = if workers <= 1 {
            Builder::new_current_thread().enable_all().build()?
        } else {
            Builder::new_multi_thread().worker_threads(workers).enable_all().build()?
        };

        trace!(workers, "scheduler started");
        Ok(Self { runtime })
    }

    /// Runs `future` to completion, driving every task spawned from it.
    pub fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }

    pub fn handle(&self) -> &Handle {
        self.runtime.handle()
    }
}

#[derive(Debug, Error)]
pub enum TaskError {
    #[error("task panicked")]
    Panicked,

    #[error("task was cancelled")]
    Cancelled,
}

/// Handle to a spawned task.
///
/// Dropping the handle detaches the task, it keeps running.
#[derive(Debug)]
pub struct Task<T> {
    handle: JoinHandle<T>,
}

impl<T> Task<T> {
    /// Waits for the task to finish.
    pub async fn join(self) -> Result<T, TaskError> {
        self.handle.await.map_err(|e| if e.is_panic() { TaskError::Panicked } else { TaskError::Cancelled })
    }

    /// Stops the task at its next suspension point.
    pub fn abort(&self) {
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

/// Schedules `future` as an independent task and returns immediately.
///
/// A panic inside the task is contained in the task, see [`Task::join`].
pub fn spawn<F>(future: F) -> Task<F::Output>
where
    F: Future + Send + 'static,
    F::Output: Send + 'static,
{
    Task { handle: tokio::spawn(future) }
}

/// Spawns a fallible task, handing any error it returns to `handler`.
pub fn spawn_with_failure_handler<F, T, E, H>(future: F, handler: H) -> Task<()>
where
    F: Future<Output = Result<T, E>> + Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
    H: FnOnce(E) + Send + 'static,
{
    spawn(async move {
        if let Err(e) = future.await {
            handler(e);
        }
    })
}

/// Cedes control to other tasks without delay.
pub async fn yield_now() {
    tokio::task::yield_now().await;
}

/// Suspends the calling task for at least `duration`.
pub async fn nap(duration: Duration) {
    tokio::time::sleep(duration).await;
}

/// Suspends the calling task until `deadline`.
///
/// Waiting for [`Deadline::Never`] never returns.
pub async fn wake_at(deadline: Deadline) {
    match deadline.instant() {
        Some(instant) => tokio::time::sleep_until(instant).await,
        None => std::future::pending().await,
    }
}

/// Runs `f` once, `duration` from now.
pub fn after<F, Fut>(duration: Duration, f: F) -> Task<()>
where
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    spawn(async move {
        nap(duration).await;
        f().await;
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Channel;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::time::Instant;

    #[tokio::test]
    async fn cooperative_workers() {
        let sum = Arc::new(AtomicUsize::new(0));

        let worker = |count: usize, n: usize| {
            let sum = Arc::clone(&sum);
            spawn(async move {
                for _ in 0..count {
                    sum.fetch_add(n, Ordering::SeqCst);
                    yield_now().await;
                }
            })
        };

        let tasks = vec![worker(3, 7), worker(1, 11), worker(2, 5)];
        for task in tasks {
            task.join().await.unwrap();
        }

        assert_eq!(sum.load(Ordering::SeqCst), 42);
    }

    #[tokio::test]
    async fn nap_resumes_in_order() {
        let channel = Channel::with_capacity(4);

        for millis in [30u64, 40, 10, 20] {
            let channel = channel.clone();
            spawn(async move {
                nap(Duration::from_millis(millis)).await;
                channel.send(millis, Deadline::never()).await.unwrap();
            });
        }

        for expected in [10u64, 20, 30, 40] {
            assert_eq!(channel.receive(Deadline::never()).await.unwrap(), expected);
        }
    }

    #[tokio::test]
    async fn after_runs_once() {
        let counter = Arc::new(AtomicUsize::new(0));
        let task = {
            let counter = Arc::clone(&counter);
            after(Duration::from_millis(5), move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
            })
        };

        task.join().await.unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn wake_at_deadline() {
        let instant = Instant::now() + Duration::from_millis(20);
        wake_at(Deadline::at(instant)).await;
        assert!(Instant::now() >= instant);
    }

    #[tokio::test]
    async fn failure_handler_receives_error() {
        let errors = Channel::with_capacity(1);
        let sink = errors.clone();

        spawn_with_failure_handler(async { Err::<(), _>("boom") }, move |e| {
            let _ = sink.try_send(e);
        })
        .join()
        .await
        .unwrap();

        assert_eq!(errors.try_receive(), Some("boom"));
    }

    #[tokio::test]
    async fn panic_stays_inside_task() {
        let task: Task<()> = spawn(async {
            panic!("task failure");
        });

        assert!(matches!(task.join().await, Err(TaskError::Panicked)));
    }

    #[test]
    fn single_worker_scheduler() {
        let scheduler = Scheduler::new(1).unwrap();
        let value = scheduler.block_on(async { spawn(async { 1 + 1 }).join().await.unwrap() });
        assert_eq!(value, 2);
    }
}
