// Periodic re-render timer, at most one per graph session
use std::future::Future;
use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::AbortHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// Cancels the timer it was returned for
#[derive(Debug, Clone)]
pub struct RefreshHandle {
    task: Arc<AbortHandle>,
}

impl RefreshHandle {
    pub fn cancel(&self) {
        self.task.abort();
    }

    pub fn is_active(&self) -> bool {
        !self.task.is_finished()
    }
}

#[derive(Debug, Default)]
pub struct RefreshScheduler {
    current: Option<RefreshHandle>,
}

impl RefreshScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `tick` every `period`, first after one full period. A tick runs to
    /// completion before the next is awaited, so ticks never overlap; a tick
    /// returning `Break` stops the timer. Any previous timer is cancelled.
    pub fn schedule<F, Fut>(&mut self, period: Duration, mut tick: F) -> RefreshHandle
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ControlFlow<()>> + Send + 'static,
    {
        self.cancel();

        let task = tokio::spawn(async move {
            let mut interval = interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                interval.tick().await;
                if tick().await.is_break() {
                    break;
                }
            }
        });

        let handle = RefreshHandle {
            task: Arc::new(task.abort_handle()),
        };
        self.current = Some(handle.clone());
        handle
    }

    pub fn cancel(&mut self) {
        if let Some(handle) = self.current.take() {
            handle.cancel();
        }
    }

    pub fn is_active(&self) -> bool {
        self.current.as_ref().is_some_and(RefreshHandle::is_active)
    }
}

impl Drop for RefreshScheduler {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting(counter: &Arc<AtomicUsize>) -> impl FnMut() -> std::future::Ready<ControlFlow<()>> + Send + 'static {
        let counter = counter.clone();
        move || {
            counter.fetch_add(1, Ordering::SeqCst);
            std::future::ready(ControlFlow::Continue(()))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_every_period() {
        let mut scheduler = RefreshScheduler::new();
        let count = Arc::new(AtomicUsize::new(0));

        scheduler.schedule(Duration::from_secs(10), counting(&count));
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(count.load(Ordering::SeqCst), 3);
        assert!(scheduler.is_active());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reschedule_cancels_previous() {
        let mut scheduler = RefreshScheduler::new();
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));

        let first_handle = scheduler.schedule(Duration::from_secs(10), counting(&first));
        tokio::time::sleep(Duration::from_secs(15)).await;
        assert_eq!(first.load(Ordering::SeqCst), 1);

        let second_handle = scheduler.schedule(Duration::from_secs(10), counting(&second));
        tokio::time::sleep(Duration::from_secs(35)).await;

        assert_eq!(first.load(Ordering::SeqCst), 1);
        assert_eq!(second.load(Ordering::SeqCst), 3);
        assert!(!first_handle.is_active());
        assert!(second_handle.is_active());
    }

    #[tokio::test(start_paused = true)]
    async fn test_break_stops_timer() {
        let mut scheduler = RefreshScheduler::new();
        let count = Arc::new(AtomicUsize::new(0));
        let ticks = count.clone();

        let handle = scheduler.schedule(Duration::from_secs(1), move || {
            let n = ticks.fetch_add(1, Ordering::SeqCst) + 1;
            std::future::ready(if n == 2 {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            })
        });

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(count.load(Ordering::SeqCst), 2);
        assert!(!handle.is_active());
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels() {
        let count = Arc::new(AtomicUsize::new(0));
        let handle = {
            let mut scheduler = RefreshScheduler::new();
            scheduler.schedule(Duration::from_secs(1), counting(&count))
        };

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert!(!handle.is_active());
    }
}
