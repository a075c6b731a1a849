//! Bounded in-flight window: caps how many result pages (or, for a single
//! caller, how many concurrent sub-dispatches feeding a page) may be
//! outstanding at once, so one fast producer cannot unbounded-queue work
//! ahead of a slow consumer.

use std::sync::Arc;

use tokio::sync::{AcquireError, OwnedSemaphorePermit, Semaphore};

pub struct InFlightWindow {
    semaphore: Arc<Semaphore>,
}

impl InFlightWindow {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(capacity.max(1))),
        }
    }

    /// Blocks until a slot is free, then reserves it until the returned
    /// guard is dropped.
    pub async fn acquire(&self) -> Result<OwnedSemaphorePermit, AcquireError> {
        self.semaphore.clone().acquire_owned().await
    }

    #[must_use]
    pub fn available_permits(&self) -> usize {
        self.semaphore.available_permits()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn second_acquire_waits_for_the_first_to_release() {
        let window = Arc::new(InFlightWindow::new(1));
        let first = window.acquire().await.unwrap();
        assert_eq!(window.available_permits(), 0);

        let window2 = window.clone();
        let waiter = tokio::spawn(async move {
            let _permit = window2.acquire().await.unwrap();
        });

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished(), "second acquire should still be blocked");

        drop(first);
        waiter.await.unwrap();
    }
}
