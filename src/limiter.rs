//! Request pacing shared across workers

use parking_lot::Mutex;

use tokio::time::Instant;

use std::time::Duration;

/// Hands out evenly spaced time slots to every worker that shares it.
///
/// The request rate toward the remote stays at one request per `interval`
/// no matter how many workers are running, instead of scaling with the
/// worker count.
#[derive(Debug)]
pub struct RateLimiter {
    interval: Duration,
    next_slot: Mutex<Instant>,
}

impl RateLimiter {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_slot: Mutex::new(Instant::now()),
        }
    }

    /// Claims the next free slot and sleeps until it comes up
    pub async fn acquire(&self) {
        let slot = {
            let mut next = self.next_slot.lock();
            let slot = (*next).max(Instant::now());
            *next = slot + self.interval;

            slot
        };

        tokio::time::sleep_until(slot).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn spaces_acquisitions_by_the_interval() {
        let limiter = RateLimiter::new(Duration::from_millis(100));
        let started = Instant::now();

        for _ in 0..5 {
            limiter.acquire().await;
        }

        // first slot is immediate, the remaining four are spaced out
        assert!(started.elapsed() >= Duration::from_millis(400));
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_acquirers_do_not_share_a_slot() {
        let limiter = std::sync::Arc::new(RateLimiter::new(Duration::from_millis(50)));
        let started = Instant::now();

        let tasks: Vec<_> = (0..4)
            .map(|_| {
                let limiter = std::sync::Arc::clone(&limiter);
                tokio::spawn(async move { limiter.acquire().await })
            })
            .collect();

        for task in tasks {
            task.await.unwrap();
        }

        assert!(started.elapsed() >= Duration::from_millis(150));
    }

    #[tokio::test]
    async fn zero_interval_does_not_block() {
        let limiter = RateLimiter::new(Duration::ZERO);

        for _ in 0..16 {
            limiter.acquire().await;
        }
    }
}
