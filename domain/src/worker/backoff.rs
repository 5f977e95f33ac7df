//! Bounded exponential-backoff polling.

use log::*;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, PartialEq)]
pub struct Backoff {
    pub initial: Duration,
    pub multiplier: u32,
    pub max_delay: Duration,
    pub max_attempts: u32,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            initial: Duration::from_secs(1),
            multiplier: 2,
            max_delay: Duration::from_secs(30),
            max_attempts: 120,
        }
    }
}

impl Backoff {
    /// Wait before the zero-based `attempt`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = self.multiplier.checked_pow(attempt).unwrap_or(u32::MAX);
        self.initial
            .checked_mul(factor)
            .map_or(self.max_delay, |delay| delay.min(self.max_delay))
    }
}

#[derive(Debug, PartialEq)]
pub enum PollError<E> {
    Exhausted { attempts: u32 },
    Cancelled,
    Failed(E),
}

/// Calls `probe` until `is_done` accepts its result, sleeping before every attempt.
///
/// Errors accepted by `is_transient` consume an attempt and are retried; any other error
/// ends polling. Cancellation is observed during every wait.
pub async fn poll_until<S, E, F, Fut, D, T>(
    policy: &Backoff,
    cancel: &CancellationToken,
    mut probe: F,
    is_done: D,
    is_transient: T,
) -> Result<S, PollError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<S, E>>,
    D: Fn(&S) -> bool,
    T: Fn(&E) -> bool,
    E: Display,
{
    for attempt in 0..policy.max_attempts {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(PollError::Cancelled),
            _ = tokio::time::sleep(policy.delay_for(attempt)) => {}
        }

        match probe().await {
            Ok(state) if is_done(&state) => return Ok(state),
            Ok(_) => trace!("Attempt {} of {}: not done yet", attempt + 1, policy.max_attempts),
            Err(e) if is_transient(&e) => {
                warn!("Attempt {} of {} failed, retrying: {e}", attempt + 1, policy.max_attempts)
            }
            Err(e) => return Err(PollError::Failed(e)),
        }
    }

    Err(PollError::Exhausted {
        attempts: policy.max_attempts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::Instant;

    fn policy(max_attempts: u32) -> Backoff {
        Backoff {
            max_attempts,
            ..Backoff::default()
        }
    }

    #[test]
    fn delays_double_until_capped() {
        let delays: Vec<u64> = (0..8)
            .map(|attempt| Backoff::default().delay_for(attempt).as_secs())
            .collect();
        assert_eq!(delays, vec![1, 2, 4, 8, 16, 30, 30, 30]);
        assert_eq!(Backoff::default().delay_for(200), Duration::from_secs(30));
    }

    #[tokio::test(start_paused = true)]
    async fn sleeps_before_each_attempt_until_done() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let started = Instant::now();

        let result: Result<u32, PollError<String>> = poll_until(
            &policy(10),
            &CancellationToken::new(),
            move || async move { Ok(counter.fetch_add(1, Ordering::SeqCst) + 1) },
            |n| *n == 3,
            |_| true,
        )
        .await;

        assert_eq!(result, Ok(3));
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(7) && elapsed < Duration::from_secs(8));
    }

    #[tokio::test(start_paused = true)]
    async fn transient_errors_are_retried() {
        let calls = AtomicU32::new(0);
        let counter = &calls;

        let result = poll_until(
            &policy(5),
            &CancellationToken::new(),
            move || async move {
                match counter.fetch_add(1, Ordering::SeqCst) {
                    0 | 1 => Err("connection reset".to_string()),
                    _ => Ok("done"),
                }
            },
            |_| true,
            |_| true,
        )
        .await;

        assert_eq!(result, Ok("done"));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn permanent_error_stops_polling() {
        let calls = AtomicU32::new(0);
        let counter = &calls;

        let result: Result<(), _> = poll_until(
            &policy(5),
            &CancellationToken::new(),
            move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err("status 404".to_string())
            },
            |_| true,
            |_| false,
        )
        .await;

        assert_eq!(result, Err(PollError::Failed("status 404".to_string())));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_max_attempts() {
        let calls = AtomicU32::new(0);
        let counter = &calls;

        let result: Result<bool, PollError<String>> = poll_until(
            &policy(4),
            &CancellationToken::new(),
            move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(false)
            },
            |done| *done,
            |_| true,
        )
        .await;

        assert_eq!(result, Err(PollError::Exhausted { attempts: 4 }));
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_interrupts_the_wait() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let calls = AtomicU32::new(0);
        let counter = &calls;

        let result: Result<bool, PollError<String>> = poll_until(
            &policy(120),
            &cancel,
            move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(true)
            },
            |done| *done,
            |_| true,
        )
        .await;

        assert_eq!(result, Err(PollError::Cancelled));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
