// Copyright (c) Microsoft. All rights reserved.

use std::time::Duration;

use rand::Rng;

/// Backoff applied when IoT Central throttles a request and does not say how long to wait.
pub const DEFAULT_BACKOFF: Backoff<4> = Backoff {
    pattern: [
        BackoffInstance::new(Duration::from_secs(5), Duration::from_secs(2)),
        BackoffInstance::new(Duration::from_secs(15), Duration::from_secs(5)),
        BackoffInstance::new(Duration::from_secs(30), Duration::from_secs(10)),
        BackoffInstance::new(Duration::from_secs(60), Duration::from_secs(15)),
    ],
};

pub struct Backoff<const N: usize> {
    pattern: [BackoffInstance; N],
}

impl<const N: usize> Backoff<N> {
    #[allow(clippy::unused_self, clippy::cast_possible_truncation)]
    pub fn max_retries(&self) -> u32 {
        N as u32
    }

    /// Computes backoff for current try. Returns None if no retry attempts left
    pub fn get_backoff_duration(&self, current_attempt: u32) -> Option<Duration> {
        let index = usize::try_from(current_attempt).ok()?.checked_sub(1)?;

        self.pattern.get(index).map(BackoffInstance::backoff_duration)
    }

    /// Longest delay the pattern can produce, jitter included.
    pub fn max_delay(&self) -> Duration {
        self.pattern
            .iter()
            .map(|instance| instance.duration + instance.max_jitter)
            .max()
            .unwrap_or_default()
    }

    /// Like [`Backoff::get_backoff_duration`], but a server-provided `Retry-After`
    /// replaces the computed delay as long as attempts remain. `Retry-After` is
    /// capped at [`Backoff::max_delay`].
    pub fn get_throttle_duration(
        &self,
        current_attempt: u32,
        retry_after: Option<Duration>,
    ) -> Option<Duration> {
        let computed = self.get_backoff_duration(current_attempt)?;

        Some(retry_after.map_or(computed, |retry_after| retry_after.min(self.max_delay())))
    }
}

pub struct BackoffInstance {
    duration: Duration,
    max_jitter: Duration,
}

impl BackoffInstance {
    const fn new(duration: Duration, max_jitter: Duration) -> Self {
        Self {
            duration,
            max_jitter,
        }
    }

    fn backoff_duration(&self) -> Duration {
        let mut rng = rand::thread_rng();
        let jitter_multiple = rng.gen_range(0.0..1.0);

        self.duration + self.max_jitter.mul_f32(jitter_multiple)
    }
}
