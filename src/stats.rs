use std::collections::VecDeque;
use std::time::{Duration, Instant};

use serde::Serialize;

/// Moving average over timestamped hash-rate samples
#[derive(Debug, Clone)]
pub struct MovingAverage {
    samples: VecDeque<(Instant, f64)>,
    max_age: Duration,
}

impl MovingAverage {
    pub fn new(max_age: Duration) -> Self {
        Self {
            samples: VecDeque::new(),
            max_age,
        }
    }

    /// Record a new rate sample and drop samples older than max_age
    pub fn update(&mut self, rate: f64) {
        let now = Instant::now();
        self.samples.push_back((now, rate));
        while self
            .samples
            .front()
            .is_some_and(|(time, _)| now.duration_since(*time) > self.max_age)
        {
            self.samples.pop_front();
        }
    }

    /// Average rate over the trailing window, in seconds. Falls back to
    /// the most recent sample when the window is still empty.
    pub fn get_average(&self, window_secs: u64) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }

        let now = Instant::now();
        let window = Duration::from_secs(window_secs);
        let in_window: Vec<f64> = self
            .samples
            .iter()
            .filter(|(time, _)| now.duration_since(*time) <= window)
            .map(|(_, rate)| *rate)
            .collect();

        if in_window.is_empty() {
            return self.samples.back().map(|(_, rate)| *rate).unwrap_or(0.0);
        }

        in_window.iter().sum::<f64>() / in_window.len() as f64
    }
}

/// Cumulative search statistics with periodic hash-rate sampling
#[derive(Debug, Clone)]
pub struct MiningStats {
    pub total_attempts: u64,
    pub current_rate: f64,
    moving_avg: MovingAverage,
    pub start_time: Instant,
    last_sample_attempts: u64,
    last_sample_time: Instant,
}

impl MiningStats {
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            total_attempts: 0,
            current_rate: 0.0,
            moving_avg: MovingAverage::new(Duration::from_secs(900)),
            start_time: now,
            last_sample_attempts: 0,
            last_sample_time: now,
        }
    }

    /// Record the cumulative attempt counter reported by the search loop
    pub fn record_attempts(&mut self, total_attempts: u64) {
        self.total_attempts = total_attempts;
    }

    /// Sample the hash rate from the attempts accumulated since the last
    /// sample. Call on a fixed display interval.
    pub fn sample_hashrate(&mut self) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_sample_time).as_secs_f64();
        if elapsed < 0.1 {
            return;
        }

        let delta = self.total_attempts.saturating_sub(self.last_sample_attempts);
        if delta > 0 {
            let rate = delta as f64 / elapsed;
            self.current_rate = rate;
            self.moving_avg.update(rate);
            tracing::trace!("sampled {} attempts in {:.3}s = {:.0} H/s", delta, elapsed, rate);
        }

        self.last_sample_attempts = self.total_attempts;
        self.last_sample_time = now;
    }

    /// Average hash rate over a trailing window
    pub fn average_rate(&self, window_secs: u64) -> f64 {
        self.moving_avg.get_average(window_secs)
    }

    /// Overall rate since the start of the search
    pub fn overall_rate(&self) -> f64 {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.total_attempts as f64 / elapsed
        } else {
            0.0
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }
}

impl Default for MiningStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Expected attempts before a match at the given difficulty, assuming a
/// uniformly distributed digest: one in 16 per added hex character.
/// Display estimation only, never a correctness input.
pub fn expected_attempts(difficulty: u32) -> f64 {
    16f64.powi(difficulty as i32)
}

/// Estimated seconds until a match at the current rate. Infinite when the
/// rate is unknown.
pub fn eta_secs(difficulty: u32, total_attempts: u64, rate: f64) -> f64 {
    if rate <= 0.0 {
        return f64::INFINITY;
    }
    let remaining = expected_attempts(difficulty) - total_attempts as f64;
    remaining.max(0.0) / rate
}

/// Human-readable duration: seconds, minutes, hours or days
pub fn format_duration(seconds: f64) -> String {
    if seconds.is_infinite() || seconds.is_nan() {
        return "...".to_string();
    }
    if seconds < 60.0 {
        format!("{:.1}s", seconds)
    } else if seconds < 3600.0 {
        format!("{:.1} min", seconds / 60.0)
    } else if seconds < 86400.0 * 2.0 {
        format!("{:.1} hours", seconds / 3600.0)
    } else {
        format!("{:.1} days", seconds / 86400.0)
    }
}

/// Decimal count with thousands separators
pub fn format_count(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Final machine-readable result of one search
#[derive(Clone, Debug, Serialize)]
pub struct SearchSummary {
    pub data: String,
    pub difficulty: u32,
    pub found: bool,
    pub nonce: Option<u64>,
    pub digest: Option<String>,
    pub total_attempts: u64,
    pub elapsed_secs: f64,
    pub hash_rate: f64,
}
