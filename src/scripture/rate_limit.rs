use std::time::{Duration, Instant};

use tracing::info;

#[derive(Debug, Clone)]
pub struct RequestWindow {
    max_requests: u32,
    window: Duration,
    window_start: Option<Instant>,
    count: u32,
}

const SLACK: Duration = Duration::from_secs(1);

impl RequestWindow {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests: max_requests.max(1),
            window,
            window_start: None,
            count: 0,
        }
    }

    pub fn delay_needed(&self, now: Instant) -> Option<Duration> {
        let start = self.window_start?;
        if self.count < self.max_requests {
            return None;
        }
        let elapsed = now.saturating_duration_since(start);
        (elapsed < self.window).then(|| self.window - elapsed + SLACK)
    }

    pub fn record(&mut self, now: Instant) {
        let expired = self
            .window_start
            .is_none_or(|start| now.saturating_duration_since(start) >= self.window);
        if expired || self.count >= self.max_requests {
            self.window_start = Some(now);
            self.count = 0;
        }
        self.count += 1;
    }

    pub fn acquire(&mut self) {
        if let Some(delay) = self.delay_needed(Instant::now()) {
            info!(
                wait_secs = delay.as_secs(),
                max_requests = self.max_requests,
                "rate limit reached; sleeping"
            );
            std::thread::sleep(delay);
        }
        self.record(Instant::now());
    }
}
