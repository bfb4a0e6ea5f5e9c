//! Runtime metrics — track request counts, chat turns, voice commands, errors.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Global metrics collector.
#[derive(Debug, Default)]
pub struct Metrics {
    pub requests_total: AtomicU64,
    pub requests_success: AtomicU64,
    pub requests_error: AtomicU64,
    pub chat_turns: AtomicU64,
    pub voice_commands: AtomicU64,
    pub voice_fallbacks: AtomicU64,
    pub sessions_started: AtomicU64,
    pub sessions_completed: AtomicU64,
    start_time: Option<Instant>,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            start_time: Some(Instant::now()),
            ..Default::default()
        }
    }

    pub fn record_request(&self, success: bool) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);
        if success {
            self.requests_success.fetch_add(1, Ordering::Relaxed);
        } else {
            self.requests_error.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_chat_turn(&self) {
        self.chat_turns.fetch_add(1, Ordering::Relaxed);
    }

    /// `fallback` marks commands answered with the fixed apology.
    pub fn record_voice_command(&self, fallback: bool) {
        self.voice_commands.fetch_add(1, Ordering::Relaxed);
        if fallback {
            self.voice_fallbacks.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_session_started(&self) {
        self.sessions_started.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_session_completed(&self) {
        self.sessions_completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn uptime_secs(&self) -> u64 {
        self.start_time.map(|t| t.elapsed().as_secs()).unwrap_or(0)
    }

    /// Export as JSON.
    pub fn to_json(&self) -> serde_json::Value {
        let uptime = self.uptime_secs();
        let hours = uptime / 3600;
        let minutes = (uptime % 3600) / 60;
        let seconds = uptime % 60;

        serde_json::json!({
            "uptime": format!("{}h {}m {}s", hours, minutes, seconds),
            "uptime_secs": uptime,
            "requests": {
                "total": self.requests_total.load(Ordering::Relaxed),
                "success": self.requests_success.load(Ordering::Relaxed),
                "errors": self.requests_error.load(Ordering::Relaxed),
            },
            "chat_turns": self.chat_turns.load(Ordering::Relaxed),
            "voice": {
                "commands": self.voice_commands.load(Ordering::Relaxed),
                "fallbacks": self.voice_fallbacks.load(Ordering::Relaxed),
            },
            "workout_sessions": {
                "started": self.sessions_started.load(Ordering::Relaxed),
                "completed": self.sessions_completed.load(Ordering::Relaxed),
            },
        })
    }
}

/// Shared metrics instance.
pub type SharedMetrics = Arc<Metrics>;

pub fn new_metrics() -> SharedMetrics {
    Arc::new(Metrics::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_show_up_in_json() {
        let metrics = Metrics::new();
        metrics.record_request(true);
        metrics.record_request(false);
        metrics.record_chat_turn();
        metrics.record_voice_command(true);

        let json = metrics.to_json();
        assert_eq!(json["requests"]["total"], 2);
        assert_eq!(json["requests"]["errors"], 1);
        assert_eq!(json["chat_turns"], 1);
        assert_eq!(json["voice"]["fallbacks"], 1);
    }
}
