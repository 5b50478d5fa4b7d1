// Poller state record and its transitions
use super::telemetry::TelemetrySample;
use chrono::{DateTime, Utc};
use serde::Serialize;

const FALLBACK_ERROR: &str = "Failed to fetch data";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PollerPhase {
    Idle,
    Fetching,
    LiveIdle,
    LiveFetching,
}

/// View state owned by the poller. Readers get clones or a watch borrow;
/// only the transitions below change it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PollerState {
    last_sample: Option<TelemetrySample>,
    last_error: Option<String>,
    live_enabled: bool,
    last_success_time: Option<DateTime<Utc>>,
    in_flight: usize,
    initial_load_done: bool,
    // Ticket of the most recent completion that was applied
    applied_ticket: u64,
}

impl PollerState {
    pub fn last_sample(&self) -> Option<&TelemetrySample> {
        self.last_sample.as_ref()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn is_fetching(&self) -> bool {
        self.in_flight > 0
    }

    pub fn live_enabled(&self) -> bool {
        self.live_enabled
    }

    pub fn last_success_time(&self) -> Option<DateTime<Utc>> {
        self.last_success_time
    }

    /// True once any fetch has completed, successfully or not
    pub fn initial_load_done(&self) -> bool {
        self.initial_load_done
    }

    /// Manual refresh is only offered outside live mode with nothing in flight.
    pub fn can_refresh(&self) -> bool {
        !self.live_enabled && !self.is_fetching()
    }

    pub fn phase(&self) -> PollerPhase {
        match (self.live_enabled, self.is_fetching()) {
            (false, false) => PollerPhase::Idle,
            (false, true) => PollerPhase::Fetching,
            (true, false) => PollerPhase::LiveIdle,
            (true, true) => PollerPhase::LiveFetching,
        }
    }

    /// Returns true when the flag actually changed.
    pub(crate) fn set_live_enabled(&mut self, enabled: bool) -> bool {
        if self.live_enabled == enabled {
            return false;
        }
        self.live_enabled = enabled;
        true
    }

    pub(crate) fn begin_fetch(&mut self) {
        self.in_flight += 1;
    }

    /// Applies a finished fetch. Completions older than the last applied
    /// ticket only release their in-flight slot. Returns whether the outcome
    /// was applied.
    pub(crate) fn complete_fetch(
        &mut self,
        ticket: u64,
        outcome: Result<TelemetrySample, String>,
        completed_at: DateTime<Utc>,
    ) -> bool {
        self.in_flight = self.in_flight.saturating_sub(1);
        self.initial_load_done = true;

        if ticket < self.applied_ticket {
            return false;
        }
        self.applied_ticket = ticket;

        match outcome {
            Ok(sample) => {
                self.last_sample = Some(sample);
                self.last_error = None;
                self.last_success_time = Some(completed_at);
            }
            Err(message) => {
                let message = if message.trim().is_empty() {
                    FALLBACK_ERROR.to_string()
                } else {
                    message
                };
                self.last_error = Some(message);
            }
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(temperature: f64) -> TelemetrySample {
        TelemetrySample::new(
            "esp32-1".to_string(),
            temperature,
            50.0,
            1000,
            "2024-01-01T00:00:00Z".to_string(),
        )
    }

    #[test]
    fn test_initial_state() {
        let state = PollerState::default();
        assert!(state.last_sample().is_none());
        assert!(state.last_error().is_none());
        assert!(!state.is_fetching());
        assert!(!state.live_enabled());
        assert!(!state.initial_load_done());
        assert_eq!(state.phase(), PollerPhase::Idle);
        assert!(state.can_refresh());
    }

    #[test]
    fn test_success_then_failure_keeps_sample() {
        let mut state = PollerState::default();
        let now = Utc::now();

        state.begin_fetch();
        assert_eq!(state.phase(), PollerPhase::Fetching);
        assert!(state.complete_fetch(1, Ok(sample(21.0)), now));
        assert_eq!(state.last_sample(), Some(&sample(21.0)));
        assert_eq!(state.last_success_time(), Some(now));
        assert!(!state.is_fetching());

        state.begin_fetch();
        assert!(state.complete_fetch(2, Err("Failed to fetch data (HTTP 500)".to_string()), Utc::now()));
        assert_eq!(state.last_sample(), Some(&sample(21.0)));
        assert_eq!(state.last_error(), Some("Failed to fetch data (HTTP 500)"));
        assert_eq!(state.last_success_time(), Some(now));

        state.begin_fetch();
        state.complete_fetch(3, Ok(sample(22.0)), Utc::now());
        assert!(state.last_error().is_none());
        assert_eq!(state.last_sample(), Some(&sample(22.0)));
    }

    #[test]
    fn test_empty_error_message_is_replaced() {
        let mut state = PollerState::default();
        state.begin_fetch();
        state.complete_fetch(1, Err("  ".to_string()), Utc::now());
        assert_eq!(state.last_error(), Some(FALLBACK_ERROR));
        assert!(state.initial_load_done());
    }

    #[test]
    fn test_stale_completion_is_discarded() {
        let mut state = PollerState::default();
        state.begin_fetch();
        state.begin_fetch();
        assert!(state.is_fetching());

        assert!(state.complete_fetch(2, Ok(sample(25.0)), Utc::now()));
        assert!(state.is_fetching());
        assert!(!state.complete_fetch(1, Err("timed out".to_string()), Utc::now()));

        assert!(!state.is_fetching());
        assert_eq!(state.last_sample(), Some(&sample(25.0)));
        assert!(state.last_error().is_none());
    }

    #[test]
    fn test_live_phases() {
        let mut state = PollerState::default();
        assert!(state.set_live_enabled(true));
        assert!(!state.set_live_enabled(true));
        assert_eq!(state.phase(), PollerPhase::LiveIdle);
        assert!(!state.can_refresh());

        state.begin_fetch();
        assert_eq!(state.phase(), PollerPhase::LiveFetching);

        state.set_live_enabled(false);
        assert_eq!(state.phase(), PollerPhase::Fetching);
        assert!(!state.can_refresh());

        state.complete_fetch(1, Ok(sample(20.0)), Utc::now());
        assert_eq!(state.phase(), PollerPhase::Idle);
        assert!(state.last_sample().is_some());
    }
}
