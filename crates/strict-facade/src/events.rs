//! Structured event log.
//!
//! Every interesting decision (a facade wired, a strict read missing, a
//! `KeyError` built or refused) lands here as a serializable record instead
//! of free-form text.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::config::RealmConfig;

/// One structured event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacadeEvent {
    /// Monotonic sequence number; gaps mean events were dropped.
    pub sequence: u64,
    pub trace_id: String,
    pub component: String,
    pub event: String,
    /// `pass` or `fail`.
    pub outcome: String,
    pub error_code: Option<String>,
    pub detail: Option<String>,
}

/// Bounded, in-memory event log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventLog {
    trace_id: String,
    enabled: bool,
    capacity: usize,
    next_sequence: u64,
    dropped: u64,
    events: VecDeque<FacadeEvent>,
}

impl EventLog {
    pub fn new(config: &RealmConfig) -> Self {
        Self {
            trace_id: config.trace_id.clone(),
            enabled: config.record_events,
            capacity: config.event_capacity,
            next_sequence: 0,
            dropped: 0,
            events: VecDeque::new(),
        }
    }

    pub fn record_pass(&mut self, component: &str, event: &str, detail: Option<String>) {
        self.push(component, event, "pass", None, detail);
    }

    pub fn record_failure(
        &mut self,
        component: &str,
        event: &str,
        error_code: &str,
        detail: Option<String>,
    ) {
        self.push(component, event, "fail", Some(error_code), detail);
    }

    fn push(
        &mut self,
        component: &str,
        event: &str,
        outcome: &str,
        error_code: Option<&str>,
        detail: Option<String>,
    ) {
        if !self.enabled {
            return;
        }
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        if self.events.len() >= self.capacity {
            self.events.pop_front();
            self.dropped += 1;
        }
        self.events.push_back(FacadeEvent {
            sequence,
            trace_id: self.trace_id.clone(),
            component: component.to_string(),
            event: event.to_string(),
            outcome: outcome.to_string(),
            error_code: error_code.map(str::to_string),
            detail,
        });
    }

    pub fn events(&self) -> impl Iterator<Item = &FacadeEvent> {
        self.events.iter()
    }

    pub fn drain(&mut self) -> Vec<FacadeEvent> {
        self.events.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Events evicted because the log was full.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn log_with_capacity(capacity: usize) -> EventLog {
        EventLog::new(&RealmConfig {
            event_capacity: capacity,
            ..RealmConfig::default()
        })
    }

    #[test]
    fn records_in_sequence() {
        let mut log = log_with_capacity(8);
        log.record_pass("facade", "facade_built", Some("StaticObject".to_string()));
        log.record_failure("interception", "strict_access_miss", "FE-STRICT-0001", None);

        let events: Vec<_> = log.events().collect();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].sequence, 0);
        assert_eq!(events[0].outcome, "pass");
        assert_eq!(events[1].sequence, 1);
        assert_eq!(events[1].error_code.as_deref(), Some("FE-STRICT-0001"));
        assert_eq!(events[1].trace_id, "strict-facade");
    }

    #[test]
    fn capacity_evicts_oldest() {
        let mut log = log_with_capacity(2);
        for i in 0..5 {
            log.record_pass("c", &format!("e{i}"), None);
        }
        assert_eq!(log.len(), 2);
        assert_eq!(log.dropped(), 3);
        let names: Vec<_> = log.events().map(|e| e.event.as_str()).collect();
        assert_eq!(names, ["e3", "e4"]);
    }

    #[test]
    fn disabled_log_records_nothing() {
        let mut log = EventLog::new(&RealmConfig {
            record_events: false,
            ..RealmConfig::default()
        });
        log.record_pass("c", "e", None);
        assert!(log.is_empty());
    }

    #[test]
    fn drain_empties_and_events_serialize() {
        let mut log = log_with_capacity(4);
        log.record_failure("key_error", "invalid_key_argument", "FE-STRICT-0002", None);
        let drained = log.drain();
        assert!(log.is_empty());
        let json = serde_json::to_string(&drained).unwrap();
        let back: Vec<FacadeEvent> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, drained);
    }
}
