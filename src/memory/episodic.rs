//! Episodic memory: an ordered, append-only event log with fixed-prefix +
//! last-N windowing for the view consumed by prompting (`spec.md` §4.2).

use serde::{Deserialize, Serialize};

use crate::action::{Action, CognitiveState, Stimulus};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// The payload of one episodic event, shaped per role (`spec.md` §3
/// "Episodic event").
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum EventPayload {
    System { content: String },
    User { stimuli: Vec<Stimulus> },
    Assistant { action: Action, cognitive_state: CognitiveState },
    /// Spliced in between prefix and tail by windowed retrieval; never
    /// stored in the log itself.
    Omission { omitted_count: usize },
}

/// One entry in the log. `sequence` gives a total order independent of
/// `simulation_timestamp` ties (two events in the same simulated instant
/// still have a well-defined order).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EpisodicEvent {
    pub role: Role,
    pub payload: EventPayload,
    pub simulation_timestamp: Option<String>,
    pub sequence: u64,
}

/// Default fixed-prefix length (`spec.md` §4.2).
pub const DEFAULT_PREFIX_LEN: usize = 100;
/// Default tail (lookback) length (`spec.md` §4.2).
pub const DEFAULT_LOOKBACK_LEN: usize = 100;

/// Ordered, append-only event log. Storage is never truncated; only views
/// returned by `retrieve*` are windowed.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct EpisodicMemory {
    events: Vec<EpisodicEvent>,
    next_sequence: u64,
    pub prefix_len: usize,
    pub lookback_len: usize,
}

impl EpisodicMemory {
    pub fn new() -> Self {
        Self {
            events: Vec::new(),
            next_sequence: 0,
            prefix_len: DEFAULT_PREFIX_LEN,
            lookback_len: DEFAULT_LOOKBACK_LEN,
        }
    }

    pub fn with_windowing(prefix_len: usize, lookback_len: usize) -> Self {
        Self {
            prefix_len,
            lookback_len,
            ..Self::new()
        }
    }

    pub fn store(&mut self, role: Role, payload: EventPayload, simulation_timestamp: Option<String>) {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.events.push(EpisodicEvent {
            role,
            payload,
            simulation_timestamp,
            sequence,
        });
    }

    pub fn count(&self) -> usize {
        self.events.len()
    }

    pub fn retrieve_all(&self) -> Vec<EpisodicEvent> {
        self.events.clone()
    }

    pub fn retrieve_first(&self, n: usize) -> Vec<EpisodicEvent> {
        self.events.iter().take(n).cloned().collect()
    }

    pub fn retrieve_last(&self, n: usize) -> Vec<EpisodicEvent> {
        let len = self.events.len();
        let start = len.saturating_sub(n);
        self.events[start..].to_vec()
    }

    fn omission_marker(omitted_count: usize) -> EpisodicEvent {
        EpisodicEvent {
            role: Role::System,
            payload: EventPayload::Omission { omitted_count },
            simulation_timestamp: None,
            sequence: u64::MAX,
        }
    }

    /// `retrieve(first_n, last_n, include_omission_info)` per `spec.md`
    /// §4.2: `first_n` ++ marker ++ `last_n` when both are given, else the
    /// requested side, else all.
    pub fn retrieve(
        &self,
        first_n: Option<usize>,
        last_n: Option<usize>,
        include_omission_info: bool,
    ) -> Vec<EpisodicEvent> {
        match (first_n, last_n) {
            (Some(first), Some(last)) => {
                let mut out = self.retrieve_first(first);
                let omitted = self.events.len().saturating_sub(first + last);
                if include_omission_info && omitted > 0 {
                    out.push(Self::omission_marker(omitted));
                }
                out.extend(self.retrieve_last(last));
                out
            }
            (Some(first), None) => self.retrieve_first(first),
            (None, Some(last)) => self.retrieve_last(last),
            (None, None) => self.retrieve_all(),
        }
    }

    /// Fixed-prefix + last-N windowed view for prompting (`spec.md` §4.2
    /// "Windowing policy for the recent view"). If the log fits inside the
    /// prefix, or `lookback_len <= 0`, only the prefix (plus marker, when
    /// there is something omitted and `include_omission_info`) is returned.
    pub fn retrieve_recent(&self, include_omission_info: bool) -> Vec<EpisodicEvent> {
        let total = self.events.len();
        if total <= self.prefix_len || self.lookback_len == 0 {
            return self.retrieve_first(self.prefix_len.min(total));
        }

        let prefix = self.retrieve_first(self.prefix_len);
        let tail_start = total.saturating_sub(self.lookback_len).max(self.prefix_len);
        let tail = self.events[tail_start..].to_vec();
        let omitted = total - prefix.len() - tail.len();

        let mut out = prefix;
        if include_omission_info && omitted > 0 {
            out.push(Self::omission_marker(omitted));
        }
        out.extend(tail);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::StimulusKind;

    fn push_n(mem: &mut EpisodicMemory, n: usize) {
        for i in 0..n {
            mem.store(
                Role::User,
                EventPayload::User {
                    stimuli: vec![Stimulus::new(StimulusKind::Conversation, format!("e{i}"), None)],
                },
                None,
            );
        }
    }

    #[test]
    fn storage_is_never_truncated() {
        let mut mem = EpisodicMemory::with_windowing(2, 3);
        push_n(&mut mem, 50);
        assert_eq!(mem.count(), 50);
        assert_eq!(mem.retrieve_all().len(), 50);
    }

    #[test]
    fn memory_window_scenario_from_spec() {
        // Scenario 5 in spec.md §8: prefix 2, lookback 3, events e1..e10.
        let mut mem = EpisodicMemory::with_windowing(2, 3);
        push_n(&mut mem, 10);

        let view = mem.retrieve_recent(true);
        // [e0, e1, marker, e7, e8, e9]
        assert_eq!(view.len(), 6);
        assert!(matches!(view[2].payload, EventPayload::Omission { .. }));
        let EventPayload::User { stimuli } = &view[0].payload else {
            panic!("expected user event")
        };
        assert_eq!(stimuli[0].content, "e0");
        let EventPayload::User { stimuli } = &view[3].payload else {
            panic!("expected user event")
        };
        assert_eq!(stimuli[0].content, "e7");
    }

    #[test]
    fn no_marker_when_log_fits_in_prefix() {
        let mut mem = EpisodicMemory::with_windowing(100, 100);
        push_n(&mut mem, 10);
        let view = mem.retrieve_recent(true);
        assert_eq!(view.len(), 10);
        assert!(!view.iter().any(|e| matches!(e.payload, EventPayload::Omission { .. })));
    }

    #[test]
    fn no_marker_when_omission_info_disabled() {
        let mut mem = EpisodicMemory::with_windowing(2, 3);
        push_n(&mut mem, 10);
        let view = mem.retrieve_recent(false);
        assert_eq!(view.len(), 5);
        assert!(!view.iter().any(|e| matches!(e.payload, EventPayload::Omission { .. })));
    }

    #[test]
    fn zero_lookback_returns_prefix_only() {
        let mut mem = EpisodicMemory::with_windowing(3, 0);
        push_n(&mut mem, 20);
        let view = mem.retrieve_recent(true);
        assert_eq!(view.len(), 3);
    }

    #[test]
    fn retrieve_bound_matches_invariant() {
        let mut mem = EpisodicMemory::with_windowing(5, 5);
        push_n(&mut mem, 30);
        let view = mem.retrieve(Some(5), Some(5), true);
        assert!(view.len() <= 5 + 1 + 5);
    }
}
