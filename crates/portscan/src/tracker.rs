//! Result tracking: first observation per port wins, unanswered ports
//! become filtered.

use parking_lot::Mutex;
use shrike_common::{PortReport, PortState};
use std::collections::HashSet;

/// Records scan results and tracks which ports have responded.
/// All access is serialised through the internal mutex.
pub(crate) struct Tracker {
    inner: Mutex<TrackerState>,
}

#[derive(Default)]
struct TrackerState {
    responded: HashSet<u16>,
    results: Vec<PortReport>,
}

impl Tracker {
    pub(crate) fn new() -> Self {
        Self {
            inner: Mutex::new(TrackerState::default()),
        }
    }

    /// Record one observed response. Later observations for the same
    /// port are ignored: a stateless scan can see both a SYN-ACK and a
    /// follow-up RST, and the first reply is authoritative.
    pub(crate) fn add(&self, report: PortReport) {
        let mut state = self.inner.lock();
        if !state.responded.insert(report.port) {
            return;
        }
        if report.is_open() || report.is_closed() {
            state.results.push(report);
        }
    }

    /// Produce the final result set: every recorded response in
    /// observation order, then one filtered entry per requested port
    /// that never answered, in probe-set order. Consumes the scan's
    /// view of the tracker.
    pub(crate) fn finalise(&self, all_ports: &[u16]) -> Vec<PortReport> {
        let state = self.inner.lock();
        let mut seen = state.responded.clone();
        let mut final_results = state.results.clone();
        for &port in all_ports {
            if seen.insert(port) {
                final_results.push(PortReport::new(port, PortState::Filtered));
            }
        }
        final_results
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_observation_wins() {
        let tracker = Tracker::new();
        tracker.add(PortReport::new(22, PortState::Open));
        tracker.add(PortReport::new(22, PortState::Closed));

        let results = tracker.finalise(&[22]);
        assert_eq!(results, vec![PortReport::new(22, PortState::Open)]);
    }

    #[test]
    fn duplicate_responses_yield_one_entry() {
        let tracker = Tracker::new();
        tracker.add(PortReport::new(22, PortState::Open));
        tracker.add(PortReport::new(22, PortState::Open));

        assert_eq!(tracker.finalise(&[22]).len(), 1);
    }

    #[test]
    fn unanswered_ports_become_filtered_in_probe_order() {
        let tracker = Tracker::new();
        tracker.add(PortReport::new(80, PortState::Closed));

        let results = tracker.finalise(&[22, 80, 443]);
        assert_eq!(
            results,
            vec![
                PortReport::new(80, PortState::Closed),
                PortReport::new(22, PortState::Filtered),
                PortReport::new(443, PortState::Filtered),
            ]
        );
    }

    #[test]
    fn duplicate_probe_ports_coalesce() {
        let tracker = Tracker::new();
        let results = tracker.finalise(&[443, 443, 443]);
        assert_eq!(results, vec![PortReport::new(443, PortState::Filtered)]);
    }

    #[test]
    fn responded_ports_never_double_as_filtered() {
        let tracker = Tracker::new();
        tracker.add(PortReport::new(22, PortState::Open));
        tracker.add(PortReport::new(23, PortState::Closed));

        let results = tracker.finalise(&[22, 23]);
        assert_eq!(results.len(), 2);
        assert!(!results.iter().any(|r| r.is_filtered()));
    }
}
