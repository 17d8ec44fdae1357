//! Poll loop and state transition tracking

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use rfsite::{HealthState, Site, SiteReport};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

/// A component whose state changed between two polls
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub name: String,
    /// `None` on the first poll
    pub from: Option<HealthState>,
    pub to: HealthState,
    pub status: String,
}

impl Transition {
    /// Entering a state an operator has to act on
    pub fn is_degradation(&self) -> bool {
        matches!(
            self.to,
            HealthState::Fault | HealthState::Unknown | HealthState::NotPossible
        )
    }
}

/// Last known state per component
#[derive(Debug, Default)]
pub struct StateTracker {
    last: HashMap<String, HealthState>,
}

impl StateTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a report and return the components whose state changed
    pub fn observe(&mut self, report: &SiteReport) -> Vec<Transition> {
        let mut transitions = Vec::new();
        for component in &report.components {
            let previous = self.last.insert(component.name.clone(), component.state);
            if previous != Some(component.state) {
                transitions.push(Transition {
                    name: component.name.clone(),
                    from: previous,
                    to: component.state,
                    status: component.status.clone(),
                });
            }
        }
        transitions
    }

    pub fn state(&self, name: &str) -> Option<HealthState> {
        self.last.get(name).copied()
    }
}

pub fn log_transitions(transitions: &[Transition]) {
    for t in transitions {
        let from = t.from.map_or("-", HealthState::text);
        if t.is_degradation() {
            warn!(component = %t.name, from, to = %t.to, status = %t.status, "state changed");
        } else {
            info!(component = %t.name, from, to = %t.to, status = %t.status, "state changed");
        }
    }
}

/// Poll the site every `interval` until `shutdown` is set
pub async fn run_poll_loop(site: Arc<Site>, interval: Duration, shutdown: Arc<AtomicBool>) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut tracker = StateTracker::new();
    let mut cycles: u64 = 0;

    info!(interval_ms = interval.as_millis() as u64, "poll loop started");

    while !shutdown.load(Ordering::SeqCst) {
        ticker.tick().await;
        if shutdown.load(Ordering::SeqCst) {
            break;
        }

        // Agent calls block; keep them off the runtime threads
        let polled = site.clone();
        let report = match tokio::task::spawn_blocking(move || {
            polled.poll_once();
            polled.report()
        })
        .await
        {
            Ok(report) => report,
            Err(e) => {
                error!("Poll task panicked: {}", e);
                continue;
            }
        };

        cycles += 1;
        log_transitions(&tracker.observe(&report));
        debug!(cycle = cycles, worst = ?report.worst_state(), "poll cycle complete");
    }

    info!(cycles, "poll loop stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use rfsite::{Component, ComponentReport};

    fn report(states: &[(&str, HealthState)]) -> SiteReport {
        SiteReport {
            components: states
                .iter()
                .map(|(name, state)| ComponentReport {
                    name: name.to_string(),
                    state: *state,
                    status: format!("{}: {}", name, state),
                    data_valid: true,
                })
                .collect(),
        }
    }

    #[test]
    fn test_first_poll_reports_every_component() {
        let mut tracker = StateTracker::new();
        let t = tracker.observe(&report(&[("AMPs", HealthState::Ok), ("MTx", HealthState::Off)]));
        assert_eq!(t.len(), 2);
        assert_eq!(t[0].from, None);
        assert_eq!(tracker.state("MTx"), Some(HealthState::Off));
    }

    #[test]
    fn test_only_changes_are_reported() {
        let mut tracker = StateTracker::new();
        tracker.observe(&report(&[("AMPs", HealthState::Ok), ("MTx", HealthState::Ok)]));
        let t = tracker.observe(&report(&[("AMPs", HealthState::Fault), ("MTx", HealthState::Ok)]));
        assert_eq!(
            t,
            vec![Transition {
                name: "AMPs".to_string(),
                from: Some(HealthState::Ok),
                to: HealthState::Fault,
                status: "AMPs: FAULT".to_string(),
            }]
        );
        assert!(t[0].is_degradation());
        assert!(tracker.observe(&report(&[("AMPs", HealthState::Fault), ("MTx", HealthState::Ok)])).is_empty());
    }

    #[test]
    fn test_degradation_classification() {
        let transition = |to| Transition {
            name: "x".to_string(),
            from: None,
            to,
            status: String::new(),
        };
        assert!(transition(HealthState::Unknown).is_degradation());
        assert!(transition(HealthState::NotPossible).is_degradation());
        assert!(!transition(HealthState::Warning).is_degradation());
        assert!(!transition(HealthState::Off).is_degradation());
    }

    #[tokio::test]
    async fn test_loop_exits_when_shutdown_set() {
        let agent = rfsite::SimulatedAgent::healthy_site(&rfsite::SiteConfig::default()).unwrap();
        let read = rfsite::Connection::shared("read", agent.clone());
        let write = rfsite::Connection::shared("write", agent.clone());
        let site = Arc::new(Site::new(&rfsite::SiteConfig::default(), read, write).unwrap());

        let shutdown = Arc::new(AtomicBool::new(false));
        let handle = tokio::spawn(run_poll_loop(site.clone(), Duration::from_millis(10), shutdown.clone()));
        tokio::time::sleep(Duration::from_millis(50)).await;
        shutdown.store(true, Ordering::SeqCst);
        handle.await.unwrap();

        assert!(agent.request_counts().get > 0);
        assert_eq!(site.transmitter().unwrap().state(), HealthState::Ok);
    }
}
