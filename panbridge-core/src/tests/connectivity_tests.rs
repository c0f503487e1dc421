use crate::{ConnectivityState, Transition};

fn transitions(probes: &[bool]) -> Vec<Transition> {
    let mut state = ConnectivityState::default();
    probes.iter().filter_map(|&p| state.observe(p)).collect()
}

#[test]
fn test_repeated_success_fires_once() {
    assert_eq!(transitions(&[true, true, true]), vec![Transition::Connected]);
}

#[test]
fn test_success_then_failures_fires_per_edge() {
    assert_eq!(
        transitions(&[true, false, false]),
        vec![Transition::Connected, Transition::Disconnected]
    );
}

#[test]
fn test_failure_from_start_is_silent() {
    assert!(transitions(&[false, false]).is_empty());
}

#[test]
fn test_flapping() {
    let mut state = ConnectivityState::default();
    assert_eq!(state.observe(true), Some(Transition::Connected));
    assert!(state.is_connected());
    assert_eq!(state.observe(false), Some(Transition::Disconnected));
    assert!(!state.is_connected());
    assert_eq!(state.observe(true), Some(Transition::Connected));
}
