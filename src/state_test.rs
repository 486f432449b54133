use super::*;
use crate::api::test_helpers::station;

fn detail(plate: &str) -> Modal {
    Modal::VehicleDetail { station: "Lavado".into(), plate: plate.into() }
}

#[test]
fn new_state_is_not_paused() {
    let state = MonitorState::new();
    assert!(!state.is_paused());
    assert_eq!(state.modal(), None);
    assert_eq!(state.selected(), None);
    assert_eq!(state.seq.latest(), 0);
}

#[test]
fn pause_replaces_open_modal() {
    let mut state = MonitorState::new();
    state.pause(Modal::Excluded);
    state.pause(detail("ABC123"));
    assert!(state.is_paused());
    assert_eq!(state.modal(), Some(&detail("ABC123")));
}

#[test]
fn resume_clears_modal_and_selection() {
    let mut state = MonitorState::new();
    state.pause(detail("ABC123"));
    state.select("ABC123");
    state.resume();
    assert!(!state.is_paused());
    assert_eq!(state.selected(), None);
}

#[test]
fn clear_drops_selection_only() {
    let mut state = MonitorState::new();
    state.pause(Modal::Excluded);
    state.select("ABC123");
    state.clear();
    assert_eq!(state.selected(), None);
    assert!(state.is_paused());
}

#[test]
fn request_seq_only_latest_is_current() {
    let mut seq = RequestSeq::default();
    let first = seq.issue();
    let second = seq.issue();
    assert!(!seq.is_current(first));
    assert!(seq.is_current(second));
}

#[test]
fn apply_stations_discards_stale_sequence() {
    let mut state = MonitorState::new();
    let stale = state.seq.issue();
    let fresh = state.seq.issue();
    let now = OffsetDateTime::UNIX_EPOCH;

    assert!(state.apply_stations(fresh, vec![station("Lavado", &["NEW1"])], now));
    assert!(!state.apply_stations(stale, vec![station("Lavado", &["OLD1"])], now));
    assert_eq!(state.stations[0].vehicles[0].plate, "NEW1");
    assert_eq!(state.last_sync, Some(now));
}

#[test]
fn station_of_finds_plate_case_insensitively() {
    let mut state = MonitorState::new();
    let seq = state.seq.issue();
    state.apply_stations(
        seq,
        vec![station("Entrada", &["AAA111"]), station("Mecanica", &["BBB222"])],
        OffsetDateTime::UNIX_EPOCH,
    );
    assert_eq!(state.station_of("bbb222"), Some("Mecanica"));
    assert_eq!(state.station_of("ZZZ999"), None);
}
