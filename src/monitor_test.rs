use super::*;
use crate::api::test_helpers::{FakeApi, admin, station, visit};
use crate::api::types::{CorrectionResponse, DeparturesPage, MERGE_STATUS, Session, SessionState};
use crate::state::NoticeLevel;

fn monitor_with(api: &Arc<FakeApi>) -> Monitor {
    Monitor::new(api.clone())
}

// =============================================================================
// refresh / tick
// =============================================================================

#[tokio::test]
async fn refresh_replaces_columns_and_stamps_sync() {
    let api = Arc::new(FakeApi::new());
    api.push_snapshot(Ok(vec![station("Lavado", &["ABC123"])]));
    let mut monitor = monitor_with(&api);

    assert!(monitor.refresh().await.unwrap());
    assert_eq!(monitor.state().stations.len(), 1);
    assert!(monitor.state().last_sync.is_some());
    assert_eq!(monitor.board().vehicle_count(), 1);
}

#[tokio::test]
async fn failed_refresh_keeps_previous_columns() {
    let api = Arc::new(FakeApi::new());
    api.push_snapshot(Ok(vec![station("Lavado", &["ABC123"])]));
    api.push_snapshot(Err(ApiError::Request("timeout".into())));
    api.push_snapshot(Err(ApiError::Parse("eof".into())));
    let mut monitor = monitor_with(&api);

    monitor.refresh().await.unwrap();
    let synced = monitor.state().last_sync;
    assert!(!monitor.refresh().await.unwrap());
    assert!(!monitor.refresh().await.unwrap());

    assert_eq!(monitor.state().stations[0].vehicles[0].plate, "ABC123");
    assert_eq!(monitor.state().last_sync, synced);
    assert!(monitor.take_notice().is_none());
}

#[tokio::test]
async fn unauthorized_refresh_is_returned() {
    let api = Arc::new(FakeApi::new());
    api.push_snapshot(Err(ApiError::Unauthorized { status: 401 }));
    let mut monitor = monitor_with(&api);

    assert!(matches!(monitor.refresh().await, Err(ApiError::Unauthorized { .. })));
}

#[tokio::test]
async fn open_modal_suppresses_tick_until_closed() {
    let api = Arc::new(FakeApi::new());
    api.push_snapshot(Ok(vec![station("Lavado", &["ABC123"])]));
    let mut monitor = monitor_with(&api);
    monitor.refresh().await.unwrap();

    monitor.open_vehicle_detail("Lavado", "ABC123").await.unwrap();
    assert!(!monitor.tick().await.unwrap());
    assert_eq!(api.count("snapshot"), 1);

    monitor.close_vehicle_detail();
    monitor.tick().await.unwrap();
    assert_eq!(api.count("snapshot"), 2);
}

#[tokio::test]
async fn stale_snapshot_is_discarded() {
    let api = Arc::new(FakeApi::new());
    let mut monitor = monitor_with(&api);

    let slow = monitor.begin_tick().unwrap();
    let fast = monitor.begin_tick().unwrap();

    assert!(monitor.apply_snapshot(fast, Ok(vec![station("Lavado", &["NEW111"])])).unwrap());
    assert!(!monitor.apply_snapshot(slow, Ok(vec![station("Lavado", &["OLD000"])])).unwrap());
    assert_eq!(monitor.state().stations[0].vehicles[0].plate, "NEW111");
}

// =============================================================================
// detail + correction
// =============================================================================

#[tokio::test]
async fn vehicle_detail_groups_recent_stations() {
    let api = Arc::new(FakeApi::new());
    api.history.lock().unwrap().insert(
        "ABC123".into(),
        vec![visit("A", "08:00", 10), visit("B", "08:10", 5), visit("A", "08:20", 20), visit("C", "08:40", 7)],
    );
    let mut monitor = monitor_with(&api);

    let view = monitor.open_vehicle_detail("C", "ABC123").await.unwrap();
    assert_eq!(view.rows.len(), 3);
    let a = view.rows.iter().find(|r| r.station == "A").unwrap();
    assert_eq!(a.total_time, "00m");
    assert_eq!(a.since, "08:20");
    assert_eq!(monitor.state().selected(), Some("ABC123"));
    assert!(monitor.state().is_paused());
}

#[tokio::test]
async fn vehicle_detail_failure_keeps_modal_consistent() {
    let api = Arc::new(FakeApi::new());
    *api.history_error.lock().unwrap() = Some(ApiError::from_status(500, "boom".into()));
    let mut monitor = monitor_with(&api);

    let view = monitor.open_vehicle_detail("Lavado", "ABC123").await.unwrap();
    assert!(view.rows.is_empty());
    assert!(monitor.state().is_paused());
    assert_eq!(monitor.take_notice().map(|n| n.level), Some(NoticeLevel::Error));

    monitor.close_vehicle_detail();
    assert!(!monitor.state().is_paused());
    assert_eq!(monitor.state().selected(), None);
}

#[tokio::test]
async fn vehicle_detail_propagates_expired_session() {
    let api = Arc::new(FakeApi::new());
    *api.history_error.lock().unwrap() = Some(ApiError::Unauthorized { status: 401 });
    let mut monitor = monitor_with(&api);

    let result = monitor.open_vehicle_detail("Lavado", "ABC123").await;
    assert!(matches!(result, Err(ApiError::Unauthorized { status: 401 })));
    assert_eq!(monitor.take_notice().map(|n| n.level), Some(NoticeLevel::Error));
}

#[tokio::test]
async fn merge_correction_shows_merge_text_and_refreshes() {
    let api = Arc::new(FakeApi::new());
    *api.correction.lock().unwrap() =
        Some(Ok(CorrectionResponse { status: Some(MERGE_STATUS.into()), message: None }));
    let mut monitor = monitor_with(&api);
    monitor.open_vehicle_detail("Lavado", "ABC123").await.unwrap();

    let outcome = monitor.correct_plate("ABC123", " abc128 ").await.unwrap();
    assert_eq!(outcome, CorrectionOutcome::Merged);
    assert!(api.calls().contains(&"correct ABC123 ABC128".to_owned()));
    assert_eq!(api.count("snapshot"), 1);
    assert!(!monitor.state().is_paused());

    let notice = monitor.take_notice().unwrap();
    assert_eq!(notice.level, NoticeLevel::Info);
    assert_eq!(notice.text, correction_message(CorrectionOutcome::Merged, "ABC123", "ABC128"));
    assert!(notice.text.contains("merged"));
}

#[tokio::test]
async fn plain_correction_shows_rename_text_and_refreshes() {
    let api = Arc::new(FakeApi::new());
    let mut monitor = monitor_with(&api);
    monitor.open_vehicle_detail("Lavado", "ABC123").await.unwrap();

    let outcome = monitor.correct_plate("ABC123", "ABC128").await.unwrap();
    assert_eq!(outcome, CorrectionOutcome::Renamed);
    assert_eq!(api.count("snapshot"), 1);
    let notice = monitor.take_notice().unwrap();
    assert_eq!(notice.text, "ABC123 corrected to ABC128");
}

#[tokio::test]
async fn failed_correction_keeps_modal_open() {
    let api = Arc::new(FakeApi::new());
    *api.correction.lock().unwrap() = Some(Err(ApiError::from_status(409, "conflict".into())));
    let mut monitor = monitor_with(&api);
    monitor.open_vehicle_detail("Lavado", "ABC123").await.unwrap();

    assert!(monitor.correct_plate("ABC123", "ABC128").await.is_err());
    assert!(monitor.state().is_paused());
    assert_eq!(api.count("snapshot"), 0);
    assert_eq!(monitor.take_notice().map(|n| n.level), Some(NoticeLevel::Error));
}

#[tokio::test]
async fn unchanged_or_empty_correction_is_rejected_locally() {
    let api = Arc::new(FakeApi::new());
    let mut monitor = monitor_with(&api);

    assert!(matches!(monitor.correct_plate("ABC123", "abc123").await, Err(ApiError::Rejected(_))));
    assert!(matches!(monitor.correct_plate("ABC123", "  ").await, Err(ApiError::Rejected(_))));
    assert_eq!(api.count("correct"), 0);
}

#[tokio::test]
async fn applied_correction_is_confirmed_even_if_refresh_expires() {
    let api = Arc::new(FakeApi::new());
    api.push_snapshot(Err(ApiError::Unauthorized { status: 401 }));
    let mut monitor = monitor_with(&api);
    monitor.open_vehicle_detail("Lavado", "ABC123").await.unwrap();

    let result = monitor.correct_plate("ABC123", "ABC128").await;
    assert!(matches!(result, Err(ApiError::Unauthorized { .. })));
    let notice = monitor.take_notice().unwrap();
    assert_eq!(notice.level, NoticeLevel::Info);
    assert_eq!(notice.text, "ABC123 corrected to ABC128");
}

// =============================================================================
// departures + full history
// =============================================================================

#[tokio::test]
async fn departures_forward_filters() {
    let api = Arc::new(FakeApi::new());
    *api.departures.lock().unwrap() = Some(DeparturesPage { rows: Vec::new(), total: 0, page: 2, total_pages: 2 });
    let mut monitor = monitor_with(&api);

    let filters = DepartureFilters { page: 2, from: None, to: Some(String::new()), plate: Some("ABC".into()) };
    let view = monitor.list_departures(&filters).await.unwrap();
    assert_eq!(view.page, 2);
    assert!(api.calls().contains(&"departures page=2&limit=10&placa=ABC".to_owned()));
    assert!(monitor.state().is_paused());
}

#[tokio::test]
async fn full_history_tolerates_failed_session_fetch() {
    let api = Arc::new(FakeApi::new());
    let session = |id: &str, state| Session {
        id: id.to_owned(),
        state,
        entered_at: "2024-05-02 08:00".into(),
        exited_at: None,
        duration_seconds: None,
    };
    *api.sessions.lock().unwrap() =
        Some(Ok(vec![session("2", SessionState::Active), session("1", SessionState::Finished)]));
    api.session_history.lock().unwrap().insert("2".into(), Ok(vec![visit("Lavado", "08:10", 300)]));
    api.session_history
        .lock()
        .unwrap()
        .insert("1".into(), Err(ApiError::Request("reset".into())));
    let mut monitor = monitor_with(&api);

    let view = monitor.list_full_history("ABC123").await.unwrap();
    assert_eq!(view.sessions.len(), 2);
    assert_eq!(view.sessions[0].id, "2");
    assert!(view.sessions[0].active);
    assert_eq!(view.sessions[0].visits.len(), 1);
    assert!(view.sessions[1].visits.is_empty());
    assert_eq!(api.count("history ABC123"), 2);
}

#[tokio::test]
async fn full_history_session_failure_sets_notice() {
    let api = Arc::new(FakeApi::new());
    *api.sessions.lock().unwrap() = Some(Err(ApiError::from_status(500, String::new())));
    let mut monitor = monitor_with(&api);

    assert!(monitor.list_full_history("ABC123").await.is_err());
    assert!(monitor.take_notice().is_some());
    monitor.close_modal();
    assert!(!monitor.state().is_paused());
}

#[tokio::test]
async fn full_history_propagates_expired_session_from_visits() {
    let api = Arc::new(FakeApi::new());
    *api.sessions.lock().unwrap() = Some(Ok(vec![Session {
        id: "7".into(),
        state: SessionState::Active,
        entered_at: "2024-05-02 08:00".into(),
        exited_at: None,
        duration_seconds: None,
    }]));
    api.session_history
        .lock()
        .unwrap()
        .insert("7".into(), Err(ApiError::Unauthorized { status: 403 }));
    let mut monitor = monitor_with(&api);

    let result = monitor.list_full_history("ABC123").await;
    assert!(matches!(result, Err(ApiError::Unauthorized { status: 403 })));
}

// =============================================================================
// exclusions
// =============================================================================

#[tokio::test]
async fn non_admin_cannot_manage_exclusions() {
    let api = Arc::new(FakeApi::new());
    *api.user.lock().unwrap() = Some(CurrentUser { id: None, name: "Luis".into(), role: "ALMACEN".into() });
    let mut monitor = monitor_with(&api);

    assert!(!monitor.can_manage_exclusions().await.unwrap());
    assert!(matches!(monitor.open_excluded().await, Err(ApiError::Rejected(_))));
    assert!(matches!(monitor.add_excluded_vehicle("AAA111", "Grua").await, Err(ApiError::Rejected(_))));
    assert_eq!(api.count("excluded"), 0);
    assert_eq!(api.count("add_excluded"), 0);
    assert!(!monitor.state().is_paused());
}

#[tokio::test]
async fn admin_adds_and_removes_exclusions() {
    let api = Arc::new(FakeApi::new());
    *api.user.lock().unwrap() = Some(admin());
    let mut monitor = monitor_with(&api);

    let view = monitor.open_excluded().await.unwrap();
    assert!(view.rows.is_empty());
    assert!(view.can_manage);
    assert!(monitor.state().is_paused());

    let view = monitor.add_excluded_vehicle(" aaa111 ", " Grua interna ").await.unwrap();
    assert_eq!(view.rows, vec![ExcludedVehicle { plate: "AAA111".into(), description: "Grua interna".into() }]);

    let view = monitor.remove_excluded_vehicle("AAA111", |_| true).await.unwrap().unwrap();
    assert!(view.rows.is_empty());
    assert_eq!(api.count("current_user"), 1);

    monitor.close_excluded();
    assert!(!monitor.state().is_paused());
}

#[tokio::test]
async fn declined_removal_sends_nothing() {
    let api = Arc::new(FakeApi::new());
    *api.user.lock().unwrap() = Some(admin());
    api.excluded
        .lock()
        .unwrap()
        .push(ExcludedVehicle { plate: "AAA111".into(), description: "Grua".into() });
    let mut monitor = monitor_with(&api);

    let mut asked = String::new();
    let result = monitor
        .remove_excluded_vehicle("aaa111", |plate| {
            asked = plate.to_owned();
            false
        })
        .await
        .unwrap();
    assert!(result.is_none());
    assert_eq!(asked, "AAA111");
    assert_eq!(api.count("remove_excluded"), 0);
    assert_eq!(api.excluded.lock().unwrap().len(), 1);
}
