//! In-memory backend used by monitor tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use super::LprApi;
use super::types::{
    CorrectionResponse, CurrentUser, DepartureFilters, DeparturesPage, ExcludedVehicle, Session, Station, VisitRecord,
};
use crate::error::ApiError;

/// Scripted responses plus a log of every call made.
#[derive(Default)]
pub struct FakeApi {
    pub snapshots: Mutex<Vec<Result<Vec<Station>, ApiError>>>,
    pub history: Mutex<HashMap<String, Vec<VisitRecord>>>,
    pub session_history: Mutex<HashMap<String, Result<Vec<VisitRecord>, ApiError>>>,
    pub sessions: Mutex<Option<Result<Vec<Session>, ApiError>>>,
    pub departures: Mutex<Option<DeparturesPage>>,
    pub correction: Mutex<Option<Result<CorrectionResponse, ApiError>>>,
    pub excluded: Mutex<Vec<ExcludedVehicle>>,
    pub user: Mutex<Option<CurrentUser>>,
    pub history_error: Mutex<Option<ApiError>>,
    pub calls: Mutex<Vec<String>>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_snapshot(&self, result: Result<Vec<Station>, ApiError>) {
        self.snapshots.lock().unwrap().push(result);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| c.starts_with(prefix)).count()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

pub fn station(name: &str, plates: &[&str]) -> Station {
    Station {
        name: name.to_owned(),
        color: Some("#607d8b".to_owned()),
        vehicles: plates
            .iter()
            .map(|plate| super::types::Vehicle {
                plate: (*plate).to_owned(),
                slot: Some("E1_IZQUIERDA".to_owned()),
                station_seconds: Some(120),
                total_seconds: Some(3661),
            })
            .collect(),
    }
}

pub fn visit(station: &str, started_at: &str, duration: i64) -> VisitRecord {
    VisitRecord {
        station: station.to_owned(),
        started_at: started_at.to_owned(),
        ended_at: None,
        duration_seconds: Some(duration),
        slot: None,
        photo: None,
        session_id: None,
    }
}

pub fn admin() -> CurrentUser {
    CurrentUser { id: Some("1".into()), name: "Ana".into(), role: "ADMIN".into() }
}

#[async_trait]
impl LprApi for FakeApi {
    async fn snapshot(&self) -> Result<Vec<Station>, ApiError> {
        self.record("snapshot".into());
        let mut queue = self.snapshots.lock().unwrap();
        if queue.is_empty() {
            return Ok(Vec::new());
        }
        queue.remove(0)
    }

    async fn history(&self, plate: &str, session_id: Option<&str>) -> Result<Vec<VisitRecord>, ApiError> {
        self.record(format!("history {plate} {}", session_id.unwrap_or("-")));
        if let Some(err) = self.history_error.lock().unwrap().take() {
            return Err(err);
        }
        if let Some(session_id) = session_id {
            return match self.session_history.lock().unwrap().remove(session_id) {
                Some(result) => result,
                None => Ok(Vec::new()),
            };
        }
        Ok(self.history.lock().unwrap().get(plate).cloned().unwrap_or_default())
    }

    async fn sessions(&self, plate: &str) -> Result<Vec<Session>, ApiError> {
        self.record(format!("sessions {plate}"));
        self.sessions.lock().unwrap().take().unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn departures(&self, filters: &DepartureFilters) -> Result<DeparturesPage, ApiError> {
        let query: Vec<String> = filters.query_pairs().into_iter().map(|(k, v)| format!("{k}={v}")).collect();
        self.record(format!("departures {}", query.join("&")));
        self.departures
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| ApiError::from_status(500, "no page scripted".into()))
    }

    async fn correct_plate(&self, original: &str, corrected: &str) -> Result<CorrectionResponse, ApiError> {
        self.record(format!("correct {original} {corrected}"));
        self.correction.lock().unwrap().take().unwrap_or_else(|| Ok(CorrectionResponse::default()))
    }

    async fn excluded(&self) -> Result<Vec<ExcludedVehicle>, ApiError> {
        self.record("excluded".into());
        Ok(self.excluded.lock().unwrap().clone())
    }

    async fn add_excluded(&self, vehicle: &ExcludedVehicle) -> Result<(), ApiError> {
        self.record(format!("add_excluded {}", vehicle.plate));
        self.excluded.lock().unwrap().push(vehicle.clone());
        Ok(())
    }

    async fn remove_excluded(&self, plate: &str) -> Result<(), ApiError> {
        self.record(format!("remove_excluded {plate}"));
        self.excluded.lock().unwrap().retain(|v| v.plate != plate);
        Ok(())
    }

    async fn current_user(&self) -> Result<CurrentUser, ApiError> {
        self.record("current_user".into());
        self.user
            .lock()
            .unwrap()
            .clone()
            .ok_or(ApiError::Unauthorized { status: 401 })
    }
}
