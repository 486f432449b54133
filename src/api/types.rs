//! Wire types for the LPR REST boundary.
//!
//! Field names follow the backend's JSON (`placa`, `estacion`, ...); the Rust
//! side uses English names. Timestamps stay as the backend's strings because
//! the client only displays them.

use serde::{Deserialize, Deserializer, Serialize};

/// Fixed page size for the departures listing.
pub const DEPARTURES_PAGE_SIZE: u32 = 10;

/// Correction response status reported when the new plate already had an
/// active record and the two were merged server-side.
pub const MERGE_STATUS: &str = "FUSION_EXITOSA";

// =============================================================================
// LIVE SNAPSHOT
// =============================================================================

/// A vehicle currently reported inside a station.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vehicle {
    #[serde(rename = "placa")]
    pub plate: String,
    #[serde(default)]
    pub slot: Option<String>,
    #[serde(rename = "tiempo_estacion", default)]
    pub station_seconds: Option<i64>,
    #[serde(rename = "tiempo_total", default)]
    pub total_seconds: Option<i64>,
}

/// One kanban column: a physical station and the vehicles inside it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Station {
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(rename = "vehiculos", default)]
    pub vehicles: Vec<Vehicle>,
}

/// `/lpr/estado` answers either a bare station list or an object wrapping it.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum SnapshotBody {
    List(Vec<Station>),
    Wrapped {
        #[serde(rename = "estaciones")]
        stations: Vec<Station>,
    },
}

impl SnapshotBody {
    pub(crate) fn into_stations(self) -> Vec<Station> {
        match self {
            Self::List(stations) | Self::Wrapped { stations } => stations,
        }
    }
}

// =============================================================================
// HISTORY
// =============================================================================

/// One interval a vehicle spent at one station.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisitRecord {
    #[serde(rename = "estacion")]
    pub station: String,
    #[serde(rename = "inicio")]
    pub started_at: String,
    #[serde(rename = "fin", default)]
    pub ended_at: Option<String>,
    #[serde(rename = "duracion", default)]
    pub duration_seconds: Option<i64>,
    #[serde(default)]
    pub slot: Option<String>,
    #[serde(rename = "foto", default)]
    pub photo: Option<String>,
    #[serde(rename = "sesion_id", default, deserialize_with = "opt_id_string")]
    pub session_id: Option<String>,
}

/// Whether a session's vehicle is still on the premises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SessionState {
    Active,
    Finished,
}

impl From<String> for SessionState {
    fn from(raw: String) -> Self {
        if raw.eq_ignore_ascii_case("ACTIVA") || raw.eq_ignore_ascii_case("ACTIVE") {
            Self::Active
        } else {
            Self::Finished
        }
    }
}

impl From<SessionState> for String {
    fn from(state: SessionState) -> Self {
        match state {
            SessionState::Active => "ACTIVA".to_owned(),
            SessionState::Finished => "FINALIZADA".to_owned(),
        }
    }
}

/// One facility visit between an entry and an exit event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    #[serde(rename = "estado")]
    pub state: SessionState,
    #[serde(rename = "entrada")]
    pub entered_at: String,
    #[serde(rename = "salida", default)]
    pub exited_at: Option<String>,
    #[serde(rename = "duracion", default)]
    pub duration_seconds: Option<i64>,
}

// =============================================================================
// DEPARTURES
// =============================================================================

/// A vehicle that has left the facility.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepartureRow {
    #[serde(rename = "placa")]
    pub plate: String,
    #[serde(rename = "entrada", default)]
    pub entered_at: Option<String>,
    #[serde(rename = "salida", default)]
    pub exited_at: Option<String>,
    #[serde(rename = "duracion", default)]
    pub duration_seconds: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeparturesPage {
    #[serde(rename = "data", default)]
    pub rows: Vec<DepartureRow>,
    #[serde(default)]
    pub total: u64,
    #[serde(default = "first_page")]
    pub page: u32,
    #[serde(rename = "totalPages", default)]
    pub total_pages: u32,
}

fn first_page() -> u32 {
    1
}

/// Filters for `/lpr/salidas`, forwarded as given. Empty strings count as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DepartureFilters {
    pub page: u32,
    pub from: Option<String>,
    pub to: Option<String>,
    pub plate: Option<String>,
}

impl DepartureFilters {
    /// Query pairs in wire order: `page`, `limit`, then each non-empty filter.
    #[must_use]
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![("page", self.page.to_string()), ("limit", DEPARTURES_PAGE_SIZE.to_string())];
        let optional = [("desde", &self.from), ("hasta", &self.to), ("placa", &self.plate)];
        for (key, value) in optional {
            if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
                pairs.push((key, value.to_owned()));
            }
        }
        pairs
    }
}

// =============================================================================
// CORRECTION
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrectionRequest {
    pub placa_original: String,
    pub placa_nueva: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CorrectionResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// What the backend did with a correction request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorrectionOutcome {
    Renamed,
    Merged,
}

impl CorrectionResponse {
    #[must_use]
    pub fn outcome(&self) -> CorrectionOutcome {
        if self.status.as_deref() == Some(MERGE_STATUS) {
            CorrectionOutcome::Merged
        } else {
            CorrectionOutcome::Renamed
        }
    }
}

// =============================================================================
// EXCLUSIONS + IDENTITY
// =============================================================================

/// A plate deliberately omitted from automatic tracking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExcludedVehicle {
    #[serde(rename = "placa")]
    pub plate: String,
    #[serde(rename = "descripcion", default)]
    pub description: String,
}

/// The authenticated caller as reported by `/auth/me`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CurrentUser {
    #[serde(default, deserialize_with = "opt_id_string")]
    pub id: Option<String>,
    #[serde(rename = "nombre", alias = "name", default)]
    pub name: String,
    #[serde(rename = "rol", alias = "role", default)]
    pub role: String,
}

/// Role allowed to manage the exclusion list.
pub const EXCLUSION_ADMIN_ROLE: &str = "ADMIN";

impl CurrentUser {
    #[must_use]
    pub fn can_manage_exclusions(&self) -> bool {
        self.role.trim().eq_ignore_ascii_case(EXCLUSION_ADMIN_ROLE)
    }
}

// =============================================================================
// HELPERS
// =============================================================================

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Number(i64),
    Text(String),
}

impl From<RawId> for String {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::Number(n) => n.to_string(),
            RawId::Text(s) => s,
        }
    }
}

/// Backend ids arrive as numbers or strings; the client treats them as opaque text.
fn id_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    RawId::deserialize(deserializer).map(String::from)
}

fn opt_id_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<RawId>::deserialize(deserializer).map(|raw| raw.map(String::from))
}

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;
