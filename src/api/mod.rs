//! REST boundary of the LPR backend.
//!
//! SYSTEM CONTEXT
//! ==============
//! `types` defines the wire schema, `http` talks to the real backend with
//! `reqwest`. The monitor only sees the `LprApi` trait so its behaviour can
//! be exercised against an in-memory backend.

pub mod http;
pub mod types;

use async_trait::async_trait;

use crate::error::ApiError;
use types::{
    CorrectionResponse, CurrentUser, DepartureFilters, DeparturesPage, ExcludedVehicle, Session, Station,
    VisitRecord,
};

/// One async method per endpoint the monitor consumes.
#[async_trait]
pub trait LprApi: Send + Sync {
    /// `GET /lpr/estado`
    async fn snapshot(&self) -> Result<Vec<Station>, ApiError>;

    /// `GET /lpr/historial/{placa}`, optionally scoped with `?sesion_id=`.
    async fn history(&self, plate: &str, session_id: Option<&str>) -> Result<Vec<VisitRecord>, ApiError>;

    /// `GET /lpr/sesiones/{placa}`
    async fn sessions(&self, plate: &str) -> Result<Vec<Session>, ApiError>;

    /// `GET /lpr/salidas`
    async fn departures(&self, filters: &DepartureFilters) -> Result<DeparturesPage, ApiError>;

    /// `PUT /lpr/corregir`
    async fn correct_plate(&self, original: &str, corrected: &str) -> Result<CorrectionResponse, ApiError>;

    /// `GET /lpr/internos`
    async fn excluded(&self) -> Result<Vec<ExcludedVehicle>, ApiError>;

    /// `POST /lpr/internos`
    async fn add_excluded(&self, vehicle: &ExcludedVehicle) -> Result<(), ApiError>;

    /// `DELETE /lpr/internos/{placa}`
    async fn remove_excluded(&self, plate: &str) -> Result<(), ApiError>;

    /// `GET /auth/me`
    async fn current_user(&self) -> Result<CurrentUser, ApiError>;
}

#[cfg(test)]
pub mod test_helpers;
