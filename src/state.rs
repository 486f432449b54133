//! View-model state owned by one monitor instance.
//!
//! DESIGN
//! ======
//! Polling is paused exactly while a modal is open, so the pause flag is not
//! stored separately: `pause` opens a modal (replacing any other), `resume`
//! closes it and clears the selected plate in the same step. Snapshot
//! requests are tagged by `RequestSeq`; only the latest issued tag may
//! repaint the columns.

use time::OffsetDateTime;

use crate::api::types::Station;

#[cfg(test)]
#[path = "state_test.rs"]
mod state_test;

/// Which modal currently owns the screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Modal {
    VehicleDetail { station: String, plate: String },
    Departures,
    FullHistory { plate: String },
    Excluded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

/// Brief, non-blocking message for the operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
}

impl Notice {
    #[must_use]
    pub fn info(text: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Info, text: text.into() }
    }

    #[must_use]
    pub fn error(text: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Error, text: text.into() }
    }
}

/// Monotonic tag for snapshot requests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequestSeq {
    issued: u64,
}

impl RequestSeq {
    /// Tag a new request; every earlier tag becomes stale.
    pub fn issue(&mut self) -> u64 {
        self.issued += 1;
        self.issued
    }

    #[must_use]
    pub fn is_current(&self, seq: u64) -> bool {
        seq == self.issued
    }

    #[must_use]
    pub fn latest(&self) -> u64 {
        self.issued
    }
}

#[derive(Debug, Clone, Default)]
pub struct MonitorState {
    modal: Option<Modal>,
    selected_plate: Option<String>,
    pub seq: RequestSeq,
    pub stations: Vec<Station>,
    pub last_sync: Option<OffsetDateTime>,
    pub notice: Option<Notice>,
}

impl MonitorState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Open `modal`, closing whichever one was open, and suspend polling.
    pub fn pause(&mut self, modal: Modal) {
        if let Some(previous) = self.modal.replace(modal) {
            tracing::debug!(?previous, "replacing open modal");
        }
    }

    /// Close the open modal, clear the selection and resume polling.
    pub fn resume(&mut self) {
        self.modal = None;
        self.selected_plate = None;
    }

    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.modal.is_some()
    }

    #[must_use]
    pub fn modal(&self) -> Option<&Modal> {
        self.modal.as_ref()
    }

    pub fn select(&mut self, plate: impl Into<String>) {
        self.selected_plate = Some(plate.into());
    }

    pub fn clear(&mut self) {
        self.selected_plate = None;
    }

    #[must_use]
    pub fn selected(&self) -> Option<&str> {
        self.selected_plate.as_deref()
    }

    /// Replace the column set if `seq` is still the latest request.
    /// Returns whether the snapshot was applied.
    pub fn apply_stations(&mut self, seq: u64, stations: Vec<Station>, now: OffsetDateTime) -> bool {
        if !self.seq.is_current(seq) {
            tracing::debug!(seq, latest = self.seq.latest(), "discarding stale snapshot");
            return false;
        }
        self.stations = stations;
        self.last_sync = Some(now);
        true
    }

    /// Station name currently holding `plate`, if any.
    #[must_use]
    pub fn station_of(&self, plate: &str) -> Option<&str> {
        self.stations
            .iter()
            .find(|s| s.vehicles.iter().any(|v| v.plate.eq_ignore_ascii_case(plate)))
            .map(|s| s.name.as_str())
    }
}
