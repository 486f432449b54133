//! Declarative rendering: data model in, view structs out.
//!
//! DESIGN
//! ======
//! Each `render_*` function is pure and returns plain data, so layout rules
//! (labels, durations, ordering, role gating) are testable without a
//! terminal. The `Display` impls turn those views into the text the CLI
//! prints; nothing here performs I/O.

use std::fmt;

use time::OffsetDateTime;
use time::macros::format_description;

use crate::api::types::{DeparturesPage, ExcludedVehicle, SessionState, Station, Vehicle};
use crate::format::{format_duration, slot_label_opt};
use crate::history::{SessionHistory, StationDwell};

#[cfg(test)]
#[path = "render_test.rs"]
mod render_test;

pub const NEVER_SYNCED: &str = "--:--:--";
const DEFAULT_COLOR: &str = "#9e9e9e";

// =============================================================================
// BOARD
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardView {
    pub plate: String,
    pub slot: String,
    pub station_time: String,
    pub total_time: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnView {
    pub station: String,
    pub color: String,
    pub cards: Vec<CardView>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardView {
    pub columns: Vec<ColumnView>,
    pub last_sync: String,
}

impl BoardView {
    #[must_use]
    pub fn vehicle_count(&self) -> usize {
        self.columns.iter().map(|c| c.cards.len()).sum()
    }
}

fn render_card(vehicle: &Vehicle) -> CardView {
    CardView {
        plate: vehicle.plate.clone(),
        slot: slot_label_opt(vehicle.slot.as_deref()),
        station_time: format_duration(vehicle.station_seconds),
        total_time: format_duration(vehicle.total_seconds),
    }
}

#[must_use]
pub fn render_board(stations: &[Station], last_sync: Option<OffsetDateTime>) -> BoardView {
    let columns = stations
        .iter()
        .map(|station| ColumnView {
            station: station.name.clone(),
            color: station.color.clone().unwrap_or_else(|| DEFAULT_COLOR.to_owned()),
            cards: station.vehicles.iter().map(render_card).collect(),
        })
        .collect();
    BoardView { columns, last_sync: sync_label(last_sync) }
}

/// `HH:MM:SS` label for the last successful sync.
#[must_use]
pub fn sync_label(last_sync: Option<OffsetDateTime>) -> String {
    let format = format_description!("[hour]:[minute]:[second]");
    last_sync
        .and_then(|at| at.format(&format).ok())
        .unwrap_or_else(|| NEVER_SYNCED.to_owned())
}

// =============================================================================
// VEHICLE DETAIL
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DwellRow {
    pub station: String,
    pub total_time: String,
    pub visits: usize,
    pub since: String,
    pub slot: String,
    pub photo: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailView {
    pub plate: String,
    pub station: String,
    pub slot: String,
    pub rows: Vec<DwellRow>,
}

#[must_use]
pub fn render_detail(station: &str, vehicle: Option<&Vehicle>, plate: &str, dwell: &[StationDwell]) -> DetailView {
    DetailView {
        plate: plate.to_owned(),
        station: station.to_owned(),
        slot: vehicle.map(|v| slot_label_opt(v.slot.as_deref())).unwrap_or_default(),
        rows: dwell
            .iter()
            .map(|d| DwellRow {
                station: d.station.clone(),
                total_time: format_duration(Some(d.total_seconds)),
                visits: d.visits,
                since: d.last_started_at.clone(),
                slot: slot_label_opt(d.last_slot.as_deref()),
                photo: d.last_photo.clone(),
            })
            .collect(),
    }
}

// =============================================================================
// DEPARTURES
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepartureRowView {
    pub plate: String,
    pub entered: String,
    pub exited: String,
    pub duration: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeparturesView {
    pub rows: Vec<DepartureRowView>,
    pub page: u32,
    pub total_pages: u32,
    pub total: u64,
    pub has_prev: bool,
    pub has_next: bool,
}

#[must_use]
pub fn render_departures(page: &DeparturesPage) -> DeparturesView {
    let total_pages = page.total_pages.max(1);
    DeparturesView {
        rows: page
            .rows
            .iter()
            .map(|row| DepartureRowView {
                plate: row.plate.clone(),
                entered: row.entered_at.clone().unwrap_or_else(|| "-".to_owned()),
                exited: row.exited_at.clone().unwrap_or_else(|| "-".to_owned()),
                duration: format_duration(row.duration_seconds),
            })
            .collect(),
        page: page.page,
        total_pages,
        total: page.total,
        has_prev: page.page > 1,
        has_next: page.page < total_pages,
    }
}

// =============================================================================
// FULL HISTORY
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisitRowView {
    pub station: String,
    pub slot: String,
    pub started: String,
    pub ended: String,
    pub duration: String,
    pub photo: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionView {
    pub id: String,
    pub active: bool,
    pub status: &'static str,
    pub entered: String,
    pub exited: String,
    pub duration: String,
    pub visits: Vec<VisitRowView>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FullHistoryView {
    pub plate: String,
    pub sessions: Vec<SessionView>,
}

/// Sessions keep the server's order (newest first).
#[must_use]
pub fn render_full_history(plate: &str, sessions: &[SessionHistory]) -> FullHistoryView {
    FullHistoryView {
        plate: plate.to_owned(),
        sessions: sessions
            .iter()
            .map(|entry| {
                let active = entry.session.state == SessionState::Active;
                SessionView {
                    id: entry.session.id.clone(),
                    active,
                    status: if active { "EN PLANTA" } else { "FINALIZADA" },
                    entered: entry.session.entered_at.clone(),
                    exited: entry.session.exited_at.clone().unwrap_or_else(|| "-".to_owned()),
                    duration: format_duration(entry.session.duration_seconds),
                    visits: entry
                        .visits
                        .iter()
                        .map(|visit| VisitRowView {
                            station: visit.station.clone(),
                            slot: slot_label_opt(visit.slot.as_deref()),
                            started: visit.started_at.clone(),
                            ended: visit.ended_at.clone().unwrap_or_else(|| "-".to_owned()),
                            duration: format_duration(visit.duration_seconds),
                            photo: visit.photo.clone(),
                        })
                        .collect(),
                }
            })
            .collect(),
    }
}

// =============================================================================
// EXCLUSIONS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExcludedView {
    pub rows: Vec<ExcludedVehicle>,
    pub can_manage: bool,
}

#[must_use]
pub fn render_excluded(vehicles: &[ExcludedVehicle], can_manage: bool) -> ExcludedView {
    let mut rows = vehicles.to_vec();
    rows.sort_by(|a, b| a.plate.cmp(&b.plate));
    ExcludedView { rows, can_manage }
}

// =============================================================================
// TEXT OUTPUT
// =============================================================================

impl fmt::Display for BoardView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Last sync {}  ({} vehicles)", self.last_sync, self.vehicle_count())?;
        for column in &self.columns {
            writeln!(f, "== {} [{}] ({})", column.station, column.color, column.cards.len())?;
            if column.cards.is_empty() {
                writeln!(f, "   (empty)")?;
            }
            for card in &column.cards {
                write!(f, "   {:<10}", card.plate)?;
                if !card.slot.is_empty() {
                    write!(f, " {:<14}", card.slot)?;
                }
                writeln!(f, " here {:>10}  total {:>10}", card.station_time, card.total_time)?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for DetailView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} @ {}", self.plate, self.station)?;
        if !self.slot.is_empty() {
            write!(f, " ({})", self.slot)?;
        }
        writeln!(f)?;
        if self.rows.is_empty() {
            return writeln!(f, "   no recent visits");
        }
        for row in &self.rows {
            write!(f, "   {:<16} {:>10}  x{}  since {}", row.station, row.total_time, row.visits, row.since)?;
            if !row.slot.is_empty() {
                write!(f, "  {}", row.slot)?;
            }
            if let Some(photo) = &row.photo {
                write!(f, "  [{photo}]")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl fmt::Display for DeparturesView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Departures page {}/{} ({} total)", self.page, self.total_pages, self.total)?;
        if self.rows.is_empty() {
            writeln!(f, "   no departures")?;
        }
        for row in &self.rows {
            writeln!(f, "   {:<10} in {}  out {}  {:>10}", row.plate, row.entered, row.exited, row.duration)?;
        }
        Ok(())
    }
}

impl fmt::Display for FullHistoryView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "History for {}", self.plate)?;
        if self.sessions.is_empty() {
            return writeln!(f, "   no sessions");
        }
        for session in &self.sessions {
            let marker = if session.active { '*' } else { ' ' };
            writeln!(
                f,
                "{marker} session {} [{}] in {}  out {}  {}",
                session.id, session.status, session.entered, session.exited, session.duration
            )?;
            for visit in &session.visits {
                write!(f, "     {:<16} {} -> {}  {:>10}", visit.station, visit.started, visit.ended, visit.duration)?;
                if !visit.slot.is_empty() {
                    write!(f, "  {}", visit.slot)?;
                }
                writeln!(f)?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for ExcludedView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Excluded vehicles ({})", self.rows.len())?;
        for row in &self.rows {
            writeln!(f, "   {:<10} {}", row.plate, row.description)?;
        }
        if !self.can_manage {
            writeln!(f, "   (read-only)")?;
        }
        Ok(())
    }
}
