//! Per-station grouping of a plate's recent visits.
//!
//! DESIGN
//! ======
//! The backend delivers visit records in ascending chronological order.
//! Grouping walks them once, summing durations per station through a
//! name → index lookup, and remembers the position of each station's latest
//! visit. Sorting on that position yields most-recent-first order without
//! parsing any timestamp.

use std::collections::HashMap;

use crate::api::types::{Session, VisitRecord};

#[cfg(test)]
#[path = "history_test.rs"]
mod history_test;

/// How many distinct stations the detail view shows.
pub const RECENT_STATION_LIMIT: usize = 5;

/// Accumulated dwell for one station across a plate's recent visits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StationDwell {
    pub station: String,
    pub total_seconds: i64,
    pub visits: usize,
    /// Start time of the latest visit.
    pub last_started_at: String,
    pub last_slot: Option<String>,
    pub last_photo: Option<String>,
    last_index: usize,
}

/// One session of a plate with its station-level visits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionHistory {
    pub session: Session,
    pub visits: Vec<VisitRecord>,
}

/// Group records by station, most recently visited first, keeping at most `limit` stations.
#[must_use]
pub fn group_recent_stations(records: &[VisitRecord], limit: usize) -> Vec<StationDwell> {
    let mut grouped: Vec<StationDwell> = Vec::new();
    let mut index_by_station: HashMap<&str, usize> = HashMap::new();

    for (position, record) in records.iter().enumerate() {
        let duration = record.duration_seconds.unwrap_or(0).max(0);
        match index_by_station.get(record.station.as_str()) {
            Some(&idx) => {
                let entry = &mut grouped[idx];
                entry.total_seconds = entry.total_seconds.saturating_add(duration);
                entry.visits += 1;
                entry.last_started_at.clone_from(&record.started_at);
                entry.last_slot.clone_from(&record.slot);
                entry.last_photo.clone_from(&record.photo);
                entry.last_index = position;
            }
            None => {
                index_by_station.insert(&record.station, grouped.len());
                grouped.push(StationDwell {
                    station: record.station.clone(),
                    total_seconds: duration,
                    visits: 1,
                    last_started_at: record.started_at.clone(),
                    last_slot: record.slot.clone(),
                    last_photo: record.photo.clone(),
                    last_index: position,
                });
            }
        }
    }

    grouped.sort_by(|a, b| b.last_index.cmp(&a.last_index));
    grouped.truncate(limit);
    grouped
}
