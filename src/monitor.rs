//! Live station monitor: poll, render, pause, correct.
//!
//! DESIGN
//! ======
//! `Monitor` owns the view model and a handle to the backend. Every
//! operation that opens a modal goes through `MonitorState::pause`, and every
//! close path goes through `close_modal`, so the pause flag and the selected
//! plate are reset by one code path on success and failure alike.
//!
//! ERROR HANDLING
//! ==============
//! Polling failures are logged and leave the previous columns untouched.
//! Operator-initiated failures set a `Notice` and are returned to the caller;
//! the open modal stays open so the operator can retry or close it. Only
//! `ApiError::Unauthorized` escapes the polling path, because an expired
//! session cannot recover by retrying.

use std::sync::Arc;

use futures::future::join_all;
use time::OffsetDateTime;
use tracing::{debug, info, warn};

use crate::api::LprApi;
use crate::api::types::{CorrectionOutcome, CurrentUser, DepartureFilters, EXCLUSION_ADMIN_ROLE, ExcludedVehicle, Station};
use crate::error::ApiError;
use crate::history::{RECENT_STATION_LIMIT, SessionHistory, group_recent_stations};
use crate::render::{self, BoardView, DeparturesView, DetailView, ExcludedView, FullHistoryView};
use crate::state::{Modal, MonitorState, Notice};

#[cfg(test)]
#[path = "monitor_test.rs"]
mod monitor_test;

pub struct Monitor {
    api: Arc<dyn LprApi>,
    state: MonitorState,
    user: Option<CurrentUser>,
}

impl Monitor {
    #[must_use]
    pub fn new(api: Arc<dyn LprApi>) -> Self {
        Self { api, state: MonitorState::new(), user: None }
    }

    #[must_use]
    pub fn api(&self) -> Arc<dyn LprApi> {
        Arc::clone(&self.api)
    }

    #[must_use]
    pub fn state(&self) -> &MonitorState {
        &self.state
    }

    #[must_use]
    pub fn board(&self) -> BoardView {
        render::render_board(&self.state.stations, self.state.last_sync)
    }

    pub fn take_notice(&mut self) -> Option<Notice> {
        self.state.notice.take()
    }

    // =========================================================================
    // POLLING
    // =========================================================================

    /// Tag a snapshot request, or `None` while a modal holds the poll.
    pub fn begin_tick(&mut self) -> Option<u64> {
        if self.state.is_paused() {
            debug!(modal = ?self.state.modal(), "tick skipped; modal open");
            return None;
        }
        Some(self.state.seq.issue())
    }

    /// Apply the result of the snapshot request tagged `seq`.
    ///
    /// Returns `Ok(true)` when the columns were replaced. Failed and stale
    /// snapshots leave the columns untouched.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` when the session has expired.
    pub fn apply_snapshot(&mut self, seq: u64, result: Result<Vec<Station>, ApiError>) -> Result<bool, ApiError> {
        match result {
            Ok(stations) => Ok(self.state.apply_stations(seq, stations, now())),
            Err(err @ ApiError::Unauthorized { .. }) => Err(err),
            Err(err) => {
                warn!(error = %err, seq, retryable = err.retryable(), "snapshot refresh failed; keeping previous columns");
                Ok(false)
            }
        }
    }

    /// Fetch the current snapshot and replace the columns.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` when the session has expired.
    pub async fn refresh(&mut self) -> Result<bool, ApiError> {
        let seq = self.state.seq.issue();
        let result = self.api.snapshot().await;
        self.apply_snapshot(seq, result)
    }

    /// Timer entry point: refresh unless a modal is open.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` when the session has expired.
    pub async fn tick(&mut self) -> Result<bool, ApiError> {
        let Some(seq) = self.begin_tick() else {
            return Ok(false);
        };
        let result = self.api.snapshot().await;
        self.apply_snapshot(seq, result)
    }

    /// Close whichever modal is open and resume polling.
    pub fn close_modal(&mut self) {
        self.state.resume();
    }

    // =========================================================================
    // VEHICLE DETAIL + CORRECTION
    // =========================================================================

    /// Pause polling and show the plate's recent stations.
    ///
    /// A failed history fetch still opens the modal, with no rows and a notice.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` when the session has expired.
    pub async fn open_vehicle_detail(&mut self, station: &str, plate: &str) -> Result<DetailView, ApiError> {
        self.state.pause(Modal::VehicleDetail { station: station.to_owned(), plate: plate.to_owned() });
        self.state.select(plate);

        let dwell = match self.api.history(plate, None).await {
            Ok(records) => group_recent_stations(&records, RECENT_STATION_LIMIT),
            Err(err) => {
                warn!(error = %err, plate, "vehicle history fetch failed");
                self.state.notice = Some(Notice::error(format!("could not load history for {plate}: {err}")));
                if matches!(err, ApiError::Unauthorized { .. }) {
                    return Err(err);
                }
                Vec::new()
            }
        };

        let vehicle = self
            .state
            .stations
            .iter()
            .find(|s| s.name == station)
            .and_then(|s| s.vehicles.iter().find(|v| v.plate == plate));
        Ok(render::render_detail(station, vehicle, plate, &dwell))
    }

    pub fn close_vehicle_detail(&mut self) {
        self.close_modal();
    }

    /// Send a plate correction. On success the modal closes and the board
    /// refreshes immediately; on failure the modal stays open.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Rejected` for an empty or unchanged plate, or the
    /// backend error when the correction fails.
    pub async fn correct_plate(&mut self, old: &str, new: &str) -> Result<CorrectionOutcome, ApiError> {
        let original = normalize_plate(old);
        let corrected = normalize_plate(new);
        if corrected.is_empty() {
            return Err(self.reject("the corrected plate is empty"));
        }
        if corrected == original {
            return Err(self.reject("the corrected plate matches the current one"));
        }

        let response = match self.api.correct_plate(&original, &corrected).await {
            Ok(response) => response,
            Err(err) => {
                warn!(error = %err, %original, %corrected, "plate correction failed");
                self.state.notice = Some(Notice::error(format!("could not correct {original}: {err}")));
                return Err(err);
            }
        };

        let outcome = response.outcome();
        info!(%original, %corrected, ?outcome, "plate corrected");
        self.close_modal();
        self.state.notice = Some(Notice::info(correction_message(outcome, &original, &corrected)));
        self.refresh().await?;
        Ok(outcome)
    }

    // =========================================================================
    // DEPARTURES + FULL HISTORY
    // =========================================================================

    /// One page of departed vehicles.
    ///
    /// # Errors
    ///
    /// Returns the backend error when the page cannot be fetched.
    pub async fn list_departures(&mut self, filters: &DepartureFilters) -> Result<DeparturesView, ApiError> {
        self.state.pause(Modal::Departures);
        match self.api.departures(filters).await {
            Ok(page) => Ok(render::render_departures(&page)),
            Err(err) => {
                warn!(error = %err, page = filters.page, "departures fetch failed");
                self.state.notice = Some(Notice::error(format!("could not load departures: {err}")));
                Err(err)
            }
        }
    }

    /// Every session of `plate`, newest first, each with its visits.
    ///
    /// A failed per-session fetch leaves that session without visits.
    ///
    /// # Errors
    ///
    /// Returns the backend error when the session list cannot be fetched, and
    /// `ApiError::Unauthorized` when any per-session fetch reports an expired
    /// session.
    pub async fn list_full_history(&mut self, plate: &str) -> Result<FullHistoryView, ApiError> {
        self.state.pause(Modal::FullHistory { plate: plate.to_owned() });
        self.state.select(plate);

        let sessions = match self.api.sessions(plate).await {
            Ok(sessions) => sessions,
            Err(err) => {
                warn!(error = %err, plate, "session list fetch failed");
                self.state.notice = Some(Notice::error(format!("could not load sessions for {plate}: {err}")));
                return Err(err);
            }
        };

        let api = &self.api;
        let fetches = sessions.iter().map(|session| api.history(plate, Some(session.id.as_str())));
        let visits = join_all(fetches).await;

        let mut history = Vec::with_capacity(sessions.len());
        for (session, visits) in sessions.into_iter().zip(visits) {
            let visits = match visits {
                Ok(visits) => visits,
                Err(err @ ApiError::Unauthorized { .. }) => {
                    self.state.notice = Some(Notice::error(format!("could not load sessions for {plate}: {err}")));
                    return Err(err);
                }
                Err(err) => {
                    warn!(error = %err, plate, session = %session.id, "session visits fetch failed");
                    Vec::new()
                }
            };
            history.push(SessionHistory { session, visits });
        }

        Ok(render::render_full_history(plate, &history))
    }

    // =========================================================================
    // EXCLUSIONS
    // =========================================================================

    /// Resolve the caller once and report whether they may manage exclusions.
    ///
    /// # Errors
    ///
    /// Returns the backend error when `/auth/me` fails.
    pub async fn can_manage_exclusions(&mut self) -> Result<bool, ApiError> {
        Ok(self.current_user().await?.can_manage_exclusions())
    }

    /// The authenticated caller, fetched from `/auth/me` on first use.
    ///
    /// # Errors
    ///
    /// Returns the backend error when `/auth/me` fails.
    pub async fn current_user(&mut self) -> Result<CurrentUser, ApiError> {
        if let Some(user) = &self.user {
            return Ok(user.clone());
        }
        let user = self.api.current_user().await?;
        self.user = Some(user.clone());
        Ok(user)
    }

    async fn ensure_exclusion_admin(&mut self) -> Result<(), ApiError> {
        if self.can_manage_exclusions().await? {
            return Ok(());
        }
        Err(self.reject(&format!("managing excluded vehicles requires the {EXCLUSION_ADMIN_ROLE} role")))
    }

    /// Pause polling and show the exclusion list.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Rejected` for non-admin callers, or the backend error.
    pub async fn open_excluded(&mut self) -> Result<ExcludedView, ApiError> {
        self.ensure_exclusion_admin().await?;
        self.state.pause(Modal::Excluded);
        self.reload_excluded().await
    }

    pub fn close_excluded(&mut self) {
        self.close_modal();
    }

    /// # Errors
    ///
    /// Returns `ApiError::Rejected` for non-admin callers or an empty plate,
    /// or the backend error.
    pub async fn add_excluded_vehicle(&mut self, plate: &str, description: &str) -> Result<ExcludedView, ApiError> {
        self.ensure_exclusion_admin().await?;
        let plate = normalize_plate(plate);
        if plate.is_empty() {
            return Err(self.reject("the plate is empty"));
        }

        let vehicle = ExcludedVehicle { plate, description: description.trim().to_owned() };
        if let Err(err) = self.api.add_excluded(&vehicle).await {
            warn!(error = %err, plate = %vehicle.plate, "add excluded vehicle failed");
            self.state.notice = Some(Notice::error(format!("could not exclude {}: {err}", vehicle.plate)));
            return Err(err);
        }
        info!(plate = %vehicle.plate, "vehicle excluded from tracking");
        self.state.notice = Some(Notice::info(format!("{} excluded from tracking", vehicle.plate)));
        self.reload_excluded().await
    }

    /// Remove an exclusion after `confirm` approves it.
    ///
    /// Returns `Ok(None)` without sending anything when the operator declines.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Rejected` for non-admin callers, or the backend error.
    pub async fn remove_excluded_vehicle<F>(&mut self, plate: &str, confirm: F) -> Result<Option<ExcludedView>, ApiError>
    where
        F: FnOnce(&str) -> bool,
    {
        self.ensure_exclusion_admin().await?;
        let plate = normalize_plate(plate);
        if !confirm(&plate) {
            debug!(%plate, "exclusion removal cancelled");
            return Ok(None);
        }

        if let Err(err) = self.api.remove_excluded(&plate).await {
            warn!(error = %err, %plate, "remove excluded vehicle failed");
            self.state.notice = Some(Notice::error(format!("could not remove {plate}: {err}")));
            return Err(err);
        }
        info!(%plate, "vehicle exclusion removed");
        self.state.notice = Some(Notice::info(format!("{plate} is tracked again")));
        self.reload_excluded().await.map(Some)
    }

    async fn reload_excluded(&mut self) -> Result<ExcludedView, ApiError> {
        let can_manage = self.user.as_ref().is_some_and(CurrentUser::can_manage_exclusions);
        match self.api.excluded().await {
            Ok(vehicles) => Ok(render::render_excluded(&vehicles, can_manage)),
            Err(err) => {
                warn!(error = %err, "excluded vehicle list fetch failed");
                self.state.notice = Some(Notice::error(format!("could not load excluded vehicles: {err}")));
                Err(err)
            }
        }
    }

    fn reject(&mut self, reason: &str) -> ApiError {
        self.state.notice = Some(Notice::error(reason));
        ApiError::Rejected(reason.to_owned())
    }
}

/// Plates are compared and sent trimmed and upper-cased.
#[must_use]
pub fn normalize_plate(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// Operator confirmation text for a successful correction.
#[must_use]
pub fn correction_message(outcome: CorrectionOutcome, original: &str, corrected: &str) -> String {
    match outcome {
        CorrectionOutcome::Merged => {
            format!("{original} corrected to {corrected} and merged into its active record")
        }
        CorrectionOutcome::Renamed => format!("{original} corrected to {corrected}"),
    }
}

fn now() -> OffsetDateTime {
    OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc())
}
