//! Watch loop: one repeating timer, operator events, spawned snapshot fetches.
//!
//! DESIGN
//! ======
//! `run` multiplexes three sources with `tokio::select!`:
//! - the poll interval, which spawns a snapshot fetch tagged with a fresh
//!   sequence number (skipped while a modal is open);
//! - completed fetches, applied through `Monitor::apply_snapshot` so a slow
//!   response can never overwrite a newer one;
//! - operator events, handled inline.
//!
//! Output goes through a `Paint` callback so the loop never touches a
//! terminal directly.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::api::types::{DepartureFilters, Station};
use crate::error::ApiError;
use crate::monitor::Monitor;
use crate::render::{BoardView, DeparturesView, DetailView, ExcludedView, FullHistoryView};
use crate::state::Notice;

#[cfg(test)]
#[path = "runner_test.rs"]
mod runner_test;

/// Operator input, already parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Detail { plate: String },
    Close,
    Correct { old: String, new: String },
    Departures(DepartureFilters),
    FullHistory { plate: String },
    Excluded,
    AddExcluded { plate: String, description: String },
    RemoveExcluded { plate: String },
    Confirm(bool),
    Refresh,
    Help,
    Quit,
}

/// Something the surface should draw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Paint {
    Board(BoardView),
    Detail(DetailView),
    Departures(DeparturesView),
    FullHistory(FullHistoryView),
    Excluded(ExcludedView),
    Prompt(String),
    Notice(Notice),
    Help,
}

pub const USAGE: &str = "\
commands:
  d PLATE              vehicle detail (pauses polling)
  fix OLD NEW          correct a plate
  out [PAGE] [k=v ...] departures; filters desde= hasta= placa=
  h PLATE              full session history
  x                    excluded vehicles
  x+ PLATE [TEXT]      exclude a plate
  x- PLATE             remove an exclusion (asks for confirmation)
  c                    close the open view and resume polling
  r                    refresh now
  q                    quit";

/// Parse one line of operator input.
///
/// # Errors
///
/// Returns a short explanation when the line is not a known command.
pub fn parse_command(line: &str) -> Result<Event, String> {
    let mut words = line.split_whitespace();
    let Some(command) = words.next() else {
        return Err("empty command".to_owned());
    };
    let rest: Vec<&str> = words.collect();
    let plate_arg = |name: &str| -> Result<String, String> {
        rest.first()
            .map(|p| (*p).to_owned())
            .ok_or_else(|| format!("{name} needs a plate"))
    };

    match command.to_ascii_lowercase().as_str() {
        "d" | "detail" => Ok(Event::Detail { plate: plate_arg(command)? }),
        "c" | "close" => Ok(Event::Close),
        "fix" | "correct" => match rest.as_slice() {
            [old, new] => Ok(Event::Correct { old: (*old).to_owned(), new: (*new).to_owned() }),
            _ => Err("fix needs OLD and NEW plates".to_owned()),
        },
        "out" | "departures" => parse_departures(&rest).map(Event::Departures),
        "h" | "history" => Ok(Event::FullHistory { plate: plate_arg(command)? }),
        "x" | "excluded" => Ok(Event::Excluded),
        "x+" => Ok(Event::AddExcluded { plate: plate_arg(command)?, description: rest[1..].join(" ") }),
        "x-" => Ok(Event::RemoveExcluded { plate: plate_arg(command)? }),
        "y" | "yes" => Ok(Event::Confirm(true)),
        "n" | "no" => Ok(Event::Confirm(false)),
        "r" | "refresh" => Ok(Event::Refresh),
        "?" | "help" => Ok(Event::Help),
        "q" | "quit" | "exit" => Ok(Event::Quit),
        other => Err(format!("unknown command `{other}`")),
    }
}

fn parse_departures(args: &[&str]) -> Result<DepartureFilters, String> {
    let mut filters = DepartureFilters { page: 1, ..DepartureFilters::default() };
    for arg in args {
        match arg.split_once('=') {
            Some(("desde", value)) => filters.from = Some(value.to_owned()),
            Some(("hasta", value)) => filters.to = Some(value.to_owned()),
            Some(("placa", value)) => filters.plate = Some(value.to_owned()),
            Some((key, _)) => return Err(format!("unknown filter `{key}`")),
            None => match arg.parse() {
                Ok(page) if page >= 1 => filters.page = page,
                _ => return Err(format!("invalid page `{arg}`")),
            },
        }
    }
    Ok(filters)
}

type SnapshotResult = (u64, Result<Vec<Station>, ApiError>);

/// Drive the monitor until the operator quits, the event source closes, or
/// the session expires.
///
/// # Errors
///
/// Returns `ApiError::Unauthorized` when the backend rejects the token.
pub async fn run<F>(
    mut monitor: Monitor,
    interval: Duration,
    mut events: mpsc::Receiver<Event>,
    mut paint: F,
) -> Result<(), ApiError>
where
    F: FnMut(Paint),
{
    let (snapshot_tx, mut snapshot_rx) = mpsc::channel::<SnapshotResult>(8);
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut pending_removal: Option<String> = None;

    info!(interval_ms = interval.as_millis(), "station monitor started");
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if let Some(seq) = monitor.begin_tick() {
                    let api = monitor.api();
                    let tx = snapshot_tx.clone();
                    tokio::spawn(async move {
                        let result = api.snapshot().await;
                        if tx.send((seq, result)).await.is_err() {
                            debug!(seq, "monitor stopped before snapshot arrived");
                        }
                    });
                }
            }
            Some((seq, result)) = snapshot_rx.recv() => {
                let applied = monitor.apply_snapshot(seq, result)?;
                if applied && !monitor.state().is_paused() {
                    paint(Paint::Board(monitor.board()));
                }
            }
            event = events.recv() => {
                let Some(event) = event else { break };
                if event == Event::Quit {
                    break;
                }
                handle_event(&mut monitor, event, &mut pending_removal, &mut paint).await?;
                if let Some(notice) = monitor.take_notice() {
                    paint(Paint::Notice(notice));
                }
            }
        }
    }
    info!("station monitor stopped");
    Ok(())
}

/// Apply one operator event. Only an expired session is returned as an
/// error; every other failure has already become a notice.
async fn handle_event<F>(
    monitor: &mut Monitor,
    event: Event,
    pending_removal: &mut Option<String>,
    paint: &mut F,
) -> Result<(), ApiError>
where
    F: FnMut(Paint),
{
    let outcome = match event {
        Event::Detail { plate } => {
            let plate = crate::monitor::normalize_plate(&plate);
            match monitor.state().station_of(&plate).map(ToOwned::to_owned) {
                Some(station) => monitor
                    .open_vehicle_detail(&station, &plate)
                    .await
                    .map(|view| paint(Paint::Detail(view))),
                None => {
                    paint(Paint::Notice(Notice::error(format!("{plate} is not on the board"))));
                    Ok(())
                }
            }
        }
        Event::Close => {
            *pending_removal = None;
            monitor.close_modal();
            paint(Paint::Board(monitor.board()));
            Ok(())
        }
        Event::Correct { old, new } => monitor.correct_plate(&old, &new).await.map(|_| {
            paint(Paint::Board(monitor.board()));
        }),
        Event::Departures(filters) => monitor.list_departures(&filters).await.map(|view| {
            paint(Paint::Departures(view));
        }),
        Event::FullHistory { plate } => monitor.list_full_history(&plate).await.map(|view| {
            paint(Paint::FullHistory(view));
        }),
        Event::Excluded => monitor.open_excluded().await.map(|view| paint(Paint::Excluded(view))),
        Event::AddExcluded { plate, description } => monitor
            .add_excluded_vehicle(&plate, &description)
            .await
            .map(|view| paint(Paint::Excluded(view))),
        Event::RemoveExcluded { plate } => {
            paint(Paint::Prompt(format!("remove {plate} from the excluded list? (y/n)")));
            *pending_removal = Some(plate);
            Ok(())
        }
        Event::Confirm(yes) => match pending_removal.take() {
            Some(plate) => monitor
                .remove_excluded_vehicle(&plate, |_| yes)
                .await
                .map(|view| {
                    if let Some(view) = view {
                        paint(Paint::Excluded(view));
                    }
                }),
            None => Ok(()),
        },
        Event::Refresh => monitor.refresh().await.map(|_| {
            if !monitor.state().is_paused() {
                paint(Paint::Board(monitor.board()));
            }
        }),
        Event::Help => {
            paint(Paint::Help);
            Ok(())
        }
        Event::Quit => Ok(()),
    };

    match outcome {
        Err(err @ ApiError::Unauthorized { .. }) => Err(err),
        _ => Ok(()),
    }
}
