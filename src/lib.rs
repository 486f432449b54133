//! Live station monitor for the workshop LPR (license-plate recognition) backend.
//!
//! SYSTEM CONTEXT
//! ==============
//! The backend tracks vehicles through stations and exposes the result over
//! REST. This crate polls that state, renders it as station columns, and
//! lets an operator inspect visits, correct misread plates, browse
//! departures and manage the excluded-vehicle list.

pub mod api;
pub mod config;
pub mod error;
pub mod format;
pub mod history;
pub mod monitor;
pub mod render;
pub mod runner;
pub mod state;
