//! Engine Test Explorer - ingestion and summary engine for tab-delimited
//! engine-test logs.
//!
//! ## Module Structure
//!
//! - [`data`] - File discovery, schema inference, loading, time alignment
//! - [`axis`] - The 1–4 "Y axis" slots and the columns bound to them
//! - [`summary`] - Windowed mean/median/min/max/std per file and column
//! - [`export`] - Merged series and summary tables for CSV/spreadsheet output
//! - [`state`] - Session state shared with whatever front end drives it
//! - [`settings`] - Key-value store for persisted operator settings
//! - [`config`] - Engine configuration
//! - [`error`] - Error types

pub mod axis;
pub mod config;
pub mod data;
pub mod error;
pub mod export;
pub mod settings;
pub mod state;
pub mod summary;
