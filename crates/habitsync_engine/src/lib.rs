//! # habitsync engine
//!
//! Offline-first habit synchronization.
//!
//! This crate provides:
//! - `SyncEngine`: live per-day habit queries, alarm-paired inserts and
//!   lookups over a local store with a best-effort remote mirror
//! - `HabitService`: due-today lists, completion toggling and validated saves
//! - Local stores (in-memory and JSON file-backed)
//! - Remote services (HTTP, offline and mock)
//! - Alarm scheduler abstraction
//!
//! ## Architecture
//!
//! The local store is the single source of truth:
//! 1. Readers observe the local store and see its content immediately
//! 2. Each read launches one detached remote fetch that writes back locally
//! 3. Writes re-pair the habit's alarm, persist locally, then mirror remotely
//!
//! ## Key Invariants
//!
//! - Remote failures are logged, never returned to callers
//! - Remote data is shown only after it is stored locally and alarm-paired
//! - Every stored habit has exactly one live alarm after `insert` returns
//! - Not-found is distinct from local store failure

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod alarm;
mod config;
mod engine;
mod error;
mod file_store;
mod http;
mod remote;
mod service;
mod store;

pub use alarm::{AlarmScheduler, RecordingAlarmScheduler};
pub use config::{EngineConfig, HttpRemoteConfig};
pub use engine::{HabitStream, RefreshOutcome, SyncEngine, SyncStats};
pub use error::{
    EngineError, EngineResult, RemoteError, RemoteResult, StoreError, StoreResult,
};
pub use file_store::FileHabitStore;
pub use http::{HttpClient, HttpRemoteService, ReqwestClient};
pub use remote::{MockRemoteService, OfflineRemote, RemoteHabitService};
pub use service::HabitService;
pub use store::{LocalHabitStore, MemoryHabitStore, RowStream};
