//! Wiring of the engine for the command line.

use crate::alarm::LogAlarmScheduler;
use async_trait::async_trait;
use chrono::{FixedOffset, NaiveDate, Utc};
use habitsync_core::{HabitDto, HabitId};
use habitsync_engine::{
    EngineConfig, FileHabitStore, HabitService, HttpRemoteConfig, HttpRemoteService,
    OfflineRemote, RemoteHabitService, RemoteResult, ReqwestClient,
};
use std::path::PathBuf;
use std::time::Duration;

/// The remote selected on the command line.
pub enum CliRemote {
    /// HTTP remote at a base URL.
    Http(HttpRemoteService<ReqwestClient>),
    /// No remote configured.
    Offline(OfflineRemote),
}

#[async_trait]
impl RemoteHabitService for CliRemote {
    async fn fetch_all(&self) -> RemoteResult<Vec<(HabitId, HabitDto)>> {
        match self {
            CliRemote::Http(remote) => remote.fetch_all().await,
            CliRemote::Offline(remote) => remote.fetch_all().await,
        }
    }

    async fn insert(&self, id: &HabitId, habit: &HabitDto) -> RemoteResult<()> {
        match self {
            CliRemote::Http(remote) => remote.insert(id, habit).await,
            CliRemote::Offline(remote) => remote.insert(id, habit).await,
        }
    }
}

/// Habit service as used by the commands.
pub type Service = HabitService<FileHabitStore, CliRemote, LogAlarmScheduler>;

/// Options shared by every command.
#[derive(Debug, Clone)]
pub struct AppOptions {
    /// Snapshot file of the local store.
    pub store: PathBuf,
    /// Base URL of the remote, if any.
    pub remote: Option<String>,
    /// Offset used for day boundaries.
    pub offset: FixedOffset,
    /// Timeout for remote requests.
    pub timeout: Option<Duration>,
}

/// Everything a command needs.
pub struct App {
    /// The habit service.
    pub service: Service,
    /// Offset used for day boundaries.
    pub offset: FixedOffset,
}

impl App {
    /// Opens the local store and connects the configured remote.
    pub async fn open(options: AppOptions) -> Result<Self, Box<dyn std::error::Error>> {
        let store = FileHabitStore::open(&options.store).await?;

        let remote = match &options.remote {
            Some(url) => {
                let mut config = HttpRemoteConfig::new(url.as_str());
                if let Some(timeout) = options.timeout {
                    config = config.with_request_timeout(timeout);
                }
                let client = ReqwestClient::new(config.request_timeout)?;
                CliRemote::Http(HttpRemoteService::new(config, client))
            }
            None => CliRemote::Offline(OfflineRemote),
        };

        let mut config = EngineConfig::new(options.offset);
        if let Some(timeout) = options.timeout {
            config = config.with_fetch_timeout(timeout);
        }

        let engine = habitsync_engine::SyncEngine::new(
            config,
            store,
            remote,
            LogAlarmScheduler::new(),
        );
        Ok(Self {
            service: HabitService::new(engine),
            offset: options.offset,
        })
    }

    /// Returns today's date in the configured offset.
    pub fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.offset).date_naive()
    }

    /// Waits for background sync work to finish.
    pub async fn settle(&self) {
        self.service.engine().settle().await;
    }
}
