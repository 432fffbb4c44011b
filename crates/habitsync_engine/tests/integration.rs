//! Integration tests for the sync engine against its collaborators.

use async_trait::async_trait;
use chrono::{FixedOffset, NaiveDate, NaiveTime, TimeZone, Weekday};
use habitsync_core::{Habit, HabitId};
use habitsync_engine::{
    EngineConfig, EngineError, FileHabitStore, HabitStream, HttpClient, HttpRemoteConfig,
    HttpRemoteService, LocalHabitStore, MemoryHabitStore, MockRemoteService,
    RecordingAlarmScheduler, RefreshOutcome, RemoteError, RemoteResult, SyncEngine,
};
use parking_lot::Mutex;
use proptest::prelude::*;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio_stream::StreamExt;

type MockEngine = SyncEngine<MemoryHabitStore, MockRemoteService, RecordingAlarmScheduler>;

fn utc() -> FixedOffset {
    FixedOffset::east_opt(0).unwrap()
}

fn habit(id: &str, name: &str, hour: u32) -> Habit {
    Habit::with_id(
        HabitId::new(id),
        name,
        vec![Weekday::Mon, Weekday::Wed, Weekday::Fri],
        NaiveTime::from_hms_opt(hour, 0, 0).unwrap(),
        utc().with_ymd_and_hms(2024, 3, 4, 6, 30, 0).unwrap(),
    )
}

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 6).unwrap()
}

fn mock_engine(store: MemoryHabitStore, remote: MockRemoteService) -> MockEngine {
    SyncEngine::new(
        EngineConfig::default(),
        store,
        remote,
        RecordingAlarmScheduler::new(),
    )
}

fn offline_remote() -> MockRemoteService {
    let remote = MockRemoteService::new();
    remote.set_connected(false);
    remote
}

/// Pulls emissions until one satisfies `accept`.
async fn wait_for(stream: &mut HabitStream, accept: impl Fn(&[Habit]) -> bool) -> Vec<Habit> {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let habits = stream
                .next()
                .await
                .expect("stream ended")
                .expect("stream failed");
            if accept(&habits) {
                return habits;
            }
        }
    })
    .await
    .expect("no matching emission")
}

#[tokio::test]
async fn inserted_habit_reads_back_equal() {
    let engine = mock_engine(MemoryHabitStore::new(), MockRemoteService::new());
    let mut original = habit("stretch", "Stretch", 7);
    original.toggle_completion(NaiveDate::from_ymd_opt(2024, 3, 4).unwrap());

    engine.insert(&original).await.unwrap();

    assert_eq!(engine.habit_by_id(&original.id).await.unwrap(), original);
    engine.settle().await;
}

#[tokio::test]
async fn reinsert_leaves_one_alarm_for_latest_schedule() {
    let engine = mock_engine(MemoryHabitStore::new(), MockRemoteService::new());
    let first = habit("walk", "Walk", 7);
    let second = habit("walk", "Walk the dog", 18);

    engine.insert(&first).await.unwrap();
    engine.insert(&second).await.unwrap();

    let alarms = engine.alarms();
    assert_eq!(alarms.live_count(), 1);
    assert_eq!(alarms.live_alarm(&second.id), Some(second.clone()));
    assert_eq!(alarms.cancelled(), 1);
    assert_eq!(alarms.double_scheduled(), 0);
    engine.settle().await;
}

#[tokio::test]
async fn read_path_survives_failing_remote() {
    let stored = habit("read", "Read", 21);
    let store = MemoryHabitStore::with_rows(vec![stored.to_row(utc())]);
    let engine = mock_engine(store, offline_remote());

    let mut stream = engine.habits_for_day(day());
    let first = stream.next().await.unwrap().unwrap();
    assert_eq!(first, vec![stored]);

    engine.settle().await;
    assert_eq!(engine.stats().remote_failures, 1);
}

#[tokio::test]
async fn remote_habit_becomes_visible_through_local_store() {
    let remote = MockRemoteService::new();
    let fetched = habit("journal", "Journal", 22);
    remote.set_fetch_response(vec![(fetched.id.clone(), fetched.to_dto())]);
    let engine = mock_engine(MemoryHabitStore::new(), remote);

    let mut stream = engine.habits_for_day(day());
    let habits = wait_for(&mut stream, |habits| !habits.is_empty()).await;

    assert_eq!(habits, vec![fetched.clone()]);
    assert_eq!(engine.habit_by_id(&fetched.id).await.unwrap(), fetched);
    assert_eq!(engine.alarms().live_alarm(&fetched.id), Some(fetched));
    engine.settle().await;
    assert!(engine.remote().inserted().is_empty());
}

#[tokio::test]
async fn remote_habit_starting_later_stays_hidden() {
    let remote = MockRemoteService::new();
    let mut later = habit("later", "Later", 9);
    later.start_date = utc().with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap();
    remote.set_fetch_response(vec![(later.id.clone(), later.to_dto())]);
    let engine = mock_engine(MemoryHabitStore::new(), remote);

    let mut stream = engine.habits_for_day(day());
    engine.settle().await;

    // Stored and alarmed, but not visible for a day before its start.
    assert!(engine.habit_by_id(&later.id).await.is_ok());
    assert_eq!(engine.alarms().live_count(), 1);
    let latest = stream.next().await.unwrap().unwrap();
    assert!(latest.is_empty());
}

#[tokio::test]
async fn empty_remote_does_not_remove_local_habits() {
    let stored = habit("floss", "Floss", 22);
    let remote = MockRemoteService::new();
    remote.set_fetch_response(Vec::new());
    let engine = mock_engine(
        MemoryHabitStore::with_rows(vec![stored.to_row(utc())]),
        remote,
    );

    let mut stream = engine.habits_for_day(day());
    engine.settle().await;

    assert_eq!(stream.next().await.unwrap().unwrap(), vec![stored]);
    assert_eq!(
        engine.refresh_from_remote().await.unwrap(),
        RefreshOutcome::Merged { merged: 0, skipped: 0 }
    );
}

#[tokio::test]
async fn mirror_failure_does_not_affect_local_state() {
    let remote = MockRemoteService::new();
    remote.set_fail_inserts(true);
    let engine = mock_engine(MemoryHabitStore::new(), remote);
    let h = habit("water", "Water plants", 8);

    engine.insert(&h).await.unwrap();
    engine.settle().await;

    assert_eq!(engine.habit_by_id(&h.id).await.unwrap(), h);
    assert_eq!(engine.alarms().live_count(), 1);
    assert_eq!(engine.stats().mirror_failures, 1);
}

#[tokio::test]
async fn unknown_id_is_not_found() {
    let engine = mock_engine(MemoryHabitStore::new(), MockRemoteService::new());
    let err = engine
        .habit_by_id(&HabitId::new("never-inserted"))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::NotFound(ref id) if id.as_str() == "never-inserted"));
}

#[tokio::test]
async fn dropping_the_stream_does_not_cancel_the_refresh() {
    let remote = MockRemoteService::new();
    let fetched = habit("yoga", "Yoga", 6);
    remote.set_fetch_response(vec![(fetched.id.clone(), fetched.to_dto())]);
    remote.set_fetch_delay(Duration::from_millis(50));
    let engine = mock_engine(MemoryHabitStore::new(), remote);

    drop(engine.habits_for_day(day()));
    engine.settle().await;

    assert_eq!(engine.habit_by_id(&fetched.id).await.unwrap(), fetched);
    assert_eq!(engine.stats().refreshes_completed, 1);
}

#[tokio::test]
async fn hung_remote_does_not_delay_first_emission() {
    let stored = habit("piano", "Piano", 17);
    let remote = MockRemoteService::new();
    remote.set_fetch_response(Vec::new());
    remote.set_fetch_delay(Duration::from_secs(3600));
    let engine = mock_engine(
        MemoryHabitStore::with_rows(vec![stored.to_row(utc())]),
        remote,
    );

    let mut stream = engine.habits_for_day(day());
    let first = tokio::time::timeout(Duration::from_secs(1), stream.next())
        .await
        .expect("first emission waited on the remote")
        .unwrap()
        .unwrap();
    assert_eq!(first, vec![stored]);
}

#[tokio::test]
async fn local_store_failure_reaches_the_stream() {
    let store = MemoryHabitStore::new();
    store.set_fail_reads(true);
    let engine = mock_engine(store, offline_remote());

    let mut stream = engine.habits_for_day(day());
    let err = stream.next().await.unwrap().unwrap_err();
    assert!(matches!(err, EngineError::Store(_)));
    engine.settle().await;
}

/// A JSON document shared by every client, standing in for the remote service.
#[derive(Clone, Default)]
struct SharedDocument {
    entries: Arc<Mutex<BTreeMap<String, serde_json::Value>>>,
}

#[async_trait]
impl HttpClient for SharedDocument {
    async fn get(&self, url: &str) -> RemoteResult<Vec<u8>> {
        if !url.ends_with("/habits.json") {
            return Err(RemoteError::transport_fatal(format!("HTTP 404 from {url}")));
        }
        let entries = self.entries.lock();
        let body = if entries.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::to_value(&*entries).unwrap()
        };
        Ok(serde_json::to_vec(&body).unwrap())
    }

    async fn patch(&self, _url: &str, body: Vec<u8>) -> RemoteResult<Vec<u8>> {
        let patch: BTreeMap<String, serde_json::Value> = serde_json::from_slice(&body).unwrap();
        self.entries.lock().extend(patch);
        Ok(body)
    }
}

#[tokio::test]
async fn two_devices_converge_through_the_remote() {
    let dir = tempfile::tempdir().unwrap();
    let document = SharedDocument::default();
    let device = |name: &str| {
        let path = dir.path().join(format!("{name}.json"));
        let document = document.clone();
        async move {
            SyncEngine::new(
                EngineConfig::default(),
                FileHabitStore::open(path).await.unwrap(),
                HttpRemoteService::new(HttpRemoteConfig::new("https://habits.test"), document),
                RecordingAlarmScheduler::new(),
            )
        }
    };

    let phone = device("phone").await;
    let h = habit("run", "Run 5k", 7);
    phone.insert(&h).await.unwrap();
    phone.settle().await;

    let laptop = device("laptop").await;
    let mut stream = laptop.habits_for_day(day());
    let habits = wait_for(&mut stream, |habits| !habits.is_empty()).await;
    assert_eq!(habits, vec![h.clone()]);
    assert_eq!(laptop.alarms().live_alarm(&h.id), Some(h.clone()));
    laptop.settle().await;

    // The merged habit was persisted on the laptop's disk.
    let reopened = FileHabitStore::open(dir.path().join("laptop.json"))
        .await
        .unwrap();
    assert!(reopened.find_by_id(&h.id).await.unwrap().is_some());
}

fn arb_batch() -> impl Strategy<Value = Vec<Habit>> {
    let entry = (
        "[a-d]",
        "[A-Za-z ]{1,16}",
        proptest::sample::subsequence(
            vec![Weekday::Mon, Weekday::Wed, Weekday::Sat, Weekday::Sun],
            1..=4,
        ),
        0u32..24,
        1u32..28,
    )
        .prop_map(|(id, name, days, hour, start_day)| {
            Habit::with_id(
                HabitId::new(id),
                name,
                days,
                NaiveTime::from_hms_opt(hour, 0, 0).unwrap(),
                utc().with_ymd_and_hms(2024, 2, start_day, 12, 0, 0).unwrap(),
            )
        });
    proptest::collection::vec(entry, 0..8)
}

fn merged_state(batch: &[Habit], runs: usize) -> (Vec<habitsync_core::HabitRow>, Vec<Option<Habit>>, u64) {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();
    runtime.block_on(async {
        let engine = mock_engine(MemoryHabitStore::new(), offline_remote());
        for _ in 0..runs {
            engine.apply_remote_habits(batch).await.unwrap();
        }
        let alarms = ["a", "b", "c", "d"]
            .iter()
            .map(|id| engine.alarms().live_alarm(&HabitId::new(*id)))
            .collect();
        (engine.store().rows(), alarms, engine.alarms().double_scheduled())
    })
}

proptest! {
    #[test]
    fn batch_merge_is_idempotent(batch in arb_batch()) {
        let (rows_once, alarms_once, doubles_once) = merged_state(&batch, 1);
        let (rows_twice, alarms_twice, doubles_twice) = merged_state(&batch, 2);

        prop_assert_eq!(rows_once, rows_twice);
        prop_assert_eq!(alarms_once, alarms_twice);
        prop_assert_eq!(doubles_once, 0);
        prop_assert_eq!(doubles_twice, 0);
    }
}
