use super::*;
use crate::backup::BackupSnapshot;
use crate::domain::snapshot::{
    CompositeSnapshot, Indicator, NewsArticle, SnapshotField, SnapshotRecord,
};
use crate::ingest::error::{FailureStage, UpstreamError};
use crate::ingest::{SourceData, UpstreamSource};
use crate::storage::cache::{FastCache, MemoryCache};
use crate::storage::lock::RefreshLock;
use crate::storage::recovery::SnapshotSink;
use crate::storage::snapshots::{decode_stored, MemorySnapshotStore, SnapshotStore};
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing_subscriber::layer::SubscriberExt;

const HOUR: Duration = Duration::from_secs(60 * 60);

#[derive(Default)]
struct RecordingCache {
    inner: MemoryCache,
    gets: AtomicUsize,
    sets: Mutex<Vec<Duration>>,
    fail: bool,
}

impl RecordingCache {
    fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    fn set_ttls(&self) -> Vec<Duration> {
        self.sets.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl FastCache for RecordingCache {
    async fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        anyhow::ensure!(!self.fail, "cache unavailable");
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, ttl: Duration, value: &str) -> anyhow::Result<()> {
        self.sets.lock().unwrap().push(ttl);
        anyhow::ensure!(!self.fail, "cache unavailable");
        self.inner.set(key, ttl, value).await
    }

    async fn delete(&self, key: &str) -> anyhow::Result<()> {
        self.inner.delete(key).await
    }
}

#[derive(Default)]
struct RecordingStore {
    inner: MemorySnapshotStore,
    gets: AtomicUsize,
    replaces: AtomicUsize,
    fail_reads: bool,
    fail_writes: bool,
}

impl RecordingStore {
    fn with_record(record: SnapshotRecord) -> Self {
        Self {
            inner: MemorySnapshotStore::with_record(record),
            ..Self::default()
        }
    }

    fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    fn replaces(&self) -> usize {
        self.replaces.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl SnapshotStore for RecordingStore {
    async fn get_latest(&self) -> anyhow::Result<Option<SnapshotRecord>> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        anyhow::ensure!(!self.fail_reads, "connection refused");
        self.inner.get_latest().await
    }

    async fn replace_latest(
        &self,
        timestamp: DateTime<Utc>,
        data: &CompositeSnapshot,
    ) -> anyhow::Result<()> {
        self.replaces.fetch_add(1, Ordering::SeqCst);
        anyhow::ensure!(!self.fail_writes, "connection reset");
        self.inner.replace_latest(timestamp, data).await
    }
}

/// Keeps the row as raw JSON and decodes on read, the way the Postgres store does.
#[derive(Default)]
struct RawRowStore {
    row: tokio::sync::RwLock<Option<(DateTime<Utc>, serde_json::Value)>>,
    replaces: AtomicUsize,
}

#[async_trait::async_trait]
impl SnapshotStore for RawRowStore {
    async fn get_latest(&self) -> anyhow::Result<Option<SnapshotRecord>> {
        let row = self.row.read().await.clone();
        Ok(row.and_then(|(ts, raw)| decode_stored(ts, raw)))
    }

    async fn replace_latest(
        &self,
        timestamp: DateTime<Utc>,
        data: &CompositeSnapshot,
    ) -> anyhow::Result<()> {
        self.replaces.fetch_add(1, Ordering::SeqCst);
        *self.row.write().await = Some((timestamp, serde_json::to_value(data)?));
        Ok(())
    }
}

struct PanickingSource {
    field: SnapshotField,
}

#[async_trait::async_trait]
impl UpstreamSource for PanickingSource {
    fn name(&self) -> &str {
        "fake:panicking"
    }

    fn field(&self) -> SnapshotField {
        self.field
    }

    async fn fetch(&self) -> Result<SourceData, UpstreamError> {
        panic!("adapter bug");
    }
}

struct FakeSource {
    name: String,
    field: SnapshotField,
    data: Option<SourceData>,
    calls: Arc<AtomicUsize>,
    delay: Duration,
}

#[async_trait::async_trait]
impl UpstreamSource for FakeSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn field(&self) -> SnapshotField {
        self.field
    }

    async fn fetch(&self) -> Result<SourceData, UpstreamError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.data.clone().ok_or_else(|| {
            UpstreamError::new(
                &self.name,
                FailureStage::RateLimited,
                "Thank you for using Alpha Vantage!",
            )
        })
    }
}

#[derive(Default)]
struct RecordingSink {
    writes: AtomicUsize,
    fail: bool,
}

#[async_trait::async_trait]
impl SnapshotSink for RecordingSink {
    async fn write_snapshot(&self, _data: &CompositeSnapshot) -> anyhow::Result<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        anyhow::ensure!(!self.fail, "read-only file system");
        Ok(())
    }
}

struct WarnCounter(Arc<AtomicUsize>);

impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for WarnCounter {
    fn on_event(
        &self,
        event: &tracing::Event<'_>,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        if *event.metadata().level() <= tracing::Level::WARN {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }
}

fn backup() -> BackupSnapshot {
    BackupSnapshot::bundled().unwrap()
}

const ALL_FIELDS: [SnapshotField; 7] = [
    SnapshotField::Stocks,
    SnapshotField::Indicator(Indicator::Gdp),
    SnapshotField::Indicator(Indicator::Inflation),
    SnapshotField::Indicator(Indicator::Unemployment),
    SnapshotField::Indicator(Indicator::TreasuryYield),
    SnapshotField::Indicator(Indicator::FederalInterestRate),
    SnapshotField::News,
];

/// Backup data with every field visibly changed, standing in for a live fetch.
fn live_snapshot() -> CompositeSnapshot {
    let mut s = backup().snapshot().clone();
    s.news = vec![NewsArticle {
        title: "Live headline".to_string(),
        link: "https://news.example/live".to_string(),
        published_at: "Mon, 14 Oct 2026 12:00:00 GMT".to_string(),
        summary: "live".to_string(),
    }];
    s.trends.stocks.last_updated = "live".to_string();
    for indicator in Indicator::ALL {
        s.trends.series_mut(indicator).name = format!("live {}", indicator.trend_key());
    }
    s
}

fn live_data(field: SnapshotField) -> SourceData {
    let live = live_snapshot();
    match field {
        SnapshotField::News => SourceData::News(live.news),
        SnapshotField::Stocks => SourceData::Stocks(live.trends.stocks),
        SnapshotField::Indicator(i) => SourceData::Series(live.trends.series(i).clone()),
    }
}

struct Sources {
    sources: Vec<Arc<dyn UpstreamSource>>,
    calls: Vec<Arc<AtomicUsize>>,
}

impl Sources {
    fn new(failing: &[SnapshotField], delay: Duration) -> Self {
        let mut sources: Vec<Arc<dyn UpstreamSource>> = Vec::new();
        let mut calls = Vec::new();
        for field in ALL_FIELDS {
            let counter = Arc::new(AtomicUsize::new(0));
            calls.push(counter.clone());
            sources.push(Arc::new(FakeSource {
                name: format!("fake:{field}"),
                field,
                data: (!failing.contains(&field)).then(|| live_data(field)),
                calls: counter,
                delay,
            }));
        }
        Self { sources, calls }
    }

    fn all_ok() -> Self {
        Self::new(&[], Duration::ZERO)
    }

    fn call_counts(&self) -> Vec<usize> {
        self.calls.iter().map(|c| c.load(Ordering::SeqCst)).collect()
    }

    fn total_calls(&self) -> usize {
        self.call_counts().iter().sum()
    }
}

fn coordinator(
    cache: Arc<RecordingCache>,
    store: Arc<RecordingStore>,
    sources: &Sources,
    policy: RefreshPolicy,
) -> SnapshotCoordinator {
    SnapshotCoordinator::new(
        cache,
        store,
        sources.sources.clone(),
        backup(),
        RefreshLock::new(),
        policy,
    )
}

fn record_aged(data: CompositeSnapshot, age: Duration) -> SnapshotRecord {
    SnapshotRecord {
        timestamp: Utc::now() - chrono::Duration::from_std(age).unwrap(),
        data,
    }
}

fn field_value(s: &CompositeSnapshot, field: SnapshotField) -> serde_json::Value {
    match field {
        SnapshotField::News => serde_json::to_value(&s.news).unwrap(),
        SnapshotField::Stocks => serde_json::to_value(&s.trends.stocks).unwrap(),
        SnapshotField::Indicator(i) => serde_json::to_value(s.trends.series(i)).unwrap(),
    }
}

#[tokio::test]
async fn cache_hit_returns_cached_data_without_touching_anything_else() {
    let cache = Arc::new(RecordingCache::default());
    let store = Arc::new(RecordingStore::default());
    let sources = Sources::all_ok();

    let mut cached = backup().snapshot().clone();
    cached.news[0].title = "from cache".to_string();
    cache
        .inner
        .set(SNAPSHOT_CACHE_KEY, HOUR, &serde_json::to_string(&cached).unwrap())
        .await
        .unwrap();

    let c = coordinator(cache.clone(), store.clone(), &sources, RefreshPolicy::default());
    let got = c.fetch_snapshot().await;

    assert_eq!(got, cached);
    assert_eq!(store.gets(), 0);
    assert_eq!(sources.total_calls(), 0);
    assert!(cache.set_ttls().is_empty());
}

#[tokio::test]
async fn fresh_store_record_is_served_and_cached_with_normal_ttl() {
    let mut stored = backup().snapshot().clone();
    stored.news[0].title = "from store".to_string();

    let cache = Arc::new(RecordingCache::default());
    let store = Arc::new(RecordingStore::with_record(record_aged(stored.clone(), HOUR)));
    let sources = Sources::all_ok();
    let policy = RefreshPolicy::default();

    let c = coordinator(cache.clone(), store.clone(), &sources, policy.clone());
    let got = c.fetch_snapshot().await;

    assert_eq!(got, stored);
    assert_eq!(sources.total_calls(), 0);
    assert_eq!(store.replaces(), 0);
    assert_eq!(cache.set_ttls(), vec![policy.cache_ttl]);
}

#[tokio::test]
async fn concurrent_cold_calls_issue_a_single_batch() {
    let cache = Arc::new(RecordingCache::default());
    let store = Arc::new(RecordingStore::default());
    let sources = Sources::new(&[], Duration::from_millis(20));

    let c = coordinator(cache, store.clone(), &sources, RefreshPolicy::default());
    let (a, b, d, e, f) = tokio::join!(
        c.fetch_snapshot(),
        c.fetch_snapshot(),
        c.fetch_snapshot(),
        c.fetch_snapshot(),
        c.fetch_snapshot(),
    );

    assert_eq!(sources.call_counts(), vec![1; 7]);
    assert_eq!(store.replaces(), 1);
    for other in [&b, &d, &e, &f] {
        assert_eq!(other, &a);
    }
    assert_eq!(a, live_snapshot());
}

#[tokio::test]
async fn any_subset_of_failing_sources_still_yields_a_complete_snapshot() {
    let backup_snapshot = backup().snapshot().clone();
    let live = live_snapshot();

    for n in 1..=ALL_FIELDS.len() {
        let failing = &ALL_FIELDS[..n];
        let cache = Arc::new(RecordingCache::default());
        let store = Arc::new(RecordingStore::default());
        let sources = Sources::new(failing, Duration::ZERO);

        let c = coordinator(cache, store, &sources, RefreshPolicy::default());
        let got = c.fetch_snapshot().await;

        let trends = serde_json::to_value(&got.trends).unwrap();
        assert_eq!(trends.as_object().unwrap().len(), 6);

        for field in ALL_FIELDS {
            let expected = if failing.contains(&field) {
                &backup_snapshot
            } else {
                &live
            };
            assert_eq!(
                field_value(&got, field),
                field_value(expected, field),
                "{n} failing, field {field}"
            );
        }
    }
}

#[tokio::test]
async fn repeated_reads_after_refresh_are_identical_and_cached() {
    let cache = Arc::new(RecordingCache::default());
    let store = Arc::new(RecordingStore::default());
    let sources = Sources::all_ok();

    let c = coordinator(cache.clone(), store.clone(), &sources, RefreshPolicy::default());
    c.fetch_snapshot().await;
    let store_reads = store.gets();

    let first = c.fetch_snapshot().await;
    let second = c.fetch_snapshot().await;

    assert_eq!(
        serde_json::to_vec(&first).unwrap(),
        serde_json::to_vec(&second).unwrap()
    );
    assert_eq!(store.gets(), store_reads);
    assert_eq!(sources.total_calls(), 7);
}

#[tokio::test]
async fn empty_store_with_healthy_sources_commits_and_caches() {
    let cache = Arc::new(RecordingCache::default());
    let store = Arc::new(RecordingStore::default());
    let sources = Sources::all_ok();
    let policy = RefreshPolicy::default();

    let before = Utc::now();
    let c = coordinator(cache.clone(), store.clone(), &sources, policy.clone());
    let got = c.fetch_snapshot().await;
    let after = Utc::now();

    assert_eq!(got, live_snapshot());

    let record = store.inner.get_latest().await.unwrap().unwrap();
    assert!(record.timestamp >= before && record.timestamp <= after);
    assert_eq!(record.data, got);
    assert_eq!(cache.set_ttls(), vec![policy.cache_ttl]);
}

#[tokio::test]
async fn news_failure_uses_backup_news_and_logs_once() {
    let warnings = Arc::new(AtomicUsize::new(0));
    let subscriber = tracing_subscriber::registry().with(WarnCounter(warnings.clone()));
    let _default = tracing::subscriber::set_default(subscriber);

    let cache = Arc::new(RecordingCache::default());
    let store = Arc::new(RecordingStore::default());
    let sources = Sources::new(&[SnapshotField::News], Duration::ZERO);

    let c = coordinator(cache, store, &sources, RefreshPolicy::default());
    let got = c.fetch_snapshot().await;

    let live = live_snapshot();
    assert_eq!(got.news, backup().snapshot().news);
    assert_eq!(got.trends, live.trends);
    assert_eq!(warnings.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn record_older_than_window_triggers_refresh() {
    let cache = Arc::new(RecordingCache::default());
    let store = Arc::new(RecordingStore::with_record(record_aged(
        backup().snapshot().clone(),
        25 * HOUR,
    )));
    let sources = Sources::all_ok();

    let c = coordinator(cache, store.clone(), &sources, RefreshPolicy::default());
    let got = c.fetch_snapshot().await;

    assert_eq!(sources.call_counts(), vec![1; 7]);
    assert_eq!(store.replaces(), 1);
    assert_eq!(got, live_snapshot());

    let record = store.inner.get_latest().await.unwrap().unwrap();
    assert!(Utc::now() - record.timestamp < chrono::Duration::minutes(1));
}

#[tokio::test]
async fn ci_bypass_serves_backup_without_side_effects() {
    let cache = Arc::new(RecordingCache::default());
    let store = Arc::new(RecordingStore::default());
    let sources = Sources::all_ok();
    let policy = RefreshPolicy {
        ci_bypass: true,
        ..RefreshPolicy::default()
    };

    let c = coordinator(cache.clone(), store.clone(), &sources, policy);
    let got = c.fetch_snapshot().await;

    assert_eq!(&got, backup().snapshot());
    assert_eq!(cache.gets(), 0);
    assert!(cache.set_ttls().is_empty());
    assert_eq!(store.gets(), 0);
    assert_eq!(store.replaces(), 0);
    assert_eq!(sources.total_calls(), 0);
}

#[tokio::test]
async fn unreachable_store_serves_backup_with_short_ttl() {
    let cache = Arc::new(RecordingCache::default());
    let store = Arc::new(RecordingStore {
        fail_reads: true,
        ..RecordingStore::default()
    });
    let sources = Sources::all_ok();
    let policy = RefreshPolicy::default();

    let c = coordinator(cache.clone(), store, &sources, policy.clone());
    let got = c.fetch_snapshot().await;

    assert_eq!(&got, backup().snapshot());
    assert_eq!(sources.total_calls(), 0);
    assert_eq!(cache.set_ttls(), vec![policy.backup_ttl]);
}

#[tokio::test]
async fn failed_commit_serves_backup_with_short_ttl() {
    let cache = Arc::new(RecordingCache::default());
    let store = Arc::new(RecordingStore {
        fail_writes: true,
        ..RecordingStore::default()
    });
    let sources = Sources::all_ok();
    let policy = RefreshPolicy::default();

    let c = coordinator(cache.clone(), store.clone(), &sources, policy.clone());
    let got = c.fetch_snapshot().await;

    assert_eq!(&got, backup().snapshot());
    assert_eq!(store.replaces(), 1);
    assert_eq!(cache.set_ttls(), vec![policy.backup_ttl]);
}

#[tokio::test]
async fn cache_outage_falls_through_to_store() {
    let mut stored = backup().snapshot().clone();
    stored.news[0].title = "from store".to_string();

    let cache = Arc::new(RecordingCache::failing());
    let store = Arc::new(RecordingStore::with_record(record_aged(stored.clone(), HOUR)));
    let sources = Sources::all_ok();

    let c = coordinator(cache, store, &sources, RefreshPolicy::default());
    assert_eq!(c.fetch_snapshot().await, stored);
    assert_eq!(sources.total_calls(), 0);
}

#[tokio::test]
async fn undecodable_cache_entry_is_a_miss() {
    let cache = Arc::new(RecordingCache::default());
    cache
        .inner
        .set(SNAPSHOT_CACHE_KEY, HOUR, r#"{"news": []}"#)
        .await
        .unwrap();
    let store = Arc::new(RecordingStore::default());
    let sources = Sources::all_ok();

    let c = coordinator(cache, store, &sources, RefreshPolicy::default());
    assert_eq!(c.fetch_snapshot().await, live_snapshot());
}

#[tokio::test]
async fn waiter_rechecks_store_after_acquiring_lock() {
    let cache = Arc::new(RecordingCache::default());
    let store = Arc::new(RecordingStore::default());
    let sources = Sources::all_ok();
    let lock = RefreshLock::new();

    let c = Arc::new(SnapshotCoordinator::new(
        cache,
        store.clone(),
        sources.sources.clone(),
        backup(),
        lock.clone(),
        RefreshPolicy::default(),
    ));

    let guard = lock.acquire().await;
    let waiter = tokio::spawn({
        let c = c.clone();
        async move { c.fetch_snapshot().await }
    });
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(store.gets(), 1);

    // Simulates another caller finishing its refresh while the waiter is blocked.
    let mut refreshed = backup().snapshot().clone();
    refreshed.news[0].title = "refreshed elsewhere".to_string();
    store.inner.replace_latest(Utc::now(), &refreshed).await.unwrap();
    drop(guard);

    let got = waiter.await.unwrap();
    assert_eq!(got, refreshed);
    assert_eq!(store.gets(), 2);
    assert_eq!(sources.total_calls(), 0);
}

#[tokio::test]
async fn recovery_copy_is_written_only_in_dev_mode_and_never_fails_refresh() {
    for (dev_file_backup, fail) in [(false, false), (true, false), (true, true)] {
        let cache = Arc::new(RecordingCache::default());
        let store = Arc::new(RecordingStore::default());
        let sources = Sources::all_ok();
        let sink = Arc::new(RecordingSink {
            fail,
            ..RecordingSink::default()
        });
        let policy = RefreshPolicy {
            dev_file_backup,
            ..RefreshPolicy::default()
        };

        let c = coordinator(cache, store.clone(), &sources, policy).with_recovery_sink(sink.clone());
        let got = c.fetch_snapshot().await;

        assert_eq!(got, live_snapshot());
        assert_eq!(store.replaces(), 1);
        assert_eq!(
            sink.writes.load(Ordering::SeqCst),
            usize::from(dev_file_backup)
        );
    }
}

#[tokio::test]
async fn force_refresh_ignores_freshness_and_reports_substitutions() {
    let cache = Arc::new(RecordingCache::default());
    let store = Arc::new(RecordingStore::with_record(record_aged(
        backup().snapshot().clone(),
        HOUR,
    )));
    let sources = Sources::new(&[SnapshotField::Stocks], Duration::ZERO);

    let c = coordinator(cache, store.clone(), &sources, RefreshPolicy::default());
    let (_, report) = c.force_refresh().await.unwrap();

    assert_eq!(sources.call_counts(), vec![1; 7]);
    assert_eq!(store.replaces(), 1);
    assert_eq!(report.live.len(), 6);
    assert_eq!(report.substituted.len(), 1);
    assert_eq!(report.substituted[0].0, SnapshotField::Stocks);
    assert!(!report.is_fully_live());
}

#[tokio::test]
async fn preview_does_not_commit() {
    let cache = Arc::new(RecordingCache::default());
    let store = Arc::new(RecordingStore::default());
    let sources = Sources::all_ok();

    let c = coordinator(cache.clone(), store.clone(), &sources, RefreshPolicy::default());
    let (snapshot, report) = c.preview_refresh().await;

    assert_eq!(snapshot, live_snapshot());
    assert!(report.is_fully_live());
    assert_eq!(store.replaces(), 0);
    assert!(cache.set_ttls().is_empty());
}

#[tokio::test]
async fn invalidate_cache_forces_next_read_past_the_cache() {
    let cache = Arc::new(RecordingCache::default());
    let store = Arc::new(RecordingStore::default());
    let sources = Sources::all_ok();

    let c = coordinator(cache.clone(), store.clone(), &sources, RefreshPolicy::default());
    c.fetch_snapshot().await;
    let reads = store.gets();

    c.invalidate_cache().await.unwrap();
    assert!(cache.inner.get(SNAPSHOT_CACHE_KEY).await.unwrap().is_none());

    c.fetch_snapshot().await;
    assert_eq!(store.gets(), reads + 1);
    assert_eq!(sources.total_calls(), 7);
}

#[tokio::test]
async fn undecodable_stored_record_is_refreshed_and_overwritten() {
    let cache = Arc::new(RecordingCache::default());
    let store = Arc::new(RawRowStore::default());
    *store.row.write().await = Some((
        Utc::now(),
        serde_json::json!({ "news": [], "trends": { "Stocks": "gone" } }),
    ));
    let sources = Sources::all_ok();
    let policy = RefreshPolicy::default();

    let c = SnapshotCoordinator::new(
        cache.clone(),
        store.clone(),
        sources.sources.clone(),
        backup(),
        RefreshLock::new(),
        policy.clone(),
    );
    let got = c.fetch_snapshot().await;

    assert_eq!(got, live_snapshot());
    assert_eq!(sources.call_counts(), vec![1; 7]);
    assert_eq!(store.replaces.load(Ordering::SeqCst), 1);
    assert_eq!(store.get_latest().await.unwrap().unwrap().data, got);
    assert_eq!(cache.set_ttls(), vec![policy.cache_ttl]);
}

#[tokio::test]
async fn panicking_source_is_reported_as_substituted() {
    let healthy = Sources::all_ok();
    let sources: Vec<Arc<dyn UpstreamSource>> = healthy
        .sources
        .iter()
        .map(|s| {
            if s.field() == SnapshotField::Stocks {
                Arc::new(PanickingSource {
                    field: SnapshotField::Stocks,
                }) as Arc<dyn UpstreamSource>
            } else {
                Arc::clone(s)
            }
        })
        .collect();

    let c = SnapshotCoordinator::new(
        Arc::new(RecordingCache::default()),
        Arc::new(RecordingStore::default()),
        sources,
        backup(),
        RefreshLock::new(),
        RefreshPolicy::default(),
    );
    let (snapshot, report) = c.force_refresh().await.unwrap();

    assert_eq!(snapshot.trends.stocks, backup().snapshot().trends.stocks);
    assert_eq!(report.live.len(), 6);
    assert!(!report.live.contains(&SnapshotField::Stocks));
    assert_eq!(report.substituted.len(), 1);
    assert_eq!(report.substituted[0].0, SnapshotField::Stocks);
}
