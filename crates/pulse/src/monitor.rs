//! Refresh cycles over the configured sources.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use pulse_cache::{
    CacheKey, KvStore, MemoryKvStore, MemorySeriesStore, RedbStore, SeriesStore, TieredCache,
};
use pulse_combine::{CompositeReport, LiteIndex, LiteQuotes, PillarWeights, ScoringEngine};
use pulse_fetch::{GatedSource, RateLimiter, RetryingFetcher, SignalSource};
use pulse_history::{ScoreHistoryStore, WriteOutcome};
use pulse_traits::{Clock, ErrorKind, RawSignalValue, Result, Score, SignalKey, Snapshot, SystemClock};
use serde::Serialize;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, info, warn};

use crate::config::PulseConfig;

/// File name of the redb database inside the data directory.
pub const DB_FILE: &str = "pulse.redb";

/// redb table holding the score history, apart from the cache budget.
pub const HISTORY_TABLE: &str = "history";

/// Ticket for one refresh cycle. Later tickets carry larger ids.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Cycle(u64);

impl Cycle {
    /// Numeric id.
    #[must_use]
    pub const fn id(&self) -> u64 {
        self.0
    }
}

/// Why a signal did not make it into a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FetchFailure {
    /// Failure class, or `None` if the fetch task itself died.
    pub kind: Option<ErrorKind>,
    /// Error message.
    pub message: String,
}

/// Everything the sources returned for one cycle.
#[derive(Debug, Clone, Default)]
pub struct Collection {
    /// Values that resolved.
    pub snapshot: Snapshot,
    /// Signals that were requested and failed.
    pub failures: BTreeMap<SignalKey, FetchFailure>,
    /// Signals no source provides.
    pub unsourced: Vec<SignalKey>,
}

/// Result of a finished cycle.
#[derive(Debug, Clone, Serialize)]
pub struct RefreshOutcome {
    /// Cycle id.
    pub cycle: u64,
    /// Report computed by this cycle.
    pub report: CompositeReport,
    /// Whether the report replaced the committed one. `false` when a newer
    /// cycle committed first.
    pub committed: bool,
    /// Fetch failures seen in this cycle.
    pub failures: BTreeMap<SignalKey, FetchFailure>,
}

#[derive(Debug)]
struct Committed {
    cycle: u64,
    report: CompositeReport,
}

/// Market health monitor: gated sources, tiered cache, scoring engine and
/// score history built once and shared.
///
/// Each [`MarketPulse::refresh`] fetches every signal concurrently, scores
/// whatever resolved and commits the report unless a cycle that started
/// later has already committed.
#[derive(Debug)]
pub struct MarketPulse {
    config: PulseConfig,
    sources: Vec<Arc<dyn SignalSource>>,
    engine: ScoringEngine,
    history: ScoreHistoryStore,
    cache: Arc<TieredCache<RawSignalValue>>,
    cycles: AtomicU64,
    committed: Mutex<Option<Committed>>,
}

impl MarketPulse {
    /// Start building a monitor.
    #[must_use]
    pub fn builder() -> MarketPulseBuilder {
        MarketPulseBuilder::default()
    }

    /// The configuration in use.
    #[must_use]
    pub const fn config(&self) -> &PulseConfig {
        &self.config
    }

    /// The scoring engine.
    #[must_use]
    pub const fn engine(&self) -> &ScoringEngine {
        &self.engine
    }

    /// The score history.
    #[must_use]
    pub const fn history(&self) -> &ScoreHistoryStore {
        &self.history
    }

    /// The shared signal cache.
    #[must_use]
    pub const fn cache(&self) -> &Arc<TieredCache<RawSignalValue>> {
        &self.cache
    }

    /// Gated sources, in priority order.
    #[must_use]
    pub fn sources(&self) -> &[Arc<dyn SignalSource>] {
        &self.sources
    }

    /// Run one complete cycle: fetch, score, commit.
    ///
    /// # Errors
    ///
    /// Only if scoring fails, which the standard registry never does.
    /// Fetch failures become fallback readings.
    pub async fn refresh(&self) -> Result<RefreshOutcome> {
        let cycle = self.begin_cycle();
        let collection = self.collect().await;
        self.finish(cycle, collection)
    }

    /// Take the next cycle ticket.
    #[must_use]
    pub fn begin_cycle(&self) -> Cycle {
        Cycle(self.cycles.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Fetch every signal from the first source that provides it.
    ///
    /// All fetches run as separate tasks and are awaited together; a failed
    /// or panicked task only loses its own signal.
    pub async fn collect(&self) -> Collection {
        let mut collection = Collection::default();
        let mut tasks = JoinSet::new();
        let mut pending = BTreeSet::new();

        for key in SignalKey::ALL {
            let Some(source) = self.sources.iter().find(|s| s.provides(key)) else {
                collection.unsourced.push(key);
                continue;
            };
            let source = Arc::clone(source);
            pending.insert(key);
            tasks.spawn(async move {
                let result = source.fetch(key).await;
                (key, source.name().to_string(), result)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            let (key, source, result) = match joined {
                Ok(done) => done,
                Err(e) => {
                    warn!(error = %e, "fetch task failed");
                    continue;
                }
            };
            pending.remove(&key);
            match result {
                Ok(value) => collection.snapshot.insert(value),
                Err(e) => {
                    warn!(signal = %key, source = %source, kind = %e.kind(), error = %e, "fetch failed");
                    collection.failures.insert(
                        key,
                        FetchFailure {
                            kind: Some(e.kind()),
                            message: e.to_string(),
                        },
                    );
                }
            }
        }

        for key in pending {
            collection.failures.insert(
                key,
                FetchFailure {
                    kind: None,
                    message: "fetch task did not complete".to_string(),
                },
            );
        }

        debug!(
            resolved = collection.snapshot.len(),
            failed = collection.failures.len(),
            unsourced = collection.unsourced.len(),
            "collected signals"
        );
        collection
    }

    /// Score a collection under `cycle` and commit it if no newer cycle has
    /// committed. Committed complete reports are saved to the history.
    ///
    /// # Errors
    ///
    /// Only if scoring fails.
    pub fn finish(&self, cycle: Cycle, collection: Collection) -> Result<RefreshOutcome> {
        let report = self.engine.evaluate(&collection.snapshot)?;
        let committed = self.commit(&cycle, &report);
        if !committed {
            debug!(cycle = cycle.id(), "newer cycle already committed, discarding");
        }

        Ok(RefreshOutcome {
            cycle: cycle.id(),
            report,
            committed,
            failures: collection.failures,
        })
    }

    /// The most recently committed report.
    #[must_use]
    pub fn composite(&self) -> Option<CompositeReport> {
        self.lock_committed().as_ref().map(|c| c.report.clone())
    }

    /// Id of the cycle behind [`MarketPulse::composite`].
    #[must_use]
    pub fn committed_cycle(&self) -> Option<u64> {
        self.lock_committed().as_ref().map(|c| c.cycle)
    }

    /// Percentile rank of `score` in the recent history, once enough days
    /// are stored.
    #[must_use]
    pub fn history_percentile(&self, score: Score) -> Option<Score> {
        self.history.percentile(score)
    }

    /// Stored history days.
    #[must_use]
    pub fn history_length(&self) -> usize {
        self.history.len()
    }

    /// Three-component lite index over the given quotes.
    #[must_use]
    pub fn lite_index(&self, quotes: &LiteQuotes) -> LiteIndex {
        LiteIndex::compute(quotes)
    }

    /// Store a time-series value for `ticker` at `interval`.
    pub fn cache_series(&self, ticker: &str, interval: &str, value: RawSignalValue) {
        self.cache
            .set(&CacheKey::series(ticker, interval), value, self.config.series_ttl);
    }

    /// Live series values for every interval of `ticker`.
    #[must_use]
    pub fn series(&self, ticker: &str) -> Vec<RawSignalValue> {
        self.cache.series_for_ticker(ticker)
    }

    /// Sweep expired cache entries in the background at the configured
    /// interval.
    pub fn spawn_sweeper(&self) -> JoinHandle<()> {
        self.cache.spawn_sweeper(self.config.sweep_interval)
    }

    /// Install `report` unless a newer cycle has committed. The history is
    /// written under the same guard.
    fn commit(&self, cycle: &Cycle, report: &CompositeReport) -> bool {
        let mut slot = self.lock_committed();
        if slot.as_ref().is_some_and(|c| c.cycle > cycle.id()) {
            return false;
        }
        *slot = Some(Committed {
            cycle: cycle.id(),
            report: report.clone(),
        });
        info!(
            cycle = cycle.id(),
            score = report.score,
            status = %report.status,
            missing = report.missing.len(),
            "committed report"
        );

        if report.incomplete {
            warn!(
                cycle = cycle.id(),
                missing = report.missing.len(),
                "report incomplete, not saved to history"
            );
        } else if self.history.save(report.score, report.pillar_scores()) != WriteOutcome::Full {
            warn!(cycle = cycle.id(), "history saved in degraded mode");
        }
        true
    }

    fn lock_committed(&self) -> MutexGuard<'_, Option<Committed>> {
        self.committed.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Builder for [`MarketPulse`].
#[derive(Debug, Default)]
pub struct MarketPulseBuilder {
    config: PulseConfig,
    clock: Option<Arc<dyn Clock>>,
    weights: PillarWeights,
    sources: Vec<Arc<dyn SignalSource>>,
}

impl MarketPulseBuilder {
    /// Use `config`.
    #[must_use]
    pub fn config(mut self, config: PulseConfig) -> Self {
        self.config = config;
        self
    }

    /// Use `clock` for TTLs and history dates. Defaults to the system clock.
    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Override the pillar weights.
    #[must_use]
    pub const fn weights(mut self, weights: PillarWeights) -> Self {
        self.weights = weights;
        self
    }

    /// Add a source. Earlier sources take precedence for signals several
    /// sources provide.
    #[must_use]
    pub fn source(mut self, source: Arc<dyn SignalSource>) -> Self {
        self.sources.push(source);
        self
    }

    /// Wire everything together.
    ///
    /// Sources sharing a name share one rate limiter.
    ///
    /// # Errors
    ///
    /// Returns an error if the weights are invalid or the database in the
    /// data directory cannot be opened.
    pub fn build(self) -> Result<MarketPulse> {
        let Self {
            config,
            clock,
            weights,
            sources,
        } = self;
        let clock = clock.unwrap_or_else(|| Arc::new(SystemClock));
        let engine = ScoringEngine::new(weights)?.with_missing_threshold(config.missing_threshold);

        // history is kept out of the cache budget
        let (kv, history_kv, series): (Arc<dyn KvStore>, Arc<dyn KvStore>, Arc<dyn SeriesStore>) =
            match &config.data_dir {
                Some(dir) => {
                    let store = RedbStore::open(dir.join(DB_FILE))?;
                    let history = store.partition(HISTORY_TABLE)?;
                    let store = Arc::new(store.with_capacity(config.kv_capacity_bytes));
                    (
                        Arc::clone(&store) as Arc<dyn KvStore>,
                        Arc::new(history) as Arc<dyn KvStore>,
                        store as Arc<dyn SeriesStore>,
                    )
                }
                None => (
                    Arc::new(MemoryKvStore::with_capacity(config.kv_capacity_bytes)) as Arc<dyn KvStore>,
                    Arc::new(MemoryKvStore::new()) as Arc<dyn KvStore>,
                    Arc::new(MemorySeriesStore::new()) as Arc<dyn SeriesStore>,
                ),
            };

        let cache = Arc::new(
            TieredCache::new(Arc::clone(&clock))
                .with_durable(kv)
                .with_series(series)
                .with_memory_ttl(config.memory_ttl),
        );
        let history = ScoreHistoryStore::open(history_kv, clock);

        let retry = RetryingFetcher::new(config.retry_policy());
        let mut limiters: BTreeMap<String, Arc<RateLimiter>> = BTreeMap::new();
        let sources = sources
            .into_iter()
            .map(|inner| {
                let limiter = limiters
                    .entry(inner.name().to_string())
                    .or_insert_with(|| Arc::new(RateLimiter::new(config.budget(inner.name()))));
                Arc::new(GatedSource::new(
                    inner,
                    Arc::clone(limiter),
                    retry,
                    Arc::clone(&cache),
                    config.durable_ttl,
                )) as Arc<dyn SignalSource>
            })
            .collect::<Vec<_>>();

        info!(
            sources = sources.len(),
            durable = config.data_dir.is_some(),
            history_days = history.len(),
            "market pulse ready"
        );

        Ok(MarketPulse {
            config,
            sources,
            engine,
            history,
            cache,
            cycles: AtomicU64::new(0),
            committed: Mutex::new(None),
        })
    }
}
