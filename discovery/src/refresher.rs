//! Discovery refresh loop
//!
//! Periodically fetches the root document, and when its `composedAt` token
//! changes, fetches the dependent documents, builds a new [`Snapshot`] and
//! publishes it through the [`SnapshotStore`].
//!
//! Data flow:
//! Transport → Refresher → Snapshot::build → SnapshotStore → readers / subscribers

use std::sync::Arc;

use common::logger::{TraceId, child_span, cycle_span};
use tokio::sync::Mutex;
use tokio::time::{MissedTickBehavior, interval_at};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, error, info};

use crate::config::DiscoveryConfig;
use crate::detector::ChangeDetector;
use crate::error::DiscoveryError;
use crate::metrics::counters::{RefreshCounters, add, bump};
use crate::snapshot::{RawConfig, Snapshot};
use crate::store::SnapshotStore;
use crate::transport::{Endpoints, Transport};
use crate::types::{AppConfig, Asset, AssetConfig, AssetsSchedule, VpiHistoryRaw};

#[derive(Clone, Debug)]
pub enum RefreshOutcome {
    /// `composedAt` matched the published snapshot; nothing was rebuilt.
    Unchanged,
    Published(Arc<Snapshot>),
}

impl RefreshOutcome {
    pub fn is_published(&self) -> bool {
        matches!(self, Self::Published(_))
    }
}

pub struct Refresher<T> {
    transport: Arc<T>,
    endpoints: Endpoints,
    cfg: DiscoveryConfig,
    detector: ChangeDetector,
    store: SnapshotStore,
    counters: RefreshCounters,
    /// Serializes cycles so two rebuilds never overlap.
    cycle_lock: Mutex<()>,
}

impl<T: Transport> Refresher<T> {
    pub fn new(
        transport: Arc<T>,
        cfg: DiscoveryConfig,
        store: SnapshotStore,
        counters: RefreshCounters,
    ) -> Self {
        Self {
            transport,
            endpoints: Endpoints::new(cfg.url.clone()),
            cfg,
            detector: ChangeDetector::new(),
            store,
            counters,
            cycle_lock: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    pub fn counters(&self) -> &RefreshCounters {
        &self.counters
    }

    /// Runs one fetch → detect → build → publish cycle.
    ///
    /// On error nothing is published and the previous snapshot stays current.
    pub async fn refresh_once(&self) -> Result<RefreshOutcome, DiscoveryError> {
        let _guard = self.cycle_lock.lock().await;
        bump(&self.counters.cycles);

        let trace_id = TraceId::new();
        let res = self.cycle().instrument(cycle_span("refresh", &trace_id)).await;

        match &res {
            Ok(RefreshOutcome::Unchanged) => bump(&self.counters.unchanged),
            Ok(RefreshOutcome::Published(s)) => {
                bump(&self.counters.published);
                add(&self.counters.duplicate_keys, s.duplicate_keys() as u64);
            }
            Err(_) => bump(&self.counters.failures),
        }

        res
    }

    async fn cycle(&self) -> Result<RefreshOutcome, DiscoveryError> {
        let config: AppConfig = self.transport.fetch(self.endpoints.config()).await?;

        if !self.detector.needs_rebuild(&config.composed_at) {
            return Ok(RefreshOutcome::Unchanged);
        }

        info!(composed_at = %config.composed_at, "config is updated, fetching dependent documents");

        let raw = self
            .fetch_dependents(config)
            .instrument(child_span("fetch_dependents"))
            .await?;

        let snapshot = Arc::new(Snapshot::build(raw)?);

        self.store.publish(Arc::clone(&snapshot));
        self.detector.commit(snapshot.composed_at());

        Ok(RefreshOutcome::Published(snapshot))
    }

    async fn fetch_dependents(&self, config: AppConfig) -> Result<RawConfig, DiscoveryError> {
        let assets_url = self.endpoints.assets();
        let schedules_url = self.endpoints.schedules();
        let asset_configs_url = self.endpoints.asset_configs();
        let vpi_url = self.endpoints.vpi_history();

        // a document served as `null` is treated as empty
        let (assets, schedules, asset_configs, vpi_history) = futures::try_join!(
            self.transport.fetch::<Option<Vec<Asset>>>(&assets_url),
            self.transport.fetch::<Option<AssetsSchedule>>(&schedules_url),
            self.transport.fetch::<Option<Vec<AssetConfig>>>(&asset_configs_url),
            self.transport.fetch::<Option<VpiHistoryRaw>>(&vpi_url),
        )?;

        Ok(RawConfig {
            config,
            assets: assets.unwrap_or_default(),
            asset_configs: asset_configs.unwrap_or_default(),
            schedules: schedules.unwrap_or_default(),
            vpi_history: vpi_history.unwrap_or_default(),
        })
    }

    /// Refreshes on a fixed period until `cancel` fires.
    ///
    /// A failed cycle is logged and the previous snapshot keeps being served.
    /// Consecutive failures push the next attempt out with capped exponential
    /// backoff; the first success restores the fixed period.
    pub async fn run(self: Arc<Self>, cancel: CancellationToken) {
        let period = self.cfg.refresh_interval;
        let mut ticker = interval_at(tokio::time::Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut failures: u32 = 0;

        info!(
            url = %self.endpoints.config(),
            every_ms = period.as_millis() as u64,
            "config discovery refresh loop started"
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            let res = tokio::select! {
                _ = cancel.cancelled() => break,
                res = self.refresh_once() => res,
            };

            match res {
                Ok(_) => {
                    if failures > 0 {
                        info!(failures, "config discovery recovered");
                        failures = 0;
                    }
                }
                Err(e) => {
                    failures = failures.saturating_add(1);
                    let retry_in = self.cfg.backoff(failures);
                    ticker.reset_after(retry_in);

                    error!(
                        error = %e,
                        failures,
                        retry_in_ms = retry_in.as_millis() as u64,
                        "update config failed; serving previous snapshot"
                    );
                }
            }
        }

        info!("config discovery refresh loop stopped");
    }
}
