//! ConfigDiscovery
//!
//! Owned handle over the discovery cache. Construction performs the first
//! refresh synchronously and fails if it fails, so a handle always has a
//! snapshot to serve. A background task then keeps the snapshot fresh until
//! [`ConfigDiscovery::shutdown`] is called or the handle is dropped.
//!
//! Accessors load the current snapshot once per call and return owned copies.
//! To run several lookups against one consistent generation, pin it with
//! [`ConfigDiscovery::snapshot`] and use the borrowing methods on [`Snapshot`].

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, info, info_span, warn};

use crate::config::DiscoveryConfig;
use crate::error::DiscoveryError;
use crate::metrics::counters::RefreshCounters;
use crate::refresher::{RefreshOutcome, Refresher};
use crate::snapshot::Snapshot;
use crate::store::SnapshotStore;
use crate::transport::{HttpTransport, Transport};
use crate::types::{
    AppConfig, Asset, AssetConfig, AssetSchedule, CollateralAsset, Market, Vault, VpiParamsParsed,
};

pub struct ConfigDiscovery<T: Transport = HttpTransport> {
    refresher: Arc<Refresher<T>>,
    store: SnapshotStore,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl ConfigDiscovery<HttpTransport> {
    /// Connects to the discovery service over HTTP.
    pub async fn connect(cfg: DiscoveryConfig) -> Result<Self, DiscoveryError> {
        let transport = HttpTransport::new(cfg.fetch_timeout)?;
        Self::with_transport(cfg, transport).await
    }
}

impl<T: Transport + 'static> ConfigDiscovery<T> {
    /// Fetches the first snapshot and starts the refresh loop.
    ///
    /// Must be called from within a tokio runtime.
    pub async fn with_transport(
        cfg: DiscoveryConfig,
        transport: T,
    ) -> Result<Self, DiscoveryError> {
        let store = SnapshotStore::new(cfg.updates_capacity);
        let refresher = Arc::new(Refresher::new(
            Arc::new(transport),
            cfg.clone(),
            store.clone(),
            RefreshCounters::default(),
        ));

        let first = refresher.refresh_once().await?;
        if let RefreshOutcome::Published(snapshot) = &first {
            info!(
                url = %cfg.url,
                composed_at = %snapshot.composed_at(),
                "initial config fetched"
            );
        }

        let cancel = CancellationToken::new();
        let task = tokio::spawn(
            Arc::clone(&refresher)
                .run(cancel.clone())
                .instrument(info_span!("config_discovery_refresh", url = %cfg.url)),
        );

        Ok(Self {
            refresher,
            store,
            cancel,
            task: Some(task),
        })
    }

    /// Stops the refresh loop and waits for it to exit. The last snapshot
    /// stays readable.
    pub async fn shutdown(&mut self) {
        self.cancel.cancel();

        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!(error = ?e, "refresh task ended abnormally");
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Runs a refresh cycle now, outside the regular schedule.
    pub async fn refresh_now(&self) -> Result<RefreshOutcome, DiscoveryError> {
        self.refresher.refresh_once().await
    }

    /// The current snapshot.
    pub fn snapshot(&self) -> Result<Arc<Snapshot>, DiscoveryError> {
        self.store.current().ok_or(DiscoveryError::ConfigUnavailable)
    }

    /// Receives every snapshot published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<Snapshot>> {
        self.store.subscribe()
    }

    pub fn counters(&self) -> &RefreshCounters {
        self.refresher.counters()
    }

    fn with_snapshot<R>(&self, default: R, f: impl FnOnce(&Snapshot) -> R) -> R {
        match self.store.current() {
            Some(s) => f(&s),
            None => default,
        }
    }

    // ---- whole documents ----

    pub fn get_config(&self) -> Option<AppConfig> {
        self.with_snapshot(None, |s| Some(s.config().clone()))
    }

    pub fn get_assets(&self) -> Vec<Asset> {
        self.with_snapshot(Vec::new(), |s| s.assets().to_vec())
    }

    pub fn get_asset_configs(&self) -> Vec<AssetConfig> {
        self.with_snapshot(Vec::new(), |s| s.asset_configs().to_vec())
    }

    pub fn get_schedules(&self) -> HashMap<String, AssetSchedule> {
        self.with_snapshot(HashMap::new(), |s| s.schedules().clone())
    }

    pub fn get_schedule(&self, asset_name: &str) -> Option<AssetSchedule> {
        self.with_snapshot(None, |s| s.schedule(asset_name).cloned())
    }

    // ---- markets ----

    pub fn has_market_by_address(&self, address: &str) -> bool {
        self.with_snapshot(false, |s| s.has_market_by_address(address))
    }

    pub fn get_market_by_address(&self, address: &str) -> Option<Market> {
        self.with_snapshot(None, |s| s.market_by_address(address).cloned())
    }

    pub fn has_prelaunch_market_by_address(&self, address: &str) -> bool {
        self.with_snapshot(false, |s| s.has_prelaunch_market_by_address(address))
    }

    pub fn get_prelaunch_market_by_address(&self, address: &str) -> Option<Market> {
        self.with_snapshot(None, |s| s.prelaunch_market_by_address(address).cloned())
    }

    pub fn get_markets_addresses(&self) -> Vec<String> {
        self.with_snapshot(Vec::new(), |s| s.market_addresses().to_vec())
    }

    pub fn get_markets_by_asset_name(&self, name: &str) -> Vec<Market> {
        self.with_snapshot(Vec::new(), |s| {
            s.markets_by_asset_name(name).into_iter().cloned().collect()
        })
    }

    // ---- vaults ----

    pub fn has_vault_by_address(&self, address: &str) -> bool {
        self.with_snapshot(false, |s| s.has_vault_by_address(address))
    }

    pub fn get_vault_by_address(&self, address: &str) -> Option<Vault> {
        self.with_snapshot(None, |s| s.vault_by_address(address).cloned())
    }

    pub fn has_vault_by_collateral_asset_name(&self, name: &str) -> bool {
        self.with_snapshot(false, |s| s.has_vault_by_collateral_asset_name(name))
    }

    pub fn get_vault_by_collateral_asset_name(&self, name: &str) -> Option<Vault> {
        self.with_snapshot(None, |s| s.vault_by_collateral_asset_name(name).cloned())
    }

    pub fn has_vault_by_collateral_asset_id(&self, asset_id: &str) -> bool {
        self.with_snapshot(false, |s| s.has_vault_by_collateral_asset_id(asset_id))
    }

    pub fn get_vault_by_collateral_asset_id(&self, asset_id: &str) -> Option<Vault> {
        self.with_snapshot(None, |s| s.vault_by_collateral_asset_id(asset_id).cloned())
    }

    pub fn has_vault_by_lp_jetton_master_address(&self, address: &str) -> bool {
        self.with_snapshot(false, |s| s.has_vault_by_lp_jetton_master_address(address))
    }

    pub fn get_vault_by_lp_jetton_master_address(&self, address: &str) -> Option<Vault> {
        self.with_snapshot(None, |s| s.vault_by_lp_jetton_master_address(address).cloned())
    }

    // ---- assets ----

    pub fn has_asset_by_name(&self, name: &str) -> bool {
        self.with_snapshot(false, |s| s.has_asset_by_name(name))
    }

    pub fn get_asset_by_name(&self, name: &str) -> Option<Asset> {
        self.with_snapshot(None, |s| s.asset_by_name(name).cloned())
    }

    pub fn has_asset_by_index(&self, index: i64) -> bool {
        self.with_snapshot(false, |s| s.has_asset_by_index(index))
    }

    pub fn get_asset_by_index(&self, index: i64) -> Option<Asset> {
        self.with_snapshot(None, |s| s.asset_by_index(index).cloned())
    }

    pub fn has_collateral_asset_by_name(&self, name: &str) -> bool {
        self.with_snapshot(false, |s| s.has_collateral_asset_by_name(name))
    }

    pub fn get_collateral_asset_by_name(&self, name: &str) -> Option<CollateralAsset> {
        self.with_snapshot(None, |s| s.collateral_asset_by_name(name).cloned())
    }

    // ---- asset configs ----

    pub fn has_asset_config_by_name(&self, name: &str) -> bool {
        self.with_snapshot(false, |s| s.has_asset_config_by_name(name))
    }

    pub fn get_asset_config_by_name(&self, name: &str) -> Option<AssetConfig> {
        self.with_snapshot(None, |s| s.asset_config_by_name(name).cloned())
    }

    pub fn has_asset_config_by_index(&self, index: i64) -> bool {
        self.with_snapshot(false, |s| s.has_asset_config_by_index(index))
    }

    pub fn get_asset_config_by_index(&self, index: i64) -> Option<AssetConfig> {
        self.with_snapshot(None, |s| s.asset_config_by_index(index).cloned())
    }

    pub fn get_asset_configs_by_provider(&self, provider: &str) -> Vec<AssetConfig> {
        self.with_snapshot(Vec::new(), |s| {
            s.asset_configs_by_provider(provider).into_iter().cloned().collect()
        })
    }

    pub fn is_lazer(&self, asset_name: &str) -> bool {
        self.with_snapshot(false, |s| s.is_lazer(asset_name))
    }

    /// VPI parameters in effect at `ts`: the entry with the greatest recorded
    /// timestamp not after `ts`.
    pub fn get_vpi_params_at_timestamp(
        &self,
        asset_name: &str,
        ts: i64,
    ) -> Option<VpiParamsParsed> {
        self.with_snapshot(None, |s| s.vpi_params_at(asset_name, ts).cloned())
    }
}

impl<T: Transport> Drop for ConfigDiscovery<T> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
