//! Immutable, fully indexed generation of the discovery document.
//!
//! A [`Snapshot`] owns every entity it was built from. Index maps store
//! positions into the snapshot's own collections, so an index can never point
//! at another generation's data. Snapshots are never mutated after
//! [`Snapshot::build`] returns; a refresh builds a new one and swaps it in.

pub mod vpi;

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};

use tracing::{debug, warn};

use crate::error::DiscoveryError;
use crate::types::{
    AppConfig, Asset, AssetConfig, AssetSchedule, AssetsSchedule, CollateralAsset, Market,
    VpiHistoryRaw, VpiParamsParsed, Vault,
};

pub use vpi::VpiHistory;

/// Oracle providers that mark an asset as fast-price ("lazer").
pub const FAST_PRICE_PROVIDERS: [&str; 3] = ["pyth-lazer", "stork-fast", "fake"];

/// The five collections fetched in one refresh cycle.
#[derive(Clone, Debug, Default)]
pub struct RawConfig {
    pub config: AppConfig,
    pub assets: Vec<Asset>,
    pub asset_configs: Vec<AssetConfig>,
    pub schedules: AssetsSchedule,
    pub vpi_history: VpiHistoryRaw,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct Indexes {
    vaults_by_address: HashMap<String, usize>,
    vaults_by_collateral_name: HashMap<String, usize>,
    vaults_by_collateral_id: HashMap<String, usize>,
    vaults_by_lp_jetton_master: HashMap<String, usize>,

    markets_by_address: HashMap<String, usize>,
    market_addresses: Vec<String>,
    prelaunch_markets_by_address: HashMap<String, usize>,
    markets_by_base_asset: HashMap<String, Vec<usize>>,

    collateral_assets_by_name: HashMap<String, usize>,

    assets_by_name: HashMap<String, usize>,
    assets_by_index: HashMap<i64, usize>,

    asset_configs_by_name: HashMap<String, usize>,
    asset_configs_by_index: HashMap<i64, usize>,
    asset_configs_by_provider: HashMap<String, Vec<usize>>,

    fast_price_assets: HashSet<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Snapshot {
    config: AppConfig,
    assets: Vec<Asset>,
    asset_configs: Vec<AssetConfig>,
    schedules: HashMap<String, AssetSchedule>,
    vpi_history: VpiHistory,
    idx: Indexes,
    duplicate_keys: usize,
}

/// Tracks keys that were overwritten while building last-write-wins indexes.
#[derive(Default)]
struct Duplicates(usize);

impl Duplicates {
    fn insert<K>(&mut self, index: &'static str, map: &mut HashMap<K, usize>, key: K, pos: usize)
    where
        K: std::hash::Hash + Eq + std::fmt::Debug,
    {
        match map.entry(key) {
            Entry::Occupied(mut e) => {
                warn!(
                    index,
                    key = ?e.key(),
                    previous = *e.get(),
                    replacement = pos,
                    "duplicate key in discovery document; later entry wins"
                );
                e.insert(pos);
                self.0 += 1;
            }
            Entry::Vacant(e) => {
                e.insert(pos);
            }
        }
    }
}

impl Snapshot {
    /// Builds all indexes over `raw`. Fails only if the VPI history does not
    /// parse; duplicate keys are reported and resolved last-write-wins.
    pub fn build(raw: RawConfig) -> Result<Self, DiscoveryError> {
        let RawConfig {
            config,
            assets,
            asset_configs,
            schedules,
            vpi_history,
        } = raw;

        let vpi_history = VpiHistory::parse(&vpi_history)?;

        let mut idx = Indexes::default();
        let mut dup = Duplicates::default();

        for (pos, v) in config.vaults.iter().enumerate() {
            dup.insert(
                "vault_address",
                &mut idx.vaults_by_address,
                v.vault_address.clone(),
                pos,
            );
            dup.insert(
                "vault_collateral_name",
                &mut idx.vaults_by_collateral_name,
                v.asset.name.clone(),
                pos,
            );
            dup.insert(
                "vault_collateral_id",
                &mut idx.vaults_by_collateral_id,
                v.asset.asset_id.clone(),
                pos,
            );
            dup.insert(
                "vault_lp_jetton_master",
                &mut idx.vaults_by_lp_jetton_master,
                v.lp_jetton_master.clone(),
                pos,
            );
        }

        for (pos, m) in config.opened_markets.iter().enumerate() {
            if !idx.markets_by_address.contains_key(&m.address) {
                idx.market_addresses.push(m.address.clone());
            }
            dup.insert(
                "market_address",
                &mut idx.markets_by_address,
                m.address.clone(),
                pos,
            );

            // follows the market that won the address, overwrite already counted above
            if m.is_prelaunch() {
                idx.prelaunch_markets_by_address.insert(m.address.clone(), pos);
            } else {
                idx.prelaunch_markets_by_address.remove(&m.address);
            }

            idx.markets_by_base_asset
                .entry(m.base_asset.clone())
                .or_default()
                .push(pos);
        }

        for (pos, a) in config.collateral_assets.iter().enumerate() {
            dup.insert(
                "collateral_asset_name",
                &mut idx.collateral_assets_by_name,
                a.name.clone(),
                pos,
            );
        }

        for (pos, a) in assets.iter().enumerate() {
            dup.insert("asset_name", &mut idx.assets_by_name, a.name.clone(), pos);
            dup.insert("asset_index", &mut idx.assets_by_index, a.index, pos);
        }

        for (pos, c) in asset_configs.iter().enumerate() {
            dup.insert(
                "asset_config_name",
                &mut idx.asset_configs_by_name,
                c.name.clone(),
                pos,
            );
            dup.insert("asset_config_index", &mut idx.asset_configs_by_index, c.index, pos);

            for oracle in &c.oracles {
                idx.asset_configs_by_provider
                    .entry(oracle.provider.clone())
                    .or_default()
                    .push(pos);

                if FAST_PRICE_PROVIDERS.contains(&oracle.provider.as_str()) {
                    idx.fast_price_assets.insert(c.name.clone());
                }
            }
        }

        debug!(
            composed_at = %config.composed_at,
            markets = config.opened_markets.len(),
            vaults = config.vaults.len(),
            assets = assets.len(),
            asset_configs = asset_configs.len(),
            duplicate_keys = dup.0,
            "snapshot built"
        );

        Ok(Self {
            config,
            assets,
            asset_configs,
            schedules: schedules.schedules,
            vpi_history,
            idx,
            duplicate_keys: dup.0,
        })
    }

    pub fn composed_at(&self) -> &str {
        &self.config.composed_at
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn assets(&self) -> &[Asset] {
        &self.assets
    }

    pub fn asset_configs(&self) -> &[AssetConfig] {
        &self.asset_configs
    }

    pub fn schedules(&self) -> &HashMap<String, AssetSchedule> {
        &self.schedules
    }

    pub fn schedule(&self, asset_name: &str) -> Option<&AssetSchedule> {
        self.schedules.get(asset_name)
    }

    pub fn vpi_history(&self) -> &VpiHistory {
        &self.vpi_history
    }

    /// Number of keys overwritten by a later entry while indexing.
    pub fn duplicate_keys(&self) -> usize {
        self.duplicate_keys
    }

    // ---- markets ----

    pub fn market_by_address(&self, address: &str) -> Option<&Market> {
        self.idx
            .markets_by_address
            .get(address)
            .map(|&pos| &self.config.opened_markets[pos])
    }

    pub fn has_market_by_address(&self, address: &str) -> bool {
        self.idx.markets_by_address.contains_key(address)
    }

    pub fn prelaunch_market_by_address(&self, address: &str) -> Option<&Market> {
        self.idx
            .prelaunch_markets_by_address
            .get(address)
            .map(|&pos| &self.config.opened_markets[pos])
    }

    pub fn has_prelaunch_market_by_address(&self, address: &str) -> bool {
        self.idx.prelaunch_markets_by_address.contains_key(address)
    }

    /// Every distinct market address, in document order.
    pub fn market_addresses(&self) -> &[String] {
        &self.idx.market_addresses
    }

    /// All markets whose base asset is `name`, in document order.
    pub fn markets_by_asset_name(&self, name: &str) -> Vec<&Market> {
        self.idx
            .markets_by_base_asset
            .get(name)
            .map(|positions| {
                positions
                    .iter()
                    .map(|&pos| &self.config.opened_markets[pos])
                    .collect()
            })
            .unwrap_or_default()
    }

    // ---- vaults ----

    pub fn vault_by_address(&self, address: &str) -> Option<&Vault> {
        self.vault_at(self.idx.vaults_by_address.get(address))
    }

    pub fn has_vault_by_address(&self, address: &str) -> bool {
        self.idx.vaults_by_address.contains_key(address)
    }

    pub fn vault_by_collateral_asset_name(&self, name: &str) -> Option<&Vault> {
        self.vault_at(self.idx.vaults_by_collateral_name.get(name))
    }

    pub fn has_vault_by_collateral_asset_name(&self, name: &str) -> bool {
        self.idx.vaults_by_collateral_name.contains_key(name)
    }

    pub fn vault_by_collateral_asset_id(&self, asset_id: &str) -> Option<&Vault> {
        self.vault_at(self.idx.vaults_by_collateral_id.get(asset_id))
    }

    pub fn has_vault_by_collateral_asset_id(&self, asset_id: &str) -> bool {
        self.idx.vaults_by_collateral_id.contains_key(asset_id)
    }

    pub fn vault_by_lp_jetton_master_address(&self, address: &str) -> Option<&Vault> {
        self.vault_at(self.idx.vaults_by_lp_jetton_master.get(address))
    }

    pub fn has_vault_by_lp_jetton_master_address(&self, address: &str) -> bool {
        self.idx.vaults_by_lp_jetton_master.contains_key(address)
    }

    fn vault_at(&self, pos: Option<&usize>) -> Option<&Vault> {
        pos.map(|&pos| &self.config.vaults[pos])
    }

    // ---- collateral assets ----

    pub fn collateral_asset_by_name(&self, name: &str) -> Option<&CollateralAsset> {
        self.idx
            .collateral_assets_by_name
            .get(name)
            .map(|&pos| &self.config.collateral_assets[pos])
    }

    pub fn has_collateral_asset_by_name(&self, name: &str) -> bool {
        self.idx.collateral_assets_by_name.contains_key(name)
    }

    // ---- assets ----

    pub fn asset_by_name(&self, name: &str) -> Option<&Asset> {
        self.idx.assets_by_name.get(name).map(|&pos| &self.assets[pos])
    }

    pub fn has_asset_by_name(&self, name: &str) -> bool {
        self.idx.assets_by_name.contains_key(name)
    }

    pub fn asset_by_index(&self, index: i64) -> Option<&Asset> {
        self.idx.assets_by_index.get(&index).map(|&pos| &self.assets[pos])
    }

    pub fn has_asset_by_index(&self, index: i64) -> bool {
        self.idx.assets_by_index.contains_key(&index)
    }

    // ---- asset configs ----

    pub fn asset_config_by_name(&self, name: &str) -> Option<&AssetConfig> {
        self.idx
            .asset_configs_by_name
            .get(name)
            .map(|&pos| &self.asset_configs[pos])
    }

    pub fn has_asset_config_by_name(&self, name: &str) -> bool {
        self.idx.asset_configs_by_name.contains_key(name)
    }

    pub fn asset_config_by_index(&self, index: i64) -> Option<&AssetConfig> {
        self.idx
            .asset_configs_by_index
            .get(&index)
            .map(|&pos| &self.asset_configs[pos])
    }

    pub fn has_asset_config_by_index(&self, index: i64) -> bool {
        self.idx.asset_configs_by_index.contains_key(&index)
    }

    /// Asset configs with at least one oracle from `provider`.
    pub fn asset_configs_by_provider(&self, provider: &str) -> Vec<&AssetConfig> {
        self.idx
            .asset_configs_by_provider
            .get(provider)
            .map(|positions| {
                positions
                    .iter()
                    .map(|&pos| &self.asset_configs[pos])
                    .collect()
            })
            .unwrap_or_default()
    }

    /// True if the asset has an oracle from [`FAST_PRICE_PROVIDERS`].
    pub fn is_lazer(&self, asset_name: &str) -> bool {
        self.idx.fast_price_assets.contains(asset_name)
    }

    pub fn vpi_params_at(&self, asset_name: &str, ts: i64) -> Option<&VpiParamsParsed> {
        self.vpi_history.at(asset_name, ts)
    }
}
