//! Wire types served by the config discovery service.
//!
//! Field names follow the upstream JSON (camelCase). A field that is missing
//! decodes to its zero value, and a collection or nested object sent as
//! `null` decodes as empty, so a sparse document is still usable.

use std::collections::HashMap;

use num_bigint::BigInt;
use serde::{Deserialize, Deserializer, Serialize};

/// Market `type` value that marks a market as not yet fully live.
pub const PRELAUNCH_MARKET_TYPE: &str = "prelaunch";

/// Decodes `null` as `T::default()`.
fn de_null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Root configuration document.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppConfig {
    /// Opaque freshness token. Only ever compared for equality.
    pub composed_at: String,

    #[serde(rename = "assets", deserialize_with = "de_null_default")]
    pub collateral_assets: Vec<CollateralAsset>,

    #[serde(deserialize_with = "de_null_default")]
    pub opened_markets: Vec<Market>,

    #[serde(rename = "liquiditySources", deserialize_with = "de_null_default")]
    pub vaults: Vec<Vault>,
}

/// Settlement / collateral token.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CollateralAsset {
    pub name: String,
    pub decimals: u32,
    pub asset_id: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Market {
    pub name: String,
    pub ticker: String,
    pub address: String,
    pub vault_address: String,
    pub image_link: String,
    pub quote_asset: String,
    pub quote_asset_id: String,
    pub base_asset: String,
    pub settlement_token: String,
    #[serde(deserialize_with = "de_null_default")]
    pub tags: Vec<String>,
    #[serde(rename = "type")]
    pub market_type: String,
}

impl Market {
    pub fn is_prelaunch(&self) -> bool {
        self.market_type == PRELAUNCH_MARKET_TYPE
    }
}

/// Liquidity source backing one or more markets.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Vault {
    #[serde(deserialize_with = "de_null_default")]
    pub asset: CollateralAsset,
    pub vault_address: String,
    pub quote_asset_id: String,
    pub lp_jetton_master: String,
}

/// Underlying instrument descriptor, served by `/assets`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Asset {
    pub name: String,
    pub index: i64,
    #[serde(rename = "type")]
    pub asset_type: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OracleConfig {
    pub provider: String,
}

/// Operational parameters per asset, served by `/assets-config`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AssetConfig {
    pub index: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub asset_type: String,
    pub description: String,
    #[serde(deserialize_with = "de_null_default")]
    pub vpi: VpiParams,
    pub schedule_time_zone: String,
    pub schedule: String,
    pub holidays: String,
    #[serde(deserialize_with = "de_null_default")]
    pub oracles: Vec<OracleConfig>,
}

/// Variable-price-impact parameters as decimal strings.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VpiParams {
    pub market_depth_long: String,
    pub market_depth_short: String,
    pub spread: String,
    pub k: String,
}

/// VPI parameters decoded into arbitrary precision integers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VpiParamsParsed {
    pub market_depth_long: BigInt,
    pub market_depth_short: BigInt,
    pub spread: BigInt,
    pub k: BigInt,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AssetSchedule {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule_time_zone: Option<String>,
    pub schedule: String,
    pub holidays: String,
}

/// Envelope served by `/assets-schedule`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetsSchedule {
    #[serde(deserialize_with = "de_null_default")]
    pub schedules: HashMap<String, AssetSchedule>,
}

/// `/vpi-history`: asset name -> timestamp string -> params.
pub type VpiHistoryRaw = HashMap<String, HashMap<String, VpiParams>>;
