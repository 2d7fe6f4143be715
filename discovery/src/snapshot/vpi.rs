//! Parsed variable-price-impact history with point-in-time lookup.

use std::collections::{BTreeMap, HashMap};

use num_bigint::BigInt;

use crate::error::{DiscoveryError, InvalidVpiField};
use crate::types::{VpiHistoryRaw, VpiParams, VpiParamsParsed};

impl VpiParams {
    /// A data point without market depth has not been computed yet upstream.
    pub fn has_depth(&self) -> bool {
        !self.market_depth_long.is_empty() && !self.market_depth_short.is_empty()
    }

    /// Decodes all four fields as base-10 integers. `Ok(None)` when the entry
    /// has no market depth yet.
    pub fn parse(&self) -> Result<Option<VpiParamsParsed>, InvalidVpiField> {
        if !self.has_depth() {
            return Ok(None);
        }

        Ok(Some(VpiParamsParsed {
            market_depth_long: parse_int("marketDepthLong", &self.market_depth_long)?,
            market_depth_short: parse_int("marketDepthShort", &self.market_depth_short)?,
            spread: parse_int("spread", &self.spread)?,
            k: parse_int("k", &self.k)?,
        }))
    }
}

fn parse_int(field: &'static str, value: &str) -> Result<BigInt, InvalidVpiField> {
    value.parse::<BigInt>().map_err(|_| InvalidVpiField {
        field,
        value: value.to_string(),
    })
}

/// Per-asset VPI parameters ordered by timestamp.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VpiHistory {
    by_asset: HashMap<String, BTreeMap<i64, VpiParamsParsed>>,
}

impl VpiHistory {
    /// Parses the raw history. Entries without market depth are dropped before
    /// anything else is checked. In the remaining entries any malformed
    /// timestamp or numeric field fails the whole build.
    pub fn parse(raw: &VpiHistoryRaw) -> Result<Self, DiscoveryError> {
        let mut by_asset = HashMap::with_capacity(raw.len());

        for (asset, points) in raw {
            let mut series = BTreeMap::new();

            for (timestamp, params) in points {
                let parsed = params.parse().map_err(|e| DiscoveryError::Parse {
                    asset: asset.clone(),
                    timestamp: timestamp.clone(),
                    field: e.field,
                    value: e.value,
                })?;

                // skipped entries are never validated, timestamp included
                let Some(parsed) = parsed else {
                    continue;
                };

                let ts: i64 = timestamp.parse().map_err(|_| DiscoveryError::Parse {
                    asset: asset.clone(),
                    timestamp: timestamp.clone(),
                    field: "timestamp",
                    value: timestamp.clone(),
                })?;

                series.insert(ts, parsed);
            }

            by_asset.insert(asset.clone(), series);
        }

        Ok(Self { by_asset })
    }

    /// Parameters recorded at the latest timestamp `<= ts`.
    pub fn at(&self, asset: &str, ts: i64) -> Option<&VpiParamsParsed> {
        self.by_asset
            .get(asset)?
            .range(..=ts)
            .next_back()
            .map(|(_, params)| params)
    }

    /// Recorded timestamps for `asset`, ascending.
    pub fn timestamps(&self, asset: &str) -> Vec<i64> {
        self.by_asset
            .get(asset)
            .map(|series| series.keys().copied().collect())
            .unwrap_or_default()
    }

    pub fn series(&self, asset: &str) -> Option<&BTreeMap<i64, VpiParamsParsed>> {
        self.by_asset.get(asset)
    }

    pub fn assets(&self) -> impl Iterator<Item = &str> {
        self.by_asset.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.by_asset.values().all(BTreeMap::is_empty)
    }
}
