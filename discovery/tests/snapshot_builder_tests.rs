
use std::collections::HashSet;

use num_bigint::BigInt;
use proptest::prelude::*;

use config_discovery::types::{AppConfig, Asset, AssetConfig, AssetsSchedule, Market, OracleConfig};
use config_discovery::{FAST_PRICE_PROVIDERS, RawConfig, Snapshot};
use mock_transport::*;

fn fixture_raw() -> RawConfig {
    RawConfig {
        config: serde_json::from_str(CONFIG_JSON).unwrap(),
        assets: serde_json::from_str(ASSETS_JSON).unwrap(),
        asset_configs: serde_json::from_str(ASSET_CONFIGS_JSON).unwrap(),
        schedules: serde_json::from_str(SCHEDULES_JSON).unwrap(),
        vpi_history: serde_json::from_str(VPI_HISTORY_JSON).unwrap(),
    }
}

fn fixture_snapshot() -> Snapshot {
    Snapshot::build(fixture_raw()).unwrap()
}

#[test]
fn asset_lookup_by_name_matches_fixture() {
    let snap = fixture_snapshot();

    let ltc = snap.asset_by_name("LTC").unwrap();
    assert_eq!(ltc.name, "LTC");
    assert_eq!(ltc.index, 11);

    for asset in snap.assets() {
        let found = snap.asset_by_name(&asset.name).unwrap();
        assert_eq!(found.name, asset.name);
        assert_eq!(found.index, asset.index);
        assert_eq!(snap.asset_by_index(asset.index), Some(found));
    }

    assert!(!snap.has_asset_by_name("DOGE"));
    assert!(snap.asset_by_index(-1).is_none());
}

#[test]
fn markets_by_asset_name_are_exactly_the_matching_markets() {
    let snap = fixture_snapshot();

    for base in ["LTC", "BTC", "XYZ", "ETH"] {
        let expected: Vec<&Market> = snap
            .config()
            .opened_markets
            .iter()
            .filter(|m| m.base_asset == base)
            .collect();

        assert_eq!(snap.markets_by_asset_name(base), expected, "base asset {base}");
    }

    let ltc: Vec<_> = snap
        .markets_by_asset_name("LTC")
        .iter()
        .map(|m| m.address.as_str())
        .collect();
    assert_eq!(ltc, ["EQ-market-ltc-usdt", "EQ-market-ltc-not"]);
}

#[test]
fn prelaunch_markets_are_a_subset_of_all_markets() {
    let snap = fixture_snapshot();

    for m in &snap.config().opened_markets {
        assert!(snap.has_market_by_address(&m.address));
        assert_eq!(snap.has_prelaunch_market_by_address(&m.address), m.is_prelaunch());

        for by_base in snap.markets_by_asset_name(&m.base_asset) {
            if by_base.is_prelaunch() {
                assert!(snap.has_prelaunch_market_by_address(&by_base.address));
            }
        }
    }

    assert_eq!(
        snap.prelaunch_market_by_address("EQ-market-xyz-usdt").unwrap().base_asset,
        "XYZ"
    );
    assert!(snap.prelaunch_market_by_address("EQ-market-btc-usdt").is_none());
}

#[test]
fn market_addresses_list_every_market_once() {
    let snap = fixture_snapshot();

    assert_eq!(
        snap.market_addresses(),
        [
            "EQ-market-ltc-usdt",
            "EQ-market-ltc-not",
            "EQ-market-btc-usdt",
            "EQ-market-xyz-usdt"
        ]
    );
    // base asset symbols never leak into the address index
    assert!(!snap.has_market_by_address("LTC"));
}

#[test]
fn vaults_and_collateral_assets_are_indexed() {
    let snap = fixture_snapshot();

    let usdt = snap.vault_by_collateral_asset_name("USDT").unwrap();
    assert_eq!(usdt.vault_address, "EQ-vault-usdt");
    assert_eq!(snap.vault_by_address("EQ-vault-usdt"), Some(usdt));
    assert_eq!(snap.vault_by_lp_jetton_master_address("EQ-lp-usdt"), Some(usdt));
    assert_eq!(snap.vault_by_collateral_asset_id(&usdt.asset.asset_id), Some(usdt));

    assert!(snap.has_vault_by_lp_jetton_master_address("EQ-lp-not"));
    assert!(!snap.has_vault_by_address("EQ-lp-not"));

    assert_eq!(snap.collateral_asset_by_name("NOT").unwrap().decimals, 9);
    assert!(!snap.has_collateral_asset_by_name("LTC"));
    assert_eq!(snap.duplicate_keys(), 0);
}

#[test]
fn is_lazer_iff_an_oracle_is_a_fast_price_provider() {
    let snap = fixture_snapshot();

    for cfg in snap.asset_configs() {
        let expected = cfg
            .oracles
            .iter()
            .any(|o| FAST_PRICE_PROVIDERS.contains(&o.provider.as_str()));
        assert_eq!(snap.is_lazer(&cfg.name), expected, "asset {}", cfg.name);
    }

    assert!(snap.is_lazer("BTC"));
    assert!(snap.is_lazer("ETH"));
    assert!(snap.is_lazer("XYZ"));
    assert!(!snap.is_lazer("LTC"));
    assert!(!snap.is_lazer("UNKNOWN"));
}

#[test]
fn asset_configs_by_provider_lists_each_config_per_oracle() {
    let snap = fixture_snapshot();

    let pyth: Vec<_> = snap
        .asset_configs_by_provider("pyth")
        .iter()
        .map(|c| c.name.as_str())
        .collect();
    assert_eq!(pyth, ["BTC", "XAU", "LTC"]);

    assert_eq!(snap.asset_configs_by_provider("stork").len(), 1);
    assert_eq!(snap.asset_config_by_index(11).unwrap().name, "LTC");
    assert_eq!(snap.asset_config_by_name("XAU").unwrap().index, 7);
}

#[test]
fn schedules_are_kept_by_asset_name() {
    let snap = fixture_snapshot();

    let xau = snap.schedule("XAU").unwrap();
    assert_eq!(xau.schedule_time_zone.as_deref(), Some("America/New_York"));
    assert!(snap.schedule("LTC").unwrap().schedule_time_zone.is_none());
    assert_eq!(snap.schedules().len(), 2);
}

#[test]
fn vpi_history_skips_entries_without_depth() {
    let snap = fixture_snapshot();

    assert_eq!(
        snap.vpi_history().timestamps("LTC"),
        vec![1_717_236_000, 1_717_243_200]
    );
    assert!(snap.vpi_history().timestamps("XAU").is_empty());
    assert!(snap.vpi_history().timestamps("ETH").is_empty());
}

#[test]
fn vpi_lookup_returns_latest_entry_not_after_ts() {
    let snap = fixture_snapshot();

    assert!(snap.vpi_params_at("LTC", 1_717_235_999).is_none());

    let first = snap.vpi_params_at("LTC", 1_717_236_000).unwrap();
    assert_eq!(first.spread, BigInt::from(300_000));

    // the empty-depth point at 1717239600 is invisible
    let still_first = snap.vpi_params_at("LTC", 1_717_240_000).unwrap();
    assert_eq!(still_first, first);

    let latest = snap.vpi_params_at("LTC", i64::MAX).unwrap();
    assert_eq!(latest.market_depth_long, BigInt::from(20_000_000_000_000u64));
    assert_eq!(latest.market_depth_short, BigInt::from(18_000_000_000_000u64));

    assert!(snap.vpi_params_at("XAU", i64::MAX).is_none());
    assert!(snap.vpi_params_at("DOGE", i64::MAX).is_none());
}

#[test]
fn malformed_vpi_number_aborts_the_build() {
    let mut raw = fixture_raw();
    raw.vpi_history
        .get_mut("BTC")
        .unwrap()
        .get_mut("1717236000")
        .unwrap()
        .k = "2e3".into();

    let err = Snapshot::build(raw).unwrap_err();
    assert!(err.is_parse());
    assert!(err.to_string().contains("BTC"));
}

#[test]
fn null_collections_decode_as_empty() {
    let market: Market = serde_json::from_str(
        r#"{ "name": "BTC/USDT", "address": "EQ-btc", "baseAsset": "BTC", "tags": null }"#,
    )
    .unwrap();
    assert!(market.tags.is_empty());

    let config: AppConfig = serde_json::from_str(
        r#"{ "composedAt": "t", "assets": null, "openedMarkets": null, "liquiditySources": null }"#,
    )
    .unwrap();
    assert!(config.opened_markets.is_empty());
    assert!(config.collateral_assets.is_empty());
    assert!(config.vaults.is_empty());

    let cfg: AssetConfig =
        serde_json::from_str(r#"{ "index": 3, "name": "XAU", "oracles": null, "vpi": null }"#)
            .unwrap();
    assert!(cfg.oracles.is_empty());
    assert!(!cfg.vpi.has_depth());

    let schedules: AssetsSchedule = serde_json::from_str(r#"{ "schedules": null }"#).unwrap();
    assert!(schedules.schedules.is_empty());

    let snap = Snapshot::build(RawConfig {
        config,
        asset_configs: vec![cfg],
        schedules,
        ..Default::default()
    })
    .unwrap();
    assert!(snap.market_addresses().is_empty());
    assert!(!snap.is_lazer("XAU"));
}

#[test]
fn missing_scalar_fields_decode_as_zero_values() {
    let market: Market = serde_json::from_str(r#"{ "name": "BTC/USDT" }"#).unwrap();
    assert_eq!(market.address, "");
    assert_eq!(market.base_asset, "");
    assert!(!market.is_prelaunch());

    let config: AppConfig = serde_json::from_str(
        r#"{ "composedAt": "t", "liquiditySources": [ { "vaultAddress": "EQ-v" } ] }"#,
    )
    .unwrap();
    let vault = &config.vaults[0];
    assert_eq!(vault.lp_jetton_master, "");
    assert_eq!(vault.asset.decimals, 0);
    assert_eq!(vault.asset.asset_id, "");

    let assets: Vec<Asset> = serde_json::from_str(r#"[ { "name": "LTC" } ]"#).unwrap();
    assert_eq!(assets[0].index, 0);
}

#[test]
fn prelaunch_lookup_follows_the_market_that_won_the_address() {
    let mut raw = fixture_raw();
    let base = Market {
        name: "DUP/USDT".into(),
        address: "EQ-dup".into(),
        base_asset: "DUP".into(),
        ..Default::default()
    };
    raw.config.opened_markets.push(Market {
        market_type: "prelaunch".into(),
        ..base.clone()
    });
    raw.config.opened_markets.push(Market {
        market_type: "crypto".into(),
        ..base.clone()
    });
    raw.config.opened_markets.push(Market {
        address: "EQ-dup-2".into(),
        market_type: "crypto".into(),
        ..base.clone()
    });
    raw.config.opened_markets.push(Market {
        address: "EQ-dup-2".into(),
        market_type: "prelaunch".into(),
        ..base
    });

    let snap = Snapshot::build(raw).unwrap();

    assert_eq!(snap.market_by_address("EQ-dup").unwrap().market_type, "crypto");
    assert!(!snap.has_prelaunch_market_by_address("EQ-dup"));
    assert!(snap.prelaunch_market_by_address("EQ-dup").is_none());

    let winner = snap.market_by_address("EQ-dup-2").unwrap();
    assert!(winner.is_prelaunch());
    assert_eq!(snap.prelaunch_market_by_address("EQ-dup-2"), Some(winner));
    assert_eq!(snap.duplicate_keys(), 2);
}

#[test]
fn building_twice_from_the_same_input_is_deterministic() {
    let a = Snapshot::build(fixture_raw()).unwrap();
    let b = Snapshot::build(fixture_raw()).unwrap();

    assert_eq!(a, b);
    assert_eq!(a.market_addresses(), b.market_addresses());
}

fn arb_market() -> impl Strategy<Value = Market> {
    (
        "EQ-[a-d]{1,2}",
        prop::sample::select(vec!["BTC", "ETH", "LTC"]),
        prop::bool::weighted(0.3),
    )
        .prop_map(|(address, base, prelaunch)| Market {
            name: format!("{base}/USDT"),
            address,
            base_asset: base.to_string(),
            market_type: if prelaunch { "prelaunch" } else { "crypto" }.to_string(),
            ..Default::default()
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]
    #[test]
    fn generated_markets_index_consistently(
        markets in prop::collection::vec(arb_market(), 0..30),
        providers in prop::collection::vec(
            prop::sample::select(vec!["pyth", "pyth-lazer", "stork", "stork-fast", "fake"]),
            0..4,
        ),
    ) {
        let mut raw = fixture_raw();
        raw.config = AppConfig {
            composed_at: "gen".into(),
            opened_markets: markets.clone(),
            ..Default::default()
        };
        raw.asset_configs[0].oracles = providers
            .iter()
            .map(|p| OracleConfig { provider: p.to_string() })
            .collect();

        let a = Snapshot::build(raw.clone()).unwrap();
        let b = Snapshot::build(raw).unwrap();
        prop_assert_eq!(&a, &b);

        // every address is listed once and resolves to the last market with it
        let distinct: HashSet<_> = markets.iter().map(|m| m.address.as_str()).collect();
        prop_assert_eq!(a.market_addresses().len(), distinct.len());
        for address in a.market_addresses() {
            let last = markets.iter().rev().find(|m| &m.address == address).unwrap();
            prop_assert_eq!(a.market_by_address(address), Some(last));
        }

        for address in a.market_addresses() {
            let winner = a.market_by_address(address).filter(|m| m.is_prelaunch());
            prop_assert_eq!(a.prelaunch_market_by_address(address), winner);
        }

        for base in ["BTC", "ETH", "LTC"] {
            let expected: Vec<&Market> =
                markets.iter().filter(|m| m.base_asset == base).collect();
            prop_assert_eq!(a.markets_by_asset_name(base), expected);
        }

        let lazer = providers.iter().any(|p| FAST_PRICE_PROVIDERS.contains(p));
        prop_assert_eq!(a.is_lazer("BTC"), lazer);
    }
}
