use std::time::Duration;

use clap::Parser;
use config_discovery::DiscoveryConfig;
use config_discovery::config::DEFAULT_URL;

#[derive(Debug, Parser)]
#[clap(name = "config-discovery", version)]
pub struct Cli {
    /// Base URL of the config discovery service
    #[clap(long, env = "CONFIG_DISCOVERY_URL", default_value = DEFAULT_URL)]
    pub url: String,

    /// Base asset whose markets are printed
    #[clap(long, default_value = "LTC")]
    pub asset: String,

    /// Keep running and print every config update
    #[clap(long)]
    pub watch: bool,

    /// Refresh period in milliseconds
    #[clap(long, default_value_t = 5_000)]
    pub refresh_ms: u64,
}

impl Cli {
    pub(crate) fn discovery_config(&self) -> DiscoveryConfig {
        let defaults = DiscoveryConfig::from_env();
        let refresh_interval = Duration::from_millis(self.refresh_ms.max(1));

        DiscoveryConfig {
            url: self.url.clone(),
            refresh_interval,
            fetch_timeout: defaults.fetch_timeout.min(refresh_interval),
            ..defaults
        }
    }
}
