use once_cell::sync::OnceCell;
use tracing_subscriber::{EnvFilter, fmt};

static LOGGER_INIT: OnceCell<()> = OnceCell::new();

/// Installs the global fmt subscriber. Safe to call more than once; only the
/// first call has any effect.
pub fn init_logger(service_name: &'static str) {
    LOGGER_INIT.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        let installed = fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_thread_ids(true)
            .with_thread_names(true)
            .with_line_number(true)
            .with_span_events(fmt::format::FmtSpan::CLOSE)
            .try_init()
            .is_ok();

        tracing::info!(service = service_name, installed, "logger initialized");
    });
}
