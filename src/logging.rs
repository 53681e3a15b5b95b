use std::sync::OnceLock;

use tracing_log::LogTracer;
use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

static INSTALL_GUARD: OnceLock<()> = OnceLock::new();

/// Install the global tracing subscriber with env-based filtering.
/// Idempotent; embedding hosts that bring their own subscriber win.
pub fn init_tracing() {
    INSTALL_GUARD.get_or_init(|| {
        if LogTracer::init().is_err() {
            // log bridge already installed; continue.
        }

        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("logiclab=info"));

        let fmt_layer = fmt::layer()
            .with_target(false)
            .with_ansi(false)
            .compact();

        if tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()
            .is_err()
        {
            // Global subscriber already installed elsewhere; ignore.
        }
    });
}
