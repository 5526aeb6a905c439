use std::sync::OnceLock;

use tracing_subscriber::EnvFilter;

/// Installs the process-wide `fmt` subscriber once.
///
/// `RUST_LOG` overrides the default filter. If the host already installed a
/// global subscriber, that one is kept.
pub fn init_tracing() {
    static INIT: OnceLock<()> = OnceLock::new();
    INIT.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            if cfg!(debug_assertions) {
                EnvFilter::new("info,modman_core=debug")
            } else {
                EnvFilter::new("info")
            }
        });
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_thread_names(true)
            .with_thread_ids(true)
            .try_init();
    });
}
