pub mod commands;
pub mod core;

use tracing_subscriber::EnvFilter;

/// Structured logging for the launcher. `RUST_LOG` overrides the default filter.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,interface_mods_lib=debug")),
        )
        .with_writer(std::io::stderr)
        .init();
}
