pub mod args;
pub mod configuration;
pub mod driver;
pub mod extract;
pub mod hdl;
pub mod interrupt;
pub mod report;
pub mod run_main;
pub mod savings;
pub mod settings;
pub mod sweep;
pub mod toolchain;

use tracing::metadata::LevelFilter;

/// `INFO` unless `RUST_LOG` says otherwise; a second call is a no-op
pub fn init_logger() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .try_init()
        .unwrap_or_else(|e| {
            eprintln!("failed to init logger: {}", e);
        });
}
