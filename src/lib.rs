pub mod config;
pub mod export;
pub mod extract;
pub mod fixture;
pub mod http_client;
pub mod locate;
pub mod normalize;
pub mod page_cache;
pub mod pipeline;
pub mod schema;
pub mod season;
pub mod source;
pub mod sql_export;
pub mod ts_export;

/// Load `.env.local` / `.env` and install the stderr log subscriber.
/// `RUST_LOG` overrides the default `info` level.
pub fn init_runtime() {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .try_init();
}
