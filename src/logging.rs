use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Console logging on stderr so command output on stdout stays machine readable.
///
/// `RUST_LOG` wins when set; otherwise `LOG_LEVEL` (default "info") applies to
/// this crate and HTTP/database internals are held at warn.
pub fn init() {
    let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "{}={},reqwest=warn,hyper=warn,sqlx=warn",
            env!("CARGO_CRATE_NAME"),
            log_level
        ))
    });

    let console_layer = fmt::layer()
        .compact()
        .with_target(true)
        .with_writer(std::io::stderr)
        .with_filter(env_filter);

    tracing_subscriber::registry().with(console_layer).init();
}
