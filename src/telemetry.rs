use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub const DEFAULT_LOG_FILTER: &str = "fashion_digest=info,warn";

/// Install the global subscriber. `RUST_LOG` overrides the default filter,
/// `LOG_FORMAT=json` switches to JSON lines. Safe to call twice.
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    let result = if json {
        registry.with(fmt::layer().json()).try_init()
    } else {
        registry.with(fmt::layer().compact()).try_init()
    };
    if result.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}
