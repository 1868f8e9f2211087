//! Subscriber setup for the simulator binary and for hosts embedding the
//! engine. Session updates run inside a `session_update` span carrying
//! `session_id` and `operation`, so retries and conflicts can be traced back
//! to the call that caused them.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_DIRECTIVES: &str = "court_rotation=info";
const VERBOSE_DIRECTIVES: &str = "court_rotation=debug,info";

/// `RUST_LOG` wins when set; otherwise the crate logs at info, or debug when
/// `verbose` is on.
pub fn env_filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if verbose {
            VERBOSE_DIRECTIVES
        } else {
            DEFAULT_DIRECTIVES
        })
    })
}

/// Compact single-line output. The enclosing `session_update` span is
/// printed as a prefix, so each retry line names its session.
pub fn init_cli_logger(verbose: bool) {
    tracing_subscriber::registry()
        .with(env_filter(verbose))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(verbose)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        )
        .init();
}

/// One JSON object per event, with the current span's fields under `span`,
/// for log shippers when the engine runs behind a service.
pub fn init_json_logger() {
    tracing_subscriber::registry()
        .with(env_filter(false))
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(true)
                .with_span_list(false)
                .with_target(false),
        )
        .init();
}
