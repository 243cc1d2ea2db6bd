//! Tracing initialisation for the Marshal binary.
//!
//! Call [`init_tracing`] once at program start. Output goes to stderr so
//! GitHub workflow commands written to stdout stay unmixed with log lines.
//!
//! Filter precedence: `MARSHAL_LOG`, then `RUST_LOG`, then the built-in
//! directives. Re-running a job with debug logging (`RUNNER_DEBUG=1`) raises
//! the built-in level to `debug`.

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Filter variable read before `RUST_LOG`.
pub const LOG_ENV: &str = "MARSHAL_LOG";

/// Set by the Actions runner when a job is re-run with debug logging.
pub const RUNNER_DEBUG_ENV: &str = "RUNNER_DEBUG";

/// Crates whose chatter is capped at `warn` by default.
const HTTP_STACK: [&str; 4] = ["hyper", "hyper_util", "reqwest", "rustls"];

/// Built-in directives: `level` for everything, the HTTP stack at `warn`.
pub fn default_directives(level: Level) -> String {
    let mut directives = vec![level.as_str().to_ascii_lowercase()];
    directives.extend(HTTP_STACK.iter().map(|krate| format!("{krate}=warn")));
    directives.join(",")
}

/// Raise `level` to `debug` when the runner asks for debug logs.
pub fn effective_level(level: Level, runner_debug: Option<&str>) -> Level {
    match runner_debug.map(str::trim) {
        Some("1") | Some("true") if level < Level::DEBUG => Level::DEBUG,
        _ => level,
    }
}

fn env_filter(level: Level) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(default_directives(level)))
}

/// Initialise the global tracing subscriber.
///
/// * `json` — emit newline-delimited JSON log lines.
/// * `level` — default verbosity when no filter variable is set.
///
/// Only the first call takes effect.
pub fn init_tracing(json: bool, level: Level) {
    let runner_debug = std::env::var(RUNNER_DEBUG_ENV).ok();
    let env_filter = env_filter(effective_level(level, runner_debug.as_deref()));

    if json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr).json())
            .try_init()
            .ok();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .try_init()
            .ok();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directives_quiet_http_stack() {
        let directives = default_directives(Level::INFO);
        assert!(directives.starts_with("info,"));
        assert!(directives.contains("reqwest=warn"));
        assert!(directives.contains("hyper=warn"));
        assert!(EnvFilter::try_new(&directives).is_ok());
    }

    #[test]
    fn test_runner_debug_raises_level() {
        assert_eq!(effective_level(Level::INFO, Some("1")), Level::DEBUG);
        assert_eq!(effective_level(Level::INFO, Some("0")), Level::INFO);
        assert_eq!(effective_level(Level::INFO, None), Level::INFO);
        assert_eq!(effective_level(Level::TRACE, Some("1")), Level::TRACE);
    }
}
