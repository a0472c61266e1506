#![forbid(unsafe_code)]

use tracing_subscriber::EnvFilter;

// Keep pool chatter out of the default output.
const QUIET_TARGETS: &[(&str, &str)] = &[("r2d2", "warn")];

fn build_env_filter(level: &str) -> anyhow::Result<EnvFilter> {
    let mut directives = vec![level.to_string()];
    for (target, lvl) in QUIET_TARGETS {
        directives.push(format!("{target}={lvl}"));
    }
    let filter = directives.join(",");
    EnvFilter::try_new(&filter)
        .map_err(|err| anyhow::anyhow!("invalid log filter '{filter}': {err}"))
}

/// Logs go to stderr; stdout carries replies only.
pub(crate) fn init_logging(level: &str) -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(build_env_filter(level)?)
        .with_writer(std::io::stderr)
        .with_target(true)
        .try_init()
        .map_err(|err| anyhow::anyhow!("failed to install logger: {err}"))
}
