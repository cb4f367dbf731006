//! Logging setup; modules log through the `log` macros directly

/// Initialize the logging system
///
/// `RUST_LOG` takes precedence; otherwise `default_filter` (for example the
/// `log_level` from [`EngineConfig`](crate::core::config::EngineConfig)) is used.
/// Calling this more than once is harmless.
pub fn init(default_filter: &str) {
    let env = env_logger::Env::default().default_filter_or(default_filter);
    let _ = env_logger::Builder::from_env(env)
        .format_timestamp_millis()
        .try_init();
}
