use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

/// Transcript service configuration.
#[derive(Debug, Clone, Parser)]
#[command(name = "ruletrace")]
#[command(about = "Viewer-scoped rule transcript service")]
pub struct Config {
    /// HTTP server listen address
    #[arg(long, default_value = "0.0.0.0:8080", env = "RULETRACE_LISTEN_ADDR")]
    pub listen_addr: String,

    /// Directory holding recorded transcripts (<id>.json, <id>.yaml)
    #[arg(long, default_value = "transcripts", env = "RULETRACE_TRACE_DIR")]
    pub trace_dir: PathBuf,

    /// Path to identity directory file (optional, names fall back to placeholders if not set)
    #[arg(long, env = "RULETRACE_DIRECTORY_PATH")]
    pub directory_path: Option<PathBuf>,

    /// Identity directory reload check interval in seconds
    #[arg(long, default_value = "30", env = "RULETRACE_DIRECTORY_RELOAD_SECS")]
    pub directory_reload_secs: u64,

    /// Latency budget in milliseconds for transcript endpoint
    #[arg(long, default_value = "100", env = "RULETRACE_LATENCY_BUDGET_MS")]
    pub latency_budget_ms: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "RUST_LOG")]
    pub log_level: String,

    /// Emit logs as JSON lines
    #[arg(long, default_value = "false", env = "RULETRACE_LOG_JSON")]
    pub log_json: bool,

    /// Enable graceful shutdown
    #[arg(long, default_value = "true", env = "RULETRACE_GRACEFUL_SHUTDOWN")]
    pub graceful_shutdown: bool,
}

impl Config {
    /// Get directory reload interval as Duration.
    pub fn directory_reload_interval(&self) -> Duration {
        Duration::from_secs(self.directory_reload_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            listen_addr: "0.0.0.0:8080".to_string(),
            trace_dir: PathBuf::from("transcripts"),
            directory_path: None,
            directory_reload_secs: 30,
            latency_budget_ms: 100,
            log_level: "info".to_string(),
            log_json: false,
            graceful_shutdown: true,
        }
    }
}
