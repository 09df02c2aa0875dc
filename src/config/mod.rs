//! Runtime settings, from command-line flags or `POSTBOARD_*` environment
//! variables.
//!
//! | Flag                  | Variable                      | Default          |
//! |-----------------------|-------------------------------|------------------|
//! | `--addr`              | `POSTBOARD_ADDR`              | `127.0.0.1:8000` |
//! | `--result-timeout-ms` | `POSTBOARD_RESULT_TIMEOUT_MS` | `5000`           |
//! | `--workers`           | `POSTBOARD_WORKERS`           | `4`              |
//! | `--result-ttl-secs`   | `POSTBOARD_RESULT_TTL_SECS`   | `300`            |
//! | `--fixture`           | `POSTBOARD_FIXTURE`           | unset            |
//! | `--log-level`         | `POSTBOARD_LOG_LEVEL`         | `info`           |
//! | `--log-format`        | `POSTBOARD_LOG_FORMAT`        | `text`           |

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use clap::builder::RangedU64ValueParser;

use crate::background::DEFAULT_RESULT_TTL;
use crate::logging::{LoggerConfig, LoggerFormat};

pub const DEFAULT_ADDR: &str = "127.0.0.1:8000";
/// How long the home page waits for its background task.
pub const DEFAULT_RESULT_TIMEOUT_MS: u64 = 5000;
pub const DEFAULT_WORKERS: usize = 4;

/// postboard - lists posts and dispatches a background addition per request.
#[derive(Parser, Debug, Clone)]
#[command(name = "postboard", version)]
pub struct Settings {
    /// Address to listen on.
    #[arg(long, default_value = DEFAULT_ADDR, env = "POSTBOARD_ADDR")]
    pub addr: String,

    /// Upper bound on the home page's wait for its task, in milliseconds.
    #[arg(long, default_value_t = DEFAULT_RESULT_TIMEOUT_MS, env = "POSTBOARD_RESULT_TIMEOUT_MS")]
    pub result_timeout_ms: u64,

    /// Task-queue worker count.
    #[arg(
        long,
        default_value_t = DEFAULT_WORKERS,
        env = "POSTBOARD_WORKERS",
        value_parser = RangedU64ValueParser::<usize>::new().range(1..)
    )]
    pub workers: usize,

    /// Seconds a finished task stays queryable before it is forgotten.
    #[arg(long, default_value_t = DEFAULT_RESULT_TTL.as_secs(), env = "POSTBOARD_RESULT_TTL_SECS")]
    pub result_ttl_secs: u64,

    /// JSON file of posts to seed the store with.
    #[arg(long, env = "POSTBOARD_FIXTURE")]
    pub fixture: Option<PathBuf>,

    /// `EnvFilter` directive, e.g. `info` or `postboard=debug,warn`.
    #[arg(long, default_value = "info", env = "POSTBOARD_LOG_LEVEL")]
    pub log_level: String,

    #[arg(long, value_enum, default_value_t = LoggerFormat::Text, env = "POSTBOARD_LOG_FORMAT")]
    pub log_format: LoggerFormat,
}

impl Settings {
    pub fn result_timeout(&self) -> Duration {
        Duration::from_millis(self.result_timeout_ms)
    }

    pub fn result_ttl(&self) -> Duration {
        Duration::from_secs(self.result_ttl_secs)
    }

    pub fn logger(&self) -> LoggerConfig {
        LoggerConfig {
            format: self.log_format,
            level: self.log_level.clone(),
            ..LoggerConfig::default()
        }
    }
}
