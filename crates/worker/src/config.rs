use std::time::Duration;

use crate::open_play::TransactionScope;

/// Configuration errors raised while reading the environment.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{var} has invalid value '{value}': {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Log output format for the worker binary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Plain,
    Json,
}

/// Worker configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub database_url: String,
    /// Pool size (default: `10`).
    pub database_max_connections: u32,
    /// Time between scheduler ticks (default: 60 seconds).
    pub evaluation_interval: Duration,
    /// Deadline for one facility pass (default: 30 seconds).
    pub pass_timeout: Duration,
    /// Default: `facility_batch`.
    pub transaction_scope: TransactionScope,
    /// How long shutdown waits for an in-flight tick (default: 10 seconds).
    pub shutdown_timeout: Duration,
    pub log_format: LogFormat,
}

impl WorkerConfig {
    /// Load configuration from the process environment.
    ///
    /// | Env Var                              | Default          |
    /// |--------------------------------------|------------------|
    /// | `DATABASE_URL`                       | required         |
    /// | `DATABASE_MAX_CONNECTIONS`           | `10`             |
    /// | `OPEN_PLAY_EVALUATION_INTERVAL_SECS` | `60`             |
    /// | `OPEN_PLAY_PASS_TIMEOUT_SECS`        | `30`             |
    /// | `OPEN_PLAY_TRANSACTION_SCOPE`        | `facility_batch` |
    /// | `SHUTDOWN_TIMEOUT_SECS`              | `10`             |
    /// | `LOG_FORMAT`                         | `plain`          |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load configuration through `lookup`, which returns the value of a
    /// variable if set.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let database_url = lookup("DATABASE_URL")
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let database_max_connections = parse_positive(&lookup, "DATABASE_MAX_CONNECTIONS", 10)?;
        let evaluation_interval =
            parse_positive(&lookup, "OPEN_PLAY_EVALUATION_INTERVAL_SECS", 60)?;
        let pass_timeout = parse_positive(&lookup, "OPEN_PLAY_PASS_TIMEOUT_SECS", 30)?;
        let shutdown_timeout = parse_positive(&lookup, "SHUTDOWN_TIMEOUT_SECS", 10)?;

        let transaction_scope = match lookup("OPEN_PLAY_TRANSACTION_SCOPE") {
            Some(value) => value.parse::<TransactionScope>().map_err(|reason| ConfigError::Invalid {
                var: "OPEN_PLAY_TRANSACTION_SCOPE",
                value,
                reason,
            })?,
            None => TransactionScope::default(),
        };

        let log_format = match lookup("LOG_FORMAT").as_deref().map(str::trim) {
            None | Some("") | Some("plain") | Some("text") => LogFormat::Plain,
            Some("json") => LogFormat::Json,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    var: "LOG_FORMAT",
                    value: other.to_string(),
                    reason: "expected plain or json".to_string(),
                })
            }
        };

        Ok(Self {
            database_url,
            database_max_connections: database_max_connections as u32,
            evaluation_interval: Duration::from_secs(evaluation_interval),
            pass_timeout: Duration::from_secs(pass_timeout),
            transaction_scope,
            shutdown_timeout: Duration::from_secs(shutdown_timeout),
            log_format,
        })
    }
}

/// Parse a positive integer variable, falling back to `default` when unset.
fn parse_positive(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: u64,
) -> Result<u64, ConfigError> {
    let Some(value) = lookup(var) else {
        return Ok(default);
    };
    match value.trim().parse::<u32>() {
        Ok(0) => Err(ConfigError::Invalid {
            var,
            value,
            reason: "must be greater than zero".to_string(),
        }),
        Ok(n) => Ok(u64::from(n)),
        Err(e) => Err(ConfigError::Invalid {
            var,
            value,
            reason: e.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use assert_matches::assert_matches;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<WorkerConfig, ConfigError> {
        let env: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        WorkerConfig::from_lookup(|var| env.get(var).cloned())
    }

    #[test]
    fn defaults() {
        let config = load(&[("DATABASE_URL", "postgres://localhost/courtside")]).unwrap();
        assert_eq!(config.database_url, "postgres://localhost/courtside");
        assert_eq!(config.database_max_connections, 10);
        assert_eq!(config.evaluation_interval, Duration::from_secs(60));
        assert_eq!(config.pass_timeout, Duration::from_secs(30));
        assert_eq!(config.transaction_scope, TransactionScope::FacilityBatch);
        assert_eq!(config.shutdown_timeout, Duration::from_secs(10));
        assert_eq!(config.log_format, LogFormat::Plain);
    }

    #[test]
    fn overrides() {
        let config = load(&[
            ("DATABASE_URL", "postgres://db/courtside"),
            ("DATABASE_MAX_CONNECTIONS", "4"),
            ("OPEN_PLAY_EVALUATION_INTERVAL_SECS", "15"),
            ("OPEN_PLAY_PASS_TIMEOUT_SECS", "5"),
            ("OPEN_PLAY_TRANSACTION_SCOPE", "per_session"),
            ("SHUTDOWN_TIMEOUT_SECS", "3"),
            ("LOG_FORMAT", "json"),
        ])
        .unwrap();
        assert_eq!(config.database_max_connections, 4);
        assert_eq!(config.evaluation_interval, Duration::from_secs(15));
        assert_eq!(config.pass_timeout, Duration::from_secs(5));
        assert_eq!(config.transaction_scope, TransactionScope::PerSession);
        assert_eq!(config.shutdown_timeout, Duration::from_secs(3));
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn database_url_is_required() {
        assert_matches!(load(&[]), Err(ConfigError::Missing("DATABASE_URL")));
        assert_matches!(
            load(&[("DATABASE_URL", "  ")]),
            Err(ConfigError::Missing("DATABASE_URL"))
        );
    }

    #[test]
    fn rejects_invalid_numbers() {
        assert_matches!(
            load(&[
                ("DATABASE_URL", "postgres://db"),
                ("OPEN_PLAY_EVALUATION_INTERVAL_SECS", "soon"),
            ]),
            Err(ConfigError::Invalid {
                var: "OPEN_PLAY_EVALUATION_INTERVAL_SECS",
                ..
            })
        );
        assert_matches!(
            load(&[("DATABASE_URL", "postgres://db"), ("SHUTDOWN_TIMEOUT_SECS", "0")]),
            Err(ConfigError::Invalid {
                var: "SHUTDOWN_TIMEOUT_SECS",
                ..
            })
        );
    }

    #[test]
    fn rejects_unknown_scope() {
        let err = load(&[
            ("DATABASE_URL", "postgres://db"),
            ("OPEN_PLAY_TRANSACTION_SCOPE", "global"),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("OPEN_PLAY_TRANSACTION_SCOPE"));
        assert!(err.to_string().contains("global"));
    }

    #[test]
    fn rejects_unknown_log_format() {
        assert_matches!(
            load(&[("DATABASE_URL", "postgres://db"), ("LOG_FORMAT", "xml")]),
            Err(ConfigError::Invalid { var: "LOG_FORMAT", .. })
        );
    }
}
