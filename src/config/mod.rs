use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::difficulty::{Curriculum, DifficultyPolicy, STANDARD_TIERS};
use crate::error::ConfigError;
use crate::provider::DEFAULT_PROVIDER_URL;
use crate::session::OVERALL_SECONDS;

/// Where quiz questions come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderSource {
    Http { url: String, timeout: Duration },
    Csv { path: PathBuf },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub provider: ProviderSource,
    pub overall_seconds: u32,
    /// Denominator of the accuracy figure on the results screen.
    pub total_marks: u32,
    pub policy: DifficultyPolicy,
}

impl Default for Config {
    fn default() -> Self {
        let policy = DifficultyPolicy::standard();
        Self {
            provider: ProviderSource::Http {
                url: DEFAULT_PROVIDER_URL.to_string(),
                timeout: Duration::from_secs(30),
            },
            overall_seconds: OVERALL_SECONDS,
            total_marks: Curriculum::STANDARD.max_score(&policy),
            policy,
        }
    }
}

impl Config {
    /// Reads `.env` (if present) and the `QUIZ_*` variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Err(e) = dotenvy::dotenv() {
            log::debug!("no .env loaded: {}", e);
        }
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Same as [`from_env`](Self::from_env) but over an arbitrary lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();
        let policy = DifficultyPolicy::new(&STANDARD_TIERS)?;

        let provider = match lookup("QUIZ_QUESTIONS_CSV") {
            Some(path) if !path.trim().is_empty() => ProviderSource::Csv {
                path: PathBuf::from(path),
            },
            _ => ProviderSource::Http {
                url: lookup("QUIZ_PROVIDER_URL").unwrap_or_else(|| DEFAULT_PROVIDER_URL.to_string()),
                timeout: Duration::from_secs(parse_var(&lookup, "QUIZ_PROVIDER_TIMEOUT_SECS", 30)?),
            },
        };

        let overall_seconds = parse_var(&lookup, "QUIZ_OVERALL_SECONDS", defaults.overall_seconds)?;
        if overall_seconds == 0 {
            return Err(ConfigError::InvalidVar {
                name: "QUIZ_OVERALL_SECONDS",
                value: "0".to_string(),
            });
        }
        let total_marks = parse_var(&lookup, "QUIZ_TOTAL_MARKS", defaults.total_marks)?;

        Ok(Self {
            provider,
            overall_seconds,
            total_marks,
            policy,
        })
    }
}

fn parse_var<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(name) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidVar { name, value }),
    }
}
