use std::{ops::RangeInclusive, path::PathBuf, str::FromStr};

use anyhow::Context;

/// One hour up to a year.
const LIFETIME_HOURS_RANGE: RangeInclusive<i64> = 1..=8760;

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub lifetime_hours: i64,
    pub secure_cookie: bool,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub static_dir: PathBuf,
    pub request_timeout_secs: u64,
    pub session: SessionConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
        let session = SessionConfig {
            lifetime_hours: session_lifetime_hours()?,
            secure_cookie: env_or("SESSION_SECURE_COOKIE", false)?,
        };
        Ok(Self {
            database_url,
            host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env_or("APP_PORT", 4000)?,
            static_dir: std::env::var("STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./ui/static")),
            request_timeout_secs: env_or("REQUEST_TIMEOUT_SECS", 10)?,
            session,
        })
    }
}

fn session_lifetime_hours() -> anyhow::Result<i64> {
    let hours = env_or("SESSION_LIFETIME_HOURS", 12)?;
    anyhow::ensure!(
        LIFETIME_HOURS_RANGE.contains(&hours),
        "SESSION_LIFETIME_HOURS={hours} is outside {}..={}",
        LIFETIME_HOURS_RANGE.start(),
        LIFETIME_HOURS_RANGE.end()
    );
    Ok(hours)
}

fn env_or<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("invalid {key}={raw:?}: {e}")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_lifetime_must_be_between_an_hour_and_a_year() {
        let key = "SESSION_LIFETIME_HOURS";
        std::env::remove_var(key);
        assert_eq!(session_lifetime_hours().unwrap(), 12);

        for bad in ["0", "-3", "8761"] {
            std::env::set_var(key, bad);
            let err = session_lifetime_hours().unwrap_err();
            assert!(err.to_string().contains(key), "{bad}");
        }
        for good in ["1", "8760"] {
            std::env::set_var(key, good);
            assert_eq!(session_lifetime_hours().unwrap().to_string(), good);
        }
        std::env::remove_var(key);
    }

    #[test]
    fn env_or_falls_back_and_rejects_garbage() {
        let key = "SNIPPETBOX_TEST_ENV_OR_PORT";
        std::env::remove_var(key);
        assert_eq!(env_or::<u16>(key, 4000).unwrap(), 4000);

        std::env::set_var(key, "not-a-port");
        let err = env_or::<u16>(key, 4000).unwrap_err();
        assert!(err.to_string().contains(key));

        std::env::set_var(key, "8081");
        assert_eq!(env_or::<u16>(key, 4000).unwrap(), 8081);
        std::env::remove_var(key);
    }
}
