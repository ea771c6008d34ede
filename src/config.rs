use std::env;
use std::path::PathBuf;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_ADMIN_PASSWORD: &str = "admin123";
pub const DEFAULT_BOOKINGS_CSV: &str = "data/bookings.csv";
pub const DEFAULT_CALENDAR_DAYS: u32 = 14;

/// Runtime settings, read from the environment
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub admin_password: String,
    pub bookings_csv: PathBuf,
    pub calendar_days: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            admin_password: DEFAULT_ADMIN_PASSWORD.to_string(),
            bookings_csv: PathBuf::from(DEFAULT_BOOKINGS_CSV),
            calendar_days: DEFAULT_CALENDAR_DAYS,
        }
    }
}

impl Config {
    /// `PORT`, `ADMIN_PASSWORD`, `BOOKINGS_CSV` and `CALENDAR_DAYS`; unset or
    /// unparseable values fall back to the defaults
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            port: lookup("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            admin_password: lookup("ADMIN_PASSWORD")
                .filter(|p| !p.is_empty())
                .unwrap_or(defaults.admin_password),
            bookings_csv: lookup("BOOKINGS_CSV")
                .map(PathBuf::from)
                .unwrap_or(defaults.bookings_csv),
            calendar_days: lookup("CALENDAR_DAYS")
                .and_then(|d| d.parse().ok())
                .filter(|d| *d > 0)
                .unwrap_or(defaults.calendar_days),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn falls_back_to_defaults() {
        let config = Config::from_lookup(|_| None);
        assert_eq!(config.port, 8080);
        assert_eq!(config.admin_password, "admin123");
        assert_eq!(config.calendar_days, 14);
    }

    #[test]
    fn reads_overrides_and_ignores_garbage() {
        let vars: HashMap<&str, &str> = [
            ("PORT", "9090"),
            ("ADMIN_PASSWORD", "s3cret"),
            ("BOOKINGS_CSV", "/tmp/ledger.csv"),
            ("CALENDAR_DAYS", "zero"),
        ]
        .into_iter()
        .collect();

        let config = Config::from_lookup(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.port, 9090);
        assert_eq!(config.admin_password, "s3cret");
        assert_eq!(config.bookings_csv, PathBuf::from("/tmp/ledger.csv"));
        assert_eq!(config.calendar_days, 14);
    }
}
