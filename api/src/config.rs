use std::env;
use std::time::Duration;
use ticket_criteria::DEFAULT_LOOKUP_TIMEOUT;

pub const DEFAULT_DATABASE_URL: &str = "sqlite:./helpdesk.db?mode=rwc";
pub const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub database_url: String,
    pub port: u16,
    pub lookup_timeout: Duration,
    /// Overrides the `ticket_source` table when set
    pub ticket_sources: Option<Vec<String>>,
}

impl ApiConfig {
    pub fn from_env() -> Self {
        Self::from_vars(|name| env::var(name).ok())
    }

    /// Unparseable values fall back to their defaults
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Self {
        let database_url =
            var("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());
        let port = var("PORT")
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(DEFAULT_PORT);
        let lookup_timeout = var("LOOKUP_TIMEOUT_MS")
            .and_then(|ms| ms.parse::<u64>().ok())
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_LOOKUP_TIMEOUT);
        let ticket_sources = var("TICKET_SOURCES")
            .map(|list| {
                list.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect::<Vec<_>>()
            })
            .filter(|sources| !sources.is_empty());

        Self {
            database_url,
            port,
            lookup_timeout,
            ticket_sources,
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> ApiConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ApiConfig::from_vars(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let cfg = config(&[]);
        assert_eq!(cfg.database_url, DEFAULT_DATABASE_URL);
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.lookup_timeout, Duration::from_secs(2));
        assert_eq!(cfg.ticket_sources, None);
        assert_eq!(cfg.bind_addr(), "0.0.0.0:8080");
    }

    #[test]
    fn test_overrides() {
        let cfg = config(&[
            ("DATABASE_URL", "sqlite::memory:"),
            ("PORT", "9000"),
            ("LOOKUP_TIMEOUT_MS", "250"),
            ("TICKET_SOURCES", "Web, Chat ,,Phone"),
        ]);
        assert_eq!(cfg.database_url, "sqlite::memory:");
        assert_eq!(cfg.port, 9000);
        assert_eq!(cfg.lookup_timeout, Duration::from_millis(250));
        assert_eq!(
            cfg.ticket_sources,
            Some(vec!["Web".to_string(), "Chat".to_string(), "Phone".to_string()])
        );
    }

    #[test]
    fn test_bad_values_fall_back() {
        let cfg = config(&[
            ("PORT", "eighty"),
            ("LOOKUP_TIMEOUT_MS", "-5"),
            ("TICKET_SOURCES", " , "),
        ]);
        assert_eq!(cfg.port, DEFAULT_PORT);
        assert_eq!(cfg.lookup_timeout, DEFAULT_LOOKUP_TIMEOUT);
        assert_eq!(cfg.ticket_sources, None);
    }
}
