use std::net::SocketAddr;

use url::Url;

use crate::error::ConfigError;

const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";
const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub teloxide_token: String,
    pub google_api_key: String,
    pub gemini_model: String,
    pub log_level: String,
    pub webhook: Option<Webhook>,
}

#[derive(Debug, Clone)]
pub struct Webhook {
    pub url: Url,
    pub addr: SocketAddr,
}

impl Config {
    /// Reads the process environment. Call `dotenvy::dotenv()` first to pick up `.env`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let required = |var: &'static str| lookup(var).ok_or(ConfigError::Missing(var));

        let url = lookup("NGROK_URL")
            .map(|raw| {
                raw.parse::<Url>().map_err(|e| ConfigError::Invalid {
                    var: "NGROK_URL",
                    reason: e.to_string(),
                })
            })
            .transpose()?;
        let addr = lookup("NGROK_ADDR")
            .map(|raw| {
                raw.parse::<SocketAddr>().map_err(|e| ConfigError::Invalid {
                    var: "NGROK_ADDR",
                    reason: e.to_string(),
                })
            })
            .transpose()?;

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            teloxide_token: required("TELOXIDE_TOKEN")?,
            google_api_key: required("GOOGLE_API_KEY")?,
            gemini_model: lookup("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_GEMINI_MODEL.into()),
            log_level: lookup("LOG_LEVEL").unwrap_or_else(|| DEFAULT_LOG_LEVEL.into()),
            webhook: match (url, addr) {
                (Some(url), Some(addr)) => Some(Webhook { url, addr }),
                _ => None,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var: &str| vars.get(var).cloned()
    }

    const REQUIRED: [(&str, &str); 3] = [
        ("DATABASE_URL", "postgres://localhost/quiz"),
        ("TELOXIDE_TOKEN", "123:abc"),
        ("GOOGLE_API_KEY", "key"),
    ];

    #[test]
    fn defaults_optional_values() {
        let config = Config::from_lookup(lookup(&REQUIRED)).unwrap();
        assert_eq!(config.gemini_model, "gemini-2.5-flash");
        assert_eq!(config.log_level, "info");
        assert!(config.webhook.is_none());
    }

    #[test]
    fn reports_missing_variable() {
        let err = Config::from_lookup(lookup(&REQUIRED[..2])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("GOOGLE_API_KEY")));
    }

    #[test]
    fn webhook_needs_both_parts() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("NGROK_URL", "https://example.ngrok.app"));
        assert!(Config::from_lookup(lookup(&vars)).unwrap().webhook.is_none());

        vars.push(("NGROK_ADDR", "127.0.0.1:8443"));
        let webhook = Config::from_lookup(lookup(&vars)).unwrap().webhook.unwrap();
        assert_eq!(webhook.addr.port(), 8443);
    }

    #[test]
    fn rejects_unparsable_address() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("NGROK_ADDR", "not an address"));
        assert!(matches!(
            Config::from_lookup(lookup(&vars)).unwrap_err(),
            ConfigError::Invalid { var: "NGROK_ADDR", .. }
        ));
    }
}
