use crate::application::fetch::DEFAULT_PERIOD;
use crate::application::source_registry::SourceRegistry;
use serde::Deserialize;
use std::collections::HashMap;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerSettings,
    pub store: StoreSettings,
    #[serde(default)]
    pub render: RenderDefaults,
    #[serde(default)]
    pub sources: HashMap<String, String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    #[serde(default = "default_listen")]
    pub listen: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            listen: default_listen(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreSettings {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RenderDefaults {
    #[serde(default = "default_period")]
    pub default_period: String,
    #[serde(default)]
    pub default_refresh: u64,
    #[serde(default = "default_tick_count")]
    pub tick_count: usize,
}

impl Default for RenderDefaults {
    fn default() -> Self {
        Self {
            default_period: default_period(),
            default_refresh: 0,
            tick_count: default_tick_count(),
        }
    }
}

fn default_listen() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_period() -> String {
    DEFAULT_PERIOD.to_string()
}

fn default_tick_count() -> usize {
    10
}

impl AppConfig {
    /// Registry of the configured data sources, fixed for the process lifetime
    pub fn source_registry(&self) -> SourceRegistry {
        self.sources
            .iter()
            .map(|(name, url)| (name.clone(), url.clone()))
            .collect()
    }

    pub fn default_refresh(&self) -> Option<u64> {
        Some(self.render.default_refresh).filter(|&secs| secs > 0)
    }
}

/// Read `config/telegraph.*`, then let `TELEGRAPH__SECTION__KEY` variables override it
pub fn load_config() -> anyhow::Result<AppConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/telegraph"))
        .add_source(config::Environment::with_prefix("TELEGRAPH").separator("__"))
        .build()?;

    Ok(settings.try_deserialize()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::{Config, File, FileFormat};

    fn parse(toml: &str) -> AppConfig {
        Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = parse(
            r#"
            [store]
            url = "http://store:9000"
            "#,
        );

        assert_eq!(config.server.listen, "0.0.0.0:8080");
        assert_eq!(config.render.default_period, "15m");
        assert_eq!(config.render.tick_count, 10);
        assert_eq!(config.default_refresh(), None);
        assert_eq!(config.source_registry().len(), 0);
    }

    #[test]
    fn test_sources() {
        let config = parse(
            r#"
            [store]
            url = "http://store:9000"

            [render]
            default_refresh = 60

            [sources]
            graphite = "http://graphite:8080/render"
            "#,
        );

        let registry = config.source_registry();
        assert_eq!(registry.resolve("graphite").unwrap(), "http://graphite:8080/render");
        assert!(registry.resolve("influx").is_err());
        assert_eq!(config.default_refresh(), Some(60));
    }
}
