// Backend source name to render URL lookup
use anyhow::anyhow;
use std::collections::HashMap;

/// Populated once at startup and read-only afterwards
#[derive(Debug, Clone, Default)]
pub struct SourceRegistry {
    urls: HashMap<String, String>,
}

impl SourceRegistry {
    pub fn new(urls: HashMap<String, String>) -> Self {
        Self { urls }
    }

    pub fn resolve(&self, source: &str) -> anyhow::Result<&str> {
        self.urls
            .get(source)
            .map(String::as_str)
            .ok_or_else(|| anyhow!("unknown data source '{}'", source))
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }
}

impl FromIterator<(String, String)> for SourceRegistry {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
