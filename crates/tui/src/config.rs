use connect_hub_core::{BodyEncoding, Provider, ProviderConfig, RedirectStrategy};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub backend: BackendConfig,
    pub identity: IdentityConfig,
    pub popup: PopupConfig,
    pub providers: BTreeMap<String, ProviderOverride>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub base_url: String,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    pub user_id: String,
    pub org_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PopupConfig {
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderOverride {
    pub redirect: Option<RedirectStrategy>,
    pub encoding: Option<BodyEncoding>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            timeout_seconds: 20,
        }
    }
}

impl Default for PopupConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 600,
        }
    }
}

impl IdentityConfig {
    pub fn is_complete(&self) -> bool {
        !self.user_id.trim().is_empty() && !self.org_id.trim().is_empty()
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_default()
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Applies `CONNECT_HUB_*` variables on top of the file values.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("CONNECT_HUB_BACKEND_URL") {
            self.backend.base_url = url;
        }
        if let Some(user) = lookup("CONNECT_HUB_USER_ID") {
            self.identity.user_id = user;
        }
        if let Some(org) = lookup("CONNECT_HUB_ORG_ID") {
            self.identity.org_id = org;
        }
    }

    pub fn backend_timeout(&self) -> Duration {
        Duration::from_secs(self.backend.timeout_seconds.max(1))
    }

    pub fn popup_timeout(&self) -> Duration {
        Duration::from_secs(self.popup.timeout_seconds.max(1))
    }

    pub fn provider_configs(&self) -> Vec<ProviderConfig> {
        Provider::ALL
            .into_iter()
            .map(|provider| {
                let mut config = ProviderConfig::for_provider(provider);
                if let Some(over) = self.providers.get(provider.key()) {
                    if let Some(redirect) = over.redirect {
                        config = config.with_redirect(redirect);
                    }
                    if let Some(encoding) = over.encoding {
                        config = config.with_encoding(encoding);
                    }
                }
                config
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn parses_partial_file_with_defaults() {
        let config: Config = toml::from_str(
            r#"
[identity]
user_id = "TestUser"
org_id = "TestOrg"

[providers.hubspot]
redirect = "popup"
"#,
        )
        .expect("parse");

        assert_eq!(config.backend.base_url, "http://localhost:8000");
        assert!(config.identity.is_complete());

        let providers = config.provider_configs();
        let hubspot = providers
            .iter()
            .find(|p| p.provider == Provider::HubSpot)
            .expect("hubspot");
        assert_eq!(hubspot.redirect, RedirectStrategy::Popup);
        assert_eq!(hubspot.encoding, BodyEncoding::Json);
    }

    #[test]
    fn env_overrides_file_values() {
        let vars: HashMap<&str, &str> = [
            ("CONNECT_HUB_BACKEND_URL", "http://backend:9000"),
            ("CONNECT_HUB_ORG_ID", "EnvOrg"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.identity.user_id = "FileUser".to_string();
        config.apply_overrides(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.backend.base_url, "http://backend:9000");
        assert_eq!(config.identity.user_id, "FileUser");
        assert_eq!(config.identity.org_id, "EnvOrg");
    }

    #[test]
    fn saved_config_loads_back() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("config.toml");
        let mut config = Config::default();
        config.identity.user_id = "u".to_string();
        config.identity.org_id = "o".to_string();
        config.save(&path).expect("save");

        let loaded = Config::load(&path).expect("load");
        assert_eq!(loaded.identity.user_id, "u");
        assert_eq!(loaded.popup.timeout_seconds, 600);
    }
}
