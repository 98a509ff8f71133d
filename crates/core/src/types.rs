use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

pub const CREDENTIALS_KEY: &str = "credentials";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Airtable,
    HubSpot,
    Notion,
}

impl Provider {
    pub const ALL: [Provider; 3] = [Provider::Airtable, Provider::HubSpot, Provider::Notion];

    pub fn key(&self) -> &'static str {
        match self {
            Provider::Airtable => "airtable",
            Provider::HubSpot => "hubspot",
            Provider::Notion => "notion",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Provider::Airtable => "Airtable",
            Provider::HubSpot => "HubSpot",
            Provider::Notion => "Notion",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// How the authorization URL is handed to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RedirectStrategy {
    Popup,
    FullPageNavigate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BodyEncoding {
    Json,
    Form,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    pub provider: Provider,
    pub connect_label: String,
    pub endpoint_prefix: String,
    pub encoding: BodyEncoding,
    pub redirect: RedirectStrategy,
}

impl ProviderConfig {
    pub fn airtable() -> Self {
        Self {
            provider: Provider::Airtable,
            connect_label: "Connect to Airtable".to_string(),
            endpoint_prefix: "/integrations/airtable".to_string(),
            encoding: BodyEncoding::Form,
            redirect: RedirectStrategy::Popup,
        }
    }

    pub fn hubspot() -> Self {
        Self {
            provider: Provider::HubSpot,
            connect_label: "Connect HubSpot".to_string(),
            endpoint_prefix: "/integrations/hubspot".to_string(),
            encoding: BodyEncoding::Json,
            redirect: RedirectStrategy::FullPageNavigate,
        }
    }

    pub fn notion() -> Self {
        Self {
            provider: Provider::Notion,
            connect_label: "Connect to Notion".to_string(),
            endpoint_prefix: "/integrations/notion".to_string(),
            encoding: BodyEncoding::Form,
            redirect: RedirectStrategy::Popup,
        }
    }

    pub fn for_provider(provider: Provider) -> Self {
        match provider {
            Provider::Airtable => Self::airtable(),
            Provider::HubSpot => Self::hubspot(),
            Provider::Notion => Self::notion(),
        }
    }

    pub fn with_redirect(mut self, redirect: RedirectStrategy) -> Self {
        self.redirect = redirect;
        self
    }

    pub fn with_encoding(mut self, encoding: BodyEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn authorize_path(&self) -> String {
        format!("{}/authorize", self.endpoint_prefix)
    }

    pub fn credentials_path(&self) -> String {
        format!("{}/credentials", self.endpoint_prefix)
    }

    pub fn load_path(&self) -> String {
        format!("{}/load", self.endpoint_prefix)
    }

    pub fn connected_label(&self) -> String {
        format!("{} Connected", self.provider.display_name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Idle,
    Authorizing,
    AwaitingCallback,
    Connected,
    Error,
}

impl ConnectionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionState::Idle => "idle",
            ConnectionState::Authorizing => "authorizing",
            ConnectionState::AwaitingCallback => "awaiting_callback",
            ConnectionState::Connected => "connected",
            ConnectionState::Error => "error",
        }
    }
}

/// Key/value parameters a host keeps per integration. Only `credentials` is
/// written by the connect flow; other keys pass through untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IntegrationParams(BTreeMap<String, String>);

impl IntegrationParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn credentials(&self) -> Option<&str> {
        self.get(CREDENTIALS_KEY)
    }

    pub fn with_credentials(mut self, credentials: impl Into<String>) -> Self {
        self.insert(CREDENTIALS_KEY, credentials);
        self
    }

    pub fn without_credentials(mut self) -> Self {
        self.0.remove(CREDENTIALS_KEY);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for IntegrationParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Token payload returned by a credentials endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CredentialsPayload(serde_json::Map<String, serde_json::Value>);

impl CredentialsPayload {
    pub fn from_value(value: serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Object(map) => {
                let has_token = map
                    .get("access_token")
                    .and_then(|t| t.as_str())
                    .is_some_and(|t| !t.is_empty());
                has_token.then_some(Self(map))
            }
            _ => None,
        }
    }

    pub fn access_token(&self) -> &str {
        self.0
            .get("access_token")
            .and_then(|t| t.as_str())
            .unwrap_or_default()
    }

    pub fn to_json_string(&self) -> String {
        serde_json::Value::Object(self.0.clone()).to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegrationItem {
    pub id: String,
    #[serde(rename = "type", default)]
    pub item_type: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub creation_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_modified_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub parent_path_or_name: Option<String>,
    #[serde(default = "default_visibility")]
    pub visibility: bool,
}

fn default_visibility() -> bool {
    true
}

impl IntegrationItem {
    pub fn display_name(&self) -> String {
        match (&self.item_type, &self.name) {
            (Some(kind), Some(name)) => format!("[{}] {}", kind, name),
            (None, Some(name)) => name.clone(),
            (Some(kind), None) => format!("[{}] {}", kind, self.id),
            (None, None) => self.id.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn provider_labels_match_their_integrations() {
        assert_eq!(ProviderConfig::airtable().connect_label, "Connect to Airtable");
        assert_eq!(ProviderConfig::hubspot().connect_label, "Connect HubSpot");
        assert_eq!(ProviderConfig::notion().connect_label, "Connect to Notion");
    }

    #[test]
    fn hubspot_navigates_while_others_use_popups() {
        assert_eq!(
            ProviderConfig::hubspot().redirect,
            RedirectStrategy::FullPageNavigate
        );
        assert_eq!(ProviderConfig::airtable().redirect, RedirectStrategy::Popup);
        assert_eq!(ProviderConfig::notion().encoding, BodyEncoding::Form);
        assert_eq!(
            ProviderConfig::hubspot().authorize_path(),
            "/integrations/hubspot/authorize"
        );
    }

    #[test]
    fn credentials_payload_requires_access_token() {
        assert!(CredentialsPayload::from_value(json!({"access_token": "T"})).is_some());
        assert!(CredentialsPayload::from_value(json!({"access_token": ""})).is_none());
        assert!(CredentialsPayload::from_value(json!({"token": "T"})).is_none());
        assert!(CredentialsPayload::from_value(json!("T")).is_none());
    }

    #[test]
    fn credentials_payload_serializes_compactly() {
        let payload = CredentialsPayload::from_value(json!({"access_token": "mock_token"}))
            .expect("payload");
        assert_eq!(payload.to_json_string(), r#"{"access_token":"mock_token"}"#);
    }

    #[test]
    fn integration_item_accepts_sparse_rows() {
        let item: IntegrationItem =
            serde_json::from_value(json!({"id": "1", "name": "Item1"})).expect("item");
        assert_eq!(item.display_name(), "Item1");
        assert!(item.visibility);

        let item: IntegrationItem = serde_json::from_value(json!({
            "id": "42",
            "type": "contact",
            "name": "Ada Lovelace",
            "creation_time": "2024-01-02T03:04:05Z",
            "visibility": false
        }))
        .expect("item");
        assert_eq!(item.display_name(), "[contact] Ada Lovelace");
        assert!(item.creation_time.is_some());
        assert!(!item.visibility);
    }

    #[test]
    fn provider_serializes_as_endpoint_key() {
        for provider in Provider::ALL {
            assert_eq!(serde_json::to_value(provider).expect("json"), json!(provider.key()));
        }
    }
}
