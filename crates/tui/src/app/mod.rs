use crate::keybinds::Keybinds;
use crate::onboarding::{OnboardingScreen, OnboardingState};
use crate::ui::layout::LayoutState;
use crate::ui::panel::PanelType;
use crate::Config;
use anyhow::Result;
use connect_hub_core::redact::redact_sensitive;
use connect_hub_core::store::CredentialStore;
use connect_hub_core::{
    Backend, ConnectWidget, ConnectionState, IntegrationItem, Navigator, PopupPoll, Provider,
    RedirectStrategy,
};
use ratatui::crossterm::event::{
    Event, KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::Frame;
use std::collections::HashMap;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;

mod effects;
mod input;
mod render;
mod state;
mod types;

pub use state::App;
pub use types::{AppAsyncEvent, HostUpdate};

impl App {
    pub(super) fn report_error(&mut self, context: &str, error: impl std::fmt::Display) {
        let message = format!("{context}: {}", redact_sensitive(&error.to_string()));
        self.last_error = Some(message.clone());
        tracing::warn!("{message}");
    }

    pub(super) fn clear_error(&mut self) {
        self.last_error = None;
        self.show_error_details = false;
    }

    pub(super) fn spawn_app_task<F>(&self, future: F)
    where
        F: Future<Output = AppAsyncEvent> + Send + 'static,
    {
        if let Some(tx) = self.app_async_tx.clone() {
            tokio::spawn(async move {
                let event = future.await;
                let _ = tx.send(event);
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{App, AppAsyncEvent};
    use crate::Config;
    use async_trait::async_trait;
    use connect_hub_core::store::CredentialStore;
    use connect_hub_core::{
        Backend, ConnectError, ConnectRequest, ConnectResult, ConnectionState,
        CredentialsPayload, IntegrationItem, IntegrationParams, Navigator, PopupHandle, Provider,
        ProviderConfig,
    };
    use ratatui::crossterm::event::{Event, KeyCode, KeyEvent, KeyModifiers};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct StubBackend {
        authorize_calls: AtomicUsize,
        fail_credentials: bool,
    }

    #[async_trait]
    impl Backend for StubBackend {
        async fn authorize(
            &self,
            config: &ProviderConfig,
            _request: &ConnectRequest,
        ) -> ConnectResult<String> {
            self.authorize_calls.fetch_add(1, Ordering::SeqCst);
            Ok(format!("https://{}.example/oauth", config.provider.key()))
        }

        async fn credentials(
            &self,
            config: &ProviderConfig,
            _request: &ConnectRequest,
        ) -> ConnectResult<CredentialsPayload> {
            if self.fail_credentials {
                return Err(ConnectError::Credentials {
                    provider: config.provider.display_name().to_string(),
                    detail: Some("Error fetching credentials".to_string()),
                });
            }
            Ok(CredentialsPayload::from_value(json!({"access_token": "mock_token"})).unwrap())
        }

        async fn load_items(
            &self,
            _config: &ProviderConfig,
            credentials: &str,
        ) -> ConnectResult<Vec<IntegrationItem>> {
            assert!(credentials.contains("mock_token"));
            Ok(serde_json::from_value(json!([{"id": "1", "name": "Item1"}])).unwrap())
        }
    }

    #[derive(Default)]
    struct StubNavigator {
        opened: Mutex<Vec<(String, PopupHandle)>>,
    }

    impl Navigator for StubNavigator {
        fn redirect_to(&self, url: &str) -> ConnectResult<()> {
            self.opened
                .lock()
                .unwrap()
                .push((url.to_string(), PopupHandle::new()));
            Ok(())
        }

        fn open_popup(&self, url: &str) -> ConnectResult<PopupHandle> {
            let handle = PopupHandle::new();
            self.opened
                .lock()
                .unwrap()
                .push((url.to_string(), handle.clone()));
            Ok(handle)
        }
    }

    fn configured() -> Config {
        let mut config = Config::default();
        config.identity.user_id = "TestUser".to_string();
        config.identity.org_id = "TestOrg".to_string();
        config
    }

    fn app_with(backend: StubBackend) -> (App, Arc<StubBackend>, Arc<StubNavigator>) {
        let backend = Arc::new(backend);
        let navigator = Arc::new(StubNavigator::default());
        let mut app = App::new(configured(), backend.clone(), navigator.clone());
        app.build_widgets();
        (app, backend, navigator)
    }

    async fn settle(app: &mut App) {
        let event: AppAsyncEvent = app
            .app_async_rx
            .as_mut()
            .expect("async rx")
            .recv()
            .await
            .expect("async event");
        app.apply_async_event(event);
        app.apply_host_updates();
    }

    fn key(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    #[test]
    fn missing_identity_starts_onboarding() {
        let app = App::new(
            Config::default(),
            Arc::new(StubBackend::default()),
            Arc::new(StubNavigator::default()),
        );
        assert!(app.onboarding.is_some());
        assert!(app.widgets.is_empty());
    }

    #[test]
    fn onboarding_builds_widgets_for_entered_identity() {
        let mut app = App::new(
            Config::default(),
            Arc::new(StubBackend::default()),
            Arc::new(StubNavigator::default()),
        );
        app.handle_event(key(KeyCode::Enter)).unwrap();
        for c in "u1".chars() {
            app.handle_event(key(KeyCode::Char(c))).unwrap();
        }
        app.handle_event(key(KeyCode::Tab)).unwrap();
        for c in "o1".chars() {
            app.handle_event(key(KeyCode::Char(c))).unwrap();
        }
        app.handle_event(key(KeyCode::Enter)).unwrap();
        app.handle_event(key(KeyCode::Enter)).unwrap();

        assert!(app.onboarding.is_none());
        assert_eq!(app.config.identity.user_id, "u1");
        assert_eq!(app.widgets.len(), 3);
        assert_eq!(app.widgets[0].display_text(), "Connect to Airtable");
    }

    #[tokio::test]
    async fn popup_flow_connects_after_done_key() {
        let (mut app, backend, navigator) = app_with(StubBackend::default());

        app.handle_event(key(KeyCode::Enter)).unwrap();
        app.handle_event(key(KeyCode::Enter)).unwrap();
        settle(&mut app).await;

        assert_eq!(backend.authorize_calls.load(Ordering::SeqCst), 1);
        assert_eq!(app.widgets[0].state(), ConnectionState::AwaitingCallback);
        assert_eq!(
            navigator.opened.lock().unwrap()[0].0,
            "https://airtable.example/oauth"
        );

        app.handle_event(key(KeyCode::Char('d'))).unwrap();
        app.process_events();
        settle(&mut app).await;

        assert_eq!(app.widgets[0].state(), ConnectionState::Connected);
        assert_eq!(
            app.status_message.as_deref(),
            Some("Credentials fetched successfully")
        );
        assert!(app.last_error.is_none());
    }

    #[tokio::test]
    async fn credentials_failure_reaches_host_status() {
        let (mut app, _, _) = app_with(StubBackend {
            fail_credentials: true,
            ..Default::default()
        });
        app.selected = 1;

        app.handle_event(key(KeyCode::Char('f'))).unwrap();
        settle(&mut app).await;

        assert_eq!(app.widgets[1].provider(), Provider::HubSpot);
        assert_eq!(app.widgets[1].state(), ConnectionState::Error);
        assert_eq!(
            app.status_message.as_deref(),
            Some("Error fetching credentials")
        );
        assert!(app
            .last_error
            .as_deref()
            .is_some_and(|e| e.contains("Error fetching credentials")));
    }

    #[tokio::test]
    async fn loads_items_once_connected() {
        let (mut app, _, _) = app_with(StubBackend::default());
        app.selected = 2;

        app.handle_event(key(KeyCode::Char('l'))).unwrap();
        assert_eq!(
            app.status_message.as_deref(),
            Some("Connect Notion before loading items")
        );

        app.handle_event(key(KeyCode::Char('f'))).unwrap();
        settle(&mut app).await;
        app.handle_event(key(KeyCode::Char('l'))).unwrap();
        settle(&mut app).await;

        let items = app.items.get(&Provider::Notion).expect("items");
        assert_eq!(items.len(), 1);
        assert!(app.loading_items.is_none());
    }

    #[tokio::test]
    async fn stored_credentials_do_not_mark_widgets_connected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut store = CredentialStore::open(dir.path()).expect("store");
        store
            .put(
                Provider::Notion,
                IntegrationParams::new()
                    .with_credentials(r#"{"access_token":"mock_token"}"#),
            )
            .expect("put");

        let (mut app, _, _) = app_with(StubBackend::default());
        app.store = Some(store);
        app.build_widgets();

        let notion = &app.widgets[2];
        assert_eq!(notion.state(), ConnectionState::Idle);
        assert_eq!(notion.display_text(), "Connect to Notion");
        assert_eq!(notion.integration_params().credentials(), None);
        assert!(app.restored_credentials.contains_key(&Provider::Notion));

        app.selected = 2;
        app.handle_event(key(KeyCode::Char('l'))).unwrap();
        settle(&mut app).await;
        assert_eq!(app.items.get(&Provider::Notion).map(Vec::len), Some(1));
    }

    #[tokio::test]
    async fn fresh_credentials_replace_restored_ones() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut store = CredentialStore::open(dir.path()).expect("store");
        store
            .put(
                Provider::HubSpot,
                IntegrationParams::new().with_credentials(r#"{"access_token":"old"}"#),
            )
            .expect("put");

        let (mut app, _, _) = app_with(StubBackend::default());
        app.store = Some(store);
        app.build_widgets();
        app.selected = 1;

        app.handle_event(key(KeyCode::Char('f'))).unwrap();
        settle(&mut app).await;

        assert!(!app.restored_credentials.contains_key(&Provider::HubSpot));
        assert_eq!(
            app.credentials_for(1),
            Some(r#"{"access_token":"mock_token"}"#)
        );
        let reopened = CredentialStore::open(dir.path()).expect("reopen");
        assert_eq!(
            reopened.get(Provider::HubSpot).and_then(|p| p.credentials()),
            Some(r#"{"access_token":"mock_token"}"#)
        );
    }

    #[tokio::test]
    async fn reconnect_clears_previous_error() {
        let (mut app, _, _) = app_with(StubBackend::default());
        app.last_error = Some("Airtable authorization failed: boom".to_string());

        app.handle_event(key(KeyCode::Enter)).unwrap();

        assert!(app.last_error.is_none());
        assert_eq!(app.widgets[0].state(), ConnectionState::Authorizing);
    }

    #[test]
    fn selection_stays_in_bounds() {
        let (mut app, _, _) = app_with(StubBackend::default());
        app.handle_event(key(KeyCode::Up)).unwrap();
        assert_eq!(app.selected, 0);
        for _ in 0..5 {
            app.handle_event(key(KeyCode::Down)).unwrap();
        }
        assert_eq!(app.selected, 2);
    }
}
