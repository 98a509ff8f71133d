//! Generic OAuth connect widget.
//!
//! One widget drives the handshake for one provider. Network calls are split
//! into `begin_*` / `finish_*` pairs so a host can run the request on a
//! background task and apply the outcome on its own thread;
//! [`ConnectWidget::initiate_connect`] and [`ConnectWidget::fetch_credentials`]
//! chain both halves for callers that can simply await.

use crate::api::{Backend, ConnectRequest};
use crate::error::{ConnectError, ConnectResult};
use crate::navigator::{Navigator, PopupHandle};
use crate::types::{
    ConnectionState, CredentialsPayload, IntegrationParams, Provider, ProviderConfig,
    RedirectStrategy,
};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

pub const CREDENTIALS_FETCHED: &str = "Credentials fetched successfully";
pub const DEFAULT_POPUP_TIMEOUT: Duration = Duration::from_secs(600);

pub type ParamsSetter = Box<dyn Fn(IntegrationParams) + Send + Sync>;
pub type StatusSetter = Box<dyn Fn(String) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopupPoll {
    /// No popup is being watched.
    Idle,
    Pending,
    /// The window closed; credentials should be fetched now.
    Closed,
    TimedOut,
}

pub struct ConnectWidget {
    config: ProviderConfig,
    request: ConnectRequest,
    integration_params: IntegrationParams,
    set_integration_params: ParamsSetter,
    set_status_message: Option<StatusSetter>,
    state: ConnectionState,
    error_message: Option<String>,
    status_message: Option<String>,
    authorization_url: Option<String>,
    popup: Option<PopupHandle>,
    awaiting_since: Option<Instant>,
    popup_timeout: Duration,
    fetching: bool,
}

impl ConnectWidget {
    pub fn new(
        config: ProviderConfig,
        user_id: impl Into<String>,
        org_id: impl Into<String>,
        integration_params: IntegrationParams,
        set_integration_params: ParamsSetter,
    ) -> Self {
        Self {
            config,
            request: ConnectRequest::new(user_id, org_id),
            integration_params,
            set_integration_params,
            set_status_message: None,
            state: ConnectionState::Idle,
            error_message: None,
            status_message: None,
            authorization_url: None,
            popup: None,
            awaiting_since: None,
            popup_timeout: DEFAULT_POPUP_TIMEOUT,
            fetching: false,
        }
    }

    pub fn with_status_setter(mut self, setter: StatusSetter) -> Self {
        self.set_status_message = Some(setter);
        self
    }

    pub fn with_popup_timeout(mut self, timeout: Duration) -> Self {
        self.popup_timeout = timeout;
        self
    }

    pub fn provider(&self) -> Provider {
        self.config.provider
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_deref()
    }

    pub fn integration_params(&self) -> &IntegrationParams {
        &self.integration_params
    }

    pub fn authorization_url(&self) -> Option<&str> {
        self.authorization_url.as_deref()
    }

    pub fn popup(&self) -> Option<&PopupHandle> {
        self.popup.as_ref()
    }

    pub fn is_busy(&self) -> bool {
        self.state == ConnectionState::Authorizing || self.fetching
    }

    /// Text the widget shows for its current state.
    pub fn display_text(&self) -> String {
        let name = self.config.provider.display_name();
        match self.state {
            ConnectionState::Idle => self.config.connect_label.clone(),
            ConnectionState::Authorizing => format!("Connecting to {}...", name),
            ConnectionState::AwaitingCallback if self.fetching => {
                format!("Fetching {} credentials...", name)
            }
            ConnectionState::AwaitingCallback => format!("Waiting for {} authorization...", name),
            ConnectionState::Connected => self.config.connected_label(),
            ConnectionState::Error => self
                .error_message
                .clone()
                .unwrap_or_else(|| self.authorize_failure_text()),
        }
    }

    fn authorize_failure_text(&self) -> String {
        format!(
            "Failed to start {} authorization",
            self.config.provider.display_name()
        )
    }

    fn credentials_failure_text(&self) -> String {
        format!(
            "Failed to fetch {} credentials",
            self.config.provider.display_name()
        )
    }

    /// Starts a connect attempt. Returns the request to send to the authorize
    /// endpoint, or `None` while another request from this widget is in
    /// flight.
    pub fn begin_connect(&mut self) -> Option<ConnectRequest> {
        if self.is_busy() {
            debug!(provider = %self.config.provider, "Connect ignored, request in flight");
            return None;
        }
        self.error_message = None;
        self.status_message = None;
        self.authorization_url = None;
        self.popup = None;
        self.awaiting_since = None;
        self.state = ConnectionState::Authorizing;
        info!(provider = %self.config.provider, "Requesting authorization URL");
        Some(self.request.clone())
    }

    pub fn finish_authorize(&mut self, result: ConnectResult<String>, navigator: &dyn Navigator) {
        if self.state != ConnectionState::Authorizing {
            warn!(
                provider = %self.config.provider,
                state = self.state.as_str(),
                "Dropping authorize result for a superseded attempt"
            );
            return;
        }

        let url = match result {
            Ok(url) => url,
            Err(e) => {
                let message = self.failure_text(&e, Self::authorize_failure_text);
                self.fail(message, &e);
                return;
            }
        };

        let dispatched = match self.config.redirect {
            RedirectStrategy::Popup => navigator.open_popup(&url).map(Some),
            RedirectStrategy::FullPageNavigate => navigator.redirect_to(&url).map(|_| None),
        };

        match dispatched {
            Ok(popup) => {
                self.awaiting_since = popup.as_ref().map(|_| Instant::now());
                self.popup = popup;
                self.authorization_url = Some(url);
                self.state = ConnectionState::AwaitingCallback;
                info!(provider = %self.config.provider, "Awaiting OAuth callback");
            }
            Err(e) => {
                let message = self.authorize_failure_text();
                self.fail(message, &e);
            }
        }
    }

    /// Starts a credentials fetch. Returns `None` while a request from this
    /// widget is in flight.
    pub fn begin_fetch(&mut self) -> Option<ConnectRequest> {
        if self.is_busy() {
            debug!(provider = %self.config.provider, "Fetch ignored, request in flight");
            return None;
        }
        self.error_message = None;
        self.popup = None;
        self.awaiting_since = None;
        self.fetching = true;
        self.state = ConnectionState::AwaitingCallback;
        info!(provider = %self.config.provider, "Fetching credentials");
        Some(self.request.clone())
    }

    pub fn finish_credentials(&mut self, result: ConnectResult<CredentialsPayload>) {
        if !self.fetching {
            warn!(provider = %self.config.provider, "Dropping unexpected credentials result");
            return;
        }
        self.fetching = false;

        match result {
            Ok(payload) => {
                let params = self
                    .integration_params
                    .clone()
                    .with_credentials(payload.to_json_string());
                (self.set_integration_params)(params.clone());
                self.integration_params = params;
                self.state = ConnectionState::Connected;
                self.status_message = Some(CREDENTIALS_FETCHED.to_string());
                self.notify_status(CREDENTIALS_FETCHED.to_string());
                info!(provider = %self.config.provider, "Integration connected");
            }
            Err(e) => {
                let message = self.failure_text(&e, Self::credentials_failure_text);
                self.fail(message.clone(), &e);
                self.notify_status(message);
            }
        }
    }

    /// Checks the authorization window opened by a popup redirect.
    pub fn poll_popup(&mut self, now: Instant) -> PopupPoll {
        if self.state != ConnectionState::AwaitingCallback {
            return PopupPoll::Idle;
        }
        let Some(popup) = self.popup.as_ref() else {
            return PopupPoll::Idle;
        };

        if popup.is_closed() {
            self.popup = None;
            self.awaiting_since = None;
            return PopupPoll::Closed;
        }

        let expired = self
            .awaiting_since
            .is_some_and(|since| now.saturating_duration_since(since) >= self.popup_timeout);
        if expired {
            self.popup = None;
            self.awaiting_since = None;
            self.state = ConnectionState::Error;
            self.error_message = Some(format!(
                "{} authorization timed out",
                self.config.provider.display_name()
            ));
            warn!(provider = %self.config.provider, "Authorization window timed out");
            return PopupPoll::TimedOut;
        }

        PopupPoll::Pending
    }

    pub async fn initiate_connect(
        &mut self,
        backend: &dyn Backend,
        navigator: &dyn Navigator,
    ) -> ConnectionState {
        if let Some(request) = self.begin_connect() {
            let result = backend.authorize(&self.config, &request).await;
            self.finish_authorize(result, navigator);
        }
        self.state
    }

    pub async fn fetch_credentials(&mut self, backend: &dyn Backend) -> ConnectionState {
        if let Some(request) = self.begin_fetch() {
            let result = backend.credentials(&self.config, &request).await;
            self.finish_credentials(result);
        }
        self.state
    }

    /// Polls the popup every `interval` and fetches credentials once it
    /// closes.
    pub async fn await_popup_close(
        &mut self,
        backend: &dyn Backend,
        interval: Duration,
    ) -> ConnectionState {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            match self.poll_popup(Instant::now()) {
                PopupPoll::Pending => continue,
                PopupPoll::Closed => return self.fetch_credentials(backend).await,
                PopupPoll::Idle | PopupPoll::TimedOut => return self.state,
            }
        }
    }

    fn failure_text(&self, error: &ConnectError, generic: fn(&Self) -> String) -> String {
        error
            .detail()
            .map(String::from)
            .unwrap_or_else(|| generic(self))
    }

    fn fail(&mut self, message: String, cause: &ConnectError) {
        if cause.is_retryable() {
            error!(provider = %self.config.provider, "Backend unreachable: {}", cause);
        } else {
            warn!(provider = %self.config.provider, "{}", cause);
        }
        self.popup = None;
        self.awaiting_since = None;
        self.state = ConnectionState::Error;
        self.error_message = Some(message);
    }

    fn notify_status(&self, message: String) {
        if let Some(ref setter) = self.set_status_message {
            setter(message);
        }
    }
}
