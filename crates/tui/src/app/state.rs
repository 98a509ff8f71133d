use super::*;

pub struct App {
    pub should_quit: bool,
    pub config: Config,
    pub config_path: Option<PathBuf>,
    pub layout: LayoutState,
    pub keybinds: Keybinds,
    pub show_help: bool,
    pub onboarding: Option<OnboardingState>,
    pub backend: Arc<dyn Backend>,
    pub navigator: Arc<dyn Navigator>,
    pub widgets: Vec<ConnectWidget>,
    pub selected: usize,
    pub store: Option<CredentialStore>,
    pub items: HashMap<Provider, Vec<IntegrationItem>>,
    pub loading_items: Option<Provider>,
    /// Credentials loaded from the store at startup. Kept apart from the
    /// widgets, which only carry credentials they fetched themselves.
    pub restored_credentials: HashMap<Provider, String>,
    pub status_message: Option<String>,
    pub host_tx: mpsc::UnboundedSender<HostUpdate>,
    pub host_rx: mpsc::UnboundedReceiver<HostUpdate>,
    pub app_async_tx: Option<mpsc::UnboundedSender<AppAsyncEvent>>,
    pub app_async_rx: Option<mpsc::UnboundedReceiver<AppAsyncEvent>>,
    pub last_error: Option<String>,
    pub show_error_details: bool,
}

impl App {
    pub fn new(config: Config, backend: Arc<dyn Backend>, navigator: Arc<dyn Navigator>) -> Self {
        let (host_tx, host_rx) = mpsc::unbounded_channel();
        let (app_async_tx, app_async_rx) = mpsc::unbounded_channel();

        let onboarding = (!config.identity.is_complete()).then(|| {
            OnboardingState::with_identity(&config.identity.user_id, &config.identity.org_id)
        });

        Self {
            should_quit: false,
            config,
            config_path: None,
            layout: LayoutState::default(),
            keybinds: Keybinds,
            show_help: false,
            onboarding,
            backend,
            navigator,
            widgets: Vec::new(),
            selected: 0,
            store: None,
            items: HashMap::new(),
            loading_items: None,
            restored_credentials: HashMap::new(),
            status_message: None,
            host_tx,
            host_rx,
            app_async_tx: Some(app_async_tx),
            app_async_rx: Some(app_async_rx),
            last_error: None,
            show_error_details: false,
        }
    }

    pub fn with_config_path(mut self, path: PathBuf) -> Self {
        self.config_path = Some(path);
        self
    }

    /// Creates one widget per provider, seeded with the stored params minus
    /// credentials.
    pub fn build_widgets(&mut self) {
        let user_id = self.config.identity.user_id.clone();
        let org_id = self.config.identity.org_id.clone();
        let popup_timeout = self.config.popup_timeout();
        self.restored_credentials.clear();

        self.widgets = self
            .config
            .provider_configs()
            .into_iter()
            .map(|provider_config| {
                let provider = provider_config.provider;
                let stored = self
                    .store
                    .as_ref()
                    .map(|s| s.params_or_default(provider))
                    .unwrap_or_default();
                if let Some(credentials) = stored.credentials() {
                    self.restored_credentials
                        .insert(provider, credentials.to_string());
                }
                let params = stored.without_credentials();

                let params_tx = self.host_tx.clone();
                let status_tx = self.host_tx.clone();
                ConnectWidget::new(
                    provider_config,
                    user_id.clone(),
                    org_id.clone(),
                    params,
                    Box::new(move |params| {
                        let _ = params_tx.send(HostUpdate::IntegrationParams { provider, params });
                    }),
                )
                .with_status_setter(Box::new(move |message| {
                    let _ = status_tx.send(HostUpdate::StatusMessage { provider, message });
                }))
                .with_popup_timeout(popup_timeout)
            })
            .collect();
        self.selected = self.selected.min(self.widgets.len().saturating_sub(1));
    }

    pub fn selected_widget(&self) -> Option<&ConnectWidget> {
        self.widgets.get(self.selected)
    }

    /// Credentials for `index`: the widget's own once it connected, otherwise
    /// whatever the store held at startup.
    pub fn credentials_for(&self, index: usize) -> Option<&str> {
        let widget = self.widgets.get(index)?;
        widget
            .integration_params()
            .credentials()
            .or_else(|| self.restored_credentials.get(&widget.provider()).map(String::as_str))
    }
}
