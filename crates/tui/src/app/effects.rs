use super::*;

impl App {
    pub fn init(&mut self) -> Result<()> {
        match CredentialStore::open_default() {
            Ok(store) => self.store = Some(store),
            Err(e) => self.report_error("Failed to open credential store", e),
        }

        if self.onboarding.is_none() {
            self.build_widgets();
            tracing::info!(
                "Loaded {} integrations for {}/{}",
                self.widgets.len(),
                self.config.identity.user_id,
                self.config.identity.org_id
            );
        }
        Ok(())
    }

    pub(super) fn complete_onboarding(&mut self) {
        let Some(onboarding) = self.onboarding.take() else {
            return;
        };
        self.config.identity.user_id = onboarding.user_id.trim().to_string();
        self.config.identity.org_id = onboarding.org_id.trim().to_string();

        if let Some(path) = self.config_path.clone() {
            if let Err(e) = self.config.save(&path) {
                self.report_error("Failed to save config", e);
            }
        }
        self.build_widgets();
    }

    pub fn connect(&mut self, index: usize) {
        let Some(widget) = self.widgets.get_mut(index) else {
            return;
        };
        let Some(request) = widget.begin_connect() else {
            return;
        };
        let provider_config = widget.config().clone();
        self.status_message = None;
        self.clear_error();

        let backend = self.backend.clone();
        self.spawn_app_task(async move {
            let result = backend.authorize(&provider_config, &request).await;
            AppAsyncEvent::AuthorizeFinished { index, result }
        });
    }

    pub fn fetch_credentials(&mut self, index: usize) {
        let Some(widget) = self.widgets.get_mut(index) else {
            return;
        };
        let Some(request) = widget.begin_fetch() else {
            return;
        };

        let backend = self.backend.clone();
        let provider_config = widget.config().clone();
        self.spawn_app_task(async move {
            let result = backend.credentials(&provider_config, &request).await;
            AppAsyncEvent::CredentialsFinished { index, result }
        });
    }

    /// The user finished in the browser; closing the popup handle lets the
    /// next poll fetch credentials.
    pub fn mark_authorization_done(&mut self, index: usize) {
        let Some(widget) = self.widgets.get(index) else {
            return;
        };
        let awaiting = widget.state() == ConnectionState::AwaitingCallback;
        match widget.popup().cloned() {
            Some(popup) => popup.close(),
            None if awaiting => self.fetch_credentials(index),
            None => {}
        }
    }

    pub fn load_items(&mut self, index: usize) {
        let Some(widget) = self.widgets.get(index) else {
            return;
        };
        let provider = widget.provider();
        let provider_config = widget.config().clone();
        let Some(credentials) = self.credentials_for(index).map(String::from) else {
            self.status_message = Some(format!("Connect {} before loading items", provider));
            return;
        };
        if self.loading_items.is_some() {
            return;
        }

        self.loading_items = Some(provider);
        let backend = self.backend.clone();
        self.spawn_app_task(async move {
            let result = backend.load_items(&provider_config, &credentials).await;
            AppAsyncEvent::ItemsLoaded { provider, result }
        });
    }

    pub fn process_events(&mut self) {
        let mut async_events = Vec::new();
        if let Some(ref mut rx) = self.app_async_rx {
            while let Ok(event) = rx.try_recv() {
                async_events.push(event);
            }
        }
        for event in async_events {
            self.apply_async_event(event);
        }

        self.poll_popups(Instant::now());
        self.apply_host_updates();
    }

    pub(super) fn apply_async_event(&mut self, event: AppAsyncEvent) {
        match event {
            AppAsyncEvent::AuthorizeFinished { index, result } => {
                let Some(widget) = self.widgets.get_mut(index) else {
                    return;
                };
                widget.finish_authorize(result, self.navigator.as_ref());
                let provider = widget.provider();
                match widget.error_message().map(String::from) {
                    Some(err) => {
                        self.report_error(&format!("{} authorization failed", provider), err)
                    }
                    None => self.clear_error(),
                }
            }
            AppAsyncEvent::CredentialsFinished { index, result } => {
                let Some(widget) = self.widgets.get_mut(index) else {
                    return;
                };
                widget.finish_credentials(result);
                let provider = widget.provider();
                match widget.error_message().map(String::from) {
                    Some(err) => self.report_error(&format!("{} credentials failed", provider), err),
                    None => self.clear_error(),
                }
            }
            AppAsyncEvent::ItemsLoaded { provider, result } => {
                self.loading_items = None;
                match result {
                    Ok(items) => {
                        self.status_message =
                            Some(format!("Loaded {} {} items", items.len(), provider));
                        self.items.insert(provider, items);
                        self.clear_error();
                    }
                    Err(e) => {
                        let message = e.detail().unwrap_or(e.user_message()).to_string();
                        self.status_message = Some(message);
                        self.report_error(&format!("Failed to load {} items", provider), e);
                    }
                }
            }
        }
    }

    pub(super) fn poll_popups(&mut self, now: Instant) {
        let closed: Vec<usize> = self
            .widgets
            .iter_mut()
            .enumerate()
            .filter_map(|(index, widget)| {
                (widget.poll_popup(now) == PopupPoll::Closed).then_some(index)
            })
            .collect();
        for index in closed {
            self.fetch_credentials(index);
        }
    }

    pub(super) fn apply_host_updates(&mut self) {
        while let Ok(update) = self.host_rx.try_recv() {
            match update {
                HostUpdate::IntegrationParams { provider, params } => {
                    self.restored_credentials.remove(&provider);
                    let saved = match self.store.as_mut() {
                        Some(store) => store.put(provider, params),
                        None => {
                            tracing::warn!(
                                "Credential store unavailable, {} params not persisted",
                                provider
                            );
                            Ok(())
                        }
                    };
                    if let Err(e) = saved {
                        self.report_error("Failed to persist integration params", e);
                    }
                }
                HostUpdate::StatusMessage { provider, message } => {
                    tracing::debug!("{} status: {}", provider, redact_sensitive(&message));
                    self.status_message = Some(message);
                }
            }
        }
    }
}
