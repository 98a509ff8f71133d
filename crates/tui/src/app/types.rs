use connect_hub_core::{
    ConnectResult, CredentialsPayload, IntegrationItem, IntegrationParams, Provider,
};

/// Results of background network calls, applied on the UI thread.
pub enum AppAsyncEvent {
    AuthorizeFinished {
        index: usize,
        result: ConnectResult<String>,
    },
    CredentialsFinished {
        index: usize,
        result: ConnectResult<CredentialsPayload>,
    },
    ItemsLoaded {
        provider: Provider,
        result: ConnectResult<Vec<IntegrationItem>>,
    },
}

/// Writes the widgets make to host-owned state through their setters.
#[derive(Debug, Clone, PartialEq)]
pub enum HostUpdate {
    IntegrationParams {
        provider: Provider,
        params: IntegrationParams,
    },
    StatusMessage {
        provider: Provider,
        message: String,
    },
}
