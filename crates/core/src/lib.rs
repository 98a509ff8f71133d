pub mod api;
pub mod error;
pub mod navigator;
pub mod redact;
pub mod store;
pub mod types;
pub mod widget;

pub use api::{Backend, BackendClient, ConnectRequest};
pub use error::{ConnectError, ConnectResult};
pub use navigator::{Navigator, PopupHandle, SystemBrowser};
pub use types::*;
pub use widget::{ConnectWidget, PopupPoll};
