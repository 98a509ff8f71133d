use crate::error::{ConnectError, ConnectResult};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

/// Close flag for an authorization window. Clones share the flag, so the
/// host can close the window the widget is polling.
#[derive(Debug, Clone, Default)]
pub struct PopupHandle {
    closed: Arc<AtomicBool>,
}

impl PopupHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

pub trait Navigator: Send + Sync {
    /// Sends the user to `url`, leaving the current context.
    fn redirect_to(&self, url: &str) -> ConnectResult<()>;

    /// Opens `url` in a separate window and returns its close flag.
    fn open_popup(&self, url: &str) -> ConnectResult<PopupHandle>;
}

/// Opens authorization pages in the user's default browser.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemBrowser;

impl SystemBrowser {
    fn open(url: &str) -> ConnectResult<()> {
        open::that(url).map_err(|e| ConnectError::Navigation(e.to_string()))
    }
}

impl Navigator for SystemBrowser {
    fn redirect_to(&self, url: &str) -> ConnectResult<()> {
        info!("Navigating to authorization page");
        Self::open(url)
    }

    fn open_popup(&self, url: &str) -> ConnectResult<PopupHandle> {
        info!("Opening authorization window");
        Self::open(url)?;
        Ok(PopupHandle::new())
    }
}
