//! Application state management
use teapos_core::{Config, Result, SessionEndReason, SessionEvent, SessionManager, Storefront};
use tokio::sync::broadcast;

/// Storefront plus the UI side of the session event stream
pub struct AppState {
    storefront: Storefront,
    events: broadcast::Receiver<SessionEvent>,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self> {
        let storefront = Storefront::new(config)?;
        let events = storefront.session_manager().subscribe();
        storefront.initialize()?;

        Ok(Self { storefront, events })
    }

    pub fn storefront(&self) -> &Storefront {
        &self.storefront
    }

    pub fn session_manager(&self) -> &SessionManager {
        self.storefront.session_manager()
    }

    /// Turn session events raised while a command ran into user hints
    pub fn report_session_events(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            match event {
                SessionEvent::Ended {
                    reason: SessionEndReason::RefreshFailed,
                } => {
                    eprintln!("Your session has expired. Run `teapos login` to sign in again.");
                }
                SessionEvent::Refreshed => {
                    tracing::debug!("Session renewed while running command");
                }
                SessionEvent::Started { .. }
                | SessionEvent::Ended {
                    reason: SessionEndReason::LoggedOut,
                } => {}
            }
        }
    }
}
