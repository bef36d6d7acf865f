use crate::error::ServiceError;
use crate::session::Action;

/// Events sent from background tasks to the UI.
#[derive(Debug)]
pub enum AppEvent {
    /// Result of the idle-screen backend liveness check.
    PingFinished(Result<String, ServiceError>),
    /// Anything that has to go through the session controller.
    Session(Action),
}
