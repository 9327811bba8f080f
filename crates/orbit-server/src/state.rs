//! Shared application state

use orbit_agent::Responder;

/// State handed to every route handler.
///
/// The responder is stateless between requests, so a single instance serves
/// all of them.
pub struct AppState {
    pub responder: Responder,
}
