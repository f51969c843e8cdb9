//! Shared state handed to every handler.

use supportdesk::SupportDesk;

#[derive(Clone)]
pub struct AppState {
    pub desk: SupportDesk,
}

impl AppState {
    pub fn new(desk: SupportDesk) -> Self {
        Self { desk }
    }
}
