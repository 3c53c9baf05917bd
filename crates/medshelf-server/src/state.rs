//! Shared application state.

use std::sync::Arc;

use medshelf_core::MedicationService;

use crate::config::ServerConfig;

/// State shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<MedicationService>,
    pub config: Arc<ServerConfig>,
}
