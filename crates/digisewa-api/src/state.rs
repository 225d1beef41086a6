//! Application state shared across handlers.

use digisewa_core::Config;
use digisewa_custody::CustodyService;
use std::sync::Arc;

pub struct AppState {
    pub config: Config,
    pub custody: Arc<CustodyService>,
}
