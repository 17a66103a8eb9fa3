use std::sync::Arc;

use crate::airlines::AirlineLookup;
use crate::sessions::SessionRegistry;

#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionRegistry>,
    pub airlines: Arc<AirlineLookup>,
}
