use std::sync::Arc;

use chatgate_db::Database;

use crate::provider::ChatProvider;
use crate::verifier::TokenVerifier;

pub type AppState = Arc<AppStateInner>;

/// Everything a request needs, built once in `main`. Nothing in here is
/// mutated after startup.
pub struct AppStateInner {
    pub db: Database,
    pub verifier: TokenVerifier,
    pub provider: Box<dyn ChatProvider>,
}
