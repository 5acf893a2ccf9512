use crate::auth::SessionManager;
use crate::chat_history::ChatHistoryStore;
use std::sync::Arc;
use talem_rag::QueryService;

/// Shared by every handler and the precheck middleware.
#[derive(Clone)]
pub struct AppState {
    /// Issue cross-site (`SameSite=None; Secure`) cookies.
    pub production: bool,
    pub sessions: SessionManager,
    pub history: Arc<dyn ChatHistoryStore>,
    pub rag: Arc<QueryService>,
}
