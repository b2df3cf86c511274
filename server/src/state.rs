use crate::orchestrator::JobOrchestrator;

// Shared by every handler: the orchestrator owns the store and analyzer.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: JobOrchestrator,
}

impl AppState {
    pub fn new(orchestrator: JobOrchestrator) -> Self {
        AppState { orchestrator }
    }
}
