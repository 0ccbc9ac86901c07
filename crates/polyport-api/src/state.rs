//! Shared handler state

use std::sync::Arc;

use polyport_importer::ImportDispatcher;
use polyport_judge::JudgeClient;
use polyport_meta_data::SourceRepository;
use polyport_polygon::PolygonClient;

/// Everything the handlers touch
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: ImportDispatcher,
    pub sources: Arc<dyn SourceRepository>,
    pub judge: Arc<dyn JudgeClient>,
    pub polygon: PolygonClient,
}
