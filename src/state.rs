use crate::analysis::Analyzer;
use crate::models::StoreData;
use std::{path::PathBuf, sync::Arc};
use tokio::sync::Mutex;

#[derive(Clone)]
pub struct AppState {
    pub data_path: PathBuf,
    pub data: Arc<Mutex<StoreData>>,
    pub analyzer: Analyzer,
}

impl AppState {
    pub fn new(data_path: PathBuf, data: StoreData, analyzer: Analyzer) -> Self {
        Self {
            data_path,
            data: Arc::new(Mutex::new(data)),
            analyzer,
        }
    }
}
