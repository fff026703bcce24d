use std::sync::Arc;

use biomecode_engine::EarthEngine;
use biomecode_query::QueryTranslator;

pub struct AppState {
    pub translator: QueryTranslator,
}

impl AppState {
    pub fn new(engine: Arc<dyn EarthEngine>) -> Self {
        Self { translator: QueryTranslator::new(engine) }
    }
}
