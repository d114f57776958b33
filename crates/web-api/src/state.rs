use std::sync::Arc;

use hoops_core::InsightGenerator;
use hoops_predictor::PredictionService;
use hoops_upstream::NbaDataService;

/// Shared handler state. Cloned per request; every field is cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub predictions: PredictionService,
    pub upstream: Arc<NbaDataService>,
    pub insights: Arc<dyn InsightGenerator>,
}

impl AppState {
    #[must_use]
    pub fn new(
        predictions: PredictionService,
        upstream: Arc<NbaDataService>,
        insights: Arc<dyn InsightGenerator>,
    ) -> Self {
        Self {
            predictions,
            upstream,
            insights,
        }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("predictions", &self.predictions)
            .field("upstream", &self.upstream)
            .field("insights", &self.insights.name())
            .finish()
    }
}
