//! Naive price estimates from a pre-trained regression model.

pub mod model;
pub mod router;

use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

pub use model::{
    Coefficients, FeatureError, LinearPriceModel, ModelError, PriceFeatures, PriceModel,
};
pub use router::estimate_router;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceEstimate {
    pub estimated_price: f64,
    pub model: String,
}

/// Validates features before handing them to the model.
pub struct PriceEstimator {
    model: Arc<dyn PriceModel>,
}

impl PriceEstimator {
    pub fn new(model: Arc<dyn PriceModel>) -> Self {
        Self { model }
    }

    pub fn estimate(&self, features: &PriceFeatures) -> Result<PriceEstimate, FeatureError> {
        features.validate()?;
        let estimated_price = self.model.predict(features).round();
        debug!(model = self.model.name(), estimated_price, "price estimated");
        Ok(PriceEstimate {
            estimated_price,
            model: self.model.name().to_string(),
        })
    }
}

impl Default for PriceEstimator {
    fn default() -> Self {
        Self::new(Arc::new(LinearPriceModel::baseline()))
    }
}
