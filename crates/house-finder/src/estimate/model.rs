use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::listings::domain::MIN_YEAR_BUILT;

/// Feature vector consumed by price models, in the order the models were trained on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceFeatures {
    pub living_area: u32,
    pub bedrooms: u32,
    pub year_built: i32,
    pub garage_cars: u32,
    pub lot_area: u32,
    pub overall_qual: u8,
}

impl PriceFeatures {
    pub fn validate(&self) -> Result<(), FeatureError> {
        if !(1..=10).contains(&self.overall_qual) {
            return Err(FeatureError::Quality(self.overall_qual));
        }
        if self.year_built < MIN_YEAR_BUILT {
            return Err(FeatureError::YearBuilt(self.year_built));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FeatureError {
    #[error("overall quality must be between 1 and 10 (found {0})")]
    Quality(u8),
    #[error("year built {0} predates 1800")]
    YearBuilt(i32),
}

/// Pre-trained regressor treated as a pure function.
pub trait PriceModel: Send + Sync {
    fn name(&self) -> &str;
    fn predict(&self, features: &PriceFeatures) -> f64;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coefficients {
    pub living_area: f64,
    pub bedrooms: f64,
    pub year_built: f64,
    pub garage_cars: f64,
    pub lot_area: f64,
    pub overall_qual: f64,
}

/// `intercept + Σ coefficient × feature`, clamped at zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearPriceModel {
    #[serde(default = "default_model_name")]
    pub name: String,
    pub intercept: f64,
    pub coefficients: Coefficients,
}

fn default_model_name() -> String {
    "linear".to_string()
}

impl LinearPriceModel {
    /// Rough fit on Ames, Iowa sales; used when no model file is configured.
    pub fn baseline() -> Self {
        Self {
            name: "baseline".to_string(),
            intercept: -1_030_000.0,
            coefficients: Coefficients {
                living_area: 55.0,
                bedrooms: -4_000.0,
                year_built: 520.0,
                garage_cars: 12_000.0,
                lot_area: 0.6,
                overall_qual: 18_000.0,
            },
        }
    }

    pub fn from_json(raw: &str) -> Result<Self, ModelError> {
        let model: Self = serde_json::from_str(raw).map_err(ModelError::Parse)?;
        let c = &model.coefficients;
        let weights = [
            ("intercept", model.intercept),
            ("living_area", c.living_area),
            ("bedrooms", c.bedrooms),
            ("year_built", c.year_built),
            ("garage_cars", c.garage_cars),
            ("lot_area", c.lot_area),
            ("overall_qual", c.overall_qual),
        ];
        if let Some((name, _)) = weights.iter().find(|(_, value)| !value.is_finite()) {
            return Err(ModelError::NonFinite(*name));
        }
        Ok(model)
    }

    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let raw = fs::read_to_string(path).map_err(|source| ModelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&raw)
    }
}

impl PriceModel for LinearPriceModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn predict(&self, features: &PriceFeatures) -> f64 {
        let c = &self.coefficients;
        let raw = self.intercept
            + c.living_area * f64::from(features.living_area)
            + c.bedrooms * f64::from(features.bedrooms)
            + c.year_built * f64::from(features.year_built)
            + c.garage_cars * f64::from(features.garage_cars)
            + c.lot_area * f64::from(features.lot_area)
            + c.overall_qual * f64::from(features.overall_qual);
        raw.max(0.0)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("unable to read price model {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("price model is not valid JSON: {0}")]
    Parse(serde_json::Error),
    #[error("price model weight '{0}' is not finite")]
    NonFinite(&'static str),
}
