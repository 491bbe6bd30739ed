//! Machine learning module for traffic prediction
//!
//! Models are trained elsewhere and exported as JSON artifacts; this module
//! assembles their inputs and evaluates them.

pub mod features;
pub mod model;
pub mod persistence;

use std::path::Path;
use std::sync::Arc;

pub use features::{ConditionEncoder, EncodingError, FeatureAssembler, FeatureVector, aqi_bucket};
pub use model::{LinearModel, ModelError, Regressor, TreeEnsemble};
pub use persistence::{ModelArtifact, ModelSpec};

/// A loaded per-site model, read-only and cheap to clone.
#[derive(Debug, Clone)]
pub struct TrafficModel {
    regressor: Arc<dyn Regressor>,
    description: String,
}

impl TrafficModel {
    /// Wrap an already built regressor
    pub fn new(regressor: Arc<dyn Regressor>, description: impl Into<String>) -> Self {
        Self {
            regressor,
            description: description.into(),
        }
    }

    /// Load and validate an artifact from disk
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let artifact = ModelArtifact::load(path)?;
        let description = artifact.summary();
        let regressor = artifact.into_regressor()?;
        tracing::info!("Loaded {} from {}", description, path.display());
        Ok(Self::new(Arc::from(regressor), description))
    }

    /// Predicted vehicle count for one feature vector, never negative.
    pub fn predict(&self, features: &FeatureVector) -> Result<f64, ModelError> {
        tracing::debug!("Model input: {:?}", features.named());

        let raw = self.regressor.predict_row(&features.to_vec())?;
        if !raw.is_finite() {
            return Err(ModelError::NonFinite);
        }
        if raw < 0.0 {
            tracing::warn!("Model returned negative count {:.2}, clamping to 0", raw);
        }
        Ok(raw.max(0.0))
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}
