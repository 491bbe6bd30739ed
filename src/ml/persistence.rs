//! Model persistence - save and load model artifacts

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::features::FeatureVector;
use super::model::{DumpNode, LinearModel, ModelError, Regressor, TreeEnsemble};

/// The fitted model carried by an artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelSpec {
    Linear {
        intercept: f64,
        coefficients: Vec<f64>,
    },
    TreeEnsemble {
        base_score: f64,
        trees: Vec<DumpNode>,
    },
}

/// Versioned JSON envelope around an exported model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    /// Version for backward compatibility
    pub version: u32,
    /// Site the model was trained for
    #[serde(default)]
    pub site: Option<String>,
    /// Column order used at training time
    pub feature_names: Vec<String>,
    pub model: ModelSpec,
}

impl ModelArtifact {
    /// Current version number
    pub const CURRENT_VERSION: u32 = 1;

    /// Create an artifact using the pinned feature order
    pub fn new(site: Option<String>, model: ModelSpec) -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            site,
            feature_names: FeatureVector::NAMES.iter().map(|s| s.to_string()).collect(),
            model,
        }
    }

    /// Save to a file as pretty JSON
    pub fn save(&self, path: &Path) -> Result<(), ModelError> {
        // Create parent directories if needed
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ModelError::Io(e.to_string()))?;
        }

        let bytes =
            serde_json::to_vec_pretty(self).map_err(|e| ModelError::Serialize(e.to_string()))?;

        fs::write(path, bytes).map_err(|e| ModelError::Io(e.to_string()))?;

        Ok(())
    }

    /// Load from a file and validate the envelope
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        if !path.exists() {
            return Err(ModelError::FileNotFound(
                path.to_string_lossy().to_string(),
            ));
        }

        let bytes = fs::read(path).map_err(|e| ModelError::Io(e.to_string()))?;

        let artifact: Self = serde_json::from_slice(&bytes)
            .map_err(|e| ModelError::Deserialize(e.to_string()))?;

        artifact.validate()?;
        Ok(artifact)
    }

    /// Check version and that the recorded column order is the pinned one
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.version > Self::CURRENT_VERSION {
            return Err(ModelError::VersionMismatch {
                expected: Self::CURRENT_VERSION,
                found: self.version,
            });
        }

        if self.feature_names.iter().map(String::as_str).ne(FeatureVector::NAMES) {
            return Err(ModelError::FeatureMismatch {
                expected: FeatureVector::NAMES.iter().map(|s| s.to_string()).collect(),
                found: self.feature_names.clone(),
            });
        }

        Ok(())
    }

    /// Build the evaluator for this artifact
    pub fn into_regressor(self) -> Result<Box<dyn Regressor>, ModelError> {
        match self.model {
            ModelSpec::Linear {
                intercept,
                coefficients,
            } => Ok(Box::new(LinearModel::new(intercept, coefficients)?)),
            ModelSpec::TreeEnsemble { base_score, trees } => {
                let ensemble = TreeEnsemble::from_dump(base_score, &trees)?;
                tracing::debug!("Compiled {} trees", ensemble.num_trees());
                Ok(Box::new(ensemble))
            }
        }
    }

    /// Get a human-readable summary
    pub fn summary(&self) -> String {
        let detail = match &self.model {
            ModelSpec::Linear { coefficients, .. } => {
                format!("linear, {} coefficients", coefficients.len())
            }
            ModelSpec::TreeEnsemble { trees, .. } => format!("tree ensemble, {} trees", trees.len()),
        };
        format!(
            "Model v{} for {}: {}",
            self.version,
            self.site.as_deref().unwrap_or("unspecified site"),
            detail
        )
    }
}
