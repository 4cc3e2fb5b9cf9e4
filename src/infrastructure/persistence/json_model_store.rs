use crate::application::ml::{ClassifierAdapter, ModelBundle, ModelStore};
use crate::domain::ml::{FeatureSchema, Scaler};
use crate::infrastructure::ml::SmartCoreClassifier;
use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// On-disk form of a trained model set: feature order, fitted scaler and
/// every classifier trained on the scaler's output.
#[derive(Serialize, Deserialize)]
pub struct ModelArtifact {
    pub feature_schema: FeatureSchema,
    pub scaler: Scaler,
    pub classifiers: BTreeMap<String, SmartCoreClassifier>,
}

impl ModelArtifact {
    pub fn validate(&self) -> Result<()> {
        if self.feature_schema.is_empty() {
            bail!("Feature schema is empty");
        }
        if let Some(width) = self.scaler.width()
            && width != self.feature_schema.len()
        {
            bail!(
                "Scaler fitted on {} features but schema lists {}",
                width,
                self.feature_schema.len()
            );
        }
        Ok(())
    }

    pub fn into_bundle(self) -> ModelBundle {
        let mut adapter = ClassifierAdapter::new(self.scaler);
        for (key, classifier) in self.classifiers {
            adapter.insert(key, Box::new(classifier));
        }
        ModelBundle::new(self.feature_schema, adapter)
    }
}

/// One JSON artifact per key under a directory (`<dir>/<key>.json`).
pub struct JsonModelStore {
    dir: PathBuf,
}

impl JsonModelStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: &str) -> Result<PathBuf> {
        if key.is_empty() || key.contains(['/', '\\']) || key.starts_with('.') {
            bail!("Invalid model key: {:?}", key);
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }

    pub fn load_artifact(&self, key: &str) -> Result<Option<ModelArtifact>> {
        let path = self.path(key)?;
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read model artifact {:?}", path))?;
        let artifact: ModelArtifact = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse model artifact {:?}", path))?;
        artifact
            .validate()
            .with_context(|| format!("Inconsistent model artifact {:?}", path))?;

        info!(
            "Loaded {} classifier(s) for {} from {:?}",
            artifact.classifiers.len(),
            key,
            path
        );
        Ok(Some(artifact))
    }

    pub fn save(&self, key: &str, artifact: &ModelArtifact) -> Result<PathBuf> {
        artifact.validate()?;
        let path = self.path(key)?;
        if !self.dir.exists() {
            fs::create_dir_all(&self.dir).context("Failed to create model directory")?;
        }

        let content = serde_json::to_string(artifact).context("Failed to serialize model artifact")?;

        // Atomic write: write to temp file then rename
        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, content).context("Failed to write temp model file")?;
        fs::rename(&temp_path, &path).context("Failed to rename model file")?;

        info!("Saved model artifact {} to {:?}", key, path);
        Ok(path)
    }
}

impl ModelStore for JsonModelStore {
    fn load(&self, key: &str) -> Result<Option<ModelBundle>> {
        Ok(self.load_artifact(key)?.map(ModelArtifact::into_bundle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store(name: &str) -> JsonModelStore {
        let dir = std::env::temp_dir().join(format!("forecast-core-{}-{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        JsonModelStore::new(dir)
    }

    #[test]
    fn test_missing_artifact_is_none() {
        let store = temp_store("missing");
        assert!(store.load("EURUSD").unwrap().is_none());
    }

    #[test]
    fn test_rejects_path_like_keys() {
        let store = temp_store("keys");
        assert!(store.load("../secrets").is_err());
        assert!(store.load("").is_err());
    }

    #[test]
    fn test_scaler_width_must_match_schema() {
        let artifact = ModelArtifact {
            feature_schema: FeatureSchema::new(["rsi", "macd"]),
            scaler: Scaler::MinMax {
                data_min: vec![0.0],
                data_max: vec![1.0],
            },
            classifiers: BTreeMap::new(),
        };
        assert!(artifact.validate().is_err());
        assert!(temp_store("width").save("bad", &artifact).is_err());
    }

    #[test]
    fn test_save_then_load_empty_artifact() {
        let store = temp_store("empty");
        let artifact = ModelArtifact {
            feature_schema: FeatureSchema::new(["rsi"]),
            scaler: Scaler::Identity,
            classifiers: BTreeMap::new(),
        };
        let path = store.save("GBPUSD", &artifact).unwrap();
        assert!(path.ends_with("GBPUSD.json"));

        let bundle = store.load("GBPUSD").unwrap().unwrap();
        assert_eq!(bundle.feature_schema.names(), ["rsi"]);
        assert!(bundle.adapter.is_empty());
        let _ = fs::remove_dir_all(store.dir());
    }
}
