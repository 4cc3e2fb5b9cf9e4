//! In-memory model store
//!
//! Bundles hold boxed classifiers and cannot be cloned, so the store keeps a
//! factory per key and builds a fresh bundle on every `load`. Suitable for
//! tests and for models assembled in code.

use crate::application::ml::{ModelBundle, ModelStore};
use anyhow::Result;
use std::collections::HashMap;

type BundleFactory = Box<dyn Fn() -> ModelBundle + Send + Sync>;

#[derive(Default)]
pub struct InMemoryModelStore {
    factories: HashMap<String, BundleFactory>,
}

impl InMemoryModelStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<F>(&mut self, key: impl Into<String>, factory: F)
    where
        F: Fn() -> ModelBundle + Send + Sync + 'static,
    {
        self.factories.insert(key.into(), Box::new(factory));
    }

    pub fn with<F>(mut self, key: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> ModelBundle + Send + Sync + 'static,
    {
        self.insert(key, factory);
        self
    }

    pub fn contains(&self, key: &str) -> bool {
        self.factories.contains_key(key)
    }
}

impl ModelStore for InMemoryModelStore {
    fn load(&self, key: &str) -> Result<Option<ModelBundle>> {
        Ok(self.factories.get(key).map(|factory| factory()))
    }
}
