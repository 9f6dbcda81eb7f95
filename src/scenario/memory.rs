//! In-memory scenario store with JSON snapshots

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::{compare, ComparisonRow, Scenario, ScenarioError, ScenarioKey, ScenarioStore};
use crate::config::defaults::SCENARIO_SCHEMA_VERSION;
use crate::types::Stream;

/// On-disk layout of a saved store
#[derive(Serialize, Deserialize)]
struct ScenarioFile {
    schema_version: u32,
    scenarios: Vec<Scenario>,
}

/// In-memory scenario store
///
/// Thread-safe via `RwLock`. Scenarios are held as `Arc` so readers keep a
/// consistent copy while writers replace entries. Not durable unless saved
/// with [`InMemoryScenarioStore::save_to_file`].
#[derive(Debug, Default)]
pub struct InMemoryScenarioStore {
    scenarios: RwLock<BTreeMap<ScenarioKey, Arc<Scenario>>>,
}

impl InMemoryScenarioStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> Result<usize, ScenarioError> {
        self.scenarios
            .read()
            .map(|s| s.len())
            .map_err(|e| ScenarioError::Storage(e.to_string()))
    }

    pub fn is_empty(&self) -> Result<bool, ScenarioError> {
        self.len().map(|n| n == 0)
    }

    /// Comparison rows for every scenario of one well and stream.
    pub fn compare(
        &self,
        well_id: &str,
        stream: Stream,
    ) -> Result<Vec<ComparisonRow>, ScenarioError> {
        Ok(compare(&self.list_scenarios(well_id, stream)?))
    }

    /// Save every scenario to a JSON file.
    ///
    /// Parent directories are created if missing.
    pub fn save_to_file(&self, path: &Path) -> Result<(), ScenarioError> {
        let file = ScenarioFile {
            schema_version: SCENARIO_SCHEMA_VERSION,
            scenarios: self
                .snapshot()?
                .iter()
                .map(|s| s.as_ref().clone())
                .collect(),
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&file)?;
        std::fs::write(path, json)?;
        info!(
            path = %path.display(),
            scenarios = file.scenarios.len(),
            "Scenario store saved"
        );
        Ok(())
    }

    /// Load a store from a JSON file written by [`Self::save_to_file`].
    ///
    /// Every forecast is recomputed from its fit and settings on load.
    pub fn load_from_file(path: &Path) -> Result<Self, ScenarioError> {
        let json = std::fs::read_to_string(path)?;
        let file: ScenarioFile = serde_json::from_str(&json)?;
        if file.schema_version != SCENARIO_SCHEMA_VERSION {
            return Err(ScenarioError::SchemaMismatch(
                file.schema_version,
                SCENARIO_SCHEMA_VERSION,
            ));
        }

        let store = Self::new();
        for scenario in file.scenarios {
            store.add_scenario(scenario.rebuild()?)?;
        }
        info!(path = %path.display(), scenarios = store.len()?, "Scenario store loaded");
        Ok(store)
    }

    /// Load from file if it exists and is valid, otherwise start empty.
    pub fn load_or_new(path: &Path) -> Self {
        match Self::load_from_file(path) {
            Ok(store) => store,
            Err(ScenarioError::Io(e)) => {
                debug!(path = %path.display(), error = %e, "No scenario file found, starting fresh");
                Self::new()
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Unusable scenario file, starting fresh");
                Self::new()
            }
        }
    }
}

impl ScenarioStore for InMemoryScenarioStore {
    fn add_scenario(&self, scenario: Scenario) -> Result<Arc<Scenario>, ScenarioError> {
        let mut store = self
            .scenarios
            .write()
            .map_err(|e| ScenarioError::Storage(e.to_string()))?;

        let key = scenario.key();
        if store.contains_key(&key) {
            return Err(ScenarioError::Duplicate(key));
        }
        let scenario = Arc::new(scenario);
        debug!(key = %key, eur = scenario.forecast_results().eur, "Scenario added");
        store.insert(key, Arc::clone(&scenario));
        Ok(scenario)
    }

    fn replace_scenario(&self, scenario: Scenario) -> Result<Arc<Scenario>, ScenarioError> {
        let mut store = self
            .scenarios
            .write()
            .map_err(|e| ScenarioError::Storage(e.to_string()))?;

        let key = scenario.key();
        let slot = store
            .get_mut(&key)
            .ok_or_else(|| ScenarioError::NotFound(key.clone()))?;
        let scenario = Arc::new(scenario);
        *slot = Arc::clone(&scenario);
        debug!(key = %key, eur = scenario.forecast_results().eur, "Scenario replaced");
        Ok(scenario)
    }

    fn remove_scenario(&self, key: &ScenarioKey) -> Result<Arc<Scenario>, ScenarioError> {
        let mut store = self
            .scenarios
            .write()
            .map_err(|e| ScenarioError::Storage(e.to_string()))?;

        store
            .remove(key)
            .ok_or_else(|| ScenarioError::NotFound(key.clone()))
    }

    fn get_scenario(&self, key: &ScenarioKey) -> Result<Option<Arc<Scenario>>, ScenarioError> {
        let store = self
            .scenarios
            .read()
            .map_err(|e| ScenarioError::Storage(e.to_string()))?;

        Ok(store.get(key).cloned())
    }

    fn list_scenarios(
        &self,
        well_id: &str,
        stream: Stream,
    ) -> Result<Vec<Arc<Scenario>>, ScenarioError> {
        let store = self
            .scenarios
            .read()
            .map_err(|e| ScenarioError::Storage(e.to_string()))?;

        // BTreeMap order is (well, stream, name)
        Ok(store
            .iter()
            .filter(|(k, _)| k.well_id == well_id && k.stream == stream)
            .map(|(_, s)| Arc::clone(s))
            .collect())
    }

    fn snapshot(&self) -> Result<Vec<Arc<Scenario>>, ScenarioError> {
        let store = self
            .scenarios
            .read()
            .map_err(|e| ScenarioError::Storage(e.to_string()))?;

        Ok(store.values().cloned().collect())
    }

    fn backend_name(&self) -> &'static str {
        "InMemory"
    }
}
