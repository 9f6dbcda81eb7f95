//! Scenario Workflow Tests
//!
//! CSV import -> per-stream analysis -> scenario store -> JSON snapshot and
//! back, the path the `dca fit --scenario` command takes.

use std::sync::Arc;

use dca_engine::analysis::analyze_well;
use dca_engine::import::{import_csv, ImportOptions};
use dca_engine::scenario::{
    InMemoryScenarioStore, Scenario, ScenarioError, ScenarioKey, ScenarioStore,
};
use dca_engine::types::{FitMode, FitResult, ForecastSettings, Stream};

/// Three years of monthly oil and gas for one well, plus a second well that
/// must be ignored.
fn write_well_csv(dir: &std::path::Path) -> std::path::PathBuf {
    let mut csv = String::from("well,date,oil_rate,gas_rate\n");
    for month in 0..36u32 {
        let year = 2021 + month / 12;
        let m = month % 12 + 1;
        let t = f64::from(month) * 30.4;
        let oil = 1500.0 / (1.0 + 0.9 * 0.005 * t).powf(1.0 / 0.9);
        let gas = 9000.0 * (-0.002 * t).exp();
        csv.push_str(&format!("\"N-1\",{year}-{m:02}-01,{oil:.3},{gas:.3}\n"));
    }
    csv.push_str("N-2,2021-01-01,50,60\n");
    let path = dir.join("north.csv");
    std::fs::write(&path, csv).unwrap();
    path
}

#[test]
fn import_analyse_store_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let csv = write_well_csv(dir.path());

    let import = import_csv(&csv, &ImportOptions::default()).unwrap();
    assert_eq!(import.info.well_id, "N-1");
    assert_eq!(import.info.rows_used, 36);
    assert_eq!(import.info.skipped_rows, 1);
    assert_eq!(import.points(Stream::Oil).unwrap().len(), 36);
    assert!(import.points(Stream::Water).is_none());

    let settings = ForecastSettings::new(7300, 50.0).with_step(30.0);
    let analysis = analyze_well(&import.info.well_id, &import.streams(), FitMode::Auto, &settings);
    assert!(analysis.is_complete(), "failures: {:?}", analysis.failures);

    let oil = analysis.stream(Stream::Oil).unwrap();
    assert!(oil.outcome.fit.r_squared > 0.99);
    assert!(oil.forecast.limit_reached);
    let gas = analysis.stream(Stream::Gas).unwrap();
    assert!(gas.outcome.fit.r_squared > 0.99);

    let store = InMemoryScenarioStore::new();
    for scenario in analysis.into_scenarios("base").unwrap() {
        store.add_scenario(scenario).unwrap();
    }
    assert_eq!(store.len().unwrap(), 2);

    // A pessimistic hand-entered case alongside the base one
    let base_oil = store
        .get_scenario(&ScenarioKey::new("N-1", Stream::Oil, "base"))
        .unwrap()
        .unwrap();
    let base_fit = base_oil.fit_results();
    let steeper =
        FitResult::manual(base_fit.model_type, base_fit.qi, base_fit.di * 1.5, base_fit.b).unwrap();
    let low = Scenario::new("N-1", "low", Stream::Oil, steeper, *base_oil.settings()).unwrap();
    let low = store.add_scenario(low).unwrap();
    assert_eq!(low.fit_results().r_squared, 0.0);
    assert!(low.fit_results().confidence.is_none());
    assert!(base_fit.confidence.is_some());

    let rows = store.compare("N-1", Stream::Oil).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].name, "base");
    assert_eq!(rows[1].name, "low");
    assert!(rows[1].eur < rows[0].eur);
    assert!(rows[1].eur_ratio < 1.0);

    let path = dir.path().join("store").join("scenarios.json");
    store.save_to_file(&path).unwrap();
    let reloaded = InMemoryScenarioStore::load_from_file(&path).unwrap();
    assert_eq!(reloaded.len().unwrap(), 3);
    let names: Vec<String> = reloaded
        .list_scenarios("N-1", Stream::Oil)
        .unwrap()
        .iter()
        .map(|s| s.name().to_string())
        .collect();
    assert_eq!(names, vec!["base", "low"]);
}

#[test]
fn snapshot_survives_later_mutation() {
    let dir = tempfile::tempdir().unwrap();
    let csv = write_well_csv(dir.path());
    let import = import_csv(&csv, &ImportOptions::default()).unwrap();
    let analysis = analyze_well(
        "N-1",
        &import.streams(),
        FitMode::Auto,
        &ForecastSettings::new(3650, 0.0),
    );

    let store: Arc<dyn ScenarioStore> = Arc::new(InMemoryScenarioStore::new());
    for scenario in analysis.into_scenarios("base").unwrap() {
        store.add_scenario(scenario).unwrap();
    }

    let before = store.snapshot().unwrap();
    let key = ScenarioKey::new("N-1", Stream::Gas, "base");
    let gas = store.get_scenario(&key).unwrap().unwrap();
    let longer = gas.with_settings(ForecastSettings::new(7300, 0.0)).unwrap();
    store.replace_scenario(longer).unwrap();
    store
        .remove_scenario(&ScenarioKey::new("N-1", Stream::Oil, "base"))
        .unwrap();

    assert_eq!(before.len(), 2);
    let old_gas = before.iter().find(|s| s.stream() == Stream::Gas).unwrap();
    assert_eq!(old_gas.settings().days, 3650);
    assert_eq!(store.snapshot().unwrap().len(), 1);
    assert_eq!(store.get_scenario(&key).unwrap().unwrap().settings().days, 7300);

    assert!(matches!(
        store.remove_scenario(&ScenarioKey::new("N-1", Stream::Oil, "base")),
        Err(ScenarioError::NotFound(_))
    ));
}
