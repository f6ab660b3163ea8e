//! Loading configurations from JSON
mod common;

use alloy_heat_core::{
    ConfigError, HeatSource, KernelPolicy, Simulation, SimulationConfig, SimulationError,
    TemperatureTarget,
};

#[test]
fn test_partial_json_fills_defaults() {
    let json = r#"{
        "width": 10,
        "height": 10,
        "heat_sources": [
            { "x": 0, "y": 0, "temperature": 1000.0 },
            { "x": 9, "y": 9, "temperature": 400.0 }
        ],
        "threshold": "mean_of_sources",
        "leaf_threshold": 25
    }"#;
    let config: SimulationConfig = serde_json::from_str(json).unwrap();

    let defaults = SimulationConfig::default();
    assert_eq!(config.initial_temperature, defaults.initial_temperature);
    assert_eq!(config.alloy, defaults.alloy);
    assert_eq!(config.kernel, KernelPolicy::Clamped);
    assert_eq!(config.ceiling, TemperatureTarget::FractionOfHottest(0.99));
    assert_eq!(config.threshold, TemperatureTarget::MeanOfSources);
    assert_eq!(config.leaf_threshold, Some(25));
    assert_eq!(config.max_generations, defaults.max_generations);

    let sim = Simulation::new(config).unwrap();
    assert_eq!(sim.threshold(), 700.0);
    assert_eq!(sim.tree().leaf_count(), 4);
}

#[test]
fn test_policies_round_trip_through_json() {
    let config = SimulationConfig::corner_sources(12, 8)
        .with_kernel(KernelPolicy::Unclamped)
        .with_ceiling(TemperatureTarget::CappedAtHottest(800.0))
        .with_threshold(TemperatureTarget::Fixed(300.0))
        .with_max_generations(None);

    let json = serde_json::to_string_pretty(&config).unwrap();
    assert!(json.contains("\"unclamped\""));
    assert!(json.contains("capped_at_hottest"));

    let back: SimulationConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(back, config);
}

#[test]
fn test_resized_grid_gets_its_own_corner_sources() {
    let config: SimulationConfig = serde_json::from_str(r#"{ "width": 10, "height": 10 }"#).unwrap();
    assert_eq!(
        config.heat_sources,
        vec![HeatSource::new(0, 0, 1000.0), HeatSource::new(9, 9, 400.0)]
    );
    assert_eq!(config, SimulationConfig::corner_sources(10, 10));
    assert!(config.validate().is_ok());

    let sim = Simulation::new(config).unwrap();
    assert_eq!(sim.ceiling(), 990.0);
}

#[test]
fn test_explicit_sources_replace_corner_sources() {
    let json = r#"{ "width": 6, "height": 4, "heat_sources": [{ "x": 2, "y": 1, "temperature": 250.0 }] }"#;
    let config: SimulationConfig = serde_json::from_str(json).unwrap();
    assert_eq!(config.heat_sources, vec![HeatSource::new(2, 1, 250.0)]);
    assert!(config.validate().is_ok());

    // An empty list is kept as given and rejected
    let json = r#"{ "width": 6, "height": 4, "heat_sources": [] }"#;
    let config: SimulationConfig = serde_json::from_str(json).unwrap();
    assert_eq!(config.validate(), Err(ConfigError::NoHeatSources));
}

#[test]
fn test_unreachable_threshold_rejected_by_simulation() {
    let json = r#"{ "width": 10, "height": 10, "ceiling": { "capped_at_hottest": 500.0 } }"#;
    let config: SimulationConfig = serde_json::from_str(json).unwrap();
    match Simulation::new(config) {
        Err(SimulationError::Config(ConfigError::ThresholdAboveCeiling { threshold, ceiling })) => {
            assert_eq!(threshold, 990.0);
            assert_eq!(ceiling, 500.0);
        }
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("a threshold above the ceiling must be rejected"),
    }
}

#[test]
fn test_invalid_json_values_rejected_by_simulation() {
    let json = r#"{ "width": 1, "height": 10, "heat_sources": [{ "x": 0, "y": 0, "temperature": 5.0 }] }"#;
    let config: SimulationConfig = serde_json::from_str(json).unwrap();
    match Simulation::new(config) {
        Err(SimulationError::Config(ConfigError::GridTooSmall { axis, value, .. })) => {
            assert_eq!(axis, "width");
            assert_eq!(value, 1);
        }
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("a one-column grid must be rejected"),
    }
}
