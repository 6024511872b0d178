use std::fs;

use approx::assert_relative_eq;
use tempfile::tempdir;

use rusty_snab::energy::model::{FittedEnergyModel, MeasurementSession, Scenario};
use rusty_snab::energy::network::{Connector, NetworkSummary, PopulationSummary};
use rusty_snab::error::SNABError;

const SESSION: &str = r#"{
    "repeat": 1,
    "pre_boot": 500.0,
    "trials": [
        {"scenario": "idle", "power": 1000.0},
        {"scenario": "non_spiking_rec", "power": 2000.0, "util": {"number_of_neurons": 10, "runtime": 100}},
        {"scenario": "non_spiking_non_rec", "power": 1500.0, "util": {"number_of_neurons": 10, "runtime": 100}},
        {"scenario": "full_spiking_rec", "power": 3000.0, "util": {"number_of_neurons": 10, "number_of_spikes": 200, "runtime": 100}},
        {"scenario": "full_spiking_non_rec", "power": 2500.0, "util": {"number_of_neurons": 10, "number_of_spikes": 100, "runtime": 100}},
        {"scenario": "input_O2O", "power": 3000.0, "util": {"number_of_neurons": 10, "number_of_spikes": 45, "number_of_spikes_tar": 20, "runtime": 100}},
        {"scenario": "input_A2A", "power": 3000.0, "util": {"number_of_neurons": 10, "number_of_spikes": 9, "number_of_spikes_tar": 20, "runtime": 100}},
        {"scenario": "input_random", "power": 3000.0, "util": {"number_of_neurons": 10, "number_of_spikes": 9, "number_of_spikes_tar": 20, "fan_out": 5, "runtime": 100}},
        {"scenario": "inter_s2A", "power": 3100.0, "util": {"number_of_neurons": 10, "number_of_spikes": 10, "number_of_spikes_tar": 30, "runtime": 100}},
        {"scenario": "inter_O2O", "power": 4000.0, "util": {"number_of_neurons": 10, "number_of_spikes": 40, "number_of_spikes_tar": 40, "runtime": 100}},
        {"scenario": "inter_random", "power": 3000.0, "util": {"number_of_neurons": 10, "number_of_spikes": 20, "number_of_spikes_tar": 20, "connections": 4, "runtime": 100}}
    ]
}"#;

const NETWORK: &str = r#"{
    "populations": [
        {"size": 2, "spike_source": true, "spike_counts": [3, 1]},
        {"size": 2, "spike_source": false, "spike_counts": [2, 2]}
    ],
    "connections": [
        {"source": 0, "target": 1, "connector": {"kind": "OneToOne"}}
    ],
    "runtime": 10.0,
    "duration": 1000.0
}"#;

#[test]
fn test_fit_session() {
    let session: MeasurementSession = serde_json::from_str(SESSION).unwrap();
    assert_eq!(session.trials.len(), 11);
    assert_eq!(session.trials[0].scenario, Scenario::Idle);

    let model = session.fit().unwrap();
    assert!(!model.is_stdp());
    assert_relative_eq!(model.power().pre_boot, 0.5);
    assert_relative_eq!(model.power().idle, 1.0);
    assert_relative_eq!(model.energy().spike, 0.5, epsilon = 1e-12);
    assert_relative_eq!(model.energy().input_spike_o2o, 2.0, epsilon = 1e-12);
    assert_relative_eq!(model.energy().transmission_o2o, 1.5, epsilon = 1e-12);
}

#[test]
fn test_fit_incomplete_session() {
    let mut session: MeasurementSession = serde_json::from_str(SESSION).unwrap();
    session.trials.retain(|t| t.scenario != Scenario::InterRandom);
    assert!(matches!(
        session.fit(),
        Err(SNABError::InvalidParameter(_))
    ));

    let mut session: MeasurementSession = serde_json::from_str(SESSION).unwrap();
    session.repeat = 0;
    assert!(matches!(
        session.fit(),
        Err(SNABError::InvalidParameter(_))
    ));
}

#[test]
fn test_session_trial_counts() {
    let session: MeasurementSession = serde_json::from_str(SESSION).unwrap();
    let counts = session.trial_counts();
    assert_eq!(counts.len(), 11);
    assert!(counts.values().all(|&count| count == 1));
    assert!(session.inconsistent_scenarios().is_empty());

    // Three idle trials averaged as two, the idle power is overestimated
    let mut session = session;
    session.repeat = 2;
    let idle = session.trials[0];
    session.trials.push(idle);
    session.trials.push(idle);
    assert_eq!(session.trial_counts()[&Scenario::Idle], 3);
    let inconsistent = session.inconsistent_scenarios();
    assert_eq!(inconsistent.len(), 11);
    assert!(inconsistent.contains(&Scenario::Idle));

    let model = session.fit().unwrap();
    assert_relative_eq!(model.power().idle, 1.5);
}

#[test]
fn test_energy_of_network_file() {
    let dir = tempdir().unwrap();
    let model_path = dir.path().join("model.json");

    let model = serde_json::from_str::<MeasurementSession>(SESSION)
        .unwrap()
        .fit()
        .unwrap();
    fs::write(&model_path, serde_json::to_string_pretty(&model).unwrap()).unwrap();
    let model: FittedEnergyModel =
        serde_json::from_str(&fs::read_to_string(&model_path).unwrap()).unwrap();

    let network: NetworkSummary = serde_json::from_str(NETWORK).unwrap();
    network.validate().unwrap();

    // 10 ms idle at 1 W, 4 input spikes at 2 mJ, 2 recorded neurons at 0.1 W and 4 spikes at 0.5 mJ
    let breakdown = model.breakdown(&network);
    assert_relative_eq!(breakdown.idle, 10.0);
    assert_relative_eq!(breakdown.input, 8.0, epsilon = 1e-9);
    assert_relative_eq!(breakdown.neuron_idle, 2.0, epsilon = 1e-9);
    assert_relative_eq!(breakdown.spikes, 2.0, epsilon = 1e-9);
    assert_eq!(breakdown.transmission, 0.0);
    assert_relative_eq!(model.calculate_energy(&network), 22.0, epsilon = 1e-9);
}

#[test]
fn test_energy_grows_with_activity() {
    let model = serde_json::from_str::<MeasurementSession>(SESSION)
        .unwrap()
        .fit()
        .unwrap();

    let build = |spikes: usize| {
        let mut network = NetworkSummary::new(100.0, 1000.0);
        let input = network.add_population(PopulationSummary::recorded(vec![spikes; 4], true));
        let hidden = network.add_population(PopulationSummary::recorded(vec![spikes; 8], false));
        let output = network.add_population(PopulationSummary::recorded(vec![spikes; 2], false));
        network
            .connect(input, hidden, Connector::AllToAll, false)
            .unwrap();
        network
            .connect(hidden, output, Connector::FixedFanOut { fan_out: 1 }, false)
            .unwrap();
        network
    };

    let quiet = model.calculate_energy(&build(0));
    let busy = model.calculate_energy(&build(10));
    assert!(busy > quiet);
    // Without spikes, only idle power is consumed
    assert_relative_eq!(quiet, 100.0 * 1.0 + 10.0 * 0.1 * 100.0, epsilon = 1e-9);
}
