//! Calibrated energy model.
//!
//! The model goes through two states:
//! - an [`EnergyModel`] accumulates the power readings and utilization counters of repeated measurement trials,
//! - a [`FittedEnergyModel`] holds the power and energy coefficients derived from them and estimates the energy of arbitrary networks.
//!
//! Power readings are in milliwatts and runtimes in milliseconds, the resulting energies are in millijoules.
use std::collections::BTreeMap;
use std::fmt;
use std::ops::AddAssign;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::network::NetworkSummary;
use crate::error::SNABError;

/// A measurement scenario, i.e., a network exercising one specific source of energy consumption.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy, Serialize, Deserialize)]
pub enum Scenario {
    /// Nothing is simulated.
    #[serde(rename = "idle")]
    Idle,
    /// Silent neurons, recorded.
    #[serde(rename = "non_spiking_rec")]
    NonSpikingRec,
    /// Silent neurons, not recorded.
    #[serde(rename = "non_spiking_non_rec")]
    NonSpikingNonRec,
    /// Spontaneously spiking neurons, recorded.
    #[serde(rename = "full_spiking_rec")]
    FullSpikingRec,
    /// Spontaneously spiking neurons, not recorded.
    #[serde(rename = "full_spiking_non_rec")]
    FullSpikingNonRec,
    /// Spike sources connected one-to-one to neurons.
    #[serde(rename = "input_O2O")]
    InputO2O,
    /// Spike sources connected all-to-all to neurons.
    #[serde(rename = "input_A2A")]
    InputA2A,
    /// Spike sources connected to neurons with a fixed fan-out.
    #[serde(rename = "input_random")]
    InputRandom,
    /// One spiking neuron connected to a whole population.
    #[serde(rename = "inter_s2A")]
    InterS2A,
    /// Spiking neurons connected one-to-one to another population.
    #[serde(rename = "inter_O2O")]
    InterO2O,
    /// Spiking neurons randomly connected to another population.
    #[serde(rename = "inter_random")]
    InterRandom,
    /// Idle learning synapses.
    #[serde(rename = "stdp_idle")]
    StdpIdle,
    /// Spikes transmitted through learning synapses.
    #[serde(rename = "stdp_spike")]
    StdpSpike,
}

impl Scenario {
    pub const ALL: [Scenario; 13] = [
        Scenario::Idle,
        Scenario::NonSpikingRec,
        Scenario::NonSpikingNonRec,
        Scenario::FullSpikingRec,
        Scenario::FullSpikingNonRec,
        Scenario::InputO2O,
        Scenario::InputA2A,
        Scenario::InputRandom,
        Scenario::InterS2A,
        Scenario::InterO2O,
        Scenario::InterRandom,
        Scenario::StdpIdle,
        Scenario::StdpSpike,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Scenario::Idle => "idle",
            Scenario::NonSpikingRec => "non_spiking_rec",
            Scenario::NonSpikingNonRec => "non_spiking_non_rec",
            Scenario::FullSpikingRec => "full_spiking_rec",
            Scenario::FullSpikingNonRec => "full_spiking_non_rec",
            Scenario::InputO2O => "input_O2O",
            Scenario::InputA2A => "input_A2A",
            Scenario::InputRandom => "input_random",
            Scenario::InterS2A => "inter_s2A",
            Scenario::InterO2O => "inter_O2O",
            Scenario::InterRandom => "inter_random",
            Scenario::StdpIdle => "stdp_idle",
            Scenario::StdpSpike => "stdp_spike",
        }
    }

    /// Returns true for the scenarios measuring learning synapses.
    pub fn is_stdp(&self) -> bool {
        matches!(self, Scenario::StdpIdle | Scenario::StdpSpike)
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Scenario {
    type Err = SNABError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Scenario::ALL
            .iter()
            .find(|scenario| scenario.name() == s)
            .copied()
            .ok_or_else(|| SNABError::InvalidParameter(format!("unknown scenario {}", s)))
    }
}

/// Utilization counters of one measurement trial.
/// Counters irrelevant to a scenario are left at zero.
#[derive(Debug, PartialEq, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Utilization {
    pub number_of_neurons: f64,
    pub number_of_spikes: f64,
    /// Spikes of the target population, for scenarios driving a population with inputs.
    pub number_of_spikes_tar: f64,
    pub number_of_source_spikes: f64,
    pub fan_out: f64,
    pub connections: f64,
    /// Wall-clock runtime, in milliseconds.
    pub runtime: f64,
    /// Simulated duration, in milliseconds.
    pub bioruntime: f64,
}

impl Utilization {
    fn normalized(&self, repeat: f64) -> Self {
        Utilization {
            number_of_neurons: self.number_of_neurons / repeat,
            number_of_spikes: self.number_of_spikes / repeat,
            number_of_spikes_tar: self.number_of_spikes_tar / repeat,
            number_of_source_spikes: self.number_of_source_spikes / repeat,
            fan_out: self.fan_out / repeat,
            connections: self.connections / repeat,
            runtime: self.runtime / repeat,
            bioruntime: self.bioruntime / repeat,
        }
    }
}

impl AddAssign for Utilization {
    fn add_assign(&mut self, other: Self) {
        self.number_of_neurons += other.number_of_neurons;
        self.number_of_spikes += other.number_of_spikes;
        self.number_of_spikes_tar += other.number_of_spikes_tar;
        self.number_of_source_spikes += other.number_of_source_spikes;
        self.fan_out += other.fan_out;
        self.connections += other.connections;
        self.runtime += other.runtime;
        self.bioruntime += other.bioruntime;
    }
}

/// The outcome of one measurement trial of a scenario.
#[derive(Debug, PartialEq, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Measurement {
    /// Average power draw, in milliwatts.
    pub power: f64,
    #[serde(default)]
    pub util: Utilization,
}

impl Measurement {
    pub fn new(power: f64, util: Utilization) -> Self {
        Measurement { power, util }
    }
}

/// An energy model accumulating measurement trials.
#[derive(Debug, PartialEq, Clone, Default, Serialize, Deserialize)]
pub struct EnergyModel {
    stdp: bool,
    pre_boot: f64,
    measured: BTreeMap<Scenario, f64>,
    util: BTreeMap<Scenario, Utilization>,
}

/// Create an empty energy model.
pub fn setup_energy_model() -> EnergyModel {
    EnergyModel::new()
}

impl EnergyModel {
    /// Create an empty energy model.
    pub fn new() -> Self {
        EnergyModel::default()
    }

    /// Returns true if learning synapses were measured.
    pub fn is_stdp(&self) -> bool {
        self.stdp
    }

    /// The power draw before booting the platform, in milliwatts.
    pub fn pre_boot(&self) -> f64 {
        self.pre_boot
    }

    /// Set the power draw before booting the platform, in milliwatts.
    /// This reading is taken once per measurement session, independently of the number of trials.
    pub fn set_pre_boot(&mut self, power: f64) -> Result<(), SNABError> {
        if !power.is_finite() {
            return Err(SNABError::InvalidParameter(format!(
                "the pre-boot power must be finite, got {}",
                power
            )));
        }
        self.pre_boot = power;
        Ok(())
    }

    /// Add one trial of a scenario to the model.
    pub fn accumulate(
        &mut self,
        scenario: Scenario,
        measurement: &Measurement,
    ) -> Result<(), SNABError> {
        if !measurement.power.is_finite() {
            return Err(SNABError::InvalidParameter(format!(
                "the power draw of scenario {} must be finite, got {}",
                scenario, measurement.power
            )));
        }

        *self.measured.entry(scenario).or_insert(0.0) += measurement.power;
        *self.util.entry(scenario).or_default() += measurement.util;
        if scenario.is_stdp() {
            self.stdp = true;
        }

        log::debug!(
            "Measured {} mW for scenario {}",
            measurement.power,
            scenario
        );
        Ok(())
    }

    /// Returns true if the scenario was measured at least once.
    pub fn has_measured(&self, scenario: Scenario) -> bool {
        self.measured.contains_key(&scenario)
    }

    /// Derive the coefficients of the model from `repeat` accumulated trials per scenario.
    ///
    /// All readings and counters are averaged over the trials first.
    /// Every coefficient isolates one source of consumption by subtracting the contributions of the coefficients derived before it.
    /// The function returns an error if `repeat` is zero or if a required scenario was never measured.
    pub fn calculate_coefficients(self, repeat: usize) -> Result<FittedEnergyModel, SNABError> {
        if repeat == 0 {
            return Err(SNABError::InvalidParameter(
                "the number of trials must be positive".to_string(),
            ));
        }

        if let Some(scenario) = Scenario::ALL
            .iter()
            .filter(|s| self.stdp || !s.is_stdp())
            .find(|s| !self.has_measured(**s))
        {
            return Err(SNABError::InvalidParameter(format!(
                "scenario {} was never measured",
                scenario
            )));
        }

        let repeat = repeat as f64;
        let normalize = |x: f64| x / repeat;

        // The pre-boot reading is taken once, so it is scaled up before the common normalization.
        let pre_boot = normalize(self.pre_boot * repeat);
        let measured: BTreeMap<Scenario, f64> = self
            .measured
            .iter()
            .map(|(s, p)| (*s, normalize(*p)))
            .collect();
        let util: BTreeMap<Scenario, Utilization> = self
            .util
            .iter()
            .map(|(s, u)| (*s, u.normalized(repeat)))
            .collect();

        // Power in watts, to be multiplied with runtimes in milliseconds
        let p = |s: Scenario| measured.get(&s).copied().unwrap_or(0.0) / 1000.0;
        let u = |s: Scenario| util.get(&s).copied().unwrap_or_default();

        let mut power = PowerCoefficients {
            pre_boot: pre_boot / 1000.0,
            idle: p(Scenario::Idle),
            ..Default::default()
        };
        let mut energy = EnergyCoefficients::default();

        let nsr = u(Scenario::NonSpikingRec);
        power.idle_recorded_neurons =
            (p(Scenario::NonSpikingRec) - power.idle) / nsr.number_of_neurons;

        let nsnr = u(Scenario::NonSpikingNonRec);
        power.idle_neurons = (p(Scenario::NonSpikingNonRec) - power.idle) / nsnr.number_of_neurons;

        let fsr = u(Scenario::FullSpikingRec);
        energy.spike = (p(Scenario::FullSpikingRec)
            - power.idle_recorded_neurons * fsr.number_of_neurons
            - power.idle)
            * fsr.runtime
            / fsr.number_of_spikes;

        let fsnr = u(Scenario::FullSpikingNonRec);
        energy.not_recorded_spike = (p(Scenario::FullSpikingNonRec)
            - power.idle
            - power.idle_neurons * fsnr.number_of_neurons)
            * fsnr.runtime
            / fsnr.number_of_spikes;

        let idle = power.idle;
        let idle_rec = power.idle_recorded_neurons;
        let spike = energy.spike;

        // Energy of the input spikes, without the energy of the spikes they trigger
        let input = |s: Scenario| {
            let util = u(s);
            let dividend = (p(s) - idle_rec * util.number_of_neurons - idle) * util.runtime
                - util.number_of_spikes_tar * spike;
            (dividend, util)
        };

        let (dividend, io2o) = input(Scenario::InputO2O);
        energy.input_spike_o2o = dividend / io2o.number_of_spikes;

        let (dividend, ia2a) = input(Scenario::InputA2A);
        energy.input_spike_a2a = dividend / (ia2a.number_of_spikes * ia2a.number_of_neurons);

        let (dividend, irandom) = input(Scenario::InputRandom);
        energy.input_spike_random = dividend / (irandom.number_of_spikes * irandom.fan_out);

        // Energy of the transmission, without the energy of the pre- and postsynaptic spikes
        let transmission = |s: Scenario, num_neurons: f64| {
            let util = u(s);
            (p(s) - idle_rec * num_neurons - idle) * util.runtime
                - spike * util.number_of_spikes
                - util.number_of_spikes_tar * spike
        };

        let s2a = u(Scenario::InterS2A);
        energy.transmission_s2a = transmission(Scenario::InterS2A, s2a.number_of_neurons + 1.0)
            / (s2a.number_of_spikes * s2a.number_of_neurons);

        let o2o = u(Scenario::InterO2O);
        energy.transmission_o2o =
            transmission(Scenario::InterO2O, 2.0 * o2o.number_of_neurons) / o2o.number_of_spikes;

        let random = u(Scenario::InterRandom);
        energy.transmission_random = transmission(Scenario::InterRandom, random.number_of_neurons)
            / (random.number_of_spikes * random.connections);

        if self.stdp {
            let si = u(Scenario::StdpIdle);
            power.idle_stdp = (p(Scenario::StdpIdle) - si.number_of_neurons * idle_rec - idle)
                / si.number_of_neurons;

            let ss = u(Scenario::StdpSpike);
            let dividend = (p(Scenario::StdpSpike)
                - idle
                - ss.number_of_neurons * power.idle_stdp
                - ss.number_of_neurons * idle_rec)
                * ss.runtime
                - spike * ss.number_of_spikes
                - ss.number_of_source_spikes * energy.input_spike_a2a * ss.number_of_neurons;
            energy.transmission_stdp =
                dividend / (ss.number_of_source_spikes * ss.number_of_neurons);
        }

        log::debug!("Power coefficients: {:?}", power);
        log::debug!("Energy coefficients: {:?}", energy);
        if !power.is_finite() || !energy.is_finite() {
            log::warn!("Some energy coefficients are not finite, check the utilization counters!");
        }

        Ok(FittedEnergyModel {
            stdp: self.stdp,
            measured,
            util,
            power,
            energy,
        })
    }
}

/// One trial of a scenario, as recorded in a measurement session.
#[derive(Debug, PartialEq, Clone, Copy, Serialize, Deserialize)]
pub struct ScenarioTrial {
    pub scenario: Scenario,
    #[serde(flatten)]
    pub measurement: Measurement,
}

/// A complete measurement session, with `repeat` trials of every scenario.
#[derive(Debug, PartialEq, Clone, Default, Serialize, Deserialize)]
pub struct MeasurementSession {
    pub repeat: usize,
    /// Power draw before booting the platform, in milliwatts.
    #[serde(default)]
    pub pre_boot: f64,
    pub trials: Vec<ScenarioTrial>,
}

impl MeasurementSession {
    /// Accumulate all trials of the session into a new model.
    pub fn to_model(&self) -> Result<EnergyModel, SNABError> {
        let mut model = setup_energy_model();
        model.set_pre_boot(self.pre_boot)?;
        for trial in self.trials.iter() {
            model.accumulate(trial.scenario, &trial.measurement)?;
        }
        Ok(model)
    }

    /// The number of trials of every recorded scenario.
    pub fn trial_counts(&self) -> BTreeMap<Scenario, usize> {
        let mut counts = BTreeMap::new();
        for trial in self.trials.iter() {
            *counts.entry(trial.scenario).or_insert(0) += 1;
        }
        counts
    }

    /// The recorded scenarios whose number of trials differs from `repeat`.
    pub fn inconsistent_scenarios(&self) -> Vec<Scenario> {
        self.trial_counts()
            .into_iter()
            .filter(|&(_, count)| count != self.repeat)
            .map(|(scenario, _)| scenario)
            .collect()
    }

    /// Fit an energy model on the session.
    ///
    /// Every scenario is averaged over `repeat` trials, a warning is logged for scenarios with another number of trials.
    pub fn fit(&self) -> Result<FittedEnergyModel, SNABError> {
        log::info!(
            "Fitting the energy model on {} trials ({} per scenario)",
            self.trials.len(),
            self.repeat
        );
        for (scenario, count) in self.trial_counts() {
            if count != self.repeat {
                log::warn!(
                    "Scenario {} has {} trials instead of {}, its average is biased!",
                    scenario,
                    count,
                    self.repeat
                );
            }
        }
        self.to_model()?.calculate_coefficients(self.repeat)
    }
}

/// Power coefficients, in watts (i.e., millijoules per millisecond).
#[derive(Debug, PartialEq, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PowerCoefficients {
    pub pre_boot: f64,
    pub idle: f64,
    /// Per recorded neuron.
    pub idle_recorded_neurons: f64,
    /// Per neuron which is not recorded.
    pub idle_neurons: f64,
    /// Per learning synapse.
    pub idle_stdp: f64,
}

impl PowerCoefficients {
    fn is_finite(&self) -> bool {
        [
            self.pre_boot,
            self.idle,
            self.idle_recorded_neurons,
            self.idle_neurons,
            self.idle_stdp,
        ]
        .iter()
        .all(|x| x.is_finite())
    }
}

/// Energy coefficients, in millijoules per event.
#[derive(Debug, PartialEq, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EnergyCoefficients {
    pub spike: f64,
    pub not_recorded_spike: f64,
    pub input_spike_o2o: f64,
    pub input_spike_a2a: f64,
    pub input_spike_random: f64,
    pub transmission_s2a: f64,
    pub transmission_o2o: f64,
    pub transmission_random: f64,
    pub transmission_stdp: f64,
}

impl EnergyCoefficients {
    fn is_finite(&self) -> bool {
        [
            self.spike,
            self.not_recorded_spike,
            self.input_spike_o2o,
            self.input_spike_a2a,
            self.input_spike_random,
            self.transmission_s2a,
            self.transmission_o2o,
            self.transmission_random,
            self.transmission_stdp,
        ]
        .iter()
        .all(|x| x.is_finite())
    }
}

/// Contributions of the different sources of consumption to the energy of a network, in millijoules.
#[derive(Debug, PartialEq, Clone, Copy, Default, Serialize, Deserialize)]
pub struct EnergyBreakdown {
    /// Baseline of the platform.
    pub idle: f64,
    /// Idle neurons, recorded or not.
    pub neuron_idle: f64,
    pub spikes: f64,
    /// Spikes emitted by spike sources.
    pub input: f64,
    /// Spikes transmitted between neurons.
    pub transmission: f64,
    /// Idle learning synapses and spikes transmitted through them.
    pub stdp: f64,
}

impl EnergyBreakdown {
    pub fn total(&self) -> f64 {
        self.idle + self.neuron_idle + self.spikes + self.input + self.transmission + self.stdp
    }
}

/// An energy model with fitted coefficients.
///
/// # Examples
///
/// ```rust
/// use rusty_snab::energy::model::{EnergyCoefficients, FittedEnergyModel, PowerCoefficients};
/// use rusty_snab::energy::network::{Connector, NetworkSummary, PopulationSummary};
///
/// let power = PowerCoefficients { idle: 2.0, idle_recorded_neurons: 0.5, ..Default::default() };
/// let energy = EnergyCoefficients { spike: 0.25, transmission_o2o: 1.0, ..Default::default() };
/// let model = FittedEnergyModel::from_coefficients(power, energy, false);
///
/// let mut network = NetworkSummary::new(10.0, 100.0);
/// let pop = network.add_population(PopulationSummary::recorded(vec![4, 0], false));
/// network.connect(pop, pop, Connector::OneToOne, false).unwrap();
///
/// // 10 * 2 (idle) + 2 * 0.5 * 10 (neurons) + 4 * 0.25 (spikes) + 4 * 1 (transmission)
/// assert_eq!(model.calculate_energy(&network), 35.0);
/// ```
///
/// A fitted model only comes from known coefficients, a fit or a saved model:
///
/// ```compile_fail
/// use rusty_snab::energy::model::FittedEnergyModel;
///
/// let model = FittedEnergyModel::default();
/// ```
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct FittedEnergyModel {
    stdp: bool,
    /// Averaged readings, in milliwatts.
    #[serde(default)]
    measured: BTreeMap<Scenario, f64>,
    /// Averaged utilization counters.
    #[serde(default)]
    util: BTreeMap<Scenario, Utilization>,
    power: PowerCoefficients,
    energy: EnergyCoefficients,
}

impl FittedEnergyModel {
    /// Create a model from known coefficients.
    pub fn from_coefficients(
        power: PowerCoefficients,
        energy: EnergyCoefficients,
        stdp: bool,
    ) -> Self {
        FittedEnergyModel {
            stdp,
            measured: BTreeMap::new(),
            util: BTreeMap::new(),
            power,
            energy,
        }
    }

    pub fn is_stdp(&self) -> bool {
        self.stdp
    }

    pub fn power(&self) -> &PowerCoefficients {
        &self.power
    }

    pub fn energy(&self) -> &EnergyCoefficients {
        &self.energy
    }

    /// The averaged power reading of a scenario, if measured.
    pub fn measured(&self, scenario: Scenario) -> Option<f64> {
        self.measured.get(&scenario).copied()
    }

    /// The averaged utilization counters of a scenario, if measured.
    pub fn util(&self, scenario: Scenario) -> Option<&Utilization> {
        self.util.get(&scenario)
    }

    /// Estimate the energy of a simulated network, split by source of consumption.
    ///
    /// The power coefficients are multiplied by the wall-clock runtime of the network and the energy coefficients by the number of matching events.
    /// Populations which were not recorded only account for their idle neurons.
    pub fn breakdown(&self, network: &NetworkSummary) -> EnergyBreakdown {
        let runtime = network.runtime;
        if !(runtime > 0.0) {
            log::warn!("The network has no runtime, idle consumption is not accounted for!");
        }

        let power = &self.power;
        let energy = &self.energy;
        let mut breakdown = EnergyBreakdown {
            idle: runtime * power.idle,
            ..Default::default()
        };

        for (id, pop) in network.populations.iter().enumerate() {
            if pop.spike_source {
                if !pop.is_recording() {
                    log::warn!("Please activate spike recording for all populations!");
                    continue;
                }
                let spikes = network.postsynaptic_spikes(id, false);
                breakdown.input += spikes.one_to_one as f64 * energy.input_spike_o2o
                    + spikes.all_to_all as f64 * energy.input_spike_a2a
                    + spikes.other as f64 * energy.input_spike_random;
            } else {
                if !pop.is_recording() {
                    breakdown.neuron_idle += pop.size as f64 * power.idle_neurons * runtime;
                    log::warn!("Please activate spike recording for all populations!");
                    continue;
                }
                breakdown.neuron_idle += pop.size as f64 * power.idle_recorded_neurons * runtime;
                breakdown.spikes += pop.num_spikes() as f64 * energy.spike;

                let spikes = network.postsynaptic_spikes(id, false);
                breakdown.transmission += spikes.one_to_one as f64 * energy.transmission_o2o
                    + spikes.all_to_all as f64 * energy.transmission_s2a
                    + spikes.other as f64 * energy.transmission_random;
            }
        }

        if self.stdp {
            breakdown.stdp += network.number_of_stdp_synapses() as f64 * power.idle_stdp * runtime;
            for (id, pop) in network.populations.iter().enumerate() {
                if pop.is_recording() {
                    let spikes = network.postsynaptic_spikes(id, true);
                    breakdown.stdp += (spikes.one_to_one + spikes.all_to_all + spikes.other) as f64
                        * energy.transmission_stdp;
                }
            }
        }

        log::debug!("Energy breakdown: {:?}", breakdown);
        breakdown
    }

    /// Estimate the total energy of a simulated network, in millijoules.
    pub fn calculate_energy(&self, network: &NetworkSummary) -> f64 {
        self.breakdown(network).total()
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::energy::network::{Connector, PopulationSummary};

    fn util(neurons: f64, spikes: f64, runtime: f64) -> Utilization {
        Utilization {
            number_of_neurons: neurons,
            number_of_spikes: spikes,
            runtime,
            ..Default::default()
        }
    }

    /// A model where the idle power is 1 W, a recorded neuron draws 0.1 W and a spike costs 0.5 mJ.
    fn measured_model(stdp: bool) -> EnergyModel {
        let mut model = EnergyModel::new();
        model.set_pre_boot(500.0).unwrap();

        // Two identical trials per scenario
        for _ in 0..2 {
            model
                .accumulate(Scenario::Idle, &Measurement::new(1000.0, Utilization::default()))
                .unwrap();
            model
                .accumulate(
                    Scenario::NonSpikingRec,
                    &Measurement::new(2000.0, util(10.0, 0.0, 100.0)),
                )
                .unwrap();
            model
                .accumulate(
                    Scenario::NonSpikingNonRec,
                    &Measurement::new(1500.0, util(10.0, 0.0, 100.0)),
                )
                .unwrap();
            // (3 - 1 - 1) W * 100 ms / 200 spikes
            model
                .accumulate(
                    Scenario::FullSpikingRec,
                    &Measurement::new(3000.0, util(10.0, 200.0, 100.0)),
                )
                .unwrap();
            // (2.5 - 1 - 0.5) W * 100 ms / 100 spikes
            model
                .accumulate(
                    Scenario::FullSpikingNonRec,
                    &Measurement::new(2500.0, util(10.0, 100.0, 100.0)),
                )
                .unwrap();
            // ((3 - 1 - 1) W * 100 ms - 20 * 0.5 mJ) / 45 spikes
            model
                .accumulate(
                    Scenario::InputO2O,
                    &Measurement::new(
                        3000.0,
                        Utilization {
                            number_of_spikes_tar: 20.0,
                            ..util(10.0, 45.0, 100.0)
                        },
                    ),
                )
                .unwrap();
            // ((3 - 1 - 1) W * 100 ms - 20 * 0.5 mJ) / (9 spikes * 10 neurons)
            model
                .accumulate(
                    Scenario::InputA2A,
                    &Measurement::new(
                        3000.0,
                        Utilization {
                            number_of_spikes_tar: 20.0,
                            ..util(10.0, 9.0, 100.0)
                        },
                    ),
                )
                .unwrap();
            // ((3 - 1 - 1) W * 100 ms - 20 * 0.5 mJ) / (9 spikes * fan-out 5)
            model
                .accumulate(
                    Scenario::InputRandom,
                    &Measurement::new(
                        3000.0,
                        Utilization {
                            number_of_spikes_tar: 20.0,
                            fan_out: 5.0,
                            ..util(10.0, 9.0, 100.0)
                        },
                    ),
                )
                .unwrap();
            // ((3.1 - 1.1 - 1) W * 100 ms - 10 * 0.5 mJ - 30 * 0.5 mJ) / (10 spikes * 10 neurons)
            model
                .accumulate(
                    Scenario::InterS2A,
                    &Measurement::new(
                        3100.0,
                        Utilization {
                            number_of_spikes_tar: 30.0,
                            ..util(10.0, 10.0, 100.0)
                        },
                    ),
                )
                .unwrap();
            // ((4 - 2 - 1) W * 100 ms - 40 * 0.5 mJ - 40 * 0.5 mJ) / 40 spikes
            model
                .accumulate(
                    Scenario::InterO2O,
                    &Measurement::new(
                        4000.0,
                        Utilization {
                            number_of_spikes_tar: 40.0,
                            ..util(10.0, 40.0, 100.0)
                        },
                    ),
                )
                .unwrap();
            // ((3 - 1 - 1) W * 100 ms - 20 * 0.5 mJ - 20 * 0.5 mJ) / (20 spikes * 4 connections)
            model
                .accumulate(
                    Scenario::InterRandom,
                    &Measurement::new(
                        3000.0,
                        Utilization {
                            number_of_spikes_tar: 20.0,
                            connections: 4.0,
                            ..util(10.0, 20.0, 100.0)
                        },
                    ),
                )
                .unwrap();

            if stdp {
                // (2.5 - 1 - 1) W / 10 synapses
                model
                    .accumulate(
                        Scenario::StdpIdle,
                        &Measurement::new(2500.0, util(10.0, 0.0, 100.0)),
                    )
                    .unwrap();
                // ((4 - 1 - 0.5 - 1) W * 100 ms - 20 * 0.5 mJ - 8 * 1 mJ * 10) / (8 * 10)
                model
                    .accumulate(
                        Scenario::StdpSpike,
                        &Measurement::new(
                            4000.0,
                            Utilization {
                                number_of_source_spikes: 8.0,
                                ..util(10.0, 20.0, 100.0)
                            },
                        ),
                    )
                    .unwrap();
            }
        }
        model
    }

    #[test]
    fn test_scenario_names() {
        for scenario in Scenario::ALL {
            assert_eq!(scenario.name().parse::<Scenario>().unwrap(), scenario);
            assert_eq!(
                serde_json::to_string(&scenario).unwrap(),
                format!("\"{}\"", scenario.name())
            );
        }
        assert!(matches!(
            "full_spiking".parse::<Scenario>(),
            Err(SNABError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_accumulate() {
        let model = measured_model(false);
        assert!(!model.is_stdp());
        assert!(model.has_measured(Scenario::Idle));
        assert!(!model.has_measured(Scenario::StdpIdle));
        assert_eq!(model.measured[&Scenario::Idle], 2000.0);
        assert_eq!(model.util[&Scenario::FullSpikingRec].number_of_spikes, 400.0);

        let model = measured_model(true);
        assert!(model.is_stdp());

        let mut model = EnergyModel::new();
        assert!(matches!(
            model.accumulate(Scenario::Idle, &Measurement::new(f64::NAN, Utilization::default())),
            Err(SNABError::InvalidParameter(_))
        ));
        assert!(matches!(
            model.set_pre_boot(f64::INFINITY),
            Err(SNABError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_calculate_coefficients() {
        let fitted = measured_model(false).calculate_coefficients(2).unwrap();
        let power = fitted.power();
        let energy = fitted.energy();

        assert_relative_eq!(power.idle, 1.0);
        assert_relative_eq!(power.idle_recorded_neurons, 0.1, epsilon = 1e-12);
        assert_relative_eq!(power.idle_neurons, 0.05, epsilon = 1e-12);

        assert_relative_eq!(energy.spike, 0.5, epsilon = 1e-12);
        assert_relative_eq!(energy.not_recorded_spike, 1.0, epsilon = 1e-12);
        assert_relative_eq!(energy.input_spike_o2o, 2.0, epsilon = 1e-12);
        assert_relative_eq!(energy.input_spike_a2a, 1.0, epsilon = 1e-12);
        assert_relative_eq!(energy.input_spike_random, 2.0, epsilon = 1e-12);
        assert_relative_eq!(energy.transmission_s2a, 0.8, epsilon = 1e-12);
        assert_relative_eq!(energy.transmission_o2o, 1.5, epsilon = 1e-12);
        assert_relative_eq!(energy.transmission_random, 1.0, epsilon = 1e-12);

        assert!(!fitted.is_stdp());
        assert_eq!(energy.transmission_stdp, 0.0);
        assert_eq!(power.idle_stdp, 0.0);

        assert_relative_eq!(fitted.measured(Scenario::Idle).unwrap(), 1000.0);
        assert_relative_eq!(fitted.util(Scenario::InterRandom).unwrap().connections, 4.0);
    }

    #[test]
    fn test_calculate_coefficients_stdp() {
        let fitted = measured_model(true).calculate_coefficients(2).unwrap();
        assert!(fitted.is_stdp());
        assert_relative_eq!(fitted.power().idle_stdp, 0.05, epsilon = 1e-12);
        assert_relative_eq!(fitted.energy().transmission_stdp, 0.75, epsilon = 1e-12);
    }

    #[test]
    fn test_pre_boot() {
        // The pre-boot reading does not depend on the number of trials
        let fitted = measured_model(false).calculate_coefficients(2).unwrap();
        assert_relative_eq!(fitted.power().pre_boot, 0.5);
    }

    #[test]
    fn test_calculate_coefficients_invalid() {
        assert!(matches!(
            measured_model(false).calculate_coefficients(0),
            Err(SNABError::InvalidParameter(_))
        ));

        let mut model = EnergyModel::new();
        model
            .accumulate(Scenario::Idle, &Measurement::new(1000.0, Utilization::default()))
            .unwrap();
        assert!(matches!(
            model.calculate_coefficients(1),
            Err(SNABError::InvalidParameter(_))
        ));

        // An STDP model requires both STDP scenarios
        let mut model = measured_model(false);
        model
            .accumulate(Scenario::StdpIdle, &Measurement::new(2500.0, util(10.0, 0.0, 100.0)))
            .unwrap();
        assert!(matches!(
            model.calculate_coefficients(1),
            Err(SNABError::InvalidParameter(_))
        ));
    }

    fn fitted_model(stdp: bool) -> FittedEnergyModel {
        let power = PowerCoefficients {
            pre_boot: 0.0,
            idle: 1.0,
            idle_recorded_neurons: 0.1,
            idle_neurons: 0.05,
            idle_stdp: 0.01,
        };
        let energy = EnergyCoefficients {
            spike: 0.5,
            not_recorded_spike: 1.0,
            input_spike_o2o: 2.0,
            input_spike_a2a: 1.0,
            input_spike_random: 3.0,
            transmission_s2a: 0.25,
            transmission_o2o: 1.5,
            transmission_random: 0.75,
            transmission_stdp: 4.0,
        };
        FittedEnergyModel::from_coefficients(power, energy, stdp)
    }

    fn network() -> NetworkSummary {
        let mut network = NetworkSummary::new(100.0, 1000.0);
        let input = network.add_population(PopulationSummary::recorded(vec![2, 2], true));
        let hidden = network.add_population(PopulationSummary::recorded(vec![1, 3, 0, 4], false));
        let output = network.add_population(PopulationSummary::recorded(vec![5, 5], false));

        network
            .connect(input, hidden, Connector::OneToOne, false)
            .unwrap();
        network
            .connect(input, output, Connector::AllToAll, false)
            .unwrap();
        network
            .connect(hidden, output, Connector::AllToAll, true)
            .unwrap();
        network
            .connect(output, hidden, Connector::FixedFanOut { fan_out: 3 }, false)
            .unwrap();
        network
    }

    #[test]
    fn test_calculate_energy() {
        let model = fitted_model(false);
        let breakdown = model.breakdown(&network());

        assert_relative_eq!(breakdown.idle, 100.0);
        // (4 + 2) recorded neurons * 0.1 W * 100 ms
        assert_relative_eq!(breakdown.neuron_idle, 60.0, epsilon = 1e-9);
        // 18 spikes * 0.5 mJ
        assert_relative_eq!(breakdown.spikes, 9.0);
        // 4 one-to-one * 2 mJ + 4 * 2 all-to-all * 1 mJ
        assert_relative_eq!(breakdown.input, 16.0);
        // 8 * 2 all-to-all * 0.25 mJ + 10 * 3 fan-out * 0.75 mJ
        assert_relative_eq!(breakdown.transmission, 26.5);
        assert_eq!(breakdown.stdp, 0.0);

        assert_relative_eq!(
            model.calculate_energy(&network()),
            211.5,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_calculate_energy_stdp() {
        let model = fitted_model(true);
        let breakdown = model.breakdown(&network());
        // 4 * 2 learning synapses * 0.01 W * 100 ms + 8 * 2 learning transmissions * 4 mJ
        assert_relative_eq!(breakdown.stdp, 8.0 + 64.0, epsilon = 1e-9);
    }

    #[test]
    fn test_calculate_energy_unrecorded() {
        let model = fitted_model(false);
        let mut network = network();
        network.populations[1] = PopulationSummary::unrecorded(4, false);
        network.populations[0] = PopulationSummary::unrecorded(2, true);

        let breakdown = model.breakdown(&network);
        // 4 neurons * 0.05 W * 100 ms + 2 recorded neurons * 0.1 W * 100 ms
        assert_relative_eq!(breakdown.neuron_idle, 40.0, epsilon = 1e-9);
        assert_eq!(breakdown.input, 0.0);
        assert_relative_eq!(breakdown.spikes, 5.0);
        assert_relative_eq!(breakdown.transmission, 22.5);
    }

    #[test]
    fn test_calculate_energy_idempotent() {
        let model = measured_model(true).calculate_coefficients(2).unwrap();
        let network = network();
        let first = model.calculate_energy(&network);
        let second = model.calculate_energy(&network);
        assert_eq!(first, second);
        assert!(first.is_finite());
    }

    #[test]
    fn test_model_serde() {
        let model = measured_model(true);
        let json = serde_json::to_string(&model).unwrap();
        let parsed: EnergyModel = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, model);

        let fitted = model.calculate_coefficients(2).unwrap();
        let json = serde_json::to_string(&fitted).unwrap();
        let parsed: FittedEnergyModel = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, fitted);
    }
}
