//! Summary of a simulated network as seen by the energy model.
//!
//! The summary only keeps what the energy model needs: the size of every population, whether it is a spike source,
//! the number of spikes of every neuron (if recorded), and the topology of every connection.
use serde::{Deserialize, Serialize};

use crate::error::SNABError;

/// The topology of a connection between two populations.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Connector {
    /// Neuron `i` of the source connects to neuron `i` of the target.
    OneToOne,
    /// Every neuron of the source connects to every neuron of the target.
    AllToAll,
    /// Every neuron of the source connects to `fan_out` neurons of the target.
    FixedFanOut { fan_out: usize },
    /// An explicit list of `(source, target)` neuron pairs.
    FromList { pairs: Vec<(usize, usize)> },
    /// A realization of any other (random) connector, only approximately accounted for.
    Random {
        name: String,
        pairs: Vec<(usize, usize)>,
    },
}

impl Connector {
    /// Classify a connector by name.
    ///
    /// The `parameter` is the fan-out of a fixed fan-out connector and is ignored otherwise.
    /// The `pairs` are the realized connections, used by list and unknown connectors.
    pub fn from_name(name: &str, parameter: f64, pairs: Vec<(usize, usize)>) -> Self {
        match name {
            "OneToOneConnector" => Connector::OneToOne,
            "AllToAllConnector" => Connector::AllToAll,
            "FixedFanOutConnector" => Connector::FixedFanOut {
                fan_out: parameter.max(0.0) as usize,
            },
            "FromListConnector" => Connector::FromList { pairs },
            _ => {
                log::warn!(
                    "Unknown connector {}, energy for random connectors is only approximated!",
                    name
                );
                Connector::Random {
                    name: name.to_string(),
                    pairs,
                }
            }
        }
    }

    /// The realized pairs of a list based connector.
    fn pairs(&self) -> Option<&[(usize, usize)]> {
        match self {
            Connector::FromList { pairs } | Connector::Random { pairs, .. } => Some(pairs),
            _ => None,
        }
    }
}

/// A population of the network.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct PopulationSummary {
    /// The number of neurons.
    pub size: usize,
    /// Whether the population replays predefined spikes instead of simulating neurons.
    pub spike_source: bool,
    /// The number of spikes of every neuron, `None` if spikes were not recorded.
    pub spike_counts: Option<Vec<usize>>,
}

impl PopulationSummary {
    /// A population whose spikes were not recorded.
    pub fn unrecorded(size: usize, spike_source: bool) -> Self {
        PopulationSummary {
            size,
            spike_source,
            spike_counts: None,
        }
    }

    /// A recorded population, given the number of spikes of every neuron.
    pub fn recorded(spike_counts: Vec<usize>, spike_source: bool) -> Self {
        PopulationSummary {
            size: spike_counts.len(),
            spike_source,
            spike_counts: Some(spike_counts),
        }
    }

    /// A recorded population, given the spike train of every neuron.
    pub fn from_spike_trains<S: AsRef<[f64]>>(spike_trains: &[S], spike_source: bool) -> Self {
        let spike_counts = spike_trains.iter().map(|st| st.as_ref().len()).collect();
        PopulationSummary::recorded(spike_counts, spike_source)
    }

    pub fn is_recording(&self) -> bool {
        self.spike_counts.is_some()
    }

    /// The total number of spikes, zero if not recorded.
    pub fn num_spikes(&self) -> usize {
        self.spike_counts
            .as_ref()
            .map_or(0, |counts| counts.iter().sum())
    }

    /// The number of spikes of a neuron, zero if not recorded or out of range.
    pub fn neuron_spikes(&self, neuron: usize) -> usize {
        self.spike_counts
            .as_ref()
            .and_then(|counts| counts.get(neuron).copied())
            .unwrap_or(0)
    }
}

/// A connection between two populations.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct ConnectionSummary {
    /// Index of the source population.
    pub source: usize,
    /// Index of the target population.
    pub target: usize,
    pub connector: Connector,
    /// Whether the synapses learn online (STDP).
    #[serde(default)]
    pub learning: bool,
}

/// Number of spikes reaching a synapse, split by connection topology.
#[derive(Debug, PartialEq, Clone, Copy, Default, Serialize, Deserialize)]
pub struct PostsynapticSpikes {
    pub one_to_one: usize,
    pub all_to_all: usize,
    /// Fixed fan-out, list and random connectors.
    pub other: usize,
}

/// A simulated network.
#[derive(Debug, PartialEq, Clone, Default, Serialize, Deserialize)]
pub struct NetworkSummary {
    pub populations: Vec<PopulationSummary>,
    pub connections: Vec<ConnectionSummary>,
    /// Wall-clock runtime of the simulation, in milliseconds.
    pub runtime: f64,
    /// Simulated (biological) duration, in milliseconds.
    #[serde(default)]
    pub duration: f64,
}

impl NetworkSummary {
    /// Create an empty network with the given wall-clock runtime and simulated duration.
    pub fn new(runtime: f64, duration: f64) -> Self {
        NetworkSummary {
            populations: vec![],
            connections: vec![],
            runtime,
            duration,
        }
    }

    /// Add a population to the network and returns its index.
    pub fn add_population(&mut self, population: PopulationSummary) -> usize {
        self.populations.push(population);
        self.populations.len() - 1
    }

    /// Connect two populations of the network.
    /// The function returns an error if a population or a listed neuron does not exist.
    pub fn connect(
        &mut self,
        source: usize,
        target: usize,
        connector: Connector,
        learning: bool,
    ) -> Result<(), SNABError> {
        let connection = ConnectionSummary {
            source,
            target,
            connector,
            learning,
        };
        self.check_connection(&connection)?;
        self.connections.push(connection);
        Ok(())
    }

    fn check_connection(&self, connection: &ConnectionSummary) -> Result<(), SNABError> {
        let (source_size, target_size) = match (
            self.populations.get(connection.source),
            self.populations.get(connection.target),
        ) {
            (Some(src), Some(tgt)) => (src.size, tgt.size),
            _ => {
                return Err(SNABError::InvalidParameter(format!(
                    "connection from population {} to population {} refers to a missing population",
                    connection.source, connection.target
                )))
            }
        };

        if let Some(pairs) = connection.connector.pairs() {
            if let Some((src, tgt)) = pairs
                .iter()
                .find(|(src, tgt)| *src >= source_size || *tgt >= target_size)
            {
                return Err(SNABError::InvalidParameter(format!(
                    "connection ({}, {}) is out of range for populations of sizes {} and {}",
                    src, tgt, source_size, target_size
                )));
            }
        }
        Ok(())
    }

    /// Check the consistency of a network, e.g., after deserialization.
    pub fn validate(&self) -> Result<(), SNABError> {
        if !(self.runtime >= 0.0) {
            return Err(SNABError::InvalidParameter(format!(
                "the runtime must be non-negative, got {}",
                self.runtime
            )));
        }
        for population in self.populations.iter() {
            if let Some(counts) = &population.spike_counts {
                if counts.len() != population.size {
                    return Err(SNABError::InvalidParameter(format!(
                        "population of size {} has {} spike counts",
                        population.size,
                        counts.len()
                    )));
                }
            }
        }
        self.connections
            .iter()
            .try_for_each(|connection| self.check_connection(connection))
    }

    fn population_size(&self, index: usize) -> usize {
        self.populations.get(index).map_or(0, |p| p.size)
    }

    /// Total number of recorded spikes, including spike sources or not.
    pub fn number_of_spikes(&self, sources: bool) -> usize {
        self.populations
            .iter()
            .filter(|p| sources || !p.spike_source)
            .map(|p| p.num_spikes())
            .sum()
    }

    /// Total number of neurons, including spike sources or not.
    pub fn number_of_neurons(&self, sources: bool) -> usize {
        self.populations
            .iter()
            .filter(|p| sources || !p.spike_source)
            .map(|p| p.size)
            .sum()
    }

    /// Indices of the connections whose source is the given population.
    pub fn connections_from(&self, population: usize) -> Vec<usize> {
        self.connections
            .iter()
            .enumerate()
            .filter(|(_, c)| c.source == population)
            .map(|(id, _)| id)
            .collect()
    }

    /// Number of learning (STDP) synapses in the network.
    pub fn number_of_stdp_synapses(&self) -> usize {
        self.connections
            .iter()
            .filter(|c| c.learning)
            .map(|c| match &c.connector {
                Connector::AllToAll => {
                    self.population_size(c.source) * self.population_size(c.target)
                }
                Connector::OneToOne => self.population_size(c.target),
                Connector::FixedFanOut { fan_out } => self.population_size(c.source) * fan_out,
                Connector::FromList { pairs } => pairs.len(),
                Connector::Random { pairs, .. } => {
                    log::warn!("Energy for random connectors is only approximated!");
                    pairs.len()
                }
            })
            .sum()
    }

    /// Number of spikes of a population delivered to postsynaptic neurons, split by topology.
    /// With `stdp_only`, only learning connections are considered.
    pub fn postsynaptic_spikes(&self, population: usize, stdp_only: bool) -> PostsynapticSpikes {
        let mut spikes = PostsynapticSpikes::default();
        let Some(pop) = self.populations.get(population) else {
            return spikes;
        };

        for id in self.connections_from(population) {
            let connection = &self.connections[id];
            if stdp_only && !connection.learning {
                continue;
            }
            match &connection.connector {
                Connector::AllToAll => {
                    spikes.all_to_all += pop.num_spikes() * self.population_size(connection.target);
                }
                Connector::OneToOne => {
                    spikes.one_to_one += pop.num_spikes();
                }
                Connector::FixedFanOut { fan_out } => {
                    spikes.other += pop.num_spikes() * fan_out;
                }
                connector => {
                    if let Connector::Random { .. } = connector {
                        log::warn!("Energy for random connectors is only approximated!");
                    }
                    spikes.other += connector
                        .pairs()
                        .unwrap_or(&[])
                        .iter()
                        .map(|(src, _)| pop.neuron_spikes(*src))
                        .sum::<usize>();
                }
            }
        }
        spikes
    }
}
