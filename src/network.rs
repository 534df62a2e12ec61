//! Builds a feed-forward neural network from a [`Genome`] and evaluates it.
//!
//! Genes name their endpoints with small integer IDs that only make sense
//! once remapped into dense index spaces (sensor/action/internal-neuron);
//! [`NeuralNet::build`] does that remapping once and stores the result as a
//! flat connection array plus a small neuron-state array, mirroring the
//! teacher's "resolve once, store flat, no ownership cycles" approach to its
//! own `NeuralNetwork`/`Neuron` pair in `neat.rs` — except here the graph is
//! feed-forward-with-persistent-state rather than a `Rc`-linked DAG, because
//! the spec's network has no structural mutation after construction.

use serde::{Deserialize, Serialize};

use crate::actions::NUM_ACTIONS;
use crate::gene::{EndpointType, Gene, Genome};
use crate::sensors::NUM_SENSORS;

/// One resolved connection: a source (sensor or internal neuron) feeding a
/// sink (action or internal neuron) with a real-valued weight.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    pub source_type: EndpointType,
    /// Post-remap index: `[0, NUM_SENSORS)` if source is a sensor, else
    /// `[0, maxInternalNeurons)`.
    pub source_id: usize,
    pub sink_type: EndpointType,
    /// Post-remap index: `[0, NUM_ACTIONS)` if sink is an action, else
    /// `[0, maxInternalNeurons)`.
    pub sink_id: usize,
    pub weight: f32,
}

/// Persistent state of one internal neuron.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Neuron {
    /// Current output, in `[-1, 1]` once driven at least once; initialized
    /// to `0.5` at birth.
    pub output: f32,
    /// Whether at least one connection feeds this neuron, after pruning.
    pub driven: bool,
}

/// A built network: a flat connection list plus per-neuron state.
///
/// Invariant (maintained by [`NeuralNet::build`] and never broken
/// afterwards, since the network has no further structural mutation): no
/// connection has a source that is an undriven internal neuron.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NeuralNet {
    pub connections: Vec<Connection>,
    pub neurons: Vec<Neuron>,
}

impl NeuralNet {
    /// Resolves a genome's gene endpoints into dense index spaces, then
    /// prunes connections sourced from undriven internal neurons to a fixed
    /// point.
    pub fn build(genome: &Genome, max_internal_neurons: usize) -> Self {
        let mut connections = Vec::with_capacity(genome.len());

        for gene in genome {
            if let Some(conn) = resolve_gene(*gene, max_internal_neurons) {
                connections.push(conn);
            }
        }

        let mut neurons = vec![
            Neuron {
                output: 0.5,
                driven: false,
            };
            max_internal_neurons
        ];

        loop {
            mark_driven(&connections, &mut neurons);

            let before = connections.len();
            connections.retain(|c| {
                !(matches!(c.source_type, EndpointType::Neuron) && !neurons[c.source_id].driven)
            });

            if connections.len() == before {
                break;
            }
        }

        Self {
            connections,
            neurons,
        }
    }

    /// Runs one feed-forward pass: sensors in, action levels out. Internal
    /// neuron outputs persist in `self.neurons` between calls, which is the
    /// network's only form of memory.
    pub fn activate(&mut self, sensors: &[f32]) -> Vec<f32> {
        debug_assert_eq!(sensors.len(), NUM_SENSORS);

        let mut neuron_acc = vec![0.0f32; self.neurons.len()];
        let mut action_acc = vec![0.0f32; NUM_ACTIONS];

        for conn in &self.connections {
            let src = match conn.source_type {
                EndpointType::External => sensors[conn.source_id],
                EndpointType::Neuron => self.neurons[conn.source_id].output,
            };
            let contribution = src * conn.weight;

            match conn.sink_type {
                EndpointType::External => action_acc[conn.sink_id] += contribution,
                EndpointType::Neuron => neuron_acc[conn.sink_id] += contribution,
            }
        }

        for (i, neuron) in self.neurons.iter_mut().enumerate() {
            if neuron.driven {
                neuron.output = neuron_acc[i].tanh();
            }
        }

        action_acc.into_iter().map(f32::tanh).collect()
    }
}

fn resolve_gene(gene: Gene, max_internal_neurons: usize) -> Option<Connection> {
    let source_id = match gene.source_type {
        EndpointType::External => gene.source_id as usize % NUM_SENSORS,
        EndpointType::Neuron => {
            if max_internal_neurons == 0 {
                return None;
            }
            gene.source_id as usize % max_internal_neurons
        }
    };

    let sink_id = match gene.sink_type {
        EndpointType::External => gene.sink_id as usize % NUM_ACTIONS,
        EndpointType::Neuron => {
            if max_internal_neurons == 0 {
                return None;
            }
            gene.sink_id as usize % max_internal_neurons
        }
    };

    Some(Connection {
        source_type: gene.source_type,
        source_id,
        sink_type: gene.sink_type,
        sink_id,
        weight: gene.weight_f(),
    })
}

/// Recomputes `driven` from scratch against `connections`: a neuron is
/// driven only if it is fed, directly or through a chain of already-driven
/// neurons, from a sensor. A connection whose sink is a neuron does not by
/// itself drive that neuron unless its own source is a sensor or a neuron
/// already known to be driven — otherwise a cycle with no sensor input
/// would mark every neuron in the cycle driven just by being someone's sink.
fn mark_driven(connections: &[Connection], neurons: &mut [Neuron]) {
    for n in neurons.iter_mut() {
        n.driven = false;
    }

    loop {
        let mut changed = false;
        for conn in connections {
            if !matches!(conn.sink_type, EndpointType::Neuron) || neurons[conn.sink_id].driven {
                continue;
            }
            let source_drives = match conn.source_type {
                EndpointType::External => true,
                EndpointType::Neuron => neurons[conn.source_id].driven,
            };
            if source_drives {
                neurons[conn.sink_id].driven = true;
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gene::EndpointType::{External, Neuron as N};

    fn gene(st: EndpointType, sid: u8, tt: EndpointType, tid: u8, w: i16) -> Gene {
        Gene {
            source_type: st,
            source_id: sid,
            sink_type: tt,
            sink_id: tid,
            weight: w,
        }
    }

    #[test]
    fn cycle_with_no_sensor_input_prunes_to_nothing() {
        // N0 -> N1 -> N2 -> N0, no sensor ever feeds any of them.
        let genome: Genome = vec![
            gene(N, 0, N, 1, 100),
            gene(N, 1, N, 2, 100),
            gene(N, 2, N, 0, 100),
        ];

        let net = NeuralNet::build(&genome, 3);
        assert!(net.connections.is_empty());
        assert!(net.neurons.iter().all(|n| !n.driven));
    }

    #[test]
    fn sensor_fed_neuron_chain_survives_pruning() {
        let genome: Genome = vec![
            gene(External, 0, N, 0, 8192),  // sensor0 -> neuron0
            gene(N, 0, External, 0, 8192), // neuron0 -> action0
        ];

        let net = NeuralNet::build(&genome, 1);
        assert_eq!(net.connections.len(), 2);
        assert!(net.neurons[0].driven);
    }

    #[test]
    fn build_is_idempotent() {
        let genome: Genome = vec![
            gene(External, 2, N, 1, 4096),
            gene(N, 1, N, 0, -4096),
            gene(N, 0, External, 3, 8192),
        ];

        let a = NeuralNet::build(&genome, 4);
        let b = NeuralNet::build(&genome, 4);
        assert_eq!(a.connections, b.connections);
        assert_eq!(a.neurons, b.neurons);
    }

    #[test]
    fn activate_produces_bounded_action_levels() {
        let genome: Genome = vec![
            gene(External, 0, External, 0, 16000),
            gene(External, 1, N, 0, 16000),
            gene(N, 0, External, 1, 16000),
        ];
        let mut net = NeuralNet::build(&genome, 2);
        let sensors = vec![1.0f32; NUM_SENSORS];
        let levels = net.activate(&sensors);

        assert_eq!(levels.len(), NUM_ACTIONS);
        assert!(levels.iter().all(|l| (-1.0..=1.0).contains(l)));
    }

    #[test]
    fn zero_internal_neurons_drops_neuron_genes() {
        let genome: Genome = vec![
            gene(N, 0, External, 0, 100),
            gene(External, 0, External, 1, 100),
        ];
        let net = NeuralNet::build(&genome, 0);
        assert_eq!(net.connections.len(), 1);
        assert!(net.neurons.is_empty());
    }
}
