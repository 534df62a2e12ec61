//! Whole-simulator scenarios that need the full `Simulator` wired up rather
//! than a single module's internals.

use evolution_core::barriers::BarrierType;
use evolution_core::config::SimParams;
use evolution_core::coord::Coord;
use evolution_core::gene::Gene;
use evolution_core::network::NeuralNet;
use evolution_core::simulator::Simulator;
use evolution_core::survival::SurvivalCriterion;

fn tiny_config() -> SimParams {
    let mut c = SimParams::default();
    c.population = 4;
    c.size_x = 8;
    c.size_y = 8;
    c.steps_per_generation = 5;
    c.rng_seed = 1;
    c
}

#[test]
fn empty_population_zero_steps_leaves_grid_and_signals_clean() {
    let mut config = tiny_config();
    config.population = 0;
    config.size_x = 8;
    config.size_y = 8;
    config.steps_per_generation = 1;
    config.barrier_type = BarrierType::None;
    config.rng_seed = 1;

    let mut sim = Simulator::new(config).unwrap();
    sim.step_once();

    for x in 0..8 {
        for y in 0..8 {
            assert_eq!(sim.grid().at(Coord::new(x, y)), 0);
            assert_eq!(sim.signals().at(0, Coord::new(x, y)), 0);
        }
    }
    assert_eq!(sim.sim_step(), 1);
}

#[test]
fn gene_codec_bijection_holds_for_documented_weight_boundaries() {
    assert_eq!(Gene::unpack(0x0000_FFFF).weight, -1);
    assert_eq!(Gene::unpack(0x0000_8000).weight, -32768);
    assert_eq!(Gene::unpack(0x0000_7FFF).weight, 32767);

    for w in [0u32, 1, 0x7FFF_FFFF, 0xFFFF_FFFF, 0x1234_5678] {
        let gene = Gene::unpack(w);
        assert_eq!(gene.pack(), w);
    }
}

#[test]
fn placement_is_deterministic_across_resets() {
    let mut config = SimParams::default();
    config.population = 4;
    config.size_x = 4;
    config.size_y = 4;
    config.rng_seed = 1;

    let mut sim = Simulator::new(config.clone()).unwrap();
    let first: Vec<Coord> = sim.agents().iter().map(|a| a.loc).collect();

    sim.reset(Some(config)).unwrap();
    let second: Vec<Coord> = sim.agents().iter().map(|a| a.loc).collect();

    assert_eq!(first, second);
}

#[test]
fn pruning_drops_a_cycle_of_internal_neurons_with_no_sensor_input() {
    use evolution_core::gene::EndpointType::Neuron;

    let genome = vec![
        Gene {
            source_type: Neuron,
            source_id: 0,
            sink_type: Neuron,
            sink_id: 1,
            weight: 100,
        },
        Gene {
            source_type: Neuron,
            source_id: 1,
            sink_type: Neuron,
            sink_id: 2,
            weight: 100,
        },
        Gene {
            source_type: Neuron,
            source_id: 2,
            sink_type: Neuron,
            sink_id: 0,
            weight: 100,
        },
    ];

    let net = NeuralNet::build(&genome, 3);
    assert!(net.connections.is_empty());
    assert!(net.neurons.iter().all(|n| !n.driven));
}

#[test]
fn left_eighth_survival_keeps_exactly_the_agents_near_the_left_edge() {
    let mut config = SimParams::default();
    config.population = 16;
    config.size_x = 16;
    config.size_y = 8;
    config.steps_per_generation = 1;
    config.max_number_neurons = 0;
    config.survival_criteria = vec![SurvivalCriterion::LeftEighth];
    config.barrier_type = BarrierType::None;
    config.rng_seed = 7;

    let mut sim = Simulator::new(config).unwrap();
    let stats = sim.run_generation();

    let expected_survivors = sim.agents().iter().filter(|a| a.loc.x < 2).count();
    assert_eq!(stats.survivors, expected_survivors);
}

#[test]
fn signal_cells_stay_in_byte_range_across_a_full_generation_of_live_agents() {
    let mut config = SimParams::default();
    config.population = 20;
    config.size_x = 16;
    config.size_y = 16;
    config.barrier_type = BarrierType::None;
    config.signal_layers = 1;
    config.steps_per_generation = 60;
    config.rng_seed = 3;

    let mut sim = Simulator::new(config).unwrap();
    for _ in 0..60 {
        sim.step_once();
        let bytes = sim.signals().to_bytes(0);
        assert_eq!(bytes.len(), 16 * 16);
    }
    assert_eq!(sim.sim_step(), 60);
}

#[test]
fn two_simulators_with_the_same_seed_stay_bitwise_identical_across_generations() {
    let mut config = tiny_config();
    config.survival_criteria = vec![SurvivalCriterion::RightEighth];

    let mut a = Simulator::new(config.clone()).unwrap();
    let mut b = Simulator::new(config).unwrap();

    for _ in 0..4 {
        a.run_generation();
        b.run_generation();
    }

    assert_eq!(a.grid().to_bytes(), b.grid().to_bytes());
    assert_eq!(a.signals().to_bytes(0), b.signals().to_bytes(0));
    assert_eq!(a.history(), b.history());
}
