//! Simulation configuration: every option listed in `SPEC_FULL.md` section 6,
//! plus the concrete defaults this implementation picked for the numeric
//! knobs the spec leaves open (see `DESIGN.md`).

use serde::{Deserialize, Serialize};

use crate::barriers::BarrierType;
use crate::survival::SurvivalCriterion;

/// Full simulation configuration. Constructed once at `init`/`reset` and
/// merged against with [`SimParamsPatch`] for `updateParams`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimParams {
    pub population: usize,
    pub steps_per_generation: u32,
    pub max_generations: u32,
    pub size_x: i32,
    pub size_y: i32,
    pub genome_initial_length_min: usize,
    pub genome_initial_length_max: usize,
    pub genome_max_length: usize,
    pub max_number_neurons: usize,
    pub point_mutation_rate: f64,
    pub gene_insertion_deletion_rate: f64,
    pub deletion_ratio: f64,
    pub sexual_reproduction: bool,
    pub choose_parents_by_fitness: bool,
    pub survival_criteria: Vec<SurvivalCriterion>,
    pub barrier_type: BarrierType,
    pub responsiveness_curve_k_factor: f64,
    pub signal_layers: usize,
    pub signal_sensor_radius: f64,
    pub long_probe_distance: u32,
    pub short_probe_barrier_distance: u32,
    pub kill_enable: bool,
    pub rng_seed: u32,
    pub population_sensor_radius: f64,
}

impl Default for SimParams {
    fn default() -> Self {
        Self {
            population: 200,
            steps_per_generation: 300,
            max_generations: 200,
            size_x: 128,
            size_y: 128,
            genome_initial_length_min: 16,
            genome_initial_length_max: 32,
            genome_max_length: 64,
            max_number_neurons: 8,
            point_mutation_rate: 0.001,
            gene_insertion_deletion_rate: 0.0,
            deletion_ratio: 0.5,
            sexual_reproduction: true,
            choose_parents_by_fitness: false,
            survival_criteria: vec![SurvivalCriterion::RightEighth],
            barrier_type: BarrierType::None,
            responsiveness_curve_k_factor: 2.0,
            signal_layers: 1,
            signal_sensor_radius: 1.5,
            long_probe_distance: 16,
            short_probe_barrier_distance: 4,
            kill_enable: false,
            rng_seed: 0,
            population_sensor_radius: 2.5,
        }
    }
}

impl SimParams {
    /// Rejects configurations the spec calls out as invalid input: non-positive
    /// sizes/counts, or negative rates. Reset/`init` must keep the previous
    /// state when this fails.
    pub fn validate(&self) -> Result<(), crate::error::SimError> {
        // `population == 0` is a deliberately valid edge case (scenario S1:
        // an empty world still inits and steps cleanly), so only sizes,
        // step counts, and rates are checked for positivity here.
        if self.size_x <= 0 || self.size_y <= 0 {
            return Err(crate::error::SimError::InvalidConfig(
                "size_x and size_y must be > 0".into(),
            ));
        }
        if self.steps_per_generation == 0 {
            return Err(crate::error::SimError::InvalidConfig(
                "steps_per_generation must be > 0".into(),
            ));
        }
        if self.genome_initial_length_min == 0
            || self.genome_initial_length_min > self.genome_initial_length_max
        {
            return Err(crate::error::SimError::InvalidConfig(
                "genome_initial_length_min must be > 0 and <= genome_initial_length_max".into(),
            ));
        }
        if self.genome_max_length == 0 || self.genome_max_length < self.genome_initial_length_max {
            return Err(crate::error::SimError::InvalidConfig(
                "genome_max_length must be > 0 and >= genome_initial_length_max".into(),
            ));
        }
        if self.long_probe_distance == 0 {
            return Err(crate::error::SimError::InvalidConfig(
                "long_probe_distance must be > 0".into(),
            ));
        }
        if self.short_probe_barrier_distance == 0 {
            return Err(crate::error::SimError::InvalidConfig(
                "short_probe_barrier_distance must be > 0".into(),
            ));
        }
        if self.point_mutation_rate < 0.0
            || self.gene_insertion_deletion_rate < 0.0
            || self.deletion_ratio < 0.0
        {
            return Err(crate::error::SimError::InvalidConfig(
                "mutation/deletion rates must be non-negative".into(),
            ));
        }
        if self.signal_layers == 0 {
            return Err(crate::error::SimError::InvalidConfig(
                "signal_layers must be > 0".into(),
            ));
        }
        Ok(())
    }
}

/// All-`Option` mirror of [`SimParams`] for `updateParams`: only the fields
/// present are merged into the live configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SimParamsPatch {
    pub population: Option<usize>,
    pub steps_per_generation: Option<u32>,
    pub max_generations: Option<u32>,
    pub size_x: Option<i32>,
    pub size_y: Option<i32>,
    pub genome_initial_length_min: Option<usize>,
    pub genome_initial_length_max: Option<usize>,
    pub genome_max_length: Option<usize>,
    pub max_number_neurons: Option<usize>,
    pub point_mutation_rate: Option<f64>,
    pub gene_insertion_deletion_rate: Option<f64>,
    pub deletion_ratio: Option<f64>,
    pub sexual_reproduction: Option<bool>,
    pub choose_parents_by_fitness: Option<bool>,
    pub survival_criteria: Option<Vec<SurvivalCriterion>>,
    pub barrier_type: Option<BarrierType>,
    pub responsiveness_curve_k_factor: Option<f64>,
    pub signal_layers: Option<usize>,
    pub signal_sensor_radius: Option<f64>,
    pub long_probe_distance: Option<u32>,
    pub short_probe_barrier_distance: Option<u32>,
    pub kill_enable: Option<bool>,
    pub rng_seed: Option<u32>,
    pub population_sensor_radius: Option<f64>,
}

impl SimParamsPatch {
    /// Whether applying this patch would change the grid shape or barrier
    /// layout, which `updateParams` documents as requiring a `reset`.
    pub fn requires_reset(&self, current: &SimParams) -> bool {
        self.size_x.is_some_and(|v| v != current.size_x)
            || self.size_y.is_some_and(|v| v != current.size_y)
            || self.barrier_type.as_ref().is_some_and(|v| *v != current.barrier_type)
    }

    /// Merges the present fields onto `base`, returning the merged result.
    pub fn apply(&self, base: &SimParams) -> SimParams {
        let mut merged = base.clone();
        macro_rules! merge {
            ($field:ident) => {
                if let Some(v) = self.$field.clone() {
                    merged.$field = v;
                }
            };
        }
        merge!(population);
        merge!(steps_per_generation);
        merge!(max_generations);
        merge!(size_x);
        merge!(size_y);
        merge!(genome_initial_length_min);
        merge!(genome_initial_length_max);
        merge!(genome_max_length);
        merge!(max_number_neurons);
        merge!(point_mutation_rate);
        merge!(gene_insertion_deletion_rate);
        merge!(deletion_ratio);
        merge!(sexual_reproduction);
        merge!(choose_parents_by_fitness);
        merge!(survival_criteria);
        merge!(barrier_type);
        merge!(responsiveness_curve_k_factor);
        merge!(signal_layers);
        merge!(signal_sensor_radius);
        merge!(long_probe_distance);
        merge!(short_probe_barrier_distance);
        merge!(kill_enable);
        merge!(rng_seed);
        merge!(population_sensor_radius);
        merged
    }
}
