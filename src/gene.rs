//! The packed-32-bit gene encoding and the genetic operators that act on a
//! [`Genome`] (an ordered sequence of genes).
//!
//! This plays the role the teacher crate's `RandomlyMutable` /
//! `CrossoverReproduction` traits play for an arbitrary genome type, but the
//! encoding itself is not generic: the spec pins the bit layout exactly, so
//! `Gene` is a concrete struct rather than an associated type.

use crate::rng::Prng;
use serde::{Deserialize, Serialize};

/// Which kind of endpoint a gene's source or sink names.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EndpointType {
    /// An internal neuron, addressed by `sourceId`/`sinkId` modulo
    /// `maxInternalNeurons` at network-build time.
    Neuron,
    /// A sensor (if used as a source) or action (if used as a sink).
    External,
}

/// A single gene in its structured (unpacked) form.
///
/// `source_id`/`sink_id` are the raw 7-bit IDs as carried in the genome; they
/// are only remapped into dense index spaces when a [`crate::network::NeuralNet`]
/// is built from a genome.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gene {
    pub source_type: EndpointType,
    pub source_id: u8,
    pub sink_type: EndpointType,
    pub sink_id: u8,
    /// Packed signed weight; real weight is `weight as f32 / 8192.0`.
    pub weight: i16,
}

const SOURCE_TYPE_BIT: u32 = 31;
const SOURCE_ID_SHIFT: u32 = 24;
const SOURCE_ID_MASK: u32 = 0x7F;
const SINK_TYPE_BIT: u32 = 23;
const SINK_ID_SHIFT: u32 = 16;
const SINK_ID_MASK: u32 = 0x7F;

impl Gene {
    /// Packs this gene into its 32-bit wire form.
    ///
    /// Layout: `[31 sourceType][30..24 sourceId][23 sinkType][22..16 sinkId][15..0 weight]`.
    pub fn pack(self) -> u32 {
        let mut w: u32 = 0;
        if matches!(self.source_type, EndpointType::External) {
            w |= 1 << SOURCE_TYPE_BIT;
        }
        w |= ((self.source_id as u32) & SOURCE_ID_MASK) << SOURCE_ID_SHIFT;
        if matches!(self.sink_type, EndpointType::External) {
            w |= 1 << SINK_TYPE_BIT;
        }
        w |= ((self.sink_id as u32) & SINK_ID_MASK) << SINK_ID_SHIFT;
        w |= (self.weight as u16) as u32;
        w
    }

    /// Unpacks a 32-bit wire value into a structured gene. Total bijection
    /// with [`Gene::pack`]: every 32-bit value round-trips.
    pub fn unpack(w: u32) -> Self {
        let source_type = if (w >> SOURCE_TYPE_BIT) & 1 == 1 {
            EndpointType::External
        } else {
            EndpointType::Neuron
        };
        let source_id = ((w >> SOURCE_ID_SHIFT) & SOURCE_ID_MASK) as u8;
        let sink_type = if (w >> SINK_TYPE_BIT) & 1 == 1 {
            EndpointType::External
        } else {
            EndpointType::Neuron
        };
        let sink_id = ((w >> SINK_ID_SHIFT) & SINK_ID_MASK) as u8;
        let weight = (w & 0xFFFF) as u16 as i16;

        Self {
            source_type,
            source_id,
            sink_type,
            sink_id,
            weight,
        }
    }

    /// The real-valued weight (`weight / 8192`).
    pub fn weight_f(self) -> f32 {
        self.weight as f32 / 8192.0
    }

    /// A uniformly random gene, drawn as a random 32-bit word through the codec.
    pub fn random(rng: &mut Prng) -> Self {
        Self::unpack(rng.next_u32())
    }

    /// Flips one uniformly-chosen bit among the 32 packed bits and returns
    /// the resulting gene.
    pub fn with_random_bit_flipped(self, rng: &mut Prng) -> Self {
        let bit = rng.next_int(32);
        Self::unpack(self.pack() ^ (1u32 << bit))
    }
}

/// An ordered sequence of genes. Length is expected to stay within
/// `[1, genomeMaxLength]`, enforced by the operators below rather than by
/// the type itself.
pub type Genome = Vec<Gene>;

/// Builds `n` genes from uniformly random 32-bit words via the codec.
pub fn make_random_genome(n: usize, rng: &mut Prng) -> Genome {
    (0..n).map(|_| Gene::random(rng)).collect()
}

/// For each gene independently with probability `rate`, flips a uniformly
/// chosen bit among its 32 packed bits.
pub fn apply_point_mutations(genome: &mut Genome, rate: f64, rng: &mut Prng) {
    for gene in genome.iter_mut() {
        if rng.chance(rate) {
            *gene = gene.with_random_bit_flipped(rng);
        }
    }
}

/// With probability `rate`, either deletes a random gene (if the genome has
/// more than one gene) with probability `deletion_ratio`, else inserts a
/// random gene at a random position (if the genome is shorter than
/// `max_len`). At most one insertion-or-deletion happens per call.
pub fn apply_insertion_deletion(
    genome: &mut Genome,
    rate: f64,
    deletion_ratio: f64,
    max_len: usize,
    rng: &mut Prng,
) {
    if !rng.chance(rate) {
        return;
    }

    if rng.chance(deletion_ratio) {
        if genome.len() > 1 {
            let i = rng.next_int(genome.len() as u32) as usize;
            genome.remove(i);
        }
    } else if genome.len() < max_len {
        let i = rng.next_int(genome.len() as u32 + 1) as usize;
        genome.insert(i, Gene::random(rng));
    }
}

/// Single-point crossover. Cuts `p1` at a random index `c1` and `p2` at a
/// random index `c2`, chosen independently, and concatenates
/// `p1[0..c1] ++ p2[c2+1..]`.
///
/// If either parent is empty, the other is cloned outright. If the result
/// would be empty, a fresh one-gene random genome is returned instead.
pub fn crossover(p1: &Genome, p2: &Genome, rng: &mut Prng) -> Genome {
    if p1.is_empty() {
        return p2.clone();
    }
    if p2.is_empty() {
        return p1.clone();
    }

    let c1 = rng.next_int(p1.len() as u32) as usize;
    let c2 = rng.next_int(p2.len() as u32) as usize;

    let mut child: Genome = p1[..c1].to_vec();
    child.extend_from_slice(&p2[c2 + 1..]);

    if child.is_empty() {
        return make_random_genome(1, rng);
    }

    child
}

/// Jaccard similarity on the sets of packed 32-bit gene values.
///
/// Both empty genomes are defined as fully similar (`1.0`); exactly one
/// empty genome is defined as fully dissimilar (`0.0`).
pub fn genome_similarity(g1: &Genome, g2: &Genome) -> f64 {
    if g1.is_empty() && g2.is_empty() {
        return 1.0;
    }
    if g1.is_empty() || g2.is_empty() {
        return 0.0;
    }

    use std::collections::HashSet;
    let s1: HashSet<u32> = g1.iter().map(|g| g.pack()).collect();
    let s2: HashSet<u32> = g2.iter().map(|g| g.pack()).collect();

    let intersection = s1.intersection(&s2).count();
    let union = s1.union(&s2).count();

    if union == 0 {
        1.0
    } else {
        intersection as f64 / union as f64
    }
}

/// Mean of `1 - similarity` over `k` sampled distinct index pairs from
/// `population`. Returns `0.0` if fewer than two genomes are present.
///
/// Pair *selection* stays strictly serial — each draw consumes the shared
/// PRNG, so the sequence is part of the reproducible stream — but once the
/// pairs are fixed, summing `1 - similarity` over them is pure and
/// independent per pair; with the `parallel` feature that sum fans out
/// across `rayon`'s pool instead of folding sequentially.
pub fn genetic_diversity(population: &[Genome], k: usize, rng: &mut Prng) -> f64 {
    if population.len() < 2 {
        return 0.0;
    }

    let pairs: Vec<(usize, usize)> = (0..k)
        .map(|_| {
            let i = rng.next_int(population.len() as u32) as usize;
            let mut j = rng.next_int(population.len() as u32) as usize;
            if j == i {
                j = (j + 1) % population.len();
            }
            (i, j)
        })
        .collect();

    if pairs.is_empty() {
        return 0.0;
    }

    sum_dissimilarity(population, &pairs) / pairs.len() as f64
}

#[cfg(feature = "parallel")]
fn sum_dissimilarity(population: &[Genome], pairs: &[(usize, usize)]) -> f64 {
    use rayon::prelude::*;
    pairs
        .par_iter()
        .map(|&(i, j)| 1.0 - genome_similarity(&population[i], &population[j]))
        .sum()
}

#[cfg(not(feature = "parallel"))]
fn sum_dissimilarity(population: &[Genome], pairs: &[(usize, usize)]) -> f64 {
    pairs
        .iter()
        .map(|&(i, j)| 1.0 - genome_similarity(&population[i], &population[j]))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codec_is_a_total_bijection() {
        for w in [0u32, 1, 0xFFFF_FFFF, 0x8000_0000, 0x0000_FFFF, 0xDEAD_BEEF] {
            assert_eq!(Gene::unpack(w).pack(), w);
        }

        let mut rng = Prng::new(5);
        for _ in 0..10_000 {
            let w = rng.next_u32();
            assert_eq!(Gene::unpack(w).pack(), w);
        }
    }

    #[test]
    fn weight_sign_matches_spec_examples() {
        assert_eq!(Gene::unpack(0x0000_FFFF).weight, -1);
        assert_eq!(Gene::unpack(0x0000_8000).weight, -32768);
        assert_eq!(Gene::unpack(0x0000_7FFF).weight, 32767);
    }

    #[test]
    fn pack_example_from_spec() {
        let gene = Gene {
            source_type: EndpointType::External,
            source_id: 0x7F,
            sink_type: EndpointType::Neuron,
            sink_id: 0x7F,
            weight: -1,
        };
        assert_eq!(gene.pack(), 0xFF7F_FFFF);
    }

    #[test]
    fn similarity_bounds_and_symmetry() {
        let mut rng = Prng::new(3);
        let g1 = make_random_genome(8, &mut rng);
        let g2 = make_random_genome(8, &mut rng);

        assert_eq!(genome_similarity(&g1, &g1), 1.0);
        assert!((0.0..=1.0).contains(&genome_similarity(&g1, &g2)));
        assert_eq!(genome_similarity(&g1, &g2), genome_similarity(&g2, &g1));

        let empty: Genome = vec![];
        assert_eq!(genome_similarity(&empty, &empty), 1.0);
        assert_eq!(genome_similarity(&g1, &empty), 0.0);
    }

    #[test]
    fn crossover_handles_empty_parents() {
        let mut rng = Prng::new(4);
        let g1 = make_random_genome(3, &mut rng);
        let empty: Genome = vec![];

        assert_eq!(crossover(&empty, &g1, &mut rng), g1);
        assert_eq!(crossover(&g1, &empty, &mut rng), g1);
    }

    #[test]
    fn insertion_deletion_respects_max_len_and_min_len() {
        let mut rng = Prng::new(6);
        let mut genome = make_random_genome(1, &mut rng);

        // length 1 must never drop to 0 via deletion
        for _ in 0..1000 {
            apply_insertion_deletion(&mut genome, 1.0, 1.0, 16, &mut rng);
            assert!(!genome.is_empty());
        }

        let mut genome = make_random_genome(16, &mut rng);
        for _ in 0..1000 {
            apply_insertion_deletion(&mut genome, 1.0, 0.0, 16, &mut rng);
            assert!(genome.len() <= 16);
        }
    }
}
