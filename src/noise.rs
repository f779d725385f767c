//! Deterministic noise channels sampled over the unit sphere
//!
//! All channels are pure functions of (direction, seed): the same inputs
//! always produce the same outputs, with no hidden global state. Both the
//! inline and offloaded build paths share this one implementation.

use glam::Vec3;
use noise::{NoiseFn, Perlin, Seedable};

use crate::seeds::PlanetSeeds;

// =============================================================================
// NOISE PARAMETERS
// =============================================================================

/// Parameters for the fractal elevation sum
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NoiseParams {
    /// Number of elevation octaves
    pub octaves: u32,
    /// Amplitude decay per octave (0.0-1.0)
    pub persistence: f64,
    /// Frequency multiplier per octave
    pub lacunarity: f64,
    /// Redistribution exponent: `sign(n) * |n|^r` reshapes the field
    /// toward flatter (r > 1) or sharper (r < 1) terrain. 1.0 disables it.
    pub redistribution: f64,
}

impl Default for NoiseParams {
    fn default() -> Self {
        Self {
            octaves: 6,
            persistence: 0.5,
            lacunarity: 2.0,
            redistribution: 1.0,
        }
    }
}

/// Per-octave seed stride for the elevation bank
const OCTAVE_SEED_STRIDE: u64 = 1000;

/// Octave counts for the secondary channels
const CLIMATE_OCTAVES: u32 = 2;
const DETAIL_OCTAVES: u32 = 2;

/// Spatial scale factors. Temperature and moisture use different scales so
/// the two fields stay decorrelated.
const TEMPERATURE_SCALE: f64 = 1.8;
const MOISTURE_SCALE: f64 = 3.1;

/// Detail runs well above the base terrain frequency
const DETAIL_FREQUENCY: f64 = 6.0;

/// Color jitter is a single very high frequency octave
const JITTER_FREQUENCY: f64 = 24.0;

// =============================================================================
// NOISE FIELD
// =============================================================================

/// Seeded noise evaluator producing the elevation, temperature, moisture,
/// detail and jitter channels for one planet.
pub struct NoiseField {
    terrain: Vec<Perlin>,
    detail: Vec<Perlin>,
    temperature: Vec<Perlin>,
    moisture: Vec<Perlin>,
    jitter: Perlin,
    params: NoiseParams,
}

impl NoiseField {
    pub fn new(seeds: &PlanetSeeds) -> Self {
        Self::with_params(seeds, NoiseParams::default())
    }

    pub fn with_params(seeds: &PlanetSeeds, params: NoiseParams) -> Self {
        Self {
            terrain: octave_bank(seeds.terrain, params.octaves),
            detail: octave_bank(seeds.detail, DETAIL_OCTAVES),
            temperature: octave_bank(seeds.temperature, CLIMATE_OCTAVES),
            moisture: octave_bank(seeds.moisture, CLIMATE_OCTAVES),
            jitter: Perlin::new(1).set_seed(seeds.jitter as u32),
            params,
        }
    }

    /// Raw terrain elevation in roughly [-1, 1] for a unit direction.
    pub fn elevation(&self, dir: Vec3) -> f32 {
        let n = fbm(
            &self.terrain,
            dir,
            1.0,
            self.params.persistence,
            self.params.lacunarity,
        );
        let r = self.params.redistribution;
        let n = if r == 1.0 {
            n
        } else {
            n.signum() * n.abs().powf(r)
        };
        n as f32
    }

    /// Temperature in [0, 1].
    pub fn temperature(&self, dir: Vec3) -> f32 {
        let n = fbm(
            &self.temperature,
            dir,
            TEMPERATURE_SCALE,
            self.params.persistence,
            self.params.lacunarity,
        );
        (0.5 * (n + 1.0)).clamp(0.0, 1.0) as f32
    }

    /// Moisture in [0, 1].
    pub fn moisture(&self, dir: Vec3) -> f32 {
        let n = fbm(
            &self.moisture,
            dir,
            MOISTURE_SCALE,
            self.params.persistence,
            self.params.lacunarity,
        );
        (0.5 * (n + 1.0)).clamp(0.0, 1.0) as f32
    }

    /// High-frequency surface detail in roughly [-1, 1]. Callers weight it
    /// (the mesh synthesizer applies 0.05).
    pub fn detail(&self, dir: Vec3) -> f32 {
        fbm(
            &self.detail,
            dir,
            DETAIL_FREQUENCY,
            self.params.persistence,
            self.params.lacunarity,
        ) as f32
    }

    /// Color jitter channel in roughly [-1, 1].
    pub fn jitter(&self, dir: Vec3) -> f32 {
        let p = dir.as_dvec3() * JITTER_FREQUENCY;
        self.jitter.get([p.x, p.y, p.z]) as f32
    }
}

/// Build a bank of independently seeded Perlin generators.
/// Octave `i` is seeded `seed + i * 1000` so octaves decorrelate.
fn octave_bank(seed: u64, octaves: u32) -> Vec<Perlin> {
    (0..octaves as u64)
        .map(|i| Perlin::new(1).set_seed(seed.wrapping_add(i * OCTAVE_SEED_STRIDE) as u32))
        .collect()
}

/// Fractal sum over an octave bank, normalized by the amplitude sum so the
/// output stays in roughly [-1, 1].
fn fbm(bank: &[Perlin], dir: Vec3, scale: f64, persistence: f64, lacunarity: f64) -> f64 {
    let p = dir.as_dvec3() * scale;
    let mut total = 0.0;
    let mut amplitude = 1.0;
    let mut frequency = 1.0;
    let mut max_value = 0.0;

    for perlin in bank {
        total += amplitude * perlin.get([p.x * frequency, p.y * frequency, p.z * frequency]);
        max_value += amplitude;
        amplitude *= persistence;
        frequency *= lacunarity;
    }

    total / max_value
}
