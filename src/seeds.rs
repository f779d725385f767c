//! Seed management for planet generation
//!
//! Provides separate seeds for each generation channel, allowing fine-grained
//! control over which aspects of a planet to vary or keep constant.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Seeds for all planet generation channels.
///
/// Each channel gets its own seed, derived from a master seed by default,
/// so the elevation, climate and placement fields stay decorrelated.
#[derive(Clone, Copy, Debug)]
pub struct PlanetSeeds {
    /// Master seed (used for display/reference)
    pub master: u64,
    /// Terrain elevation field (base fractal octaves)
    pub terrain: u64,
    /// High-frequency surface detail
    pub detail: u64,
    /// Temperature channel
    pub temperature: u64,
    /// Moisture channel
    pub moisture: u64,
    /// Per-vertex color jitter
    pub jitter: u64,
    /// Vegetation placement chance
    pub vegetation: u64,
}

impl PlanetSeeds {
    /// Create seeds from a master seed, deriving all sub-seeds deterministically.
    pub fn from_master(master: u64) -> Self {
        Self {
            master,
            terrain: derive_seed(master, "terrain"),
            detail: derive_seed(master, "detail"),
            temperature: derive_seed(master, "temperature"),
            moisture: derive_seed(master, "moisture"),
            jitter: derive_seed(master, "jitter"),
            vegetation: derive_seed(master, "vegetation"),
        }
    }
}

impl Default for PlanetSeeds {
    fn default() -> Self {
        Self::from_master(rand::random())
    }
}

/// Derive a sub-seed from a master seed and a channel name.
/// Uses hashing to ensure different channels get different but deterministic seeds.
fn derive_seed(master: u64, channel: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    master.hash(&mut hasher);
    channel.hash(&mut hasher);
    hasher.finish()
}

impl std::fmt::Display for PlanetSeeds {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "PlanetSeeds {{ master: {}, terrain: {}, detail: {}, temperature: {}, \
             moisture: {}, jitter: {}, vegetation: {} }}",
            self.master,
            self.terrain,
            self.detail,
            self.temperature,
            self.moisture,
            self.jitter,
            self.vegetation,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deterministic_derivation() {
        let seeds1 = PlanetSeeds::from_master(12345);
        let seeds2 = PlanetSeeds::from_master(12345);

        assert_eq!(seeds1.terrain, seeds2.terrain);
        assert_eq!(seeds1.temperature, seeds2.temperature);
        assert_eq!(seeds1.vegetation, seeds2.vegetation);
    }

    #[test]
    fn test_different_channels_get_different_seeds() {
        let seeds = PlanetSeeds::from_master(12345);

        // Each channel should get a unique seed
        assert_ne!(seeds.terrain, seeds.detail);
        assert_ne!(seeds.temperature, seeds.moisture);
        assert_ne!(seeds.jitter, seeds.vegetation);
    }

    #[test]
    fn test_different_masters_diverge() {
        let a = PlanetSeeds::from_master(1);
        let b = PlanetSeeds::from_master(2);
        assert_ne!(a.terrain, b.terrain);
    }
}
