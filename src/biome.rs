//! Biome classification and surface color derivation
//!
//! Maps (elevation, temperature, moisture) to a discrete biome and a display
//! color. Classification is ordered: water tiers win first, then temperature
//! bands branch on moisture thresholds.

use serde::{Deserialize, Serialize};

use crate::options::{Color, PlanetOptions};

// =============================================================================
// CLASSIFICATION THRESHOLDS
// =============================================================================

/// Width of the beach band above the water level
const BEACH_BAND: f32 = 0.01;

/// Temperature drop per unit of elevation above the water level
const LAPSE_RATE: f32 = 0.7;

/// Absolute elevation above which the cold band is always snow
const SNOWLINE_ELEVATION: f32 = 0.7;

// =============================================================================
// BIOME
// =============================================================================

/// Discrete terrain/vegetation category.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Biome {
    Ocean,
    Beach,
    Desert,
    Savanna,
    Rainforest,
    Grassland,
    Forest,
    Swamp,
    Tundra,
    Mountains,
    Snow,
}

impl Biome {
    pub fn all() -> &'static [Self] {
        &[
            Self::Ocean,
            Self::Beach,
            Self::Desert,
            Self::Savanna,
            Self::Rainforest,
            Self::Grassland,
            Self::Forest,
            Self::Swamp,
            Self::Tundra,
            Self::Mountains,
            Self::Snow,
        ]
    }

    /// Whether vegetation placement points may land on this biome.
    pub fn supports_trees(&self) -> bool {
        matches!(
            self,
            Self::Savanna | Self::Rainforest | Self::Grassland | Self::Forest | Self::Swamp
        )
    }
}

impl std::fmt::Display for Biome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ocean => write!(f, "ocean"),
            Self::Beach => write!(f, "beach"),
            Self::Desert => write!(f, "desert"),
            Self::Savanna => write!(f, "savanna"),
            Self::Rainforest => write!(f, "rainforest"),
            Self::Grassland => write!(f, "grassland"),
            Self::Forest => write!(f, "forest"),
            Self::Swamp => write!(f, "swamp"),
            Self::Tundra => write!(f, "tundra"),
            Self::Mountains => write!(f, "mountains"),
            Self::Snow => write!(f, "snow"),
        }
    }
}

// =============================================================================
// CLASSIFICATION
// =============================================================================

/// Classify one surface point. Ordered, first match wins. Returns the biome
/// and the lapse-rate adjusted temperature used for the land branches.
pub fn classify(
    elevation: f32,
    temperature: f32,
    moisture: f32,
    water_level: f32,
) -> (Biome, f32) {
    if elevation <= water_level {
        return (Biome::Ocean, temperature);
    }
    if elevation < water_level + BEACH_BAND {
        return (Biome::Beach, temperature);
    }

    // Higher terrain is colder: pull temperature down before banding
    let t = temperature - (elevation - water_level).max(0.0) * LAPSE_RATE;

    let biome = if t > 0.7 {
        // Hot band
        if moisture < 0.2 {
            Biome::Desert
        } else if moisture < 0.55 {
            Biome::Savanna
        } else {
            Biome::Rainforest
        }
    } else if t > 0.4 {
        // Warm band
        if moisture < 0.3 {
            Biome::Grassland
        } else if moisture < 0.65 {
            Biome::Forest
        } else {
            Biome::Swamp
        }
    } else if t > 0.2 {
        // Cool band
        if moisture < 0.3 {
            Biome::Mountains
        } else if moisture < 0.6 {
            Biome::Forest
        } else {
            Biome::Tundra
        }
    } else {
        // Cold band: peaks are snow no matter how dry
        if elevation > SNOWLINE_ELEVATION {
            Biome::Snow
        } else if moisture < 0.4 {
            Biome::Tundra
        } else if moisture < 0.7 {
            Biome::Mountains
        } else {
            Biome::Snow
        }
    };

    (biome, t)
}

// =============================================================================
// COLOR DERIVATION
// =============================================================================

const SAND: Color = Color::new(0.76, 0.70, 0.50);
const SAND_HOT: Color = Color::new(0.80, 0.62, 0.38);
const DEEP_GREEN: Color = Color::new(0.05, 0.25, 0.10);
const MURK: Color = Color::new(0.20, 0.25, 0.12);
const DRY_GRASS: Color = Color::new(0.65, 0.60, 0.30);
const TUNDRA_BASE: Color = Color::new(0.55, 0.55, 0.48);
const ROCK_GRAY: Color = Color::new(0.55, 0.55, 0.55);

/// Strength of the noise-driven color jitter
const JITTER_AMPLITUDE: f32 = 0.1;

/// Base color for a classified point, before jitter. Several biomes blend
/// between two colors using moisture, temperature, or the normalized
/// elevation-above-water fraction.
pub fn biome_color(
    biome: Biome,
    elevation: f32,
    temperature: f32,
    moisture: f32,
    options: &PlanetOptions,
) -> Color {
    let water_level = options.water_level;
    match biome {
        Biome::Ocean => {
            let depth = ((water_level - elevation) / water_level.max(1e-6)).clamp(0.0, 1.0);
            options.water_color.lerp(options.water_color.scale(0.35), depth)
        }
        Biome::Beach => SAND.lerp(options.land_color, moisture * 0.3),
        Biome::Desert => SAND.lerp(SAND_HOT, temperature),
        Biome::Savanna => options.land_color.lerp(DRY_GRASS, 1.0 - moisture),
        Biome::Rainforest => options.land_color.lerp(DEEP_GREEN, moisture),
        Biome::Grassland => options.land_color,
        Biome::Forest => options.land_color.scale(0.75),
        Biome::Swamp => options.land_color.lerp(MURK, moisture),
        Biome::Tundra => TUNDRA_BASE.lerp(options.snow_color, 1.0 - temperature),
        Biome::Mountains => {
            let height = ((elevation - water_level) / (1.0 - water_level).max(1e-6))
                .clamp(0.0, 1.0);
            options.mountain_color.lerp(ROCK_GRAY, height)
        }
        Biome::Snow => options.snow_color,
    }
}

/// Final surface color: biome color plus a low-amplitude jitter applied
/// uniformly to all channels to break up flat color bands. `jitter_noise`
/// is expected in [-1, 1].
pub fn surface_color(
    biome: Biome,
    elevation: f32,
    temperature: f32,
    moisture: f32,
    jitter_noise: f32,
    options: &PlanetOptions,
) -> Color {
    biome_color(biome, elevation, temperature, moisture, options)
        .jitter(jitter_noise * JITTER_AMPLITUDE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_below_water_is_always_ocean() {
        for &wl in &[0.0, 0.2, 0.4, 0.9] {
            for i in 0..=20 {
                let e = -1.0 + (wl + 1.0) * i as f32 / 20.0;
                let (biome, _) = classify(e, 0.5, 0.5, wl);
                assert_eq!(biome, Biome::Ocean, "e={e} wl={wl}");
            }
        }
    }

    #[test]
    fn test_beach_band_just_above_water() {
        let (biome, _) = classify(0.405, 0.5, 0.5, 0.4);
        assert_eq!(biome, Biome::Beach);
    }

    #[test]
    fn test_cold_peak_is_snow_regardless_of_moisture() {
        for &m in &[0.0, 0.3, 0.6, 1.0] {
            let (biome, _) = classify(0.95, 0.1, m, 0.4);
            assert_eq!(biome, Biome::Snow, "moisture={m}");
        }
    }

    #[test]
    fn test_hot_dry_is_desert() {
        let (biome, t) = classify(0.45, 0.9, 0.1, 0.4);
        assert_eq!(biome, Biome::Desert);
        assert!(t < 0.9, "lapse rate should have lowered temperature");
    }

    #[test]
    fn test_hot_wet_is_rainforest() {
        let (biome, _) = classify(0.42, 0.9, 0.8, 0.4);
        assert_eq!(biome, Biome::Rainforest);
    }

    #[test]
    fn test_classification_is_total() {
        // Exactly one biome for every input combination on a coarse grid
        for ei in 0..=20 {
            let e = -1.0 + 2.0 * ei as f32 / 20.0;
            for ti in 0..=10 {
                let t = ti as f32 / 10.0;
                for mi in 0..=10 {
                    let m = mi as f32 / 10.0;
                    for &wl in &[0.0, 0.4, 1.0] {
                        let (biome, _) = classify(e, t, m, wl);
                        assert!(Biome::all().contains(&biome));
                    }
                }
            }
        }
    }

    #[test]
    fn test_adjusted_temperature_unchanged_in_water() {
        let (_, t) = classify(0.1, 0.8, 0.5, 0.4);
        assert_eq!(t, 0.8);
    }

    #[test]
    fn test_mountain_color_grays_with_height() {
        let opts = PlanetOptions::default();
        let low = biome_color(Biome::Mountains, 0.45, 0.3, 0.2, &opts);
        let high = biome_color(Biome::Mountains, 0.99, 0.3, 0.2, &opts);
        // The high sample should sit closer to the gray target
        let d_low = (low.r - ROCK_GRAY.r).abs() + (low.g - ROCK_GRAY.g).abs();
        let d_high = (high.r - ROCK_GRAY.r).abs() + (high.g - ROCK_GRAY.g).abs();
        assert!(d_high < d_low);
    }

    #[test]
    fn test_ocean_darkens_with_depth() {
        let opts = PlanetOptions::default();
        let shallow = biome_color(Biome::Ocean, 0.39, 0.5, 0.5, &opts);
        let deep = biome_color(Biome::Ocean, -0.8, 0.5, 0.5, &opts);
        assert!(deep.r <= shallow.r && deep.g <= shallow.g && deep.b <= shallow.b);
    }

    #[test]
    fn test_surface_color_stays_in_unit_range() {
        let opts = PlanetOptions::default();
        for &j in &[-1.0, -0.5, 0.0, 0.5, 1.0] {
            let c = surface_color(Biome::Snow, 0.9, 0.1, 0.5, j, &opts);
            for ch in [c.r, c.g, c.b] {
                assert!((0.0..=1.0).contains(&ch));
            }
        }
    }

    #[test]
    fn test_tree_support_excludes_water_and_rock() {
        assert!(!Biome::Ocean.supports_trees());
        assert!(!Biome::Mountains.supports_trees());
        assert!(!Biome::Snow.supports_trees());
        assert!(Biome::Forest.supports_trees());
        assert!(Biome::Grassland.supports_trees());
    }
}
