//! Planet build configuration
//!
//! `PlanetOptions` is created once per build and never mutated afterward; a
//! new build constructs a fresh set. Validation runs before any mesh work so
//! bad input is rejected synchronously, not mid-computation.

use serde::{Deserialize, Serialize};

use crate::error::PlanetError;

// =============================================================================
// RESOLUTION BOUNDS
// =============================================================================

/// Minimum edge-segment resolution per icosahedron face
pub const MIN_RESOLUTION: u32 = 8;

/// Maximum edge-segment resolution per icosahedron face
pub const MAX_RESOLUTION: u32 = 64;

// =============================================================================
// COLOR
// =============================================================================

/// RGB color with channels in [0.0, 1.0].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Linear interpolation between two colors.
    pub fn lerp(self, other: Color, t: f32) -> Color {
        let t = t.clamp(0.0, 1.0);
        Color {
            r: self.r + (other.r - self.r) * t,
            g: self.g + (other.g - self.g) * t,
            b: self.b + (other.b - self.b) * t,
        }
    }

    /// Scale all channels by a factor (no clamping).
    pub fn scale(self, factor: f32) -> Color {
        Color {
            r: self.r * factor,
            g: self.g * factor,
            b: self.b * factor,
        }
    }

    /// Add the same offset to every channel, clamping each to [0, 1].
    pub fn jitter(self, offset: f32) -> Color {
        Color {
            r: (self.r + offset).clamp(0.0, 1.0),
            g: (self.g + offset).clamp(0.0, 1.0),
            b: (self.b + offset).clamp(0.0, 1.0),
        }
    }

    /// Convert to 8-bit RGB for image export.
    pub fn to_rgb8(self) -> [u8; 3] {
        [
            (self.r.clamp(0.0, 1.0) * 255.0) as u8,
            (self.g.clamp(0.0, 1.0) * 255.0) as u8,
            (self.b.clamp(0.0, 1.0) * 255.0) as u8,
        ]
    }

    fn is_finite(self) -> bool {
        self.r.is_finite() && self.g.is_finite() && self.b.is_finite()
    }
}

// =============================================================================
// PLANET OPTIONS
// =============================================================================

/// Immutable per-build configuration for planet synthesis.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlanetOptions {
    /// Sphere radius in world units (must be positive and finite)
    pub radius: f32,
    /// Edge segments per icosahedron face (8-64).
    /// Vertex count is `10 * resolution^2 + 2`.
    pub resolution: u32,
    /// Master seed for all noise channels
    pub seed: u64,
    /// Sea level as an elevation threshold in [0, 1]
    pub water_level: f32,
    /// Build the ocean shell
    pub has_ocean: bool,
    /// Build the atmosphere shell
    pub has_atmosphere: bool,
    /// Plan vegetation placement points
    pub has_vegetation: bool,
    /// Base water color
    pub water_color: Color,
    /// Base lowland color
    pub land_color: Color,
    /// Base mountain color
    pub mountain_color: Color,
    /// Snow/ice color
    pub snow_color: Color,
    /// Atmosphere shell color
    pub atmosphere_color: Color,
    /// Chance in [0, 1] that a qualifying vertex receives a placement point
    pub vegetation_density: f32,
    /// Lowest elevation where trees may grow
    pub min_tree_elevation: f32,
    /// Highest elevation where trees may grow
    pub max_tree_elevation: f32,
}

impl Default for PlanetOptions {
    fn default() -> Self {
        Self {
            radius: 1.0,
            resolution: 16,
            seed: 0,
            water_level: 0.4,
            has_ocean: true,
            has_atmosphere: true,
            has_vegetation: true,
            water_color: Color::new(0.10, 0.30, 0.55),
            land_color: Color::new(0.35, 0.55, 0.25),
            mountain_color: Color::new(0.45, 0.40, 0.35),
            snow_color: Color::new(0.93, 0.95, 0.98),
            atmosphere_color: Color::new(0.55, 0.70, 0.95),
            vegetation_density: 0.3,
            min_tree_elevation: 0.41,
            max_tree_elevation: 0.65,
        }
    }
}

impl PlanetOptions {
    /// Reject out-of-range configuration before any build work starts.
    pub fn validate(&self) -> Result<(), PlanetError> {
        if !self.radius.is_finite() || self.radius <= 0.0 {
            return Err(PlanetError::InvalidConfiguration(format!(
                "radius must be positive and finite, got {}",
                self.radius
            )));
        }
        if self.resolution < MIN_RESOLUTION || self.resolution > MAX_RESOLUTION {
            return Err(PlanetError::InvalidConfiguration(format!(
                "resolution must be in {}..={}, got {}",
                MIN_RESOLUTION, MAX_RESOLUTION, self.resolution
            )));
        }
        if !self.water_level.is_finite() || !(0.0..=1.0).contains(&self.water_level) {
            return Err(PlanetError::InvalidConfiguration(format!(
                "water_level must be in [0, 1], got {}",
                self.water_level
            )));
        }
        if !self.vegetation_density.is_finite() || !(0.0..=1.0).contains(&self.vegetation_density)
        {
            return Err(PlanetError::InvalidConfiguration(format!(
                "vegetation_density must be in [0, 1], got {}",
                self.vegetation_density
            )));
        }
        if !self.min_tree_elevation.is_finite()
            || !self.max_tree_elevation.is_finite()
            || self.min_tree_elevation > self.max_tree_elevation
        {
            return Err(PlanetError::InvalidConfiguration(format!(
                "tree elevation window is inverted: [{}, {}]",
                self.min_tree_elevation, self.max_tree_elevation
            )));
        }
        for (name, color) in [
            ("water_color", self.water_color),
            ("land_color", self.land_color),
            ("mountain_color", self.mountain_color),
            ("snow_color", self.snow_color),
            ("atmosphere_color", self.atmosphere_color),
        ] {
            if !color.is_finite() {
                return Err(PlanetError::InvalidConfiguration(format!(
                    "{name} has a non-finite channel"
                )));
            }
        }
        Ok(())
    }
}
