//! Vegetation placement planning
//!
//! Selects surface vertices that can host decoration (trees) and indexes
//! their world positions in an octree for the placement layer to query.
//! The chance draw is seeded per vertex, so placement is as reproducible as
//! the mesh itself.

use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::mesh::PlanetMesh;
use crate::octree::{Octree, SpatialPoint};
use crate::options::PlanetOptions;
use crate::seeds::PlanetSeeds;

/// Octree bounds relative to the planet radius; covers every displaced
/// surface point with room to spare
const OCTREE_BOUNDS_FACTOR: f32 = 2.5;

/// Minimum spacing between placement points, as a fraction of the radius
const MIN_SPACING_FACTOR: f32 = 0.02;

/// Plan decoration placement for a built planet.
///
/// A vertex qualifies when its biome supports trees, its elevation falls in
/// the configured window, and its seeded chance draw passes the density
/// threshold. Candidates landing within the minimum spacing of an already
/// accepted point are skipped, so the index never holds overlapping points.
pub fn plan_vegetation(mesh: &PlanetMesh, options: &PlanetOptions) -> Octree {
    let mut tree = Octree::new(Vec3::ZERO, options.radius * OCTREE_BOUNDS_FACTOR);
    if !options.has_vegetation {
        return tree;
    }

    let seeds = PlanetSeeds::from_master(options.seed);
    let spacing = options.radius * MIN_SPACING_FACTOR;

    for index in 0..mesh.surface.len() {
        let biome = mesh.surface.biomes[index];
        if !biome.supports_trees() {
            continue;
        }
        let elevation = mesh.surface.elevations[index];
        if elevation < options.min_tree_elevation || elevation > options.max_tree_elevation {
            continue;
        }

        // Seeded per-vertex draw keeps placement deterministic across builds
        let mut rng = ChaCha8Rng::seed_from_u64(seeds.vegetation.wrapping_add(index as u64));
        if rng.gen::<f32>() >= options.vegetation_density {
            continue;
        }

        let direction = Vec3::from(mesh.surface.directions[index]);
        let position = direction * options.radius * (1.0 + elevation);
        if tree.find_nearest(position, spacing).is_some() {
            continue;
        }
        tree.insert(SpatialPoint::new(position, index as u32));
    }

    log::debug!("vegetation: {} placement points", tree.len());
    tree
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::build_planet;

    fn test_options() -> PlanetOptions {
        PlanetOptions {
            seed: 42,
            resolution: 8,
            vegetation_density: 1.0,
            ..PlanetOptions::default()
        }
    }

    fn all_points(tree: &Octree, options: &PlanetOptions) -> Vec<SpatialPoint> {
        let mut points = tree.query_box(
            Vec3::ZERO,
            Vec3::splat(options.radius * OCTREE_BOUNDS_FACTOR),
        );
        points.sort_by_key(|p| p.id);
        points
    }

    #[test]
    fn test_planning_is_deterministic() {
        let options = test_options();
        let mesh = build_planet(&options).unwrap();
        let a = plan_vegetation(&mesh, &options);
        let b = plan_vegetation(&mesh, &options);
        assert_eq!(a.len(), b.len());
        assert_eq!(all_points(&a, &options), all_points(&b, &options));
    }

    #[test]
    fn test_disabled_vegetation_yields_empty_index() {
        let options = PlanetOptions {
            has_vegetation: false,
            ..test_options()
        };
        let mesh = build_planet(&options).unwrap();
        let tree = plan_vegetation(&mesh, &options);
        assert!(tree.is_empty());
    }

    #[test]
    fn test_zero_density_places_nothing() {
        let options = PlanetOptions {
            vegetation_density: 0.0,
            ..test_options()
        };
        let mesh = build_planet(&options).unwrap();
        assert!(plan_vegetation(&mesh, &options).is_empty());
    }

    #[test]
    fn test_points_respect_biome_and_elevation_window() {
        let options = test_options();
        let mesh = build_planet(&options).unwrap();
        let tree = plan_vegetation(&mesh, &options);

        for point in all_points(&tree, &options) {
            let index = point.id as usize;
            assert!(mesh.surface.biomes[index].supports_trees());
            let elevation = mesh.surface.elevations[index];
            assert!(elevation >= options.min_tree_elevation);
            assert!(elevation <= options.max_tree_elevation);
        }
    }

    #[test]
    fn test_points_keep_minimum_spacing() {
        let options = test_options();
        let mesh = build_planet(&options).unwrap();
        let tree = plan_vegetation(&mesh, &options);
        let spacing = options.radius * MIN_SPACING_FACTOR;

        let points = all_points(&tree, &options);
        for (i, a) in points.iter().enumerate() {
            for b in points.iter().skip(i + 1) {
                let d = a.position.distance(b.position);
                assert!(d >= spacing * 0.99, "points {} and {} only {d} apart", a.id, b.id);
            }
        }
    }

    #[test]
    fn test_full_density_places_some_points() {
        // Low sea level and a wide elevation window so plenty of land qualifies
        let options = PlanetOptions {
            resolution: 16,
            water_level: 0.3,
            min_tree_elevation: 0.31,
            max_tree_elevation: 0.9,
            ..test_options()
        };
        let mesh = build_planet(&options).unwrap();
        let tree = plan_vegetation(&mesh, &options);
        assert!(!tree.is_empty(), "a mostly-land planet should have some forest");
    }
}
