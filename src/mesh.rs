//! Planet mesh synthesis
//!
//! Builds a subdivided icosahedral sphere, displaces each vertex by the
//! elevation field, derives per-vertex biome colors, and emits the flat
//! buffer sets the rendering layer consumes. Ocean and atmosphere shells are
//! plain spheres at reduced resolution and distinct radii.
//!
//! Per-vertex work is independent, so the sampling loop runs in parallel;
//! results are collected in template order, keeping builds deterministic.

use std::collections::HashMap;

use glam::Vec3;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::biome::{self, Biome};
use crate::error::PlanetError;
use crate::noise::NoiseField;
use crate::options::{Color, PlanetOptions};
use crate::seeds::PlanetSeeds;

// =============================================================================
// DISPLACEMENT PARAMETERS
// =============================================================================

/// Weight of the high-frequency detail term
const DETAIL_WEIGHT: f32 = 0.05;

/// Ocean floors are pulled toward the water level by this power curve so
/// they stay visually shallow relative to raw noise
const OCEAN_COMPRESSION_POWER: f32 = 1.2;
const OCEAN_COMPRESSION_SCALE: f32 = 0.1;

/// Ocean shell sits just under the nominal water surface
const OCEAN_SHELL_FACTOR: f32 = 0.97;

/// Atmosphere shell radius relative to the planet radius
const ATMOSPHERE_RADIUS_FACTOR: f32 = 1.25;

/// Shell resolution reductions never go below this (degenerate geometry)
const MIN_SHELL_RESOLUTION: u32 = 2;

// =============================================================================
// BUFFERS
// =============================================================================

/// Flat vertex buffers for one shell. `positions`, `normals` and `colors`
/// hold 3 floats per vertex, `uvs` 2 floats per vertex; `indices` addresses
/// vertices shared across the whole shell.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MeshBuffers {
    pub positions: Vec<f32>,
    pub normals: Vec<f32>,
    pub colors: Vec<f32>,
    pub uvs: Vec<f32>,
    pub indices: Vec<u32>,
}

impl MeshBuffers {
    fn with_capacity(vertex_count: usize, index_count: usize) -> Self {
        Self {
            positions: Vec::with_capacity(vertex_count * 3),
            normals: Vec::with_capacity(vertex_count * 3),
            colors: Vec::with_capacity(vertex_count * 3),
            uvs: Vec::with_capacity(vertex_count * 2),
            indices: Vec::with_capacity(index_count),
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    fn push_vertex(&mut self, position: Vec3, normal: Vec3, color: Color, uv: [f32; 2]) {
        self.positions.extend(position.to_array());
        self.normals.extend(normal.to_array());
        self.colors.extend([color.r, color.g, color.b]);
        self.uvs.extend(uv);
    }

    /// Fail the whole build rather than hand out a buffer with NaN/infinity
    /// in it.
    fn check_finite(&self, shell: &str) -> Result<(), PlanetError> {
        let all_finite = self.positions.iter().all(|v| v.is_finite())
            && self.normals.iter().all(|v| v.is_finite())
            && self.colors.iter().all(|v| v.is_finite())
            && self.uvs.iter().all(|v| v.is_finite());
        if all_finite {
            Ok(())
        } else {
            Err(PlanetError::ComputationFault(format!(
                "non-finite value in {shell} buffers"
            )))
        }
    }
}

/// Per-vertex surface record, kept for the whole planet so the decoration
/// layer can join placement points back to biome and climate data.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SurfaceTable {
    pub directions: Vec<[f32; 3]>,
    pub elevations: Vec<f32>,
    pub temperatures: Vec<f32>,
    pub moistures: Vec<f32>,
    pub biomes: Vec<Biome>,
}

impl SurfaceTable {
    pub fn len(&self) -> usize {
        self.biomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.biomes.is_empty()
    }

    fn push(&mut self, sample: &SurfaceSample) {
        self.directions.push(sample.direction.to_array());
        self.elevations.push(sample.elevation);
        self.temperatures.push(sample.temperature);
        self.moistures.push(sample.moisture);
        self.biomes.push(sample.biome);
    }
}

/// Everything one build produces.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlanetMesh {
    pub terrain: MeshBuffers,
    pub ocean: Option<MeshBuffers>,
    pub atmosphere: Option<MeshBuffers>,
    pub surface: SurfaceTable,
}

/// Transient per-vertex record; produced and consumed within one build.
/// The export module reuses it to sample map pixels through the same
/// displacement pipeline the mesh uses.
#[derive(Clone, Copy, Debug)]
pub(crate) struct SurfaceSample {
    pub(crate) direction: Vec3,
    pub(crate) elevation: f32,
    pub(crate) temperature: f32,
    pub(crate) moisture: f32,
    pub(crate) biome: Biome,
    pub(crate) color: Color,
}

// =============================================================================
// ICOSPHERE TEMPLATE
// =============================================================================

/// Shared sphere topology: unit-length vertices plus one index buffer.
pub struct SphereTemplate {
    pub vertices: Vec<Vec3>,
    pub indices: Vec<u32>,
}

/// The 12 vertices and 20 faces of a unit icosahedron, counter-clockwise
/// when viewed from outside.
fn icosahedron() -> ([Vec3; 12], [[u32; 3]; 20]) {
    let t = (1.0 + 5.0_f32.sqrt()) / 2.0;
    let vertices = [
        Vec3::new(-1.0, t, 0.0),
        Vec3::new(1.0, t, 0.0),
        Vec3::new(-1.0, -t, 0.0),
        Vec3::new(1.0, -t, 0.0),
        Vec3::new(0.0, -1.0, t),
        Vec3::new(0.0, 1.0, t),
        Vec3::new(0.0, -1.0, -t),
        Vec3::new(0.0, 1.0, -t),
        Vec3::new(t, 0.0, -1.0),
        Vec3::new(t, 0.0, 1.0),
        Vec3::new(-t, 0.0, -1.0),
        Vec3::new(-t, 0.0, 1.0),
    ]
    .map(|v| v.normalize());
    let faces = [
        [0, 11, 5],
        [0, 5, 1],
        [0, 1, 7],
        [0, 7, 10],
        [0, 10, 11],
        [1, 5, 9],
        [5, 11, 4],
        [11, 10, 2],
        [10, 7, 6],
        [7, 1, 8],
        [3, 9, 4],
        [3, 4, 2],
        [3, 2, 6],
        [3, 6, 8],
        [3, 8, 9],
        [4, 9, 5],
        [2, 4, 11],
        [6, 2, 10],
        [8, 6, 7],
        [9, 8, 1],
    ];
    (vertices, faces)
}

/// Builds vertices shared between faces exactly once. Corner vertices are
/// keyed by base index; edge vertices are computed from the canonically
/// ordered edge so adjacent faces produce bit-identical positions.
struct TemplateBuilder {
    base: [Vec3; 12],
    vertices: Vec<Vec3>,
    corner_ids: [Option<u32>; 12],
    edge_ids: HashMap<(u32, u32, u32), u32>,
}

impl TemplateBuilder {
    fn new(base: [Vec3; 12]) -> Self {
        Self {
            base,
            vertices: Vec::new(),
            corner_ids: [None; 12],
            edge_ids: HashMap::new(),
        }
    }

    fn push(&mut self, position: Vec3) -> u32 {
        let id = self.vertices.len() as u32;
        self.vertices.push(position);
        id
    }

    fn corner(&mut self, base_index: u32) -> u32 {
        if let Some(id) = self.corner_ids[base_index as usize] {
            return id;
        }
        let id = self.push(self.base[base_index as usize]);
        self.corner_ids[base_index as usize] = Some(id);
        id
    }

    fn edge(&mut self, a: u32, b: u32, step: u32, segments: u32) -> u32 {
        let (lo, hi, k) = if a < b {
            (a, b, step)
        } else {
            (b, a, segments - step)
        };
        if let Some(&id) = self.edge_ids.get(&(lo, hi, k)) {
            return id;
        }
        let t = k as f32 / segments as f32;
        let position = self.base[lo as usize]
            .lerp(self.base[hi as usize], t)
            .normalize();
        let id = self.push(position);
        self.edge_ids.insert((lo, hi, k), id);
        id
    }

    fn interior(&mut self, face: [u32; 3], row: u32, col: u32, segments: u32) -> u32 {
        let a = self.base[face[0] as usize];
        let b = self.base[face[1] as usize];
        let c = self.base[face[2] as usize];
        let t = row as f32 / segments as f32;
        let left = a.lerp(b, t);
        let right = a.lerp(c, t);
        let position = left.lerp(right, col as f32 / row as f32).normalize();
        self.push(position)
    }

    /// Vertex id for grid position (row, col) on a face, 0 <= col <= row <= n.
    fn grid_vertex(&mut self, face: [u32; 3], row: u32, col: u32, segments: u32) -> u32 {
        let n = segments;
        match (row, col) {
            (0, _) => self.corner(face[0]),
            (r, 0) if r == n => self.corner(face[1]),
            (r, c) if r == n && c == n => self.corner(face[2]),
            (r, c) if r == n => self.edge(face[1], face[2], c, n),
            (r, 0) => self.edge(face[0], face[1], r, n),
            (r, c) if c == r => self.edge(face[0], face[2], r, n),
            (r, c) => self.interior(face, r, c, n),
        }
    }
}

/// Subdivided icosahedral sphere. Each face edge is split into `resolution`
/// segments, yielding `10 * resolution^2 + 2` unique vertices and
/// `20 * resolution^2` triangles.
pub fn icosphere(resolution: u32) -> SphereTemplate {
    let n = resolution.max(1);
    let (base, faces) = icosahedron();
    let mut builder = TemplateBuilder::new(base);
    let mut indices = Vec::with_capacity((20 * n * n * 3) as usize);

    for face in faces {
        // Triangular grid of vertex ids: grid[row] has row+1 entries
        let mut grid: Vec<Vec<u32>> = Vec::with_capacity(n as usize + 1);
        for row in 0..=n {
            let mut entries = Vec::with_capacity(row as usize + 1);
            for col in 0..=row {
                entries.push(builder.grid_vertex(face, row, col, n));
            }
            grid.push(entries);
        }

        for row in 0..n as usize {
            for col in 0..=row {
                indices.extend([grid[row][col], grid[row + 1][col], grid[row + 1][col + 1]]);
                if col < row {
                    indices.extend([grid[row][col], grid[row + 1][col + 1], grid[row][col + 1]]);
                }
            }
        }
    }

    SphereTemplate {
        vertices: builder.vertices,
        indices,
    }
}

// =============================================================================
// DISPLACEMENT
// =============================================================================

/// Equirectangular UV for a unit direction.
fn sphere_uv(dir: Vec3) -> [f32; 2] {
    let u = 0.5 + dir.z.atan2(dir.x) / std::f32::consts::TAU;
    let v = 0.5 - dir.y.clamp(-1.0, 1.0).asin() / std::f32::consts::PI;
    [u, v]
}

/// Elevation, climate, biome and color for one template vertex.
pub(crate) fn sample_surface(
    dir: Vec3,
    field: &NoiseField,
    options: &PlanetOptions,
) -> SurfaceSample {
    let dir = dir.normalize();
    let water_level = options.water_level;

    let mut elevation = field.elevation(dir);
    if elevation < water_level {
        elevation = water_level
            - (water_level - elevation).powf(OCEAN_COMPRESSION_POWER) * OCEAN_COMPRESSION_SCALE;
    }
    elevation += field.detail(dir) * DETAIL_WEIGHT;

    let temperature = field.temperature(dir);
    let moisture = field.moisture(dir);
    let (biome, adjusted_temperature) =
        biome::classify(elevation, temperature, moisture, water_level);
    let color = biome::surface_color(
        biome,
        elevation,
        adjusted_temperature,
        moisture,
        field.jitter(dir),
        options,
    );

    SurfaceSample {
        direction: dir,
        elevation,
        temperature: adjusted_temperature,
        moisture,
        biome,
        color,
    }
}

/// Replace the provisional sphere normals with smooth normals accumulated
/// from triangle geometry (area weighted).
fn compute_smooth_normals(buffers: &mut MeshBuffers) {
    let vertex_count = buffers.vertex_count();
    let mut accumulated = vec![Vec3::ZERO; vertex_count];

    for tri in buffers.indices.chunks_exact(3) {
        let [ia, ib, ic] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
        let a = Vec3::from_slice(&buffers.positions[ia * 3..ia * 3 + 3]);
        let b = Vec3::from_slice(&buffers.positions[ib * 3..ib * 3 + 3]);
        let c = Vec3::from_slice(&buffers.positions[ic * 3..ic * 3 + 3]);
        let face_normal = (b - a).cross(c - a);
        accumulated[ia] += face_normal;
        accumulated[ib] += face_normal;
        accumulated[ic] += face_normal;
    }

    for (i, normal) in accumulated.into_iter().enumerate() {
        let smoothed = normal.normalize_or_zero();
        // Degenerate fans keep their provisional sphere normal
        if smoothed != Vec3::ZERO {
            buffers.normals[i * 3..i * 3 + 3].copy_from_slice(&smoothed.to_array());
        }
    }
}

/// Undisplaced sphere shell in a single flat color.
fn build_shell(resolution: u32, radius: f32, color: Color) -> MeshBuffers {
    let template = icosphere(resolution);
    let mut buffers = MeshBuffers::with_capacity(template.vertices.len(), template.indices.len());
    for &dir in &template.vertices {
        buffers.push_vertex(dir * radius, dir, color, sphere_uv(dir));
    }
    buffers.indices = template.indices;
    buffers
}

fn shell_resolution(base: u32, divisor: u32) -> u32 {
    (base / divisor).max(MIN_SHELL_RESOLUTION)
}

// =============================================================================
// BUILD
// =============================================================================

/// Build the full planet: displaced terrain, optional ocean and atmosphere
/// shells, and the per-vertex surface table.
///
/// Deterministic: identical options produce byte-identical output.
pub fn build_planet(options: &PlanetOptions) -> Result<PlanetMesh, PlanetError> {
    options.validate()?;

    let seeds = PlanetSeeds::from_master(options.seed);
    let field = NoiseField::new(&seeds);
    let template = icosphere(options.resolution);
    log::debug!(
        "terrain template: {} vertices, {} triangles",
        template.vertices.len(),
        template.indices.len() / 3
    );

    let samples: Vec<SurfaceSample> = template
        .vertices
        .par_iter()
        .map(|&dir| sample_surface(dir, &field, options))
        .collect();

    let mut terrain = MeshBuffers::with_capacity(samples.len(), template.indices.len());
    let mut surface = SurfaceTable::default();
    for sample in &samples {
        let position = sample.direction * options.radius * (1.0 + sample.elevation);
        terrain.push_vertex(
            position,
            sample.direction,
            sample.color,
            sphere_uv(sample.direction),
        );
        surface.push(sample);
    }
    terrain.indices = template.indices;
    compute_smooth_normals(&mut terrain);
    terrain.check_finite("terrain")?;

    let ocean = if options.has_ocean {
        let shell = build_shell(
            shell_resolution(options.resolution, 2),
            options.radius * (1.0 + options.water_level * OCEAN_SHELL_FACTOR),
            options.water_color,
        );
        shell.check_finite("ocean")?;
        Some(shell)
    } else {
        None
    };

    let atmosphere = if options.has_atmosphere {
        let shell = build_shell(
            shell_resolution(options.resolution, 4),
            options.radius * ATMOSPHERE_RADIUS_FACTOR,
            options.atmosphere_color,
        );
        shell.check_finite("atmosphere")?;
        Some(shell)
    } else {
        None
    };

    Ok(PlanetMesh {
        terrain,
        ocean,
        atmosphere,
        surface,
    })
}
