//! Map and mesh export
//!
//! Equirectangular PNG maps sampled straight from the noise field (no mesh
//! required) plus a Wavefront OBJ dump of built terrain buffers.

use std::fs::File;
use std::io::{BufWriter, Write};

use glam::Vec3;
use image::{ImageBuffer, Rgb, RgbImage};

use crate::mesh::{self, MeshBuffers};
use crate::noise::NoiseField;
use crate::options::PlanetOptions;
use crate::seeds::PlanetSeeds;

/// Unit direction for an equirectangular pixel. Pixel centers are offset by
/// half a texel so the poles are never sampled exactly.
fn pixel_direction(x: u32, y: u32, width: u32, height: u32) -> Vec3 {
    let lon = ((x as f32 + 0.5) / width as f32) * std::f32::consts::TAU - std::f32::consts::PI;
    let lat = std::f32::consts::FRAC_PI_2 - ((y as f32 + 0.5) / height as f32) * std::f32::consts::PI;
    Vec3::new(
        lat.cos() * lon.cos(),
        lat.sin(),
        lat.cos() * lon.sin(),
    )
}

/// Export an equirectangular biome color map. Pixels run through the same
/// sampling pipeline as mesh vertices, so the map matches a build with the
/// same options exactly.
pub fn export_biome_map(
    options: &PlanetOptions,
    width: u32,
    path: &str,
) -> Result<(), image::ImageError> {
    let height = (width / 2).max(1);
    let seeds = PlanetSeeds::from_master(options.seed);
    let field = NoiseField::new(&seeds);

    let mut img: RgbImage = ImageBuffer::new(width, height);
    for y in 0..height {
        for x in 0..width {
            let dir = pixel_direction(x, y, width, height);
            let sample = mesh::sample_surface(dir, &field, options);
            img.put_pixel(x, y, Rgb(sample.color.to_rgb8()));
        }
    }

    img.save(path)
}

/// Export an equirectangular elevation map with hypsometric tints:
/// deep blue through green and brown up to white peaks.
pub fn export_elevation_map(
    options: &PlanetOptions,
    width: u32,
    path: &str,
) -> Result<(), image::ImageError> {
    let height = (width / 2).max(1);
    let seeds = PlanetSeeds::from_master(options.seed);
    let field = NoiseField::new(&seeds);

    let mut img: RgbImage = ImageBuffer::new(width, height);
    for y in 0..height {
        for x in 0..width {
            let dir = pixel_direction(x, y, width, height);
            let sample = mesh::sample_surface(dir, &field, options);
            // Map [-1, 1] onto the ramp
            let t = ((sample.elevation + 1.0) * 0.5).clamp(0.0, 1.0);
            img.put_pixel(x, y, Rgb(hypsometric_ramp(t)));
        }
    }

    img.save(path)
}

/// Hypsometric color ramp for normalized elevation.
fn hypsometric_ramp(t: f32) -> [u8; 3] {
    let stops: [[f32; 3]; 6] = [
        [0.05, 0.10, 0.30], // abyss
        [0.10, 0.30, 0.55], // shallow water
        [0.55, 0.70, 0.40], // lowland green
        [0.70, 0.60, 0.35], // upland brown
        [0.55, 0.45, 0.40], // bare rock
        [0.95, 0.95, 0.98], // peak white
    ];

    let scaled = t * (stops.len() - 1) as f32;
    let idx = (scaled as usize).min(stops.len() - 2);
    let frac = scaled - idx as f32;

    let a = stops[idx];
    let b = stops[idx + 1];
    [
        ((a[0] + (b[0] - a[0]) * frac) * 255.0) as u8,
        ((a[1] + (b[1] - a[1]) * frac) * 255.0) as u8,
        ((a[2] + (b[2] - a[2]) * frac) * 255.0) as u8,
    ]
}

/// Export mesh buffers as Wavefront OBJ (positions, UVs, normals, faces).
pub fn export_obj(buffers: &MeshBuffers, path: &str) -> std::io::Result<()> {
    let file = File::create(path)?;
    let mut out = BufWriter::new(file);

    writeln!(out, "# globegen terrain mesh")?;
    for p in buffers.positions.chunks_exact(3) {
        writeln!(out, "v {} {} {}", p[0], p[1], p[2])?;
    }
    for uv in buffers.uvs.chunks_exact(2) {
        writeln!(out, "vt {} {}", uv[0], uv[1])?;
    }
    for n in buffers.normals.chunks_exact(3) {
        writeln!(out, "vn {} {} {}", n[0], n[1], n[2])?;
    }
    for tri in buffers.indices.chunks_exact(3) {
        // OBJ indices are 1-based; position/uv/normal share one index
        let (a, b, c) = (tri[0] + 1, tri[1] + 1, tri[2] + 1);
        writeln!(out, "f {a}/{a}/{a} {b}/{b}/{b} {c}/{c}/{c}")?;
    }

    out.flush()
}
