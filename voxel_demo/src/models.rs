/// Geometry for the demo scene

use glam::Vec3;
use voxel_engine::voxel::scene::Vertex;

/// Unit cube centered on the origin, one color per face
pub fn cube() -> (Vec<Vertex>, Vec<u32>) {
    let faces: [([Vec3; 4], Vec3); 6] = [
        // left (-x)
        ([Vec3::new(-0.5, -0.5, -0.5), Vec3::new(-0.5, 0.5, 0.5), Vec3::new(-0.5, -0.5, 0.5), Vec3::new(-0.5, 0.5, -0.5)], Vec3::new(0.9, 0.9, 0.9)),
        // right (+x)
        ([Vec3::new(0.5, -0.5, -0.5), Vec3::new(0.5, 0.5, 0.5), Vec3::new(0.5, -0.5, 0.5), Vec3::new(0.5, 0.5, -0.5)], Vec3::new(0.8, 0.8, 0.1)),
        // top (-y)
        ([Vec3::new(-0.5, -0.5, -0.5), Vec3::new(0.5, -0.5, 0.5), Vec3::new(-0.5, -0.5, 0.5), Vec3::new(0.5, -0.5, -0.5)], Vec3::new(0.9, 0.6, 0.1)),
        // bottom (+y)
        ([Vec3::new(-0.5, 0.5, -0.5), Vec3::new(0.5, 0.5, 0.5), Vec3::new(-0.5, 0.5, 0.5), Vec3::new(0.5, 0.5, -0.5)], Vec3::new(0.8, 0.1, 0.1)),
        // front (+z)
        ([Vec3::new(-0.5, -0.5, 0.5), Vec3::new(0.5, 0.5, 0.5), Vec3::new(-0.5, 0.5, 0.5), Vec3::new(0.5, -0.5, 0.5)], Vec3::new(0.1, 0.1, 0.8)),
        // back (-z)
        ([Vec3::new(-0.5, -0.5, -0.5), Vec3::new(0.5, 0.5, -0.5), Vec3::new(-0.5, 0.5, -0.5), Vec3::new(0.5, -0.5, -0.5)], Vec3::new(0.1, 0.8, 0.1)),
    ];

    let mut vertices = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(36);
    for (corners, color) in faces {
        let base = vertices.len() as u32;
        vertices.extend(corners.iter().map(|&position| Vertex::new(position, color)));
        // corners are (a, c, b, d) with a-c the diagonal
        indices.extend([0, 1, 2, 0, 3, 1].map(|i| base + i));
    }
    (vertices, indices)
}

/// Flat square in the XZ plane
pub fn floor(half_extent: f32, color: Vec3) -> (Vec<Vertex>, Vec<u32>) {
    let vertices = vec![
        Vertex::new(Vec3::new(-half_extent, 0.0, -half_extent), color),
        Vertex::new(Vec3::new(half_extent, 0.0, -half_extent), color),
        Vertex::new(Vec3::new(half_extent, 0.0, half_extent), color),
        Vertex::new(Vec3::new(-half_extent, 0.0, half_extent), color),
    ];
    (vertices, vec![0, 1, 2, 0, 2, 3])
}

/// `count` evenly spaced positions on a horizontal circle
pub fn ring(count: usize, radius: f32, height: f32) -> Vec<Vec3> {
    (0..count)
        .map(|i| {
            let angle = i as f32 * std::f32::consts::TAU / count as f32;
            Vec3::new(radius * angle.cos(), height, radius * angle.sin())
        })
        .collect()
}

#[cfg(test)]
#[path = "models_tests.rs"]
mod tests;
