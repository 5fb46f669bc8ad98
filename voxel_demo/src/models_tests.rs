//! Tests for the demo geometry

use super::*;

// ============================================================================
// Meshes
// ============================================================================

#[test]
fn test_cube_counts() {
    let (vertices, indices) = cube();
    assert_eq!(vertices.len(), 24);
    assert_eq!(indices.len(), 36);
    assert!(indices.iter().all(|&i| (i as usize) < vertices.len()));
}

#[test]
fn test_cube_fits_unit_box() {
    let (vertices, _) = cube();
    for vertex in vertices {
        assert!(vertex.position.abs().max_element() <= 0.5);
    }
}

#[test]
fn test_cube_triangles_are_not_degenerate() {
    let (vertices, indices) = cube();
    for triangle in indices.chunks(3) {
        let [a, b, c] = [0, 1, 2].map(|k| vertices[triangle[k] as usize].position);
        assert!((b - a).cross(c - a).length() > 0.0);
    }
}

#[test]
fn test_floor_is_flat() {
    let (vertices, indices) = floor(3.0, Vec3::ONE);
    assert_eq!(indices.len(), 6);
    assert!(vertices.iter().all(|v| v.position.y == 0.0 && v.color == Vec3::ONE));
}

// ============================================================================
// Light placement
// ============================================================================

#[test]
fn test_ring_positions_on_circle() {
    let positions = ring(6, 2.0, -1.0);
    assert_eq!(positions.len(), 6);
    for position in positions {
        assert_eq!(position.y, -1.0);
        assert!((Vec3::new(position.x, 0.0, position.z).length() - 2.0).abs() < 1e-5);
    }
}

#[test]
fn test_ring_empty() {
    assert!(ring(0, 1.0, 0.0).is_empty());
}
