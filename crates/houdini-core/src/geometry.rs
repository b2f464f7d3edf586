//! Mesh payload handed between the engine, the asset preview and the renderer
//!
//! Tessellation and materials are out of scope; this is only the triangle soup
//! and bounds the component swaps around when a cook completes.

use serde::{Deserialize, Serialize};

/// Axis-aligned bounds
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Bounds {
    pub min: [f32; 3],
    pub max: [f32; 3],
}

impl Bounds {
    /// Compute bounds of a point set; empty input yields zero bounds
    pub fn from_points(points: &[[f32; 3]]) -> Self {
        let Some(first) = points.first() else {
            return Self::default();
        };
        let mut bounds = Bounds {
            min: *first,
            max: *first,
        };
        for p in &points[1..] {
            for axis in 0..3 {
                bounds.min[axis] = bounds.min[axis].min(p[axis]);
                bounds.max[axis] = bounds.max[axis].max(p[axis]);
            }
        }
        bounds
    }
}

/// Triangle mesh (three vertices per triangle)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MeshData {
    pub vertices: Vec<[f32; 3]>,
    pub bounds: Bounds,
    /// Placeholder shown before the asset has ever been cooked
    pub is_logo: bool,
}

impl MeshData {
    pub fn new(vertices: Vec<[f32; 3]>) -> Self {
        let bounds = Bounds::from_points(&vertices);
        Self {
            vertices,
            bounds,
            is_logo: false,
        }
    }

    /// The placeholder mesh: a single unit triangle flagged as logo
    pub fn logo() -> Self {
        let mut mesh = Self::new(vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]);
        mesh.is_logo = true;
        mesh
    }

    pub fn triangle_count(&self) -> usize {
        self.vertices.len() / 3
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_from_points() {
        let bounds = Bounds::from_points(&[[1.0, -2.0, 0.0], [-1.0, 3.0, 5.0]]);
        assert_eq!(bounds.min, [-1.0, -2.0, 0.0]);
        assert_eq!(bounds.max, [1.0, 3.0, 5.0]);
        assert_eq!(Bounds::from_points(&[]), Bounds::default());
    }

    #[test]
    fn test_logo_mesh() {
        let logo = MeshData::logo();
        assert!(logo.is_logo);
        assert_eq!(logo.triangle_count(), 1);
        assert!(!MeshData::new(Vec::new()).is_logo);
    }
}
