//! # Procedural Solids of Revolution
//!
//! [`Shape`] is an immutable builder: every `with_*` call returns a new
//! value, so one template can be reused for several nodes without aliasing.
//! Building produces a [`BuiltShape`], which is consumed when it is merged
//! into a node.
//!
//! All solids are centered on the origin and revolve around the local Y
//! axis. Every triangle is flat shaded.

use cgmath::{Matrix4, SquareMatrix, Vector3};
use std::f32::consts::PI;

use super::mesh_buffer::MeshBuffer;
use crate::error::ShapeError;

/// Subdivision level used by cones and cylinders
pub const SMOOTH_LEVEL: u32 = 30;

/// Smallest subdivision level that closes a solid
pub const MIN_LEVEL: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Shape {
    height: f32,
    radius: f32,
    level: u32,
    color: Vector3<f32>,
    placement: Matrix4<f32>,
}

impl Default for Shape {
    fn default() -> Self {
        Self {
            height: 1.0,
            radius: 1.0,
            level: MIN_LEVEL,
            color: Vector3::new(1.0, 1.0, 1.0),
            placement: Matrix4::identity(),
        }
    }
}

/// Vertex data of a built shape together with its placement
#[derive(Debug)]
pub struct BuiltShape {
    pub mesh: MeshBuffer,
    pub placement: Matrix4<f32>,
}

impl BuiltShape {
    pub fn triangle_count(&self) -> usize {
        self.mesh.triangle_count()
    }
}

impl Shape {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_height(self, height: f32) -> Self {
        Self { height, ..self }
    }

    pub fn with_radius(self, radius: f32) -> Self {
        Self { radius, ..self }
    }

    pub fn with_level(self, level: u32) -> Self {
        Self { level, ..self }
    }

    pub fn with_color(self, color: Vector3<f32>) -> Self {
        Self { color, ..self }
    }

    /// Matrix applied to the shape before it is merged into a node.
    pub fn with_placement(self, placement: Matrix4<f32>) -> Self {
        Self { placement, ..self }
    }

    /// Sets a scalar attribute by name: `height`, `radius` or `level`.
    ///
    /// `level` must be a whole number; fractional values are rejected
    /// instead of truncated.
    pub fn with_attribute(self, key: &str, value: f32) -> Result<Self, ShapeError> {
        match key {
            "height" => Ok(self.with_height(value)),
            "radius" => Ok(self.with_radius(value)),
            "level" => {
                if !value.is_finite() || value.fract() != 0.0 || value < MIN_LEVEL as f32 {
                    return Err(ShapeError::InvalidLevel { value });
                }
                Ok(self.with_level(value as u32))
            }
            other => Err(ShapeError::UnknownAttribute(other.to_string())),
        }
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn color(&self) -> Vector3<f32> {
        self.color
    }

    pub fn placement(&self) -> Matrix4<f32> {
        self.placement
    }

    fn validate(&self) -> Result<(), ShapeError> {
        if self.level < MIN_LEVEL {
            return Err(ShapeError::InvalidLevel {
                value: self.level as f32,
            });
        }
        if !self.height.is_finite() || self.height <= 0.0 {
            return Err(ShapeError::dimension("height", self.height));
        }
        if !self.radius.is_finite() || self.radius <= 0.0 {
            return Err(ShapeError::dimension("radius", self.radius));
        }
        Ok(())
    }

    /// Pyramid with `level` sides: apex at `+h/2`, base ring at `-h/2`.
    ///
    /// Two triangles per slice: one side face and one base face.
    pub fn build_pyramid(&self) -> Result<BuiltShape, ShapeError> {
        self.validate()?;

        let half = self.height / 2.0;
        let apex = Vector3::new(0.0, half, 0.0);
        let base_center = Vector3::new(0.0, -half, 0.0);
        let ring = ring(self.radius, -half, self.level);

        let mut mesh = MeshBuffer::new();
        for slice in ring.windows(2) {
            let (current, next) = (slice[0], slice[1]);
            mesh.push_triangle([current, next, apex], self.color);
            mesh.push_triangle([next, current, base_center], self.color);
        }

        Ok(self.finish(mesh))
    }

    /// Pyramid with [`SMOOTH_LEVEL`] sides.
    pub fn build_cone(&self) -> Result<BuiltShape, ShapeError> {
        self.with_level(SMOOTH_LEVEL).build_pyramid()
    }

    /// Prism with `level` sides between rings at `+h/2` and `-h/2`.
    ///
    /// Four triangles per slice: top cap, two for the side quad, bottom cap.
    pub fn build_prism(&self) -> Result<BuiltShape, ShapeError> {
        self.validate()?;

        let half = self.height / 2.0;
        let top_center = Vector3::new(0.0, half, 0.0);
        let bottom_center = Vector3::new(0.0, -half, 0.0);
        let top = ring(self.radius, half, self.level);
        let bottom = ring(self.radius, -half, self.level);

        let mut mesh = MeshBuffer::new();
        for i in 0..self.level as usize {
            mesh.push_triangle([top[i], top[i + 1], top_center], self.color);
            mesh.push_triangle([top[i], bottom[i], bottom[i + 1]], self.color);
            mesh.push_triangle([bottom[i + 1], top[i + 1], top[i]], self.color);
            mesh.push_triangle([bottom[i + 1], bottom[i], bottom_center], self.color);
        }

        Ok(self.finish(mesh))
    }

    /// Prism with [`SMOOTH_LEVEL`] sides.
    pub fn build_cylinder(&self) -> Result<BuiltShape, ShapeError> {
        self.with_level(SMOOTH_LEVEL).build_prism()
    }

    fn finish(&self, mesh: MeshBuffer) -> BuiltShape {
        BuiltShape {
            mesh,
            placement: self.placement,
        }
    }
}

/// `level + 1` points on a circle at height `y`; the first point repeats
/// at the end to close the ring.
fn ring(radius: f32, y: f32, level: u32) -> Vec<Vector3<f32>> {
    let step = 2.0 * PI / level as f32;
    (0..=level)
        .map(|i| {
            let angle = i as f32 * step;
            Vector3::new(radius * angle.sin(), y, radius * angle.cos())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::geometry::mesh_buffer::face_normal;
    use cgmath::InnerSpace;

    const EPS: f32 = 1e-5;

    fn assert_flat(mesh: &MeshBuffer, triangle: usize) {
        let i = triangle * 3;
        let expected = face_normal(mesh.positions[i], mesh.positions[i + 1], mesh.positions[i + 2]);
        for k in 0..3 {
            assert!((mesh.normals[i + k] - expected).magnitude() < EPS);
        }
    }

    #[test]
    fn test_cylinder_triangle_count() {
        let built = Shape::new()
            .with_height(2.0)
            .with_radius(1.0)
            .build_cylinder()
            .unwrap();
        assert_eq!(built.triangle_count(), 120);
        assert_eq!(built.mesh.vertex_count(), 360);
        assert!(built.mesh.is_aligned());
    }

    #[test]
    fn test_pyramid_triangle_count() {
        let built = Shape::new().with_level(4).build_pyramid().unwrap();
        assert_eq!(built.triangle_count(), 8);

        let cone = Shape::new().build_cone().unwrap();
        assert_eq!(cone.triangle_count(), 60);
    }

    #[test]
    fn test_prism_normals_are_flat() {
        let built = Shape::new()
            .with_height(2.0)
            .with_radius(1.0)
            .with_level(6)
            .build_prism()
            .unwrap();
        let mesh = &built.mesh;

        // top cap, side, side, bottom cap
        for triangle in 0..4 {
            assert_flat(mesh, triangle);
        }
        assert!((mesh.normals[0] - Vector3::unit_y()).magnitude() < EPS);
        assert!(mesh.normals[3].y.abs() < EPS);
        assert!((mesh.normals[9] + Vector3::unit_y()).magnitude() < EPS);

        // neighbouring side faces meet at a shared edge with distinct normals
        assert!((mesh.normals[3] - mesh.normals[15]).magnitude() > 0.1);
    }

    #[test]
    fn test_pyramid_faces_point_outward() {
        let built = Shape::new().with_level(4).build_pyramid().unwrap();
        let mesh = &built.mesh;
        for triangle in 0..mesh.triangle_count() {
            assert_flat(mesh, triangle);
            let i = triangle * 3;
            let centroid = (mesh.positions[i] + mesh.positions[i + 1] + mesh.positions[i + 2]) / 3.0;
            assert!(mesh.normals[i].dot(centroid) > 0.0);
        }
    }

    #[test]
    fn test_ring_layout() {
        let built = Shape::new()
            .with_height(1.0)
            .with_radius(2.0)
            .with_level(4)
            .build_pyramid()
            .unwrap();
        // first side triangle starts on +z and turns toward +x
        assert!((built.mesh.positions[0] - Vector3::new(0.0, -0.5, 2.0)).magnitude() < EPS);
        assert!((built.mesh.positions[1] - Vector3::new(2.0, -0.5, 0.0)).magnitude() < EPS);
        assert!((built.mesh.positions[2] - Vector3::new(0.0, 0.5, 0.0)).magnitude() < EPS);
    }

    #[test]
    fn test_invalid_input_rejected() {
        assert_eq!(
            Shape::new().with_level(2).build_prism().unwrap_err(),
            ShapeError::InvalidLevel { value: 2.0 }
        );
        assert_eq!(
            Shape::new().with_radius(0.0).build_pyramid().unwrap_err(),
            ShapeError::dimension("radius", 0.0)
        );
        assert!(Shape::new().with_height(f32::NAN).build_cylinder().is_err());
    }

    #[test]
    fn test_attribute_setter() {
        let shape = Shape::new()
            .with_attribute("height", 0.1)
            .and_then(|s| s.with_attribute("radius", 0.07))
            .and_then(|s| s.with_attribute("level", 5.0))
            .unwrap();
        assert_eq!(shape.level(), 5);
        assert_eq!(shape.height(), 0.1);

        assert_eq!(
            Shape::new().with_attribute("level", 4.5).unwrap_err(),
            ShapeError::InvalidLevel { value: 4.5 }
        );
        assert_eq!(
            Shape::new().with_attribute("depth", 1.0).unwrap_err(),
            ShapeError::UnknownAttribute("depth".to_string())
        );
    }

    #[test]
    fn test_builder_values_are_independent() {
        let template = Shape::new().with_radius(0.1);
        let tall = template.with_height(3.0);
        assert_eq!(template.height(), 1.0);
        assert_eq!(tall.height(), 3.0);
        assert_eq!(tall.radius(), 0.1);
    }
}
