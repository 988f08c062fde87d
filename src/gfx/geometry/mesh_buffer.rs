//! # Mesh Accumulator
//!
//! A non-indexed triangle soup stored as four parallel, index-aligned
//! sequences (positions, normals, colors and UVs). Procedural shapes and
//! loaded models are appended into it, optionally repositioned by a
//! placement matrix, before the whole buffer is uploaded once.

use cgmath::{InnerSpace, Matrix, Matrix3, Matrix4, SquareMatrix, Vector2, Vector3};
use std::f32::consts::{FRAC_PI_2, PI};

use crate::error::ShapeError;
use crate::gfx::scene::vertex::Vertex3D;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshBuffer {
    pub positions: Vec<Vector3<f32>>,
    pub normals: Vec<Vector3<f32>>,
    pub colors: Vec<Vector3<f32>>,
    pub uvs: Vec<Vector2<f32>>,
}

impl MeshBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one fully specified vertex.
    pub fn push_vertex(
        &mut self,
        position: Vector3<f32>,
        normal: Vector3<f32>,
        color: Vector3<f32>,
        uv: Vector2<f32>,
    ) {
        self.positions.push(position);
        self.normals.push(normal);
        self.colors.push(color);
        self.uvs.push(uv);
    }

    /// Appends a flat-shaded triangle.
    ///
    /// All three corners share the geometric face normal; each corner gets
    /// its own polar UV.
    pub fn push_triangle(&mut self, corners: [Vector3<f32>; 3], color: Vector3<f32>) {
        let normal = face_normal(corners[0], corners[1], corners[2]);
        for corner in corners {
            self.push_vertex(corner, normal, color, polar_uv(corner));
        }
    }

    /// Appends another buffer unchanged.
    pub fn append(&mut self, other: &MeshBuffer) {
        self.positions.extend_from_slice(&other.positions);
        self.normals.extend_from_slice(&other.normals);
        self.colors.extend_from_slice(&other.colors);
        self.uvs.extend_from_slice(&other.uvs);
    }

    /// Appends another buffer repositioned by `placement`.
    ///
    /// Positions go through the full matrix, normals through the
    /// inverse-transpose of its upper 3x3 and are renormalized.
    pub fn append_transformed(
        &mut self,
        other: &MeshBuffer,
        placement: Matrix4<f32>,
    ) -> Result<(), ShapeError> {
        let normal_matrix = normal_matrix(placement).ok_or(ShapeError::SingularPlacement)?;

        self.positions.extend(
            other
                .positions
                .iter()
                .map(|p| (placement * p.extend(1.0)).truncate()),
        );
        self.normals.extend(
            other
                .normals
                .iter()
                .map(|n| normalize_or_zero(normal_matrix * n)),
        );
        self.colors.extend_from_slice(&other.colors);
        self.uvs.extend_from_slice(&other.uvs);
        Ok(())
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.positions.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// True when all four sequences have the same length and that length
    /// is a whole number of triangles.
    pub fn is_aligned(&self) -> bool {
        let n = self.positions.len();
        self.normals.len() == n && self.colors.len() == n && self.uvs.len() == n && n % 3 == 0
    }

    /// Replaces every normal with its triangle's face normal.
    pub fn generate_flat_normals(&mut self) {
        self.normals.clear();
        for triangle in self.positions.chunks(3) {
            let normal = match triangle {
                [a, b, c] => face_normal(*a, *b, *c),
                _ => Vector3::new(0.0, 0.0, 0.0),
            };
            self.normals
                .extend(std::iter::repeat(normal).take(triangle.len()));
        }
    }

    /// Replaces every UV with the polar projection of its position.
    pub fn generate_polar_uvs(&mut self) {
        self.uvs = self.positions.iter().map(|p| polar_uv(*p)).collect();
    }

    /// Fills missing colors with a single color.
    pub fn fill_colors(&mut self, color: Vector3<f32>) {
        self.colors.resize(self.positions.len(), color);
    }

    /// Interleaves the buffer into GPU vertices.
    pub fn to_vertices(&self) -> Vec<Vertex3D> {
        (0..self.positions.len())
            .map(|i| Vertex3D {
                position: self.positions[i].into(),
                normal: self.normals.get(i).copied().unwrap_or(Vector3::unit_y()).into(),
                color: self
                    .colors
                    .get(i)
                    .copied()
                    .unwrap_or(Vector3::new(1.0, 1.0, 1.0))
                    .into(),
                uv: self.uvs.get(i).copied().unwrap_or(Vector2::new(0.0, 0.0)).into(),
            })
            .collect()
    }
}

/// Geometric normal of a counter-clockwise triangle.
///
/// Degenerate triangles yield the zero vector.
pub fn face_normal(a: Vector3<f32>, b: Vector3<f32>, c: Vector3<f32>) -> Vector3<f32> {
    normalize_or_zero((b - a).cross(c - a))
}

/// UV from the polar coordinates of a point around the origin.
///
/// Latitude `asin(y / |v|)` maps to u and longitude `atan2(x, z)` to v, both
/// shifted by a quarter turn and divided by pi. The origin maps to the center.
pub fn polar_uv(v: Vector3<f32>) -> Vector2<f32> {
    let length = v.magnitude();
    if length <= f32::EPSILON {
        return Vector2::new(0.5, 0.5);
    }
    let latitude = (v.y / length).clamp(-1.0, 1.0).asin();
    let longitude = v.x.atan2(v.z);
    Vector2::new((latitude + FRAC_PI_2) / PI, (longitude + FRAC_PI_2) / PI)
}

/// Inverse-transpose of the upper-left 3x3 of `m`; translation is ignored.
pub fn normal_matrix(m: Matrix4<f32>) -> Option<Matrix3<f32>> {
    let upper = Matrix3::from_cols(m.x.truncate(), m.y.truncate(), m.z.truncate());
    upper.invert().map(|inverse| inverse.transpose())
}

fn normalize_or_zero(v: Vector3<f32>) -> Vector3<f32> {
    let length = v.magnitude();
    if length <= f32::EPSILON {
        Vector3::new(0.0, 0.0, 0.0)
    } else {
        v / length
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{Deg, Matrix4};

    const EPS: f32 = 1e-5;

    fn close(a: Vector3<f32>, b: Vector3<f32>) -> bool {
        (a - b).magnitude() < EPS
    }

    fn unit_triangle() -> MeshBuffer {
        let mut mesh = MeshBuffer::new();
        mesh.push_triangle(
            [
                Vector3::new(0.0, 0.0, 0.0),
                Vector3::new(1.0, 0.0, 0.0),
                Vector3::new(0.0, 1.0, 0.0),
            ],
            Vector3::new(1.0, 0.0, 0.0),
        );
        mesh
    }

    #[test]
    fn test_push_triangle_is_flat_and_aligned() {
        let mesh = unit_triangle();
        assert!(mesh.is_aligned());
        assert_eq!(mesh.triangle_count(), 1);
        for normal in &mesh.normals {
            assert!(close(*normal, Vector3::unit_z()));
        }
    }

    #[test]
    fn test_degenerate_triangle_has_zero_normal() {
        let n = face_normal(
            Vector3::new(1.0, 1.0, 1.0),
            Vector3::new(2.0, 2.0, 2.0),
            Vector3::new(3.0, 3.0, 3.0),
        );
        assert_eq!(n, Vector3::new(0.0, 0.0, 0.0));
    }

    #[test]
    fn test_polar_uv() {
        assert_eq!(polar_uv(Vector3::new(0.0, 0.0, 0.0)), Vector2::new(0.5, 0.5));
        // +z sits on the equator at longitude zero
        let uv = polar_uv(Vector3::new(0.0, 0.0, 2.0));
        assert!((uv.x - 0.5).abs() < EPS);
        assert!((uv.y - 0.5).abs() < EPS);
        // north pole
        let uv = polar_uv(Vector3::new(0.0, 3.0, 0.0));
        assert!((uv.x - 1.0).abs() < EPS);
    }

    #[test]
    fn test_append_transformed_moves_positions_and_rotates_normals() {
        let source = unit_triangle();
        let placement = Matrix4::from_translation(Vector3::new(0.0, 5.0, 0.0))
            * Matrix4::from_angle_x(Deg(90.0));
        let mut target = MeshBuffer::new();
        target.append_transformed(&source, placement).unwrap();

        assert!(target.is_aligned());
        assert!(close(target.positions[0], Vector3::new(0.0, 5.0, 0.0)));
        assert!(close(target.positions[2], Vector3::new(0.0, 5.0, 1.0)));
        // +z rotated 90 degrees about x points to -y
        assert!(close(target.normals[0], Vector3::new(0.0, -1.0, 0.0)));
    }

    #[test]
    fn test_non_uniform_scale_keeps_normals_perpendicular() {
        let mut source = MeshBuffer::new();
        source.push_triangle(
            [
                Vector3::new(1.0, 0.0, 0.0),
                Vector3::new(0.0, 1.0, 0.0),
                Vector3::new(0.0, 0.0, 1.0),
            ],
            Vector3::new(1.0, 1.0, 1.0),
        );
        let placement = Matrix4::from_nonuniform_scale(4.0, 1.0, 0.5);
        let mut target = MeshBuffer::new();
        target.append_transformed(&source, placement).unwrap();

        let expected = face_normal(target.positions[0], target.positions[1], target.positions[2]);
        assert!(close(target.normals[0], expected));
    }

    #[test]
    fn test_singular_placement_rejected() {
        let mut target = MeshBuffer::new();
        let result = target.append_transformed(
            &unit_triangle(),
            Matrix4::from_nonuniform_scale(1.0, 0.0, 1.0),
        );
        assert_eq!(result, Err(ShapeError::SingularPlacement));
        assert!(target.is_empty());
    }

    #[test]
    fn test_generate_flat_normals_and_uvs() {
        let mut mesh = MeshBuffer {
            positions: vec![
                Vector3::new(0.0, 0.0, 0.0),
                Vector3::new(0.0, 0.0, 1.0),
                Vector3::new(1.0, 0.0, 0.0),
            ],
            ..Default::default()
        };
        assert!(!mesh.is_aligned());
        mesh.generate_flat_normals();
        mesh.generate_polar_uvs();
        mesh.fill_colors(Vector3::new(1.0, 1.0, 1.0));
        assert!(mesh.is_aligned());
        assert!(close(mesh.normals[1], Vector3::unit_y()));
        assert_eq!(mesh.uvs[0], Vector2::new(0.5, 0.5));
    }

    #[test]
    fn test_to_vertices_interleaves() {
        let vertices = unit_triangle().to_vertices();
        assert_eq!(vertices.len(), 3);
        assert_eq!(vertices[1].position, [1.0, 0.0, 0.0]);
        assert_eq!(vertices[1].color, [1.0, 0.0, 0.0]);
    }
}
