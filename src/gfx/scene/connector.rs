//! Wire drawn between a node and its parent
//!
//! Connector endpoints are overwritten every frame from the current world
//! matrices of the two nodes, and the backend re-uploads them before each
//! draw. Node meshes on the other hand are uploaded once.

use cgmath::{Matrix4, Vector3};

use super::vertex::Vertex3D;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Connector {
    start: Vector3<f32>,
    end: Vector3<f32>,
}

impl Default for Connector {
    fn default() -> Self {
        Self {
            start: Vector3::new(0.0, 0.0, 0.0),
            end: Vector3::new(0.0, 0.0, 0.0),
        }
    }
}

impl Connector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_endpoints(&mut self, start: Vector3<f32>, end: Vector3<f32>) {
        self.start = start;
        self.end = end;
    }

    pub fn endpoints(&self) -> (Vector3<f32>, Vector3<f32>) {
        (self.start, self.end)
    }

    /// Start is the parent's bottom anchor, end the child's top anchor,
    /// both carried into world space.
    pub fn compute(
        &mut self,
        parent_world: Matrix4<f32>,
        parent_bottom: Vector3<f32>,
        child_world: Matrix4<f32>,
        child_top: Vector3<f32>,
    ) {
        self.start = transform_point(parent_world, parent_bottom);
        self.end = transform_point(child_world, child_top);
    }

    pub fn to_vertices(&self) -> [Vertex3D; 2] {
        let vertex = |position: Vector3<f32>, uv: [f32; 2]| Vertex3D {
            position: position.into(),
            normal: [0.0, 1.0, 0.0],
            color: [1.0, 1.0, 1.0],
            uv,
        };
        [vertex(self.start, [0.0, 0.0]), vertex(self.end, [1.0, 1.0])]
    }
}

pub fn transform_point(matrix: Matrix4<f32>, point: Vector3<f32>) -> Vector3<f32> {
    let p = matrix * point.extend(1.0);
    p.truncate() / p.w
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{Deg, InnerSpace};

    #[test]
    fn test_endpoints_follow_world_matrices() {
        let parent_world = Matrix4::from_translation(Vector3::new(0.0, 0.6, 0.0));
        let child_world = parent_world
            * Matrix4::from_translation(Vector3::new(0.4, -0.3, 0.0))
            * Matrix4::from_angle_y(Deg(90.0));

        let mut wire = Connector::new();
        wire.compute(
            parent_world,
            Vector3::new(0.0, -0.05, 0.0),
            child_world,
            Vector3::new(0.1, 0.1, 0.0),
        );

        let (start, end) = wire.endpoints();
        assert!((start - Vector3::new(0.0, 0.55, 0.0)).magnitude() < 1e-5);
        // +x rotated 90 degrees about y lands on -z
        assert!((end - Vector3::new(0.4, 0.4, -0.1)).magnitude() < 1e-5);
    }

    #[test]
    fn test_endpoints_are_overwritten() {
        let mut wire = Connector::new();
        wire.set_endpoints(Vector3::new(1.0, 2.0, 3.0), Vector3::new(4.0, 5.0, 6.0));
        wire.set_endpoints(Vector3::new(0.0, 0.0, 0.0), Vector3::new(0.0, 1.0, 0.0));

        let vertices = wire.to_vertices();
        assert_eq!(vertices.len(), 2);
        assert_eq!(vertices[0].position, [0.0, 0.0, 0.0]);
        assert_eq!(vertices[1].position, [0.0, 1.0, 0.0]);
    }
}
