use cgmath::{Deg, Matrix4, Point3, Vector3};

use super::camera_utils::{Camera, Perspective};

/// Static camera looking from `eye` at `target`
#[derive(Debug, Clone, Copy)]
pub struct LookAtCamera {
    pub eye: Point3<f32>,
    pub target: Point3<f32>,
    pub up: Vector3<f32>,
    pub projection: Perspective,
}

impl LookAtCamera {
    pub fn new(eye: Point3<f32>, target: Point3<f32>, aspect: f32) -> Self {
        Self {
            eye,
            target,
            up: Vector3::unit_y(),
            projection: Perspective::new(Deg(45.0), aspect, 0.5, 50.0),
        }
    }

    pub fn view_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(self.eye, self.target, self.up)
    }
}

impl Camera for LookAtCamera {
    fn build_view_projection_matrix(&self) -> Matrix4<f32> {
        self.projection.matrix() * self.view_matrix()
    }

    fn eye(&self) -> Point3<f32> {
        self.eye
    }

    fn resize_projection(&mut self, width: u32, height: u32) {
        self.projection.resize(width, height);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{Transform, Vector4};

    #[test]
    fn test_target_projects_to_center() {
        let camera = LookAtCamera::new(Point3::new(1.0, 1.2, 1.5), Point3::new(0.0, 0.0, 0.0), 1.2);
        let clip = camera.build_view_projection_matrix() * Vector4::new(0.0, 0.0, 0.0, 1.0);
        assert!((clip.x / clip.w).abs() < 1e-5);
        assert!((clip.y / clip.w).abs() < 1e-5);
        assert!(clip.z / clip.w > 0.0 && clip.z / clip.w < 1.0);

        let eye_in_view = camera.view_matrix().transform_point(camera.eye);
        assert!(eye_in_view.x.abs() < 1e-5 && eye_in_view.z.abs() < 1e-5);
    }

    #[test]
    fn test_uniform_carries_eye() {
        let camera = LookAtCamera::new(Point3::new(1.0, 1.2, 1.5), Point3::new(0.0, 0.0, 0.0), 1.0);
        assert_eq!(camera.uniform().view_position, [1.0, 1.2, 1.5, 1.0]);
    }
}
