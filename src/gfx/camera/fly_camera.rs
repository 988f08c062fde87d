//! First-person camera walking on the ground plane
//!
//! Yaw and pitch are radians. Positive pitch looks down. Movement happens
//! in the XZ plane at a fixed eye height; speeds are per tick.

use cgmath::{Deg, Matrix4, Point3, Rad, Vector2, Vector3};

use super::camera_utils::{Camera, Perspective};

/// Largest pitch in either direction, degrees
pub const PITCH_LIMIT: f32 = 60.0;

pub const EYE_HEIGHT: f32 = 2.0;

#[derive(Debug, Clone, Copy)]
pub struct FlyCamera {
    /// Ground position (x, z)
    pub position: Vector2<f32>,
    pub yaw: f32,
    pub pitch: f32,
    /// (strafe, forward) per tick
    pub move_speed: Vector2<f32>,
    /// (yaw, pitch) per tick
    pub angle_speed: Vector2<f32>,
    pub eye_height: f32,
    pub projection: Perspective,
}

impl FlyCamera {
    pub fn new(position: Vector2<f32>, yaw: f32, pitch: f32, aspect: f32) -> Self {
        let mut camera = Self {
            position,
            yaw,
            pitch: 0.0,
            move_speed: Vector2::new(0.0, 0.0),
            angle_speed: Vector2::new(0.0, 0.0),
            eye_height: EYE_HEIGHT,
            projection: Perspective::new(Deg(60.0), aspect, 0.5, 100.0),
        };
        camera.set_pitch(pitch);
        camera
    }

    pub fn set_pitch(&mut self, pitch: f32) {
        let limit = PITCH_LIMIT.to_radians();
        self.pitch = pitch.clamp(-limit, limit);
    }

    /// `rotate_y(yaw) * rotate_x(pitch) * +Z`
    pub fn direction(&self) -> Vector3<f32> {
        let (sin_yaw, cos_yaw) = self.yaw.sin_cos();
        let (sin_pitch, cos_pitch) = self.pitch.sin_cos();
        Vector3::new(cos_pitch * sin_yaw, -sin_pitch, cos_pitch * cos_yaw)
    }

    pub fn eye_position(&self) -> Point3<f32> {
        Point3::new(self.position.x, self.eye_height, self.position.y)
    }

    /// Applies one tick of turning and walking.
    pub fn update(&mut self) {
        self.yaw += self.angle_speed.x;
        self.set_pitch(self.pitch + self.angle_speed.y);

        let dir = self.direction();
        self.position += Vector2::new(dir.x, dir.z) * self.move_speed.y
            + Vector2::new(dir.z, -dir.x) * self.move_speed.x;
    }

    /// Model matrix for an avatar standing under the camera.
    pub fn avatar_matrix(&self) -> Matrix4<f32> {
        Matrix4::from_translation(Vector3::new(self.position.x, 0.0, self.position.y))
            * Matrix4::from_angle_y(Rad(self.yaw))
    }

    pub fn view_matrix(&self) -> Matrix4<f32> {
        let eye = self.eye_position();
        Matrix4::look_at_rh(eye, eye + self.direction(), Vector3::unit_y())
    }
}

impl Camera for FlyCamera {
    fn build_view_projection_matrix(&self) -> Matrix4<f32> {
        self.projection.matrix() * self.view_matrix()
    }

    fn eye(&self) -> Point3<f32> {
        self.eye_position()
    }

    fn resize_projection(&mut self, width: u32, height: u32) {
        self.projection.resize(width, height);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::InnerSpace;

    #[test]
    fn test_pitch_is_clamped() {
        let mut camera = FlyCamera::new(Vector2::new(0.0, 0.0), 0.0, 2.0, 1.0);
        assert!((camera.pitch - PITCH_LIMIT.to_radians()).abs() < 1e-6);

        camera.angle_speed.y = -0.5;
        for _ in 0..10 {
            camera.update();
        }
        assert!((camera.pitch + PITCH_LIMIT.to_radians()).abs() < 1e-6);
    }

    #[test]
    fn test_direction() {
        let camera = FlyCamera::new(Vector2::new(0.0, 0.0), 0.0, 0.0, 1.0);
        assert!((camera.direction() - Vector3::unit_z()).magnitude() < 1e-6);

        let down = FlyCamera::new(Vector2::new(0.0, 0.0), 0.0, 0.3, 1.0);
        assert!(down.direction().y < 0.0);
        assert!((down.direction().magnitude() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_walk_and_strafe() {
        let mut camera = FlyCamera::new(Vector2::new(0.0, 0.0), 0.0, 0.0, 1.0);
        camera.move_speed = Vector2::new(0.0, 1.0);
        camera.update();
        assert!((camera.position - Vector2::new(0.0, 1.0)).magnitude() < 1e-6);

        camera.move_speed = Vector2::new(1.0, 0.0);
        camera.update();
        assert!((camera.position - Vector2::new(1.0, 1.0)).magnitude() < 1e-6);
        assert_eq!(camera.eye_position().y, EYE_HEIGHT);
    }
}
