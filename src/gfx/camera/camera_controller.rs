use winit::{
    event::{ElementState, KeyEvent},
    keyboard::{KeyCode, PhysicalKey},
};

use super::fly_camera::FlyCamera;

/// Keyboard driver of a [`FlyCamera`].
///
/// A press sets a speed, the matching release clears it.
pub struct CameraController {
    /// Walking and turning speed per tick
    pub speed: f32,
}

impl Default for CameraController {
    fn default() -> Self {
        Self { speed: 0.006 }
    }
}

impl CameraController {
    pub fn new(speed: f32) -> Self {
        Self { speed }
    }

    /// Returns `true` when the key belongs to the camera.
    pub fn process_key(&self, key: KeyCode, state: ElementState, camera: &mut FlyCamera) -> bool {
        let v = if state == ElementState::Pressed { self.speed } else { 0.0 };
        match key {
            KeyCode::KeyW => camera.move_speed.y = v,
            KeyCode::KeyS => camera.move_speed.y = -v,
            KeyCode::KeyA => camera.move_speed.x = v,
            KeyCode::KeyD => camera.move_speed.x = -v,
            KeyCode::KeyQ => camera.angle_speed.x = v,
            KeyCode::KeyE => camera.angle_speed.x = -v,
            KeyCode::KeyO => camera.angle_speed.y = -v,
            KeyCode::KeyP => camera.angle_speed.y = v,
            _ => return false,
        }
        true
    }

    pub fn process_keyed_events(&self, event: &KeyEvent, camera: &mut FlyCamera) -> bool {
        match event.physical_key {
            PhysicalKey::Code(code) => self.process_key(code, event.state, camera),
            PhysicalKey::Unidentified(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::Vector2;

    #[test]
    fn test_press_and_release() {
        let controller = CameraController::default();
        let mut camera = FlyCamera::new(Vector2::new(-2.0, 2.0), 150f32.to_radians(), 0.3, 1.0);

        assert!(controller.process_key(KeyCode::KeyW, ElementState::Pressed, &mut camera));
        assert_eq!(camera.move_speed.y, 0.006);
        assert!(controller.process_key(KeyCode::KeyE, ElementState::Pressed, &mut camera));
        assert_eq!(camera.angle_speed.x, -0.006);

        controller.process_key(KeyCode::KeyW, ElementState::Released, &mut camera);
        assert_eq!(camera.move_speed.y, 0.0);
        assert!(!controller.process_key(KeyCode::KeyZ, ElementState::Pressed, &mut camera));
    }
}
