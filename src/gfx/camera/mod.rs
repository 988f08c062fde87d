pub mod camera_controller;
pub mod camera_utils;
pub mod fly_camera;
pub mod look_at_camera;

use winit::event::KeyEvent;

// Re-export main types
pub use camera_controller::CameraController;
pub use camera_utils::{Camera, CameraUniform, Perspective};
pub use fly_camera::FlyCamera;
pub use look_at_camera::LookAtCamera;

/// Fly camera plus the controller that steers it
pub struct CameraManager {
    pub camera: FlyCamera,
    pub controller: CameraController,
}

impl CameraManager {
    pub fn new(camera: FlyCamera, controller: CameraController) -> Self {
        Self { camera, controller }
    }

    pub fn process_keyboard_event(&mut self, event: &KeyEvent) -> bool {
        self.controller.process_keyed_events(event, &mut self.camera)
    }

    pub fn update(&mut self) -> CameraUniform {
        self.camera.update();
        self.camera.uniform()
    }
}
