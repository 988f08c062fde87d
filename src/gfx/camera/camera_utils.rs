use cgmath::{perspective, Deg, Matrix4, Point3, SquareMatrix};

/// Maps OpenGL clip depth `[-1, 1]` to the `[0, 1]` range wgpu expects.
#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.5,
    0.0, 0.0, 0.0, 1.0,
);

pub trait Camera {
    fn build_view_projection_matrix(&self) -> Matrix4<f32>;

    fn eye(&self) -> Point3<f32>;

    fn resize_projection(&mut self, width: u32, height: u32);

    fn uniform(&self) -> CameraUniform {
        let eye = self.eye();
        CameraUniform {
            view_position: [eye.x, eye.y, eye.z, 1.0],
            view_proj: convert_matrix4_to_array(self.build_view_projection_matrix()),
        }
    }
}

/// Perspective projection shared by the cameras
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Perspective {
    pub fovy: Deg<f32>,
    pub aspect: f32,
    pub znear: f32,
    pub zfar: f32,
}

impl Perspective {
    pub fn new(fovy: Deg<f32>, aspect: f32, znear: f32, zfar: f32) -> Self {
        Self {
            fovy,
            aspect,
            znear,
            zfar,
        }
    }

    pub fn matrix(&self) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX * perspective(self.fovy, self.aspect, self.znear, self.zfar)
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.aspect = width.max(1) as f32 / height.max(1) as f32;
    }
}

#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable, Debug, PartialEq)]
pub struct CameraUniform {
    /// The eye position of the camera in homogenous coordinates.
    ///
    /// Homogenous coordinates are used to fullfill the 16 byte alignment requirement.
    pub view_position: [f32; 4],

    /// Contains the view projection matrix.
    pub view_proj: [[f32; 4]; 4],
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self {
            view_position: [0.0; 4],
            view_proj: convert_matrix4_to_array(Matrix4::identity()),
        }
    }
}

pub fn convert_matrix4_to_array(matrix4: Matrix4<f32>) -> [[f32; 4]; 4] {
    let mut result = [[0.0; 4]; 4];

    for i in 0..4 {
        for j in 0..4 {
            result[i][j] = matrix4[i][j];
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::Vector4;

    #[test]
    fn test_depth_remapped_to_unit_range() {
        let projection = Perspective::new(Deg(45.0), 1.0, 0.5, 50.0);
        let near = projection.matrix() * Vector4::new(0.0, 0.0, -0.5, 1.0);
        let far = projection.matrix() * Vector4::new(0.0, 0.0, -50.0, 1.0);
        assert!((near.z / near.w).abs() < 1e-4);
        assert!((far.z / far.w - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_resize_guards_zero_height() {
        let mut projection = Perspective::new(Deg(45.0), 1.0, 0.5, 50.0);
        projection.resize(800, 0);
        assert_eq!(projection.aspect, 800.0);
        projection.resize(600, 500);
        assert!((projection.aspect - 1.2).abs() < 1e-6);
    }
}
