//! Global uniform bindings for camera and shadow data
//!
//! Per-frame state shared by every draw: the camera matrices and the light
//! view-projection used both to render the shadow map and to look it up.

use cgmath::{Matrix4, Point3, Vector3};

use crate::{
    gfx::camera::camera_utils::{convert_matrix4_to_array, CameraUniform, OPENGL_TO_WGPU_MATRIX},
    wgpu_utils::{
        binding_builder::{BindGroupBuilder, BindGroupLayoutBuilder, BindGroupLayoutWithDesc},
        binding_types,
        uniform_buffer::UniformBuffer,
    },
};

/// MUST match the `Globals` struct in the shaders exactly.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GlobalUBOContent {
    view_position: [f32; 4],
    view_proj: [[f32; 4]; 4],
    light_view_proj: [[f32; 4]; 4],
}
// 16 + 64 + 64 = 144 bytes

impl GlobalUBOContent {
    pub fn new(camera: CameraUniform, light_view_proj: Matrix4<f32>) -> Self {
        Self {
            view_position: camera.view_position,
            view_proj: camera.view_proj,
            light_view_proj: convert_matrix4_to_array(light_view_proj),
        }
    }
}

impl Default for GlobalUBOContent {
    fn default() -> Self {
        Self::new(CameraUniform::default(), Matrix4::from_scale(1.0))
    }
}

pub type GlobalUBO = UniformBuffer<GlobalUBOContent>;

/// Orthographic light camera looking from `light` at the origin.
///
/// `half_extent` bounds the box sideways, `depth` along the view axis.
pub fn light_view_projection(light: Vector3<f32>, half_extent: f32, depth: f32) -> Matrix4<f32> {
    let view = Matrix4::look_at_rh(
        Point3::new(light.x, light.y, light.z),
        Point3::new(0.0, 0.0, 0.0),
        Vector3::unit_z(),
    );
    let proj = cgmath::ortho(-half_extent, half_extent, -half_extent, half_extent, -depth, depth);
    OPENGL_TO_WGPU_MATRIX * proj * view
}

/// Bind group 0 of every render pipeline
pub struct GlobalBindings {
    bind_group_layout: BindGroupLayoutWithDesc,
    bind_group: wgpu::BindGroup,
}

impl GlobalBindings {
    pub fn new(device: &wgpu::Device, ubo: &GlobalUBO) -> Self {
        let bind_group_layout = BindGroupLayoutBuilder::new()
            .next_binding_rendering(binding_types::uniform())
            .create(device, "Globals Bind Group Layout");

        let bind_group = BindGroupBuilder::new(&bind_group_layout)
            .resource(ubo.binding_resource())
            .create(device, "Globals Bind Group");

        GlobalBindings {
            bind_group_layout,
            bind_group,
        }
    }

    pub fn bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.bind_group_layout.layout
    }

    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::Vector4;

    #[test]
    fn test_layout_size() {
        assert_eq!(std::mem::size_of::<GlobalUBOContent>(), 144);
    }

    #[test]
    fn test_light_box_contains_scene() {
        let light = Vector3::new(3.0, 6.0, 3.0);
        let matrix = light_view_projection(light, 10.0, 20.0);

        for corner in [
            Vector4::new(0.0, 0.0, 0.0, 1.0),
            Vector4::new(5.0, 0.0, 5.0, 1.0),
            Vector4::new(-5.0, 3.0, -5.0, 1.0),
        ] {
            let clip = matrix * corner;
            assert!(clip.x.abs() <= 1.0 && clip.y.abs() <= 1.0);
            assert!((0.0..=1.0).contains(&clip.z));
        }
    }
}
