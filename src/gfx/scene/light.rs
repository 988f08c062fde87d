//! Light sources attached to nodes
//!
//! A [`LightSet`] always holds [`MAX_LIGHTS`] slots. Unused slots stay
//! [`LightKind::Off`] and contribute nothing when shaded.

use cgmath::{InnerSpace, Vector3};

use crate::error::SceneError;

/// Number of simultaneous lights a node is shaded with
pub const MAX_LIGHTS: usize = 5;

/// Type tag shared with the shader
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LightKind {
    #[default]
    Off = 0,
    Directional = 1,
    Point = 2,
    Spot = 3,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Light {
    pub kind: LightKind,
    pub position: Vector3<f32>,
    pub direction: Vector3<f32>,
    pub ambient: Vector3<f32>,
    pub diffuse: Vector3<f32>,
    pub specular: Vector3<f32>,
    /// Cone half-angle in degrees, spot lights only
    pub angle: f32,
    pub attenuation: f32,
}

impl Default for Light {
    fn default() -> Self {
        Self {
            kind: LightKind::Off,
            position: Vector3::new(0.0, 0.0, 0.0),
            direction: Vector3::new(0.0, -1.0, 0.0),
            ambient: Vector3::new(0.0, 0.0, 0.0),
            diffuse: Vector3::new(0.0, 0.0, 0.0),
            specular: Vector3::new(0.0, 0.0, 0.0),
            angle: 0.0,
            attenuation: 0.0,
        }
    }
}

impl Light {
    pub fn directional(position: Vector3<f32>, direction: Vector3<f32>, color: Vector3<f32>) -> Self {
        Self {
            kind: LightKind::Directional,
            position,
            direction: direction.normalize(),
            ambient: color * 0.2,
            diffuse: color,
            specular: color,
            ..Default::default()
        }
    }

    pub fn point(position: Vector3<f32>, color: Vector3<f32>, attenuation: f32) -> Self {
        Self {
            kind: LightKind::Point,
            position,
            ambient: color * 0.1,
            diffuse: color,
            specular: color,
            attenuation,
            ..Default::default()
        }
    }

    pub fn spot(
        position: Vector3<f32>,
        direction: Vector3<f32>,
        color: Vector3<f32>,
        angle: f32,
        attenuation: f32,
    ) -> Self {
        Self {
            kind: LightKind::Spot,
            position,
            direction: direction.normalize(),
            ambient: color * 0.1,
            diffuse: color,
            specular: color,
            angle,
            attenuation,
        }
    }

    pub fn with_ambient(self, ambient: Vector3<f32>) -> Self {
        Self { ambient, ..self }
    }

    /// Points a spot or directional light at `target`.
    pub fn aim_at(&mut self, target: Vector3<f32>) {
        let direction = target - self.position;
        if direction.magnitude2() > f32::EPSILON {
            self.direction = direction.normalize();
        }
    }

    pub fn is_on(&self) -> bool {
        self.kind != LightKind::Off
    }

    pub fn to_gpu(&self) -> GpuLight {
        GpuLight {
            position: self.position.into(),
            kind: self.kind as u32,
            direction: self.direction.into(),
            cos_cutoff: self.angle.to_radians().cos(),
            ambient: self.ambient.into(),
            attenuation: self.attenuation,
            diffuse: self.diffuse.into(),
            _padding0: 0.0,
            specular: self.specular.into(),
            _padding1: 0.0,
        }
    }
}

/// Uniform layout of one light, 16-byte aligned rows
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GpuLight {
    pub position: [f32; 3],
    pub kind: u32,
    pub direction: [f32; 3],
    pub cos_cutoff: f32,
    pub ambient: [f32; 3],
    pub attenuation: f32,
    pub diffuse: [f32; 3],
    _padding0: f32,
    pub specular: [f32; 3],
    _padding1: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LightSet {
    slots: [Light; MAX_LIGHTS],
}

impl LightSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, index: usize, light: Light) -> Result<(), SceneError> {
        let slot = self
            .slots
            .get_mut(index)
            .ok_or(SceneError::LightSlotOutOfRange {
                index,
                max: MAX_LIGHTS,
            })?;
        *slot = light;
        Ok(())
    }

    pub fn get(&self, index: usize) -> Option<&Light> {
        self.slots.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Light> {
        self.slots.get_mut(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Light> {
        self.slots.iter()
    }

    pub fn active_count(&self) -> usize {
        self.slots.iter().filter(|light| light.is_on()).count()
    }

    pub fn to_gpu(&self) -> [GpuLight; MAX_LIGHTS] {
        self.slots.map(|light| light.to_gpu())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gpu_light_layout() {
        assert_eq!(std::mem::size_of::<GpuLight>(), 80);
        assert_eq!(std::mem::size_of::<[GpuLight; MAX_LIGHTS]>(), 400);
    }

    #[test]
    fn test_slots_default_off() {
        let lights = LightSet::new();
        assert_eq!(lights.iter().count(), MAX_LIGHTS);
        assert_eq!(lights.active_count(), 0);
        assert!(lights.to_gpu().iter().all(|l| l.kind == 0));
    }

    #[test]
    fn test_set_rejects_out_of_range() {
        let mut lights = LightSet::new();
        let sun = Light::directional(
            Vector3::new(0.0, 4.0, 0.0),
            Vector3::new(0.0, -1.0, 0.0),
            Vector3::new(0.0, 0.2, 0.4),
        );
        lights.set(0, sun).unwrap();
        lights.set(4, Light::point(Vector3::new(3.0, 6.0, 3.0), Vector3::new(1.0, 1.0, 0.0), 0.03)).unwrap();
        assert_eq!(lights.active_count(), 2);

        assert_eq!(
            lights.set(5, sun),
            Err(SceneError::LightSlotOutOfRange { index: 5, max: 5 })
        );
        assert_eq!(lights.active_count(), 2);
    }

    #[test]
    fn test_aim_at_normalizes() {
        let mut spot = Light::spot(
            Vector3::new(0.0, 1.0, 0.0),
            Vector3::new(0.0, -1.0, 0.0),
            Vector3::new(0.0, 0.0, 1.0),
            20.0,
            0.1,
        );
        spot.aim_at(Vector3::new(0.3, 0.0, 0.0));
        assert!((spot.direction.magnitude() - 1.0).abs() < 1e-5);
        assert!(spot.direction.x > 0.0 && spot.direction.y < 0.0);

        let gpu = spot.to_gpu();
        assert_eq!(gpu.kind, 3);
        assert!((gpu.cos_cutoff - 20f32.to_radians().cos()).abs() < 1e-6);
    }
}
