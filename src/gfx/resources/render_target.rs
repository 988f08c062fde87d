//! Offscreen render targets and their binding discipline
//!
//! At most one target is bound as the active draw destination. While it is
//! bound, none of its attachments may be sampled: the shadow target must be
//! unbound before the color pass reads its depth, and the color target
//! before the display pass reads its color.

use std::fmt;

use log::trace;

use super::unit_allocator::TextureUnit;
use crate::error::{RenderError, ResourceError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TargetId(u32);

impl TargetId {
    pub fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "target#{}", self.0)
    }
}

/// Size and attachments of one offscreen target
#[derive(Debug, Clone, PartialEq)]
pub struct RenderTargetDesc {
    pub id: TargetId,
    pub label: String,
    pub width: u32,
    pub height: u32,
    /// Absent for depth-only targets
    pub color: Option<TextureUnit>,
    pub depth: TextureUnit,
}

impl RenderTargetDesc {
    pub fn owns(&self, unit: TextureUnit) -> bool {
        self.depth == unit || self.color == Some(unit)
    }

    pub fn color_unit(&self) -> Result<TextureUnit, RenderError> {
        self.color.ok_or(RenderError::TargetWithoutColor(self.id))
    }
}

/// Registry of targets plus the one that is currently bound
#[derive(Debug, Default)]
pub struct TargetBinding {
    targets: Vec<RenderTargetDesc>,
    bound: Option<TargetId>,
}

impl TargetBinding {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        label: impl Into<String>,
        width: u32,
        height: u32,
        color: Option<TextureUnit>,
        depth: TextureUnit,
    ) -> Result<TargetId, ResourceError> {
        let label = label.into();
        if width == 0 || height == 0 {
            return Err(ResourceError::ZeroSizedTarget {
                label,
                width,
                height,
            });
        }

        let id = TargetId(self.targets.len() as u32);
        self.targets.push(RenderTargetDesc {
            id,
            label,
            width,
            height,
            color,
            depth,
        });
        Ok(id)
    }

    pub fn desc(&self, id: TargetId) -> Result<&RenderTargetDesc, ResourceError> {
        self.targets
            .get(id.0 as usize)
            .ok_or(ResourceError::UnknownTarget(id))
    }

    pub fn resize(&mut self, id: TargetId, width: u32, height: u32) -> Result<(), ResourceError> {
        let desc = self
            .targets
            .get_mut(id.0 as usize)
            .ok_or(ResourceError::UnknownTarget(id))?;
        if width == 0 || height == 0 {
            return Err(ResourceError::ZeroSizedTarget {
                label: desc.label.clone(),
                width,
                height,
            });
        }
        desc.width = width;
        desc.height = height;
        Ok(())
    }

    pub fn bind(&mut self, id: TargetId) -> Result<(), RenderError> {
        self.desc(id)?;
        if let Some(bound) = self.bound {
            return Err(RenderError::TargetAlreadyBound {
                bound,
                requested: id,
            });
        }
        trace!("Bound {}", id);
        self.bound = Some(id);
        Ok(())
    }

    pub fn unbind(&mut self) -> Result<TargetId, RenderError> {
        let id = self.bound.take().ok_or(RenderError::NoTargetBound)?;
        trace!("Unbound {}", id);
        Ok(id)
    }

    pub fn bound(&self) -> Option<TargetId> {
        self.bound
    }

    pub fn owner_of(&self, unit: TextureUnit) -> Option<TargetId> {
        self.targets
            .iter()
            .find(|desc| desc.owns(unit))
            .map(|desc| desc.id)
    }

    /// Fails if `unit` is an attachment of the bound target.
    pub fn check_sample(&self, unit: TextureUnit) -> Result<(), RenderError> {
        let Some(bound) = self.bound else {
            return Ok(());
        };
        if self.desc(bound)?.owns(unit) {
            return Err(RenderError::SampledWhileBound {
                unit,
                target: bound,
            });
        }
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = &RenderTargetDesc> {
        self.targets.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::resources::unit_allocator::UnitAllocator;

    fn two_targets() -> (TargetBinding, TargetId, TargetId, [TextureUnit; 3]) {
        let mut units = UnitAllocator::new(8);
        let shadow_depth = units.allocate().unwrap();
        let color = units.allocate().unwrap();
        let color_depth = units.allocate().unwrap();

        let mut targets = TargetBinding::new();
        let shadow = targets.register("shadow", 2048, 2048, None, shadow_depth).unwrap();
        let draw = targets.register("draw", 800, 600, Some(color), color_depth).unwrap();
        (targets, shadow, draw, [shadow_depth, color, color_depth])
    }

    #[test]
    fn test_single_bound_target() {
        let (mut targets, shadow, draw, _) = two_targets();
        targets.bind(shadow).unwrap();
        assert!(matches!(
            targets.bind(draw),
            Err(RenderError::TargetAlreadyBound { bound, requested }) if bound == shadow && requested == draw
        ));
        assert_eq!(targets.unbind().unwrap(), shadow);
        targets.bind(draw).unwrap();
        assert_eq!(targets.bound(), Some(draw));
    }

    #[test]
    fn test_unbind_without_bind() {
        let mut targets = TargetBinding::new();
        assert!(matches!(targets.unbind(), Err(RenderError::NoTargetBound)));
    }

    #[test]
    fn test_sampling_bound_attachment_fails() {
        let (mut targets, shadow, draw, [shadow_depth, color, _]) = two_targets();

        targets.bind(shadow).unwrap();
        assert!(matches!(
            targets.check_sample(shadow_depth),
            Err(RenderError::SampledWhileBound { target, .. }) if target == shadow
        ));
        targets.unbind().unwrap();

        targets.bind(draw).unwrap();
        targets.check_sample(shadow_depth).unwrap();
        assert!(targets.check_sample(color).is_err());
        targets.unbind().unwrap();
        targets.check_sample(color).unwrap();

        assert_eq!(targets.owner_of(color), Some(draw));
    }

    #[test]
    fn test_zero_size_rejected() {
        let mut units = UnitAllocator::new(1);
        let depth = units.allocate().unwrap();
        let mut targets = TargetBinding::new();
        assert!(matches!(
            targets.register("empty", 0, 10, None, depth),
            Err(ResourceError::ZeroSizedTarget { .. })
        ));
    }

    #[test]
    fn test_depth_only_target_has_no_color() {
        let (targets, shadow, draw, [_, color, _]) = two_targets();
        assert!(matches!(
            targets.desc(shadow).unwrap().color_unit(),
            Err(RenderError::TargetWithoutColor(id)) if id == shadow
        ));
        assert_eq!(targets.desc(draw).unwrap().color_unit().unwrap(), color);
    }
}
