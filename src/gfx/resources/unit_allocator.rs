//! Texture unit allocation
//!
//! Every texture and render-target attachment gets a stable [`TextureUnit`]
//! handle when it is created. Units are handed out by an explicit,
//! allocate-only counter owned by the render engine; nothing is ever freed
//! or reused during a run.

use std::fmt;

use log::debug;

use crate::error::ResourceError;

/// Stable handle of a texture known to the renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureUnit(u32);

impl TextureUnit {
    pub fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Display for TextureUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unit#{}", self.0)
    }
}

/// Allocate-only counter with a fixed capacity
#[derive(Debug)]
pub struct UnitAllocator {
    next: u32,
    capacity: u32,
}

impl UnitAllocator {
    pub fn new(capacity: u32) -> Self {
        Self { next: 0, capacity }
    }

    /// Hands out the next unit, or fails once `capacity` units exist.
    pub fn allocate(&mut self) -> Result<TextureUnit, ResourceError> {
        if self.next >= self.capacity {
            return Err(ResourceError::UnitsExhausted {
                capacity: self.capacity,
            });
        }
        let unit = TextureUnit(self.next);
        self.next += 1;
        debug!("Allocated texture {} ({}/{})", unit, self.next, self.capacity);
        Ok(unit)
    }

    pub fn allocated(&self) -> u32 {
        self.next
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn remaining(&self) -> u32 {
        self.capacity - self.next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_units_are_sequential() {
        let mut units = UnitAllocator::new(4);
        let a = units.allocate().unwrap();
        let b = units.allocate().unwrap();
        assert_eq!(a.index(), 0);
        assert_eq!(b.index(), 1);
        assert_eq!(units.remaining(), 2);
    }

    #[test]
    fn test_exhaustion_is_an_error() {
        let mut units = UnitAllocator::new(2);
        units.allocate().unwrap();
        units.allocate().unwrap();
        match units.allocate() {
            Err(ResourceError::UnitsExhausted { capacity }) => assert_eq!(capacity, 2),
            other => panic!("expected exhaustion, got {:?}", other),
        }
        // still exhausted, nothing was handed out
        assert!(units.allocate().is_err());
        assert_eq!(units.allocated(), 2);
    }
}
