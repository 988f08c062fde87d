//! CPU-side RGBA8 images generated at startup
//!
//! Used for solid fallback textures, stand-in textures for props and the
//! brush-stroke texture of the selection effect.

use rand::Rng;

use crate::error::ResourceError;

/// Number of strokes painted into the brush texture
pub const BRUSH_STROKES: usize = 4000;

/// Edge length the brush stroke radii are tuned for
const BRUSH_REFERENCE_SIZE: f32 = 1024.0;

#[derive(Debug, Clone, PartialEq)]
pub struct ImageData {
    pub width: u32,
    pub height: u32,
    /// Row-major RGBA8
    pub pixels: Vec<u8>,
}

impl ImageData {
    pub fn from_rgba(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, ResourceError> {
        let expected = width as usize * height as usize * 4;
        if pixels.len() != expected || expected == 0 {
            return Err(ResourceError::InvalidImageData {
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self { width, height, pixels })
    }

    pub fn solid(color: [u8; 4]) -> Self {
        Self {
            width: 1,
            height: 1,
            pixels: color.to_vec(),
        }
    }

    /// Two-color checkerboard with square `cell` pixels.
    pub fn checker(size: u32, cell: u32, a: [u8; 4], b: [u8; 4]) -> Self {
        let cell = cell.max(1);
        let mut pixels = Vec::with_capacity((size * size * 4) as usize);
        for y in 0..size {
            for x in 0..size {
                let color = if (x / cell + y / cell) % 2 == 0 { a } else { b };
                pixels.extend_from_slice(&color);
            }
        }
        Self {
            width: size,
            height: size,
            pixels,
        }
    }

    /// White canvas covered with random gray ellipses, elongated along x.
    pub fn brush<R: Rng>(rng: &mut R, size: u32, strokes: usize) -> Self {
        let mut image = Self {
            width: size,
            height: size,
            pixels: vec![255; (size * size * 4) as usize],
        };
        let scale = size as f32 / BRUSH_REFERENCE_SIZE;

        for _ in 0..strokes {
            let cx = rng.random_range(0.0..size as f32);
            let cy = rng.random_range(0.0..size as f32);
            let ry = rng.random_range(6.0..15.0) * scale;
            let rx = ry * rng.random_range(1.5..6.0);
            let gray = (rng.random_range(0.6..=1.0) * 255.0) as u8;
            image.fill_ellipse(cx, cy, rx, ry, gray);
        }
        image
    }

    fn fill_ellipse(&mut self, cx: f32, cy: f32, rx: f32, ry: f32, gray: u8) {
        if rx <= 0.0 || ry <= 0.0 {
            return;
        }
        let x0 = (cx - rx).floor().max(0.0) as u32;
        let x1 = ((cx + rx).ceil() as u32).min(self.width.saturating_sub(1));
        let y0 = (cy - ry).floor().max(0.0) as u32;
        let y1 = ((cy + ry).ceil() as u32).min(self.height.saturating_sub(1));

        for y in y0..=y1 {
            for x in x0..=x1 {
                let dx = (x as f32 + 0.5 - cx) / rx;
                let dy = (y as f32 + 0.5 - cy) / ry;
                if dx * dx + dy * dy <= 1.0 {
                    let i = ((y * self.width + x) * 4) as usize;
                    self.pixels[i..i + 3].fill(gray);
                }
            }
        }
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = ((y * self.width + x) * 4) as usize;
        let mut out = [0; 4];
        out.copy_from_slice(&self.pixels[i..i + 4]);
        Some(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_from_rgba_checks_length() {
        assert!(ImageData::from_rgba(2, 2, vec![0; 16]).is_ok());
        assert!(matches!(
            ImageData::from_rgba(2, 2, vec![0; 15]),
            Err(ResourceError::InvalidImageData { expected: 16, actual: 15 })
        ));
    }

    #[test]
    fn test_checker() {
        let image = ImageData::checker(4, 2, [0, 0, 0, 255], [255, 255, 255, 255]);
        assert_eq!(image.pixel(0, 0), Some([0, 0, 0, 255]));
        assert_eq!(image.pixel(2, 0), Some([255, 255, 255, 255]));
        assert_eq!(image.pixel(2, 2), Some([0, 0, 0, 255]));
        assert_eq!(image.pixel(4, 0), None);
    }

    #[test]
    fn test_brush_is_deterministic_and_gray() {
        let a = ImageData::brush(&mut StdRng::seed_from_u64(7), 128, 200);
        let b = ImageData::brush(&mut StdRng::seed_from_u64(7), 128, 200);
        assert_eq!(a, b);

        let min = (0.6 * 255.0) as u8;
        let mut painted = 0;
        for px in a.pixels.chunks(4) {
            assert_eq!(px[0], px[1]);
            assert_eq!(px[1], px[2]);
            assert_eq!(px[3], 255);
            assert!(px[0] >= min);
            if px[0] < 255 {
                painted += 1;
            }
        }
        assert!(painted > 0);
    }
}
