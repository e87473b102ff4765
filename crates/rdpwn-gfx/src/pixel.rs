use crate::{GraphicsError, GraphicsResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// Expands a packed 5-6-5 pixel to full-range channels. Red sits in the high
/// bits, so 0xFFFF maps to white and 0x0000 to black.
pub fn rgb565_to_rgb(pixel: u16) -> Rgb {
    let r = (pixel >> 11) & 0x1f;
    let g = (pixel >> 5) & 0x3f;
    let b = pixel & 0x1f;
    Rgb {
        r: (r as u32 * 255 / 31) as u8,
        g: (g as u32 * 255 / 63) as u8,
        b: (b as u32 * 255 / 31) as u8,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBlock {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<Rgb>,
}

impl PixelBlock {
    pub fn new(width: u32, height: u32, pixels: Vec<Rgb>) -> GraphicsResult<Self> {
        let expected = width as usize * height as usize;
        if pixels.len() != expected {
            return Err(GraphicsError::GeometryMismatch {
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn filled(width: u32, height: u32, color: Rgb) -> Self {
        Self {
            width,
            height,
            pixels: vec![color; width as usize * height as usize],
        }
    }
}

/// Reads `width * height` little-endian RGB565 pixels from `data`.
///
/// Bytes past the first `width * height * 2` are ignored; wider tile formats
/// are still read two bytes per pixel.
pub fn decode_rgb565(data: &[u8], width: u32, height: u32) -> GraphicsResult<PixelBlock> {
    let count = width as usize * height as usize;
    let expected = count * 2;
    if data.len() < expected {
        return Err(GraphicsError::ShortBuffer {
            expected,
            actual: data.len(),
        });
    }
    let pixels = data[..expected]
        .chunks_exact(2)
        .map(|pair| rgb565_to_rgb(u16::from_le_bytes([pair[0], pair[1]])))
        .collect();
    Ok(PixelBlock {
        width,
        height,
        pixels,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rgb565_extremes_map_to_black_and_white() {
        assert_eq!(rgb565_to_rgb(0x0000), Rgb::BLACK);
        assert_eq!(rgb565_to_rgb(0xffff), Rgb::WHITE);
        assert_eq!(rgb565_to_rgb(0xf800), Rgb::new(255, 0, 0));
        assert_eq!(rgb565_to_rgb(0x07e0), Rgb::new(0, 255, 0));
        assert_eq!(rgb565_to_rgb(0x001f), Rgb::new(0, 0, 255));
    }

    #[test]
    fn decode_reads_little_endian_pairs() {
        let data = [0xff, 0xff, 0x00, 0x00, 0x00, 0xf8];
        let block = decode_rgb565(&data, 3, 1).expect("decode");
        assert_eq!(block.pixels, vec![Rgb::WHITE, Rgb::BLACK, Rgb::new(255, 0, 0)]);
    }

    #[test]
    fn decode_rejects_short_buffer() {
        let err = decode_rgb565(&[0u8; 7], 2, 2).unwrap_err();
        assert!(matches!(
            err,
            GraphicsError::ShortBuffer {
                expected: 8,
                actual: 7
            }
        ));
    }

    #[test]
    fn decode_ignores_trailing_bytes() {
        let block = decode_rgb565(&[0u8; 12], 2, 2).expect("decode");
        assert_eq!(block.pixels.len(), 4);
    }
}
