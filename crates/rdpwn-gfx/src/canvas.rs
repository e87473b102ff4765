use crate::{GraphicsError, GraphicsResult, PixelBlock, Rgb};

/// The accumulating screen image.
///
/// Pastes clip at the right and bottom edges, since remote tiles carry row
/// padding past their visible extent. An origin outside the canvas is a
/// caller error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Canvas {
    width: u32,
    height: u32,
    pixels: Vec<Rgb>,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self::filled(width, height, Rgb::BLACK)
    }

    pub fn filled(width: u32, height: u32, color: Rgb) -> Self {
        Self {
            width,
            height,
            pixels: vec![color; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgb> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.pixels[self.index(x, y)])
    }

    pub fn paste(
        &mut self,
        tile: &[Rgb],
        dest_x: u32,
        dest_y: u32,
        tile_width: u32,
        tile_height: u32,
    ) -> GraphicsResult<()> {
        let expected = tile_width as usize * tile_height as usize;
        if tile.len() != expected {
            return Err(GraphicsError::GeometryMismatch {
                expected,
                actual: tile.len(),
            });
        }
        if dest_x >= self.width || dest_y >= self.height {
            return Err(GraphicsError::OutOfBounds {
                x: dest_x,
                y: dest_y,
                width: self.width,
                height: self.height,
            });
        }

        let visible_width = tile_width.min(self.width - dest_x) as usize;
        let visible_height = tile_height.min(self.height - dest_y);
        for row in 0..visible_height {
            let src = row as usize * tile_width as usize;
            let dst = self.index(dest_x, dest_y + row);
            self.pixels[dst..dst + visible_width].copy_from_slice(&tile[src..src + visible_width]);
        }
        Ok(())
    }

    pub fn paste_block(&mut self, block: &PixelBlock, dest_x: u32, dest_y: u32) -> GraphicsResult<()> {
        self.paste(&block.pixels, dest_x, dest_y, block.width, block.height)
    }

    pub fn copy(&self) -> Canvas {
        self.clone()
    }

    pub fn count_color(&self, color: Rgb) -> usize {
        self.pixels.iter().filter(|pixel| **pixel == color).count()
    }

    pub fn to_rgb_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.pixels.len() * 3);
        for pixel in &self.pixels {
            out.extend_from_slice(&[pixel.r, pixel.g, pixel.b]);
        }
        out
    }

    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paste_writes_at_offset() {
        let mut canvas = Canvas::new(4, 3);
        let tile = PixelBlock::filled(2, 2, Rgb::WHITE);
        canvas.paste_block(&tile, 1, 1).expect("paste");

        assert_eq!(canvas.pixel(0, 0), Some(Rgb::BLACK));
        assert_eq!(canvas.pixel(1, 1), Some(Rgb::WHITE));
        assert_eq!(canvas.pixel(2, 2), Some(Rgb::WHITE));
        assert_eq!(canvas.pixel(3, 2), Some(Rgb::BLACK));
        assert_eq!(canvas.count_color(Rgb::WHITE), 4);
    }

    #[test]
    fn paste_clips_padding_past_the_edge() {
        let mut canvas = Canvas::new(4, 4);
        let tile = PixelBlock::filled(4, 4, Rgb::WHITE);
        canvas.paste_block(&tile, 2, 3).expect("paste");
        assert_eq!(canvas.count_color(Rgb::WHITE), 2);
        assert_eq!(canvas.pixel(3, 3), Some(Rgb::WHITE));
    }

    #[test]
    fn paste_rejects_origin_outside_canvas() {
        let mut canvas = Canvas::new(4, 4);
        let tile = PixelBlock::filled(1, 1, Rgb::WHITE);
        let err = canvas.paste_block(&tile, 4, 0).unwrap_err();
        assert!(matches!(err, GraphicsError::OutOfBounds { x: 4, y: 0, .. }));
    }

    #[test]
    fn paste_rejects_mismatched_geometry() {
        let mut canvas = Canvas::new(4, 4);
        let err = canvas.paste(&[Rgb::WHITE; 3], 0, 0, 2, 2).unwrap_err();
        assert!(matches!(err, GraphicsError::GeometryMismatch { .. }));
    }

    #[test]
    fn copy_is_independent() {
        let mut canvas = Canvas::new(2, 2);
        let snapshot = canvas.copy();
        canvas
            .paste_block(&PixelBlock::filled(1, 1, Rgb::WHITE), 0, 0)
            .expect("paste");
        assert_eq!(snapshot.count_color(Rgb::WHITE), 0);
        assert_eq!(canvas.count_color(Rgb::WHITE), 1);
    }

    #[test]
    fn rgb_bytes_follow_row_order() {
        let mut canvas = Canvas::new(2, 1);
        canvas
            .paste_block(&PixelBlock::filled(1, 1, Rgb::new(1, 2, 3)), 1, 0)
            .expect("paste");
        assert_eq!(canvas.to_rgb_bytes(), vec![0, 0, 0, 1, 2, 3]);
    }
}
