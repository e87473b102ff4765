use crate::{decode_rgb565, Canvas, GraphicsError, GraphicsResult, PixelBlock};

/// One bitmap update as delivered by the display protocol.
///
/// `right`/`bottom` describe the visible extent; `width`/`height` describe the
/// transmitted bitmap, which may be padded past it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileUpdate {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
    pub width: u32,
    pub height: u32,
    pub bits_per_pixel: u32,
    pub compressed: bool,
    pub data: Vec<u8>,
}

pub fn tile_bytes_per_pixel(bits_per_pixel: u32) -> usize {
    if bits_per_pixel < 24 {
        2
    } else if bits_per_pixel < 32 {
        3
    } else {
        4
    }
}

pub trait TileCodec {
    fn decompress(
        &self,
        out: &mut [u8],
        width: u32,
        height: u32,
        input: &[u8],
        bytes_per_pixel: usize,
    ) -> GraphicsResult<()>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Lz4TileCodec;

impl TileCodec for Lz4TileCodec {
    fn decompress(
        &self,
        out: &mut [u8],
        _width: u32,
        _height: u32,
        input: &[u8],
        _bytes_per_pixel: usize,
    ) -> GraphicsResult<()> {
        let written = lz4_flex::block::decompress_into(input, out)
            .map_err(|err| GraphicsError::Codec(err.to_string()))?;
        if written != out.len() {
            return Err(GraphicsError::ShortBuffer {
                expected: out.len(),
                actual: written,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct PassthroughCodec;

impl TileCodec for PassthroughCodec {
    fn decompress(
        &self,
        out: &mut [u8],
        _width: u32,
        _height: u32,
        input: &[u8],
        _bytes_per_pixel: usize,
    ) -> GraphicsResult<()> {
        if input.len() < out.len() {
            return Err(GraphicsError::ShortBuffer {
                expected: out.len(),
                actual: input.len(),
            });
        }
        out.copy_from_slice(&input[..out.len()]);
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct TileDecoder<C> {
    codec: C,
}

impl<C: TileCodec> TileDecoder<C> {
    pub fn new(codec: C) -> Self {
        Self { codec }
    }

    pub fn decode(&self, update: &TileUpdate) -> GraphicsResult<PixelBlock> {
        if !update.compressed {
            return decode_rgb565(&update.data, update.width, update.height);
        }
        let size = tile_bytes_per_pixel(update.bits_per_pixel);
        let mut raw = vec![0u8; update.width as usize * update.height as usize * size];
        self.codec
            .decompress(&mut raw, update.width, update.height, &update.data, size)?;
        decode_rgb565(&raw, update.width, update.height)
    }

    pub fn apply(&self, update: &TileUpdate, canvas: &mut Canvas) -> GraphicsResult<()> {
        let block = self.decode(update)?;
        canvas.paste_block(&block, update.left, update.top)
    }
}
