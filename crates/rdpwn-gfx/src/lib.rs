pub mod canvas;
pub mod pixel;
pub mod tile;

pub use canvas::Canvas;
pub use pixel::{decode_rgb565, rgb565_to_rgb, PixelBlock, Rgb};
pub use tile::{
    tile_bytes_per_pixel, Lz4TileCodec, PassthroughCodec, TileCodec, TileDecoder, TileUpdate,
};

#[derive(Debug, thiserror::Error)]
pub enum GraphicsError {
    #[error("tile origin ({x}, {y}) outside {width}x{height} canvas")]
    OutOfBounds {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    },
    #[error("pixel buffer too short: expected {expected} bytes, got {actual}")]
    ShortBuffer { expected: usize, actual: usize },
    #[error("pixel block holds {actual} pixels, geometry needs {expected}")]
    GeometryMismatch { expected: usize, actual: usize },
    #[error("tile decompression failed: {0}")]
    Codec(String),
}

pub type GraphicsResult<T> = Result<T, GraphicsError>;
