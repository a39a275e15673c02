pub mod error;
pub mod headers;
pub mod pixels;
pub mod encoder;
pub mod save;

pub use encoder::BitmapEncoder;
pub use error::EncodeError;
pub use pixels::{PixelBuffer, PixelSource};
pub use save::save_bitmap;
