//! Image ingestion: decode, orient, resize, re-encode.
//!
//! | Step | Crate / function |
//! |---|---|
//! | **Sniff** | `image::guess_format` |
//! | **Decode** (JPEG, PNG, WebP) | `image::load_from_memory_with_format` |
//! | **Orientation** | `kamadak-exif` tag 0x0112, then [`Orientation::apply`] |
//! | **Resize** | `image::imageops::resize` with `CatmullRom` |
//! | **Encode** | `image::codecs::jpeg::JpegEncoder` |
//!
//! The module is split into:
//! - **Grid**: [`PixelGrid`] and the pure transforms everything else is
//!   built from
//! - **Orientation**: the eight EXIF corrections
//! - **Resize**: square crop for avatars, width cap for post images
//! - **Codec**: format sniffing, decoding and JPEG encoding
//! - **Pipeline**: [`UploadPolicy`] and [`process`], which run the steps
//!   above in order and fail before anything is persisted

mod codec;
pub mod grid;
mod orientation;
mod pipeline;
mod resize;

pub use codec::{decode, encode_jpeg, sniff, Quality};
pub use grid::PixelGrid;
pub use orientation::{correct_orientation, read_orientation, Orientation};
pub use pipeline::{process, ProcessedImage, ResizeRule, UploadPolicy};
pub use resize::{scale_down_to_width, square_crop_then_scale};

pub const JPEG_MIME: &str = "image/jpeg";
