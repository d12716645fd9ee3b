//! Pixel grid and primitive transforms.
//!
//! Every transform borrows its input and returns a new grid. Rotations by a
//! quarter turn swap width and height.

use image::imageops::{self, FilterType};
use image::RgbaImage;

/// Decoded RGBA pixels with explicit dimensions.
pub type PixelGrid = RgbaImage;

pub fn flip_horizontal(grid: &PixelGrid) -> PixelGrid {
    imageops::flip_horizontal(grid)
}

pub fn flip_vertical(grid: &PixelGrid) -> PixelGrid {
    imageops::flip_vertical(grid)
}

pub fn rotate_90_cw(grid: &PixelGrid) -> PixelGrid {
    imageops::rotate90(grid)
}

pub fn rotate_90_ccw(grid: &PixelGrid) -> PixelGrid {
    imageops::rotate270(grid)
}

pub fn rotate_180(grid: &PixelGrid) -> PixelGrid {
    imageops::rotate180(grid)
}

/// Cuts out the `width`×`height` region whose top-left corner is `(x, y)`.
pub fn crop(grid: &PixelGrid, x: u32, y: u32, width: u32, height: u32) -> PixelGrid {
    imageops::crop_imm(grid, x, y, width, height).to_image()
}

/// Resamples to exactly `width`×`height`.
pub fn scale(grid: &PixelGrid, width: u32, height: u32) -> PixelGrid {
    imageops::resize(grid, width, height, FilterType::CatmullRom)
}
