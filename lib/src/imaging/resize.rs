use super::grid::{self, PixelGrid};

/// Crops the largest centered square out of the grid and scales it to
/// exactly `target`×`target`.
pub fn square_crop_then_scale(input: &PixelGrid, target: u32) -> PixelGrid {
    let (width, height) = input.dimensions();
    let side = width.min(height);
    let square = grid::crop(input, (width - side) / 2, (height - side) / 2, side, side);
    if side == target {
        return square;
    }
    grid::scale(&square, target, target)
}

/// Scales the grid down to `max_width`, keeping its aspect ratio. Grids that
/// are already narrow enough come back untouched; nothing is upscaled.
pub fn scale_down_to_width(input: PixelGrid, max_width: u32) -> PixelGrid {
    let (width, height) = input.dimensions();
    if width <= max_width {
        return input;
    }
    let scaled_height = (height as f64 * max_width as f64 / width as f64).round() as u32;
    grid::scale(&input, max_width, scaled_height.max(1))
}
