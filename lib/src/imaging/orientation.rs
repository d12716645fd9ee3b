use std::io::Cursor;

use super::grid::{self, PixelGrid};

/// EXIF orientation (tag 0x0112) and the transform that corrects it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Orientation {
    /// 1
    Normal,
    /// 2
    FlipHorizontal,
    /// 3
    Rotate180,
    /// 4
    FlipVertical,
    /// 5: flip horizontal, then rotate 90° counter-clockwise
    Transpose,
    /// 6
    Rotate90Cw,
    /// 7: flip horizontal, then rotate 90° clockwise
    Transverse,
    /// 8
    Rotate90Ccw,
}

impl Orientation {
    pub const ALL: [Orientation; 8] = [
        Orientation::Normal,
        Orientation::FlipHorizontal,
        Orientation::Rotate180,
        Orientation::FlipVertical,
        Orientation::Transpose,
        Orientation::Rotate90Cw,
        Orientation::Transverse,
        Orientation::Rotate90Ccw,
    ];

    /// Maps a raw tag value. Anything outside 1..=8 has no meaning.
    pub fn from_tag(tag: u32) -> Option<Self> {
        match tag {
            1..=8 => Some(Self::ALL[tag as usize - 1]),
            _ => None,
        }
    }

    pub fn tag(&self) -> u32 {
        match self {
            Orientation::Normal => 1,
            Orientation::FlipHorizontal => 2,
            Orientation::Rotate180 => 3,
            Orientation::FlipVertical => 4,
            Orientation::Transpose => 5,
            Orientation::Rotate90Cw => 6,
            Orientation::Transverse => 7,
            Orientation::Rotate90Ccw => 8,
        }
    }

    /// Applies the correction for this orientation.
    pub fn apply(&self, input: &PixelGrid) -> PixelGrid {
        match self {
            Orientation::Normal => input.clone(),
            Orientation::FlipHorizontal => grid::flip_horizontal(input),
            Orientation::Rotate180 => grid::rotate_180(input),
            Orientation::FlipVertical => grid::flip_vertical(input),
            Orientation::Transpose => grid::rotate_90_ccw(&grid::flip_horizontal(input)),
            Orientation::Rotate90Cw => grid::rotate_90_cw(input),
            Orientation::Transverse => grid::rotate_90_cw(&grid::flip_horizontal(input)),
            Orientation::Rotate90Ccw => grid::rotate_90_ccw(input),
        }
    }

    /// The orientation whose correction undoes this one's.
    pub fn inverse(&self) -> Self {
        match self {
            Orientation::Rotate90Cw => Orientation::Rotate90Ccw,
            Orientation::Rotate90Ccw => Orientation::Rotate90Cw,
            other => *other,
        }
    }

    pub fn swaps_dimensions(&self) -> bool {
        matches!(
            self,
            Orientation::Transpose
                | Orientation::Rotate90Cw
                | Orientation::Transverse
                | Orientation::Rotate90Ccw
        )
    }
}

/// Reads the orientation tag from the image's EXIF block, if it has one.
pub fn read_orientation(bytes: &[u8]) -> Option<u32> {
    let mut cursor = Cursor::new(bytes);
    let exif = exif::Reader::new().read_from_container(&mut cursor).ok()?;
    exif.get_field(exif::Tag::Orientation, exif::In::PRIMARY)
        .and_then(|field| field.value.get_uint(0))
}

/// Rotates/flips the decoded grid upright according to the EXIF tag found
/// in `bytes`. Missing EXIF data, a missing tag or an unknown value leave
/// the grid as it is.
pub fn correct_orientation(bytes: &[u8], input: PixelGrid) -> PixelGrid {
    match read_orientation(bytes).and_then(Orientation::from_tag) {
        None | Some(Orientation::Normal) => input,
        Some(orientation) => {
            tracing::debug!(tag = orientation.tag(), "correcting orientation");
            orientation.apply(&input)
        }
    }
}
