use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::ImageFormat;

use crate::config::Uploads;
use crate::error::{ErrorKind, Result};

use super::{
    correct_orientation, decode, encode_jpeg, scale_down_to_width, sniff,
    square_crop_then_scale, Quality, JPEG_MIME,
};

const AVATAR_FORMATS: &[ImageFormat] = &[ImageFormat::Jpeg, ImageFormat::Png];
const POST_FORMATS: &[ImageFormat] = &[ImageFormat::Jpeg, ImageFormat::Png, ImageFormat::WebP];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResizeRule {
    /// Centered square crop scaled to this edge length.
    Square(u32),
    /// Proportional scale down to at most this width.
    MaxWidth(u32),
}

/// How one kind of upload gets processed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadPolicy {
    pub max_bytes: usize,
    pub formats: &'static [ImageFormat],
    pub correct_orientation: bool,
    pub resize: ResizeRule,
    pub quality: Quality,
}

impl UploadPolicy {
    pub fn avatar(uploads: &Uploads) -> Self {
        Self {
            max_bytes: uploads.max_bytes,
            formats: AVATAR_FORMATS,
            correct_orientation: true,
            resize: ResizeRule::Square(uploads.avatar_size),
            quality: Quality::new(uploads.avatar_quality),
        }
    }

    pub fn post_image(uploads: &Uploads) -> Self {
        Self {
            max_bytes: uploads.max_bytes,
            formats: POST_FORMATS,
            correct_orientation: false,
            resize: ResizeRule::MaxWidth(uploads.post_max_width),
            quality: Quality::new(uploads.post_quality),
        }
    }

    /// One width variant of a multi-resolution upload.
    pub fn variant(uploads: &Uploads, width: u32) -> Self {
        Self {
            resize: ResizeRule::MaxWidth(width),
            quality: Quality::new(uploads.variant_quality),
            ..Self::post_image(uploads)
        }
    }

    /// Rejects a content type declared by the client that is present but
    /// outside the allow-list. The bytes get sniffed regardless.
    pub fn check_declared(&self, content_type: Option<&str>) -> Result<()> {
        match content_type {
            None => Ok(()),
            Some(declared) => match ImageFormat::from_mime_type(declared) {
                Some(format) if self.formats.contains(&format) => Ok(()),
                _ => Err(ErrorKind::UnsupportedImageType(declared.to_string()).into()),
            },
        }
    }
}

/// Re-encoded upload, ready to be stored.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProcessedImage {
    /// JPEG bytes.
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl ProcessedImage {
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.bytes)
    }

    pub fn to_data_uri(&self) -> String {
        format!("data:{JPEG_MIME};base64,{}", self.to_base64())
    }
}

/// Runs an upload through size check, sniffing, decoding, orientation,
/// resizing and JPEG encoding. Fails without side effects.
pub fn process(policy: &UploadPolicy, bytes: &[u8]) -> Result<ProcessedImage> {
    if bytes.len() > policy.max_bytes {
        return Err(ErrorKind::PayloadTooLarge(policy.max_bytes).into());
    }

    let format = sniff(bytes)?;
    if !policy.formats.contains(&format) {
        return Err(ErrorKind::UnsupportedImageType(format!("{format:?}").to_lowercase()).into());
    }

    let mut grid = decode(bytes, format)?;
    if policy.correct_orientation {
        grid = correct_orientation(bytes, grid);
    }
    let grid = match policy.resize {
        ResizeRule::Square(side) => square_crop_then_scale(&grid, side),
        ResizeRule::MaxWidth(width) => scale_down_to_width(grid, width),
    };

    let (width, height) = grid.dimensions();
    let bytes = encode_jpeg(&grid, policy.quality)?;
    Ok(ProcessedImage {
        bytes,
        width,
        height,
    })
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use image::{Rgba, RgbaImage};
    use rstest::rstest;

    use crate::imaging::orientation::tests::with_exif_orientation;

    use super::*;

    fn encoded(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
        let grid = RgbaImage::from_pixel(width, height, Rgba([90, 90, 30, 255]));
        let rgb: image::RgbImage = image::buffer::ConvertBuffer::convert(&grid);
        let mut out = Cursor::new(Vec::new());
        rgb.write_to(&mut out, format).unwrap();
        out.into_inner()
    }

    fn jpeg_dimensions(bytes: &[u8]) -> (u32, u32) {
        image::load_from_memory_with_format(bytes, ImageFormat::Jpeg)
            .unwrap()
            .to_rgba8()
            .dimensions()
    }

    #[test]
    fn avatar_is_square_jpeg() {
        let policy = UploadPolicy::avatar(&Uploads::default());
        let out = process(&policy, &encoded(300, 500, ImageFormat::Png)).unwrap();
        assert_eq!((out.width, out.height), (256, 256));
        assert_eq!(jpeg_dimensions(&out.bytes), (256, 256));
        assert!(out.to_data_uri().starts_with("data:image/jpeg;base64,"));
    }

    #[test]
    fn post_image_is_never_upscaled() {
        let policy = UploadPolicy::post_image(&Uploads::default());
        let out = process(&policy, &encoded(300, 500, ImageFormat::Png)).unwrap();
        assert_eq!((out.width, out.height), (300, 500));

        let out = process(&policy, &encoded(1600, 900, ImageFormat::Jpeg)).unwrap();
        assert_eq!((out.width, out.height), (800, 450));
    }

    #[test]
    fn variants_use_their_own_width() {
        let policy = UploadPolicy::variant(&Uploads::default(), 400);
        let out = process(&policy, &encoded(1200, 600, ImageFormat::Png)).unwrap();
        assert_eq!((out.width, out.height), (400, 200));
    }

    #[test]
    fn only_avatars_honour_exif_orientation() {
        let uploads = Uploads {
            avatar_size: 16,
            ..Default::default()
        };
        let rotated = with_exif_orientation(&encoded(40, 20, ImageFormat::Jpeg), 6);

        let post = process(&UploadPolicy::post_image(&uploads), &rotated).unwrap();
        assert_eq!((post.width, post.height), (40, 20));

        let avatar = process(&UploadPolicy::avatar(&uploads), &rotated).unwrap();
        assert_eq!((avatar.width, avatar.height), (16, 16));
    }

    #[test]
    fn oversized_payloads_fail_before_decoding() {
        let policy = UploadPolicy {
            max_bytes: 10,
            ..UploadPolicy::post_image(&Uploads::default())
        };
        let err = process(&policy, &[0u8; 11]).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::PayloadTooLarge(10)));
    }

    #[test]
    fn avatars_reject_webp() {
        let policy = UploadPolicy::avatar(&Uploads::default());
        // RIFF....WEBP is enough for the sniffer
        let mut webp = b"RIFF\0\0\0\0WEBPVP8 ".to_vec();
        webp.extend_from_slice(&[0u8; 16]);
        let err = process(&policy, &webp).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::UnsupportedImageType(_)));
    }

    #[test]
    fn corrupt_images_are_invalid() {
        let policy = UploadPolicy::post_image(&Uploads::default());
        let mut bytes = encoded(64, 64, ImageFormat::Png);
        bytes.truncate(40);
        let err = process(&policy, &bytes).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::InvalidImage(_)));
    }

    #[rstest]
    #[case(None, true)]
    #[case(Some("image/png"), true)]
    #[case(Some("image/jpeg"), true)]
    #[case(Some("image/webp"), false)]
    #[case(Some("text/plain"), false)]
    fn declared_types_are_checked_for_avatars(
        #[case] declared: Option<&str>,
        #[case] allowed: bool,
    ) {
        let policy = UploadPolicy::avatar(&Uploads::default());
        assert_eq!(policy.check_declared(declared).is_ok(), allowed);
    }
}
