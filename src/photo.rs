//! Department user photos and the size-limited thumbnail pushed to AD
//!
//! The thumbnail must fit both a pixel box and a byte budget, so encoding is
//! retried with falling JPEG quality until it fits.

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::imageops::FilterType;
use image::{ColorType, DynamicImage, ImageEncoder};
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::config::PhotoConfig;
use crate::entity::department_user;
use crate::error::AppResult;

const PHOTO_DIR: &str = "user_photo";
const PHOTO_AD_DIR: &str = "user_photo_ad";

/// Lowest JPEG quality the retry loop will go to
const MIN_QUALITY: u8 = 5;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PhotoFormat {
    Jpeg,
    Png,
}

impl PhotoFormat {
    /// Format for an upload's declared content type. `None` means "assume JPEG";
    /// any other declared type is not thumbnailed.
    pub fn from_content_type(content_type: Option<&str>) -> Option<Self> {
        match content_type {
            None => Some(PhotoFormat::Jpeg),
            Some("image/jpeg") => Some(PhotoFormat::Jpeg),
            Some("image/png") => Some(PhotoFormat::Png),
            Some(_) => None,
        }
    }

    pub fn from_path(path: &str) -> Option<Self> {
        let ext = Path::new(path).extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "jpg" | "jpeg" => Some(PhotoFormat::Jpeg),
            "png" => Some(PhotoFormat::Png),
            _ => None,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            PhotoFormat::Jpeg => "jpg",
            PhotoFormat::Png => "png",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            PhotoFormat::Jpeg => "image/jpeg",
            PhotoFormat::Png => "image/png",
        }
    }
}

/// Encoded thumbnail
#[derive(Debug)]
pub struct EncodedPhoto {
    pub format: PhotoFormat,
    pub quality: u8,
    pub bytes: Vec<u8>,
}

fn encode(image: &DynamicImage, format: PhotoFormat, quality: u8) -> image::ImageResult<Vec<u8>> {
    let mut buf = Vec::new();
    match format {
        PhotoFormat::Jpeg => {
            let rgb = image.to_rgb8();
            JpegEncoder::new_with_quality(&mut buf, quality).encode(
                rgb.as_raw(),
                rgb.width(),
                rgb.height(),
                ColorType::Rgb8,
            )?;
        }
        PhotoFormat::Png => {
            let rgba = image.to_rgba8();
            PngEncoder::new(&mut buf).write_image(
                rgba.as_raw(),
                rgba.width(),
                rgba.height(),
                ColorType::Rgba8,
            )?;
        }
    }
    Ok(buf)
}

/// Shrink to fit the configured box (never enlarging).
fn fit(image: DynamicImage, size: u32) -> DynamicImage {
    if image.width() <= size && image.height() <= size {
        return image;
    }
    image.resize(size, size, FilterType::Lanczos3)
}

/// Build the directory thumbnail for an uploaded photo.
///
/// Returns `Ok(None)` when the declared content type is not one we thumbnail.
/// The last attempt is returned even if it is still over budget.
pub fn render_photo_ad(
    bytes: &[u8],
    content_type: Option<&str>,
    cfg: &PhotoConfig,
) -> image::ImageResult<Option<EncodedPhoto>> {
    let Some(mut format) = PhotoFormat::from_content_type(content_type) else {
        return Ok(None);
    };

    let image = fit(image::load_from_memory(bytes)?, cfg.size);
    let mut quality = cfg.quality.clamp(MIN_QUALITY, 100);
    let mut encoded = encode(&image, format, quality)?;

    for _ in 1..cfg.attempts.max(1) {
        if encoded.len() <= cfg.max_bytes {
            break;
        }
        match format {
            PhotoFormat::Png => format = PhotoFormat::Jpeg,
            PhotoFormat::Jpeg => quality = quality.saturating_sub(5).max(MIN_QUALITY),
        }
        encoded = encode(&image, format, quality)?;
    }

    if encoded.len() > cfg.max_bytes {
        tracing::warn!(
            "Photo thumbnail is {} bytes after {} attempts (budget {})",
            encoded.len(),
            cfg.attempts,
            cfg.max_bytes
        );
    }

    Ok(Some(EncodedPhoto {
        format,
        quality,
        bytes: encoded,
    }))
}

/// Photo files under the media root
#[derive(Clone, Debug)]
pub struct PhotoStore {
    root: PathBuf,
}

impl PhotoStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Relative path of an uploaded photo
    pub fn photo_path(user_id: i32, format: PhotoFormat) -> String {
        format!("{}/{}.{}", PHOTO_DIR, user_id, format.extension())
    }

    /// Relative path of a generated thumbnail
    pub fn photo_ad_path(user_id: i32, format: PhotoFormat) -> String {
        format!("{}/{}.{}", PHOTO_AD_DIR, user_id, format.extension())
    }

    pub fn absolute(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }

    pub async fn write(&self, relative: &str, bytes: &[u8]) -> AppResult<()> {
        let path = self.absolute(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&path, bytes).await?;
        Ok(())
    }

    pub async fn read(&self, relative: &str) -> AppResult<Vec<u8>> {
        Ok(fs::read(self.absolute(relative)).await?)
    }

    /// Remove a stored file; a file that is already gone is not an error.
    pub async fn delete(&self, relative: &str) -> AppResult<()> {
        match fs::remove_file(self.absolute(relative)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Regenerate (or drop) a user's thumbnail from their stored photo.
    ///
    /// Returns the new `photo_ad` value for the user record.
    pub async fn refresh_photo_ad(
        &self,
        user: &department_user::Model,
        content_type: Option<&str>,
        cfg: &PhotoConfig,
    ) -> AppResult<Option<String>> {
        let Some(photo) = user.photo.as_deref().filter(|p| !p.is_empty()) else {
            if let Some(old) = user.photo_ad.as_deref() {
                self.delete(old).await?;
            }
            return Ok(None);
        };

        let bytes = self.read(photo).await?;
        let Some(encoded) = render_photo_ad(&bytes, content_type, cfg)? else {
            return Ok(user.photo_ad.clone());
        };

        let path = Self::photo_ad_path(user.id, encoded.format);
        if let Some(old) = user.photo_ad.as_deref().filter(|old| *old != path) {
            self.delete(old).await?;
        }
        self.write(&path, &encoded.bytes).await?;
        tracing::debug!(
            "Wrote {} ({} bytes, quality {})",
            path,
            encoded.bytes.len(),
            encoded.quality
        );
        Ok(Some(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    /// Noisy image so that JPEG cannot compress it into the budget at high quality
    fn noisy(width: u32, height: u32) -> DynamicImage {
        let mut seed: u32 = 0x2545_f491;
        let img = RgbImage::from_fn(width, height, |_, _| {
            seed ^= seed << 13;
            seed ^= seed >> 17;
            seed ^= seed << 5;
            let [r, g, b, _] = seed.to_le_bytes();
            Rgb([r, g, b])
        });
        DynamicImage::ImageRgb8(img)
    }

    fn png_bytes(image: &DynamicImage) -> Vec<u8> {
        encode(image, PhotoFormat::Png, 100).unwrap()
    }

    #[test]
    fn test_content_type_mapping() {
        assert_eq!(PhotoFormat::from_content_type(None), Some(PhotoFormat::Jpeg));
        assert_eq!(PhotoFormat::from_content_type(Some("image/png")), Some(PhotoFormat::Png));
        assert_eq!(PhotoFormat::from_content_type(Some("image/gif")), None);
        assert_eq!(PhotoFormat::from_path("user_photo/7.PNG"), Some(PhotoFormat::Png));
        assert_eq!(PhotoStore::photo_ad_path(7, PhotoFormat::Jpeg), "user_photo_ad/7.jpg");
    }

    #[test]
    fn test_thumbnail_fits_box_and_keeps_aspect() {
        let source = png_bytes(&noisy(600, 300));
        let cfg = PhotoConfig::default();
        let out = render_photo_ad(&source, Some("image/jpeg"), &cfg).unwrap().unwrap();
        let thumb = image::load_from_memory(&out.bytes).unwrap();
        assert_eq!((thumb.width(), thumb.height()), (240, 120));
        assert_eq!(out.format, PhotoFormat::Jpeg);
    }

    #[test]
    fn test_small_images_are_not_enlarged() {
        let source = png_bytes(&noisy(40, 30));
        let out = render_photo_ad(&source, None, &PhotoConfig::default()).unwrap().unwrap();
        let thumb = image::load_from_memory(&out.bytes).unwrap();
        assert_eq!((thumb.width(), thumb.height()), (40, 30));
    }

    #[test]
    fn test_budget_drives_png_to_jpeg_and_lower_quality() {
        let source = png_bytes(&noisy(240, 240));
        let cfg = PhotoConfig::default();
        let out = render_photo_ad(&source, Some("image/png"), &cfg).unwrap().unwrap();
        // Noise never fits as PNG, so the second attempt onwards is JPEG.
        assert_eq!(out.format, PhotoFormat::Jpeg);
        assert!(out.quality < cfg.quality);
    }

    #[test]
    fn test_attempts_stop_once_within_budget() {
        let source = png_bytes(&DynamicImage::ImageRgb8(RgbImage::from_pixel(300, 300, Rgb([200, 10, 10]))));
        let cfg = PhotoConfig::default();
        let out = render_photo_ad(&source, Some("image/jpeg"), &cfg).unwrap().unwrap();
        assert!(out.bytes.len() <= cfg.max_bytes);
        assert_eq!(out.quality, cfg.quality);
    }

    #[test]
    fn test_unsupported_content_type_is_skipped() {
        let source = png_bytes(&noisy(10, 10));
        let out = render_photo_ad(&source, Some("image/gif"), &PhotoConfig::default()).unwrap();
        assert!(out.is_none());
    }
}
