//! 图像预处理 - 业务能力层
//!
//! 上传前把图像缩放到最长边不超过 [`MAX_IMAGE_SIZE`]，并统一编码为 PNG。

use crate::error::{AppResult, ImageError};
use image::imageops::FilterType;
use std::io::Cursor;
use tracing::debug;

/// 上传图像的最大边长
pub const MAX_IMAGE_SIZE: u32 = 1200;

/// 计算缩放后的尺寸，保持宽高比，缩放后的短边向下取整
pub fn fit_within(width: u32, height: u32, max: u32) -> (u32, u32) {
    if width <= max && height <= max {
        return (width, height);
    }
    if width > height {
        let scaled = (f64::from(height) * (f64::from(max) / f64::from(width))) as u32;
        (max, scaled.max(1))
    } else {
        let scaled = (f64::from(width) * (f64::from(max) / f64::from(height))) as u32;
        (scaled.max(1), max)
    }
}

/// 解码、缩放并编码为 PNG（阻塞操作）
pub fn encode_for_upload(bytes: &[u8]) -> Result<Vec<u8>, ImageError> {
    let img = image::load_from_memory(bytes).map_err(|source| ImageError::DecodeFailed { source })?;

    let (width, height) = fit_within(img.width(), img.height(), MAX_IMAGE_SIZE);
    let img = if (width, height) != (img.width(), img.height()) {
        debug!("缩放图像 {}x{} -> {}x{}", img.width(), img.height(), width, height);
        img.resize_exact(width, height, FilterType::Triangle)
    } else {
        img
    };

    let mut buffer = Cursor::new(Vec::new());
    img.write_to(&mut buffer, image::ImageFormat::Png)
        .map_err(|source| ImageError::EncodeFailed { source })?;
    Ok(buffer.into_inner())
}

/// 在阻塞线程池中执行 [`encode_for_upload`]
pub async fn prepare_for_upload(bytes: Vec<u8>) -> AppResult<Vec<u8>> {
    let png = tokio::task::spawn_blocking(move || encode_for_upload(&bytes))
        .await
        .map_err(|e| ImageError::TaskFailed { message: e.to_string() })??;
    Ok(png)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, RgbImage};

    fn encode(img: DynamicImage, format: image::ImageFormat) -> Vec<u8> {
        let mut buffer = Cursor::new(Vec::new());
        img.write_to(&mut buffer, format).unwrap();
        buffer.into_inner()
    }

    #[test]
    fn test_fit_within_keeps_small_images() {
        assert_eq!(fit_within(800, 600, 1200), (800, 600));
        assert_eq!(fit_within(1200, 1200, 1200), (1200, 1200));
    }

    #[test]
    fn test_fit_within_scales_longest_side() {
        assert_eq!(fit_within(2400, 1000, 1200), (1200, 500));
        assert_eq!(fit_within(1000, 2400, 1200), (500, 1200));
        assert_eq!(fit_within(3000, 3000, 1200), (1200, 1200));
        // 向下取整
        assert_eq!(fit_within(1300, 1000, 1200), (1200, 923));
    }

    #[tokio::test]
    async fn test_prepare_for_upload_outputs_png() {
        let img = DynamicImage::ImageRgb8(RgbImage::new(2400, 600));
        let bmp = encode(img, image::ImageFormat::Bmp);

        let png = prepare_for_upload(bmp).await.unwrap();

        assert_eq!(image::guess_format(&png).unwrap(), image::ImageFormat::Png);
        let decoded = image::load_from_memory(&png).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (1200, 300));
    }

    #[tokio::test]
    async fn test_prepare_for_upload_rejects_garbage() {
        let err = prepare_for_upload(b"not an image".to_vec()).await.unwrap_err();
        assert!(matches!(err, crate::error::AppError::Image(ImageError::DecodeFailed { .. })));
    }
}
