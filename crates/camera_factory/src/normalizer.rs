//! 原始传感器缓冲区 → 统一显示格式
//!
//! 基于 `image` crate：先转为 RGB，再缩放到目标尺寸，最后编码为目标像素格式。

use bytes::Bytes;
use contracts::{
    ContractError, DisplayFormat, FormatNormalizer, ImageFrame, PixelFormat, RawCapture,
};
use image::imageops::{self, FilterType};
use image::{DynamicImage, GrayImage, RgbImage};

/// 图像归一化器 (无状态，所有生产者线程共享)
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageNormalizer;

impl ImageNormalizer {
    fn to_rgb(raw: &RawCapture) -> Result<RgbImage, ContractError> {
        let tag = format!("frame-{}", raw.frame_id);
        let expected =
            raw.width as usize * raw.height as usize * raw.format.bytes_per_pixel();

        if raw.width == 0 || raw.height == 0 {
            return Err(ContractError::convert(tag, "zero-sized image"));
        }
        if raw.data.len() != expected {
            return Err(ContractError::convert(
                tag,
                format!("buffer length {} != expected {expected}", raw.data.len()),
            ));
        }

        let pixels: Vec<u8> = match raw.format {
            PixelFormat::Rgb8 => raw.data.to_vec(),
            PixelFormat::Bgr8 => raw
                .data
                .chunks_exact(3)
                .flat_map(|px| [px[2], px[1], px[0]])
                .collect(),
            PixelFormat::Bgra8 => raw
                .data
                .chunks_exact(4)
                .flat_map(|px| [px[2], px[1], px[0]])
                .collect(),
            PixelFormat::Mono8 => {
                let gray = GrayImage::from_raw(raw.width, raw.height, raw.data.to_vec())
                    .ok_or_else(|| ContractError::convert(&tag, "invalid mono buffer"))?;
                return Ok(DynamicImage::ImageLuma8(gray).to_rgb8());
            }
        };

        RgbImage::from_raw(raw.width, raw.height, pixels)
            .ok_or_else(|| ContractError::convert(tag, "invalid rgb buffer"))
    }

    fn encode(rgb: RgbImage, format: PixelFormat) -> Vec<u8> {
        match format {
            PixelFormat::Rgb8 => rgb.into_raw(),
            PixelFormat::Bgr8 => rgb.pixels().flat_map(|px| [px[2], px[1], px[0]]).collect(),
            PixelFormat::Bgra8 => rgb
                .pixels()
                .flat_map(|px| [px[2], px[1], px[0], u8::MAX])
                .collect(),
            PixelFormat::Mono8 => DynamicImage::ImageRgb8(rgb).to_luma8().into_raw(),
        }
    }
}

impl FormatNormalizer for ImageNormalizer {
    type Output = ImageFrame;

    fn convert(&self, raw: RawCapture, target: &DisplayFormat) -> Result<ImageFrame, ContractError> {
        if target.width == 0 || target.height == 0 {
            return Err(ContractError::convert(
                format!("frame-{}", raw.frame_id),
                "zero-sized display format",
            ));
        }

        let mut rgb = Self::to_rgb(&raw)?;
        if rgb.dimensions() != (target.width, target.height) {
            rgb = imageops::resize(&rgb, target.width, target.height, FilterType::Triangle);
        }

        Ok(ImageFrame {
            width: target.width,
            height: target.height,
            format: target.format,
            data: Bytes::from(Self::encode(rgb, target.format)),
        })
    }
}
