//! 图像帧 - 驱动原始输出与归一化后的显示帧
//!
//! 所有相机在进入核心之前必须归一化为同一分辨率/格式。

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// 像素格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PixelFormat {
    #[default]
    Rgb8,
    Bgr8,
    Bgra8,
    Mono8,
}

impl PixelFormat {
    /// 每像素字节数
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Rgb8 | PixelFormat::Bgr8 => 3,
            PixelFormat::Bgra8 => 4,
            PixelFormat::Mono8 => 1,
        }
    }
}

/// 驱动交付的原始采集结果
///
/// 由 `CaptureDriver::wait_for_capture` 返回，随后交给格式归一化器。
#[derive(Debug, Clone)]
pub struct RawCapture {
    /// 图像宽度
    pub width: u32,

    /// 图像高度
    pub height: u32,

    /// 传感器输出格式
    pub format: PixelFormat,

    /// 原始像素数据 (零拷贝)
    pub data: Bytes,

    /// 相机本地时间戳 (纳秒，任意 epoch)
    pub timestamp_ns: u64,

    /// 驱动帧序号 (用于诊断)
    pub frame_id: u64,
}

/// 归一化后的显示帧
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFrame {
    /// 图像宽度
    pub width: u32,

    /// 图像高度
    pub height: u32,

    /// 像素格式
    pub format: PixelFormat,

    /// 像素数据 (行优先，无填充)
    pub data: Bytes,
}

impl ImageFrame {
    /// 创建全零帧
    pub fn zeroed(width: u32, height: u32, format: PixelFormat) -> Self {
        let len = width as usize * height as usize * format.bytes_per_pixel();
        Self {
            width,
            height,
            format,
            data: Bytes::from(vec![0u8; len]),
        }
    }

    /// 期望的缓冲区长度
    pub fn expected_len(&self) -> usize {
        self.width as usize * self.height as usize * self.format.bytes_per_pixel()
    }
}

/// 统一显示格式 (归一化目标)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayFormat {
    /// 目标宽度
    #[serde(default = "default_display_width")]
    pub width: u32,

    /// 目标高度
    #[serde(default = "default_display_height")]
    pub height: u32,

    /// 目标像素格式
    #[serde(default)]
    pub format: PixelFormat,
}

fn default_display_width() -> u32 {
    640
}

fn default_display_height() -> u32 {
    480
}

impl Default for DisplayFormat {
    fn default() -> Self {
        Self {
            width: default_display_width(),
            height: default_display_height(),
            format: PixelFormat::Rgb8,
        }
    }
}

/// 网格空位占位
///
/// 网格中超出相机数量的格子用与真实帧同尺寸的空白帧填充。
pub trait Placeholder: Sized {
    /// 生成与 `self` 同尺寸同格式的空白值
    fn blank_like(&self) -> Self;
}

impl Placeholder for ImageFrame {
    fn blank_like(&self) -> Self {
        ImageFrame::zeroed(self.width, self.height, self.format)
    }
}
