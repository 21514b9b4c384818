//! 网格拼接
//!
//! 每个格子按 `(col * w, row * h)` 放置，所有格子尺寸相同。

use contracts::{Composite, ImageFrame, PixelFormat};
use image::imageops;
use image::{DynamicImage, GrayImage, RgbImage};

use crate::error::RenderError;

/// 显示帧 → RGB 图像
pub fn frame_to_rgb(frame: &ImageFrame) -> Option<RgbImage> {
    if frame.data.len() != frame.expected_len() {
        return None;
    }

    match frame.format {
        PixelFormat::Rgb8 => RgbImage::from_raw(frame.width, frame.height, frame.data.to_vec()),
        PixelFormat::Bgr8 => RgbImage::from_raw(
            frame.width,
            frame.height,
            frame
                .data
                .chunks_exact(3)
                .flat_map(|px| [px[2], px[1], px[0]])
                .collect(),
        ),
        PixelFormat::Bgra8 => RgbImage::from_raw(
            frame.width,
            frame.height,
            frame
                .data
                .chunks_exact(4)
                .flat_map(|px| [px[2], px[1], px[0]])
                .collect(),
        ),
        PixelFormat::Mono8 => GrayImage::from_raw(frame.width, frame.height, frame.data.to_vec())
            .map(|gray| DynamicImage::ImageLuma8(gray).to_rgb8()),
    }
}

/// 将合成帧拼接为一张网格图像
///
/// # Errors
/// 空合成帧、格子尺寸不一致或缓冲区长度错误时返回 `RenderError::Compose`。
pub fn compose_grid(composite: &Composite<ImageFrame>) -> Result<RgbImage, RenderError> {
    let cycle_id = composite.cycle_id;
    let layout = composite.layout;

    let first = composite
        .cells
        .first()
        .map(|cell| cell.payload())
        .ok_or_else(|| RenderError::compose(cycle_id, "empty composite"))?;
    let (width, height) = (first.width, first.height);

    if composite.cells.len() != layout.cell_count() {
        return Err(RenderError::compose(
            cycle_id,
            format!(
                "{} cells for a {}x{} grid",
                composite.cells.len(),
                layout.rows,
                layout.cols
            ),
        ));
    }

    let mut canvas = RgbImage::new(width * layout.cols as u32, height * layout.rows as u32);

    for (index, cell) in composite.cells.iter().enumerate() {
        let frame = cell.payload();
        if (frame.width, frame.height) != (width, height) {
            return Err(RenderError::compose(
                cycle_id,
                format!(
                    "cell {index} is {}x{}, expected {width}x{height}",
                    frame.width, frame.height
                ),
            ));
        }

        let tile = frame_to_rgb(frame)
            .ok_or_else(|| RenderError::compose(cycle_id, format!("cell {index} has a bad buffer")))?;

        let (row, col) = layout.position(index);
        imageops::replace(
            &mut canvas,
            &tile,
            (col as u32 * width) as i64,
            (row as u32 * height) as i64,
        );
    }

    Ok(canvas)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use contracts::{GridCell, GridLayout, SyncDiagnostics, TimedItem};

    fn solid(value: u8) -> ImageFrame {
        ImageFrame {
            width: 2,
            height: 2,
            format: PixelFormat::Rgb8,
            data: Bytes::from(vec![value; 12]),
        }
    }

    fn composite(values: &[u8]) -> Composite<ImageFrame> {
        let layout = GridLayout::for_sources(values.len());
        let mut cells: Vec<_> = values
            .iter()
            .enumerate()
            .map(|(i, &v)| GridCell::Source(TimedItem::new(solid(v), i as u64, i)))
            .collect();
        while cells.len() < layout.cell_count() {
            cells.push(GridCell::Blank(ImageFrame::zeroed(2, 2, PixelFormat::Rgb8)));
        }

        Composite {
            cycle_id: 1,
            layout,
            cells,
            diagnostics: SyncDiagnostics::default(),
        }
    }

    #[test]
    fn test_three_sources_tile_2x2_with_blank() {
        let image = compose_grid(&composite(&[10, 20, 30])).unwrap();

        assert_eq!(image.dimensions(), (4, 4));
        assert_eq!(image.get_pixel(0, 0).0, [10, 10, 10]);
        assert_eq!(image.get_pixel(2, 0).0, [20, 20, 20]);
        assert_eq!(image.get_pixel(0, 2).0, [30, 30, 30]);
        assert_eq!(image.get_pixel(3, 3).0, [0, 0, 0]);
    }

    #[test]
    fn test_single_source() {
        let image = compose_grid(&composite(&[99])).unwrap();
        assert_eq!(image.dimensions(), (2, 2));
        assert_eq!(image.get_pixel(1, 1).0, [99, 99, 99]);
    }

    #[test]
    fn test_mismatched_cell_rejected() {
        let mut bad = composite(&[1, 2]);
        bad.cells[1] = GridCell::Blank(ImageFrame::zeroed(3, 3, PixelFormat::Rgb8));
        assert!(matches!(
            compose_grid(&bad),
            Err(RenderError::Compose { cycle_id: 1, .. })
        ));
    }

    #[test]
    fn test_bgr_frame_to_rgb() {
        let frame = ImageFrame {
            width: 1,
            height: 1,
            format: PixelFormat::Bgr8,
            data: Bytes::from(vec![1, 2, 3]),
        };
        assert_eq!(frame_to_rgb(&frame).unwrap().get_pixel(0, 0).0, [3, 2, 1]);
    }
}
