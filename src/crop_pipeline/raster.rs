//! # 采样重绘模块
//!
//! ## 设计思路
//!
//! 选区以显示空间表达，采样必须按源分辨率取像素：
//! 先经 `ScaleFactors` 把选区映射为源矩形，从自然分辨率图像中裁出，
//! 再重绘到“选区显示空间宽高”大小的目标面上。
//! 目标面尺寸就是产物像素尺寸，不做二次缩放。
//!
//! ## 实现思路
//!
//! 1. 映射源矩形并夹取到源图边界内
//! 2. `crop_imm` 裁出源矩形
//! 3. 尺寸一致则直通，否则用 fast_image_resize 重绘
//! 4. fast_image_resize 失败时回退 `image::resize_exact`

use fast_image_resize as fr;
use image::{DynamicImage, GenericImageView, ImageBuffer, Rgba, imageops::FilterType};

use super::region::{CropRegion, ScaleFactors};
use super::{CropError, CropSession};

impl CropSession {
    /// 按缩放因子从源图采样选区，并重绘到显示空间输出尺寸。
    pub(super) fn rasterize(
        source: &DynamicImage,
        region: &CropRegion,
        scale: &ScaleFactors,
        filter: FilterType,
    ) -> Result<DynamicImage, CropError> {
        let (natural_width, natural_height) = source.dimensions();
        let (src_x, src_y, src_width, src_height) = scale.source_rect(region);

        let src_x = src_x.min(natural_width.saturating_sub(1));
        let src_y = src_y.min(natural_height.saturating_sub(1));
        let src_width = src_width.min(natural_width - src_x).max(1);
        let src_height = src_height.min(natural_height - src_y).max(1);

        let cropped = source.crop_imm(src_x, src_y, src_width, src_height);

        let (out_width, out_height) = region.output_size();

        log::info!(
            "🎯 采样矩形 ({}, {}, {}, {}) → 目标面 {}x{}",
            src_x,
            src_y,
            src_width,
            src_height,
            out_width,
            out_height
        );

        if (src_width, src_height) == (out_width, out_height) {
            return Ok(cropped);
        }

        match Self::resize_with_fast_image_resize(&cropped, out_width, out_height, filter) {
            Ok(resized) => Ok(resized),
            Err(err) => {
                log::warn!(
                    "⚠️ fast_image_resize 重绘失败，回退 image::resize_exact：{}",
                    err
                );
                Ok(cropped.resize_exact(out_width, out_height, filter))
            }
        }
    }

    fn resize_with_fast_image_resize(
        image: &DynamicImage,
        target_width: u32,
        target_height: u32,
        filter: FilterType,
    ) -> Result<DynamicImage, CropError> {
        let src = image.to_rgba8();
        let (src_width, src_height) = src.dimensions();

        let src_image = fr::images::Image::from_vec_u8(
            src_width,
            src_height,
            src.into_raw(),
            fr::PixelType::U8x4,
        )
        .map_err(|e| CropError::Decode(format!("构建源图像缓冲失败：{}", e)))?;

        let mut dst_image =
            fr::images::Image::new(target_width, target_height, fr::PixelType::U8x4);

        let mut resizer = fr::Resizer::new();
        let options = fr::ResizeOptions::new()
            .resize_alg(fr::ResizeAlg::Convolution(Self::to_fast_filter(filter)));

        resizer
            .resize(&src_image, &mut dst_image, Some(&options))
            .map_err(|e| CropError::Decode(format!("fast_image_resize 执行失败：{}", e)))?;

        let rgba = ImageBuffer::<Rgba<u8>, Vec<u8>>::from_raw(
            target_width,
            target_height,
            dst_image.into_vec(),
        )
        .ok_or_else(|| CropError::Decode("fast_image_resize 输出缓冲长度异常".to_string()))?;

        Ok(DynamicImage::ImageRgba8(rgba))
    }

    fn to_fast_filter(filter: FilterType) -> fr::FilterType {
        match filter {
            FilterType::Nearest => fr::FilterType::Box,
            FilterType::Triangle => fr::FilterType::Bilinear,
            FilterType::CatmullRom => fr::FilterType::CatmullRom,
            FilterType::Gaussian => fr::FilterType::Mitchell,
            FilterType::Lanczos3 => fr::FilterType::Lanczos3,
        }
    }
}
