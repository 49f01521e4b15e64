//! # 解码与预览模块
//!
//! ## 设计思路
//!
//! 将“字节 → 图像 → 预览”的过程集中管理，并在关键节点增加资源上限控制。
//! 优先做尺寸检查，再进行完整解码，降低恶意输入触发高内存开销的风险。
//!
//! ## 实现思路
//!
//! 1. 猜测格式并读取 header 尺寸
//! 2. 按像素/内存上限快速拒绝
//! 3. 完整解码
//! 4. 校验 RGBA 字节长度一致性
//! 5. 构建原始字节的 Data URL，供渲染层直接展示

use base64::{Engine as _, engine::general_purpose};
use image::{GenericImageView, ImageFormat, ImageReader};
use std::io::Cursor;

use super::source::{PreviewImage, RawImageData};
use super::{CropConfig, CropError, CropSession};

impl CropSession {
    /// 将原始字节解码为可供选区拖拽参照的预览。
    pub(super) fn decode_preview(
        raw: RawImageData,
        config: &CropConfig,
    ) -> Result<PreviewImage, CropError> {
        let _format: ImageFormat = image::guess_format(&raw.bytes)
            .map_err(|e| CropError::InvalidFormat(format!("不支持的图片格式：{}", e)))?;

        let (header_width, header_height) = Self::inspect_dimensions_from_memory(&raw.bytes)?;
        Self::validate_pixel_limits(config, header_width, header_height)?;
        Self::validate_decoded_memory_limits(config, header_width, header_height)?;

        let decoded = image::load_from_memory(&raw.bytes)
            .map_err(|e| CropError::Decode(format!("图片解码失败：{}", e)))?;

        let (natural_width, natural_height) = decoded.dimensions();
        Self::validate_pixel_limits(config, natural_width, natural_height)?;
        Self::validate_decoded_memory_limits(config, natural_width, natural_height)?;

        let expected_len = (natural_width as usize)
            .checked_mul(natural_height as usize)
            .and_then(|pixels| pixels.checked_mul(4))
            .ok_or_else(|| CropError::ResourceLimit("图片尺寸导致内存溢出风险".to_string()))?;

        if decoded.to_rgba8().len() != expected_len {
            return Err(CropError::Decode("解码后像素数据长度异常".to_string()));
        }

        let mime = Self::validate_image_signature(&raw.bytes)?;
        let data_url = format!(
            "data:{};base64,{}",
            mime,
            general_purpose::STANDARD.encode(&raw.bytes)
        );

        log::info!(
            "✅ 预览解码成功 - 来源: {} 自然尺寸: {}x{}",
            raw.source_hint,
            natural_width,
            natural_height
        );

        Ok(PreviewImage {
            image: decoded,
            natural_width,
            natural_height,
            data_url,
        })
    }

    /// 仅通过内存中的图片头信息读取宽高。
    ///
    /// 用于在完整解码前做像素限制检查。
    fn inspect_dimensions_from_memory(bytes: &[u8]) -> Result<(u32, u32), CropError> {
        let cursor = Cursor::new(bytes);
        let reader = ImageReader::new(cursor)
            .with_guessed_format()
            .map_err(|e| CropError::InvalidFormat(format!("无法识别图片格式：{}", e)))?;

        reader
            .into_dimensions()
            .map_err(|e| CropError::InvalidFormat(format!("无法读取图片尺寸：{}", e)))
    }

    /// 校验像素数量是否超过配置上限。
    fn validate_pixel_limits(
        config: &CropConfig,
        width: u32,
        height: u32,
    ) -> Result<(), CropError> {
        let pixels = (width as u64)
            .checked_mul(height as u64)
            .ok_or_else(|| CropError::ResourceLimit("图片像素数溢出".to_string()))?;

        if pixels > config.max_decoded_pixels {
            return Err(CropError::ResourceLimit(format!(
                "图片像素过大：{} 像素（限制：{} 像素）",
                pixels, config.max_decoded_pixels
            )));
        }

        Ok(())
    }

    fn validate_decoded_memory_limits(
        config: &CropConfig,
        width: u32,
        height: u32,
    ) -> Result<(), CropError> {
        let estimated = (width as u64)
            .checked_mul(height as u64)
            .and_then(|pixels| pixels.checked_mul(4))
            .ok_or_else(|| CropError::ResourceLimit("图片解码内存估算溢出".to_string()))?;

        if estimated > config.max_decoded_bytes {
            return Err(CropError::ResourceLimit(format!(
                "图片解码预计内存过大：{:.2} MB（限制：{:.2} MB）",
                estimated as f64 / 1024.0 / 1024.0,
                config.max_decoded_bytes as f64 / 1024.0 / 1024.0
            )));
        }

        Ok(())
    }
}
