//! # 编码与产物封装模块
//!
//! ## 设计思路
//!
//! 把目标面序列化为 JPEG 并封装成命名文件产物（`banner.jpg` / `image/jpeg`）。
//! 原型实现里编码器无产出时调用方会永久挂起，这里收敛为显式的
//! `CropError::Encode`，调用方一定能得到一个终态。
//!
//! ## 实现思路
//!
//! - JPEG 不支持 alpha 通道，编码前统一转 RGB8。
//! - 编码到内存 Cursor，产出为空即报错。

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, GenericImageView};
use std::io::Cursor;

use super::source::{ARTIFACT_FILE_NAME, ARTIFACT_MIME, OutputArtifact};
use super::{CropError, CropSession};

impl CropSession {
    /// 将目标面编码为 JPEG 并封装为交付产物。
    pub(super) fn encode_artifact(
        image: &DynamicImage,
        quality: u8,
    ) -> Result<OutputArtifact, CropError> {
        let (width, height) = image.dimensions();

        let rgb = DynamicImage::ImageRgb8(image.to_rgb8());

        let mut cursor = Cursor::new(Vec::new());
        let encoder = JpegEncoder::new_with_quality(&mut cursor, quality);
        rgb.write_with_encoder(encoder)
            .map_err(|e| CropError::Encode(format!("JPEG 编码失败：{}", e)))?;

        let bytes = cursor.into_inner();
        if bytes.is_empty() {
            return Err(CropError::Encode("编码器未产出任何数据".to_string()));
        }

        let byte_len = bytes.len();
        Ok(OutputArtifact {
            file_name: ARTIFACT_FILE_NAME.to_string(),
            mime: ARTIFACT_MIME,
            width,
            height,
            bytes,
            byte_len,
        })
    }
}
