//! # 加载与校验模块
//!
//! ## 设计思路
//!
//! 统一处理不同来源（本地文件 / Base64 / 内存字节）的原始字节加载，
//! 并在“尽可能早”的阶段执行输入校验，尽快失败，减少不必要内存与 CPU 消耗。
//! 本子系统不产生任何网络 I/O，远端上传由外部协作方负责。
//!
//! ## 实现思路
//!
//! - 文件：存在性 + metadata 体积限制 + 读取。
//! - Base64：Data URL / 纯 Base64 解析 + 解码后体积限制。
//! - 字节：体积限制直通。
//! - 所有来源统一做图片签名校验（magic bytes），错误映射到 `CropError`。

use base64::{Engine as _, engine::general_purpose};
use std::path::Path;

use super::source::RawImageData;
use super::{CropConfig, CropError, CropSession};

impl CropSession {
    /// 从本地文件加载图片原始字节。
    pub(super) fn load_from_file(
        path: &str,
        config: &CropConfig,
    ) -> Result<RawImageData, CropError> {
        let file_path = Path::new(path);

        if !file_path.exists() {
            return Err(CropError::FileSystem(format!("文件不存在：{}", path)));
        }

        let metadata = std::fs::metadata(file_path)
            .map_err(|e| CropError::FileSystem(format!("读取文件信息失败：{}", e)))?;

        if metadata.len() > config.max_file_size {
            return Err(CropError::ResourceLimit(format!(
                "文件过大：{:.2} MB（限制：{:.2} MB）",
                metadata.len() as f64 / 1024.0 / 1024.0,
                config.max_file_size as f64 / 1024.0 / 1024.0
            )));
        }

        let bytes = std::fs::read(file_path)
            .map_err(|e| CropError::FileSystem(format!("读取文件失败：{}", e)))?;

        Self::validate_image_signature(&bytes)?;

        log::info!("📄 已加载文件 - path={} size={}KB", path, bytes.len() / 1024);

        Ok(RawImageData {
            bytes,
            source_hint: "file",
        })
    }

    /// 从 Base64（Data URL 或纯 Base64）加载图片原始字节。
    pub(super) fn load_from_base64(
        data: &str,
        config: &CropConfig,
    ) -> Result<RawImageData, CropError> {
        let bytes = Self::parse_base64(data)?;

        if bytes.len() as u64 > config.max_file_size {
            return Err(CropError::ResourceLimit(format!(
                "Base64 解码后体积过大：{:.2} MB（限制：{:.2} MB）",
                bytes.len() as f64 / 1024.0 / 1024.0,
                config.max_file_size as f64 / 1024.0 / 1024.0
            )));
        }

        Self::validate_image_signature(&bytes)?;

        Ok(RawImageData {
            bytes,
            source_hint: "base64",
        })
    }

    /// 直接接收调用方已读取的原始字节。
    pub(super) fn load_from_bytes(
        bytes: Vec<u8>,
        config: &CropConfig,
    ) -> Result<RawImageData, CropError> {
        if bytes.is_empty() {
            return Err(CropError::InvalidFormat("图片字节为空".to_string()));
        }

        if bytes.len() as u64 > config.max_file_size {
            return Err(CropError::ResourceLimit(format!(
                "图片字节过大：{:.2} MB（限制：{:.2} MB）",
                bytes.len() as f64 / 1024.0 / 1024.0,
                config.max_file_size as f64 / 1024.0 / 1024.0
            )));
        }

        Self::validate_image_signature(&bytes)?;

        Ok(RawImageData {
            bytes,
            source_hint: "bytes",
        })
    }

    /// 解析 Data URL 或纯 Base64 字符串为原始字节。
    pub(crate) fn parse_base64(data: &str) -> Result<Vec<u8>, CropError> {
        let payload = if let Some(comma) = data.find(',') {
            let header = &data[..comma];
            if !header.starts_with("data:") || !header.contains("base64") {
                return Err(CropError::InvalidFormat(
                    "Data URL 头部格式不正确".to_string(),
                ));
            }
            &data[comma + 1..]
        } else {
            data
        };

        general_purpose::STANDARD
            .decode(payload.trim())
            .map_err(|e| CropError::InvalidFormat(format!("Base64 解码失败：{}", e)))
    }

    /// 基于 magic bytes 的图片签名校验，返回识别出的 MIME 类型。
    ///
    /// 在完整解码前拦截明显的非图片输入。
    pub(super) fn validate_image_signature(bytes: &[u8]) -> Result<&'static str, CropError> {
        let kind = infer::get(bytes)
            .ok_or_else(|| CropError::InvalidFormat("无法识别图片签名".to_string()))?;

        if kind.matcher_type() != infer::MatcherType::Image {
            return Err(CropError::InvalidFormat(format!(
                "输入不是图片：{}",
                kind.mime_type()
            )));
        }

        Ok(kind.mime_type())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageBuffer, ImageFormat, Rgba};
    use std::io::Cursor;

    fn create_png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = ImageBuffer::from_fn(width, height, |x, y| {
            Rgba([(x % 255) as u8, (y % 255) as u8, 128, 255])
        });
        let dyn_img = DynamicImage::ImageRgba8(img);
        let mut cursor = Cursor::new(Vec::new());
        dyn_img
            .write_to(&mut cursor, ImageFormat::Png)
            .expect("failed to encode test image");
        cursor.into_inner()
    }

    #[test]
    fn parse_base64_accepts_data_url_and_bare_payload() {
        use base64::{Engine as _, engine::general_purpose};

        let png = create_png_bytes(4, 4);
        let encoded = general_purpose::STANDARD.encode(&png);

        let from_bare = CropSession::parse_base64(&encoded).expect("bare base64 should parse");
        assert_eq!(from_bare, png);

        let data_url = format!("data:image/png;base64,{}", encoded);
        let from_url = CropSession::parse_base64(&data_url).expect("data url should parse");
        assert_eq!(from_url, png);
    }

    #[test]
    fn parse_base64_rejects_malformed_header() {
        let result = CropSession::parse_base64("image/png;weird,QUJD");
        assert!(matches!(result, Err(CropError::InvalidFormat(_))));
    }

    #[test]
    fn signature_check_accepts_png_and_names_mime() {
        let png = create_png_bytes(2, 2);
        let mime = CropSession::validate_image_signature(&png)
            .expect("png signature should validate");
        assert_eq!(mime, "image/png");
    }

    #[test]
    fn signature_check_rejects_non_image_bytes() {
        let text = b"definitely not an image at all.............".to_vec();
        let result = CropSession::validate_image_signature(&text);
        assert!(matches!(result, Err(CropError::InvalidFormat(_))));
    }

    #[test]
    fn load_from_bytes_enforces_size_limit() {
        let mut config = CropConfig::default();
        config.max_file_size = 16;

        let png = create_png_bytes(8, 8);
        let result = CropSession::load_from_bytes(png, &config);
        assert!(matches!(result, Err(CropError::ResourceLimit(_))));
    }

    #[test]
    fn load_from_missing_file_is_explicit_error() {
        let config = CropConfig::default();
        let result = CropSession::load_from_file("/no/such/banner.png", &config);
        assert!(matches!(result, Err(CropError::FileSystem(_))));
    }
}
