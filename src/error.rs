//! 统一错误类型模块
//!
//! # 设计思路
//!
//! 定义全局统一的 `AppError` 枚举，替代各模块中分散的
//! `.map_err(|e| e.to_string())`、`format!(...)`、`expect()` 等不一致模式。
//!
//! 对外 API（库调用方与 CLI）统一返回 `Result<T, AppError>`，
//! 上层通过 `Serialize` 获得结构化的错误信息。
//!
//! # 实现思路
//!
//! - 使用 `thiserror` 派生可读错误消息。
//! - 为 `CropError` 提供 `From` 转换，无需手动 map。
//! - 实现 `Serialize` 将错误序列化为字符串，便于直接透传给 UI 层。

use serde::Serialize;

use crate::crop_pipeline::CropError;

/// 应用级统一错误类型
///
/// 库的对外入口与 CLI 均返回此类型，确保调用方收到一致的错误格式。
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// 裁剪流水线错误（加载 / 解码 / 裁剪 / 编码）
    #[error("{0}")]
    Crop(#[from] CropError),

    /// 文件系统 I/O 错误
    #[error("文件系统错误: {0}")]
    Io(#[from] std::io::Error),

    /// 调用方传入的参数不合法（CLI 参数校验等）
    #[error("参数错误: {0}")]
    InvalidArgument(String),

    /// 元信息序列化失败
    #[error("序列化错误: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Serialize for AppError {
    /// 序列化为字符串，UI 层拿到的是用户可读的错误文案。
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crop_error_converts_into_app_error() {
        let crop = CropError::InvalidState("尚未加载预览".to_string());
        let app: AppError = crop.into();
        assert!(matches!(app, AppError::Crop(CropError::InvalidState(_))));
    }

    #[test]
    fn app_error_serializes_to_string() {
        let app = AppError::InvalidArgument("width 必须大于 0".to_string());
        let json = serde_json::to_string(&app).expect("serialize should succeed");
        assert!(json.contains("width"));
    }
}
