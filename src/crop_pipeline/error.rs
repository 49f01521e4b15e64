//! # 错误模型模块
//!
//! ## 设计思路
//!
//! 使用单一错误枚举承载裁剪链路中的所有错误来源，避免字符串拼接式错误处理。
//! 通过 `thiserror` 保持人类可读错误，同时让调用侧可按分支匹配。
//!
//! 原型实现里“前置条件缺失时静默不动作”“编码无产出时永不返回”这两类行为，
//! 在这里统一收敛为显式错误分支（`InvalidState` / `Encode`），
//! 调用方可以区分“尚未就绪”与“真的失败了”。

/// 裁剪流水线统一错误类型。
///
/// 该类型会在对外 API 层被上转为 `AppError`，最终透传给调用方。
#[derive(Debug, thiserror::Error)]
pub enum CropError {
    #[error("格式错误：{0}")]
    InvalidFormat(String),

    #[error("解码错误：{0}")]
    Decode(String),

    #[error("编码错误：{0}")]
    Encode(String),

    #[error("状态错误：{0}")]
    InvalidState(String),

    #[error("资源限制：{0}")]
    ResourceLimit(String),

    #[error("文件错误：{0}")]
    FileSystem(String),
}

impl From<CropError> for String {
    /// 兼容部分仍使用字符串错误的调用点。
    fn from(error: CropError) -> Self {
        error.to_string()
    }
}
