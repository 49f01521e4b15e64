//! # 数据源与中间模型
//!
//! ## 设计思路
//!
//! 将“外部输入类型”和“流水线中间结果”解耦：
//! - `ImageSource` 表示外部来源语义
//! - `RawImageData` 表示已加载但未解码的字节
//! - `PreviewImage` 表示已解码、可供选区拖拽参照的预览
//! - `OutputArtifact` 表示最终交付给调用方的命名文件产物
//!
//! 预览与原始字节只在“选择文件 → 确认/取消”之间存活，
//! 产物产出后本模块不再保留任何引用。

use image::DynamicImage;

/// 横幅产物的固定文件名。
pub const ARTIFACT_FILE_NAME: &str = "banner.jpg";
/// 横幅产物的 MIME 类型。
pub const ARTIFACT_MIME: &str = "image/jpeg";

/// 图片输入来源。
pub enum ImageSource {
    /// 本地文件路径来源。
    FilePath(String),
    /// Base64（支持 Data URL 与纯 Base64 字符串）。
    Base64(String),
    /// 已在内存中的原始字节（调用方自行读取的文件内容）。
    Bytes(Vec<u8>),
}

/// 加载阶段输出：原始字节与来源标识。
pub(crate) struct RawImageData {
    /// 原始图片字节。
    pub(crate) bytes: Vec<u8>,
    /// 来源提示（用于日志与诊断）。
    pub(crate) source_hint: &'static str,
}

/// 解码阶段输出：预览图与其元信息。
pub(crate) struct PreviewImage {
    /// 已解码的源分辨率图像。
    pub(crate) image: DynamicImage,
    /// 源图自然宽度（像素）。
    pub(crate) natural_width: u32,
    /// 源图自然高度（像素）。
    pub(crate) natural_height: u32,
    /// 原始字节的 Data URL 表示（供渲染层直接展示预览）。
    pub(crate) data_url: String,
}

/// 编码阶段输出：交付给调用方的命名文件产物。
///
/// 产物尺寸等于选区的显示空间宽高（取整，至少 1 像素），
/// 而不是乘过缩放因子的源分辨率值。
#[derive(Debug, Clone, serde::Serialize)]
pub struct OutputArtifact {
    /// 文件名（固定为 `banner.jpg`）。
    pub file_name: String,
    /// MIME 类型（固定为 `image/jpeg`）。
    pub mime: &'static str,
    /// 产物像素宽度。
    pub width: u32,
    /// 产物像素高度。
    pub height: u32,
    /// JPEG 编码后的字节。
    #[serde(skip_serializing)]
    pub bytes: Vec<u8>,
    /// 编码字节数（随元信息序列化，便于日志与 CLI 输出）。
    pub byte_len: usize,
}
