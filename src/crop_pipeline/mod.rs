//! # 横幅裁剪流水线模块（crop_pipeline）
//!
//! ## 设计思路
//!
//! 该模块将“图片来源加载 → 解码预览 → 裁剪选区 → 采样重绘 → JPEG 编码 → 回调交付”
//! 按职责拆分为多个子模块，避免单文件膨胀与耦合。
//!
//! - `service`：承载可注入状态（`BannerCropService`）与完成回调交付
//! - `session`：编排整条处理流水线（状态机 + 最新者胜守卫）
//! - `loader`：负责文件/Base64/字节加载与安全校验
//! - `pipeline`：负责解码、像素限制、预览构建
//! - `region`：显示空间几何（裁剪框、拖拽选区、缩放因子）
//! - `raster`：按缩放因子采样源图并重绘到目标尺寸
//! - `encoder`：JPEG 编码与产物封装
//! - `config/error/source`：配置、错误、中间数据模型
//!
//! ## 实现思路
//!
//! 对外仅暴露必要类型，内部细节保持 `mod` 私有。
//! 配置与完成回调在组合根（`BannerCropService`）注入，不依赖任何全局单例。
//!
//! ## 新同事快速上手
//!
//! 可以按下面顺序理解调用链：
//!
//! ```text
//! 调用方（渲染层 / CLI）
//!    ↓
//! service.rs（状态注入、回调交付、服务入口）
//!    ↓
//! session.rs（状态机 Idle→Selecting→Previewing→Cropping→Idle + 阶段耗时日志）
//!    ├─ loader.rs（来源加载 + 体积/签名校验）
//!    ├─ pipeline.rs（解码 + 像素限制 + 预览 Data URL）
//!    ├─ region.rs（选区拖拽 + 比例约束 + 边界夹取）
//!    ├─ raster.rs（缩放因子采样 + 目标面重绘）
//!    └─ encoder.rs（JPEG 编码 + banner.jpg 产物）
//!    ↓
//! 返回 OutputArtifact / CropError 给调用方
//! ```
//!
//! ## 分层职责建议
//!
//! - 配置与策略变更优先改 `config.rs`
//! - 业务流程顺序变更优先改 `session.rs`
//! - 单阶段行为优化分别改 `loader/pipeline/raster/encoder`
//! - 选区交互（拖拽手柄/比例约束）优先看 `region.rs`

mod config;
mod encoder;
mod error;
mod loader;
mod pipeline;
mod raster;
mod region;
mod service;
mod session;
mod source;

pub use config::{CropConfig, CropPerformanceProfile};
pub use error::CropError;
pub use region::{CropRegion, CropSelection, DisplaySize, DragHandle, ScaleFactors};
pub use service::{BannerCropService, CropAdvancedConfig, CropCompleteCallback};
pub use session::{CropSession, CropStage, PreviewOutcome, SelectionTicket};
pub use source::{ImageSource, OutputArtifact};
