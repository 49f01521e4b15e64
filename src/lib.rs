//! # 横幅裁剪引擎 — 库入口
//!
//! ## 架构总览
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │              调用方（渲染层 / CLI / 上传模块）              │
//! │                                                          │
//! │  选择文件 ── 拖拽裁剪框 ── 确认/取消 ── onCropComplete     │
//! └───────┼──────────────────────────────────────────────────┘
//!         ↕ Result<T, AppError>
//! ┌───────┼──────────────────────────────────────────────────┐
//! │       ↕            后端 (Rust)                           │
//! │                                                          │
//! │  ┌─ error ───────── AppError (统一错误类型)               │
//! │  │                                                       │
//! │  └─ crop_pipeline ─ 横幅裁剪流水线                        │
//! │      ├─ service    可注入服务状态 + 完成回调               │
//! │      ├─ session    阶段编排 + 状态机 + 最新者胜            │
//! │      ├─ loader     文件/Base64/字节 加载校验               │
//! │      ├─ pipeline   解码 + 资源限制 + 预览                  │
//! │      ├─ region     显示空间几何 + 拖拽选区                 │
//! │      ├─ raster     缩放因子采样 + 目标面重绘               │
//! │      ├─ encoder    JPEG 编码 + 产物封装                   │
//! │      └─ config/error/source  配置、错误、数据模型          │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## 模块职责
//!
//! | 模块 | 职责 |
//! |------|------|
//! | [`error`] | 统一错误类型 `AppError`，对外 API 的返回类型 |
//! | [`crop_pipeline`] | 从图片来源到 `banner.jpg` 产物的完整裁剪链路 |

pub mod error;
pub mod crop_pipeline;
