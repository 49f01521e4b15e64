//! # 配置模块
//!
//! ## 设计思路
//!
//! 将所有“可调策略”集中到 `CropConfig`，保证运行时行为可观测、可调整、可测试。
//! 其中性能档位（quality / balanced / speed）作为高层语义，映射到底层参数组合。
//!
//! ## 实现思路
//!
//! - `Default` 提供生产可用的平衡配置（横幅比例 3:1、JPEG 质量 80）。
//! - `CropPerformanceProfile` 负责档位字符串解析与反向输出。
//! - `apply_performance_profile` 将档位转换为具体参数。
//! - `infer_performance_profile` 用于从当前配置反推档位（给上层展示状态）。

use image::imageops::FilterType;

use super::CropError;

/// 横幅默认宽高比（3:1）。
pub(crate) const DEFAULT_ASPECT_RATIO: f32 = 3.0;

/// 裁剪流水线配置。
///
/// 字段覆盖了加载、解码、选区约束与编码四个阶段。
#[derive(Debug, Clone)]
pub struct CropConfig {
    /// 读取原始字节时允许的最大文件体积（字节）。
    pub max_file_size: u64,
    /// 解码后的像素上限（`width * height`）。
    pub max_decoded_pixels: u64,
    /// 解码阶段允许的预计内存上限（按 RGBA 估算，字节）。
    pub max_decoded_bytes: u64,
    /// 选区宽高比约束（宽 ÷ 高），`None` 表示自由比例。
    pub aspect_ratio: Option<f32>,
    /// 是否将选区夹取到显示边界内，避免负尺寸裁剪。
    pub clamp_to_bounds: bool,
    /// 选区最小边长（显示空间像素）。
    pub min_region_size: f32,
    /// 采样重绘使用的滤镜策略。
    pub resize_filter: FilterType,
    /// JPEG 编码质量（1~100）。
    pub jpeg_quality: u8,
}

impl Default for CropConfig {
    fn default() -> Self {
        Self {
            max_file_size: 50 * 1024 * 1024,
            max_decoded_pixels: 40_000_000,
            max_decoded_bytes: 160 * 1024 * 1024,
            aspect_ratio: Some(DEFAULT_ASPECT_RATIO),
            clamp_to_bounds: true,
            min_region_size: 1.0,
            resize_filter: FilterType::Triangle,
            jpeg_quality: 80,
        }
    }
}

/// 裁剪性能档位（面向产品/用户语义）。
///
/// - `Quality`：尽量保真
/// - `Balanced`：质量与性能平衡
/// - `Speed`：优先编码速度
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CropPerformanceProfile {
    Quality,
    Balanced,
    Speed,
}

impl CropPerformanceProfile {
    /// 从外部字符串解析档位。
    ///
    /// # 示例
    /// ```rust,ignore
    /// use banner_crop::crop_pipeline::CropPerformanceProfile;
    ///
    /// let p = CropPerformanceProfile::from_str("balanced")?;
    /// assert_eq!(p.as_str(), "balanced");
    /// # Ok::<(), banner_crop::crop_pipeline::CropError>(())
    /// ```
    pub(crate) fn from_str(profile: &str) -> Result<Self, CropError> {
        match profile.trim().to_lowercase().as_str() {
            "quality" => Ok(Self::Quality),
            "balanced" => Ok(Self::Balanced),
            "speed" => Ok(Self::Speed),
            other => Err(CropError::InvalidFormat(format!(
                "未知性能档位：{}（可选：quality / balanced / speed）",
                other
            ))),
        }
    }

    /// 将档位输出为稳定字符串，供上层展示与持久化。
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Quality => "quality",
            Self::Balanced => "balanced",
            Self::Speed => "speed",
        }
    }
}

impl CropConfig {
    /// 基于当前参数反推性能档位。
    ///
    /// 用于“当前生效档位”查询场景。
    pub(crate) fn infer_performance_profile(&self) -> CropPerformanceProfile {
        if self.jpeg_quality >= 90 {
            return CropPerformanceProfile::Quality;
        }

        if self.jpeg_quality <= 65 || matches!(self.resize_filter, FilterType::Nearest) {
            return CropPerformanceProfile::Speed;
        }

        CropPerformanceProfile::Balanced
    }

    /// 应用指定性能档位到实际参数。
    ///
    /// 保持“档位语义稳定”，便于上层按档位切换而无需了解底层细节。
    pub(crate) fn apply_performance_profile(&mut self, profile: CropPerformanceProfile) {
        match profile {
            CropPerformanceProfile::Quality => {
                self.jpeg_quality = 92;
                self.resize_filter = FilterType::CatmullRom;
            }
            CropPerformanceProfile::Balanced => {
                self.jpeg_quality = 80;
                self.resize_filter = FilterType::Triangle;
            }
            CropPerformanceProfile::Speed => {
                self.jpeg_quality = 60;
                self.resize_filter = FilterType::Nearest;
            }
        }
    }
}
