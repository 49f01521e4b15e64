//! # 核心编排模块
//!
//! ## 设计思路
//!
//! `CropSession` 只负责流程编排与配置管理，不与任何渲染层绑定。
//! 处理链路固定为：
//! 1. 开始新选择（作废旧的解码票据）
//! 2. 按来源加载原始字节并解码预览
//! 3. 设置显示尺寸、拖拽/设定选区
//! 4. 确认后采样重绘并编码为产物
//!
//! 状态机：`Idle → Selecting → Previewing → Cropping → Idle`（成功路径），
//! 取消则从任意阶段直接回到 `Idle`。
//!
//! ## 实现思路
//!
//! - 配置通过 `Arc<RwLock<CropConfig>>` 支持运行时动态切档。
//! - 单次请求内使用“同一配置快照”，避免处理中途配置漂移。
//! - 选择代数（generation）实现“最新者胜”：旧选择的慢速解码完成后
//!   只会得到 `PreviewOutcome::Superseded`，绝不覆盖新选择的预览。
//! - 记录 `load/decode/raster/encode` 阶段耗时，便于性能诊断。

use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use std::time::Instant;

use super::region::{CropRegion, CropSelection, DisplaySize, DragHandle, ScaleFactors};
use super::source::{ImageSource, OutputArtifact, PreviewImage};
use super::{CropConfig, CropError, CropPerformanceProfile};

/// 裁剪会话所处阶段。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CropStage {
    /// 空闲：无预览、无选区。
    Idle,
    /// 已开始新选择，等待解码完成。
    Selecting,
    /// 预览就绪，可拖拽选区。
    Previewing,
    /// 选区已确定，可确认产出。
    Cropping,
}

/// 选择票据：`begin_selection` 发放，`load_preview` 凭票应用结果。
///
/// 新的选择会作废所有旧票据，这是“最新者胜”守卫的载体。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionTicket {
    generation: u64,
}

/// 预览加载结果。
#[derive(Debug, Clone, PartialEq)]
pub enum PreviewOutcome {
    /// 预览已应用到会话。
    Applied {
        natural_width: u32,
        natural_height: u32,
        data_url: String,
    },
    /// 票据已被更新的选择作废，解码结果被丢弃。
    Superseded,
}

struct SessionState {
    stage: CropStage,
    generation: u64,
    preview: Option<PreviewImage>,
    display: Option<DisplaySize>,
    selection: CropSelection,
}

/// 裁剪会话编排器。
///
/// 封装配置状态与全部瞬态编辑状态，并编排各子模块实现完整流程。
pub struct CropSession {
    config: Arc<RwLock<CropConfig>>,
    state: Mutex<SessionState>,
}

impl CropSession {
    /// 根据初始配置创建会话。
    ///
    /// # 示例
    /// ```rust,ignore
    /// use banner_crop::crop_pipeline::{CropConfig, CropSession};
    ///
    /// let session = CropSession::new(CropConfig::default())?;
    /// # Ok::<(), banner_crop::crop_pipeline::CropError>(())
    /// ```
    pub fn new(config: CropConfig) -> Result<Self, CropError> {
        Self::validate_config(&config)?;
        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            state: Mutex::new(SessionState {
                stage: CropStage::Idle,
                generation: 0,
                preview: None,
                display: None,
                selection: CropSelection::default(),
            }),
        })
    }

    fn validate_config(config: &CropConfig) -> Result<(), CropError> {
        if !(1..=100).contains(&config.jpeg_quality) {
            return Err(CropError::InvalidFormat(
                "jpeg_quality 必须在 1~100 之间".to_string(),
            ));
        }
        if let Some(ratio) = config.aspect_ratio {
            if !ratio.is_finite() || !(0.05..=100.0).contains(&ratio) {
                return Err(CropError::InvalidFormat(
                    "aspect_ratio 必须在 0.05~100 之间".to_string(),
                ));
            }
        }
        if !(config.min_region_size >= 1.0 && config.min_region_size <= 512.0) {
            return Err(CropError::InvalidFormat(
                "min_region_size 必须在 1~512 之间".to_string(),
            ));
        }
        Ok(())
    }

    fn state_lock(&self) -> Result<MutexGuard<'_, SessionState>, CropError> {
        self.state
            .lock()
            .map_err(|_| CropError::InvalidState("会话状态锁已中毒".to_string()))
    }

    /// 获取配置快照。
    ///
    /// 作用：保证单次请求链路使用一致参数。
    pub(crate) fn config_snapshot(&self) -> Result<CropConfig, CropError> {
        self.config
            .read()
            .map(|cfg| cfg.clone())
            .map_err(|_| CropError::InvalidState("配置读取锁已中毒".to_string()))
    }

    /// 当前会话阶段。
    pub fn stage(&self) -> Result<CropStage, CropError> {
        Ok(self.state_lock()?.stage)
    }

    /// 开始一次新的横幅选择。
    ///
    /// 清空旧预览与旧选区，并作废所有先前发放的票据。
    pub fn begin_selection(&self) -> Result<SelectionTicket, CropError> {
        let mut state = self.state_lock()?;
        state.generation += 1;
        state.stage = CropStage::Selecting;
        state.preview = None;
        state.display = None;
        state.selection.reset();

        log::info!("🖼 开始新的横幅选择 - generation={}", state.generation);
        Ok(SelectionTicket {
            generation: state.generation,
        })
    }

    /// 加载并解码预览。
    ///
    /// 若票据已被更新的选择作废，解码结果被丢弃并返回
    /// [`PreviewOutcome::Superseded`]，不会覆盖更新选择的预览。
    ///
    /// # 示例
    /// ```rust,ignore
    /// use banner_crop::crop_pipeline::{CropConfig, CropSession, ImageSource};
    ///
    /// # async fn demo() -> Result<(), banner_crop::crop_pipeline::CropError> {
    /// let session = CropSession::new(CropConfig::default())?;
    /// let ticket = session.begin_selection()?;
    /// session
    ///     .load_preview(ticket, ImageSource::FilePath("banner_src.png".into()))
    ///     .await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn load_preview(
        &self,
        ticket: SelectionTicket,
        source: ImageSource,
    ) -> Result<PreviewOutcome, CropError> {
        let config = self.config_snapshot()?;
        let total_start = Instant::now();

        let load_start = Instant::now();
        let raw = match source {
            ImageSource::FilePath(path) => Self::load_from_file(&path, &config)?,
            ImageSource::Base64(data) => Self::load_from_base64(&data, &config)?,
            ImageSource::Bytes(bytes) => Self::load_from_bytes(bytes, &config)?,
        };
        let load_elapsed = load_start.elapsed();

        let decode_start = Instant::now();
        let preview = Self::decode_preview(raw, &config)?;
        let decode_elapsed = decode_start.elapsed();

        let mut state = self.state_lock()?;
        if state.generation != ticket.generation {
            log::info!(
                "⏭️ 预览已被更新的选择取代 - ticket={} current={}",
                ticket.generation,
                state.generation
            );
            return Ok(PreviewOutcome::Superseded);
        }

        let outcome = PreviewOutcome::Applied {
            natural_width: preview.natural_width,
            natural_height: preview.natural_height,
            data_url: preview.data_url.clone(),
        };
        state.preview = Some(preview);
        state.display = None;
        state.selection.reset();
        state.stage = CropStage::Previewing;

        log::info!(
            "✅ 预览加载完成 - load={}ms decode={}ms total={}ms",
            load_elapsed.as_millis(),
            decode_elapsed.as_millis(),
            total_start.elapsed().as_millis()
        );

        Ok(outcome)
    }

    /// 设置预览在渲染层的显示尺寸（缩放因子的分母）。
    pub fn set_display_size(&self, width: f32, height: f32) -> Result<(), CropError> {
        let display = DisplaySize::new(width, height)?;
        let mut state = self.state_lock()?;
        if state.preview.is_none() {
            return Err(CropError::InvalidState(
                "尚未加载预览，无法设置显示尺寸".to_string(),
            ));
        }
        state.display = Some(display);
        Ok(())
    }

    /// 当前生效的缩放因子（自然尺寸 ÷ 显示尺寸）。
    pub fn scale_factors(&self) -> Result<ScaleFactors, CropError> {
        let state = self.state_lock()?;
        let preview = state
            .preview
            .as_ref()
            .ok_or_else(|| CropError::InvalidState("尚未加载预览".to_string()))?;
        let display = state
            .display
            .ok_or_else(|| CropError::InvalidState("尚未设置显示尺寸".to_string()))?;
        ScaleFactors::compute(preview.natural_width, preview.natural_height, display)
    }

    fn require_editing(state: &SessionState) -> Result<DisplaySize, CropError> {
        if state.preview.is_none() {
            return Err(CropError::InvalidState("尚未加载预览".to_string()));
        }
        state
            .display
            .ok_or_else(|| CropError::InvalidState("尚未设置显示尺寸".to_string()))
    }

    /// 从空白处开始拉出新选区。
    pub fn start_selection_drag(&self, x: f32, y: f32) -> Result<(), CropError> {
        let mut state = self.state_lock()?;
        Self::require_editing(&state)?;
        state.selection.start_new_selection(x, y);
        Ok(())
    }

    /// 在已有选区上开始手柄拖拽。
    pub fn start_handle_drag(&self, handle: DragHandle, x: f32, y: f32) -> Result<(), CropError> {
        let mut state = self.state_lock()?;
        Self::require_editing(&state)?;
        state.selection.start_handle_drag(handle, x, y);
        Ok(())
    }

    /// 拖拽帧更新，返回当前选区（已做比例约束与边界夹取）。
    pub fn update_drag(&self, x: f32, y: f32) -> Result<Option<CropRegion>, CropError> {
        let config = self.config_snapshot()?;
        let mut state = self.state_lock()?;
        let display = Self::require_editing(&state)?;
        state
            .selection
            .update_drag(x, y, display, config.aspect_ratio, config.min_region_size);
        Ok(state.selection.region)
    }

    /// 结束拖拽；若得到有效选区则进入 `Cropping` 阶段。
    pub fn end_drag(&self) -> Result<Option<CropRegion>, CropError> {
        let config = self.config_snapshot()?;
        let mut state = self.state_lock()?;
        let display = Self::require_editing(&state)?;
        state.selection.end_drag();

        // 兜底：拖拽几何无论如何演化，落定的选区都不越过显示边界。
        if config.clamp_to_bounds {
            if let Some(region) = state.selection.region {
                state.selection.region = Some(region.clamped_to(display));
            }
        }

        let finalized = state.selection.finalized(config.min_region_size);
        if finalized.is_some() {
            state.stage = CropStage::Cropping;
        }
        Ok(finalized)
    }

    /// 直接设定最终选区（无头调用方 / CLI 路径）。
    pub fn set_region(&self, region: CropRegion) -> Result<CropRegion, CropError> {
        let config = self.config_snapshot()?;
        let mut state = self.state_lock()?;
        let display = Self::require_editing(&state)?;

        let region = if config.clamp_to_bounds {
            region.clamped_to(display)
        } else {
            region
        };

        if !region.is_usable(config.min_region_size) {
            return Err(CropError::InvalidState(format!(
                "选区尺寸过小：{:.1}x{:.1}（最小边长 {:.1}）",
                region.width, region.height, config.min_region_size
            )));
        }

        state.selection.region = Some(region);
        state.stage = CropStage::Cropping;
        Ok(region)
    }

    /// 确认裁剪：采样重绘 + JPEG 编码，成功后会话回到 `Idle`。
    ///
    /// 预览、显示尺寸或有效选区任一缺失都会返回 `InvalidState`，
    /// 而不是原型实现的静默不动作。
    pub fn confirm(&self) -> Result<OutputArtifact, CropError> {
        let config = self.config_snapshot()?;
        let total_start = Instant::now();
        let mut state = self.state_lock()?;

        if state.stage != CropStage::Cropping {
            return Err(CropError::InvalidState(format!(
                "当前阶段 {:?} 不允许确认裁剪",
                state.stage
            )));
        }

        let display = Self::require_editing(&state)?;
        let region = state
            .selection
            .finalized(config.min_region_size)
            .ok_or_else(|| CropError::InvalidState("尚未确定有效选区".to_string()))?;
        let preview = state
            .preview
            .as_ref()
            .ok_or_else(|| CropError::InvalidState("预览缺失".to_string()))?;

        let scale = ScaleFactors::compute(preview.natural_width, preview.natural_height, display)?;

        let raster_start = Instant::now();
        let surface = Self::rasterize(&preview.image, &region, &scale, config.resize_filter)?;
        let raster_elapsed = raster_start.elapsed();

        let encode_start = Instant::now();
        let artifact = Self::encode_artifact(&surface, config.jpeg_quality)?;
        let encode_elapsed = encode_start.elapsed();

        // 成功路径：瞬态状态全部清空，回到空闲。
        state.stage = CropStage::Idle;
        state.preview = None;
        state.display = None;
        state.selection.reset();

        log::info!(
            "✅ 裁剪完成 - raster={}ms encode={}ms total={}ms 产物 {}x{} {}KB",
            raster_elapsed.as_millis(),
            encode_elapsed.as_millis(),
            total_start.elapsed().as_millis(),
            artifact.width,
            artifact.height,
            artifact.byte_len / 1024
        );

        Ok(artifact)
    }

    /// 取消当前会话：清空瞬态状态，回到 `Idle`，不产出任何产物。
    pub fn cancel(&self) -> Result<(), CropError> {
        let mut state = self.state_lock()?;
        state.stage = CropStage::Idle;
        state.preview = None;
        state.display = None;
        state.selection.reset();
        log::info!("🚫 已取消裁剪会话");
        Ok(())
    }

    /// 设置性能档位。
    pub fn set_performance_profile(
        &self,
        profile: CropPerformanceProfile,
    ) -> Result<(), CropError> {
        let mut config = self
            .config
            .write()
            .map_err(|_| CropError::InvalidState("配置写入锁已中毒".to_string()))?;
        config.apply_performance_profile(profile);

        log::info!(
            "⚙️ 已切换裁剪性能档位：{:?}（jpeg_quality={}, filter={:?}）",
            profile,
            config.jpeg_quality,
            config.resize_filter
        );

        Ok(())
    }

    /// 获取当前生效档位。
    pub fn get_performance_profile(&self) -> Result<CropPerformanceProfile, CropError> {
        let config = self
            .config
            .read()
            .map_err(|_| CropError::InvalidState("配置读取锁已中毒".to_string()))?;
        Ok(config.infer_performance_profile())
    }

    /// 设置资源限制与选区策略等高级配置。
    pub fn set_advanced_config(
        &self,
        max_file_size: u64,
        max_decoded_pixels: u64,
        max_decoded_bytes: u64,
        jpeg_quality: u8,
        clamp_to_bounds: bool,
        aspect_ratio: Option<f32>,
        min_region_size: f32,
    ) -> Result<(), CropError> {
        if max_file_size < 64 * 1024 {
            return Err(CropError::InvalidFormat(
                "max_file_size 不能小于 64KB".to_string(),
            ));
        }
        if max_decoded_pixels < 10_000 {
            return Err(CropError::InvalidFormat(
                "max_decoded_pixels 不能小于 10000".to_string(),
            ));
        }
        if max_decoded_bytes < 8 * 1024 * 1024 {
            return Err(CropError::InvalidFormat(
                "max_decoded_bytes 不能小于 8MB".to_string(),
            ));
        }
        if !(1..=100).contains(&jpeg_quality) {
            return Err(CropError::InvalidFormat(
                "jpeg_quality 必须在 1~100 之间".to_string(),
            ));
        }
        if let Some(ratio) = aspect_ratio {
            if !ratio.is_finite() || !(0.05..=100.0).contains(&ratio) {
                return Err(CropError::InvalidFormat(
                    "aspect_ratio 必须在 0.05~100 之间".to_string(),
                ));
            }
        }
        if !(min_region_size >= 1.0 && min_region_size <= 512.0) {
            return Err(CropError::InvalidFormat(
                "min_region_size 必须在 1~512 之间".to_string(),
            ));
        }

        let mut config = self
            .config
            .write()
            .map_err(|_| CropError::InvalidState("配置写入锁已中毒".to_string()))?;

        config.max_file_size = max_file_size;
        config.max_decoded_pixels = max_decoded_pixels;
        config.max_decoded_bytes = max_decoded_bytes;
        config.jpeg_quality = jpeg_quality;
        config.clamp_to_bounds = clamp_to_bounds;
        config.aspect_ratio = aspect_ratio;
        config.min_region_size = min_region_size;

        Ok(())
    }

    /// 获取高级配置快照。
    pub fn get_advanced_config(
        &self,
    ) -> Result<(u64, u64, u64, u8, bool, Option<f32>, f32), CropError> {
        let config = self
            .config
            .read()
            .map_err(|_| CropError::InvalidState("配置读取锁已中毒".to_string()))?;

        Ok((
            config.max_file_size,
            config.max_decoded_pixels,
            config.max_decoded_bytes,
            config.jpeg_quality,
            config.clamp_to_bounds,
            config.aspect_ratio,
            config.min_region_size,
        ))
    }
}
