//! # 服务层（可注入状态）
//!
//! ## 设计思路
//!
//! 使用 `BannerCropService` 作为组合根注入的服务状态，替代全局单例。
//! 好处：
//! 1. 生命周期清晰（由调用方的组合根统一管理）
//! 2. 测试可创建独立实例，减少共享状态副作用
//! 3. 完成回调显式注入，交付语义可测（每次确认恰好触发一次）
//!
//! ## 实现思路
//!
//! 对外仅暴露少量稳定 API：
//! - `begin` / `load_preview` / `set_display_size` / `set_region`：流程直通
//! - `confirm_and_deliver`：确认裁剪并把产物交给完成回调
//! - `cancel`：清空瞬态状态，绝不触发回调
//! - 档位与高级配置的读写直通

use std::sync::{Arc, Mutex};

use super::region::CropRegion;
use super::source::{ImageSource, OutputArtifact};
use super::{
    CropConfig, CropError, CropPerformanceProfile, CropSession, PreviewOutcome, SelectionTicket,
};

/// 裁剪完成回调：每次成功确认恰好被调用一次，产物所有权随之移交。
///
/// 以 `Arc` 持有，调用时先克隆出锁外再执行，回调内可安全地重入服务 API。
pub type CropCompleteCallback = Arc<dyn Fn(OutputArtifact) + Send + Sync>;

/// 高级配置的序列化视图（供上层展示与持久化）。
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CropAdvancedConfig {
    pub max_file_size: u64,
    pub max_decoded_pixels: u64,
    pub max_decoded_bytes: u64,
    pub jpeg_quality: u8,
    pub clamp_to_bounds: bool,
    pub aspect_ratio: Option<f32>,
    pub min_region_size: f32,
}

/// 横幅裁剪服务状态。
///
/// 在组合根创建并注入到调用层，内部持有 `CropSession` 与完成回调。
pub struct BannerCropService {
    session: CropSession,
    on_complete: Mutex<Option<CropCompleteCallback>>,
}

impl BannerCropService {
    /// 使用默认配置创建服务状态。
    ///
    /// # 示例
    /// ```rust,no_run
    /// use banner_crop::crop_pipeline::BannerCropService;
    ///
    /// let service = BannerCropService::new()?;
    /// # Ok::<(), banner_crop::crop_pipeline::CropError>(())
    /// ```
    pub fn new() -> Result<Self, CropError> {
        Self::with_config(CropConfig::default())
    }

    /// 使用自定义配置创建服务状态。
    ///
    /// 主要用于测试或按场景注入不同策略。
    pub fn with_config(config: CropConfig) -> Result<Self, CropError> {
        let session = CropSession::new(config)?;
        Ok(Self {
            session,
            on_complete: Mutex::new(None),
        })
    }

    /// 注入完成回调（覆盖旧回调）。
    pub fn set_on_complete(&self, callback: CropCompleteCallback) -> Result<(), CropError> {
        let mut guard = self
            .on_complete
            .lock()
            .map_err(|_| CropError::InvalidState("完成回调锁已中毒".to_string()))?;
        *guard = Some(callback);
        Ok(())
    }

    /// 底层会话的直接引用（拖拽等细粒度交互走这里）。
    pub fn session(&self) -> &CropSession {
        &self.session
    }

    /// 开始一次新的横幅选择。
    pub fn begin(&self) -> Result<SelectionTicket, CropError> {
        self.session.begin_selection()
    }

    /// 加载并解码预览（最新者胜语义见 [`CropSession::load_preview`]）。
    pub async fn load_preview(
        &self,
        ticket: SelectionTicket,
        source: ImageSource,
    ) -> Result<PreviewOutcome, CropError> {
        self.session.load_preview(ticket, source).await
    }

    /// 设置预览显示尺寸。
    pub fn set_display_size(&self, width: f32, height: f32) -> Result<(), CropError> {
        self.session.set_display_size(width, height)
    }

    /// 直接设定最终选区。
    pub fn set_region(&self, region: CropRegion) -> Result<CropRegion, CropError> {
        self.session.set_region(region)
    }

    /// 确认裁剪并把产物交给完成回调（恰好一次）。
    ///
    /// 未注入回调时产物直接返回给调用方，交付语义不变。
    pub fn confirm_and_deliver(&self) -> Result<Option<OutputArtifact>, CropError> {
        let artifact = self.session.confirm()?;

        // 克隆回调后立即释放锁，回调内重入服务 API 不会死锁。
        let callback = {
            let guard = self
                .on_complete
                .lock()
                .map_err(|_| CropError::InvalidState("完成回调锁已中毒".to_string()))?;
            guard.clone()
        };

        match callback {
            Some(callback) => {
                log::info!(
                    "📤 产物已交付回调 - {} {}x{} {}KB",
                    artifact.file_name,
                    artifact.width,
                    artifact.height,
                    artifact.byte_len / 1024
                );
                callback(artifact);
                Ok(None)
            }
            None => Ok(Some(artifact)),
        }
    }

    /// 取消当前会话：清空瞬态状态，绝不触发完成回调。
    pub fn cancel(&self) -> Result<(), CropError> {
        self.session.cancel()
    }

    /// 设置性能档位。
    ///
    /// # 示例
    /// ```rust,no_run
    /// use banner_crop::crop_pipeline::BannerCropService;
    ///
    /// let service = BannerCropService::new()?;
    /// service.set_performance_profile("speed")?;
    /// # Ok::<(), banner_crop::crop_pipeline::CropError>(())
    /// ```
    pub fn set_performance_profile(&self, profile: &str) -> Result<(), CropError> {
        let profile = CropPerformanceProfile::from_str(profile)?;
        self.session.set_performance_profile(profile)
    }

    /// 获取当前生效性能档位（字符串）。
    pub fn get_performance_profile(&self) -> Result<String, CropError> {
        let profile = self.session.get_performance_profile()?;
        Ok(profile.as_str().to_string())
    }

    pub fn set_advanced_config(&self, config: CropAdvancedConfig) -> Result<(), CropError> {
        self.session.set_advanced_config(
            config.max_file_size,
            config.max_decoded_pixels,
            config.max_decoded_bytes,
            config.jpeg_quality,
            config.clamp_to_bounds,
            config.aspect_ratio,
            config.min_region_size,
        )
    }

    pub fn get_advanced_config(&self) -> Result<CropAdvancedConfig, CropError> {
        let (
            max_file_size,
            max_decoded_pixels,
            max_decoded_bytes,
            jpeg_quality,
            clamp_to_bounds,
            aspect_ratio,
            min_region_size,
        ) = self.session.get_advanced_config()?;

        Ok(CropAdvancedConfig {
            max_file_size,
            max_decoded_pixels,
            max_decoded_bytes,
            jpeg_quality,
            clamp_to_bounds,
            aspect_ratio,
            min_region_size,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageBuffer, ImageFormat, Rgba};
    use std::io::Cursor;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    fn create_png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = ImageBuffer::from_fn(width, height, |x, y| {
            Rgba([(x % 256) as u8, (y % 256) as u8, 200, 255])
        });
        let dyn_img = DynamicImage::ImageRgba8(img);
        let mut cursor = Cursor::new(Vec::new());
        dyn_img
            .write_to(&mut cursor, ImageFormat::Png)
            .expect("failed to encode test image");
        cursor.into_inner()
    }

    async fn ready_service(calls: Arc<AtomicUsize>) -> BannerCropService {
        let service = BannerCropService::new().expect("service init failed");
        service
            .set_on_complete(Arc::new(move |artifact| {
                assert_eq!(artifact.file_name, "banner.jpg");
                calls.fetch_add(1, Ordering::SeqCst);
            }))
            .expect("callback should register");

        let ticket = service.begin().expect("begin should succeed");
        service
            .load_preview(ticket, ImageSource::Bytes(create_png_bytes(300, 100)))
            .await
            .expect("preview should load");
        service
            .set_display_size(300.0, 100.0)
            .expect("display size should apply");
        service
    }

    #[tokio::test]
    async fn callback_fires_exactly_once_per_confirm() {
        let calls = Arc::new(AtomicUsize::new(0));
        let service = ready_service(Arc::clone(&calls)).await;

        service
            .set_region(CropRegion::new(0.0, 0.0, 150.0, 50.0))
            .expect("region should apply");
        let returned = service
            .confirm_and_deliver()
            .expect("confirm should succeed");

        assert!(returned.is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // 会话已回到空闲，重复确认是状态错误，回调不会再次触发。
        assert!(matches!(
            service.confirm_and_deliver(),
            Err(CropError::InvalidState(_))
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn reentrant_callback_does_not_deadlock() {
        let calls = Arc::new(AtomicUsize::new(0));
        let service = Arc::new(BannerCropService::new().expect("service init failed"));

        // 回调内重入服务 API（换回调、查档位），不得与交付路径互相持锁。
        {
            let calls = Arc::clone(&calls);
            let reentrant = Arc::clone(&service);
            service
                .set_on_complete(Arc::new(move |_| {
                    reentrant
                        .set_on_complete(Arc::new(|_| {}))
                        .expect("reentrant set_on_complete should succeed");
                    reentrant
                        .get_performance_profile()
                        .expect("reentrant profile read should succeed");
                    calls.fetch_add(1, Ordering::SeqCst);
                }))
                .expect("callback should register");
        }

        let ticket = service.begin().expect("begin should succeed");
        service
            .load_preview(ticket, ImageSource::Bytes(create_png_bytes(300, 100)))
            .await
            .expect("preview should load");
        service
            .set_display_size(300.0, 100.0)
            .expect("display size should apply");
        service
            .set_region(CropRegion::new(0.0, 0.0, 150.0, 50.0))
            .expect("region should apply");

        let returned = service
            .confirm_and_deliver()
            .expect("confirm should succeed");
        assert!(returned.is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn cancel_never_fires_callback() {
        let calls = Arc::new(AtomicUsize::new(0));
        let service = ready_service(Arc::clone(&calls)).await;

        service
            .set_region(CropRegion::new(0.0, 0.0, 150.0, 50.0))
            .expect("region should apply");
        service.cancel().expect("cancel should succeed");

        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn without_callback_artifact_is_returned_to_caller() {
        let service = BannerCropService::new().expect("service init failed");
        let ticket = service.begin().expect("begin should succeed");
        service
            .load_preview(ticket, ImageSource::Bytes(create_png_bytes(300, 100)))
            .await
            .expect("preview should load");
        service
            .set_display_size(300.0, 100.0)
            .expect("display size should apply");
        service
            .set_region(CropRegion::new(30.0, 10.0, 150.0, 50.0))
            .expect("region should apply");

        let artifact = service
            .confirm_and_deliver()
            .expect("confirm should succeed")
            .expect("artifact should be returned when no callback is set");
        assert_eq!((artifact.width, artifact.height), (150, 50));
    }

    #[test]
    fn service_set_and_get_profile_roundtrip() {
        let service = BannerCropService::new().expect("service init failed");

        for profile in ["quality", "balanced", "speed"] {
            service
                .set_performance_profile(profile)
                .expect("set profile should succeed");
            let current = service
                .get_performance_profile()
                .expect("get profile should succeed");
            assert_eq!(current, profile);
        }
    }

    #[test]
    fn service_rejects_invalid_profile() {
        let service = BannerCropService::new().expect("service init failed");

        let result = service.set_performance_profile("unknown-profile");
        assert!(matches!(result, Err(CropError::InvalidFormat(_))));
    }

    #[test]
    fn advanced_config_serializes_for_ui() {
        let service = BannerCropService::new().expect("service init failed");
        let config = service
            .get_advanced_config()
            .expect("read advanced config failed");

        let json = serde_json::to_string(&config).expect("serialize should succeed");
        let back: CropAdvancedConfig =
            serde_json::from_str(&json).expect("deserialize should succeed");
        assert_eq!(back.jpeg_quality, config.jpeg_quality);
        assert_eq!(back.aspect_ratio, config.aspect_ratio);
    }

    #[test]
    fn service_profile_concurrent_access_stress() {
        let service = Arc::new(BannerCropService::new().expect("service init failed"));

        let workers = 8;
        let iterations = 200;

        let mut handles = Vec::with_capacity(workers);
        for worker_id in 0..workers {
            let service = Arc::clone(&service);
            handles.push(thread::spawn(move || {
                let profiles = ["quality", "balanced", "speed"];

                for i in 0..iterations {
                    let profile = profiles[(worker_id + i) % profiles.len()];
                    service
                        .set_performance_profile(profile)
                        .expect("set profile should succeed");

                    let current = service
                        .get_performance_profile()
                        .expect("get profile should succeed");
                    assert!(matches!(current.as_str(), "quality" | "balanced" | "speed"));
                }
            }));
        }

        for handle in handles {
            handle.join().expect("worker thread should not panic");
        }

        service
            .set_performance_profile("balanced")
            .expect("restore default profile should succeed");
    }
}
