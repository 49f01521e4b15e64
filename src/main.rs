//! # 横幅裁剪 CLI — 应用入口
//!
//! 本文件仅负责参数解析、日志初始化与产物落盘。
//! 业务逻辑分布在 `banner_crop::crop_pipeline` 中，详见 `lib.rs` 架构文档。

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

use banner_crop::crop_pipeline::{
    BannerCropService, CropError, CropRegion, ImageSource, PreviewOutcome,
};
use banner_crop::error::AppError;

/// 将本地图片裁剪为 3:1 横幅产物（banner.jpg）。
///
/// 选区坐标使用显示空间像素；缺省显示尺寸为图片自然尺寸（1:1 缩放）。
#[derive(Parser, Debug)]
#[command(name = "banner-crop", version)]
struct Cli {
    /// 输入图片路径
    input: PathBuf,

    /// 产物输出路径
    #[arg(short, long)]
    output: PathBuf,

    /// 选区左上角 X（显示空间像素）
    #[arg(long, default_value_t = 0.0)]
    x: f32,

    /// 选区左上角 Y（显示空间像素）
    #[arg(long, default_value_t = 0.0)]
    y: f32,

    /// 选区宽度（显示空间像素）
    #[arg(long)]
    width: f32,

    /// 选区高度（显示空间像素）
    #[arg(long)]
    height: f32,

    /// 预览显示宽度，缺省用图片自然宽度
    #[arg(long)]
    display_width: Option<f32>,

    /// 预览显示高度，缺省用图片自然高度
    #[arg(long)]
    display_height: Option<f32>,

    /// 性能档位：quality / balanced / speed
    #[arg(long)]
    profile: Option<String>,

    /// 以 JSON 输出产物元信息
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("❌ {}", err);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), AppError> {
    if !(cli.width > 0.0) || !(cli.height > 0.0) {
        return Err(AppError::InvalidArgument(
            "width / height 必须大于 0".to_string(),
        ));
    }

    let service = BannerCropService::new()?;
    if let Some(profile) = &cli.profile {
        service.set_performance_profile(profile)?;
    }

    let ticket = service.begin()?;
    let input = cli.input.to_string_lossy().into_owned();
    let outcome = service
        .load_preview(ticket, ImageSource::FilePath(input))
        .await?;

    let (natural_width, natural_height) = match outcome {
        PreviewOutcome::Applied {
            natural_width,
            natural_height,
            ..
        } => (natural_width, natural_height),
        PreviewOutcome::Superseded => {
            return Err(CropError::InvalidState("预览已被更新的选择取代".to_string()).into());
        }
    };

    let display_width = cli.display_width.unwrap_or(natural_width as f32);
    let display_height = cli.display_height.unwrap_or(natural_height as f32);
    service.set_display_size(display_width, display_height)?;

    let region = service.set_region(CropRegion::new(cli.x, cli.y, cli.width, cli.height))?;
    log::info!(
        "📐 最终选区 ({:.1}, {:.1}, {:.1}, {:.1}) @ 显示 {:.0}x{:.0}",
        region.x,
        region.y,
        region.width,
        region.height,
        display_width,
        display_height
    );

    let artifact = service
        .confirm_and_deliver()?
        .ok_or_else(|| CropError::InvalidState("产物已被回调接管".to_string()))?;

    std::fs::write(&cli.output, &artifact.bytes)?;
    log::info!(
        "💾 产物已写入 - {} ({}x{}, {}KB)",
        cli.output.display(),
        artifact.width,
        artifact.height,
        artifact.byte_len / 1024
    );

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&artifact)?);
    }

    Ok(())
}
