use std::io;
use std::process;

use anyhow::Result;
use tracing::{info, warn};

use detectnet_pipeline::capture::{FrameSource, PipelineSource};
use detectnet_pipeline::cli::Config;
use detectnet_pipeline::detect::{NetworkSpec, YoloDetector};
use detectnet_pipeline::display::SnapshotDisplay;
use detectnet_pipeline::logging::init_logging;
use detectnet_pipeline::pipeline;
use detectnet_pipeline::signal::{ShutdownFlag, install_ctrlc_handler};

fn main() -> Result<()> {
    // 参数错误时打印帮助并正常退出
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            println!();
            println!("{}", e.help_text());
            process::exit(0);
        }
    };

    init_logging();
    if !config.ignored_args.is_empty() {
        warn!(args = ?config.ignored_args, "忽略无法识别的参数");
    }

    let shutdown = ShutdownFlag::new();
    if let Err(e) = install_ctrlc_handler(shutdown.clone()) {
        warn!("无法捕获 SIGINT: {}", e);
    }

    // 创建采集源
    let mut source = PipelineSource::create(&config.pipeline, config.width, config.height, config.depth)?;
    info!(
        width = source.width(),
        height = source.height(),
        depth = source.depth(),
        "采集管道初始化成功"
    );

    // 加载检测网络
    let network = NetworkSpec::resolve(&config.network, &config.model_dir, config.labels.as_deref())?;
    let mut detector = YoloDetector::from_network(&network)?
        .with_confidence_threshold(config.threshold)
        .with_alpha(config.alpha);
    info!(network = %network.name, overlay = %config.overlay, threshold = config.threshold, "检测网络已加载");

    let mut display = SnapshotDisplay::new(config.output.as_deref(), config.max_frames, shutdown)?;

    source.open()?;
    info!("pipeline open for streaming");

    let stdout = io::stdout();
    let mut report = stdout.lock();
    let stats = pipeline::run(&config, &mut source, &mut detector, &mut display, &mut report)?;

    info!(frames = stats.frames, detections = stats.detections, "shutting down...");
    drop(display);
    drop(detector);
    drop(source);
    info!("shutdown complete.");
    Ok(())
}
