//! 采集-检测-渲染循环

use std::io::Write;

use tracing::{debug, info};

use crate::capture::FrameSource;
use crate::cli::Config;
use crate::detect::Detector;
use crate::display::Display;
use crate::error::{AppResult, CaptureError};

/// 循环统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopStats {
    pub frames: u64,
    pub detections: u64,
}

/// 标题栏文本
pub fn status_title(network: &str, network_fps: f32) -> String {
    format!("{network} | Network {network_fps:.0} FPS")
}

/// 运行采集循环，直到显示端关闭或采集流结束
///
/// 每次迭代依次完成：采集一帧、检测、向 `report` 输出检测摘要、渲染、更新标题。
/// 除 `EndOfStream` 外的任何错误都会中止循环并原样返回，不做重试。
pub fn run<S, D, V, W>(
    config: &Config,
    source: &mut S,
    detector: &mut D,
    display: &mut V,
    report: &mut W,
) -> AppResult<LoopStats>
where
    S: FrameSource + ?Sized,
    D: Detector + ?Sized,
    V: Display + ?Sized,
    W: Write + ?Sized,
{
    let mut stats = LoopStats::default();

    while display.is_open() {
        let mut frame = match source.capture() {
            Ok(frame) => frame,
            Err(CaptureError::EndOfStream) => {
                info!(frames = stats.frames, "采集流已结束");
                break;
            }
            Err(e) => return Err(e.into()),
        };

        let detections = detector.detect(&mut frame, config.overlay)?;

        writeln!(report, "frame {}: detected {} objects in image", frame.index, detections.len())?;
        for detection in &detections {
            writeln!(report, "{detection}")?;
        }

        display.render_once(&frame)?;
        display.set_title(&status_title(&config.network, detector.network_fps()));

        debug!(frame = frame.index, "{}", detector.profiler_times());

        stats.frames += 1;
        stats.detections += detections.len() as u64;
    }

    Ok(stats)
}
