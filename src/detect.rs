//! 检测模块 - 基于YOLO的目标检测
//!
//! 该模块提供：
//! - 网络解析与模型加载
//! - 图像预处理、模型推理、结果后处理
//! - 检测结果叠加层绘制
//!
//! 采集循环只依赖 [`Detector`] trait，具体实现为 [`YoloDetector`]。

use std::fmt;
use std::time::Duration;

pub mod bounds;
pub mod infer;
pub mod labels;
pub mod model;
pub mod network;
pub mod overlay;
pub mod posts;
pub mod prevs;
pub mod yolo;

pub use bounds::{BoundingBox, Detection};
pub use labels::ClassLabels;
pub use network::NetworkSpec;
pub use overlay::{OverlayFlags, draw_overlay};
pub use yolo::YoloDetector;

use crate::error::DetectError;
use crate::frame::Frame;

/// 目标检测器
pub trait Detector {
    /// 检测一帧图像，返回阈值以上的检测结果，并按 `overlay` 在帧上绘制叠加层
    fn detect(&mut self, frame: &mut Frame, overlay: OverlayFlags) -> Result<Vec<Detection>, DetectError>;

    /// 最近一帧的网络吞吐(FPS)
    fn network_fps(&self) -> f32;

    fn profiler_times(&self) -> ProfilerTimes {
        ProfilerTimes::default()
    }
}

/// 单帧各阶段耗时
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ProfilerTimes {
    pub preprocess: Duration,
    pub network: Duration,
    pub postprocess: Duration,
    pub overlay: Duration,
}

impl ProfilerTimes {
    /// 网络相关耗时（预处理 + 推理 + 后处理），不含叠加层
    pub fn network_total(&self) -> Duration {
        self.preprocess + self.network + self.postprocess
    }

    pub fn network_fps(&self) -> f32 {
        let secs = self.network_total().as_secs_f32();
        if secs > 0.0 { 1.0 / secs } else { 0.0 }
    }
}

impl fmt::Display for ProfilerTimes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ms = |d: Duration| d.as_secs_f64() * 1000.0;
        write!(
            f,
            "pre-process {:.2}ms | network {:.2}ms | post-process {:.2}ms | visualize {:.2}ms | total {:.2}ms",
            ms(self.preprocess),
            ms(self.network),
            ms(self.postprocess),
            ms(self.overlay),
            ms(self.network_total() + self.overlay),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fps_from_network_time() {
        let times = ProfilerTimes {
            preprocess: Duration::from_millis(5),
            network: Duration::from_millis(10),
            postprocess: Duration::from_millis(5),
            overlay: Duration::from_millis(100),
        };
        assert!((times.network_fps() - 50.0).abs() < 0.01);
        assert_eq!(ProfilerTimes::default().network_fps(), 0.0);
    }
}
