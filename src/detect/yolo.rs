use std::time::Instant;

use ort::session::Session;

use crate::config::{DEFAULT_ALPHA, DEFAULT_INPUT_HEIGHT, DEFAULT_INPUT_WIDTH, DEFAULT_NMS_THRESHOLD, DEFAULT_THRESHOLD};
use crate::detect::bounds::Detection;
use crate::detect::infer::run_inference;
use crate::detect::labels::ClassLabels;
use crate::detect::model::load_model;
use crate::detect::network::NetworkSpec;
use crate::detect::overlay::{OverlayFlags, draw_overlay};
use crate::detect::posts::{ScaleMessage, process_detections};
use crate::detect::prevs::{image_to_tensor, resize_image};
use crate::detect::{Detector, ProfilerTimes};
use crate::error::{DetectError, ModelLoadError};
use crate::frame::Frame;

/// YOLO目标检测器
///
/// 封装了完整的检测流程，包括图像预处理、模型推理、结果后处理和叠加层绘制。
///
/// # 示例
///
/// ```no_run
/// use detectnet_pipeline::detect::{NetworkSpec, YoloDetector};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let spec = NetworkSpec::resolve("yolo11n", "networks".as_ref(), None)?;
/// let detector = YoloDetector::from_network(&spec)?
///     .with_confidence_threshold(0.5)
///     .with_nms_threshold(0.7);
/// # Ok(())
/// # }
/// ```
pub struct YoloDetector {
    /// ONNX模型会话
    model: Session,
    labels: ClassLabels,
    input_width: usize,
    input_height: usize,
    /// 置信度阈值，低于此值的检测结果将被过滤
    confidence_threshold: f32,
    /// NMS阈值，同类别框IoU达到此值时去重
    nms_threshold: f32,
    /// 框内填充透明度
    alpha: u8,
    /// 最近一帧的各阶段耗时
    times: ProfilerTimes,
}

impl YoloDetector {
    pub fn new(model: Session, labels: ClassLabels, input_width: usize, input_height: usize) -> Self {
        Self {
            model,
            labels,
            input_width,
            input_height,
            confidence_threshold: DEFAULT_THRESHOLD,
            nms_threshold: DEFAULT_NMS_THRESHOLD,
            alpha: DEFAULT_ALPHA,
            times: ProfilerTimes::default(),
        }
    }

    /// 加载网络描述对应的模型，输入尺寸使用默认的640x640
    pub fn from_network(spec: &NetworkSpec) -> Result<Self, ModelLoadError> {
        let model = load_model(&spec.model_path)?;
        Ok(Self::new(
            model,
            spec.labels.clone(),
            DEFAULT_INPUT_WIDTH,
            DEFAULT_INPUT_HEIGHT,
        ))
    }

    pub fn with_confidence_threshold(mut self, threshold: f32) -> Self {
        self.confidence_threshold = threshold;
        self
    }

    pub fn with_nms_threshold(mut self, threshold: f32) -> Self {
        self.nms_threshold = threshold;
        self
    }

    pub fn with_alpha(mut self, alpha: u8) -> Self {
        self.alpha = alpha;
        self
    }
}

impl Detector for YoloDetector {
    fn detect(&mut self, frame: &mut Frame, overlay: OverlayFlags) -> Result<Vec<Detection>, DetectError> {
        let (o_width, o_height) = frame.dimensions();

        let start = Instant::now();
        let resized = resize_image(&frame.image, self.input_width as u32, self.input_height as u32);
        let input_tensor = image_to_tensor(&resized, self.input_height, self.input_width);
        let preprocess = start.elapsed();

        let start = Instant::now();
        let output = run_inference(&mut self.model, &input_tensor)?;
        let network = start.elapsed();

        let start = Instant::now();
        let message = ScaleMessage {
            o_width,
            o_height,
            s_width: self.input_width,
            s_height: self.input_height,
        };
        let detections = process_detections(
            &output,
            &message,
            &self.labels,
            self.confidence_threshold,
            self.nms_threshold,
        )?;
        let postprocess = start.elapsed();

        let start = Instant::now();
        draw_overlay(&mut frame.image, &detections, overlay, self.alpha);
        let visualize = start.elapsed();

        self.times = ProfilerTimes {
            preprocess,
            network,
            postprocess,
            overlay: visualize,
        };
        Ok(detections)
    }

    fn network_fps(&self) -> f32 {
        self.times.network_fps()
    }

    fn profiler_times(&self) -> ProfilerTimes {
        self.times
    }
}
