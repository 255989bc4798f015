// 命令行默认值
pub const DEFAULT_NETWORK: &str = "facenet";
pub const DEFAULT_OVERLAY: &str = "box,labels,conf";
pub const DEFAULT_THRESHOLD: f32 = 0.8;
pub const DEFAULT_PIPELINE: &str = "";
pub const DEFAULT_WIDTH: u32 = 1280;
pub const DEFAULT_HEIGHT: u32 = 720;
pub const DEFAULT_DEPTH: u32 = 12;
pub const DEFAULT_ALPHA: u8 = 120;
pub const DEFAULT_MODEL_DIR: &str = "networks";

/// 采集流支持的像素深度(bpp)
pub const SUPPORTED_DEPTHS: [u32; 5] = [8, 12, 16, 24, 32];

// 目标检测超参数配置
pub const DEFAULT_INPUT_WIDTH: usize = 640;
pub const DEFAULT_INPUT_HEIGHT: usize = 640;
pub const DEFAULT_NMS_THRESHOLD: f32 = 0.7;
pub const DETECTIONS_CAPACITY: usize = 100;

/// ONNX模型输入节点名称（ultralytics导出的默认名）
pub const MODEL_INPUT_NAME: &str = "images";
pub const MODEL_INTRA_THREADS: usize = 4;
