// 错误处理模块

use std::path::PathBuf;

use thiserror::Error;

/// 采集源错误
#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("管道描述无效: {0}")]
    Pipeline(String),

    #[error("无法打开采集源 {location:?}: {reason}")]
    Open { location: PathBuf, reason: String },

    #[error("图像解码失败 {location:?}: {source}")]
    Decode {
        location: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("采集流已结束")]
    EndOfStream,
}

/// 网络加载错误
#[derive(Error, Debug)]
pub enum ModelLoadError {
    #[error("模型文件不存在: {0:?}")]
    NotFound(PathBuf),

    #[error("无法读取类别标签 {path:?}: {source}")]
    Labels {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("ONNX Runtime 初始化失败: {0}")]
    Runtime(#[from] ort::Error),
}

/// 推理错误
#[derive(Error, Debug)]
pub enum DetectError {
    #[error("推理失败: {0}")]
    Runtime(#[from] ort::Error),

    #[error("模型输出形状不符合预期: {0:?}")]
    Output(Vec<i64>),

    #[error("张量形状错误: {0}")]
    Shape(#[from] ndarray::ShapeError),
}

/// 显示输出错误
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),

    #[error("图像编码失败: {0}")]
    Encode(#[from] image::ImageError),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Capture(#[from] CaptureError),

    #[error(transparent)]
    ModelLoad(#[from] ModelLoadError),

    #[error(transparent)]
    Detect(#[from] DetectError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("报告输出失败: {0}")]
    Report(#[from] std::io::Error),
}

pub type AppResult<T> = Result<T, AppError>;
