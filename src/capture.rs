//! 采集模块
//!
//! 采集循环只依赖 [`FrameSource`] trait。内置实现 [`PipelineSource`] 由管道描述字符串构建，
//! 支持测试图案、单张静态图和图像目录三种源。

pub mod descriptor;
pub mod pattern;
pub mod source;

pub use descriptor::{Element, PipelineDescriptor};
pub use pattern::TestPattern;
pub use source::{PipelineSource, SourceKind};

use crate::error::CaptureError;
use crate::frame::Frame;

/// 帧采集源
pub trait FrameSource {
    /// 开始采集，在第一次 `capture` 之前调用
    fn open(&mut self) -> Result<(), CaptureError> {
        Ok(())
    }

    /// 取下一帧；有限源耗尽时返回 `CaptureError::EndOfStream`
    fn capture(&mut self) -> Result<Frame, CaptureError>;

    fn width(&self) -> u32;

    fn height(&self) -> u32;

    /// 像素深度(bpp)
    fn depth(&self) -> u32;
}
