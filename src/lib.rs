pub mod capture;
pub mod cli;
pub mod config;
pub mod detect;
pub mod display;
pub mod error;
pub mod frame;
pub mod logging;
pub mod pipeline;
pub mod signal;

// 重新导出常用类型
pub use capture::{FrameSource, PipelineSource};
pub use cli::{ArgsError, Config};
pub use detect::{Detection, Detector, OverlayFlags, YoloDetector};
pub use display::{Display, SnapshotDisplay};
pub use error::{AppError, AppResult};
pub use frame::Frame;
