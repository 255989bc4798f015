use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, trace};

use crate::error::RenderError;
use crate::frame::Frame;
use crate::signal::ShutdownFlag;

/// 显示端
///
/// 采集循环在每次迭代前检查 `is_open`，关闭后循环结束。
pub trait Display {
    fn is_open(&self) -> bool;

    fn render_once(&mut self, frame: &Frame) -> Result<(), RenderError>;

    fn set_title(&mut self, title: &str);
}

/// 快照显示
///
/// 给定输出目录时把每帧写成 `frame_<序号>.png`，否则只计数。
/// 渲染满 `max_frames` 帧或收到退出信号后视为关闭。
#[derive(Debug)]
pub struct SnapshotDisplay {
    output: Option<PathBuf>,
    max_frames: Option<u64>,
    shutdown: ShutdownFlag,
    title: String,
    rendered: u64,
}

impl SnapshotDisplay {
    pub fn new(
        output: Option<&Path>,
        max_frames: Option<u64>,
        shutdown: ShutdownFlag,
    ) -> Result<Self, RenderError> {
        if let Some(dir) = output {
            fs::create_dir_all(dir)?;
            info!(output = %dir.display(), "渲染帧将写入目录");
        }
        Ok(Self {
            output: output.map(Path::to_path_buf),
            max_frames,
            shutdown,
            title: String::new(),
            rendered: 0,
        })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn rendered(&self) -> u64 {
        self.rendered
    }

    pub fn frame_path(dir: &Path, index: u64) -> PathBuf {
        dir.join(format!("frame_{index:06}.png"))
    }
}

impl Display for SnapshotDisplay {
    fn is_open(&self) -> bool {
        !self.shutdown.is_triggered() && self.max_frames.is_none_or(|max| self.rendered < max)
    }

    fn render_once(&mut self, frame: &Frame) -> Result<(), RenderError> {
        if let Some(dir) = &self.output {
            frame.image.save(Self::frame_path(dir, frame.index))?;
        }
        self.rendered += 1;
        Ok(())
    }

    fn set_title(&mut self, title: &str) {
        if self.title != title {
            trace!(title, "标题更新");
            self.title = title.to_string();
        }
    }
}
