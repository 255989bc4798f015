use std::path::PathBuf;

use detectnet_pipeline::detect::{BoundingBox, Detection, Detector, OverlayFlags};
use detectnet_pipeline::display::Display;
use detectnet_pipeline::error::{AppError, CaptureError, DetectError, RenderError};
use detectnet_pipeline::pipeline::{self, LoopStats};
use detectnet_pipeline::{Config, Frame, FrameSource};
use image::RgbaImage;

/// 无限或定长的纯色帧源
struct ScriptedSource {
    next: u64,
    limit: Option<u64>,
    fail_at: Option<u64>,
}

impl ScriptedSource {
    fn endless() -> Self {
        Self { next: 0, limit: None, fail_at: None }
    }

    fn finite(limit: u64) -> Self {
        Self { next: 0, limit: Some(limit), fail_at: None }
    }

    fn failing_at(index: u64) -> Self {
        Self { next: 0, limit: None, fail_at: Some(index) }
    }
}

impl FrameSource for ScriptedSource {
    fn capture(&mut self) -> Result<Frame, CaptureError> {
        if self.fail_at == Some(self.next) {
            return Err(CaptureError::Open {
                location: PathBuf::from("/dev/video0"),
                reason: "device lost".to_string(),
            });
        }
        if self.limit.is_some_and(|limit| self.next >= limit) {
            return Err(CaptureError::EndOfStream);
        }
        let frame = Frame::new(self.next, RgbaImage::new(self.width(), self.height()));
        self.next += 1;
        Ok(frame)
    }

    fn width(&self) -> u32 {
        32
    }

    fn height(&self) -> u32 {
        24
    }

    fn depth(&self) -> u32 {
        12
    }
}

/// 按帧序号返回预设数量检测结果的检测器
struct ScriptedDetector {
    per_frame: Vec<usize>,
    calls: u64,
    seen_overlay: Option<OverlayFlags>,
    fail: bool,
}

impl ScriptedDetector {
    fn new(per_frame: Vec<usize>) -> Self {
        Self { per_frame, calls: 0, seen_overlay: None, fail: false }
    }
}

impl Detector for ScriptedDetector {
    fn detect(&mut self, frame: &mut Frame, overlay: OverlayFlags) -> Result<Vec<Detection>, DetectError> {
        self.calls += 1;
        self.seen_overlay = Some(overlay);
        if self.fail {
            return Err(DetectError::Output(vec![1, 2, 3]));
        }
        let count = self.per_frame.get(frame.index as usize).copied().unwrap_or(0);
        Ok((0..count)
            .map(|i| Detection::new(BoundingBox::new(1.0, 2.0, 10.0, 12.0), i, "face", 0.9))
            .collect())
    }

    fn network_fps(&self) -> f32 {
        42.0
    }
}

/// 渲染固定帧数后关闭的显示端
struct CountingDisplay {
    remaining: u64,
    titles: Vec<String>,
    fail: bool,
}

impl CountingDisplay {
    fn open_for(frames: u64) -> Self {
        Self { remaining: frames, titles: Vec::new(), fail: false }
    }
}

impl Display for CountingDisplay {
    fn is_open(&self) -> bool {
        self.remaining > 0
    }

    fn render_once(&mut self, _frame: &Frame) -> Result<(), RenderError> {
        if self.fail {
            return Err(RenderError::Io(std::io::Error::other("window destroyed")));
        }
        self.remaining -= 1;
        Ok(())
    }

    fn set_title(&mut self, title: &str) {
        self.titles.push(title.to_string());
    }
}

fn report_lines(report: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(report).lines().map(str::to_string).collect()
}

#[test]
fn reports_detection_count_per_frame() {
    let config = Config::default();
    let mut source = ScriptedSource::endless();
    let mut detector = ScriptedDetector::new(vec![0, 2, 1]);
    let mut display = CountingDisplay::open_for(3);
    let mut report = Vec::new();

    let stats = pipeline::run(&config, &mut source, &mut detector, &mut display, &mut report).unwrap();

    assert_eq!(stats, LoopStats { frames: 3, detections: 3 });
    let lines = report_lines(&report);
    let summaries: Vec<&str> = lines
        .iter()
        .map(String::as_str)
        .filter(|l| l.starts_with("frame "))
        .collect();
    assert_eq!(
        summaries,
        [
            "frame 0: detected 0 objects in image",
            "frame 1: detected 2 objects in image",
            "frame 2: detected 1 objects in image",
        ]
    );
    // 每个检测结果单独一行
    assert_eq!(lines.len(), 3 + 3);
    assert!(lines[2].starts_with("<Detection class #"));
}

#[test]
fn stops_when_display_closes() {
    let config = Config::default();
    let mut source = ScriptedSource::endless();
    let mut detector = ScriptedDetector::new(Vec::new());
    let mut display = CountingDisplay::open_for(5);
    let mut report = Vec::new();

    let stats = pipeline::run(&config, &mut source, &mut detector, &mut display, &mut report).unwrap();

    assert_eq!(stats.frames, 5);
    assert_eq!(detector.calls, 5);
    assert!(!display.is_open());
}

#[test]
fn closed_display_runs_no_iterations() {
    let config = Config::default();
    let mut source = ScriptedSource::endless();
    let mut detector = ScriptedDetector::new(vec![1]);
    let mut display = CountingDisplay::open_for(0);
    let mut report = Vec::new();

    let stats = pipeline::run(&config, &mut source, &mut detector, &mut display, &mut report).unwrap();

    assert_eq!(stats, LoopStats::default());
    assert_eq!(detector.calls, 0);
    assert!(report.is_empty());
}

#[test]
fn end_of_stream_stops_normally() {
    let config = Config::default();
    let mut source = ScriptedSource::finite(2);
    let mut detector = ScriptedDetector::new(vec![1, 1]);
    let mut display = CountingDisplay::open_for(100);
    let mut report = Vec::new();

    let stats = pipeline::run(&config, &mut source, &mut detector, &mut display, &mut report).unwrap();

    assert_eq!(stats, LoopStats { frames: 2, detections: 2 });
    assert!(display.is_open());
}

#[test]
fn capture_failure_aborts_loop() {
    let config = Config::default();
    let mut source = ScriptedSource::failing_at(1);
    let mut detector = ScriptedDetector::new(Vec::new());
    let mut display = CountingDisplay::open_for(10);
    let mut report = Vec::new();

    let err = pipeline::run(&config, &mut source, &mut detector, &mut display, &mut report).unwrap_err();

    assert!(matches!(err, AppError::Capture(CaptureError::Open { .. })));
    assert_eq!(detector.calls, 1);
}

#[test]
fn detect_failure_aborts_loop() {
    let config = Config::default();
    let mut source = ScriptedSource::endless();
    let mut detector = ScriptedDetector::new(Vec::new());
    detector.fail = true;
    let mut display = CountingDisplay::open_for(10);
    let mut report = Vec::new();

    let err = pipeline::run(&config, &mut source, &mut detector, &mut display, &mut report).unwrap_err();

    assert!(matches!(err, AppError::Detect(DetectError::Output(_))));
    assert!(report.is_empty());
}

#[test]
fn render_failure_aborts_loop() {
    let config = Config::default();
    let mut source = ScriptedSource::endless();
    let mut detector = ScriptedDetector::new(vec![1]);
    let mut display = CountingDisplay::open_for(10);
    display.fail = true;
    let mut report = Vec::new();

    let err = pipeline::run(&config, &mut source, &mut detector, &mut display, &mut report).unwrap_err();

    assert!(matches!(err, AppError::Render(RenderError::Io(_))));
    assert_eq!(detector.calls, 1);
    assert!(display.titles.is_empty());
}

#[test]
fn passes_overlay_flags_and_updates_title() {
    let config = Config {
        network: "pednet".to_string(),
        overlay: "box,conf".parse().unwrap(),
        ..Config::default()
    };
    let mut source = ScriptedSource::endless();
    let mut detector = ScriptedDetector::new(Vec::new());
    let mut display = CountingDisplay::open_for(2);
    let mut report = Vec::new();

    pipeline::run(&config, &mut source, &mut detector, &mut display, &mut report).unwrap();

    let overlay = detector.seen_overlay.unwrap();
    assert!(overlay.boxes && overlay.confidence && !overlay.labels);
    assert_eq!(display.titles, ["pednet | Network 42 FPS", "pednet | Network 42 FPS"]);
}
