use std::fs;
use std::path::{Path, PathBuf};

use image::{DynamicImage, RgbaImage, imageops::{self, FilterType}};
use tracing::{debug, info};

use crate::capture::FrameSource;
use crate::capture::descriptor::{Element, PipelineDescriptor};
use crate::capture::pattern::TestPattern;
use crate::error::CaptureError;
use crate::frame::Frame;

const IMAGE_EXTENSIONS: [&str; 8] = ["png", "jpg", "jpeg", "bmp", "gif", "tif", "tiff", "webp"];
const PASS_THROUGH: [&str; 3] = ["queue", "videoconvert", "videoscale"];
const SINK: &str = "appsink";

/// 管道的源元素
#[derive(Debug, Clone, PartialEq)]
pub enum SourceKind {
    /// `videotestsrc`
    TestPattern {
        pattern: TestPattern,
        num_buffers: Option<u64>,
    },
    /// `filesrc`：重复输出同一张静态图
    File {
        location: PathBuf,
        num_buffers: Option<u64>,
    },
    /// `multifilesrc`：按文件名顺序输出目录下的图像
    MultiFile { location: PathBuf, looping: bool },
}

impl SourceKind {
    /// 从管道描述中取出源元素并校验其余元素
    ///
    /// 空描述等价于 `videotestsrc`。
    pub fn from_descriptor(descriptor: &PipelineDescriptor) -> Result<Self, CaptureError> {
        let Some((source, rest)) = descriptor.elements.split_first() else {
            return Ok(Self::TestPattern {
                pattern: TestPattern::default(),
                num_buffers: None,
            });
        };

        for (i, element) in rest.iter().enumerate() {
            let is_last = i + 1 == rest.len();
            match element.name.as_str() {
                name if PASS_THROUGH.contains(&name) => {}
                SINK if is_last => {}
                SINK => {
                    return Err(CaptureError::Pipeline("appsink must be the last element".into()));
                }
                other => {
                    return Err(CaptureError::Pipeline(format!("unsupported element '{other}'")));
                }
            }
        }

        match source.name.as_str() {
            "videotestsrc" => {
                check_properties(source, &["pattern", "num-buffers"])?;
                let pattern = match source.property("pattern") {
                    Some(p) => p.parse()?,
                    None => TestPattern::default(),
                };
                Ok(Self::TestPattern {
                    pattern,
                    num_buffers: num_buffers(source)?,
                })
            }
            "filesrc" => {
                check_properties(source, &["location", "num-buffers"])?;
                Ok(Self::File {
                    location: location(source)?,
                    num_buffers: num_buffers(source)?,
                })
            }
            "multifilesrc" => {
                check_properties(source, &["location", "loop"])?;
                let looping = match source.property("loop") {
                    None | Some("false") | Some("0") => false,
                    Some("true") | Some("1") => true,
                    Some(other) => {
                        return Err(CaptureError::Pipeline(format!("invalid loop value '{other}'")));
                    }
                };
                Ok(Self::MultiFile {
                    location: location(source)?,
                    looping,
                })
            }
            other => Err(CaptureError::Pipeline(format!(
                "'{other}' is not a supported source element"
            ))),
        }
    }
}

fn check_properties(element: &Element, allowed: &[&str]) -> Result<(), CaptureError> {
    match element.properties.iter().find(|(k, _)| !allowed.contains(&k.as_str())) {
        Some((key, _)) => Err(CaptureError::Pipeline(format!(
            "unknown property '{key}' on '{}'",
            element.name
        ))),
        None => Ok(()),
    }
}

fn location(element: &Element) -> Result<PathBuf, CaptureError> {
    element
        .property("location")
        .filter(|l| !l.is_empty())
        .map(PathBuf::from)
        .ok_or_else(|| CaptureError::Pipeline(format!("'{}' requires a location", element.name)))
}

fn num_buffers(element: &Element) -> Result<Option<u64>, CaptureError> {
    match element.property("num-buffers") {
        None | Some("-1") => Ok(None),
        Some(value) => value
            .parse()
            .map(Some)
            .map_err(|_| CaptureError::Pipeline(format!("invalid num-buffers '{value}'"))),
    }
}

/// 解码图像文件，丢弃alpha通道，输出的帧总是不透明的
fn decode(path: &Path) -> Result<RgbaImage, CaptureError> {
    image::open(path)
        .map(|img| DynamicImage::ImageRgb8(img.to_rgb8()).to_rgba8())
        .map_err(|source| CaptureError::Decode {
            location: path.to_path_buf(),
            source,
        })
}

fn fit(image: RgbaImage, width: u32, height: u32) -> RgbaImage {
    if image.dimensions() == (width, height) {
        image
    } else {
        imageops::resize(&image, width, height, FilterType::Triangle)
    }
}

/// 列出目录下的图像文件，按文件名排序
fn list_images(dir: &Path) -> Result<Vec<PathBuf>, CaptureError> {
    let entries = fs::read_dir(dir).map_err(|e| CaptureError::Open {
        location: dir.to_path_buf(),
        reason: e.to_string(),
    })?;

    let mut files: Vec<PathBuf> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        })
        .collect();
    files.sort();

    if files.is_empty() {
        return Err(CaptureError::Open {
            location: dir.to_path_buf(),
            reason: "no image files found".into(),
        });
    }
    Ok(files)
}

#[derive(Debug)]
enum SourceState {
    Closed,
    Still(RgbaImage),
    Sequence { files: Vec<PathBuf>, cursor: usize },
    Pattern,
}

/// 由管道描述构建的采集源
///
/// 所有输出帧都缩放为创建时给定的宽高。
#[derive(Debug)]
pub struct PipelineSource {
    kind: SourceKind,
    width: u32,
    height: u32,
    depth: u32,
    state: SourceState,
    next_index: u64,
}

impl PipelineSource {
    /// 解析管道描述并创建采集源，此时尚未打开任何文件
    pub fn create(descriptor: &str, width: u32, height: u32, depth: u32) -> Result<Self, CaptureError> {
        let parsed: PipelineDescriptor = descriptor.parse()?;
        let kind = SourceKind::from_descriptor(&parsed)?;
        debug!(pipeline = %parsed, ?kind, "管道解析完成");
        Ok(Self {
            kind,
            width,
            height,
            depth,
            state: SourceState::Closed,
            next_index: 0,
        })
    }

    fn next_image(&mut self) -> Result<RgbaImage, CaptureError> {
        let index = self.next_index;
        let (width, height) = (self.width, self.height);
        let exhausted = |limit: Option<u64>| limit.is_some_and(|n| index >= n);

        match (&self.kind, &mut self.state) {
            (_, SourceState::Closed) => Err(CaptureError::Open {
                location: PathBuf::new(),
                reason: "source is not open".into(),
            }),
            (SourceKind::TestPattern { pattern, num_buffers }, SourceState::Pattern) => {
                if exhausted(*num_buffers) {
                    return Err(CaptureError::EndOfStream);
                }
                Ok(pattern.render(width, height, index))
            }
            (SourceKind::File { num_buffers, .. }, SourceState::Still(image)) => {
                if exhausted(*num_buffers) {
                    return Err(CaptureError::EndOfStream);
                }
                Ok(image.clone())
            }
            (SourceKind::MultiFile { looping, .. }, SourceState::Sequence { files, cursor }) => {
                if *cursor >= files.len() {
                    if !*looping {
                        return Err(CaptureError::EndOfStream);
                    }
                    *cursor = 0;
                }
                let image = decode(&files[*cursor])?;
                *cursor += 1;
                Ok(fit(image, width, height))
            }
            _ => Err(CaptureError::Pipeline("source state does not match its kind".into())),
        }
    }
}

impl FrameSource for PipelineSource {
    fn open(&mut self) -> Result<(), CaptureError> {
        self.state = match &self.kind {
            SourceKind::TestPattern { .. } => SourceState::Pattern,
            SourceKind::File { location, .. } => {
                if !location.is_file() {
                    return Err(CaptureError::Open {
                        location: location.clone(),
                        reason: "file does not exist".into(),
                    });
                }
                SourceState::Still(fit(decode(location)?, self.width, self.height))
            }
            SourceKind::MultiFile { location, .. } => SourceState::Sequence {
                files: list_images(location)?,
                cursor: 0,
            },
        };
        info!(
            width = self.width,
            height = self.height,
            depth = self.depth,
            "采集源已打开"
        );
        Ok(())
    }

    fn capture(&mut self) -> Result<Frame, CaptureError> {
        let image = self.next_image()?;
        let frame = Frame::new(self.next_index, image);
        self.next_index += 1;
        Ok(frame)
    }

    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn depth(&self) -> u32 {
        self.depth
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn kind_of(descriptor: &str) -> Result<SourceKind, CaptureError> {
        SourceKind::from_descriptor(&descriptor.parse()?)
    }

    #[test]
    fn empty_descriptor_is_test_pattern() {
        assert_eq!(
            kind_of("").unwrap(),
            SourceKind::TestPattern {
                pattern: TestPattern::Smpte,
                num_buffers: None
            }
        );
    }

    #[test]
    fn source_properties_are_validated() {
        assert!(matches!(kind_of("videotestsrc foo=1"), Err(CaptureError::Pipeline(_))));
        assert!(matches!(kind_of("filesrc"), Err(CaptureError::Pipeline(_))));
        assert!(matches!(kind_of("multifilesrc location=x loop=maybe"), Err(CaptureError::Pipeline(_))));
        assert!(matches!(kind_of("videotestsrc num-buffers=abc"), Err(CaptureError::Pipeline(_))));
    }

    #[test]
    fn unsupported_elements_are_rejected() {
        assert!(matches!(kind_of("rtspsrc location=rtsp://cam ! appsink"), Err(CaptureError::Pipeline(_))));
        assert!(matches!(kind_of("videotestsrc ! h264parse"), Err(CaptureError::Pipeline(_))));
        assert!(matches!(kind_of("videotestsrc ! appsink ! queue"), Err(CaptureError::Pipeline(_))));
        assert!(kind_of("videotestsrc ! queue ! videoconvert ! videoscale ! appsink name=s").is_ok());
    }

    #[test]
    fn test_pattern_respects_num_buffers() {
        let mut source = PipelineSource::create("videotestsrc pattern=ball num-buffers=2", 64, 48, 12).unwrap();
        source.open().unwrap();

        let first = source.capture().unwrap();
        assert_eq!((first.index, first.dimensions()), (0, (64, 48)));
        assert_eq!(source.capture().unwrap().index, 1);
        assert!(matches!(source.capture(), Err(CaptureError::EndOfStream)));
    }

    #[test]
    fn capture_before_open_fails() {
        let mut source = PipelineSource::create("", 8, 8, 12).unwrap();
        assert!(matches!(source.capture(), Err(CaptureError::Open { .. })));
    }

    #[test]
    fn filesrc_repeats_and_scales_still_image() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("still.png");
        RgbaImage::from_pixel(20, 10, Rgba([10, 20, 30, 255])).save(&path).unwrap();

        let descriptor = format!("filesrc location=\"{}\" num-buffers=3", path.display());
        let mut source = PipelineSource::create(&descriptor, 40, 20, 12).unwrap();
        source.open().unwrap();

        for _ in 0..3 {
            let frame = source.capture().unwrap();
            assert_eq!(frame.dimensions(), (40, 20));
            assert_eq!(frame.image.get_pixel(5, 5).0, [10, 20, 30, 255]);
        }
        assert!(matches!(source.capture(), Err(CaptureError::EndOfStream)));
    }

    #[test]
    fn decoded_frames_are_opaque() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cutout.png");
        let mut still = RgbaImage::from_pixel(4, 4, Rgba([90, 60, 30, 255]));
        still.put_pixel(1, 1, Rgba([90, 60, 30, 0]));
        still.save(&path).unwrap();

        let descriptor = format!("filesrc location=\"{}\"", path.display());
        let mut source = PipelineSource::create(&descriptor, 4, 4, 12).unwrap();
        source.open().unwrap();

        let frame = source.capture().unwrap();
        assert_eq!(frame.image.get_pixel(1, 1).0, [90, 60, 30, 255]);
        assert!(frame.image.pixels().all(|p| p.0[3] == 255));
    }

    #[test]
    fn missing_file_fails_to_open() {
        let mut source = PipelineSource::create("filesrc location=/no/such/file.png", 8, 8, 12).unwrap();
        assert!(matches!(source.open(), Err(CaptureError::Open { .. })));
    }

    #[test]
    fn multifilesrc_walks_directory_in_order() {
        let dir = tempfile::tempdir().unwrap();
        RgbaImage::from_pixel(4, 4, Rgba([2, 0, 0, 255])).save(dir.path().join("b.png")).unwrap();
        RgbaImage::from_pixel(4, 4, Rgba([1, 0, 0, 255])).save(dir.path().join("a.png")).unwrap();
        fs::write(dir.path().join("notes.txt"), "skip me").unwrap();

        let descriptor = format!("multifilesrc location=\"{}\" ! appsink", dir.path().display());
        let mut source = PipelineSource::create(&descriptor, 4, 4, 12).unwrap();
        source.open().unwrap();

        assert_eq!(source.capture().unwrap().image.get_pixel(0, 0).0[0], 1);
        assert_eq!(source.capture().unwrap().image.get_pixel(0, 0).0[0], 2);
        assert!(matches!(source.capture(), Err(CaptureError::EndOfStream)));
    }

    #[test]
    fn multifilesrc_loops_when_asked() {
        let dir = tempfile::tempdir().unwrap();
        RgbaImage::from_pixel(4, 4, Rgba([7, 0, 0, 255])).save(dir.path().join("only.png")).unwrap();

        let descriptor = format!("multifilesrc location=\"{}\" loop=true", dir.path().display());
        let mut source = PipelineSource::create(&descriptor, 4, 4, 12).unwrap();
        source.open().unwrap();

        for expected in 0..3 {
            assert_eq!(source.capture().unwrap().index, expected);
        }
    }

    #[test]
    fn empty_directory_fails_to_open() {
        let dir = tempfile::tempdir().unwrap();
        let descriptor = format!("multifilesrc location=\"{}\"", dir.path().display());
        let mut source = PipelineSource::create(&descriptor, 4, 4, 12).unwrap();
        assert!(matches!(source.open(), Err(CaptureError::Open { .. })));
    }
}
