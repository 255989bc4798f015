//! 命令行参数
//!
//! 参数只在启动时解析一次，得到不可变的 [`Config`]，之后按引用传入采集循环。
//! 解析失败（包括 `--help`）以 [`ArgsError`] 返回，由调用方决定打印帮助后退出。
//! 无法识别的参数不算错误，原样保存在 [`Config::ignored_args`] 中，由调用方给出警告。

use std::ffi::OsString;
use std::path::PathBuf;

use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use thiserror::Error;

use crate::config::{
    DEFAULT_ALPHA, DEFAULT_DEPTH, DEFAULT_HEIGHT, DEFAULT_MODEL_DIR, DEFAULT_NETWORK, DEFAULT_OVERLAY,
    DEFAULT_PIPELINE, DEFAULT_THRESHOLD, DEFAULT_WIDTH, SUPPORTED_DEPTHS,
};
use crate::detect::OverlayFlags;

const NETWORK_USAGE: &str = "\
networks:
  --network NAME       load <model-dir>/NAME.onnx, labels from <model-dir>/NAME.labels if present
  --network FILE.onnx  load an ONNX file directly (--model is an alias)
  built-in label tables: facenet (face), pednet (person), yolo*/ssd* (80 COCO classes)
  unrecognised arguments are ignored with a warning

pipelines:
  elements are separated by '!', properties are key=value (quote values with spaces)
  videotestsrc [pattern=smpte|checkers|ball|black|white] [num-buffers=N]
  filesrc location=IMAGE [num-buffers=N]
  multifilesrc location=DIR [loop=true|false]
  optional: queue, videoconvert, videoscale, appsink [name=NAME]

example:
  detectnet-pipeline --network yolo11n --pipeline \"multifilesrc location=frames ! appsink\"";

#[derive(Parser, Debug)]
#[command(
    name = "detectnet-pipeline",
    about = "Locate objects in a live stream using an object detection DNN.",
    after_help = NETWORK_USAGE
)]
struct Args {
    /// pre-trained model to load (see below for options)
    #[arg(long, visible_alias = "model", default_value = DEFAULT_NETWORK)]
    network: String,

    /// detection overlay flags (e.g. --overlay=box,labels,conf)
    /// valid combinations are:  'box', 'labels', 'conf', 'none'
    #[arg(long, default_value = DEFAULT_OVERLAY, value_parser = parse_overlay)]
    overlay: OverlayFlags,

    /// overlay alpha blending value, range 0-255
    #[arg(long, default_value_t = DEFAULT_ALPHA)]
    alpha: u8,

    /// minimum detection threshold to use
    #[arg(long, default_value_t = DEFAULT_THRESHOLD, value_parser = parse_threshold)]
    threshold: f32,

    /// pipeline descriptor, e.g. "videotestsrc pattern=ball ! appsink"
    #[arg(long, default_value = DEFAULT_PIPELINE, allow_hyphen_values = true)]
    pipeline: String,

    /// desired width of the stream in pixels
    #[arg(long, default_value_t = DEFAULT_WIDTH, value_parser = clap::value_parser!(u32).range(1..))]
    width: u32,

    /// desired height of the stream in pixels
    #[arg(long, default_value_t = DEFAULT_HEIGHT, value_parser = clap::value_parser!(u32).range(1..))]
    height: u32,

    /// desired pixel depth of the stream (bpp)
    #[arg(long, default_value_t = DEFAULT_DEPTH, value_parser = parse_depth)]
    depth: u32,

    /// directory searched for NAME.onnx networks
    #[arg(long, default_value = DEFAULT_MODEL_DIR)]
    model_dir: PathBuf,

    /// class label file, one label per line
    #[arg(long)]
    labels: Option<PathBuf>,

    /// write rendered frames as PNG files into this directory
    #[arg(long)]
    output: Option<PathBuf>,

    /// stop after this many frames
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    frames: Option<u64>,
}

fn parse_overlay(s: &str) -> Result<OverlayFlags, String> {
    s.parse()
}

fn parse_threshold(s: &str) -> Result<f32, String> {
    let value: f32 = s.parse().map_err(|_| format!("'{s}' is not a number"))?;
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(format!("threshold must be within [0, 1], got {value}"))
    }
}

fn parse_depth(s: &str) -> Result<u32, String> {
    let value: u32 = s.parse().map_err(|_| format!("'{s}' is not a valid depth"))?;
    if SUPPORTED_DEPTHS.contains(&value) {
        Ok(value)
    } else {
        Err(format!("depth must be one of {SUPPORTED_DEPTHS:?}, got {value}"))
    }
}

/// 运行参数，启动后只读
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub network: String,
    pub overlay: OverlayFlags,
    pub alpha: u8,
    pub threshold: f32,
    pub pipeline: String,
    pub width: u32,
    pub height: u32,
    pub depth: u32,
    pub model_dir: PathBuf,
    pub labels: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub max_frames: Option<u64>,
    /// 未识别的参数，保持原始顺序
    pub ignored_args: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            network: DEFAULT_NETWORK.to_string(),
            overlay: OverlayFlags::default(),
            alpha: DEFAULT_ALPHA,
            threshold: DEFAULT_THRESHOLD,
            pipeline: DEFAULT_PIPELINE.to_string(),
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            depth: DEFAULT_DEPTH,
            model_dir: PathBuf::from(DEFAULT_MODEL_DIR),
            labels: None,
            output: None,
            max_frames: None,
            ignored_args: Vec::new(),
        }
    }
}

impl Args {
    fn into_config(self, ignored_args: Vec<String>) -> Config {
        Config {
            network: self.network,
            overlay: self.overlay,
            alpha: self.alpha,
            threshold: self.threshold,
            pipeline: self.pipeline,
            width: self.width,
            height: self.height,
            depth: self.depth,
            model_dir: self.model_dir,
            labels: self.labels,
            output: self.output,
            max_frames: self.frames,
            ignored_args,
        }
    }
}

/// 参数解析失败
#[derive(Debug, Error)]
pub enum ArgsError {
    /// 用户请求了帮助
    #[error("{0}")]
    Help(String),

    #[error("{message}")]
    Invalid { message: String, usage: String },
}

impl ArgsError {
    /// 需要打印给用户的完整帮助文本
    pub fn help_text(&self) -> String {
        match self {
            Self::Help(help) => help.clone(),
            Self::Invalid { message, usage } => format!("{message}\n{usage}"),
        }
    }
}

impl Config {
    /// 从参数列表构造配置，第一个元素为程序名
    pub fn from_args<I, T>(args: I) -> Result<Self, ArgsError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let (known, ignored) = split_known_args(args);
        match Args::try_parse_from(known) {
            Ok(args) => Ok(args.into_config(ignored)),
            Err(err) => match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                    Err(ArgsError::Help(err.render().to_string()))
                }
                _ => Err(ArgsError::Invalid {
                    message: err.render().to_string(),
                    usage: Args::command().render_help().to_string(),
                }),
            },
        }
    }

    pub fn from_env() -> Result<Self, ArgsError> {
        Self::from_args(std::env::args_os())
    }
}

/// 把参数分成已知参数和未识别参数
///
/// 已知的长参数（含别名）连同其值交给clap解析，其余参数原样收集。
/// 未识别的 `--name` 若没有用 `=` 附带值，紧随其后且不以 `-` 开头的参数视为它的值。
fn split_known_args<I, T>(args: I) -> (Vec<OsString>, Vec<String>)
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let command = Args::command();
    let takes_value = |name: &str| -> Option<bool> {
        if name == "help" {
            return Some(false);
        }
        command
            .get_arguments()
            .find(|arg| {
                arg.get_long() == Some(name)
                    || arg.get_all_aliases().is_some_and(|aliases| aliases.contains(&name))
            })
            .map(|arg| arg.get_action().takes_values())
    };

    let mut args = args.into_iter().map(|arg| -> OsString { arg.into() }).peekable();
    let mut known: Vec<OsString> = args.next().into_iter().collect();
    let mut ignored = Vec::new();

    while let Some(arg) = args.next() {
        let text = arg.to_string_lossy().into_owned();

        if text == "-h" {
            known.push(arg);
            continue;
        }

        let Some(flag) = text.strip_prefix("--").filter(|flag| !flag.is_empty()) else {
            ignored.push(text);
            continue;
        };
        let (name, inline_value) = match flag.split_once('=') {
            Some((name, _)) => (name, true),
            None => (flag, false),
        };

        match takes_value(name) {
            Some(needs_value) => {
                known.push(arg);
                if needs_value && !inline_value {
                    known.extend(args.next());
                }
            }
            None => {
                ignored.push(text.clone());
                let value_follows = args
                    .peek()
                    .is_some_and(|next| !next.to_string_lossy().starts_with('-'));
                if !inline_value && value_follows {
                    ignored.extend(args.next().map(|v| v.to_string_lossy().into_owned()));
                }
            }
        }
    }

    (known, ignored)
}
