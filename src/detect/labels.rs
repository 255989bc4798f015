//! 类别标签
//!
//! 标签文件每行一个类别名，空行被忽略；兼容 `n01440764 tench` 这种带编号前缀的格式。

use std::fs;
use std::path::Path;

use crate::error::ModelLoadError;

const COCO_CLASSES: [&str; 80] = [
    "person", "bicycle", "car", "motorcycle", "airplane", "bus", "train", "truck", "boat",
    "traffic light", "fire hydrant", "stop sign", "parking meter", "bench", "bird", "cat", "dog",
    "horse", "sheep", "cow", "elephant", "bear", "zebra", "giraffe", "backpack", "umbrella",
    "handbag", "tie", "suitcase", "frisbee", "skis", "snowboard", "sports ball", "kite",
    "baseball bat", "baseball glove", "skateboard", "surfboard", "tennis racket", "bottle",
    "wine glass", "cup", "fork", "knife", "spoon", "bowl", "banana", "apple", "sandwich", "orange",
    "broccoli", "carrot", "hot dog", "pizza", "donut", "cake", "chair", "couch", "potted plant",
    "bed", "dining table", "toilet", "tv", "laptop", "mouse", "remote", "keyboard", "cell phone",
    "microwave", "oven", "toaster", "sink", "refrigerator", "book", "clock", "vase", "scissors",
    "teddy bear", "hair drier", "toothbrush",
];

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassLabels {
    names: Vec<String>,
}

impl ClassLabels {
    pub fn new(names: Vec<String>) -> Self {
        Self { names }
    }

    pub fn coco() -> Self {
        Self::new(COCO_CLASSES.iter().map(|s| s.to_string()).collect())
    }

    /// 按网络名称选择内置标签表，未知网络返回空表
    pub fn builtin(network: &str) -> Self {
        let network = network.to_ascii_lowercase();
        match network.as_str() {
            "facenet" | "facenet-120" => Self::new(vec!["face".into()]),
            "pednet" | "multiped" => Self::new(vec!["person".into()]),
            n if n.starts_with("yolo") || n.starts_with("ssd") || n.contains("coco") => Self::coco(),
            _ => Self::default(),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ModelLoadError> {
        let content = fs::read_to_string(path).map_err(|source| ModelLoadError::Labels {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::parse(&content))
    }

    pub fn parse(content: &str) -> Self {
        let names = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| match line.split_once(' ') {
                Some((synset, name)) if is_synset(synset) => name.trim().to_string(),
                _ => line.to_string(),
            })
            .collect();
        Self::new(names)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// 类别名称，缺失时返回 `class #<id>`
    pub fn name(&self, class_id: usize) -> String {
        self.names
            .get(class_id)
            .cloned()
            .unwrap_or_else(|| format!("class #{class_id}"))
    }
}

fn is_synset(token: &str) -> bool {
    token.len() > 1 && token.starts_with('n') && token[1..].chars().all(|c| c.is_ascii_digit())
}
