use std::path::{Path, PathBuf};

use tracing::debug;

use crate::detect::labels::ClassLabels;
use crate::error::ModelLoadError;

/// 解析后的网络描述
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkSpec {
    /// 显示用名称（标题栏）
    pub name: String,
    pub model_path: PathBuf,
    pub labels: ClassLabels,
}

impl NetworkSpec {
    /// 解析 `--network` 参数
    ///
    /// 以 `.onnx` 结尾的参数按文件路径处理，否则在 `model_dir` 下查找 `<name>.onnx`。
    /// 标签来源依次为：显式标签文件、`<model_dir>/<name>.labels`、内置标签表。
    pub fn resolve(
        network: &str,
        model_dir: &Path,
        labels: Option<&Path>,
    ) -> Result<Self, ModelLoadError> {
        let as_path = Path::new(network);
        let (name, model_path) = if network.ends_with(".onnx") {
            let stem = as_path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or(network)
                .to_string();
            (stem, as_path.to_path_buf())
        } else {
            (network.to_string(), model_dir.join(format!("{network}.onnx")))
        };

        let sidecar = model_path.with_extension("labels");
        let labels = match labels {
            Some(path) => ClassLabels::from_file(path)?,
            None if sidecar.is_file() => ClassLabels::from_file(&sidecar)?,
            None => ClassLabels::builtin(&name),
        };

        debug!(network = %name, model = %model_path.display(), classes = labels.len(), "网络解析完成");
        Ok(Self {
            name,
            model_path,
            labels,
        })
    }
}
