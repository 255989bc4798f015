use std::path::Path;

use ort::session::{builder::GraphOptimizationLevel, Session};
use tracing::info;

use crate::config::MODEL_INTRA_THREADS;
use crate::error::ModelLoadError;

/// 加载ONNX检测模型
///
/// 加载前先确认文件存在，以便与运行时错误区分。
///
/// # 示例
///
/// ```no_run
/// use detectnet_pipeline::detect::model::load_model;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let session = load_model("networks/yolo11n.onnx".as_ref())?;
/// # Ok(())
/// # }
/// ```
pub fn load_model(model_path: &Path) -> Result<Session, ModelLoadError> {
    if !model_path.is_file() {
        return Err(ModelLoadError::NotFound(model_path.to_path_buf()));
    }

    let session = Session::builder()?
        .with_optimization_level(GraphOptimizationLevel::Level3)?
        .with_intra_threads(MODEL_INTRA_THREADS)?
        .commit_from_file(model_path)?;

    info!(model = %model_path.display(), "模型加载完成");
    Ok(session)
}
