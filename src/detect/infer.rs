use ndarray::Array4;
use ort::{inputs, session::Session, value::Tensor};

use crate::config::MODEL_INPUT_NAME;
use crate::error::DetectError;

/// 模型原始输出
///
/// 从Session中拷贝出的第一个输出张量，形状和扁平数据分开保存，
/// 由后处理模块按布局解码。
#[derive(Debug, Clone, PartialEq)]
pub struct RawOutput {
    pub shape: Vec<i64>,
    pub data: Vec<f32>,
}

/// 运行模型推理
///
/// # 参数
/// * `model` - ONNX模型Session
/// * `input` - 输入张量，形状应为(1, 3, height, width)
pub fn run_inference(model: &mut Session, input: &Array4<f32>) -> Result<RawOutput, DetectError> {
    let shape: Vec<usize> = input.shape().to_vec();
    let (data, _offset) = input.clone().into_raw_vec_and_offset();
    let input_tensor = Tensor::from_array(([shape[0], shape[1], shape[2], shape[3]], data))?;

    let outputs = model.run(inputs![MODEL_INPUT_NAME => input_tensor])?;
    let (shape, data) = outputs[0].try_extract_tensor::<f32>()?;

    let shape: Vec<i64> = shape.to_vec();
    if shape.len() != 3 || shape[0] != 1 {
        return Err(DetectError::Output(shape));
    }

    Ok(RawOutput {
        shape,
        data: data.to_vec(),
    })
}
