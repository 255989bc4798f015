//! 边界框后处理模块
//!
//! 负责解码模型输出，进行坐标转换、置信度过滤和非极大值抑制(NMS)。
//! 支持两种YOLO输出布局：
//! - 端到端导出 `[1, N, 6]`，每行为 `x1, y1, x2, y2, score, class`
//! - 原始输出 `[1, 4 + C, N]`，每列为 `cx, cy, w, h, C个类别得分`

use ndarray::{ArrayView2, Axis};

use crate::config::DETECTIONS_CAPACITY;
use crate::detect::bounds::{BoundingBox, Detection};
use crate::detect::infer::RawOutput;
use crate::detect::labels::ClassLabels;
use crate::error::DetectError;

/// 端到端导出每行的参数个数
const END_TO_END_PARAMS: i64 = 6;

/// 图像缩放信息
///
/// 记录原始帧尺寸和模型输入尺寸，用于将框坐标映射回原始帧。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleMessage {
    pub o_width: u32,
    pub o_height: u32,
    pub s_width: usize,
    pub s_height: usize,
}

impl ScaleMessage {
    fn factors(&self) -> (f32, f32) {
        (
            self.o_width as f32 / self.s_width as f32,
            self.o_height as f32 / self.s_height as f32,
        )
    }
}

/// 处理模型输出，应用置信度和NMS阈值
///
/// 返回按置信度降序排列、已去重的检测结果，数量不超过 `DETECTIONS_CAPACITY`。
pub fn process_detections(
    output: &RawOutput,
    message: &ScaleMessage,
    labels: &ClassLabels,
    confidence_threshold: f32,
    nms_threshold: f32,
) -> Result<Vec<Detection>, DetectError> {
    let shape = &output.shape;
    if shape.len() != 3 || shape[0] != 1 || shape[1] <= 0 || shape[2] <= 0 {
        return Err(DetectError::Output(shape.clone()));
    }
    let (rows, cols) = (shape[1] as usize, shape[2] as usize);
    let view = ArrayView2::from_shape((rows, cols), output.data.as_slice())?;

    let candidates = if shape[2] == END_TO_END_PARAMS {
        decode_end_to_end(view, message, confidence_threshold)
    } else if shape[1] > 4 {
        decode_raw(view, message, confidence_threshold)
    } else {
        return Err(DetectError::Output(shape.clone()));
    };

    let mut detections: Vec<Detection> = candidates
        .into_iter()
        .map(|(bbox, class_id, confidence)| {
            Detection::new(bbox, class_id, labels.name(class_id), confidence)
        })
        .collect();

    detections.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    let mut kept = apply_nms(detections, nms_threshold);
    kept.truncate(DETECTIONS_CAPACITY);
    Ok(kept)
}

fn decode_end_to_end(
    view: ArrayView2<'_, f32>,
    message: &ScaleMessage,
    confidence_threshold: f32,
) -> Vec<(BoundingBox, usize, f32)> {
    let (sx, sy) = message.factors();
    let (fw, fh) = (message.o_width as f32, message.o_height as f32);

    view.axis_iter(Axis(0))
        .filter_map(|row| {
            let confidence = row[4];
            if confidence < confidence_threshold {
                return None;
            }
            let bbox = BoundingBox::new(row[0], row[1], row[2], row[3])
                .scale(sx, sy)
                .clamp(fw, fh);
            let class_id = row[5].max(0.0) as usize;
            bbox.is_valid().then_some((bbox, class_id, confidence))
        })
        .collect()
}

fn decode_raw(
    view: ArrayView2<'_, f32>,
    message: &ScaleMessage,
    confidence_threshold: f32,
) -> Vec<(BoundingBox, usize, f32)> {
    let (sx, sy) = message.factors();
    let (fw, fh) = (message.o_width as f32, message.o_height as f32);

    // 每一列是一个候选框
    view.axis_iter(Axis(1))
        .filter_map(|col| {
            let (class_id, confidence) = col
                .iter()
                .skip(4)
                .copied()
                .enumerate()
                .max_by(|a, b| a.1.total_cmp(&b.1))?;
            if confidence < confidence_threshold {
                return None;
            }
            let bbox = BoundingBox::from_center(col[0], col[1], col[2], col[3])
                .scale(sx, sy)
                .clamp(fw, fh);
            bbox.is_valid().then_some((bbox, class_id, confidence))
        })
        .collect()
}

/// 应用非极大值抑制
///
/// 输入需已按置信度降序排列。只在同类别之间抑制，IoU达到阈值的低分框被丢弃。
pub fn apply_nms(detections: Vec<Detection>, nms_threshold: f32) -> Vec<Detection> {
    let mut suppressed = vec![false; detections.len()];

    for i in 0..detections.len() {
        if suppressed[i] {
            continue;
        }
        for j in (i + 1)..detections.len() {
            if suppressed[j] || detections[j].class_id != detections[i].class_id {
                continue;
            }
            if detections[i].bbox.iou(&detections[j].bbox) >= nms_threshold {
                suppressed[j] = true;
            }
        }
    }

    detections
        .into_iter()
        .zip(suppressed)
        .filter_map(|(detection, dropped)| (!dropped).then_some(detection))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message() -> ScaleMessage {
        ScaleMessage {
            o_width: 1280,
            o_height: 720,
            s_width: 640,
            s_height: 640,
        }
    }

    fn labels() -> ClassLabels {
        ClassLabels::new(vec!["person".into(), "car".into()])
    }

    #[test]
    fn end_to_end_rows_are_filtered_and_scaled() {
        let output = RawOutput {
            shape: vec![1, 3, 6],
            data: vec![
                10.0, 10.0, 110.0, 210.0, 0.9, 0.0, //
                300.0, 300.0, 400.0, 400.0, 0.3, 1.0, // 低于阈值
                500.0, 100.0, 600.0, 200.0, 0.85, 1.0,
            ],
        };

        let detections = process_detections(&output, &message(), &labels(), 0.5, 0.7).unwrap();

        assert_eq!(detections.len(), 2);
        assert_eq!(detections[0].class_name, "person");
        assert_eq!(detections[0].bbox, BoundingBox::new(20.0, 11.25, 220.0, 236.25));
        assert_eq!(detections[1].class_name, "car");
        assert!((detections[1].confidence - 0.85).abs() < 1e-6);
    }

    #[test]
    fn raw_columns_pick_best_class() {
        // 4 + 2 个通道，3 个候选框，按列存放
        #[rustfmt::skip]
        let data = vec![
            320.0, 100.0, 500.0,   // cx
            320.0, 100.0, 500.0,   // cy
            64.0,  20.0,  40.0,    // w
            64.0,  20.0,  40.0,    // h
            0.1,   0.95,  0.2,     // person
            0.8,   0.05,  0.1,     // car
        ];
        let output = RawOutput { shape: vec![1, 6, 3], data };

        let detections = process_detections(&output, &message(), &labels(), 0.5, 0.7).unwrap();

        assert_eq!(detections.len(), 2);
        assert_eq!(detections[0].class_id, 0);
        assert!((detections[0].confidence - 0.95).abs() < 1e-6);
        assert_eq!(detections[1].class_id, 1);
        assert_eq!(detections[1].bbox, BoundingBox::new(576.0, 324.0, 704.0, 396.0));
    }

    #[test]
    fn nms_suppresses_overlap_within_class_only() {
        let a = Detection::new(BoundingBox::new(0.0, 0.0, 100.0, 100.0), 0, "person", 0.9);
        let b = Detection::new(BoundingBox::new(5.0, 5.0, 100.0, 100.0), 0, "person", 0.8);
        let c = Detection::new(BoundingBox::new(5.0, 5.0, 100.0, 100.0), 1, "car", 0.7);

        let kept = apply_nms(vec![a.clone(), b, c.clone()], 0.7);

        assert_eq!(kept, vec![a, c]);
    }

    #[test]
    fn keeps_only_the_most_confident_up_to_capacity() {
        // 150 个互不重叠的框，置信度随序号递增
        let count = 150;
        let data: Vec<f32> = (0..count)
            .flat_map(|i| {
                let (x, y) = ((i % 15) as f32 * 40.0, (i / 15) as f32 * 40.0);
                [x, y, x + 30.0, y + 30.0, 0.5 + i as f32 * 0.003, 0.0]
            })
            .collect();
        let output = RawOutput { shape: vec![1, count as i64, 6], data };

        let detections = process_detections(&output, &message(), &labels(), 0.5, 0.7).unwrap();

        assert_eq!(detections.len(), DETECTIONS_CAPACITY);
        assert!(detections.windows(2).all(|w| w[0].confidence >= w[1].confidence));
        // 最低的50个被截掉
        let lowest_kept = 0.5 + (count - DETECTIONS_CAPACITY) as f32 * 0.003;
        assert!(detections.iter().all(|d| d.confidence >= lowest_kept - 1e-6));
    }

    #[test]
    fn unexpected_shape_is_an_error() {
        let output = RawOutput { shape: vec![1, 4, 2], data: vec![0.0; 8] };
        let err = process_detections(&output, &message(), &labels(), 0.5, 0.7).unwrap_err();
        assert!(matches!(err, DetectError::Output(_)));
    }

    #[test]
    fn short_buffer_is_a_shape_error() {
        let output = RawOutput { shape: vec![1, 2, 6], data: vec![0.0; 6] };
        let err = process_detections(&output, &message(), &labels(), 0.5, 0.7).unwrap_err();
        assert!(matches!(err, DetectError::Shape(_)));
    }
}
