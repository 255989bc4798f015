//! 检测结果叠加层
//!
//! 通过raqote在帧上绘制：
//! - `box`：半透明填充 + 2px描边
//! - `labels`：框上方的类别色标签条，写类别名
//! - `conf`：标签条内写置信度百分比；未开 `labels` 时标签条为半透明黑色

use std::fmt;
use std::str::FromStr;

use font8x8::{BASIC_FONTS, UnicodeFonts};
use image::{Rgba, RgbaImage};
use raqote::{DrawOptions, DrawTarget, LineJoin, PathBuilder, SolidSource, Source, StrokeStyle};

use crate::detect::bounds::Detection;

const TAB_HEIGHT: f32 = 14.0;
const TEXT_PAD: f32 = 3.0;
const GLYPH_SIZE: u32 = 8;
const STROKE_WIDTH: f32 = 2.0;
const TEXT_COLOR: Rgba<u8> = Rgba([0xFF, 0xFF, 0xFF, 0xFF]);

const PALETTE: [(u8, u8, u8); 10] = [
    (0x00, 0xFF, 0xFF),
    (0xFF, 0x00, 0x00),
    (0x00, 0xFF, 0x00),
    (0xFF, 0xA5, 0x00),
    (0xFF, 0x00, 0xFF),
    (0x1E, 0x90, 0xFF),
    (0xFF, 0xFF, 0x00),
    (0x8A, 0x2B, 0xE2),
    (0x00, 0x80, 0x80),
    (0xFF, 0x69, 0xB4),
];

/// 叠加层标志
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverlayFlags {
    pub boxes: bool,
    pub labels: bool,
    pub confidence: bool,
}

impl OverlayFlags {
    pub const NONE: OverlayFlags = OverlayFlags {
        boxes: false,
        labels: false,
        confidence: false,
    };

    pub const ALL: OverlayFlags = OverlayFlags {
        boxes: true,
        labels: true,
        confidence: true,
    };

    pub fn is_none(&self) -> bool {
        *self == Self::NONE
    }
}

impl Default for OverlayFlags {
    fn default() -> Self {
        Self::ALL
    }
}

impl FromStr for OverlayFlags {
    type Err = String;

    /// 逗号分隔，可选值 `box`、`labels`、`conf`、`none`，大小写不敏感
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut flags = Self::NONE;
        for token in s.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            match token.to_ascii_lowercase().as_str() {
                "box" | "boxes" => flags.boxes = true,
                "label" | "labels" => flags.labels = true,
                "conf" | "confidence" => flags.confidence = true,
                "none" => {}
                other => {
                    return Err(format!(
                        "invalid overlay flag '{other}', valid combinations are: 'box', 'labels', 'conf', 'none'"
                    ));
                }
            }
        }
        Ok(flags)
    }
}

impl fmt::Display for OverlayFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            return f.write_str("none");
        }
        let names: Vec<&str> = [
            (self.boxes, "box"),
            (self.labels, "labels"),
            (self.confidence, "conf"),
        ]
        .iter()
        .filter(|(on, _)| *on)
        .map(|(_, name)| *name)
        .collect();
        f.write_str(&names.join(","))
    }
}

/// 类别对应的颜色
pub fn class_color(class_id: usize) -> (u8, u8, u8) {
    PALETTE[class_id % PALETTE.len()]
}

/// 标签条上的文字
///
/// 同时开启 `labels` 和 `conf` 时为 `"<类别> <置信度>%"`，只开其一时只显示对应部分。
pub fn caption(detection: &Detection, flags: OverlayFlags) -> Option<String> {
    let percent = detection.confidence.clamp(0.0, 1.0) * 100.0;
    match (flags.labels, flags.confidence) {
        (true, true) => Some(format!("{} {percent:.0}%", detection.class_name)),
        (true, false) => Some(detection.class_name.clone()),
        (false, true) => Some(format!("{percent:.0}%")),
        (false, false) => None,
    }
}

/// 框上方的标签条
struct Tab {
    x: f32,
    y: f32,
    width: f32,
    text: String,
}

impl Tab {
    fn new(detection: &Detection, text: String) -> Self {
        let bbox = &detection.bbox;
        let text_width = (text.chars().count() as u32 * GLYPH_SIZE) as f32 + 2.0 * TEXT_PAD;
        Self {
            x: bbox.x1,
            y: (bbox.y1 - TAB_HEIGHT).max(0.0),
            width: bbox.width().max(text_width),
            text,
        }
    }
}

/// 在帧上原地绘制检测结果
///
/// `alpha` 为框内填充的透明度(0-255)，描边和标签条始终不透明。
/// 图形由raqote绘制，文字在写回帧之后用8x8点阵字体逐像素写入。
pub fn draw_overlay(image: &mut RgbaImage, detections: &[Detection], flags: OverlayFlags, alpha: u8) {
    if flags.is_none() || detections.is_empty() {
        return;
    }

    let (img_width, img_height) = image.dimensions();
    let mut dt = DrawTarget::new(img_width as i32, img_height as i32);

    // raqote 使用预乘alpha的BGRA
    for (dst, pixel) in dt.get_data_mut().iter_mut().zip(image.pixels()) {
        let [r, g, b, a] = pixel.0;
        let premultiply = |c: u8| ((c as u16 * a as u16 + 127) / 255) as u8;
        *dst = u32::from_le_bytes([premultiply(b), premultiply(g), premultiply(r), a]);
    }

    let mut tabs = Vec::new();
    for detection in detections {
        let bbox = &detection.bbox;
        let (r, g, b) = class_color(detection.class_id);
        let solid = Source::Solid(SolidSource::from_unpremultiplied_argb(0xFF, r, g, b));

        if flags.boxes {
            if alpha > 0 {
                dt.fill_rect(
                    bbox.x1,
                    bbox.y1,
                    bbox.width(),
                    bbox.height(),
                    &Source::Solid(SolidSource::from_unpremultiplied_argb(alpha, r, g, b)),
                    &DrawOptions::new(),
                );
            }

            let mut pb = PathBuilder::new();
            pb.rect(bbox.x1, bbox.y1, bbox.width(), bbox.height());
            let path = pb.finish();
            dt.stroke(
                &path,
                &solid,
                &StrokeStyle {
                    join: LineJoin::Round,
                    width: STROKE_WIDTH,
                    ..StrokeStyle::default()
                },
                &DrawOptions::new(),
            );
        }

        let Some(text) = caption(detection, flags) else {
            continue;
        };
        let tab = Tab::new(detection, text);

        // 只显示置信度时用半透明黑底
        let background = if flags.labels {
            solid
        } else {
            Source::Solid(SolidSource::from_unpremultiplied_argb(0x80, 0, 0, 0))
        };
        dt.fill_rect(tab.x, tab.y, tab.width, TAB_HEIGHT, &background, &DrawOptions::new());
        tabs.push(tab);
    }

    for (pixel, argb) in image.pixels_mut().zip(dt.get_data()) {
        let [b, g, r, a] = argb.to_le_bytes();
        let unpremultiply = |c: u8| match a {
            0 => 0,
            _ => ((c as u16 * 255 + a as u16 / 2) / a as u16).min(255) as u8,
        };
        *pixel = Rgba([unpremultiply(r), unpremultiply(g), unpremultiply(b), a]);
    }

    for tab in &tabs {
        draw_text(
            image,
            (tab.x + TEXT_PAD).round() as i64,
            (tab.y + (TAB_HEIGHT - GLYPH_SIZE as f32) / 2.0).round() as i64,
            &tab.text,
        );
    }
}

/// 用8x8点阵字体写白字，超出图像的部分被裁掉；字库中没有的字符显示为 `?`
fn draw_text(image: &mut RgbaImage, x: i64, y: i64, text: &str) {
    let (width, height) = image.dimensions();
    let step = GLYPH_SIZE as i64;

    for (i, c) in text.chars().enumerate() {
        let glyph = BASIC_FONTS.get(c).or_else(|| BASIC_FONTS.get('?')).unwrap_or_default();
        let left = x + i as i64 * step;
        for (row, bits) in (0..).zip(glyph) {
            for col in 0..step {
                if bits & (1 << col) == 0 {
                    continue;
                }
                let (px, py) = (left + col, y + row);
                if (0..width as i64).contains(&px) && (0..height as i64).contains(&py) {
                    image.put_pixel(px as u32, py as u32, TEXT_COLOR);
                }
            }
        }
    }
}
