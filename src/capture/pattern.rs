use std::str::FromStr;

use image::{Rgba, RgbaImage};

use crate::error::CaptureError;

const CHECKER_SIZE: u32 = 16;

// 75% 彩条
const SMPTE_BARS: [[u8; 4]; 7] = [
    [191, 191, 191, 255],
    [191, 191, 0, 255],
    [0, 191, 191, 255],
    [0, 191, 0, 255],
    [191, 0, 191, 255],
    [191, 0, 0, 255],
    [0, 0, 191, 255],
];

/// videotestsrc 的测试图案
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TestPattern {
    #[default]
    Smpte,
    Checkers,
    Ball,
    Black,
    White,
}

impl FromStr for TestPattern {
    type Err = CaptureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "smpte" | "0" => Ok(Self::Smpte),
            "checkers" | "checkers-16" => Ok(Self::Checkers),
            "ball" => Ok(Self::Ball),
            "black" | "2" => Ok(Self::Black),
            "white" | "3" => Ok(Self::White),
            other => Err(CaptureError::Pipeline(format!("unknown videotestsrc pattern '{other}'"))),
        }
    }
}

impl TestPattern {
    /// 生成第 `index` 帧图案
    pub fn render(&self, width: u32, height: u32, index: u64) -> RgbaImage {
        match self {
            Self::Smpte => RgbaImage::from_fn(width, height, |x, _| {
                let bar = (x as usize * SMPTE_BARS.len()) / width.max(1) as usize;
                Rgba(SMPTE_BARS[bar.min(SMPTE_BARS.len() - 1)])
            }),
            Self::Checkers => RgbaImage::from_fn(width, height, |x, y| {
                if ((x / CHECKER_SIZE) + (y / CHECKER_SIZE)) % 2 == 0 {
                    Rgba([32, 32, 32, 255])
                } else {
                    Rgba([224, 224, 224, 255])
                }
            }),
            Self::Ball => {
                let radius = (width.min(height) as f32 / 10.0).max(1.0);
                let travel = (width as f32 - 2.0 * radius).max(1.0);
                let step = (index as f32 * 8.0) % (2.0 * travel);
                // 左右往返
                let offset = if step > travel { 2.0 * travel - step } else { step };
                let cx = radius + offset;
                let cy = height as f32 / 2.0 + (index as f32 / 10.0).sin() * height as f32 / 4.0;
                RgbaImage::from_fn(width, height, |x, y| {
                    let (dx, dy) = (x as f32 + 0.5 - cx, y as f32 + 0.5 - cy);
                    if dx * dx + dy * dy <= radius * radius {
                        Rgba([255, 255, 255, 255])
                    } else {
                        Rgba([0, 0, 0, 255])
                    }
                })
            }
            Self::Black => RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 255])),
            Self::White => RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255])),
        }
    }
}
