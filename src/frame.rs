use image::RgbaImage;

/// 单帧图像
///
/// 由采集源按值交出，在一次循环内被检测器（绘制叠加层）和显示端依次借用，
/// 循环结束即被释放。
#[derive(Debug, Clone)]
pub struct Frame {
    /// 帧序号，从0开始递增
    pub index: u64,
    /// RGBA8像素数据
    pub image: RgbaImage,
}

impl Frame {
    pub fn new(index: u64, image: RgbaImage) -> Self {
        Self { index, image }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }
}
