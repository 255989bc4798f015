use image::{RgbaImage, imageops::{self, FilterType}};
use ndarray::{Array, Array4};

/// 调整图像大小以适应模型输入
///
/// 使用CatmullRom插值算法将图像调整为指定尺寸，不保持宽高比。
pub fn resize_image(img: &RgbaImage, width: u32, height: u32) -> RgbaImage {
    if img.dimensions() == (width, height) {
        return img.clone();
    }
    imageops::resize(img, width, height, FilterType::CatmullRom)
}

/// 将图像转换为模型输入张量
///
/// 返回形状为(1, 3, height, width)的NCHW张量，通道顺序为RGB，像素值范围[0, 1]。
/// 图像尺寸必须与输入尺寸一致。
pub fn image_to_tensor(img: &RgbaImage, input_height: usize, input_width: usize) -> Array4<f32> {
    let mut tensor = Array::zeros((1, 3, input_height, input_width));

    for (x, y, pixel) in img.enumerate_pixels() {
        let (x, y) = (x as usize, y as usize);
        if x >= input_width || y >= input_height {
            continue;
        }
        let [r, g, b, _] = pixel.0;
        tensor[[0, 0, y, x]] = (r as f32) / 255.0;
        tensor[[0, 1, y, x]] = (g as f32) / 255.0;
        tensor[[0, 2, y, x]] = (b as f32) / 255.0;
    }

    tensor
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn tensor_is_nchw_and_normalised() {
        let mut img = RgbaImage::from_pixel(4, 2, Rgba([0, 0, 0, 255]));
        img.put_pixel(3, 1, Rgba([255, 51, 0, 255]));

        let tensor = image_to_tensor(&img, 2, 4);

        assert_eq!(tensor.shape(), &[1, 3, 2, 4]);
        assert_eq!(tensor[[0, 0, 1, 3]], 1.0);
        assert!((tensor[[0, 1, 1, 3]] - 0.2).abs() < 1e-6);
        assert_eq!(tensor[[0, 2, 1, 3]], 0.0);
        assert_eq!(tensor[[0, 0, 0, 0]], 0.0);
    }

    #[test]
    fn resize_to_model_input() {
        let img = RgbaImage::new(1280, 720);
        assert_eq!(resize_image(&img, 640, 640).dimensions(), (640, 640));
    }
}
