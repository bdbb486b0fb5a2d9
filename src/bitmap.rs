// 该文件是 Shanan （山南西风） 项目的一部分。
// src/bitmap.rs - 源位图定义
//
// 本文件根据 Apache 许可证第 2.0 版（以下简称“许可证”）授权使用；
// 除非遵守该许可证条款，否则您不得使用本文件。
// 您可通过以下网址获取许可证副本：
// http://www.apache.org/licenses/LICENSE-2.0
// 除非适用法律要求或书面同意，根据本许可协议分发的软件均按“原样”提供，
// 不附带任何形式的明示或暗示的保证或条件。
// 有关许可权限与限制的具体条款，请参阅本许可协议。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, Wareless Group

use image::{DynamicImage, GrayAlphaImage, GrayImage, RgbImage, RgbaImage};
use thiserror::Error;

/// 像素字节排布
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelLayout {
  Luma8,
  LumaA8,
  Rgb8,
  Rgba8,
  Bgra8,
  /// 按 A, R, G, B 顺序排列（大端 ARGB 整数展开）
  Argb8,
}

impl PixelLayout {
  /// 每个像素的字节数（含 alpha）
  pub fn channels(&self) -> usize {
    match self {
      PixelLayout::Luma8 => 1,
      PixelLayout::LumaA8 => 2,
      PixelLayout::Rgb8 => 3,
      PixelLayout::Rgba8 | PixelLayout::Bgra8 | PixelLayout::Argb8 => 4,
    }
  }

  /// 去掉 alpha 后的颜色通道数
  pub fn color_channels(&self) -> usize {
    match self {
      PixelLayout::Luma8 | PixelLayout::LumaA8 => 1,
      _ => 3,
    }
  }

  pub fn has_alpha(&self) -> bool {
    self.channels() != self.color_channels()
  }
}

#[derive(Error, Debug)]
pub enum BitmapError {
  #[error("数据长度不匹配: 期望长度 {expected}, 实际长度 {actual}")]
  LengthMismatch { expected: usize, actual: usize },
}

/// 源位图
///
/// 仅持有宽高、像素排布与原始字节，不做任何颜色空间假设。
#[derive(Debug, Clone)]
pub struct Bitmap {
  width: u32,
  height: u32,
  layout: PixelLayout,
  data: Box<[u8]>,
}

impl Bitmap {
  pub fn new(
    width: u32,
    height: u32,
    layout: PixelLayout,
    data: Vec<u8>,
  ) -> Result<Self, BitmapError> {
    let expected = width as usize * height as usize * layout.channels();
    if data.len() != expected {
      return Err(BitmapError::LengthMismatch {
        expected,
        actual: data.len(),
      });
    }

    Ok(Self {
      width,
      height,
      layout,
      data: data.into_boxed_slice(),
    })
  }

  pub fn width(&self) -> u32 {
    self.width
  }

  pub fn height(&self) -> u32 {
    self.height
  }

  pub fn layout(&self) -> PixelLayout {
    self.layout
  }

  pub fn channels(&self) -> usize {
    self.layout.channels()
  }

  pub fn color_channels(&self) -> usize {
    self.layout.color_channels()
  }

  pub fn as_bytes(&self) -> &[u8] {
    &self.data
  }

  /// 转换为 `image` 库的图像，颜色通道在前、alpha 在后
  ///
  /// BGRA 与 ARGB 会被重排为 RGBA。缓冲区大小在构造时已校验，
  /// 因此这里的 `from_raw` 只在宽或高为零时才可能失败。
  pub(crate) fn to_dynamic(&self) -> Option<DynamicImage> {
    let (w, h) = (self.width, self.height);
    let image = match self.layout {
      PixelLayout::Luma8 => DynamicImage::ImageLuma8(GrayImage::from_raw(w, h, self.data.to_vec())?),
      PixelLayout::LumaA8 => {
        DynamicImage::ImageLumaA8(GrayAlphaImage::from_raw(w, h, self.data.to_vec())?)
      }
      PixelLayout::Rgb8 => DynamicImage::ImageRgb8(RgbImage::from_raw(w, h, self.data.to_vec())?),
      PixelLayout::Rgba8 => DynamicImage::ImageRgba8(RgbaImage::from_raw(w, h, self.data.to_vec())?),
      PixelLayout::Bgra8 => {
        let data = reorder_to_rgba(&self.data, [2, 1, 0, 3]);
        DynamicImage::ImageRgba8(RgbaImage::from_raw(w, h, data)?)
      }
      PixelLayout::Argb8 => {
        let data = reorder_to_rgba(&self.data, [1, 2, 3, 0]);
        DynamicImage::ImageRgba8(RgbaImage::from_raw(w, h, data)?)
      }
    };
    Some(image)
  }
}

// order[i] 为输出第 i 个通道（R, G, B, A）在源像素中的下标
fn reorder_to_rgba(data: &[u8], order: [usize; 4]) -> Vec<u8> {
  let mut out = Vec::with_capacity(data.len());
  for px in data.chunks_exact(4) {
    out.extend(order.iter().map(|&i| px[i]));
  }
  out
}

impl From<DynamicImage> for Bitmap {
  fn from(image: DynamicImage) -> Self {
    let (width, height) = (image.width(), image.height());
    let (layout, data) = match image {
      DynamicImage::ImageLuma8(img) => (PixelLayout::Luma8, img.into_raw()),
      DynamicImage::ImageLumaA8(img) => (PixelLayout::LumaA8, img.into_raw()),
      DynamicImage::ImageRgb8(img) => (PixelLayout::Rgb8, img.into_raw()),
      DynamicImage::ImageRgba8(img) => (PixelLayout::Rgba8, img.into_raw()),
      // 高位深图像统一收窄到 8 位
      other if other.color().has_color() => {
        if other.color().has_alpha() {
          (PixelLayout::Rgba8, other.to_rgba8().into_raw())
        } else {
          (PixelLayout::Rgb8, other.to_rgb8().into_raw())
        }
      }
      other => {
        if other.color().has_alpha() {
          (PixelLayout::LumaA8, other.to_luma_alpha8().into_raw())
        } else {
          (PixelLayout::Luma8, other.to_luma8().into_raw())
        }
      }
    };

    Self {
      width,
      height,
      layout,
      data: data.into_boxed_slice(),
    }
  }
}

impl From<RgbImage> for Bitmap {
  fn from(image: RgbImage) -> Self {
    Bitmap::from(DynamicImage::ImageRgb8(image))
  }
}

impl From<RgbaImage> for Bitmap {
  fn from(image: RgbaImage) -> Self {
    Bitmap::from(DynamicImage::ImageRgba8(image))
  }
}
