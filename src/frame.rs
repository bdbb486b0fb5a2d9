// 该文件是 Shanan （山南西风） 项目的一部分。
// src/frame.rs - 目标尺寸、张量排布与输出缓冲区定义
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

use std::{fmt, str::FromStr};

use ndarray::{Array4, ArrayView4, ShapeError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetSize {
  pub width: u32,
  pub height: u32,
}

impl TargetSize {
  pub const fn new(width: u32, height: u32) -> Self {
    Self { width, height }
  }

  pub const fn square(size: u32) -> Self {
    Self::new(size, size)
  }

  pub fn is_empty(&self) -> bool {
    self.width == 0 || self.height == 0
  }

  pub fn area(&self) -> usize {
    self.width as usize * self.height as usize
  }
}

impl fmt::Display for TargetSize {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}x{}", self.width, self.height)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TensorLayout {
  /// [batch, height, width, channels]
  #[default]
  Nhwc,
  /// [batch, channels, height, width]
  Nchw,
}

impl TensorLayout {
  pub fn shape(&self, batch: usize, size: TargetSize, channels: usize) -> [usize; 4] {
    let (h, w) = (size.height as usize, size.width as usize);
    match self {
      TensorLayout::Nhwc => [batch, h, w, channels],
      TensorLayout::Nchw => [batch, channels, h, w],
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      TensorLayout::Nhwc => "nhwc",
      TensorLayout::Nchw => "nchw",
    }
  }
}

impl FromStr for TensorLayout {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_ascii_lowercase().as_str() {
      "nhwc" => Ok(TensorLayout::Nhwc),
      "nchw" => Ok(TensorLayout::Nchw),
      other => Err(format!("未知的张量排布: {}", other)),
    }
  }
}

/// 预处理结果，携带自身的张量排布
#[derive(Debug, Clone, PartialEq)]
pub enum PixelBuffer {
  /// 原始字节，按 `shape` 展平
  Quantized {
    data: Vec<u8>,
    shape: [usize; 4],
    layout: TensorLayout,
  },
  /// 归一化后的浮点数组
  Normalized {
    array: Array4<f32>,
    layout: TensorLayout,
  },
}

impl PixelBuffer {
  pub fn len(&self) -> usize {
    match self {
      PixelBuffer::Quantized { data, .. } => data.len(),
      PixelBuffer::Normalized { array, .. } => array.len(),
    }
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  pub fn shape(&self) -> [usize; 4] {
    match self {
      PixelBuffer::Quantized { shape, .. } => *shape,
      PixelBuffer::Normalized { array, .. } => {
        let dim = array.dim();
        [dim.0, dim.1, dim.2, dim.3]
      }
    }
  }

  pub fn layout(&self) -> TensorLayout {
    match self {
      PixelBuffer::Quantized { layout, .. } | PixelBuffer::Normalized { layout, .. } => *layout,
    }
  }

  pub fn dtype(&self) -> &'static str {
    match self {
      PixelBuffer::Quantized { .. } => "uint8",
      PixelBuffer::Normalized { .. } => "float32",
    }
  }

  pub fn as_quantized(&self) -> Option<&[u8]> {
    match self {
      PixelBuffer::Quantized { data, .. } => Some(data),
      PixelBuffer::Normalized { .. } => None,
    }
  }

  /// 以四维视图访问字节数据
  pub fn quantized_view(&self) -> Option<Result<ArrayView4<'_, u8>, ShapeError>> {
    match self {
      PixelBuffer::Quantized { data, shape, .. } => Some(ArrayView4::from_shape(*shape, data)),
      PixelBuffer::Normalized { .. } => None,
    }
  }

  pub fn into_quantized(self) -> Option<Vec<u8>> {
    match self {
      PixelBuffer::Quantized { data, .. } => Some(data),
      PixelBuffer::Normalized { .. } => None,
    }
  }

  pub fn into_normalized(self) -> Option<Array4<f32>> {
    match self {
      PixelBuffer::Normalized { array, .. } => Some(array),
      PixelBuffer::Quantized { .. } => None,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn layout_shapes() {
    let size = TargetSize::new(4, 2);
    assert_eq!(TensorLayout::Nhwc.shape(1, size, 3), [1, 2, 4, 3]);
    assert_eq!(TensorLayout::Nchw.shape(2, size, 3), [2, 3, 2, 4]);
  }

  #[test]
  fn layout_parse() {
    assert_eq!("NCHW".parse::<TensorLayout>(), Ok(TensorLayout::Nchw));
    assert_eq!("nhwc".parse::<TensorLayout>(), Ok(TensorLayout::Nhwc));
    assert!("hwc".parse::<TensorLayout>().is_err());
  }

  #[test]
  fn quantized_view_follows_shape() {
    let buffer = PixelBuffer::Quantized {
      data: (0..12).collect(),
      shape: [1, 2, 2, 3],
      layout: TensorLayout::Nhwc,
    };
    let view = buffer.quantized_view().unwrap().unwrap();
    assert_eq!(view[[0, 1, 0, 2]], 8);
    assert_eq!(buffer.len(), 12);
    assert_eq!(buffer.dtype(), "uint8");
    assert_eq!(buffer.layout(), TensorLayout::Nhwc);
  }

  #[test]
  fn target_size_display() {
    assert_eq!(TargetSize::square(224).to_string(), "224x224");
    assert!(TargetSize::new(0, 10).is_empty());
  }
}
