// 该文件是 Shanan （山南西风） 项目的一部分。
// src/preprocess.rs - 像素缓冲区提取
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

use image::imageops::FilterType;
use ndarray::{Array4, ShapeError};
use thiserror::Error;
use tracing::debug;

use crate::{
  bitmap::Bitmap,
  frame::{PixelBuffer, TargetSize, TensorLayout},
  normalize::Normalization,
};

pub const DEFAULT_INPUT_SIZE: TargetSize = TargetSize::square(224);
pub const DEFAULT_CHANNELS: usize = 3;
pub const DEFAULT_BATCH_SIZE: usize = 1;
pub const DEFAULT_FILTER: FilterType = FilterType::Triangle;

pub trait Preprocess {
  type Input;
  type Output;
  type Error;

  fn preprocess(&self, input: &Self::Input) -> Result<Self::Output, Self::Error>;
}

#[derive(Error, Debug)]
pub enum PreprocessError {
  #[error("源图像为空: {width}x{height}")]
  EmptyImage { width: u32, height: u32 },
  #[error("通道数不能为零")]
  ZeroChannels,
  #[error("请求通道数 {requested} 超过源图像通道数 {available}")]
  ChannelsExceeded { requested: usize, available: usize },
  #[error("目标尺寸无效: {0}")]
  InvalidTargetSize(TargetSize),
  #[error("批大小不能为零")]
  InvalidBatchSize,
  #[error("无法转换源图像")]
  ImageConversion,
  #[error("张量形状错误: {0}")]
  Shape(#[from] ShapeError),
}

/// 将位图转换为模型输入
///
/// 流程：缩放到目标尺寸，丢弃 alpha 与多余的颜色通道，按张量排布写入，
/// 重复 `batch_size` 次；未量化时再按 [`Normalization`] 映射为浮点数。
#[derive(Debug, Clone)]
pub struct Preprocessor {
  size: TargetSize,
  channels: usize,
  batch_size: usize,
  quantized: bool,
  layout: TensorLayout,
  filter: FilterType,
  normalization: Normalization,
}

impl Default for Preprocessor {
  fn default() -> Self {
    Self::new(DEFAULT_INPUT_SIZE, DEFAULT_CHANNELS, DEFAULT_BATCH_SIZE, false)
  }
}

impl Preprocessor {
  pub fn new(size: TargetSize, channels: usize, batch_size: usize, quantized: bool) -> Self {
    Self {
      size,
      channels,
      batch_size,
      quantized,
      layout: TensorLayout::default(),
      filter: DEFAULT_FILTER,
      normalization: Normalization::default(),
    }
  }

  pub fn size(&self) -> TargetSize {
    self.size
  }

  pub fn channels(&self) -> usize {
    self.channels
  }

  pub fn batch_size(&self) -> usize {
    self.batch_size
  }

  pub fn quantized(&self) -> bool {
    self.quantized
  }

  pub fn layout(&self) -> TensorLayout {
    self.layout
  }

  pub fn filter(&self) -> FilterType {
    self.filter
  }

  pub fn normalization(&self) -> Normalization {
    self.normalization
  }

  /// 输出缓冲区的元素个数
  pub fn output_len(&self) -> usize {
    self.size.area() * self.channels * self.batch_size
  }

  /// 前置条件不满足时返回 `None`
  pub fn extract(&self, bitmap: &Bitmap) -> Option<PixelBuffer> {
    match self.try_extract(bitmap) {
      Ok(buffer) => Some(buffer),
      Err(e) => {
        debug!("像素提取被拒绝: {}", e);
        None
      }
    }
  }

  pub fn try_extract(&self, bitmap: &Bitmap) -> Result<PixelBuffer, PreprocessError> {
    self.check(bitmap)?;

    let image = bitmap
      .to_dynamic()
      .ok_or(PreprocessError::ImageConversion)?;
    let resized = if image.width() == self.size.width && image.height() == self.size.height {
      image
    } else {
      image.resize_exact(self.size.width, self.size.height, self.filter)
    };
    debug!(
      "缩放 {}x{} -> {}, 排布 {:?}",
      bitmap.width(),
      bitmap.height(),
      self.size,
      self.layout
    );

    // BGRA/ARGB 已被重排为 RGBA，每像素字节数不变
    let plane = self.pack(resized.as_bytes(), bitmap.channels());
    let shape = self.layout.shape(self.batch_size, self.size, self.channels);

    if self.quantized {
      Ok(PixelBuffer::Quantized {
        data: plane.repeat(self.batch_size),
        shape,
        layout: self.layout,
      })
    } else {
      let plane: Vec<f32> = plane
        .iter()
        .map(|&v| self.normalization.apply(v))
        .collect();
      let array = Array4::from_shape_vec(shape, plane.repeat(self.batch_size))?;
      Ok(PixelBuffer::Normalized {
        array,
        layout: self.layout,
      })
    }
  }

  fn check(&self, bitmap: &Bitmap) -> Result<(), PreprocessError> {
    if bitmap.width() == 0 || bitmap.height() == 0 {
      return Err(PreprocessError::EmptyImage {
        width: bitmap.width(),
        height: bitmap.height(),
      });
    }
    if self.channels == 0 {
      return Err(PreprocessError::ZeroChannels);
    }
    if self.channels > bitmap.color_channels() {
      return Err(PreprocessError::ChannelsExceeded {
        requested: self.channels,
        available: bitmap.color_channels(),
      });
    }
    if self.size.is_empty() {
      return Err(PreprocessError::InvalidTargetSize(self.size));
    }
    if self.batch_size == 0 {
      return Err(PreprocessError::InvalidBatchSize);
    }
    Ok(())
  }

  // 颜色通道总在 alpha 之前，取前 `channels` 个字节即可丢弃 alpha
  fn pack(&self, raw: &[u8], stride: usize) -> Vec<u8> {
    let channels = self.channels;
    let area = self.size.area();

    match self.layout {
      TensorLayout::Nhwc => {
        let mut out = Vec::with_capacity(area * channels);
        for px in raw.chunks_exact(stride) {
          out.extend_from_slice(&px[..channels]);
        }
        out
      }
      TensorLayout::Nchw => {
        let mut out = vec![0u8; area * channels];
        for (i, px) in raw.chunks_exact(stride).enumerate() {
          for c in 0..channels {
            out[c * area + i] = px[c];
          }
        }
        out
      }
    }
  }
}

impl Preprocess for Preprocessor {
  type Input = Bitmap;
  type Output = PixelBuffer;
  type Error = PreprocessError;

  fn preprocess(&self, input: &Self::Input) -> Result<Self::Output, Self::Error> {
    self.try_extract(input)
  }
}

/// 量化输出：按 NHWC 展平的字节
pub fn to_quantized_bytes(
  bitmap: &Bitmap,
  size: TargetSize,
  channels: usize,
  batch_size: usize,
) -> Option<Vec<u8>> {
  Preprocessor::new(size, channels, batch_size, true)
    .extract(bitmap)
    .and_then(PixelBuffer::into_quantized)
}

/// 非量化输出：映射到 [-1, 1] 的 NHWC 浮点数组
pub fn to_normalized_array(
  bitmap: &Bitmap,
  size: TargetSize,
  channels: usize,
  batch_size: usize,
) -> Option<Array4<f32>> {
  Preprocessor::new(size, channels, batch_size, false)
    .extract(bitmap)
    .and_then(PixelBuffer::into_normalized)
}

mod builder;
pub use self::builder::{PreprocessorBuilder, PreprocessorBuilderError};
