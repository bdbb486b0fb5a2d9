// 该文件是 Shanan （山南西风） 项目的一部分。
// src/normalize.rs - 像素值归一化
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

pub const IMAGE_MEAN: f32 = 127.5;
pub const IMAGE_STD: f32 = 127.5;

/// 按 `(value - mean) / std` 映射字节
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Normalization {
  pub mean: f32,
  pub std: f32,
}

impl Normalization {
  /// [0, 255] -> [-1, 1]
  pub const SYMMETRIC: Self = Self::new(IMAGE_MEAN, IMAGE_STD);
  /// [0, 255] -> [0, 1]
  pub const UNIT: Self = Self::new(0.0, 255.0);

  pub const fn new(mean: f32, std: f32) -> Self {
    Self { mean, std }
  }

  #[inline]
  pub fn apply(&self, value: u8) -> f32 {
    (value as f32 - self.mean) / self.std
  }

  /// 映射后的取值范围 (min, max)
  pub fn range(&self) -> (f32, f32) {
    let (a, b) = (self.apply(u8::MIN), self.apply(u8::MAX));
    if a <= b { (a, b) } else { (b, a) }
  }

  pub fn is_valid(&self) -> bool {
    self.mean.is_finite() && self.std.is_finite() && self.std != 0.0
  }
}

impl Default for Normalization {
  fn default() -> Self {
    Self::SYMMETRIC
  }
}
