// 该文件是 Shanan （山南西风） 项目的一部分。
// src/preprocess/builder.rs - 预处理器构建
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

use std::str::FromStr;

use image::imageops::FilterType;
use thiserror::Error;
use tracing::{info, warn};
use url::Url;

use super::{DEFAULT_BATCH_SIZE, DEFAULT_CHANNELS, DEFAULT_FILTER, DEFAULT_INPUT_SIZE, Preprocessor};
use crate::{
  FromUrl, FromUrlWithScheme,
  frame::{TargetSize, TensorLayout},
  normalize::Normalization,
};

#[derive(Error, Debug)]
pub enum PreprocessorBuilderError {
  #[error("URI 方案不匹配: 期望 '{expected}', 实际 '{actual}'")]
  SchemeMismatch { expected: String, actual: String },
  #[error("参数 '{key}' 的值无效: {value}")]
  InvalidParam { key: String, value: String },
  #[error("归一化参数无效: mean={mean}, std={std}")]
  InvalidNormalization { mean: f32, std: f32 },
}

impl PreprocessorBuilderError {
  fn invalid(key: &str, value: &str) -> Self {
    PreprocessorBuilderError::InvalidParam {
      key: key.to_string(),
      value: value.to_string(),
    }
  }
}

#[derive(Debug, Clone)]
pub struct PreprocessorBuilder {
  size: TargetSize,
  channels: usize,
  batch_size: usize,
  quantized: bool,
  layout: TensorLayout,
  filter: FilterType,
  normalization: Normalization,
}

impl Default for PreprocessorBuilder {
  fn default() -> Self {
    Self {
      size: DEFAULT_INPUT_SIZE,
      channels: DEFAULT_CHANNELS,
      batch_size: DEFAULT_BATCH_SIZE,
      quantized: false,
      layout: TensorLayout::default(),
      filter: DEFAULT_FILTER,
      normalization: Normalization::default(),
    }
  }
}

impl FromUrlWithScheme for PreprocessorBuilder {
  const SCHEME: &'static str = "preprocess";
}

impl FromUrl for PreprocessorBuilder {
  type Error = PreprocessorBuilderError;

  /// 形如 `preprocess:?width=224&height=224&channels=3&batch=1&quantized=true`
  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(PreprocessorBuilderError::SchemeMismatch {
        expected: Self::SCHEME.to_string(),
        actual: url.scheme().to_string(),
      });
    }

    let mut builder = Self::default();
    for (key, value) in url.query_pairs() {
      match &*key {
        "size" => builder.size = TargetSize::square(parse(&key, &value)?),
        "width" => builder.size.width = parse(&key, &value)?,
        "height" => builder.size.height = parse(&key, &value)?,
        "channels" => builder.channels = parse(&key, &value)?,
        "batch" => builder.batch_size = parse(&key, &value)?,
        "quantized" => builder.quantized = parse(&key, &value)?,
        "layout" => {
          builder.layout = TensorLayout::from_str(&value)
            .map_err(|_| PreprocessorBuilderError::invalid(&key, &value))?
        }
        "filter" => {
          builder.filter =
            parse_filter(&value).ok_or_else(|| PreprocessorBuilderError::invalid(&key, &value))?
        }
        "mean" => builder.normalization.mean = parse(&key, &value)?,
        "std" => builder.normalization.std = parse(&key, &value)?,
        other => warn!("忽略未知的预处理参数: {}={}", other, value),
      }
    }

    Ok(builder)
  }
}

fn parse<T: FromStr>(key: &str, value: &str) -> Result<T, PreprocessorBuilderError> {
  value
    .parse()
    .map_err(|_| PreprocessorBuilderError::invalid(key, value))
}

pub fn parse_filter(name: &str) -> Option<FilterType> {
  match name.to_ascii_lowercase().as_str() {
    "nearest" => Some(FilterType::Nearest),
    "triangle" | "bilinear" => Some(FilterType::Triangle),
    "catmullrom" | "bicubic" => Some(FilterType::CatmullRom),
    "gaussian" => Some(FilterType::Gaussian),
    "lanczos3" => Some(FilterType::Lanczos3),
    _ => None,
  }
}

impl PreprocessorBuilder {
  pub fn size(mut self, size: TargetSize) -> Self {
    self.size = size;
    self
  }

  pub fn channels(mut self, channels: usize) -> Self {
    self.channels = channels;
    self
  }

  pub fn batch_size(mut self, batch_size: usize) -> Self {
    self.batch_size = batch_size;
    self
  }

  pub fn quantized(mut self, quantized: bool) -> Self {
    self.quantized = quantized;
    self
  }

  pub fn layout(mut self, layout: TensorLayout) -> Self {
    self.layout = layout;
    self
  }

  pub fn filter(mut self, filter: FilterType) -> Self {
    self.filter = filter;
    self
  }

  pub fn normalization(mut self, normalization: Normalization) -> Self {
    self.normalization = normalization;
    self
  }

  pub fn build(self) -> Result<Preprocessor, PreprocessorBuilderError> {
    if !self.normalization.is_valid() {
      return Err(PreprocessorBuilderError::InvalidNormalization {
        mean: self.normalization.mean,
        std: self.normalization.std,
      });
    }

    if self.quantized {
      info!(
        "预处理器: {} x{} 通道, 批大小 {}, {}, 量化",
        self.size,
        self.channels,
        self.batch_size,
        self.layout.as_str()
      );
    } else {
      let (min, max) = self.normalization.range();
      info!(
        "预处理器: {} x{} 通道, 批大小 {}, {}, 归一化到 [{}, {}]",
        self.size,
        self.channels,
        self.batch_size,
        self.layout.as_str(),
        min,
        max
      );
    }

    Ok(Preprocessor {
      size: self.size,
      channels: self.channels,
      batch_size: self.batch_size,
      quantized: self.quantized,
      layout: self.layout,
      filter: self.filter,
      normalization: self.normalization,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn url(s: &str) -> Url {
    Url::parse(s).unwrap()
  }

  #[test]
  fn parses_query() {
    let pre = PreprocessorBuilder::from_url(&url(
      "preprocess:?width=32&height=16&channels=1&batch=4&quantized=true&layout=nchw&filter=nearest",
    ))
    .unwrap()
    .build()
    .unwrap();

    assert_eq!(pre.size(), TargetSize::new(32, 16));
    assert_eq!(pre.channels(), 1);
    assert_eq!(pre.batch_size(), 4);
    assert!(pre.quantized());
    assert_eq!(pre.layout(), TensorLayout::Nchw);
    assert_eq!(pre.filter(), FilterType::Nearest);
    assert_eq!(pre.output_len(), 32 * 16 * 4);
  }

  #[test]
  fn defaults_without_query() {
    let pre = PreprocessorBuilder::from_url(&url("preprocess:"))
      .unwrap()
      .build()
      .unwrap();
    assert_eq!(pre.size(), DEFAULT_INPUT_SIZE);
    assert_eq!(pre.channels(), DEFAULT_CHANNELS);
    assert!(!pre.quantized());
    assert_eq!(pre.normalization(), Normalization::SYMMETRIC);
  }

  #[test]
  fn rejects_other_scheme() {
    let err = PreprocessorBuilder::from_url(&url("image:///tmp/a.png")).unwrap_err();
    assert!(matches!(err, PreprocessorBuilderError::SchemeMismatch { .. }));
  }

  #[test]
  fn rejects_malformed_values() {
    for q in ["width=abc", "quantized=maybe", "layout=hwc", "filter=box", "batch=-1"] {
      let res = PreprocessorBuilder::from_url(&url(&format!("preprocess:?{}", q)));
      assert!(
        matches!(res, Err(PreprocessorBuilderError::InvalidParam { .. })),
        "{}",
        q
      );
    }
  }

  #[test]
  fn custom_normalization_and_validation() {
    let pre = PreprocessorBuilder::from_url(&url("preprocess:?mean=0&std=255&unknown=1"))
      .unwrap()
      .build()
      .unwrap();
    assert_eq!(pre.normalization(), Normalization::UNIT);

    let err = PreprocessorBuilder::default()
      .normalization(Normalization::new(0.0, 0.0))
      .build()
      .unwrap_err();
    assert!(matches!(
      err,
      PreprocessorBuilderError::InvalidNormalization { .. }
    ));
  }

  #[test]
  fn filter_aliases() {
    assert_eq!(parse_filter("Bilinear"), Some(FilterType::Triangle));
    assert_eq!(parse_filter("bicubic"), Some(FilterType::CatmullRom));
    assert_eq!(parse_filter("lanczos3"), Some(FilterType::Lanczos3));
  }
}
