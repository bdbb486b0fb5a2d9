// 该文件是 Shanan （山南西风） 项目的一部分。
// src/output/save_json_file.rs - 保存 JSON 张量文件
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

use std::{
  fs::File,
  io::{BufWriter, Write},
};

use ndarray::{ArrayView4, Axis, ShapeError};
use serde_json::{Value, json};
use thiserror::Error;
use tracing::info;
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  frame::PixelBuffer,
  output::{Sink, ensure_parent},
};

pub struct SaveJsonFileOutput {
  path: String,
}

#[derive(Error, Debug)]
pub enum SaveJsonFileError {
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("JSON 错误: {0}")]
  JsonError(#[from] serde_json::Error),
  #[error("张量形状错误: {0}")]
  ShapeError(#[from] ShapeError),
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
}

impl FromUrlWithScheme for SaveJsonFileOutput {
  const SCHEME: &'static str = "json";
}

impl FromUrl for SaveJsonFileOutput {
  type Error = SaveJsonFileError;

  fn from_url(uri: &Url) -> Result<Self, Self::Error> {
    if uri.scheme() != Self::SCHEME {
      return Err(SaveJsonFileError::SchemeMismatch(format!(
        "期望保存方式 '{}', 实际保存方式 '{}'",
        Self::SCHEME,
        uri.scheme()
      )));
    }

    Ok(SaveJsonFileOutput {
      path: uri.path().to_string(),
    })
  }
}

impl SaveJsonFileOutput {
  pub fn path(&self) -> &str {
    &self.path
  }
}

fn nested<T: Copy + Into<Value>>(view: ArrayView4<'_, T>) -> Value {
  Value::Array(
    view
      .axis_iter(Axis(0))
      .map(|b| {
        Value::Array(
          b.axis_iter(Axis(0))
            .map(|r| {
              Value::Array(
                r.axis_iter(Axis(0))
                  .map(|px| Value::Array(px.iter().map(|&v| v.into()).collect()))
                  .collect(),
              )
            })
            .collect(),
        )
      })
      .collect(),
  )
}

impl Sink<PixelBuffer> for SaveJsonFileOutput {
  type Error = SaveJsonFileError;

  fn write_result(&self, result: &PixelBuffer) -> Result<(), Self::Error> {
    let data = match result {
      PixelBuffer::Quantized { data, shape, .. } => nested(ArrayView4::from_shape(*shape, data)?),
      PixelBuffer::Normalized { array, .. } => nested(array.view()),
    };
    let document = json!({
      "dtype": result.dtype(),
      "layout": result.layout().as_str(),
      "shape": result.shape(),
      "data": data,
    });

    ensure_parent(&self.path)?;
    let mut writer = BufWriter::new(File::create(&self.path)?);
    serde_json::to_writer(&mut writer, &document)?;
    writer.flush()?;

    info!("保存 {} 张量到文件: {}", result.dtype(), self.path);

    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    bitmap::{Bitmap, PixelLayout},
    frame::{TargetSize, TensorLayout},
    preprocess::PreprocessorBuilder,
  };

  fn output(name: &str) -> SaveJsonFileOutput {
    let path = std::env::temp_dir().join("shanan_prep_json").join(name);
    SaveJsonFileOutput::from_url(&Url::parse(&format!("json://{}", path.display())).unwrap()).unwrap()
  }

  fn read(out: &SaveJsonFileOutput) -> Value {
    let text = std::fs::read_to_string(out.path()).unwrap();
    serde_json::from_str(&text).unwrap()
  }

  #[test]
  fn writes_nested_array() {
    let out = output("quantized.json");
    let buffer = PixelBuffer::Quantized {
      data: (0..12).collect(),
      shape: [2, 1, 2, 3],
      layout: TensorLayout::Nhwc,
    };
    out.write_result(&buffer).unwrap();

    let value = read(&out);
    assert_eq!(value["dtype"], "uint8");
    assert_eq!(value["layout"], "nhwc");
    assert_eq!(value["shape"], json!([2, 1, 2, 3]));
    assert_eq!(value["data"][1][0][1], json!([9, 10, 11]));
  }

  #[test]
  fn layout_label_follows_buffer() {
    let bitmap = Bitmap::new(2, 1, PixelLayout::Rgb8, vec![1, 2, 3, 4, 5, 6]).unwrap();
    let pre = PreprocessorBuilder::default()
      .size(TargetSize::new(2, 1))
      .quantized(true)
      .layout(TensorLayout::Nchw)
      .build()
      .unwrap();
    let buffer = pre.try_extract(&bitmap).unwrap();

    let out = output("planar.json");
    out.write_result(&buffer).unwrap();

    let value = read(&out);
    assert_eq!(value["layout"], "nchw");
    assert_eq!(value["shape"], json!([1, 3, 1, 2]));
    assert_eq!(value["data"][0][0], json!([[1, 4]]));
  }

  #[test]
  fn float_values_survive() {
    let array = ndarray::Array4::from_shape_vec((1, 1, 1, 2), vec![-1.0f32, 1.0]).unwrap();
    let value = nested(array.view());
    assert_eq!(value, json!([[[[-1.0, 1.0]]]]));
  }
}
