// 该文件是 Shanan （山南西风） 项目的一部分。
// src/output/save_raw_file.rs - 保存原始张量文件
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

use thiserror::Error;
use tracing::info;
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  frame::PixelBuffer,
  output::{Sink, ensure_parent},
};

/// 量化结果按字节写出，归一化结果按小端 f32 写出
pub struct SaveRawFileOutput {
  path: String,
}

#[derive(Error, Debug)]
pub enum SaveRawFileError {
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
}

impl FromUrlWithScheme for SaveRawFileOutput {
  const SCHEME: &'static str = "raw";
}

impl FromUrl for SaveRawFileOutput {
  type Error = SaveRawFileError;

  fn from_url(uri: &Url) -> Result<Self, Self::Error> {
    if uri.scheme() != Self::SCHEME {
      return Err(SaveRawFileError::SchemeMismatch(format!(
        "期望保存方式 '{}', 实际保存方式 '{}'",
        Self::SCHEME,
        uri.scheme()
      )));
    }

    Ok(SaveRawFileOutput {
      path: uri.path().to_string(),
    })
  }
}

impl SaveRawFileOutput {
  pub fn path(&self) -> &str {
    &self.path
  }
}

impl Sink<PixelBuffer> for SaveRawFileOutput {
  type Error = SaveRawFileError;

  fn write_result(&self, result: &PixelBuffer) -> Result<(), Self::Error> {
    ensure_parent(&self.path)?;

    let mut writer = BufWriter::new(File::create(&self.path)?);
    match result {
      PixelBuffer::Quantized { data, .. } => writer.write_all(data)?,
      PixelBuffer::Normalized { array, .. } => {
        for v in array.iter() {
          writer.write_all(&v.to_le_bytes())?;
        }
      }
    }
    writer.flush()?;

    info!(
      "保存 {} 张量 {:?} 到文件: {}",
      result.dtype(),
      result.shape(),
      self.path
    );

    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::frame::TensorLayout;
  use ndarray::Array4;

  fn output(name: &str) -> SaveRawFileOutput {
    let path = std::env::temp_dir().join("shanan_prep_raw").join(name);
    SaveRawFileOutput::from_url(&Url::parse(&format!("raw://{}", path.display())).unwrap()).unwrap()
  }

  #[test]
  fn writes_bytes() {
    let out = output("quantized.bin");
    let buffer = PixelBuffer::Quantized {
      data: vec![1, 2, 3, 4, 5, 6],
      shape: [1, 1, 2, 3],
      layout: TensorLayout::Nhwc,
    };
    out.write_result(&buffer).unwrap();
    assert_eq!(std::fs::read(out.path()).unwrap(), vec![1, 2, 3, 4, 5, 6]);
  }

  #[test]
  fn writes_little_endian_floats() {
    let out = output("normalized.bin");
    let array = Array4::from_shape_vec((1, 1, 1, 2), vec![-1.0f32, 0.5]).unwrap();
    let buffer = PixelBuffer::Normalized {
      array,
      layout: TensorLayout::Nhwc,
    };
    out.write_result(&buffer).unwrap();

    let bytes = std::fs::read(out.path()).unwrap();
    assert_eq!(bytes.len(), 8);
    assert_eq!(f32::from_le_bytes(bytes[..4].try_into().unwrap()), -1.0);
    assert_eq!(f32::from_le_bytes(bytes[4..].try_into().unwrap()), 0.5);
  }
}
