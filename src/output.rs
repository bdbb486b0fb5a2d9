// 该文件是 Shanan （山南西风） 项目的一部分。
// src/output.rs - 输出定义
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

use std::path::Path;

use crate::FromUrl;
#[cfg(any(feature = "raw_output", feature = "json_output"))]
use crate::FromUrlWithScheme;
use crate::frame::PixelBuffer;
use thiserror::Error;
use url::Url;

pub trait Sink<Output>: Sized {
  type Error;
  fn write_result(&self, result: &Output) -> Result<(), Self::Error>;
}

#[cfg(feature = "raw_output")]
mod save_raw_file;
#[cfg(feature = "raw_output")]
pub use self::save_raw_file::{SaveRawFileError, SaveRawFileOutput};

#[cfg(feature = "json_output")]
mod save_json_file;
#[cfg(feature = "json_output")]
pub use self::save_json_file::{SaveJsonFileError, SaveJsonFileOutput};

#[derive(Error, Debug)]
pub enum OutputError {
  #[cfg(feature = "raw_output")]
  #[error("保存原始文件错误: {0}")]
  SaveRawFileError(#[from] SaveRawFileError),
  #[cfg(feature = "json_output")]
  #[error("保存 JSON 文件错误: {0}")]
  SaveJsonFileError(#[from] SaveJsonFileError),
  #[error("URI 方案不匹配")]
  SchemeMismatch,
}

pub enum OutputWrapper {
  #[cfg(feature = "raw_output")]
  SaveRawFileOutput(SaveRawFileOutput),
  #[cfg(feature = "json_output")]
  SaveJsonFileOutput(SaveJsonFileOutput),
}

impl FromUrl for OutputWrapper {
  type Error = OutputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    match url.scheme() {
      #[cfg(feature = "raw_output")]
      SaveRawFileOutput::SCHEME => {
        let output = SaveRawFileOutput::from_url(url)?;
        Ok(OutputWrapper::SaveRawFileOutput(output))
      }
      #[cfg(feature = "json_output")]
      SaveJsonFileOutput::SCHEME => {
        let output = SaveJsonFileOutput::from_url(url)?;
        Ok(OutputWrapper::SaveJsonFileOutput(output))
      }
      _ => Err(OutputError::SchemeMismatch),
    }
  }
}

impl Sink<PixelBuffer> for OutputWrapper {
  type Error = OutputError;

  fn write_result(&self, result: &PixelBuffer) -> Result<(), Self::Error> {
    match self {
      #[cfg(feature = "raw_output")]
      OutputWrapper::SaveRawFileOutput(output) => {
        output.write_result(result).map_err(OutputError::from)
      }
      #[cfg(feature = "json_output")]
      OutputWrapper::SaveJsonFileOutput(output) => {
        output.write_result(result).map_err(OutputError::from)
      }
    }
  }
}

/// 创建输出文件所在目录
pub(crate) fn ensure_parent(path: &str) -> std::io::Result<()> {
  if let Some(parent) = Path::new(path).parent()
    && !parent.as_os_str().is_empty()
  {
    std::fs::create_dir_all(parent)?;
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn unknown_scheme_is_rejected() {
    let url = Url::parse("rtsp://localhost/stream").unwrap();
    assert!(matches!(
      OutputWrapper::from_url(&url),
      Err(OutputError::SchemeMismatch)
    ));
  }

  #[cfg(feature = "raw_output")]
  #[test]
  fn dispatches_by_scheme() {
    let url = Url::parse("raw:///tmp/shanan_prep/out.bin").unwrap();
    assert!(matches!(
      OutputWrapper::from_url(&url),
      Ok(OutputWrapper::SaveRawFileOutput(_))
    ));
  }
}
