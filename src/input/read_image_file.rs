// 该文件是 Shanan （山南西风） 项目的一部分。
// src/input/read_image_file.rs - 图像文件输入
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

use image::ImageReader;
use thiserror::Error;
use tracing::{debug, error};
use url::Url;

use crate::{FromUrl, FromUrlWithScheme, bitmap::Bitmap};

#[derive(Error, Debug)]
pub enum ImageFileInputError {
  #[error("URI schema mismatch")]
  SchemaMismatch,
  #[error("I/O error: {0}")]
  IoError(#[from] std::io::Error),
  #[error("Image loading error: {0}")]
  ImageLoadError(#[from] image::ImageError),
}

/// 单张图像文件，迭代时产出一次位图
pub struct ImageFileInput {
  bitmap: Option<Bitmap>,
}

impl FromUrlWithScheme for ImageFileInput {
  const SCHEME: &'static str = "image";
}

impl FromUrl for ImageFileInput {
  type Error = ImageFileInputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      error!(
        "URI scheme mismatch: expected '{}', found '{}'",
        Self::SCHEME,
        url.scheme()
      );
      return Err(ImageFileInputError::SchemaMismatch);
    }

    let path = url.path();
    let image = ImageReader::open(path)?.with_guessed_format()?.decode()?;
    debug!(
      "读取图像 {}: {}x{} {:?}",
      path,
      image.width(),
      image.height(),
      image.color()
    );

    Ok(ImageFileInput {
      bitmap: Some(Bitmap::from(image)),
    })
  }
}

impl Iterator for ImageFileInput {
  type Item = Bitmap;

  fn next(&mut self) -> Option<Self::Item> {
    self.bitmap.take()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::bitmap::PixelLayout;
  use image::{Rgba, RgbaImage};

  #[test]
  fn reads_png_once() {
    let path = std::env::temp_dir().join("shanan_prep_read_image_file.png");
    RgbaImage::from_pixel(5, 3, Rgba([1, 2, 3, 4]))
      .save(&path)
      .unwrap();

    let url = Url::parse(&format!("image://{}", path.display())).unwrap();
    let mut input = ImageFileInput::from_url(&url).unwrap();
    let bitmap = input.next().unwrap();
    assert_eq!((bitmap.width(), bitmap.height()), (5, 3));
    assert_eq!(bitmap.layout(), PixelLayout::Rgba8);
    assert!(input.next().is_none());

    std::fs::remove_file(&path).ok();
  }

  #[test]
  fn rejects_other_scheme() {
    let url = Url::parse("raw:///tmp/a.png").unwrap();
    assert!(matches!(
      ImageFileInput::from_url(&url),
      Err(ImageFileInputError::SchemaMismatch)
    ));
  }

  #[test]
  fn missing_file_is_io_error() {
    let url = Url::parse("image:///nonexistent/shanan_prep/missing.png").unwrap();
    assert!(matches!(
      ImageFileInput::from_url(&url),
      Err(ImageFileInputError::IoError(_))
    ));
  }
}
