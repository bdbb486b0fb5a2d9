// 该文件是 Shanan （山南西风） 项目的一部分。
// src/task.rs - 预处理任务
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

use std::time::{Duration, Instant};
use tracing::{info, warn};

use crate::{output::Sink, preprocess::Preprocess};

pub trait Task<I, P, O>: Sized {
  type Error;
  fn run_task(self, input: I, preprocessor: P, output: O) -> Result<(), Self::Error>;
}

pub struct OneShotTask;

impl<
  F,
  D,
  PE: std::error::Error + Sync + Send + 'static,
  SE: std::error::Error + Sync + Send + 'static,
  I: Iterator<Item = F>,
  P: Preprocess<Input = F, Output = D, Error = PE>,
  O: Sink<D, Error = SE>,
> Task<I, P, O> for OneShotTask
{
  type Error = anyhow::Error;

  fn run_task(self, mut input: I, preprocessor: P, output: O) -> Result<(), Self::Error> {
    info!("开始任务...");
    let frame = input.next().ok_or_else(|| anyhow::anyhow!("没有输入帧"))?;
    info!("输入帧获取成功，开始预处理...");
    let now = Instant::now();
    let result = preprocessor.preprocess(&frame)?;
    info!("预处理完成，耗时: {:.2?}", now.elapsed());
    output.write_result(&result)?;
    info!("写出完成，耗时: {:.2?}", now.elapsed());

    Ok(())
  }
}

const WARMUP_TIMES: usize = 2;

/// 重复预处理同一帧以测量耗时，只写出最后一次结果
pub struct RepeatShotTask {
  repeat: usize,
}

impl Default for RepeatShotTask {
  fn default() -> Self {
    Self { repeat: 1000 }
  }
}

impl RepeatShotTask {
  pub fn with_repeat(mut self, repeat: usize) -> Self {
    self.repeat = repeat.max(1);
    self
  }
}

impl<
  F,
  D,
  PE: std::error::Error + Sync + Send + 'static,
  SE: std::error::Error + Sync + Send + 'static,
  I: Iterator<Item = F>,
  P: Preprocess<Input = F, Output = D, Error = PE>,
  O: Sink<D, Error = SE>,
> Task<I, P, O> for RepeatShotTask
{
  type Error = anyhow::Error;

  fn run_task(self, mut input: I, preprocessor: P, output: O) -> Result<(), Self::Error> {
    info!("开始任务...");
    let frame = input.next().ok_or_else(|| anyhow::anyhow!("没有输入帧"))?;
    info!("输入帧获取成功，开始预处理...");

    let mut times = Vec::with_capacity(self.repeat);
    let mut last = None;
    for i in 0..self.repeat {
      let now = Instant::now();
      let result = preprocessor.preprocess(&frame)?;
      let elapsed = now.elapsed();
      info!("({})预处理完成，耗时: {:.2?}", i, elapsed);
      times.push(elapsed);
      last = Some(result);
    }

    // 样本不足时不跳过预热
    let skip = if times.len() > WARMUP_TIMES { WARMUP_TIMES } else { 0 };
    let measured = &times[skip..];
    warn!(
      "平均预处理时间: {:.2?}",
      measured.iter().sum::<Duration>() / measured.len() as u32
    );

    if let Some(result) = last {
      output.write_result(&result)?;
      info!("写出完成");
    }

    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    bitmap::{Bitmap, PixelLayout},
    frame::{PixelBuffer, TargetSize},
    preprocess::Preprocessor,
  };
  use std::cell::RefCell;

  #[derive(Default)]
  struct Collect {
    written: RefCell<Vec<PixelBuffer>>,
  }

  impl Sink<PixelBuffer> for &Collect {
    type Error = std::convert::Infallible;

    fn write_result(&self, result: &PixelBuffer) -> Result<(), Self::Error> {
      self.written.borrow_mut().push(result.clone());
      Ok(())
    }
  }

  fn frames() -> impl Iterator<Item = Bitmap> {
    let bitmap = Bitmap::new(4, 4, PixelLayout::Rgba8, vec![128; 64]).unwrap();
    std::iter::once(bitmap)
  }

  #[test]
  fn one_shot_writes_once() {
    let sink = Collect::default();
    let pre = Preprocessor::new(TargetSize::square(2), 3, 1, true);
    OneShotTask.run_task(frames(), pre, &sink).unwrap();

    let written = sink.written.borrow();
    assert_eq!(written.len(), 1);
    let bytes = written[0].as_quantized().unwrap();
    assert_eq!(bytes.len(), 12);
    assert!(bytes.iter().all(|v| v.abs_diff(128) <= 1));
  }

  #[test]
  fn repeat_shot_writes_last_result() {
    let sink = Collect::default();
    let pre = Preprocessor::new(TargetSize::square(2), 3, 2, false);
    RepeatShotTask::default()
      .with_repeat(3)
      .run_task(frames(), pre, &sink)
      .unwrap();

    let written = sink.written.borrow();
    assert_eq!(written.len(), 1);
    assert_eq!(written[0].shape(), [2, 2, 2, 3]);
  }

  #[test]
  fn empty_input_is_an_error() {
    let sink = Collect::default();
    let res = OneShotTask.run_task(std::iter::empty::<Bitmap>(), Preprocessor::default(), &sink);
    assert!(res.is_err());
  }

  #[test]
  fn precondition_failure_propagates() {
    let sink = Collect::default();
    let pre = Preprocessor::new(TargetSize::square(2), 4, 1, true);
    let res = OneShotTask.run_task(frames(), pre, &sink);
    assert!(res.is_err());
    assert!(sink.written.borrow().is_empty());
  }
}
