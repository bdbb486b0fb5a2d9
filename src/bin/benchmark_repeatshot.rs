// 该文件是 Shanan （山南西风） 项目的一部分。
// src/bin/benchmark_repeatshot.rs - 预处理耗时测试
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

use anyhow::Result;
use clap::Parser;
use url::Url;

use shanan_prep::{
  FromUrl,
  input::ImageFileInput,
  output::OutputWrapper,
  preprocess::PreprocessorBuilder,
  task::{RepeatShotTask, Task},
};
use tracing::info;

/// Shanan 预处理参数配置
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 预处理配置
  #[arg(long, value_name = "PREPROCESS", default_value = "preprocess:")]
  pub preprocess: Url,
  /// 输入来源
  #[arg(long, value_name = "SOURCE")]
  pub input: Url,
  /// 输出路径
  #[arg(long, value_name = "OUTPUT")]
  pub output: Url,
  /// 重复次数
  #[arg(long, default_value = "1000", value_name = "COUNT")]
  pub repeat: usize,
}

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = Args::parse();

  info!("预处理配置: {}", args.preprocess);
  info!("输入来源: {}", args.input);
  info!("输出路径: {}", args.output);
  info!("重复次数: {}", args.repeat);

  let preprocessor = PreprocessorBuilder::from_url(&args.preprocess)?.build()?;
  let input = ImageFileInput::from_url(&args.input)?;
  let output = OutputWrapper::from_url(&args.output)?;

  RepeatShotTask::default()
    .with_repeat(args.repeat)
    .run_task(input, preprocessor, output)?;

  Ok(())
}
