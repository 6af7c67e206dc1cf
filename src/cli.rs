//! # 命令行接口模块
//!
//! 使用 `clap` 定义了程序的命令行结构，包括子命令和参数。
//! 所有用户通过命令行与程序交互的入口点都在此模块中定义。

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// 一款基于 LSB (最低有效位) 隐写术的命令行工具，用于把任意文件隐藏在 24 位 BMP 图像中。
#[derive(Parser, Debug)]
#[command(
    version,
    about,
    long_about = "一款基于 LSB (最低有效位) 隐写术的命令行工具，用于把任意文件隐藏在未压缩的 24 位 BMP 图像中，或从隐写图像中恢复该文件。"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// 可用的子命令：encode (隐藏) 和 decode (恢复)。
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// 将秘密文件隐藏到 24 位 BMP 图像中。
    Encode(EncodeArgs),

    /// 从隐写图像中恢复秘密文件。
    Decode(DecodeArgs),
}

/// 'encode' 命令所需的参数。
#[derive(Parser, Debug)]
pub struct EncodeArgs {
    /// 用作载体的 24 位 BMP 图像 (必须以 .bmp 结尾)。
    #[arg(short, long)]
    pub image: PathBuf,

    /// 要隐藏的秘密文件，文件名必须带有扩展名。
    #[arg(short, long)]
    pub secret: PathBuf,

    /// 隐写图像的输出路径 (必须以 .bmp 结尾)，默认为载体所在目录下的 default.bmp。
    #[arg(short, long)]
    pub dest: Option<PathBuf>,

    /// 输出文件已存在时强制覆盖。
    #[arg(short, long)]
    pub force: bool,
}

/// 'decode' 命令所需的参数。
#[derive(Parser, Debug)]
pub struct DecodeArgs {
    /// 隐写图像的路径 (必须以 .bmp 结尾)。
    #[arg(short, long)]
    pub image: PathBuf,

    /// 恢复出的秘密文件的保存路径，扩展名不会被自动添加。
    #[arg(short, long)]
    pub output: PathBuf,

    /// 输出文件已存在时强制覆盖。
    #[arg(short, long)]
    pub force: bool,
}
