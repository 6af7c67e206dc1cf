//! # bmp_lsb 库
//!
//! 本库包含 BMP LSB 隐写工具的核心逻辑：位编解码、容量规划，
//! 以及按固定字段顺序读写像素流的编码器与解码器。

// 声明库包含的所有模块。

pub mod bmp;
pub mod capacity;
pub mod cli;
pub mod constants;
pub mod decode;
pub mod encode;
pub mod error;
pub mod handler;
pub mod payload;
pub mod steganography;

pub use error::StegoError;
