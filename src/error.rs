//! # 错误类型模块
//!
//! [`StegoError`] 覆盖了从载体探测、容量规划到编解码流程中的全部失败情形。
//! 命令处理层 (`handler`) 再通过 `anyhow` 为其附加文件路径等上下文。

use std::io;
use thiserror::Error;

/// 编码或解码过程中可能出现的错误。
#[derive(Debug, Error)]
pub enum StegoError {
    /// 头部不是受支持的未压缩 24 位 BMP。
    #[error("unsupported bitmap: {0}")]
    UnsupportedBitmap(String),

    /// `image` 无法解析载体图像。
    #[error("the carrier could not be read as a BMP image: {0}")]
    Image(#[from] image::ImageError),

    /// 秘密文件的文件名没有扩展名。
    #[error("the secret file name has no extension")]
    MissingExtension,

    /// 扩展名长度超出 `1..=9` 的范围。
    #[error("extension is {len} bytes long, expected 1..={max}")]
    ExtensionLength { len: usize, max: usize },

    #[error("not enough space in the image: required {required} bytes, available {available}")]
    InsufficientCapacity { required: u64, available: u64 },

    /// 秘密数据长度超出了 32 位长度字段的表示范围。
    #[error("secret of {0} bytes does not fit a 32-bit length field")]
    PayloadTooLarge(u64),

    /// 在读取某个字段的窗口时载体数据提前结束。
    #[error("carrier ended while {step}")]
    CarrierExhausted { step: &'static str },

    /// 秘密文件实际内容少于声明的长度。
    #[error("secret file ended after {read} of {expected} bytes")]
    SecretTruncated { read: u64, expected: u64 },

    #[error("magic string mismatch, the image does not carry a hidden file")]
    MagicMismatch,

    #[error("decoded extension length {0} is invalid")]
    InvalidExtensionLength(u32),

    /// 解码得到的数据长度超过了剩余载体所能承载的字节数。
    #[error("decoded secret length {declared} exceeds the {available} bytes the image can hold")]
    PayloadLengthOutOfBounds { declared: u32, available: u64 },

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// 将 `read_exact` 的提前结束转换为携带步骤名称的 [`StegoError::CarrierExhausted`]。
pub(crate) fn carrier_read(err: io::Error, step: &'static str) -> StegoError {
    if err.kind() == io::ErrorKind::UnexpectedEof {
        StegoError::CarrierExhausted { step }
    } else {
        StegoError::Io(err)
    }
}
