//! # 秘密文件扩展名
//!
//! 扩展名随数据一起隐藏，解码时仅作为提示信息返回，不会自动应用到输出文件名上。

use crate::constants::MAX_EXTENSION_LEN;
use crate::error::StegoError;
use std::fmt;
use std::path::Path;

/// 经过校验的扩展名，包含前导 `.`，长度为 `1..=9` 字节。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extension(Vec<u8>);

impl Extension {
    /// 从原始字节构造扩展名。
    ///
    /// # Errors
    ///
    /// 长度为 0 或超过 [`MAX_EXTENSION_LEN`] 时返回 [`StegoError::ExtensionLength`]。
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, StegoError> {
        if bytes.is_empty() || bytes.len() > MAX_EXTENSION_LEN {
            return Err(StegoError::ExtensionLength {
                len: bytes.len(),
                max: MAX_EXTENSION_LEN,
            });
        }
        Ok(Self(bytes))
    }

    /// 取文件名中最后一个 `.` 及其之后的部分作为扩展名。
    ///
    /// 只看文件名本身，目录名中的 `.` 不参与判断。扩展名按原始字节保存，
    /// 非 UTF-8 的文件名也不会被改写。
    pub fn from_path(path: &Path) -> Result<Self, StegoError> {
        let name = path
            .file_name()
            .ok_or(StegoError::MissingExtension)?
            .as_encoded_bytes();
        let dot = name
            .iter()
            .rposition(|&b| b == b'.')
            .ok_or(StegoError::MissingExtension)?;
        Self::from_bytes(name[dot..].to_vec())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Extension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.0))
    }
}
