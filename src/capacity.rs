//! # 容量规划模块
//!
//! 在写入任何输出之前判断载体能否容纳完整的隐写布局。
//! 一旦编码开始就不会回滚，所以这里的判断必须先于一切写入。

use crate::bmp::BmpHeader;
use crate::constants::{BYTE_WINDOW, MAGIC_STRING, SIZE_WINDOW};
use crate::error::StegoError;
use crate::payload::Extension;

/// 计算隐藏给定扩展名和数据所需的载体字节数。
///
/// 布局依次为：魔数、扩展名长度、扩展名、数据长度、数据。
pub fn required_bytes(extn_len: usize, payload_len: u64) -> u64 {
    let window = BYTE_WINDOW as u64;
    window * MAGIC_STRING.len() as u64
        + SIZE_WINDOW as u64
        + window * extn_len as u64
        + SIZE_WINDOW as u64
        + window.saturating_mul(payload_len)
}

/// 载体容量严格大于所需字节数时返回 `true`，恰好相等也视为不足。
pub fn check_capacity(capacity: u64, extn_len: usize, payload_len: u64) -> bool {
    capacity > required_bytes(extn_len, payload_len)
}

/// 已通过容量检查的编码计划，是启动编码器的前提。
#[derive(Debug, Clone)]
pub struct EncodePlan {
    header: BmpHeader,
    extension: Extension,
    payload_len: u32,
    required: u64,
}

impl EncodePlan {
    /// # Errors
    ///
    /// * 数据长度超出 32 位长度字段时返回 [`StegoError::PayloadTooLarge`]。
    /// * 容量不足时返回 [`StegoError::InsufficientCapacity`]。
    pub fn new(
        header: BmpHeader,
        extension: Extension,
        payload_len: u64,
    ) -> Result<Self, StegoError> {
        let payload_len32 =
            u32::try_from(payload_len).map_err(|_| StegoError::PayloadTooLarge(payload_len))?;

        let capacity = header.capacity();
        let required = required_bytes(extension.len(), payload_len);
        if !check_capacity(capacity, extension.len(), payload_len) {
            return Err(StegoError::InsufficientCapacity {
                required,
                available: capacity,
            });
        }

        log::info!("capacity check passed: {required} of {capacity} bytes needed");
        Ok(Self {
            header,
            extension,
            payload_len: payload_len32,
            required,
        })
    }

    pub fn header(&self) -> &BmpHeader {
        &self.header
    }

    pub fn extension(&self) -> &Extension {
        &self.extension
    }

    pub fn payload_len(&self) -> u32 {
        self.payload_len
    }

    /// 编码区域占用的载体字节数。
    pub fn required(&self) -> u64 {
        self.required
    }
}
