//! # 位编解码模块
//!
//! 将一个字节或一个 32 位长度逐位写入 (读取) 一组载体字节的最低有效位。
//! 位序为高位在前：窗口中的第 `i` 个载体字节承载数值的第 `i` 个最高位。

use crate::constants::{BYTE_WINDOW, SIZE_WINDOW};

/// 把 `value` 的 `width` 个低位按高位在前的顺序写入 `window` 的最低有效位。
fn pack(value: u32, window: &mut [u8]) {
    let width = window.len();
    for (i, byte) in window.iter_mut().enumerate() {
        let bit = ((value >> (width - 1 - i)) & 1) as u8;
        *byte = (*byte & 0xFE) | bit;
    }
}

fn unpack(window: &[u8]) -> u32 {
    window
        .iter()
        .fold(0u32, |acc, &byte| (acc << 1) | u32::from(byte & 1))
}

/// 将一个字节隐藏到 8 个载体字节中。
///
/// 每个载体字节除最低有效位以外的 7 位保持不变。
pub fn pack_byte(value: u8, window: &mut [u8; BYTE_WINDOW]) {
    pack(u32::from(value), window);
}

/// 将一个 32 位数值隐藏到 32 个载体字节中，规则与 [`pack_byte`] 相同。
pub fn pack_u32(value: u32, window: &mut [u8; SIZE_WINDOW]) {
    pack(value, window);
}

/// 从 8 个载体字节的最低有效位中恢复一个字节。
pub fn unpack_byte(window: &[u8; BYTE_WINDOW]) -> u8 {
    // 8 个窗口位最多产生 0xFF。
    unpack(window) as u8
}

/// 从 32 个载体字节的最低有效位中恢复一个 32 位数值。
pub fn unpack_u32(window: &[u8; SIZE_WINDOW]) -> u32 {
    unpack(window)
}
