//! # 编码流程模块
//!
//! 按固定顺序把秘密文件写入载体：复制头部，依次隐藏魔数、扩展名长度、扩展名、
//! 数据长度和数据本身，最后原样复制剩余像素。整个过程是单次顺序读写，
//! 秘密数据逐字节处理，不会整体缓存在内存中。

use crate::bmp;
use crate::capacity::EncodePlan;
use crate::constants::{BMP_HEADER_SIZE, BYTE_WINDOW, MAGIC_STRING, SIZE_WINDOW};
use crate::error::{StegoError, carrier_read};
use crate::steganography::{pack_byte, pack_u32};
use std::fmt;
use std::io::{BufReader, BufWriter, Read, Seek, Write};

/// 编码状态机的各个阶段，按声明顺序推进。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum EncodeState {
    Init,
    HeaderCopied,
    MagicEncoded,
    ExtnLenEncoded,
    ExtnEncoded,
    SizeEncoded,
    DataEncoded,
    TailCopied,
    Done,
}

impl EncodeState {
    /// 从当前状态出发时正在进行的步骤，用于错误信息。
    fn step(self) -> &'static str {
        match self {
            Self::Init => "copying the BMP header",
            Self::HeaderCopied => "encoding the magic string",
            Self::MagicEncoded => "encoding the extension length",
            Self::ExtnLenEncoded => "encoding the extension",
            Self::ExtnEncoded => "encoding the secret length",
            Self::SizeEncoded => "encoding the secret data",
            Self::DataEncoded => "copying the remaining image data",
            Self::TailCopied | Self::Done => "finishing",
        }
    }
}

impl fmt::Display for EncodeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// 一次成功编码的统计信息。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeSummary {
    /// 写入输出的总字节数，与载体文件大小一致。
    pub bytes_written: u64,
    /// 被修改最低有效位的像素区字节数。
    pub encoded_bytes: u64,
    /// 原样复制的像素尾部字节数。
    pub tail_bytes: u64,
}

/// 将秘密文件隐藏到载体中的编码器。
pub struct Encoder<R: Read + Seek, S: Read, W: Write> {
    plan: EncodePlan,
    carrier: BufReader<R>,
    secret: BufReader<S>,
    output: BufWriter<W>,
    state: EncodeState,
    written: u64,
}

impl<R, S, W> Encoder<R, S, W>
where
    R: Read + Seek,
    S: Read,
    W: Write,
{
    /// 创建编码器。`plan` 只能通过容量检查获得，因此编码器启动前容量已经确认。
    pub fn new(plan: EncodePlan, carrier: R, secret: S, output: W) -> Self {
        Self {
            plan,
            carrier: BufReader::new(carrier),
            secret: BufReader::new(secret),
            output: BufWriter::new(output),
            state: EncodeState::Init,
            written: 0,
        }
    }

    pub fn state(&self) -> EncodeState {
        self.state
    }

    /// 执行完整的编码流程。
    ///
    /// # Errors
    ///
    /// 任何一步失败都会立即终止整个流程，已写出的输出不做修正，调用方应丢弃输出文件。
    /// * 载体在某个窗口中途结束：[`StegoError::CarrierExhausted`]。
    /// * 秘密文件短于计划长度：[`StegoError::SecretTruncated`]。
    /// * 其他读写失败：[`StegoError::Io`]。
    pub fn encode(mut self) -> Result<EncodeSummary, StegoError> {
        let header = self.plan.header();
        log::info!(
            "encoding {} bytes ({}) into the {}x{} carrier",
            self.plan.payload_len(),
            self.plan.extension(),
            header.width,
            header.height.unsigned_abs()
        );
        self.carrier.rewind()?;

        bmp::copy_header(&mut self.carrier, &mut self.output)
            .map_err(|err| carrier_read(err, self.state.step()))?;
        self.written += BMP_HEADER_SIZE as u64;
        self.advance(EncodeState::HeaderCopied);

        for &byte in MAGIC_STRING {
            self.embed_byte(byte)?;
        }
        self.advance(EncodeState::MagicEncoded);

        let extension = self.plan.extension().as_bytes().to_vec();
        self.embed_u32(extension.len() as u32)?;
        self.advance(EncodeState::ExtnLenEncoded);

        for byte in extension {
            self.embed_byte(byte)?;
        }
        self.advance(EncodeState::ExtnEncoded);

        self.embed_u32(self.plan.payload_len())?;
        self.advance(EncodeState::SizeEncoded);

        self.embed_secret()?;
        self.advance(EncodeState::DataEncoded);

        let encoded_bytes = self.written - BMP_HEADER_SIZE as u64;
        let tail_bytes = bmp::copy_tail(&mut self.carrier, &mut self.output)?;
        self.written += tail_bytes;
        self.advance(EncodeState::TailCopied);

        self.output.flush()?;
        self.advance(EncodeState::Done);

        Ok(EncodeSummary {
            bytes_written: self.written,
            encoded_bytes,
            tail_bytes,
        })
    }

    fn advance(&mut self, next: EncodeState) {
        debug_assert!(next > self.state, "{} -> {}", self.state, next);
        log::debug!("{} -> {}", self.state, next);
        self.state = next;
    }

    fn read_window(&mut self, window: &mut [u8]) -> Result<(), StegoError> {
        self.carrier
            .read_exact(window)
            .map_err(|err| carrier_read(err, self.state.step()))
    }

    fn write_window(&mut self, window: &[u8]) -> Result<(), StegoError> {
        self.output.write_all(window)?;
        self.written += window.len() as u64;
        Ok(())
    }

    fn embed_byte(&mut self, value: u8) -> Result<(), StegoError> {
        let mut window = [0u8; BYTE_WINDOW];
        self.read_window(&mut window)?;
        pack_byte(value, &mut window);
        self.write_window(&window)
    }

    fn embed_u32(&mut self, value: u32) -> Result<(), StegoError> {
        let mut window = [0u8; SIZE_WINDOW];
        self.read_window(&mut window)?;
        pack_u32(value, &mut window);
        self.write_window(&window)
    }

    /// 逐字节读取秘密文件并隐藏，读取量以计划长度为上限。
    fn embed_secret(&mut self) -> Result<(), StegoError> {
        let expected = u64::from(self.plan.payload_len());
        let mut read = 0u64;
        let mut byte = [0u8; 1];

        while read < expected {
            if self.secret.read(&mut byte)? == 0 {
                return Err(StegoError::SecretTruncated { read, expected });
            }
            self.embed_byte(byte[0])?;
            read += 1;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bmp::{BmpHeader, synthetic_bmp};
    use crate::payload::Extension;
    use crate::steganography::unpack_byte;
    use std::io::Cursor;

    fn plan_for(bmp: &[u8], ext: &str, len: u64) -> EncodePlan {
        let header = BmpHeader::parse(&bmp[..BMP_HEADER_SIZE].try_into().unwrap()).unwrap();
        EncodePlan::new(header, Extension::from_bytes(ext.as_bytes().to_vec()).unwrap(), len)
            .unwrap()
    }

    #[test]
    fn preserves_header_and_tail() {
        let carrier = synthetic_bmp(1024, 1, |i| (i * 7) as u8);
        let plan = plan_for(&carrier, ".txt", 5);
        let mut output = Vec::new();

        let summary = Encoder::new(plan, Cursor::new(carrier.clone()), &b"Hi!!!"[..], &mut output)
            .encode()
            .unwrap();

        assert_eq!(output.len(), carrier.len());
        assert_eq!(summary.bytes_written, carrier.len() as u64);
        assert_eq!(summary.encoded_bytes, 152);
        assert_eq!(summary.tail_bytes, 3072 - 152);
        assert_eq!(output[..BMP_HEADER_SIZE], carrier[..BMP_HEADER_SIZE]);

        let footprint_end = BMP_HEADER_SIZE + 152;
        assert_eq!(output[footprint_end..], carrier[footprint_end..]);
        for (a, b) in output[BMP_HEADER_SIZE..footprint_end]
            .iter()
            .zip(&carrier[BMP_HEADER_SIZE..footprint_end])
        {
            assert_eq!(a & 0xFE, b & 0xFE);
        }
    }

    #[test]
    fn writes_magic_first() {
        let carrier = synthetic_bmp(64, 1, |_| 0xFF);
        let plan = plan_for(&carrier, ".a", 0);
        let mut output = Vec::new();
        Encoder::new(plan, Cursor::new(carrier), &b""[..], &mut output)
            .encode()
            .unwrap();

        let first: &[u8; BYTE_WINDOW] = output[BMP_HEADER_SIZE..BMP_HEADER_SIZE + 8]
            .try_into()
            .unwrap();
        let second: &[u8; BYTE_WINDOW] = output[BMP_HEADER_SIZE + 8..BMP_HEADER_SIZE + 16]
            .try_into()
            .unwrap();
        assert_eq!(unpack_byte(first), b'#');
        assert_eq!(unpack_byte(second), b'*');
    }

    #[test]
    fn short_secret_fails() {
        let carrier = synthetic_bmp(64, 1, |_| 0);
        let plan = plan_for(&carrier, ".bin", 4);
        let err = Encoder::new(plan, Cursor::new(carrier), &b"ab"[..], Vec::new())
            .encode()
            .unwrap_err();
        assert!(matches!(
            err,
            StegoError::SecretTruncated {
                read: 2,
                expected: 4
            }
        ));
    }

    #[test]
    fn truncated_carrier_names_the_step() {
        let mut carrier = synthetic_bmp(64, 1, |_| 0);
        let plan = plan_for(&carrier, ".bin", 4);
        // 只保留头部、魔数以及扩展名长度字段的一半。
        carrier.truncate(BMP_HEADER_SIZE + 16 + 16);

        let err = Encoder::new(plan, Cursor::new(carrier), &b"abcd"[..], Vec::new())
            .encode()
            .unwrap_err();
        assert!(matches!(
            err,
            StegoError::CarrierExhausted {
                step: "encoding the extension length"
            }
        ));
    }
}
