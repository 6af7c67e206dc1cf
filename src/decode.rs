//! # 解码流程模块
//!
//! 与编码流程对称：跳过头部后校验魔数，读出扩展名与数据长度，再把数据逐字节写出。
//! 解码分为两段，[`Decoder::new`] 完成全部校验，[`Decoder::extract`] 才开始写输出，
//! 因此非隐写图像在任何输出产生之前就会被拒绝。

use crate::constants::{
    BMP_HEADER_SIZE, BYTE_WINDOW, EXTN_BUFFER_CAPACITY, MAGIC_STRING, SIZE_WINDOW,
};
use crate::error::{StegoError, carrier_read};
use crate::payload::Extension;
use crate::steganography::{unpack_byte, unpack_u32};
use std::fmt;
use std::io::{BufReader, BufWriter, Read, Seek, SeekFrom, Write};

/// 解码状态机的各个阶段。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DecodeState {
    Init,
    MagicVerified,
    ExtnLenDecoded,
    ExtnDecoded,
    SizeDecoded,
    DataDecoded,
    Done,
}

impl DecodeState {
    fn step(self) -> &'static str {
        match self {
            Self::Init => "decoding the magic string",
            Self::MagicVerified => "decoding the extension length",
            Self::ExtnLenDecoded => "decoding the extension",
            Self::ExtnDecoded => "decoding the secret length",
            Self::SizeDecoded => "decoding the secret data",
            Self::DataDecoded | Self::Done => "finishing",
        }
    }
}

impl fmt::Display for DecodeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// 数据之前的元信息。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preamble {
    pub extension: Extension,
    pub payload_len: u32,
}

/// 像素区上的顺序读取器，记录状态和剩余字节数。
struct PixelStream<R: Read> {
    reader: BufReader<R>,
    state: DecodeState,
    /// 像素区中尚未读取的字节数。
    remaining: u64,
}

impl<R: Read> PixelStream<R> {
    fn advance(&mut self, next: DecodeState) {
        debug_assert!(next > self.state, "{} -> {}", self.state, next);
        log::debug!("{} -> {}", self.state, next);
        self.state = next;
    }

    fn read_window(&mut self, window: &mut [u8]) -> Result<(), StegoError> {
        self.reader
            .read_exact(window)
            .map_err(|err| carrier_read(err, self.state.step()))?;
        self.remaining = self.remaining.saturating_sub(window.len() as u64);
        Ok(())
    }

    fn extract_byte(&mut self) -> Result<u8, StegoError> {
        let mut window = [0u8; BYTE_WINDOW];
        self.read_window(&mut window)?;
        Ok(unpack_byte(&window))
    }

    fn extract_u32(&mut self) -> Result<u32, StegoError> {
        let mut window = [0u8; SIZE_WINDOW];
        self.read_window(&mut window)?;
        Ok(unpack_u32(&window))
    }

    fn read_preamble(&mut self) -> Result<Preamble, StegoError> {
        let magic = (0..MAGIC_STRING.len())
            .map(|_| self.extract_byte())
            .collect::<Result<Vec<u8>, _>>()?;
        if magic[..] != MAGIC_STRING[..] {
            return Err(StegoError::MagicMismatch);
        }
        self.advance(DecodeState::MagicVerified);

        let extn_len = self.extract_u32()?;
        if extn_len == 0 || extn_len as usize >= EXTN_BUFFER_CAPACITY {
            return Err(StegoError::InvalidExtensionLength(extn_len));
        }
        self.advance(DecodeState::ExtnLenDecoded);

        let extension = (0..extn_len)
            .map(|_| self.extract_byte())
            .collect::<Result<Vec<u8>, _>>()?;
        let extension = Extension::from_bytes(extension)?;
        self.advance(DecodeState::ExtnDecoded);

        // 每个数据字节占用 8 个像素字节，超出剩余像素的长度必然来自损坏的输入。
        let payload_len = self.extract_u32()?;
        let available = self.remaining / BYTE_WINDOW as u64;
        if u64::from(payload_len) > available {
            return Err(StegoError::PayloadLengthOutOfBounds {
                declared: payload_len,
                available,
            });
        }
        self.advance(DecodeState::SizeDecoded);

        log::info!("found a hidden {extension} file of {payload_len} bytes");
        Ok(Preamble {
            extension,
            payload_len,
        })
    }
}

/// 从隐写图像中恢复秘密文件的解码器。
pub struct Decoder<R: Read> {
    stream: PixelStream<R>,
    preamble: Preamble,
}

impl<R: Read + Seek> Decoder<R> {
    /// 跳过头部并解析元信息。
    ///
    /// # Errors
    ///
    /// * 魔数不匹配：[`StegoError::MagicMismatch`]。
    /// * 扩展名长度不在 `1..=9` 之内：[`StegoError::InvalidExtensionLength`]。
    /// * 数据长度超出剩余像素所能承载的字节数：[`StegoError::PayloadLengthOutOfBounds`]。
    /// * 图像在某个窗口中途结束：[`StegoError::CarrierExhausted`]。
    pub fn new(mut reader: R) -> Result<Self, StegoError> {
        let total = reader.seek(SeekFrom::End(0))?;
        let header_len = BMP_HEADER_SIZE as u64;
        if total < header_len {
            return Err(StegoError::UnsupportedBitmap(format!(
                "file is shorter than the {BMP_HEADER_SIZE}-byte header"
            )));
        }
        reader.seek(SeekFrom::Start(header_len))?;

        let mut stream = PixelStream {
            reader: BufReader::new(reader),
            state: DecodeState::Init,
            remaining: total - header_len,
        };
        let preamble = stream.read_preamble()?;
        Ok(Self { stream, preamble })
    }
}

impl<R: Read> Decoder<R> {
    pub fn preamble(&self) -> &Preamble {
        &self.preamble
    }

    pub fn state(&self) -> DecodeState {
        self.stream.state
    }

    /// 把隐藏的数据逐字节写入 `output`，返回写出的字节数。
    pub fn extract<W: Write>(mut self, output: W) -> Result<u64, StegoError> {
        let mut output = BufWriter::new(output);
        let len = u64::from(self.preamble.payload_len);

        for _ in 0..len {
            let byte = self.stream.extract_byte()?;
            output.write_all(&[byte])?;
        }
        self.stream.advance(DecodeState::DataDecoded);

        output.flush()?;
        self.stream.advance(DecodeState::Done);
        Ok(len)
    }
}
