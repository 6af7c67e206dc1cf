//! # BMP 载体模块
//!
//! 负责识别受支持的载体格式 (54 字节头部、未压缩、24 位)，计算像素区容量，
//! 以及编码时原样复制头部和未使用的像素尾部。

use crate::constants::{BMP_HEADER_SIZE, BYTES_PER_PIXEL};
use crate::error::StegoError;
use byteorder::{ByteOrder, LittleEndian};
use image::codecs::bmp::BmpDecoder;
use image::{ColorType, ImageDecoder};
use std::io::{self, BufReader, Read, Seek, Write};

const SIGNATURE: &[u8; 2] = b"BM";
const INFO_HEADER_SIZE: u32 = 40;
const BI_RGB: u32 = 0;

/// 从 54 字节头部中解析出的字段。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BmpHeader {
    pub width: u32,
    /// 负数表示自上而下存储的图像。
    pub height: i32,
    pub bits_per_pixel: u16,
    pub data_offset: u32,
}

impl BmpHeader {
    /// 解析并校验 BMP 头部。
    ///
    /// # Errors
    ///
    /// 签名错误、非 24 位、带压缩、头部长度不是 54 字节或尺寸为零时返回
    /// [`StegoError::UnsupportedBitmap`]。
    pub fn parse(raw: &[u8; BMP_HEADER_SIZE]) -> Result<Self, StegoError> {
        let unsupported = |reason: String| Err::<Self, _>(StegoError::UnsupportedBitmap(reason));

        if &raw[0..2] != SIGNATURE {
            return unsupported("missing 'BM' signature".into());
        }

        let data_offset = LittleEndian::read_u32(&raw[10..14]);
        let info_size = LittleEndian::read_u32(&raw[14..18]);
        let width = LittleEndian::read_i32(&raw[18..22]);
        let height = LittleEndian::read_i32(&raw[22..26]);
        let bits_per_pixel = LittleEndian::read_u16(&raw[28..30]);
        let compression = LittleEndian::read_u32(&raw[30..34]);

        if info_size != INFO_HEADER_SIZE || data_offset as usize != BMP_HEADER_SIZE {
            return unsupported(format!(
                "pixel data must start at byte {BMP_HEADER_SIZE} (info header {info_size}, offset {data_offset})"
            ));
        }
        if bits_per_pixel != 24 {
            return unsupported(format!("{bits_per_pixel}-bit images are not supported"));
        }
        if compression != BI_RGB {
            return unsupported(format!("compression method {compression} is not supported"));
        }
        if width <= 0 || height == 0 {
            return unsupported(format!("invalid dimensions {width}x{height}"));
        }

        Ok(Self {
            width: width as u32,
            height,
            bits_per_pixel,
            data_offset,
        })
    }

    /// 像素区可用于隐写的字节数：`width × |height| × 3`。
    ///
    /// 不考虑行对齐填充，填充字节只会让实际像素区比这个值更大。
    pub fn capacity(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height.unsigned_abs()) * BYTES_PER_PIXEL
    }
}

/// 读取并校验载体头部，再交给 `image` 的 BMP 解码器做一次交叉验证。
///
/// 读取位置在返回后是不确定的，调用方在编码前需要自行回绕。
pub fn probe<R: Read + Seek>(reader: &mut R) -> Result<BmpHeader, StegoError> {
    reader.rewind()?;
    let mut raw = [0u8; BMP_HEADER_SIZE];
    reader.read_exact(&mut raw).map_err(|err| match err.kind() {
        io::ErrorKind::UnexpectedEof => StegoError::UnsupportedBitmap(format!(
            "file is shorter than the {BMP_HEADER_SIZE}-byte header"
        )),
        _ => StegoError::Io(err),
    })?;
    let header = BmpHeader::parse(&raw)?;

    reader.rewind()?;
    let decoder = BmpDecoder::new(BufReader::new(&mut *reader))?;
    let expected = (header.width, header.height.unsigned_abs());
    if decoder.dimensions() != expected {
        return Err(StegoError::UnsupportedBitmap(format!(
            "header reports {}x{} but the decoder sees {}x{}",
            expected.0,
            expected.1,
            decoder.dimensions().0,
            decoder.dimensions().1
        )));
    }
    if decoder.color_type() != ColorType::Rgb8 {
        return Err(StegoError::UnsupportedBitmap(format!(
            "expected 24-bit RGB pixels, found {:?}",
            decoder.color_type()
        )));
    }

    log::info!(
        "carrier is {}x{} ({} usable bytes)",
        header.width,
        header.height.unsigned_abs(),
        header.capacity()
    );
    Ok(header)
}

/// 原样复制 54 字节的头部。
pub fn copy_header<R: Read, W: Write>(src: &mut R, dst: &mut W) -> io::Result<()> {
    let mut raw = [0u8; BMP_HEADER_SIZE];
    src.read_exact(&mut raw)?;
    dst.write_all(&raw)
}

/// 原样复制剩余的全部字节，返回复制的字节数。
pub fn copy_tail<R: Read, W: Write>(src: &mut R, dst: &mut W) -> io::Result<u64> {
    io::copy(src, dst)
}

/// 构造一个内存中的 24 位 BMP，像素字节由 `fill` 按下标生成。
#[cfg(test)]
pub(crate) fn synthetic_bmp(width: i32, height: i32, fill: impl Fn(usize) -> u8) -> Vec<u8> {
    let stride = (width as usize * 3).div_ceil(4) * 4;
    let pixel_len = stride * height.unsigned_abs() as usize;
    let mut out = vec![0u8; BMP_HEADER_SIZE];

    out[0..2].copy_from_slice(SIGNATURE);
    LittleEndian::write_u32(&mut out[2..6], (BMP_HEADER_SIZE + pixel_len) as u32);
    LittleEndian::write_u32(&mut out[10..14], BMP_HEADER_SIZE as u32);
    LittleEndian::write_u32(&mut out[14..18], INFO_HEADER_SIZE);
    LittleEndian::write_i32(&mut out[18..22], width);
    LittleEndian::write_i32(&mut out[22..26], height);
    LittleEndian::write_u16(&mut out[26..28], 1);
    LittleEndian::write_u16(&mut out[28..30], 24);
    LittleEndian::write_u32(&mut out[30..34], BI_RGB);
    LittleEndian::write_u32(&mut out[34..38], pixel_len as u32);

    out.extend((0..pixel_len).map(fill));
    out
}
