//! # 命令处理逻辑模块
//!
//! 包含处理 `encode` 和 `decode` 子命令的高级业务逻辑。
//! 本模块负责参数校验、打开文件、调用核心编解码流程以及向用户报告结果。

use crate::bmp;
use crate::capacity::EncodePlan;
use crate::cli::{DecodeArgs, EncodeArgs};
use crate::constants::{DEFAULT_STEGO_IMAGE, IMAGE_SUFFIX};
use crate::decode::Decoder;
use crate::encode::Encoder;
use crate::error::StegoError;
use crate::payload::Extension;
use anyhow::{Context, Result};
use colored::Colorize;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

/// 处理 'Encode' 命令的执行逻辑。
///
/// 先校验参数并完成容量检查，再创建输出文件，因此容量不足时不会留下任何输出。
///
/// # Arguments
///
/// * `args` - 包含输入/输出路径的 `EncodeArgs` 结构体。
///
/// # Errors
///
/// 如果发生以下任一情况，将返回错误：
/// * 图像路径不以 `.bmp` 结尾，或秘密文件没有合法的扩展名。
/// * 输出文件已存在且未指定 `--force`。
/// * 载体不是未压缩的 24 位 BMP，或空间不足以隐藏秘密文件。
/// * 编码过程中读写失败 (此时不完整的输出文件会被删除)。
pub fn handle_encode(args: EncodeArgs) -> Result<()> {
    ensure_bmp_suffix(&args.image, "Source image")?;
    let dest = match args.dest {
        Some(dest) => {
            ensure_bmp_suffix(&dest, "Output image")?;
            dest
        }
        None => args.image.with_file_name(DEFAULT_STEGO_IMAGE),
    };

    let extension = Extension::from_path(&args.secret).with_context(|| {
        format!(
            "Invalid secret file name: {}",
            args.secret.to_string_lossy().red().bold()
        )
    })?;

    ensure_distinct(&dest, &[&args.image, &args.secret])?;
    ensure_writable(&dest, args.force)?;

    let mut carrier = File::open(&args.image).with_context(|| {
        format!(
            "Unable to open image file: {}",
            args.image.to_string_lossy().red().bold()
        )
    })?;
    let header = bmp::probe(&mut carrier).with_context(|| {
        format!(
            "Unsupported carrier image: {}",
            args.image.to_string_lossy().red().bold()
        )
    })?;

    let secret = File::open(&args.secret).with_context(|| {
        format!(
            "Unable to open secret file: {}",
            args.secret.to_string_lossy().red().bold()
        )
    })?;
    let secret_len = secret.metadata()?.len();

    let plan = match EncodePlan::new(header, extension, secret_len) {
        Err(StegoError::InsufficientCapacity {
            required,
            available,
        }) => anyhow::bail!(
            "Not enough space in the image to hide the secret file. \nRequired: {}, Available: {}",
            required.to_string().red().bold(),
            available.to_string().green().bold()
        ),
        plan => plan.with_context(|| {
            format!(
                "Unable to hide {} in the image",
                args.secret.to_string_lossy().red().bold()
            )
        })?,
    };

    let output = File::create(&dest).with_context(|| {
        format!(
            "Unable to create target image file: {}",
            dest.to_string_lossy().red().bold()
        )
    })?;

    let summary = discard_on_error(&dest, Encoder::new(plan, carrier, secret, output).encode())
        .with_context(|| {
            "Failed to hide the secret file in the image. \nThe image file may be truncated or unreadable."
        })?;
    log::info!(
        "wrote {} bytes, {} of them carry hidden data",
        summary.bytes_written,
        summary.encoded_bytes
    );

    println!(
        "The secret file has been successfully hidden and saved: {}",
        dest.to_string_lossy().green().bold()
    );

    Ok(())
}

/// 处理 'Decode' 命令的执行逻辑。
///
/// 魔数、扩展名和数据长度全部通过校验后才会创建输出文件。
///
/// # Arguments
///
/// * `args` - 包含输入/输出路径的 `DecodeArgs` 结构体。
///
/// # Errors
///
/// 如果发生以下任一情况，将返回错误：
/// * 图像路径不以 `.bmp` 结尾，或输出文件已存在且未指定 `--force`。
/// * 图像不包含本工具隐藏的数据，或数据已损坏。
/// * 无法写入到目标文件 (此时不完整的输出文件会被删除)。
pub fn handle_decode(args: DecodeArgs) -> Result<()> {
    ensure_bmp_suffix(&args.image, "Stego image")?;
    ensure_distinct(&args.output, &[&args.image])?;
    ensure_writable(&args.output, args.force)?;

    let stego = File::open(&args.image).with_context(|| {
        format!(
            "Unable to open image file: {}",
            args.image.to_string_lossy().red().bold()
        )
    })?;

    let decoder = Decoder::new(stego).with_context(|| {
        format!(
            "Failed to recover a hidden file from '{}'. \nThe image may not contain a hidden file or is corrupted.",
            args.image.to_string_lossy().red().bold()
        )
    })?;
    let extension = decoder.preamble().extension.clone();

    let output = File::create(&args.output).with_context(|| {
        format!(
            "Unable to create target file: {}",
            args.output.to_string_lossy().red().bold()
        )
    })?;

    let written = discard_on_error(&args.output, decoder.extract(output)).with_context(|| {
        format!(
            "Failed to write the hidden file to {}",
            args.output.to_string_lossy().red().bold()
        )
    })?;
    log::info!("recovered {written} bytes");

    println!(
        "The hidden file has been successfully recovered and saved: {}",
        args.output.to_string_lossy().green().bold()
    );
    println!(
        "Original file extension: {}",
        extension.to_string().green().bold()
    );

    Ok(())
}

fn ensure_bmp_suffix(path: &Path, role: &str) -> Result<()> {
    let is_bmp = path
        .extension()
        .is_some_and(|ext| ext == IMAGE_SUFFIX);
    anyhow::ensure!(
        is_bmp,
        "{} must end with .{}: {}",
        role,
        IMAGE_SUFFIX,
        path.to_string_lossy().red().bold()
    );
    Ok(())
}

/// 拒绝把输出写到任何一个输入文件上。
fn ensure_distinct(output: &Path, inputs: &[&PathBuf]) -> Result<()> {
    let Ok(output) = output.canonicalize() else {
        // 输出尚不存在，不可能与输入相同。
        return Ok(());
    };
    for input in inputs {
        anyhow::ensure!(
            input.canonicalize().ok().as_ref() != Some(&output),
            "Output file must differ from the input file: {}",
            input.to_string_lossy().red().bold()
        );
    }
    Ok(())
}

fn ensure_writable(path: &Path, force: bool) -> Result<()> {
    anyhow::ensure!(
        force || !path.exists(),
        "Output file already exists: {} \nUse --force to overwrite it.",
        path.to_string_lossy().red().bold()
    );
    Ok(())
}

/// 编解码失败时删除已经创建的不完整输出文件。
fn discard_on_error<T>(path: &Path, result: Result<T, StegoError>) -> Result<T, StegoError> {
    if result.is_err() {
        if let Err(err) = fs::remove_file(path) {
            log::warn!("unable to remove partial output {}: {err}", path.display());
        }
    }
    result
}
