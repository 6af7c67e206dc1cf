use bmp_lsb::{
    StegoError,
    cli::{DecodeArgs, EncodeArgs},
    constants::BMP_HEADER_SIZE,
    handler::{handle_decode, handle_encode},
};
use image::{ImageBuffer, Rgb};
use rand::RngCore;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

/// 一个辅助函数，用于创建一个带有随机像素的 24 位 BMP 测试图像
fn create_test_image(path: &Path, width: u32, height: u32) {
    let mut raw_pixels = vec![0u8; (width * height * 3) as usize];
    rand::rng().fill_bytes(&mut raw_pixels);

    let img_buf: ImageBuffer<Rgb<u8>, Vec<u8>> =
        ImageBuffer::from_raw(width, height, raw_pixels).expect("Pixel buffer has the wrong size.");

    img_buf.save(path).expect("Failed to create test image.");
}

fn encode_args(image: &Path, secret: &Path, dest: Option<&Path>) -> EncodeArgs {
    EncodeArgs {
        image: image.to_path_buf(),
        secret: secret.to_path_buf(),
        dest: dest.map(Path::to_path_buf),
        force: false,
    }
}

fn decode_args(image: &Path, output: &Path) -> DecodeArgs {
    DecodeArgs {
        image: image.to_path_buf(),
        output: output.to_path_buf(),
        force: false,
    }
}

/// 验证从隐藏到恢复的完整流程，以及头部和未使用像素保持不变
#[test]
fn test_encode_and_decode_integration() -> anyhow::Result<()> {
    // 1. 准备环境
    let dir = tempdir()?;
    let original_image_path = dir.path().join("original.bmp");
    let stego_image_path = dir.path().join("stego.bmp");
    let secret_path = dir.path().join("secret.txt");
    let recovered_path = dir.path().join("recovered");

    create_test_image(&original_image_path, 100, 100);
    let secret = "This is a test message for the handler! 这是一个给处理器的测试信息！";
    fs::write(&secret_path, secret)?;

    // 2. 测试 handle_encode
    handle_encode(encode_args(
        &original_image_path,
        &secret_path,
        Some(&stego_image_path),
    ))?;
    assert!(stego_image_path.exists(), "Stego image should be created.");

    let original = fs::read(&original_image_path)?;
    let stego = fs::read(&stego_image_path)?;
    assert_eq!(original.len(), stego.len());
    assert_eq!(original[..BMP_HEADER_SIZE], stego[..BMP_HEADER_SIZE]);

    let footprint = 16 + 32 + 4 * 8 + 32 + secret.len() * 8;
    let tail = BMP_HEADER_SIZE + footprint;
    assert_eq!(original[tail..], stego[tail..], "Unused pixels must be untouched.");
    assert!(
        original[BMP_HEADER_SIZE..tail]
            .iter()
            .zip(&stego[BMP_HEADER_SIZE..tail])
            .all(|(a, b)| a & 0xFE == b & 0xFE),
        "Only the least significant bits may change."
    );
    image::open(&stego_image_path)?;

    // 3. 测试 handle_decode
    handle_decode(decode_args(&stego_image_path, &recovered_path))?;
    assert!(recovered_path.exists(), "Recovered file should be created.");

    // 4. 验证结果
    assert_eq!(secret, fs::read_to_string(&recovered_path)?);

    Ok(())
}

/// 验证 1024x1 载体中隐藏 "Hi!!!" 的示例
#[test]
fn test_small_text_in_single_row_carrier() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let image_path = dir.path().join("row.bmp");
    let secret_path = dir.path().join("hi.txt");
    let stego_path = dir.path().join("row_stego.bmp");
    let recovered_path = dir.path().join("hi_recovered.txt");

    create_test_image(&image_path, 1024, 1);
    fs::write(&secret_path, "Hi!!!")?;

    handle_encode(encode_args(&image_path, &secret_path, Some(&stego_path)))?;
    handle_decode(decode_args(&stego_path, &recovered_path))?;

    assert_eq!(fs::read(&recovered_path)?, b"Hi!!!");
    Ok(())
}

/// 验证任意二进制文件也能完整恢复
#[test]
fn test_binary_secret_round_trip() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let image_path = dir.path().join("cover.bmp");
    let secret_path = dir.path().join("blob.bin");
    let stego_path = dir.path().join("cover_stego.bmp");
    let recovered_path = dir.path().join("blob_out");

    create_test_image(&image_path, 64, 64);
    let mut secret = vec![0u8; 1000];
    rand::rng().fill_bytes(&mut secret);
    fs::write(&secret_path, &secret)?;

    handle_encode(encode_args(&image_path, &secret_path, Some(&stego_path)))?;
    handle_decode(decode_args(&stego_path, &recovered_path))?;

    assert_eq!(fs::read(&recovered_path)?, secret);
    Ok(())
}

/// 验证当用户不提供输出路径时，隐写图像写入载体目录下的 default.bmp
#[test]
fn test_encode_with_default_output() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let image_path = dir.path().join("original.bmp");
    let secret_path = dir.path().join("notes.md");
    let recovered_path = dir.path().join("notes_recovered.md");

    create_test_image(&image_path, 40, 40);
    fs::write(&secret_path, "# Testing default path generation.")?;

    handle_encode(encode_args(&image_path, &secret_path, None))?;

    let expected_stego_path = dir.path().join("default.bmp");
    assert!(
        expected_stego_path.exists(),
        "Default stego image should be created at: {:?}",
        expected_stego_path
    );

    handle_decode(decode_args(&expected_stego_path, &recovered_path))?;
    assert_eq!(
        fs::read_to_string(&recovered_path)?,
        "# Testing default path generation."
    );

    Ok(())
}

/// 验证覆盖保护机制以及 `--force` 标志是否按预期工作
#[test]
fn test_overwrite_protection_and_force_flag() -> anyhow::Result<()> {
    // 1. 准备环境
    let dir = tempdir()?;
    let image_path = dir.path().join("image.bmp");
    let secret_path = dir.path().join("text.txt");
    let dest_path = dir.path().join("dest.bmp");

    create_test_image(&image_path, 50, 50);
    fs::write(&secret_path, "some text")?;

    // 2. 场景一：测试覆盖保护
    fs::write(&dest_path, "this is a dummy file to be overwritten")?;

    let result = handle_encode(encode_args(&image_path, &secret_path, Some(&dest_path)));
    assert!(
        result.is_err(),
        "Execution should fail without --force when file exists."
    );
    if let Err(e) = result {
        assert!(e.to_string().contains("Output file already exists"));
    }
    assert_eq!(
        fs::read(&dest_path)?,
        b"this is a dummy file to be overwritten"
    );

    // 3. 场景二：测试强制覆盖
    let mut args = encode_args(&image_path, &secret_path, Some(&dest_path));
    args.force = true;
    let result = handle_encode(args);
    assert!(
        result.is_ok(),
        "Execution should succeed with --force when file exists."
    );

    let dummy_content = fs::read(&dest_path)?;
    assert_ne!(dummy_content, b"this is a dummy file to be overwritten");

    Ok(())
}

/// 验证空间不足时的错误处理，且不会留下输出文件
#[test]
fn test_encode_not_enough_space() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let image_path = dir.path().join("small.bmp");
    let secret_path = dir.path().join("large.txt");
    let dest_path = dir.path().join("dest.bmp");

    create_test_image(&image_path, 10, 10);
    fs::write(&secret_path, "a".repeat(5000))?;

    let result = handle_encode(encode_args(&image_path, &secret_path, Some(&dest_path)));

    assert!(result.is_err());
    if let Err(e) = result {
        assert!(e.to_string().contains("Not enough space"));
    }
    assert!(!dest_path.exists(), "No output may be created.");

    Ok(())
}

/// 验证参数校验：图像后缀和秘密文件扩展名
#[test]
fn test_argument_validation() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let image_path = dir.path().join("image.bmp");
    let png_path = dir.path().join("image.png");
    let secret_path = dir.path().join("secret.txt");
    let bare_secret_path = dir.path().join("secret");
    let long_ext_path = dir.path().join("secret.verylongext");

    create_test_image(&image_path, 20, 20);
    fs::write(&secret_path, "x")?;
    fs::write(&bare_secret_path, "x")?;
    fs::write(&long_ext_path, "x")?;

    let err = handle_encode(encode_args(&png_path, &secret_path, None)).unwrap_err();
    assert!(err.to_string().contains("must end with .bmp"));

    let err = handle_encode(encode_args(&image_path, &secret_path, Some(&png_path))).unwrap_err();
    assert!(err.to_string().contains("must end with .bmp"));

    let err = handle_encode(encode_args(&image_path, &bare_secret_path, None)).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<StegoError>(),
        Some(StegoError::MissingExtension)
    ));

    let err = handle_encode(encode_args(&image_path, &long_ext_path, None)).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<StegoError>(),
        Some(StegoError::ExtensionLength { len: 12, max: 9 })
    ));

    let err = handle_decode(decode_args(&png_path, &secret_path)).unwrap_err();
    assert!(err.to_string().contains("must end with .bmp"));

    assert!(!dir.path().join("default.bmp").exists());
    Ok(())
}

/// 验证普通图像在魔数校验阶段被拒绝，且不会创建输出文件
#[test]
fn test_decode_rejects_plain_image() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let image_path = dir.path().join("plain.bmp");
    let output_path = dir.path().join("out.txt");

    create_test_image(&image_path, 30, 30);
    // 随机像素也可能碰巧拼出魔数，这里把前 16 个像素字节的最低位清零。
    let mut bytes = fs::read(&image_path)?;
    for byte in &mut bytes[BMP_HEADER_SIZE..BMP_HEADER_SIZE + 16] {
        *byte &= 0xFE;
    }
    fs::write(&image_path, bytes)?;

    let err = handle_decode(decode_args(&image_path, &output_path)).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<StegoError>(),
        Some(StegoError::MagicMismatch)
    ));
    assert!(!output_path.exists());

    Ok(())
}

/// 验证非 24 位图像会被拒绝
#[test]
fn test_encode_rejects_rgba_bitmap() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let image_path = dir.path().join("rgba.bmp");
    let secret_path = dir.path().join("secret.txt");

    ImageBuffer::<image::Rgba<u8>, Vec<u8>>::new(16, 16).save(&image_path)?;
    fs::write(&secret_path, "x")?;

    let err = handle_encode(encode_args(&image_path, &secret_path, None)).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<StegoError>(),
        Some(StegoError::UnsupportedBitmap(_))
    ));
    assert!(!dir.path().join("default.bmp").exists());

    Ok(())
}
