/// BMP 文件的标准头部大小 (字节)。
/// 编码时原样复制，解码时直接跳过，隐写数据从像素区的第一个字节开始。
pub const BMP_HEADER_SIZE: usize = 54;

/// 魔数标记，写在像素区最前面，用于识别由本工具生成的隐写图像。
pub const MAGIC_STRING: &[u8; 2] = b"#*";

/// 隐藏一个字节所需的载体字节数。
/// 每个载体字节只使用最低有效位，因此 8 bits 需要 8 个载体字节。
pub const BYTE_WINDOW: usize = 8;

/// 隐藏一个 32 位长度字段所需的载体字节数。
pub const SIZE_WINDOW: usize = 32;

/// 扩展名缓冲区容量 (含结束符)。
/// 合法的扩展名长度因此为 `1..=9`，解码时据此拒绝被篡改或非隐写的输入。
pub const EXTN_BUFFER_CAPACITY: usize = 10;

/// 扩展名允许的最大长度 (含前导 `.`)。
pub const MAX_EXTENSION_LEN: usize = EXTN_BUFFER_CAPACITY - 1;

/// 24 位 BMP 每个像素占用的字节数。
pub const BYTES_PER_PIXEL: u64 = 3;

/// 未指定输出路径时，隐写图像的默认文件名。
pub const DEFAULT_STEGO_IMAGE: &str = "default.bmp";

/// 图像参数要求的文件后缀。
pub const IMAGE_SUFFIX: &str = "bmp";
