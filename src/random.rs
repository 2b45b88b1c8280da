//! 安全随机数生成模块
//!
//! 提供密码学安全的随机字节生成（用于 IV 和密钥）以及常量时间比较。

use base64::{Engine, engine::general_purpose::STANDARD};
use rand::{TryRngCore, rngs::OsRng};

use crate::error::{CryptoError, Error, Result};

/// 生成指定长度的随机字节数组
///
/// 使用操作系统提供的密码学安全随机数生成器 (CSPRNG)。
/// 失败时返回 `CryptoError::RngFailed`，不会退回到更弱的随机源。
///
/// # Example
///
/// ```rust
/// use magictoken::random::generate_random_bytes;
///
/// let bytes = generate_random_bytes(16).unwrap();
/// assert_eq!(bytes.len(), 16);
/// ```
pub fn generate_random_bytes(length: usize) -> Result<Vec<u8>> {
    let mut bytes = vec![0u8; length];
    OsRng.try_fill_bytes(&mut bytes).map_err(|e| {
        tracing::warn!(length, "secure random source unavailable");
        Error::Crypto(CryptoError::RngFailed(format!("{:?}", e)))
    })?;
    Ok(bytes)
}

/// 生成新的密钥材料
///
/// 长度应与用途匹配：MAC 密钥 32 或 64 字节，加密密钥 16 或 32 字节。
pub fn generate_key(length: usize) -> Result<Vec<u8>> {
    generate_random_bytes(length)
}

/// 生成标准 Base64 编码的密钥
///
/// 输出可以直接写入配置文件，等价于 `head -c 32 /dev/urandom | base64`。
///
/// # Example
///
/// ```rust
/// use magictoken::random::generate_key_base64;
///
/// let key = generate_key_base64(32).unwrap();
/// assert_eq!(key.len(), 44);
/// ```
pub fn generate_key_base64(length: usize) -> Result<String> {
    let key = generate_key(length)?;
    Ok(STANDARD.encode(&key))
}

/// 常量时间比较两个字节切片
///
/// 用于防止时序攻击。执行时间不取决于第一个不同字节的位置。
///
/// # Example
///
/// ```rust
/// use magictoken::random::constant_time_compare;
///
/// assert!(constant_time_compare(b"signature", b"signature"));
/// assert!(!constant_time_compare(b"signature", b"signaturf"));
/// ```
pub fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    use subtle::ConstantTimeEq;
    a.ct_eq(b).into()
}
