//! 可选的对称加密层
//!
//! 使用 AES-CTR 对载荷加密。每次加密都从系统 CSPRNG 取一个新的 16 字节 IV，
//! 输出格式为 `IV || 密文`。
//!
//! CTR 模式本身不提供完整性保护，完整性由外层的 [`Signer`](super::Signer) 负责；
//! 引擎总是先验证签名再解密。
//!
//! ## 示例
//!
//! ```rust
//! use magictoken::token::{AesCtrCipher, Cipher};
//!
//! let cipher = AesCtrCipher::new(&[7u8; 32]).unwrap();
//!
//! let wrapped = cipher.encrypt(b"hello").unwrap();
//! assert_eq!(wrapped.len(), 16 + 5);
//!
//! let plain = cipher.decrypt(&wrapped).unwrap();
//! assert_eq!(plain, b"hello");
//! ```

use aes::{Aes128, Aes256};
use ctr::cipher::{InvalidLength, KeyIvInit, StreamCipher};
use zeroize::Zeroizing;

use crate::error::{CryptoError, Error, Result};
use crate::random::generate_random_bytes;

type Aes128Ctr = ctr::Ctr128BE<Aes128>;
type Aes256Ctr = ctr::Ctr128BE<Aes256>;

/// IV 长度（AES 分组长度）
pub const IV_SIZE: usize = 16;

/// 对称加密能力
///
/// 实现此 trait 以替换默认的 AES-CTR 加密。
pub trait Cipher: Send + Sync {
    /// 加密明文，返回包含 IV 的密文
    fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>>;

    /// 解密 [`encrypt`](Cipher::encrypt) 的输出
    fn decrypt(&self, wrapped: &[u8]) -> Result<Vec<u8>>;
}

/// AES 密钥长度
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AesKeySize {
    /// AES-128，16 字节密钥
    Aes128,
    /// AES-256，32 字节密钥
    Aes256,
}

impl AesKeySize {
    /// 根据密钥长度选择算法
    pub fn from_key_length(length: usize) -> Option<Self> {
        match length {
            16 => Some(AesKeySize::Aes128),
            32 => Some(AesKeySize::Aes256),
            _ => None,
        }
    }

    /// 密钥字节数
    pub fn key_length(&self) -> usize {
        match self {
            AesKeySize::Aes128 => 16,
            AesKeySize::Aes256 => 32,
        }
    }
}

/// AES-CTR 加密器
#[derive(Clone)]
pub struct AesCtrCipher {
    key: Zeroizing<Vec<u8>>,
    key_size: AesKeySize,
}

impl AesCtrCipher {
    /// 创建加密器
    ///
    /// 密钥必须为 16 字节（AES-128）或 32 字节（AES-256），否则返回配置错误。
    pub fn new(key: &[u8]) -> Result<Self> {
        let key_size = AesKeySize::from_key_length(key.len())
            .ok_or_else(|| Error::invalid_key_length("cipher_key", "16 or 32", key.len()))?;

        Ok(Self {
            key: Zeroizing::new(key.to_vec()),
            key_size,
        })
    }

    /// 使用的 AES 密钥长度
    pub fn key_size(&self) -> AesKeySize {
        self.key_size
    }

    fn apply_keystream(&self, iv: &[u8], buf: &mut [u8]) -> Result<()> {
        let invalid =
            |_: InvalidLength| CryptoError::InvalidInput("invalid key or iv length".to_string());
        match self.key_size {
            AesKeySize::Aes128 => {
                Aes128Ctr::new_from_slices(&self.key, iv)
                    .map_err(invalid)?
                    .apply_keystream(buf);
            }
            AesKeySize::Aes256 => {
                Aes256Ctr::new_from_slices(&self.key, iv)
                    .map_err(invalid)?
                    .apply_keystream(buf);
            }
        }
        Ok(())
    }
}

impl Cipher for AesCtrCipher {
    fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        let mut wrapped = generate_random_bytes(IV_SIZE)?;
        wrapped.extend_from_slice(plaintext);

        let (iv, body) = wrapped.split_at_mut(IV_SIZE);
        self.apply_keystream(iv, body)?;
        Ok(wrapped)
    }

    fn decrypt(&self, wrapped: &[u8]) -> Result<Vec<u8>> {
        if wrapped.len() <= IV_SIZE {
            return Err(CryptoError::InvalidInput("ciphertext too short".to_string()).into());
        }

        let (iv, body) = wrapped.split_at(IV_SIZE);
        let mut plaintext = body.to_vec();
        self.apply_keystream(iv, &mut plaintext)?;
        Ok(plaintext)
    }
}

impl std::fmt::Debug for AesCtrCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AesCtrCipher")
            .field("key_size", &self.key_size)
            .finish_non_exhaustive()
    }
}
