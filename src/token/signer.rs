//! 签名层
//!
//! 使用 HMAC-SHA256 对载荷签名，token 格式：
//!
//! ```text
//! b64( b64(payload) + "#" + b64(mac) )
//! ```
//!
//! 三层编码都使用 URL 安全、无填充的 Base64，token 可以直接放入 URL 查询参数。
//! 因此 token 与使用标准 Base64（带填充）编码的实现不互通。
//! MAC 计算在内层 `b64(payload)` 字符串上。
//!
//! ## 示例
//!
//! ```rust
//! use magictoken::token::{HmacSigner, Signer};
//!
//! let signer = HmacSigner::new(&[1u8; 32]).unwrap();
//!
//! let token = signer.sign(b"payload").unwrap();
//! assert_eq!(signer.unsign(&token).unwrap(), b"payload");
//! ```

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::error::{Error, Result};
use crate::random::constant_time_compare;

type HmacSha256 = Hmac<Sha256>;

/// 载荷与签名之间的分隔符，不属于 Base64 字母表
pub const SIGNATURE_SEPARATOR: u8 = b'#';

/// 签名能力
///
/// 实现此 trait 以替换默认的 HMAC-SHA256 签名。
pub trait Signer: Send + Sync {
    /// 签名并编码为 token 字符串
    fn sign(&self, value: &[u8]) -> Result<String>;

    /// 验证 token 签名并返回原始字节
    ///
    /// 任何失败都返回 `TokenError::Invalid`。
    fn unsign(&self, token: &str) -> Result<Vec<u8>>;
}

/// HMAC-SHA256 签名器
#[derive(Clone)]
pub struct HmacSigner {
    key: Zeroizing<Vec<u8>>,
}

impl HmacSigner {
    /// 创建签名器
    ///
    /// 密钥必须为 32 或 64 字节，否则返回配置错误。
    pub fn new(key: &[u8]) -> Result<Self> {
        if key.len() != 32 && key.len() != 64 {
            return Err(Error::invalid_key_length("mac_key", "32 or 64", key.len()));
        }
        Ok(Self {
            key: Zeroizing::new(key.to_vec()),
        })
    }

    fn mac(&self, data: &[u8]) -> Result<Vec<u8>> {
        let mut mac = HmacSha256::new_from_slice(&self.key)
            .map_err(|_| Error::invalid_key_length("mac_key", "32 or 64", self.key.len()))?;
        mac.update(data);
        Ok(mac.finalize().into_bytes().to_vec())
    }
}

impl Signer for HmacSigner {
    fn sign(&self, value: &[u8]) -> Result<String> {
        let encoded_value = URL_SAFE_NO_PAD.encode(value);
        let encoded_mac = URL_SAFE_NO_PAD.encode(self.mac(encoded_value.as_bytes())?);

        let mut inner = Vec::with_capacity(encoded_value.len() + 1 + encoded_mac.len());
        inner.extend_from_slice(encoded_value.as_bytes());
        inner.push(SIGNATURE_SEPARATOR);
        inner.extend_from_slice(encoded_mac.as_bytes());

        Ok(URL_SAFE_NO_PAD.encode(inner))
    }

    fn unsign(&self, token: &str) -> Result<Vec<u8>> {
        let inner = URL_SAFE_NO_PAD
            .decode(token)
            .map_err(|_| Error::invalid_token())?;

        let mut parts = inner.split(|b| *b == SIGNATURE_SEPARATOR);
        let (Some(encoded_value), Some(encoded_mac), None) =
            (parts.next(), parts.next(), parts.next())
        else {
            return Err(Error::invalid_token());
        };

        let expected_mac = URL_SAFE_NO_PAD.encode(self.mac(encoded_value)?);
        if !constant_time_compare(expected_mac.as_bytes(), encoded_mac) {
            return Err(Error::invalid_token());
        }

        URL_SAFE_NO_PAD
            .decode(encoded_value)
            .map_err(|_| Error::invalid_token())
    }
}

impl std::fmt::Debug for HmacSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HmacSigner")
            .field("key_length", &self.key.len())
            .finish_non_exhaustive()
    }
}
