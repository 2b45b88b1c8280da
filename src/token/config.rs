//! Token 引擎配置
//!
//! 密钥以标准 Base64 字符串保存，便于写入配置文件或环境变量。
//! 可以用下面的命令生成一个 32 字节的密钥：
//!
//! ```text
//! head -c 32 /dev/urandom | base64
//! ```
//!
//! ## 示例
//!
//! ```rust
//! use magictoken::TokenEngineConfig;
//! use std::time::Duration;
//!
//! let config = TokenEngineConfig::new("75YFw11MN+tD4EwfyrUASEoVv5gkhF34iNzB3DUmCy4=")
//!     .with_default_validity(Duration::from_secs(600));
//!
//! let engine = config.build().unwrap();
//! assert!(!engine.is_encrypted());
//! ```

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::engine::{DEFAULT_VALIDITY, TokenEngine};
use crate::error::Result;
use crate::random::generate_key_base64;

/// Token 引擎配置
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenEngineConfig {
    /// MAC 密钥（标准 Base64，解码后 32 或 64 字节）
    pub mac_key: String,

    /// 加密密钥（标准 Base64，解码后 16 或 32 字节），不设置则只签名不加密
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cipher_key: Option<String>,

    /// 默认 token 有效期
    #[serde(
        rename = "default_validity_secs",
        default = "default_validity",
        with = "duration_secs"
    )]
    pub default_validity: Duration,
}

fn default_validity() -> Duration {
    DEFAULT_VALIDITY
}

impl TokenEngineConfig {
    /// 使用 MAC 密钥创建配置
    pub fn new(mac_key: impl Into<String>) -> Self {
        Self {
            mac_key: mac_key.into(),
            cipher_key: None,
            default_validity: DEFAULT_VALIDITY,
        }
    }

    /// 使用新生成的随机密钥创建配置
    ///
    /// - 64 字节 MAC 密钥
    /// - 32 字节加密密钥（AES-256）
    pub fn generate() -> Result<Self> {
        Ok(Self::new(generate_key_base64(64)?).with_cipher_key(generate_key_base64(32)?))
    }

    /// 设置加密密钥
    pub fn with_cipher_key(mut self, cipher_key: impl Into<String>) -> Self {
        self.cipher_key = Some(cipher_key.into());
        self
    }

    /// 设置默认有效期
    pub fn with_default_validity(mut self, validity: Duration) -> Self {
        self.default_validity = validity;
        self
    }

    /// 构造引擎
    pub fn build(&self) -> Result<TokenEngine> {
        TokenEngine::from_config(self)
    }
}

impl std::fmt::Debug for TokenEngineConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenEngineConfig")
            .field("mac_key", &"<redacted>")
            .field("cipher_key", &self.cipher_key.as_ref().map(|_| "<redacted>"))
            .field("default_validity", &self.default_validity)
            .finish()
    }
}

/// 以整数秒序列化 `Duration`
mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}
