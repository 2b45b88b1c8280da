//! Magic Link Token 引擎
//!
//! 将载荷编码、可选加密和签名组合在一起。
//!
//! ## 工作流程
//!
//! 生成：编码载荷 → （可选）加密 → 签名并编码
//!
//! 验证：解码并校验签名 → （可选）解密 → 解码载荷 → 检查过期时间
//!
//! 签名校验通过之前不会进行任何解密或解码。所有验证失败都返回同一个
//! `TokenError::Invalid`，调用方无法区分 token 是被篡改、格式错误还是已过期。
//!
//! 引擎不保存任何状态：同一个 token 在有效期内可以多次验证成功，
//! 一次性使用需要由应用层实现。
//!
//! ## 示例
//!
//! ```rust
//! use magictoken::TokenEngine;
//! use chrono::{Duration, Utc};
//!
//! let engine = TokenEngine::with_encryption(&[1u8; 32], &[2u8; 16]).unwrap();
//!
//! let token = engine
//!     .generate("user@example.com", Utc::now() + Duration::minutes(20))
//!     .unwrap();
//!
//! // 构建完整的魔法链接 URL（应用层负责）
//! let url = format!("https://example.com/auth?mauth_token={}", token);
//!
//! let email = engine.validate(&token).unwrap();
//! assert_eq!(email, "user@example.com");
//! ```

use base64::{Engine, engine::general_purpose::STANDARD};
use chrono::{DateTime, SubsecRound, Utc};
use std::time::Duration;

use super::cipher::{AesCtrCipher, Cipher};
use super::config::TokenEngineConfig;
use super::payload::{Payload, PayloadCodec};
use super::signer::{HmacSigner, Signer};
use crate::error::{ConfigError, Error, Result};

/// 默认 token 有效期：20 分钟
pub const DEFAULT_VALIDITY: Duration = Duration::from_secs(20 * 60);

// ============================================================================
// 生成器接口
// ============================================================================

/// Token 生成器接口
///
/// 应用层可以持有 `Arc<dyn TokenGenerator>`，以便替换不同的实现。
pub trait TokenGenerator: Send + Sync {
    /// 为邮箱生成在 `expiration` 过期的 token
    fn generate(&self, email: &str, expiration: DateTime<Utc>) -> Result<String>;

    /// 验证 token，成功返回邮箱
    fn validate(&self, token: &str) -> Result<String>;
}

// ============================================================================
// 数据结构
// ============================================================================

/// Magic Link Token 数据
#[derive(Debug, Clone)]
pub struct MagicLinkData {
    /// 生成的 token（用于构建 URL）
    pub token: String,

    /// 关联的用户标识（邮箱）
    pub identifier: String,

    /// 创建时间
    pub created_at: DateTime<Utc>,

    /// 过期时间
    pub expires_at: DateTime<Utc>,
}

impl MagicLinkData {
    /// 检查 token 是否已过期
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }

    /// 获取剩余有效时间（秒）
    pub fn remaining_seconds(&self) -> i64 {
        let remaining = self.expires_at - Utc::now();
        remaining.num_seconds().max(0)
    }
}

// ============================================================================
// 引擎
// ============================================================================

/// Token 引擎
///
/// 构造后不可变，可以在多个线程间共享（`Arc<TokenEngine>`），无需加锁。
///
/// ## 示例
///
/// ```rust
/// use magictoken::TokenEngine;
///
/// // 仅签名
/// let engine = TokenEngine::new(&[1u8; 64]).unwrap();
/// assert!(!engine.is_encrypted());
///
/// let data = engine.issue("user@example.com").unwrap();
/// assert_eq!(engine.validate(&data.token).unwrap(), "user@example.com");
/// ```
#[derive(Clone)]
pub struct TokenEngine<S: Signer = HmacSigner, C: Cipher = AesCtrCipher> {
    signer: S,
    cipher: Option<C>,
    codec: PayloadCodec,
    default_validity: Duration,
}

impl TokenEngine<HmacSigner, AesCtrCipher> {
    /// 创建仅签名（不加密）的引擎
    ///
    /// `mac_key` 必须为 32 或 64 字节。
    pub fn new(mac_key: &[u8]) -> Result<Self> {
        Ok(Self::with_parts(HmacSigner::new(mac_key)?, None))
    }

    /// 创建签名并加密的引擎
    ///
    /// `cipher_key` 为 16 字节时使用 AES-128，32 字节时使用 AES-256。
    pub fn with_encryption(mac_key: &[u8], cipher_key: &[u8]) -> Result<Self> {
        Ok(Self::with_parts(
            HmacSigner::new(mac_key)?,
            Some(AesCtrCipher::new(cipher_key)?),
        ))
    }

    /// 使用标准 Base64 编码的密钥创建仅签名的引擎
    pub fn from_base64(mac_key: &str) -> Result<Self> {
        let mac_key = decode_key("mac_key", mac_key)?;
        Self::new(&mac_key)
    }

    /// 使用标准 Base64 编码的密钥创建加密引擎
    pub fn with_encryption_base64(mac_key: &str, cipher_key: &str) -> Result<Self> {
        let mac_key = decode_key("mac_key", mac_key)?;
        let cipher_key = decode_key("cipher_key", cipher_key)?;
        Self::with_encryption(&mac_key, &cipher_key)
    }

    /// 从配置创建引擎
    pub fn from_config(config: &TokenEngineConfig) -> Result<Self> {
        if config.mac_key.is_empty() {
            return Err(ConfigError::MissingRequired("mac_key".to_string()).into());
        }

        let engine = match &config.cipher_key {
            Some(cipher_key) => Self::with_encryption_base64(&config.mac_key, cipher_key)?,
            None => Self::from_base64(&config.mac_key)?,
        };
        Ok(engine.with_default_validity(config.default_validity))
    }
}

impl<S: Signer, C: Cipher> TokenEngine<S, C> {
    /// 使用自定义的签名器和加密器创建引擎
    pub fn with_parts(signer: S, cipher: Option<C>) -> Self {
        Self {
            signer,
            cipher,
            codec: PayloadCodec::new(),
            default_validity: DEFAULT_VALIDITY,
        }
    }

    /// 设置默认有效期
    pub fn with_default_validity(mut self, validity: Duration) -> Self {
        self.default_validity = validity;
        self
    }

    /// 默认有效期
    pub fn default_validity(&self) -> Duration {
        self.default_validity
    }

    /// 是否启用了加密
    pub fn is_encrypted(&self) -> bool {
        self.cipher.is_some()
    }

    /// 生成 token
    ///
    /// # Errors
    ///
    /// - 邮箱为空或过长
    /// - 随机数源无法生成 IV（仅加密模式）
    pub fn generate(&self, email: &str, expiration: DateTime<Utc>) -> Result<String> {
        let mut content = self.codec.encode(&Payload::new(email, expiration))?;

        if let Some(cipher) = &self.cipher {
            content = cipher.encrypt(&content)?;
        }

        self.signer.sign(&content)
    }

    /// 验证 token，成功返回邮箱
    ///
    /// 所有失败都返回 `TokenError::Invalid`。
    pub fn validate(&self, token: &str) -> Result<String> {
        self.validate_at(token, Utc::now())
    }

    /// 以指定的当前时间验证 token
    pub fn validate_at(&self, token: &str, now: DateTime<Utc>) -> Result<String> {
        let mut content = self
            .signer
            .unsign(token)
            .map_err(|e| rejected("signature", e))?;

        if let Some(cipher) = &self.cipher {
            content = cipher
                .decrypt(&content)
                .map_err(|e| rejected("decrypt", e))?;
        }

        let payload = self
            .codec
            .decode(&content)
            .map_err(|e| rejected("decode", e))?;

        if payload.is_expired_at(now) {
            return Err(rejected("expired", Error::invalid_token()));
        }

        Ok(payload.into_email())
    }

    /// 使用默认有效期生成 token
    pub fn issue(&self, email: impl Into<String>) -> Result<MagicLinkData> {
        self.issue_with_ttl(email, self.default_validity)
    }

    /// 使用指定有效期生成 token
    ///
    /// token 中的过期时间精确到秒，`created_at` 和 `expires_at` 同样截断到整秒，
    /// 与引擎验证时使用的过期时间一致。
    ///
    /// # Example
    ///
    /// ```rust
    /// use magictoken::TokenEngine;
    /// use std::time::Duration;
    ///
    /// let engine = TokenEngine::new(&[1u8; 32]).unwrap();
    /// let data = engine
    ///     .issue_with_ttl("user@example.com", Duration::from_secs(600))
    ///     .unwrap();
    /// assert!(data.remaining_seconds() <= 600);
    /// ```
    pub fn issue_with_ttl(
        &self,
        email: impl Into<String>,
        ttl: Duration,
    ) -> Result<MagicLinkData> {
        let identifier = email.into();

        let created_at = Utc::now().trunc_subsecs(0);
        let expires_at = chrono::Duration::from_std(ttl)
            .ok()
            .and_then(|ttl| created_at.checked_add_signed(ttl))
            .ok_or_else(|| Error::validation("ttl out of range"))?;

        let token = self.generate(&identifier, expires_at)?;

        Ok(MagicLinkData {
            token,
            identifier,
            created_at,
            expires_at,
        })
    }
}

impl<S: Signer, C: Cipher> TokenGenerator for TokenEngine<S, C> {
    fn generate(&self, email: &str, expiration: DateTime<Utc>) -> Result<String> {
        TokenEngine::generate(self, email, expiration)
    }

    fn validate(&self, token: &str) -> Result<String> {
        TokenEngine::validate(self, token)
    }
}

impl<S: Signer + std::fmt::Debug, C: Cipher + std::fmt::Debug> std::fmt::Debug
    for TokenEngine<S, C>
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenEngine")
            .field("signer", &self.signer)
            .field("cipher", &self.cipher)
            .field("default_validity", &self.default_validity)
            .finish()
    }
}

// ============================================================================
// 辅助函数
// ============================================================================

/// 记录拒绝原因并折叠为统一的无效 token 错误
///
/// 只记录失败阶段，不记录 token 或载荷内容。
fn rejected(stage: &'static str, err: Error) -> Error {
    tracing::debug!(stage, kind = ?err.kind(), "magic link token rejected");
    Error::invalid_token()
}

fn decode_key(name: &str, encoded: &str) -> Result<Vec<u8>> {
    STANDARD.decode(encoded.trim()).map_err(|_| {
        Error::Config(ConfigError::InvalidValue {
            key: name.to_string(),
            message: "key is not valid base64".to_string(),
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CryptoError, ErrorKind, TokenError};
    use chrono::Duration as ChronoDuration;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const MAC_KEY: [u8; 32] = [0x11; 32];
    const CIPHER_KEY: [u8; 32] = [0x22; 32];

    fn engines() -> Vec<TokenEngine> {
        vec![
            TokenEngine::new(&MAC_KEY).unwrap(),
            TokenEngine::new(&[0x33; 64]).unwrap(),
            TokenEngine::with_encryption(&MAC_KEY, &[0x44; 16]).unwrap(),
            TokenEngine::with_encryption(&MAC_KEY, &CIPHER_KEY).unwrap(),
        ]
    }

    #[test]
    fn test_generate_and_validate() {
        for engine in engines() {
            let token = engine
                .generate("test@example.com", Utc::now() + ChronoDuration::minutes(1))
                .unwrap();
            assert_eq!(engine.validate(&token).unwrap(), "test@example.com");
        }
    }

    #[test]
    fn test_expired_token() {
        for engine in engines() {
            let token = engine
                .generate("test@example.com", Utc::now() - ChronoDuration::minutes(1))
                .unwrap();
            let err = engine.validate(&token).unwrap_err();
            assert_eq!(err, Error::Token(TokenError::Invalid));
        }
    }

    #[test]
    fn test_expiration_is_exclusive() {
        let engine = TokenEngine::new(&MAC_KEY).unwrap();
        let expiration = DateTime::from_timestamp(2_000_000_000, 0).unwrap();
        let token = engine.generate("test@example.com", expiration).unwrap();

        let before = expiration - ChronoDuration::seconds(1);
        assert_eq!(engine.validate_at(&token, before).unwrap(), "test@example.com");
        assert!(engine.validate_at(&token, expiration).is_err());
        assert!(
            engine
                .validate_at(&token, expiration + ChronoDuration::seconds(1))
                .is_err()
        );
    }

    #[test]
    fn test_plain_token_is_readable_without_key() {
        let engine = TokenEngine::new(&MAC_KEY).unwrap();
        let token = engine
            .generate("visible@example.com", Utc::now() + ChronoDuration::minutes(1))
            .unwrap();

        let inner = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .decode(&token)
            .unwrap();
        let text = String::from_utf8_lossy(&inner);
        let encoded_value = text.split('#').next().unwrap();
        let payload = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .decode(encoded_value)
            .unwrap();
        let payload = PayloadCodec::new().decode(&payload).unwrap();
        assert_eq!(payload.email(), "visible@example.com");
    }

    #[test]
    fn test_encrypted_tokens_differ() {
        let engine = TokenEngine::with_encryption(&MAC_KEY, &CIPHER_KEY).unwrap();
        let expiration = Utc::now() + ChronoDuration::minutes(5);

        let t1 = engine.generate("a@b.com", expiration).unwrap();
        let t2 = engine.generate("a@b.com", expiration).unwrap();
        assert_ne!(t1, t2);

        assert_eq!(engine.validate(&t1).unwrap(), "a@b.com");
        assert_eq!(engine.validate(&t2).unwrap(), "a@b.com");
    }

    #[test]
    fn test_plain_tokens_are_deterministic() {
        let engine = TokenEngine::new(&MAC_KEY).unwrap();
        let expiration = DateTime::from_timestamp(2_000_000_000, 0).unwrap();

        assert_eq!(
            engine.generate("a@b.com", expiration).unwrap(),
            engine.generate("a@b.com", expiration).unwrap()
        );
    }

    #[test]
    fn test_truncated_ciphertext_is_invalid_token() {
        let signer = HmacSigner::new(&MAC_KEY).unwrap();
        let engine = TokenEngine::with_encryption(&MAC_KEY, &CIPHER_KEY).unwrap();

        // 签名有效但密文过短
        let token = signer.sign(&[0u8; 16]).unwrap();
        let err = engine.validate(&token).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidToken);
        assert_eq!(err, Error::invalid_token());
    }

    #[test]
    fn test_signed_garbage_is_invalid_token() {
        let signer = HmacSigner::new(&MAC_KEY).unwrap();
        let engine = TokenEngine::new(&MAC_KEY).unwrap();

        let token = signer.sign(b"\x01not a payload").unwrap();
        assert_eq!(engine.validate(&token).unwrap_err(), Error::invalid_token());
    }

    #[test]
    fn test_base64_constructors() {
        let mac = STANDARD.encode(MAC_KEY);
        let cipher = STANDARD.encode(CIPHER_KEY);

        assert!(!TokenEngine::from_base64(&mac).unwrap().is_encrypted());
        assert!(
            TokenEngine::with_encryption_base64(&mac, &cipher)
                .unwrap()
                .is_encrypted()
        );

        let err = TokenEngine::from_base64("not base64!").unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::InvalidValue { .. })));

        let short = STANDARD.encode([0u8; 8]);
        let err = TokenEngine::with_encryption_base64(&mac, &short).unwrap_err();
        assert!(matches!(
            err,
            Error::Config(ConfigError::InvalidKeyLength { actual: 8, .. })
        ));
    }

    #[test]
    fn test_issue_uses_default_validity() {
        let engine = TokenEngine::new(&MAC_KEY).unwrap();
        assert_eq!(engine.default_validity(), DEFAULT_VALIDITY);

        let data = engine.issue("test@example.com").unwrap();
        assert_eq!(data.identifier, "test@example.com");
        assert!(!data.is_expired());
        assert_eq!(
            (data.expires_at - data.created_at).num_seconds(),
            DEFAULT_VALIDITY.as_secs() as i64
        );
        assert_eq!(engine.validate(&data.token).unwrap(), "test@example.com");
    }

    #[test]
    fn test_issue_with_ttl() {
        let engine = TokenEngine::new(&MAC_KEY)
            .unwrap()
            .with_default_validity(Duration::from_secs(60));

        let data = engine.issue("test@example.com").unwrap();
        let remaining = data.remaining_seconds();
        assert!(remaining > 55 && remaining <= 60);

        let data = engine
            .issue_with_ttl("test@example.com", Duration::from_secs(300))
            .unwrap();
        let remaining = data.remaining_seconds();
        assert!(remaining > 295 && remaining <= 300);
    }

    #[test]
    fn test_issue_expiry_matches_token() {
        let engine = TokenEngine::new(&MAC_KEY).unwrap();
        let data = engine
            .issue_with_ttl("test@example.com", Duration::from_secs(2))
            .unwrap();

        assert_eq!(data.created_at.timestamp_subsec_nanos(), 0);
        assert_eq!(data.expires_at.timestamp_subsec_nanos(), 0);
        assert_eq!((data.expires_at - data.created_at).num_seconds(), 2);

        let last_valid = data.expires_at - ChronoDuration::milliseconds(1);
        assert_eq!(
            engine.validate_at(&data.token, last_valid).unwrap(),
            "test@example.com"
        );
        assert!(engine.validate_at(&data.token, data.expires_at).is_err());
    }

    #[test]
    fn test_issue_with_huge_ttl() {
        let engine = TokenEngine::new(&MAC_KEY).unwrap();
        let err = engine
            .issue_with_ttl("test@example.com", Duration::from_secs(u64::MAX))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn test_generate_rejects_empty_email() {
        let engine = TokenEngine::new(&MAC_KEY).unwrap();
        let err = engine
            .generate("", Utc::now() + ChronoDuration::minutes(1))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn test_trait_object() {
        let engine: Box<dyn TokenGenerator> =
            Box::new(TokenEngine::with_encryption(&MAC_KEY, &CIPHER_KEY).unwrap());

        let token = engine
            .generate("dyn@example.com", Utc::now() + ChronoDuration::minutes(1))
            .unwrap();
        assert_eq!(engine.validate(&token).unwrap(), "dyn@example.com");
    }

    /// 记录解密调用次数的加密器
    #[derive(Clone)]
    struct CountingCipher {
        inner: AesCtrCipher,
        decrypts: Arc<AtomicUsize>,
    }

    impl Cipher for CountingCipher {
        fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
            self.inner.encrypt(plaintext)
        }

        fn decrypt(&self, wrapped: &[u8]) -> Result<Vec<u8>> {
            self.decrypts.fetch_add(1, Ordering::SeqCst);
            self.inner.decrypt(wrapped)
        }
    }

    /// 随机数源不可用时的加密器
    struct BrokenRngCipher;

    impl Cipher for BrokenRngCipher {
        fn encrypt(&self, _plaintext: &[u8]) -> Result<Vec<u8>> {
            Err(CryptoError::RngFailed("entropy source unavailable".to_string()).into())
        }

        fn decrypt(&self, wrapped: &[u8]) -> Result<Vec<u8>> {
            Ok(wrapped.to_vec())
        }
    }

    #[test]
    fn test_signature_checked_before_decrypt() {
        let decrypts = Arc::new(AtomicUsize::new(0));
        let cipher = CountingCipher {
            inner: AesCtrCipher::new(&CIPHER_KEY).unwrap(),
            decrypts: Arc::clone(&decrypts),
        };
        let engine = TokenEngine::with_parts(HmacSigner::new(&MAC_KEY).unwrap(), Some(cipher));
        let expiration = Utc::now() + ChronoDuration::minutes(1);

        // 其他 MAC 密钥、相同加密密钥
        let other_key = TokenEngine::with_encryption(&[0x55; 32], &CIPHER_KEY).unwrap();
        let wrong_key = other_key.generate("x@example.com", expiration).unwrap();

        let valid = engine.generate("x@example.com", expiration).unwrap();
        let mut forged: Vec<char> = valid.chars().collect();
        forged[10] = if forged[10] == 'A' { 'B' } else { 'A' };
        let forged: String = forged.into_iter().collect();

        let garbage = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .encode(b"AAAAAAAAAAAAAAAAAAAAAAAA#AAAA");

        for token in [wrong_key.as_str(), forged.as_str(), garbage.as_str(), "", "###"] {
            assert_eq!(engine.validate(token).unwrap_err(), Error::invalid_token());
        }
        assert_eq!(decrypts.load(Ordering::SeqCst), 0);

        assert_eq!(engine.validate(&valid).unwrap(), "x@example.com");
        assert_eq!(decrypts.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_rng_failure_aborts_generate() {
        let engine =
            TokenEngine::with_parts(HmacSigner::new(&MAC_KEY).unwrap(), Some(BrokenRngCipher));

        let err = engine
            .generate("test@example.com", Utc::now() + ChronoDuration::minutes(1))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Randomness);

        let err = engine.issue("test@example.com").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Randomness);
    }

    #[test]
    fn test_debug_hides_keys() {
        let engine = TokenEngine::with_encryption(&[0x61; 32], &[0x62; 16]).unwrap();
        let debug = format!("{:?}", engine);
        assert!(debug.contains("TokenEngine"));
        assert!(debug.contains("Aes128"));
        assert!(!debug.contains("97"));
        assert!(!debug.contains("98"));
    }
}
