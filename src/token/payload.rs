//! Token 载荷及其编解码
//!
//! 载荷只包含邮箱和过期时间。编码格式：
//!
//! ```text
//! [版本号 1 字节] || bincode(Payload)
//! ```
//!
//! bincode 使用定长小端整数、带长度前缀的字符串，并拒绝多余的尾部字节，
//! 因此任何被截断或拼接的输入都会解码失败。

use bincode::Options;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, TokenError, ValidationError};

/// 当前载荷格式版本
pub const PAYLOAD_FORMAT_VERSION: u8 = 1;

/// 邮箱地址最大长度（字节）
pub const MAX_EMAIL_LENGTH: usize = 320;

/// 编码后载荷的最大长度（字节）
const MAX_ENCODED_LENGTH: u64 = 1024;

/// Token 载荷
///
/// 创建后不可修改。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payload {
    email: String,
    expiration: i64,
}

impl Payload {
    /// 创建载荷
    ///
    /// 过期时间精确到秒，亚秒部分被截断。
    pub fn new(email: impl Into<String>, expiration: DateTime<Utc>) -> Self {
        Self::from_timestamp(email, expiration.timestamp())
    }

    /// 使用 Unix 时间戳（秒）创建载荷
    pub fn from_timestamp(email: impl Into<String>, expiration: i64) -> Self {
        Self {
            email: email.into(),
            expiration,
        }
    }

    /// 邮箱地址
    pub fn email(&self) -> &str {
        &self.email
    }

    /// 过期时间（Unix 秒）
    pub fn expiration(&self) -> i64 {
        self.expiration
    }

    /// 过期时间
    ///
    /// 时间戳超出 chrono 可表示范围时返回 `None`。
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.expiration, 0)
    }

    /// 在给定时刻是否已过期
    ///
    /// 过期时间必须严格晚于 `now`，相等即视为过期。
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expiration <= now.timestamp()
    }

    pub(crate) fn into_email(self) -> String {
        self.email
    }
}

/// 载荷编解码器
#[derive(Debug, Clone, Copy, Default)]
pub struct PayloadCodec;

impl PayloadCodec {
    /// 创建编解码器
    pub fn new() -> Self {
        Self
    }

    /// 将载荷编码为字节
    ///
    /// 邮箱为空或超过 [`MAX_EMAIL_LENGTH`] 时返回验证错误。
    pub fn encode(&self, payload: &Payload) -> Result<Vec<u8>> {
        check_email(&payload.email)?;

        let body = bincode_options()
            .serialize(payload)
            .map_err(|e| TokenError::EncodingFailed(e.to_string()))?;

        let mut bytes = Vec::with_capacity(1 + body.len());
        bytes.push(PAYLOAD_FORMAT_VERSION);
        bytes.extend_from_slice(&body);
        Ok(bytes)
    }

    /// 从字节解码载荷
    ///
    /// 任何格式问题都返回 `TokenError::MalformedPayload`。
    pub fn decode(&self, bytes: &[u8]) -> Result<Payload> {
        let (&version, body) = bytes.split_first().ok_or(TokenError::MalformedPayload)?;
        if version != PAYLOAD_FORMAT_VERSION {
            return Err(TokenError::MalformedPayload.into());
        }

        let payload: Payload = bincode_options()
            .deserialize(body)
            .map_err(|_| TokenError::MalformedPayload)?;

        if payload.email.is_empty() || payload.email.len() > MAX_EMAIL_LENGTH {
            return Err(TokenError::MalformedPayload.into());
        }
        Ok(payload)
    }
}

fn bincode_options() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .with_little_endian()
        .with_limit(MAX_ENCODED_LENGTH)
        .reject_trailing_bytes()
}

fn check_email(email: &str) -> Result<()> {
    if email.is_empty() {
        return Err(ValidationError::EmptyField("email".to_string()).into());
    }
    if email.len() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::EmailTooLong {
            max_length: MAX_EMAIL_LENGTH,
            actual: email.len(),
        }
        .into());
    }
    Ok(())
}
