//! 统一错误类型模块
//!
//! 提供 magictoken 库中所有操作的错误类型定义。
//!
//! ## 错误分类
//!
//! 对外只暴露少量错误种类（见 [`ErrorKind`]）：
//!
//! - **Configuration**: 构造引擎时密钥长度或编码无效
//! - **InvalidToken**: 所有 token 验证失败（格式、签名、解密、解码、过期）
//! - **Randomness**: 系统随机数生成器无法提供 IV
//! - **InvalidInput**: 生成 token 时调用方传入的参数无效
//!
//! 验证失败的具体原因只在内部区分，对调用方统一为 `InvalidToken`，
//! 避免攻击者据此判断 token 失败的原因。

use std::fmt;

/// magictoken 库的统一结果类型
pub type Result<T> = std::result::Result<T, Error>;

/// magictoken 库的错误类型
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Token 相关错误
    Token(TokenError),

    /// 输入参数验证错误
    Validation(ValidationError),

    /// 配置错误
    Config(ConfigError),

    /// 加密错误
    Crypto(CryptoError),
}

/// 对外可观察的错误种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// 密钥或配置无效，引擎无法构造
    Configuration,
    /// Token 无效（任何验证失败）
    InvalidToken,
    /// 安全随机数源不可用
    Randomness,
    /// 调用参数无效
    InvalidInput,
}

impl Error {
    /// 创建统一的无效 token 错误
    pub fn invalid_token() -> Self {
        Error::Token(TokenError::Invalid)
    }

    /// 创建一个验证错误
    pub fn validation(msg: impl Into<String>) -> Self {
        Error::Validation(ValidationError::Custom(msg.into()))
    }

    /// 创建一个密钥长度错误
    pub fn invalid_key_length(key: &str, expected: &str, actual: usize) -> Self {
        Error::Config(ConfigError::InvalidKeyLength {
            key: key.to_string(),
            expected: expected.to_string(),
            actual,
        })
    }

    /// 返回错误种类
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Token(TokenError::EncodingFailed(_)) => ErrorKind::InvalidInput,
            Error::Token(_) => ErrorKind::InvalidToken,
            Error::Validation(_) => ErrorKind::InvalidInput,
            Error::Config(_) => ErrorKind::Configuration,
            Error::Crypto(CryptoError::RngFailed(_)) => ErrorKind::Randomness,
            Error::Crypto(CryptoError::InvalidInput(_)) => ErrorKind::InvalidToken,
        }
    }

    /// 是否为无效 token 错误
    pub fn is_invalid_token(&self) -> bool {
        self.kind() == ErrorKind::InvalidToken
    }
}

/// Token 相关错误
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// Token 过期、不存在或无效
    Invalid,
    /// 载荷字节格式错误
    MalformedPayload,
    /// 载荷编码失败
    EncodingFailed(String),
}

/// 验证相关错误
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// 字段为空
    EmptyField(String),
    /// 邮箱地址过长
    EmailTooLong { max_length: usize, actual: usize },
    /// 自定义验证错误
    Custom(String),
}

/// 配置相关错误
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// 缺少必需的配置
    MissingRequired(String),
    /// 无效的配置值
    InvalidValue { key: String, message: String },
    /// 密钥长度无效
    InvalidKeyLength {
        key: String,
        expected: String,
        actual: usize,
    },
}

/// 加密相关错误
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// 随机数生成失败
    RngFailed(String),
    /// 输入无法解密
    InvalidInput(String),
}

// ============================================================================
// Display 实现
// ============================================================================

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Token(e) => write!(f, "Token error: {}", e),
            Error::Validation(e) => write!(f, "Validation error: {}", e),
            Error::Config(e) => write!(f, "Config error: {}", e),
            Error::Crypto(e) => write!(f, "Crypto error: {}", e),
        }
    }
}

impl fmt::Display for TokenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenError::Invalid => write!(f, "token expired, not found or invalid"),
            TokenError::MalformedPayload => write!(f, "malformed token payload"),
            TokenError::EncodingFailed(msg) => write!(f, "token encoding failed: {}", msg),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::EmptyField(field) => write!(f, "field '{}' cannot be empty", field),
            ValidationError::EmailTooLong { max_length, actual } => {
                write!(
                    f,
                    "email too long: maximum {} bytes, got {}",
                    max_length, actual
                )
            }
            ValidationError::Custom(msg) => write!(f, "{}", msg),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::MissingRequired(key) => {
                write!(f, "missing required configuration: {}", key)
            }
            ConfigError::InvalidValue { key, message } => {
                write!(f, "invalid configuration value for '{}': {}", key, message)
            }
            ConfigError::InvalidKeyLength {
                key,
                expected,
                actual,
            } => {
                write!(
                    f,
                    "invalid length for '{}': expected {} bytes, got {}",
                    key, expected, actual
                )
            }
        }
    }
}

impl fmt::Display for CryptoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CryptoError::RngFailed(msg) => write!(f, "random number generation failed: {}", msg),
            CryptoError::InvalidInput(msg) => write!(f, "invalid input: {}", msg),
        }
    }
}

// ============================================================================
// std::error::Error 实现
// ============================================================================

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Token(e) => Some(e),
            Error::Validation(e) => Some(e),
            Error::Config(e) => Some(e),
            Error::Crypto(e) => Some(e),
        }
    }
}

impl std::error::Error for TokenError {}
impl std::error::Error for ValidationError {}
impl std::error::Error for ConfigError {}
impl std::error::Error for CryptoError {}

// ============================================================================
// From 实现 - 方便错误转换
// ============================================================================

impl From<TokenError> for Error {
    fn from(err: TokenError) -> Self {
        Error::Token(err)
    }
}

impl From<ValidationError> for Error {
    fn from(err: ValidationError) -> Self {
        Error::Validation(err)
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Error::Config(err)
    }
}

impl From<CryptoError> for Error {
    fn from(err: CryptoError) -> Self {
        Error::Crypto(err)
    }
}
