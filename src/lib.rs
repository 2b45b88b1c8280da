//! # magictoken
//!
//! 用于无密码（Magic Link）认证的签名 Token 库。
//!
//! 服务端为邮箱地址和过期时间生成 token，应用层把 token 嵌入登录链接发送给用户；
//! 用户点击链接后，服务端验证 token 并取回邮箱。
//!
//! ## 功能特性
//!
//! - **签名**: HMAC-SHA256，支持 32 或 64 字节密钥，常量时间比较签名
//! - **加密（可选）**: AES-128-CTR 或 AES-256-CTR，每次加密使用新的随机 IV
//! - **过期检查**: token 自带过期时间，过期即失效
//! - **防探测**: 所有验证失败都返回同一个错误
//! - **无状态**: 引擎构造后不可变，可在多线程间共享
//!
//! 邮件发送、模板渲染、HTTP 处理以及一次性使用限制都由应用层负责。
//!
//! ## 示例
//!
//! ```rust
//! use magictoken::{TokenEngine, TokenEngineConfig};
//!
//! // 生成新的随机密钥（生产环境应从配置中读取）
//! let config = TokenEngineConfig::generate().unwrap();
//! let engine = config.build().unwrap();
//!
//! // 为用户生成 token
//! let data = engine.issue("user@example.com").unwrap();
//!
//! // 构建完整的魔法链接 URL（应用层负责）
//! let login_url = format!("https://example.com/auth?mauth_token={}", data.token);
//!
//! // 用户点击链接后，验证 token
//! match engine.validate(&data.token) {
//!     Ok(email) => println!("验证成功，用户: {}", email),
//!     Err(e) => println!("验证失败: {}", e),
//! }
//! ```
//!
//! ## 日志
//!
//! 验证失败时以 `debug` 级别通过 `tracing` 记录失败阶段，不记录 token 或邮箱。

pub mod error;
pub mod random;
pub mod token;

pub use error::{Error, ErrorKind, Result};

// ============================================================================
// Token 相关导出
// ============================================================================

pub use token::{
    AesCtrCipher, Cipher, HmacSigner, MagicLinkData, Payload, PayloadCodec, Signer, TokenEngine,
    TokenEngineConfig, TokenGenerator,
};

// ============================================================================
// 随机数生成函数导出
// ============================================================================

pub use random::{constant_time_compare, generate_key, generate_key_base64};
