//! Token 模块
//!
//! 提供 magic link token 的生成和验证功能。
//!
//! ## 子模块
//!
//! - **payload**: 载荷（邮箱 + 过期时间）及其编解码
//! - **cipher**: 可选的 AES-CTR 加密层
//! - **signer**: HMAC-SHA256 签名层
//! - **engine**: 组合以上三者的 Token 引擎
//! - **config**: 引擎配置
//!
//! `Signer` 和 `Cipher` 都是 trait，替换算法不需要修改引擎的编排逻辑。
//!
//! ## 自定义组件示例
//!
//! ```rust
//! use magictoken::token::{AesCtrCipher, HmacSigner, TokenEngine};
//! use chrono::{Duration, Utc};
//!
//! let signer = HmacSigner::new(&[1u8; 32]).unwrap();
//! let cipher = AesCtrCipher::new(&[2u8; 32]).unwrap();
//! let engine = TokenEngine::with_parts(signer, Some(cipher));
//!
//! let token = engine
//!     .generate("user@example.com", Utc::now() + Duration::minutes(5))
//!     .unwrap();
//! assert_eq!(engine.validate(&token).unwrap(), "user@example.com");
//! ```

pub mod cipher;
pub mod config;
pub mod engine;
pub mod payload;
pub mod signer;

pub use cipher::{AesCtrCipher, AesKeySize, Cipher, IV_SIZE};
pub use config::TokenEngineConfig;
pub use engine::{DEFAULT_VALIDITY, MagicLinkData, TokenEngine, TokenGenerator};
pub use payload::{MAX_EMAIL_LENGTH, PAYLOAD_FORMAT_VERSION, Payload, PayloadCodec};
pub use signer::{HmacSigner, SIGNATURE_SEPARATOR, Signer};
