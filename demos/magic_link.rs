//! Magic Link 示例
//!
//! 展示如何使用 magictoken 生成和验证魔法链接 token。
//!
//! 运行: cargo run --example magic_link

use chrono::{Duration, Utc};
use magictoken::{TokenEngine, TokenEngineConfig};

const BASE_URL: &str = "https://example.com/auth";
const TOKEN_PARAM: &str = "mauth_token";

fn main() {
    println!("=== magictoken Magic Link 示例 ===\n");

    // 1. 生成配置（实际应用中应从配置文件读取密钥）
    let config = match TokenEngineConfig::generate() {
        Ok(config) => config.with_default_validity(std::time::Duration::from_secs(15 * 60)),
        Err(e) => {
            eprintln!("无法生成密钥: {}", e);
            return;
        }
    };
    println!("配置: {:?}\n", config);

    let engine = match config.build() {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("无法创建引擎: {}", e);
            return;
        }
    };

    // 2. 为用户生成 token
    let data = match engine.issue("alice@example.com") {
        Ok(data) => data,
        Err(e) => {
            eprintln!("生成 token 失败: {}", e);
            return;
        }
    };

    // 3. 构建登录链接（token 使用 URL 安全字符，无需转义）
    let login_url = format!("{}?{}={}", BASE_URL, TOKEN_PARAM, data.token);
    println!("登录链接: {}", login_url);
    println!("过期时间: {}", data.expires_at);
    println!("剩余时间: {} 秒\n", data.remaining_seconds());

    // 4. 用户点击链接后验证
    match engine.validate(&data.token) {
        Ok(email) => println!("✓ 验证成功，用户: {}", email),
        Err(e) => println!("✗ 验证失败: {}", e),
    }

    // 5. 篡改后的 token
    let mut tampered = data.token.clone();
    let last = if tampered.ends_with('A') { 'B' } else { 'A' };
    tampered.pop();
    tampered.push(last);
    match engine.validate(&tampered) {
        Ok(email) => println!("✗ 篡改的 token 被接受: {}", email),
        Err(e) => println!("✓ 篡改的 token 被拒绝: {}", e),
    }

    // 6. 已过期的 token
    let expired = engine
        .generate("alice@example.com", Utc::now() - Duration::minutes(1))
        .map(|token| engine.validate(&token));
    match expired {
        Ok(Err(e)) => println!("✓ 过期的 token 被拒绝: {}", e),
        Ok(Ok(_)) => println!("✗ 过期的 token 被接受"),
        Err(e) => println!("生成 token 失败: {}", e),
    }

    // 7. 其他密钥的引擎无法验证
    if let Ok(other) = TokenEngineConfig::generate().and_then(|c| c.build()) {
        match other.validate(&data.token) {
            Ok(_) => println!("✗ 其他引擎接受了 token"),
            Err(_) => println!("✓ 其他引擎拒绝了 token"),
        }
    }

    // 8. 只签名不加密的引擎
    let plain = TokenEngine::new(&[0x42; 32]).and_then(|engine| {
        let data = engine.issue("bob@example.com")?;
        engine.validate(&data.token)
    });
    match plain {
        Ok(email) => println!("✓ 只签名模式验证成功: {}", email),
        Err(e) => println!("✗ 只签名模式失败: {}", e),
    }

    println!("\n=== 示例完成 ===");
}
