//! # 确认链接签名
//!
//! 无状态签名：`sha256(secret + id + secret)` 的大写十六进制摘要。
//! 校验不设过期时间，与来源行为一致；比较必须恒定时间。

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// 确认链接签名器
#[derive(Debug, Clone)]
pub struct LinkSigner {
    secret: String,
}

impl LinkSigner {
    pub fn new<S: Into<String>>(secret: S) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// 为身份 id 生成签名
    pub fn sign(&self, identity_id: i32) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.secret.as_bytes());
        hasher.update(identity_id.to_string().as_bytes());
        hasher.update(self.secret.as_bytes());
        hex::encode_upper(hasher.finalize())
    }

    /// 校验签名；大小写不敏感，恒定时间比较
    pub fn verify(&self, identity_id: i32, signature: &str) -> bool {
        let expected = self.sign(identity_id);
        let provided = signature.to_ascii_uppercase();
        expected.as_bytes().ct_eq(provided.as_bytes()).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signer() -> LinkSigner {
        LinkSigner::new("0123456789abcdef0123456789abcdef")
    }

    #[test]
    fn sign_is_deterministic_per_id() {
        assert_eq!(signer().sign(42), signer().sign(42));
        assert_ne!(signer().sign(42), signer().sign(43));
    }

    #[test]
    fn verify_accepts_any_case() {
        let sig = signer().sign(7);
        assert!(signer().verify(7, &sig));
        assert!(signer().verify(7, &sig.to_ascii_lowercase()));
    }

    #[test]
    fn verify_rejects_single_char_mutation() {
        let mut sig = signer().sign(7).into_bytes();
        sig[0] = if sig[0] == b'A' { b'B' } else { b'A' };
        assert!(!signer().verify(7, std::str::from_utf8(&sig).unwrap()));
        // id 变动同样使校验失败
        let sig = signer().sign(7);
        assert!(!signer().verify(8, &sig));
    }

    #[test]
    fn verify_rejects_wrong_length() {
        assert!(!signer().verify(7, ""));
        assert!(!signer().verify(7, "ABCDEF"));
    }

    #[test]
    fn different_secrets_produce_different_signatures() {
        let other = LinkSigner::new("another-secret-key-0123456789abc");
        assert_ne!(signer().sign(1), other.sign(1));
    }
}
