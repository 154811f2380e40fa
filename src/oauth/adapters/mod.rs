//! # 服务商适配器实现
//!
//! 每个服务商一个文件；端点常量与字段映射以各服务商线上协议为准

pub mod facebook;
pub mod github;
pub mod google;
pub mod qq;
pub mod weibo;

pub use facebook::FacebookAdapter;
pub use github::GithubAdapter;
pub use google::GoogleAdapter;
pub use qq::QqAdapter;
pub use weibo::WeiboAdapter;

use serde_json::Value;

/// 从 form-urlencoded 响应体中取字段
pub(crate) fn form_field(body: &str, key: &str) -> Option<String> {
    url::form_urlencoded::parse(body.as_bytes())
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
}

/// JSON 字段转字符串；服务商对同一字段时而给字符串时而给数字
pub(crate) fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// 取非空字符串字段
pub(crate) fn non_empty_str(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn form_field_parses_urlencoded_body() {
        let body = "access_token=e72e16c7e42f292c6912e7710c838347&scope=user&token_type=bearer";
        assert_eq!(
            form_field(body, "access_token").as_deref(),
            Some("e72e16c7e42f292c6912e7710c838347")
        );
        assert_eq!(form_field(body, "refresh_token"), None);
    }

    #[test]
    fn value_to_string_accepts_numbers() {
        let v: Value = serde_json::json!({"id": 583231, "login": "octocat"});
        assert_eq!(value_to_string(&v["id"]).as_deref(), Some("583231"));
        assert_eq!(value_to_string(&v["login"]).as_deref(), Some("octocat"));
        assert_eq!(value_to_string(&v["missing"]), None);
    }
}
