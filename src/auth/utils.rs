//! # 认证工具函数

use axum::http::{HeaderMap, header::AUTHORIZATION};

/// 认证工具类
pub struct AuthUtils;

impl AuthUtils {
    /// `从HTTP头中提取Authorization头的值`
    ///
    /// 非 ASCII 的头值视为不存在。
    #[must_use]
    pub fn extract_authorization_header(headers: &HeaderMap) -> Option<String> {
        headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
    }

    /// `从Authorization头中提取Bearer` token
    ///
    /// # 返回
    /// - `Some(&str)`: Bearer token部分
    /// - `None`: 不是 `Bearer ` 前缀，或 token 为空
    #[must_use]
    pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
        auth_header
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|token| !token.is_empty())
    }

    /// 规范化邮箱：去除首尾空白并转为小写
    #[must_use]
    pub fn normalize_email(email: &str) -> String {
        email.trim().to_lowercase()
    }

    /// Sanitize token for logging
    #[must_use]
    pub fn sanitize_token_for_logging(token: &str) -> String {
        let tail_start = token.len().saturating_sub(8);
        match (token.get(..8), token.get(tail_start..)) {
            (Some(head), Some(tail)) if token.len() > 20 => format!("{head}***{tail}"),
            _ => "***".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use rstest::rstest;

    #[rstest]
    #[case("Bearer abc.def.ghi", Some("abc.def.ghi"))]
    #[case("Bearer   padded  ", Some("padded"))]
    #[case("Bearer ", None)]
    #[case("Bearer", None)]
    #[case("Token abc", None)]
    #[case("bearer abc", None)]
    #[case("", None)]
    fn test_extract_bearer_token(#[case] header: &str, #[case] expected: Option<&str>) {
        assert_eq!(AuthUtils::extract_bearer_token(header), expected);
    }

    #[test]
    fn test_extract_authorization_header() {
        let mut headers = HeaderMap::new();
        assert_eq!(AuthUtils::extract_authorization_header(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        assert_eq!(
            AuthUtils::extract_authorization_header(&headers).as_deref(),
            Some("Bearer abc")
        );
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(
            AuthUtils::normalize_email("  Player@Example.COM "),
            "player@example.com"
        );
    }

    #[test]
    fn test_sanitize_token_for_logging() {
        assert_eq!(
            AuthUtils::sanitize_token_for_logging("eyJhbGciOiJIUzI1NiJ9.payload.signature"),
            "eyJhbGci***ignature"
        );
        assert_eq!(AuthUtils::sanitize_token_for_logging("short"), "***");
    }
}
