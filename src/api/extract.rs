//! # 请求体提取
//!
//! `Json` 的拒绝响应是纯文本且状态码不一（415/422/400），这里统一转换为
//! 400 `VALIDATION_ERROR` 信封。

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use axum::response::Response;
use serde::de::DeserializeOwned;

use crate::api::response;
use crate::error::AppError;
use crate::{ldebug, logging::{LogComponent, LogStage}};

/// JSON 请求体，解析失败时返回统一的错误信封
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(response::app_error(body_error(&rejection))),
        }
    }
}

fn body_error(rejection: &JsonRejection) -> AppError {
    ldebug!(
        "system",
        LogStage::RequestStart,
        LogComponent::Api,
        "json_rejected",
        &format!("请求体解析失败: {}", rejection.body_text())
    );

    let message = match rejection {
        JsonRejection::MissingJsonContentType(_) => "expected an application/json body",
        _ => "invalid request body",
    };
    AppError::validation(message, None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::{StatusCode, header};
    use serde::Deserialize;
    use serde_json::Value;

    #[derive(Debug, Deserialize)]
    struct Payload {
        name: String,
    }

    fn json_request(body: &'static str) -> Request {
        axum::http::Request::post("/")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    async fn rejection_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_valid_body_is_extracted() {
        let ApiJson(payload) = ApiJson::<Payload>::from_request(json_request(r#"{"name":"ada"}"#), &())
            .await
            .unwrap();
        assert_eq!(payload.name, "ada");
    }

    #[tokio::test]
    async fn test_rejections_use_error_envelope() {
        let cases = [
            json_request(r#"{"other":1}"#),
            json_request("not json"),
            axum::http::Request::post("/")
                .body(Body::from(r#"{"name":"ada"}"#))
                .unwrap(),
        ];

        for request in cases {
            let response = ApiJson::<Payload>::from_request(request, &())
                .await
                .unwrap_err();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);

            let body = rejection_body(response).await;
            assert_eq!(body["success"], false);
            assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        }
    }
}
