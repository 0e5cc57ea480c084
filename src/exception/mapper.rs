use axum::{
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::error::Error;
use strum_macros::{Display, EnumString};

use super::{ErrorInfo, ExceptionClassification};

const REST_FALLBACK_BODY: &str =
    r#"{"code":"JSON_PROCESSING_ERROR","message":"Internal server error"}"#;

const GRAPHQL_FALLBACK_BODY: &str = r#"{"errors":[{"message":"Internal server error","extensions":{"errorType":"INTERNAL_SERVER_ERROR","classification":"INTERNAL_ERROR","code":"JSON_PROCESSING_ERROR"}}]}"#;

/// A rendered error: status code plus serialized JSON body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorResponse {
    pub status: StatusCode,
    pub body: String,
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        (
            self.status,
            [(
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/json;charset=UTF-8"),
            )],
            self.body,
        )
            .into_response()
    }
}

/// Shape of the JSON body written for a handled error.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum ResponseFormat {
    /// `{"code": ..., "message": ...}`
    #[default]
    Rest,
    /// `{"errors": [{"message": ..., "extensions": {...}}]}`
    Graphql,
}

impl ResponseFormat {
    pub fn render(self, classification: ExceptionClassification) -> ErrorResponse {
        let info = ErrorInfo::from(classification);
        let body = match self {
            ResponseFormat::Rest => rest_body(&info),
            ResponseFormat::Graphql => graphql_body(&info),
        };
        ErrorResponse {
            status: info.http_status,
            body,
        }
    }
}

#[derive(Serialize)]
struct RestErrorBody<'a> {
    code: &'a str,
    message: &'a str,
}

#[derive(Serialize)]
struct GraphqlErrorBody<'a> {
    errors: [GraphqlError<'a>; 1],
}

#[derive(Serialize)]
struct GraphqlError<'a> {
    message: &'a str,
    extensions: GraphqlExtensions<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GraphqlExtensions<'a> {
    error_type: &'a str,
    classification: &'a str,
    code: &'a str,
}

pub fn rest_body(info: &ErrorInfo) -> String {
    let body = RestErrorBody {
        code: info.code,
        message: info.message,
    };
    to_json_or(&body, REST_FALLBACK_BODY)
}

pub fn graphql_body(info: &ErrorInfo) -> String {
    let body = GraphqlErrorBody {
        errors: [GraphqlError {
            message: info.message,
            extensions: GraphqlExtensions {
                error_type: info.error_type,
                classification: info.classification.as_ref(),
                code: info.code,
            },
        }],
    };
    to_json_or(&body, GRAPHQL_FALLBACK_BODY)
}

/// Serialize `value`, answering with the fixed `fallback` literal on failure.
fn to_json_or<T: Serialize>(value: &T, fallback: &'static str) -> String {
    match serde_json::to_string(value) {
        Ok(json) => json,
        Err(e) => {
            tracing::warn!(error = %e, "failed to serialize error body, using fallback");
            fallback.to_owned()
        }
    }
}

/// Mapping function producing the REST error shape for any error.
pub fn json_body_mapping()
-> impl Fn(&(dyn Error + Send + Sync + 'static)) -> ErrorResponse + Clone + Send + Sync + 'static {
    |error: &(dyn Error + Send + Sync + 'static)| {
        ResponseFormat::Rest.render(ExceptionClassification::of(error))
    }
}

/// Mapping function producing the GraphQL error envelope for any error.
pub fn graphql_json_body_mapping()
-> impl Fn(&(dyn Error + Send + Sync + 'static)) -> ErrorResponse + Clone + Send + Sync + 'static {
    |error: &(dyn Error + Send + Sync + 'static)| {
        ResponseFormat::Graphql.render(ExceptionClassification::of(error))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guard::SecurityError;

    #[derive(Debug, thiserror::Error)]
    #[error("Some error")]
    struct RuntimeError;

    struct Unserializable;

    impl Serialize for Unserializable {
        fn serialize<S: serde::Serializer>(&self, _serializer: S) -> Result<S::Ok, S::Error> {
            Err(serde::ser::Error::custom("not serializable"))
        }
    }

    #[test]
    fn test_rest_authentication_error() {
        let mapper = json_body_mapping();
        let response = mapper(&SecurityError::unauthenticated("Invalid credentials"));

        assert_eq!(response.status, StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.body,
            r#"{"code":"AUTHENTICATION_ERROR","message":"Authentication required"}"#
        );
    }

    #[test]
    fn test_rest_access_denied() {
        let mapper = json_body_mapping();
        let response = mapper(&SecurityError::forbidden("Access denied"));

        assert_eq!(response.status, StatusCode::FORBIDDEN);
        assert_eq!(
            response.body,
            r#"{"code":"ACCESS_DENIED","message":"Access denied"}"#
        );
    }

    #[test]
    fn test_rest_unclassified_error() {
        let mapper = json_body_mapping();
        let response = mapper(&RuntimeError);

        assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            response.body,
            r#"{"code":"INTERNAL_ERROR","message":"Internal server error"}"#
        );
    }

    #[test]
    fn test_graphql_authentication_error() {
        let mapper = graphql_json_body_mapping();
        let response = mapper(&SecurityError::unauthenticated("Invalid credentials"));

        assert_eq!(response.status, StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.body,
            r#"{"errors":[{"message":"Authentication required","extensions":{"errorType":"AUTHENTICATION_REQUIRED","classification":"UNAUTHENTICATED","code":"AUTHENTICATION_ERROR"}}]}"#
        );
    }

    #[test]
    fn test_graphql_access_denied() {
        let mapper = graphql_json_body_mapping();
        let response = mapper(&SecurityError::forbidden("Access denied"));

        assert_eq!(response.status, StatusCode::FORBIDDEN);
        assert_eq!(
            response.body,
            r#"{"errors":[{"message":"Access denied","extensions":{"errorType":"ACCESS_DENIED","classification":"FORBIDDEN","code":"ACCESS_DENIED"}}]}"#
        );
    }

    #[test]
    fn test_graphql_unclassified_error() {
        let mapper = graphql_json_body_mapping();
        let response = mapper(&RuntimeError);

        assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            response.body,
            r#"{"errors":[{"message":"Internal server error","extensions":{"errorType":"INTERNAL_SERVER_ERROR","classification":"INTERNAL_ERROR","code":"INTERNAL_ERROR"}}]}"#
        );
    }

    #[test]
    fn test_serialization_failure_uses_fallback() {
        assert_eq!(to_json_or(&Unserializable, REST_FALLBACK_BODY), REST_FALLBACK_BODY);
        assert_eq!(
            to_json_or(&Unserializable, GRAPHQL_FALLBACK_BODY),
            GRAPHQL_FALLBACK_BODY
        );
    }

    #[test]
    fn test_response_format_parsing() {
        assert_eq!("graphql".parse::<ResponseFormat>().unwrap(), ResponseFormat::Graphql);
        assert_eq!("REST".parse::<ResponseFormat>().unwrap(), ResponseFormat::Rest);
        assert!("xml".parse::<ResponseFormat>().is_err());
    }

    #[test]
    fn test_into_response_sets_json_content_type() {
        let response = ResponseFormat::Rest
            .render(ExceptionClassification::Forbidden)
            .into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            HeaderValue::from_static("application/json;charset=UTF-8")
        );
    }
}
