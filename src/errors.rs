use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use serde_json::json;
use thiserror::Error;

use crate::domain::errors::DomainError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Malformed request data caught before it reaches a service.
    #[error("Invalid input: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<actix_web::error::BlockingError> for AppError {
    fn from(e: actix_web::error::BlockingError) -> Self {
        AppError::Internal(e.to_string())
    }
}

impl AppError {
    fn kind(&self) -> &'static str {
        match self {
            AppError::Domain(e) => e.kind(),
            AppError::BadRequest(_) => "InvalidInput",
            AppError::Internal(_) => "Internal",
        }
    }
}

impl actix_web::ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Domain(e) => match e {
                DomainError::NotFound { .. } => StatusCode::NOT_FOUND,
                DomainError::Conflict(_)
                | DomainError::CodeGenerationExhausted { .. }
                | DomainError::InsufficientStock { .. } => StatusCode::CONFLICT,
                DomainError::InvalidInput(_) | DomainError::PriceMismatch { .. } => {
                    StatusCode::BAD_REQUEST
                }
                DomainError::InvalidTransition { .. } | DomainError::InvalidState { .. } => {
                    StatusCode::UNPROCESSABLE_ENTITY
                }
                DomainError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            log::error!("{}", self);
            return HttpResponse::build(status).json(json!({
                "error": "Internal",
                "message": "Internal server error"
            }));
        }

        let mut body = json!({
            "error": self.kind(),
            "message": self.to_string(),
        });
        match self {
            AppError::Domain(DomainError::InsufficientStock {
                product_id,
                color_id,
                size_id,
                requested,
                available,
            }) => {
                body["productId"] = json!(product_id);
                body["colorId"] = json!(color_id);
                body["sizeId"] = json!(size_id);
                body["requested"] = json!(requested);
                body["available"] = json!(available);
            }
            AppError::Domain(DomainError::PriceMismatch {
                expected, supplied, ..
            }) => {
                body["expected"] = json!(expected.to_string());
                body["supplied"] = json!(supplied.to_string());
            }
            _ => {}
        }
        HttpResponse::build(status).json(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::OrderStatus;
    use actix_web::body::to_bytes;
    use actix_web::ResponseError;
    use bigdecimal::BigDecimal;

    fn status_of(e: DomainError) -> StatusCode {
        AppError::from(e).error_response().status()
    }

    #[test]
    fn not_found_returns_404() {
        assert_eq!(
            status_of(DomainError::not_found("Order", 7)),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn conflicts_return_409() {
        assert_eq!(
            status_of(DomainError::Conflict("dup".to_string())),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(DomainError::CodeGenerationExhausted { attempts: 10 }),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn bad_input_returns_400() {
        assert_eq!(
            status_of(DomainError::InvalidInput("bad value".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(DomainError::PriceMismatch {
                subject: "order total".to_string(),
                expected: BigDecimal::from(110),
                supplied: BigDecimal::from(100),
            }),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::BadRequest("x".to_string()).error_response().status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn state_machine_violations_return_422() {
        assert_eq!(
            status_of(DomainError::InvalidTransition {
                from: OrderStatus::Shipped,
                to: OrderStatus::Pending,
            }),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status_of(DomainError::InvalidState {
                status: OrderStatus::Delivered,
                operation: "edit shipping",
            }),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn internal_error_returns_500() {
        let err = AppError::Internal("something went wrong".to_string());
        assert_eq!(
            err.error_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_of(DomainError::Internal("db down".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn internal_error_display() {
        assert_eq!(
            AppError::Internal("msg".to_string()).to_string(),
            "Internal error: msg"
        );
    }

    #[actix_web::test]
    async fn insufficient_stock_body_carries_counts() {
        let err = AppError::from(DomainError::InsufficientStock {
            product_id: 4,
            color_id: Some(1),
            size_id: None,
            requested: 3,
            available: 1,
        });
        let resp = err.error_response();
        assert_eq!(resp.status(), StatusCode::CONFLICT);

        let bytes = to_bytes(resp.into_body()).await.expect("body");
        let body: serde_json::Value = serde_json::from_slice(&bytes).expect("json");
        assert_eq!(body["error"], "InsufficientStock");
        assert_eq!(body["productId"], 4);
        assert_eq!(body["requested"], 3);
        assert_eq!(body["available"], 1);
        assert!(body["sizeId"].is_null());
    }

    #[actix_web::test]
    async fn internal_body_hides_detail() {
        let resp = AppError::from(DomainError::Internal("password=hunter2".to_string()))
            .error_response();
        let bytes = to_bytes(resp.into_body()).await.expect("body");
        let text = String::from_utf8(bytes.to_vec()).expect("utf8");
        assert!(!text.contains("hunter2"));
    }
}
