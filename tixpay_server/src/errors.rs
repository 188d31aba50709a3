use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use thiserror::Error;
use tixpay_engine::TicketingError;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Invalid request. {0}")]
    InvalidRequest(String),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("The request conflicts with the current state. {0}")]
    Conflict(String),
    #[error("The service cannot handle this request right now. {0}")]
    Unavailable(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}

impl From<TicketingError> for ServerError {
    fn from(e: TicketingError) -> Self {
        match e {
            TicketingError::ValidationError(_) => Self::InvalidRequest(e.to_string()),
            TicketingError::EventNotFound(_) |
            TicketingError::CustomerNotFound(_) |
            TicketingError::TransactionNotFound(_) => Self::NoRecordFound(e.to_string()),
            TicketingError::InsufficientQuota { .. } |
            TicketingError::AlreadyProcessed(_) |
            TicketingError::DuplicateEvidence(_) |
            TicketingError::AddressAlreadyRegistered(_) => Self::Conflict(e.to_string()),
            TicketingError::NoAddressAvailable => Self::Unavailable(e.to_string()),
            TicketingError::DatabaseError(_) |
            TicketingError::TicketCodeCollision(_) |
            TicketingError::RateUnavailable(_) => Self::BackendError(e.to_string()),
        }
    }
}
