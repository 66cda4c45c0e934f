use std::fmt;

use anyhow::anyhow;

use actix_web::{
    HttpResponse,
    ResponseError,
    error::BlockingError,
    http::StatusCode
};


#[derive(Debug)]
pub struct Error {
    status_code: StatusCode,
    err: anyhow::Error,
}

impl Error {
    fn internal(err: anyhow::Error) -> Self {
        Self {
            status_code: StatusCode::INTERNAL_SERVER_ERROR,
            err,
        }
    }
    fn bad_request(err: anyhow::Error) -> Self {
        Self {
            status_code: StatusCode::BAD_REQUEST,
            err
        }
    }
    fn forbidden(err: anyhow::Error) -> Self {
        Self {
            status_code: StatusCode::FORBIDDEN,
            err
        }
    }
}

pub fn bad_token() -> Error {
    Error::forbidden(anyhow!("Submission token missing or invalid"))
}
pub fn value_parsing_err<E: Into<anyhow::Error>>(err: E) -> Error {
    Error::bad_request(err.into())
}
pub fn duplicate_field(name: String) -> Error {
    Error::bad_request(anyhow!("Field '{0}' declared more than once", name))
}
pub fn from_blocking(err: BlockingError<Error>) -> Error {
    match err {
        BlockingError::Error(err) => err,
        BlockingError::Canceled => Error::internal(anyhow!("Worker pool canceled the call")),
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.err.fmt(f)
    }
}

impl<E: Into<anyhow::Error> + Send> From<E> for Error {
    fn from(err: E) -> Self {
        Self::internal(err.into())
    }
}

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        self.status_code
    }

    // Status code only; failure detail stays in the server log.
    fn error_response(&self) -> HttpResponse {
        let status_code = self.status_code();
        if status_code.is_server_error() {
            log::error!("Request failed: {:#}", self.err);
        }
        HttpResponse::build(status_code).finish()
    }
}
