use actix_web::{dev::Payload, web, FromRequest, HttpRequest};
use futures::future::{err, ok, Ready};

use crate::AppState;

/// Extractor proving the request carried the configured submission token.
/// The header must hold either the bare token or `bearer <token>`; anything
/// else is refused before the handler body runs.
pub struct Submitter;

impl FromRequest for Submitter {
    type Error = crate::Error;
    type Future = Ready<Result<Self, Self::Error>>;
    type Config = ();

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let state = match req.app_data::<web::Data<AppState>>() {
            Some(state) => state,
            None => return err(crate::error::bad_token()),
        };
        let auth = req
            .headers()
            .get("Authorization")
            .and_then(|value| value.to_str().ok())
            .unwrap_or("");

        let token = &state.config.submission_token;
        if auth == token || auth == format!("bearer {}", token) {
            ok(Submitter)
        } else {
            err(crate::error::bad_token())
        }
    }
}
