//! Route handlers.
//!
//! Each handler turns a request (plus whatever the router captured) into a
//! `Response`. Routing-level failures become ordinary error responses here;
//! only parse failures upstream terminate a connection without one.

use std::path::PathBuf;

use tracing::{debug, error, warn};

use crate::http::files::{CreateOutcome, FileStore};
use crate::http::negotiation::{ContentEncoding, negotiate};
use crate::http::request::Request;
use crate::http::response::{Response, StatusCode};
use crate::http::router::{Outcome, Router};

/// Shared, read-only state for answering requests.
#[derive(Debug, Clone, Default)]
pub struct Service {
    router: Router,
    files: Option<FileStore>,
}

impl Service {
    pub fn new(directory: Option<PathBuf>) -> Self {
        Self {
            router: Router::new(),
            files: directory.map(FileStore::new),
        }
    }

    /// Routes `req` and runs the matching handler.
    pub async fn handle(&self, req: &Request) -> Response {
        let outcome = self.router.resolve(req.method, &req.target);

        let response = match outcome {
            Outcome::Root => root(),
            Outcome::Echo(text) => echo(text, negotiate(&req.headers)),
            Outcome::UserAgent => user_agent(req),
            Outcome::ReadFile(name) => self.read_file(name).await,
            Outcome::CreateFile(name) => self.create_file(name, &req.body).await,
            Outcome::MethodNotAllowed => Response::empty(StatusCode::MethodNotAllowed),
            Outcome::NotFound => Response::not_found(),
        };

        debug!(
            method = req.method.as_str(),
            target = %req.target,
            status = response.status.as_u16(),
            "Request handled"
        );

        response
    }

    async fn read_file(&self, name: &str) -> Response {
        let Some(store) = &self.files else {
            return Response::not_found();
        };

        match store.read(name).await {
            Ok(Some(bytes)) => Response::octet_stream(bytes),
            Ok(None) => Response::not_found(),
            Err(e) => {
                error!(file = name, error = %e, "Failed to read file");
                Response::internal_error()
            }
        }
    }

    async fn create_file(&self, name: &str, body: &[u8]) -> Response {
        let Some(store) = &self.files else {
            return Response::not_found();
        };

        match store.create(name, body).await {
            Ok(CreateOutcome::Created) => Response::empty(StatusCode::Created),
            Ok(CreateOutcome::AlreadyExists) => Response::empty(StatusCode::Conflict),
            Ok(CreateOutcome::Rejected) => {
                warn!(file = name, "Rejected file name");
                Response::empty(StatusCode::BadRequest)
            }
            Err(e) => {
                error!(file = name, error = %e, "Failed to create file");
                Response::internal_error()
            }
        }
    }
}

/// `GET /`: bare 200.
pub fn root() -> Response {
    Response::ok()
}

/// `/echo/{text}`: the captured text as `text/plain`, gzipped when negotiated.
pub fn echo(text: &str, encoding: ContentEncoding) -> Response {
    Response::text(StatusCode::Ok, text, encoding)
}

/// `/user-agent`: the client's User-Agent header as `text/plain`.
///
/// A request without the header gets an empty body.
pub fn user_agent(req: &Request) -> Response {
    let agent = req.user_agent().unwrap_or_default();
    Response::text(StatusCode::Ok, agent, ContentEncoding::Identity)
}
