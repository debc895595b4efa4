//! Mock AWS HTTP endpoints.
//!
//! Two GET-only services back a cfn-init run: the instance-metadata endpoint
//! (path-resolved against a [`MetadataNode`](crate::metadata::MetadataNode)
//! tree) and the describe-stack-resource endpoint (a fixed JSON blob,
//! path-insensitive). Both run on [`HttpServer`], a raw-TCP listener with an
//! explicit start/wait/shutdown lifecycle.

mod handlers;
mod server;

pub use handlers::{InstanceMetadataHandler, StackResourceHandler};
pub use server::HttpServer;

/// Routing seam between the transport and the two endpoint semantics.
pub trait RequestHandler: Send + Sync + 'static {
    /// Produce the response for a GET of `path`.
    fn handle(&self, path: &str) -> HttpResponse;
}

/// A minimal HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub content_type: &'static str,
    pub body: String,
}

impl HttpResponse {
    /// 200 with a `text/plain` body.
    pub fn ok_text(body: impl Into<String>) -> Self {
        Self { status: 200, content_type: "text/plain", body: body.into() }
    }

    /// 200 with an `application/json` body.
    pub fn ok_json(body: impl Into<String>) -> Self {
        Self { status: 200, content_type: "application/json", body: body.into() }
    }

    /// 404 with an empty body.
    pub fn not_found() -> Self {
        Self { status: 404, content_type: "text/plain", body: String::new() }
    }

    /// 405 for anything other than GET.
    pub fn method_not_allowed() -> Self {
        Self { status: 405, content_type: "text/plain", body: String::new() }
    }

    pub(crate) fn reason(&self) -> &'static str {
        match self.status {
            200 => "OK",
            400 => "Bad Request",
            404 => "Not Found",
            405 => "Method Not Allowed",
            _ => "Internal Server Error",
        }
    }
}
