pub mod auth;
pub mod request_id;

pub use request_id::{make_span_with_request_id, request_id_middleware, RequestId};
