pub mod audit;

pub use hirebase_infra::{request_id_middleware, security_headers_middleware};
