pub mod jwt;
pub mod models;
pub mod password;

pub use jwt::{JwtClaims, JwtService};
pub use models::{LoginRequest, TokenResponse};
pub use password::{hash_password, verify_password};
