/// Security module for authentication
///
/// - **password**: Argon2id password hashing and verification
/// - **jwt**: access/refresh/verification token issuance and validation
pub mod jwt;
pub mod password;

pub use jwt::{TokenPair, TokenService};
pub use password::{hash_password, verify_password};
