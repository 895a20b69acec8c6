//! Authentication for the account API.
//!
//! This module provides:
//! - Session token (JWT) creation and validation
//! - Session cookie parsing and construction
//! - bcrypt password hashing
//! - One-time tokens for email verification and password reset
//! - The session gate (`gate::enforce`) and its declared policies

mod cookies;
pub mod gate;
mod jwt;
pub mod one_time;
mod password;
pub mod types;

pub use cookies::{build_auth_cookie, clear_auth_cookie, extract_token_from_cookie};
pub use gate::{enforce, Check, CurrentUser, Guard, Policy};
pub use jwt::{create_token, validate_token};
pub use one_time::TokenKind;
pub use password::{hash_password, verify_password};
pub use types::{AuthConfig, Claims};
