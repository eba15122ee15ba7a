//! Node authentication.
//!
//! Each node holds a random secret issued at creation (or rotation). Only the
//! SHA-256 digest is stored; nodes present the secret as a URL-safe base64
//! bearer token when checking in.

pub mod bearer;
pub mod secret;

pub use bearer::{AuthError, parse_bearer_secret};
pub use secret::{NodeSecret, SECRET_LEN, SecretHash, hash_secret};
