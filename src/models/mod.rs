pub mod claims;
pub mod error;
pub mod session;
pub mod user;
