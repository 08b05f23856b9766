pub mod cognito;
pub mod config;
pub mod cookies;
pub mod pkce;
pub mod session;
pub mod session_store;
pub mod state;
pub mod upstream;
