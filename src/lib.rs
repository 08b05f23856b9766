pub mod handlers;
pub mod models;
pub mod routes;
pub mod utils;

pub use routes::{build_router, make_app};
pub use utils::{config::Config, state::AppState};
