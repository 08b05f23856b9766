pub mod agents;
pub mod auth;
pub mod big_movers;
pub mod dashboard;
pub mod districts;
pub mod leaderboard;
pub mod middleware;
