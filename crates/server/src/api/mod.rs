pub mod cache;
pub mod catalog;
pub mod downloads;
pub mod handlers;
pub mod jobs;
pub mod middleware;
pub mod routes;

pub use routes::create_router;
