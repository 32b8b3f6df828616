pub mod catalog;
pub mod handlers;
pub mod import;
pub mod routes;

pub use routes::create_router;
