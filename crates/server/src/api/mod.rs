pub mod audit;
pub mod handlers;
pub mod routes;
pub mod sectors;
pub mod turns;
pub mod ws;

pub use routes::create_router;
