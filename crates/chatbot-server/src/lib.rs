pub mod envelope;
pub mod logging;
pub mod routes;
pub mod state;
pub mod widget;

pub use routes::router;
pub use state::AppState;
