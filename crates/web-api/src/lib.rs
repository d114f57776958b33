pub mod error;
pub mod handlers;
pub mod server;
pub mod state;

pub use error::ApiError;
pub use handlers::{InsightsRequest, InsightsResponse, RecentGameResponse};
pub use server::ApiServer;
pub use state::AppState;
