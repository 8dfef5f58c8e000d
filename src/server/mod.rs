pub mod handler;
pub mod render;
pub mod serve;

pub use handler::{DashboardError, DashboardHandler};
pub use serve::DashboardServer;
