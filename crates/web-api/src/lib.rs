pub mod handlers;
pub mod server;

pub use handlers::ErrorBody;
pub use server::ApiServer;
