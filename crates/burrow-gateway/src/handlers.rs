mod health;
mod url;

pub use health::health_handler;
pub use url::{create_link_handler, redirect_handler};
