pub mod handlers;
mod service;

pub use service::{gravatar_url, UserService};
