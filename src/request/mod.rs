mod client;
mod error;

pub use client::OkxClient;
pub use error::FetchError;
