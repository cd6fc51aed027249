pub mod client;
pub mod response;

pub use client::{AlphaVantageClient, DEFAULT_BASE_URL};
