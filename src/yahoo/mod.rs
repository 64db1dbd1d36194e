pub mod client;

pub use client::{parse_chart, YahooClient, DEFAULT_BASE_URL};
