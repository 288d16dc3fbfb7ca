//! Shared HTTP plumbing.
//!
//! - [`HttpClient`]: reqwest client with the configured timeout, shared by the
//!   search API client and the image loader

mod http;

pub use http::HttpClient;
