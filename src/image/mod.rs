//! Image acquisition and memoization.
//!
//! [`ImageCache`] resolves image URLs to self-contained data URLs, sharing
//! one physical fetch among all concurrent and subsequent callers for the
//! same URL. The network side is abstracted behind the [`ImageFetcher`]
//! trait so tests can inject fake transports.

pub mod cache;
pub mod client;

pub use cache::ImageCache;
pub use client::{FetchError, ImageFetcher, ImageResponse, ReqwestImageFetcher};
