//! HTTP request handlers for the demo pages and shared state.

pub mod html;
pub mod http;
pub mod pages;

pub use http::*;
pub use pages::*;
