//! HTTP and SOAP transport
//!
//! - [`RestClient`]: GET/POST against one service's base URL, with an
//!   optional [`ResponseCache`]
//! - [`SoapClient`]: SOAP 1.1 calls built on the REST client
//! - [`fetch_all`]: bounded concurrent GETs of independent URLs

pub mod batch;
pub mod cache;
pub mod response;
pub mod rest;
pub mod soap;

pub use batch::fetch_all;
pub use cache::{CacheStats, CachedResponse, ResponseCache};
pub use response::{parse_next_link, RawResponse};
pub use rest::{RestClient, RestClientBuilder};
pub use soap::SoapClient;
