//! External collaborators consumed by discovery: endpoint sources and HTTP fetchers.

mod endpoint_source;
mod http;

pub use endpoint_source::{EndpointSource, StaticEndpointSource};
pub use http::{FetchResponse, HttpFetcher};

#[cfg(feature = "http")]
pub use http::{HttpAuth, ReqwestFetcher, ReqwestFetcherBuilder};
