pub mod error;
pub mod fetcher;
pub mod http;
pub mod mdblist;
pub mod provider;
pub mod traits;
pub mod trakt;

pub use error::SourceError;
pub use fetcher::{dedup_by_identity, ListFetcher};
pub use http::ReqwestFetcher;
pub use provider::Provider;
pub use traits::{HttpFetch, ListRequest};
