//! REST-over-HTTP client for the Elasticsearch-compatible index store
//! (§4.4). `IndexGateway` is the only component that knows how to talk to
//! the cluster; everything above it works in terms of [`LogDocument`]s and
//! [`SearchHit`]s.

mod client;
mod types;

pub use client::IndexGateway;
pub use types::{BulkOperation, BulkResponse, SearchHit};
