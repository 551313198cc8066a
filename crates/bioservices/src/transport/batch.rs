//! Concurrent fetching of independent URLs

use crate::error::Result;
use crate::transport::response::RawResponse;
use crate::transport::rest::RestClient;
use bioservices_common::ResponseFormat;
use futures::stream::{self, StreamExt};

/// Fetch every URL with at most `workers` requests in flight
///
/// Results come back in input order, one per URL. A failed request does
/// not stop the others.
pub async fn fetch_all<S: AsRef<str>>(
    client: &RestClient,
    urls: &[S],
    workers: usize,
    format: ResponseFormat,
) -> Vec<Result<RawResponse>> {
    let workers = workers.max(1);
    tracing::debug!(service = %client.name(), count = urls.len(), workers, "Fetching URLs");

    stream::iter(urls.iter().map(|url| client.get_url(url.as_ref(), format)))
        .buffered(workers)
        .collect()
        .await
}

impl RestClient {
    /// [`fetch_all`] with the client's configured concurrency
    /// (`general.concurrency`)
    pub async fn fetch_all<S: AsRef<str>>(
        &self,
        urls: &[S],
        format: ResponseFormat,
    ) -> Vec<Result<RawResponse>> {
        fetch_all(self, urls, self.concurrency(), format).await
    }
}
