use async_trait::async_trait;

use crate::error::CalcError;
use crate::price::{PriceSnapshot, RawPriceSnapshot};
use crate::providers::PriceSnapshotProvider;

/// Default `PriceSnapshotProvider`: fetches the upstream price document over HTTP and gates
/// usability on its `success` flag, per §6. Grounded on the teacher's `request_page`/`reqwest`
/// usage in `request.rs`, simplified to a single non-paginated document fetch.
pub struct HttpPriceProvider {
    url: String,
    client: reqwest::Client,
}

impl HttpPriceProvider {
    pub fn new(url: impl Into<String>) -> Self {
        HttpPriceProvider {
            url: url.into(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl PriceSnapshotProvider for HttpPriceProvider {
    async fn fetch(&self) -> Result<PriceSnapshot, CalcError> {
        tracing::debug!(url = %self.url, "fetching price snapshot");

        let raw: RawPriceSnapshot = self.client.get(&self.url).send().await?.json().await?;

        PriceSnapshot::from_raw(raw).ok_or_else(|| {
            CalcError::UpstreamUnavailable("price feed reported success=false".to_string())
        })
    }
}
