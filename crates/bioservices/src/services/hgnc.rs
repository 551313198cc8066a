//! HGNC gene nomenclature REST service (`rest.genenames.org`)

use crate::error::{Result, ServiceError};
use crate::params::{check_in, QueryParams};
use crate::registry::Registry;
use crate::service::Service;
use crate::transport::RestClient;
use bioservices_common::Settings;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Service description from the `info` endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HgncInfo {
    #[serde(default)]
    pub last_modified: String,
    #[serde(default)]
    pub num_doc: u64,
    pub searchable_fields: Vec<String>,
    pub stored_fields: Vec<String>,
}

#[derive(Debug)]
pub struct Hgnc {
    client: RestClient,
    info: Registry<HgncInfo>,
}

impl Service for Hgnc {
    const NAME: &'static str = "hgnc";
    const DEFAULT_URL: &'static str = "https://rest.genenames.org";

    fn from_client(client: RestClient, _settings: &Settings) -> Result<Self> {
        Ok(Self {
            client,
            info: Registry::new(),
        })
    }

    fn client(&self) -> &RestClient {
        &self.client
    }
}

impl Hgnc {
    /// Searchable and stored fields, fetched once
    pub async fn info(&self) -> Result<&HgncInfo> {
        self.info
            .get_or_fetch(|| async { self.client.get_json("info", &QueryParams::new()).await })
            .await
    }

    /// Full records whose stored `field` equals `value`
    pub async fn fetch(&self, field: &str, value: &str) -> Result<Vec<Value>> {
        check_in("field", field, &self.info().await?.stored_fields)?;
        self.docs(&self.client.segments_url(&["fetch", field, value])?).await
    }

    /// Matching HGNC ids and symbols; `field` restricts the search
    pub async fn search(&self, field: Option<&str>, value: &str) -> Result<Vec<Value>> {
        let path = match field {
            Some(field) => {
                check_in("field", field, &self.info().await?.searchable_fields)?;
                self.client.segments_url(&["search", field, value])?
            },
            None => self.client.segments_url(&["search", value])?,
        };
        self.docs(&path).await
    }

    async fn docs(&self, path: &str) -> Result<Vec<Value>> {
        let mut document: Value = self.client.get_json(path, &QueryParams::new()).await?;
        match document["response"]["docs"].take() {
            Value::Array(docs) => Ok(docs),
            _ => Err(ServiceError::parse(format!("HGNC response for {} has no docs", path))),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn mount_info(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/info"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "lastModified": "2024-01-01T00:00:00Z",
                "numDoc": 44000,
                "searchableFields": ["symbol", "alias_symbol", "hgnc_id"],
                "storedFields": ["symbol", "hgnc_id", "name", "locus_type"]
            })))
            .expect(1)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_fetch_by_symbol() {
        let server = MockServer::start().await;
        mount_info(&server).await;
        Mock::given(method("GET"))
            .and(path("/fetch/symbol/ZAP70"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "responseHeader": {"status": 0},
                "response": {"numFound": 1, "docs": [{"hgnc_id": "HGNC:12858", "symbol": "ZAP70"}]}
            })))
            .mount(&server)
            .await;

        let hgnc = Hgnc::with_base_url(&server.uri()).unwrap();
        let docs = hgnc.fetch("symbol", "ZAP70").await.unwrap();
        assert_eq!(docs[0]["hgnc_id"], "HGNC:12858");

        // field lists come from the memoized info document
        assert!(hgnc.fetch("colour", "red").await.unwrap_err().is_validation());
        assert_eq!(hgnc.info().await.unwrap().num_doc, 44000);
    }

    #[tokio::test]
    async fn test_search_without_field() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search/BRAF"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "response": {"docs": [{"hgnc_id": "HGNC:1097", "symbol": "BRAF", "score": 9.1}]}
            })))
            .mount(&server)
            .await;

        let hgnc = Hgnc::with_base_url(&server.uri()).unwrap();
        let docs = hgnc.search(None, "BRAF").await.unwrap();
        assert_eq!(docs.len(), 1);
        assert!(server
            .received_requests()
            .await
            .unwrap()
            .iter()
            .all(|r| r.url.path() != "/info"));
    }
}
