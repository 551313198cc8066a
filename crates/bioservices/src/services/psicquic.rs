//! PSICQUIC molecular interaction services
//!
//! The EBI registry lists every PSICQUIC provider with its REST endpoint.
//! Queries use MIQL and return MITAB rows (15 to 42 tab-separated columns
//! depending on the MITAB version).

use crate::error::{Result, ServiceError};
use crate::params::{ParamSpec, QueryParams};
use crate::parse::{parse_tsv, Table, XmlElement};
use crate::registry::Registry;
use crate::service::Service;
use crate::transport::RestClient;
use bioservices_common::{ResponseFormat, Settings};
use reqwest::Url;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::warn;

pub const MITAB_FORMATS: &[&str] = &["tab25", "tab26", "tab27"];

const FORMAT: ParamSpec = ParamSpec::one_of("format", MITAB_FORMATS);

/// A provider from the PSICQUIC registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PsicquicService {
    pub name: String,
    pub rest_url: String,
    pub active: bool,
    pub count: u64,
    pub version: String,
}

#[derive(Debug)]
pub struct Psicquic {
    client: RestClient,
    registry: Registry<Vec<PsicquicService>>,
}

impl Service for Psicquic {
    const NAME: &'static str = "psicquic";
    const DEFAULT_URL: &'static str =
        "https://www.ebi.ac.uk/Tools/webservices/psicquic/registry/registry";

    fn from_client(client: RestClient, _settings: &Settings) -> Result<Self> {
        Ok(Self {
            client,
            registry: Registry::new(),
        })
    }

    fn client(&self) -> &RestClient {
        &self.client
    }
}

impl Psicquic {
    /// Every registered provider, fetched once
    pub async fn registry(&self) -> Result<&[PsicquicService]> {
        let services = self
            .registry
            .get_or_fetch(|| async {
                let mut params = QueryParams::new();
                params.push("action", "STATUS").push("format", "xml");
                let document = self.client.get_xml("", &params).await?;
                Ok(parse_registry(&document))
            })
            .await?;
        Ok(services.as_slice())
    }

    /// Names of providers currently up
    pub async fn active_services(&self) -> Result<Vec<String>> {
        Ok(self
            .registry()
            .await?
            .iter()
            .filter(|s| s.active)
            .map(|s| s.name.clone())
            .collect())
    }

    /// MITAB rows for a MIQL query on one provider
    pub async fn query(
        &self,
        service: &str,
        query: &str,
        format: &str,
        max_results: Option<usize>,
    ) -> Result<Table> {
        FORMAT.check(format)?;
        let provider = self.provider(service).await?;

        let mut params = QueryParams::new();
        params.push("format", format);
        params.push_opt("maxResults", max_results);
        let url = query_url(&provider.rest_url, query, &params)?;

        let text = self.client.get_url(&url, ResponseFormat::Text).await?.text()?;
        parse_tsv(&text, false)
    }

    /// Number of interactions a provider holds for a query
    pub async fn count(&self, service: &str, query: &str) -> Result<u64> {
        let provider = self.provider(service).await?;
        let mut params = QueryParams::new();
        params.push("format", "count");
        let url = query_url(&provider.rest_url, query, &params)?;

        let text = self.client.get_url(&url, ResponseFormat::Text).await?.text()?;
        text.trim()
            .parse()
            .map_err(|_| ServiceError::parse(format!("{} returned a non-numeric count", service)))
    }

    /// Run a query on every active provider
    ///
    /// Providers that fail are logged and left out of the result.
    pub async fn query_all(&self, query: &str, format: &str) -> Result<BTreeMap<String, Table>> {
        FORMAT.check(format)?;
        let mut results = BTreeMap::new();

        for name in self.active_services().await? {
            match self.query(&name, query, format, None).await {
                Ok(table) => {
                    results.insert(name, table);
                },
                Err(e) => {
                    warn!(service = %name, error = %e, "PSICQUIC provider query failed, skipping");
                },
            }
        }
        Ok(results)
    }

    async fn provider(&self, service: &str) -> Result<&PsicquicService> {
        let services = self.registry().await?;
        services
            .iter()
            .find(|s| s.name.eq_ignore_ascii_case(service))
            .ok_or_else(|| {
                let names: Vec<&str> = services.iter().map(|s| s.name.as_str()).collect();
                ServiceError::invalid_parameter("service", service, &names)
            })
    }
}

fn parse_registry(document: &XmlElement) -> Vec<PsicquicService> {
    document
        .find_all("service")
        .into_iter()
        .filter_map(|service| {
            Some(PsicquicService {
                name: service.child_text("name")?.to_string(),
                rest_url: service.child_text("restUrl")?.to_string(),
                active: service.child_text("active") == Some("true"),
                count: service
                    .child_text("count")
                    .and_then(|c| c.parse().ok())
                    .unwrap_or(0),
                version: service.child_text("version").unwrap_or_default().to_string(),
            })
        })
        .collect()
}

/// `<rest_url>/query/<miql>` with the query percent-encoded as one segment
fn query_url(rest_url: &str, query: &str, params: &QueryParams) -> Result<String> {
    let invalid = |message: String| ServiceError::InvalidUrl {
        url: rest_url.to_string(),
        message,
    };

    let mut url = Url::parse(rest_url).map_err(|e| invalid(e.to_string()))?;
    url.path_segments_mut()
        .map_err(|_| invalid("URL cannot have path segments".to_string()))?
        .pop_if_empty()
        .push("query")
        .push(query);
    if !params.is_empty() {
        url.query_pairs_mut()
            .extend_pairs(params.iter().map(|(k, v)| (k.as_str(), v.as_str())));
    }
    Ok(url.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn registry_xml(base: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<registry xmlns="http://hupo.psi.org/psicquic/registry">
  <service>
    <name>IntAct</name>
    <restUrl>{base}/intact/search/</restUrl>
    <active>true</active>
    <count>1234</count>
    <version>1.4.13</version>
  </service>
  <service>
    <name>MINT</name>
    <restUrl>{base}/mint/search/</restUrl>
    <active>true</active>
    <count>99</count>
  </service>
  <service>
    <name>BioGrid</name>
    <restUrl>{base}/biogrid/search/</restUrl>
    <active>false</active>
    <count>0</count>
  </service>
</registry>"#
        )
    }

    async fn mount_registry(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/registry"))
            .and(query_param("action", "STATUS"))
            .respond_with(ResponseTemplate::new(200).set_body_string(registry_xml(&server.uri())))
            .expect(1)
            .mount(server)
            .await;
    }

    fn client(server: &MockServer) -> Psicquic {
        Psicquic::with_base_url(&format!("{}/registry", server.uri())).unwrap()
    }

    #[tokio::test]
    async fn test_registry_and_active_services() {
        let server = MockServer::start().await;
        mount_registry(&server).await;

        let psicquic = client(&server);
        let services = psicquic.registry().await.unwrap();
        assert_eq!(services.len(), 3);
        assert_eq!(services[0].count, 1234);
        assert_eq!(services[0].version, "1.4.13");
        assert_eq!(psicquic.active_services().await.unwrap(), vec!["IntAct", "MINT"]);
    }

    #[tokio::test]
    async fn test_query_returns_mitab_rows() {
        let server = MockServer::start().await;
        mount_registry(&server).await;
        Mock::given(method("GET"))
            .and(path("/intact/search/query/identifier:ZAP70"))
            .and(query_param("format", "tab25"))
            .and(query_param("maxResults", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                "uniprotkb:P43403\tuniprotkb:P06239\t-\t-\tpsi-mi:zap70_human\t-\tpsi-mi:\"MI:0018\"(two hybrid)\n",
            ))
            .mount(&server)
            .await;

        let table = client(&server)
            .query("intact", "identifier:ZAP70", "tab25", Some(2))
            .await
            .unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.rows[0][0], "uniprotkb:P43403");
        assert_eq!(table.rows[0][6], "psi-mi:\"MI:0018\"(two hybrid)");
    }

    #[tokio::test]
    async fn test_query_all_skips_failing_providers() {
        let server = MockServer::start().await;
        mount_registry(&server).await;
        Mock::given(method("GET"))
            .and(path("/intact/search/query/brca2"))
            .respond_with(ResponseTemplate::new(200).set_body_string("a\tb\n"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/mint/search/query/brca2"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let results = client(&server).query_all("brca2", "tab25").await.unwrap();
        assert_eq!(results.len(), 1);
        assert!(results.contains_key("IntAct"));
    }

    #[tokio::test]
    async fn test_unknown_provider() {
        let server = MockServer::start().await;
        mount_registry(&server).await;

        let err = client(&server)
            .count("nowhere", "brca2")
            .await
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_query_url_encodes_miql() {
        let url = query_url(
            "https://example.org/intact/search/",
            "species:human AND type:direct",
            &QueryParams::new(),
        )
        .unwrap();
        assert_eq!(
            url,
            "https://example.org/intact/search/query/species:human%20AND%20type:direct"
        );
    }
}
