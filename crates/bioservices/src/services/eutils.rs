//! NCBI Entrez Programming Utilities (`eutils.ncbi.nlm.nih.gov`)
//!
//! Requests carry the NCBI API key when the settings hold a `ncbi` token
//! (`tokens.ncbi` or `BIOSERVICES_TOKEN_NCBI`), which raises NCBI's rate
//! limit from 3 to 10 requests per second.

use crate::error::{Result, ServiceError};
use crate::params::{check_range, join_list, ParamSpec, QueryParams};
use crate::parse::{string_list, XmlElement};
use crate::registry::Registry;
use crate::service::Service;
use crate::transport::RestClient;
use bioservices_common::Settings;
use serde::Serialize;
use serde_json::Value;

/// Entrez databases accepted without a round trip to `einfo`
pub const DATABASES: &[&str] = &[
    "pubmed", "protein", "nuccore", "ipg", "nucleotide", "structure", "genome", "annotinfo",
    "assembly", "bioproject", "biosample", "blastdbinfo", "books", "cdd", "clinvar", "gap",
    "gapplus", "grasp", "dbvar", "gene", "gds", "geoprofiles", "medgen", "mesh", "nlmcatalog",
    "omim", "orgtrack", "pmc", "popset", "proteinclusters", "pcassay", "protfam", "pccompound",
    "pcsubstance", "seqannot", "snp", "sra", "taxonomy", "biocollections", "gtr",
];

const DATABASE: ParamSpec = ParamSpec::one_of("db", DATABASES);
const RETMODE: ParamSpec = ParamSpec::one_of("retmode", &["xml", "text", "json", "asn.1"]);

/// Largest `retmax` ESearch honours
pub const MAX_RETMAX: u32 = 100_000;

/// Token name holding the NCBI API key
pub const API_KEY_TOKEN: &str = "ncbi";
const API_KEY_PARAM: &str = "api_key";

/// Parsed ESearch answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ESearchResult {
    pub count: u64,
    pub retmax: u64,
    pub retstart: u64,
    pub ids: Vec<String>,
    pub query_translation: String,
}

#[derive(Debug)]
pub struct EUtils {
    client: RestClient,
    api_key: Option<String>,
    databases: Registry<Vec<String>>,
}

impl Service for EUtils {
    const NAME: &'static str = "eutils";
    const DEFAULT_URL: &'static str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils";

    fn from_client(client: RestClient, settings: &Settings) -> Result<Self> {
        Ok(Self {
            client: client.with_secret_param(API_KEY_PARAM),
            api_key: settings.token(API_KEY_TOKEN).map(str::to_string),
            databases: Registry::new(),
        })
    }

    fn client(&self) -> &RestClient {
        &self.client
    }
}

impl EUtils {
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Database statistics and searchable fields
    pub async fn einfo(&self, db: &str) -> Result<XmlElement> {
        let mut params = self.params();
        params.push_checked(&DATABASE, db)?;
        params.push("retmode", "xml");
        self.client.get_xml("einfo.fcgi", &params).await
    }

    /// Every Entrez database name, fetched once from `einfo`
    pub async fn databases(&self) -> Result<&[String]> {
        let databases = self
            .databases
            .get_or_fetch(|| async {
                let document = self.client.get_xml("einfo.fcgi", &self.params()).await?;
                Ok(document
                    .find_all("DbName")
                    .into_iter()
                    .map(|db| db.text().to_string())
                    .collect())
            })
            .await?;
        Ok(databases.as_slice())
    }

    /// Identifiers matching an Entrez query
    pub async fn esearch(&self, db: &str, term: &str, retmax: Option<u32>) -> Result<ESearchResult> {
        let mut params = self.params();
        params.push_checked(&DATABASE, db)?;
        if let Some(retmax) = retmax {
            check_range("retmax", retmax, 0, MAX_RETMAX)?;
            params.push("retmax", retmax);
        }
        params.push("term", term).push("retmode", "json");

        let document: Value = self.client.get_json("esearch.fcgi", &params).await?;
        parse_esearch(&document)
    }

    /// Records in the requested `rettype`/`retmode`, e.g. `fasta`/`text`
    pub async fn efetch(&self, db: &str, ids: &[&str], rettype: &str, retmode: &str) -> Result<String> {
        if ids.is_empty() {
            return Err(ServiceError::MissingParameter("id".to_string()));
        }
        let mut params = self.params();
        params.push_checked(&DATABASE, db)?;
        params.push_checked(&RETMODE, retmode)?;
        params.push("id", join_list(ids, ",")).push("rettype", rettype);
        self.client.get_text("efetch.fcgi", &params).await
    }

    /// Document summaries as JSON
    pub async fn esummary(&self, db: &str, ids: &[&str]) -> Result<Value> {
        if ids.is_empty() {
            return Err(ServiceError::MissingParameter("id".to_string()));
        }
        let mut params = self.params();
        params.push_checked(&DATABASE, db)?;
        params.push("id", join_list(ids, ",")).push("retmode", "json");

        let document: Value = self.client.get_json("esummary.fcgi", &params).await?;
        if let Some(error) = document["error"].as_str() {
            return Err(ServiceError::remote(Self::NAME, error));
        }
        Ok(document["result"].clone())
    }

    fn params(&self) -> QueryParams {
        let mut params = QueryParams::new();
        params.push("tool", "bioservices-rs");
        params.push_opt(API_KEY_PARAM, self.api_key.as_deref());
        params
    }
}

fn parse_esearch(document: &Value) -> Result<ESearchResult> {
    let result = &document["esearchresult"];
    if let Some(error) = result["ERROR"].as_str() {
        return Err(ServiceError::remote(EUtils::NAME, error));
    }
    if result.is_null() {
        return Err(ServiceError::parse("ESearch response has no esearchresult"));
    }

    let number = |key: &str| -> u64 {
        match &result[key] {
            Value::String(s) => s.parse().unwrap_or(0),
            Value::Number(n) => n.as_u64().unwrap_or(0),
            _ => 0,
        }
    };

    Ok(ESearchResult {
        count: number("count"),
        retmax: number("retmax"),
        retstart: number("retstart"),
        ids: string_list(&result["idlist"]),
        query_translation: result["querytranslation"]
            .as_str()
            .unwrap_or_default()
            .to_string(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::transport::ResponseCache;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_esearch_parses_ids() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/esearch.fcgi"))
            .and(query_param("db", "pubmed"))
            .and(query_param("term", "zap70[gene]"))
            .and(query_param("retmax", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "header": {"type": "esearch", "version": "0.3"},
                "esearchresult": {
                    "count": "812", "retmax": "2", "retstart": "0",
                    "idlist": ["39012345", "38999999"],
                    "querytranslation": "zap70[gene]"
                }
            })))
            .mount(&server)
            .await;

        let eutils = EUtils::with_base_url(&server.uri()).unwrap();
        let result = eutils.esearch("pubmed", "zap70[gene]", Some(2)).await.unwrap();
        assert_eq!(result.count, 812);
        assert_eq!(result.ids, vec!["39012345", "38999999"]);
    }

    #[tokio::test]
    async fn test_api_key_from_settings() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/efetch.fcgi"))
            .and(query_param("api_key", "secret"))
            .and(query_param("id", "NM_001079.4,NM_207519.2"))
            .and(query_param("rettype", "fasta"))
            .respond_with(ResponseTemplate::new(200).set_body_string(">NM_001079.4 ZAP70\nACGT\n"))
            .expect(1)
            .mount(&server)
            .await;

        let mut settings = Settings::default();
        settings.set("tokens.ncbi", "secret").unwrap();
        settings.set("urls.eutils", &server.uri()).unwrap();

        let eutils = EUtils::with_settings(&settings).unwrap();
        let fasta = eutils
            .efetch("nuccore", &["NM_001079.4", "NM_207519.2"], "fasta", "text")
            .await
            .unwrap();
        assert!(fasta.starts_with(">NM_001079.4"));
    }

    #[tokio::test]
    async fn test_validation_before_request() {
        let server = MockServer::start().await;
        let eutils = EUtils::with_base_url(&server.uri()).unwrap();

        assert!(eutils.esearch("pubmd", "x", None).await.unwrap_err().is_validation());
        assert!(matches!(
            eutils.esearch("pubmed", "x", Some(MAX_RETMAX + 1)).await.unwrap_err(),
            ServiceError::OutOfRange { .. }
        ));
        assert!(eutils.efetch("nuccore", &["1"], "fasta", "html").await.unwrap_err().is_validation());
        assert!(eutils.efetch("nuccore", &[], "fasta", "text").await.unwrap_err().is_validation());
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_databases_registry() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/einfo.fcgi"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                "<eInfoResult><DbList><DbName>pubmed</DbName><DbName>protein</DbName></DbList></eInfoResult>",
            ))
            .expect(1)
            .mount(&server)
            .await;

        let eutils = EUtils::with_base_url(&server.uri()).unwrap();
        assert_eq!(eutils.databases().await.unwrap(), ["pubmed", "protein"]);
        assert_eq!(eutils.databases().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_esummary_error_is_remote() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/esummary.fcgi"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"error": "Invalid uid"})))
            .mount(&server)
            .await;

        let eutils = EUtils::with_base_url(&server.uri()).unwrap();
        let err = eutils.esummary("protein", &["0"]).await.unwrap_err();
        assert!(matches!(err, ServiceError::Remote { .. }));
    }

    #[tokio::test]
    async fn test_api_key_stays_out_of_errors_and_cache() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/esearch.fcgi"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "esearchresult": {"count": "1", "retmax": "1", "retstart": "0", "idlist": ["7"]}
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/efetch.fcgi"))
            .respond_with(ResponseTemplate::new(500).set_body_string("backend down"))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let rest = RestClient::builder("eutils", &server.uri())
            .cache(ResponseCache::with_dir(dir.path(), Duration::from_secs(60)).unwrap())
            .build()
            .unwrap();
        let eutils = EUtils::from_client(rest, &Settings::default())
            .unwrap()
            .with_api_key("s3cr3t");

        eutils.esearch("pubmed", "zap70", None).await.unwrap();
        let err = eutils.efetch("nuccore", &["1"], "fasta", "text").await.unwrap_err();
        assert_eq!(err.status(), Some(500));
        assert!(!err.to_string().contains("s3cr3t"));

        let mut metadata = 0;
        for entry in std::fs::read_dir(dir.path()).unwrap() {
            let path = entry.unwrap().path();
            if path.extension().is_some_and(|ext| ext == "json") {
                metadata += 1;
                let text = std::fs::read_to_string(&path).unwrap();
                assert!(text.contains("esearch.fcgi"));
                assert!(!text.contains("s3cr3t"));
            }
        }
        assert_eq!(metadata, 1);
    }
}
