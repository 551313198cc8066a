//! REST client shared by every service module
//!
//! A [`RestClient`] owns a `reqwest` client, the service's base URL and an
//! optional [`ResponseCache`]. Service modules build paths and
//! [`QueryParams`]; the client joins them to the base URL, sends the
//! request with the right `Accept` header and turns failures into
//! [`ServiceError`] values that carry the URL.
//!
//! Query parameters registered as secret (API keys) are stripped from
//! every URL that leaves the client: logs, errors, cache metadata and
//! [`RawResponse::url`].

use crate::error::{Result, ServiceError};
use crate::params::QueryParams;
use crate::parse::XmlElement;
use crate::transport::cache::{CacheStats, CachedResponse, ResponseCache};
use crate::transport::response::RawResponse;
use bioservices_common::{ResponseFormat, Settings};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Client, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// HTTP client bound to one service's base URL
#[derive(Debug, Clone)]
pub struct RestClient {
    name: String,
    base_url: String,
    http: Client,
    cache: Option<Arc<ResponseCache>>,
    concurrency: usize,
    secret_params: Vec<String>,
}

/// Builder for [`RestClient`]
#[derive(Debug)]
pub struct RestClientBuilder {
    name: String,
    base_url: String,
    timeout: Duration,
    user_agent: String,
    headers: Vec<(String, String)>,
    cache: Option<Arc<ResponseCache>>,
    concurrency: usize,
    secret_params: Vec<String>,
}

impl RestClientBuilder {
    fn new(name: &str, base_url: &str) -> Self {
        let defaults = Settings::default();
        Self {
            name: name.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout: defaults.timeout(),
            user_agent: defaults.general.user_agent,
            headers: Vec::new(),
            cache: None,
            concurrency: defaults.general.concurrency,
            secret_params: Vec::new(),
        }
    }

    /// Take timeout, user agent, concurrency and cache options from
    /// settings
    pub fn settings(mut self, settings: &Settings) -> Result<Self> {
        self.timeout = settings.timeout();
        self.user_agent = settings.general.user_agent.clone();
        self.concurrency = settings.general.concurrency;
        self.cache = if settings.general.cache {
            let cache = match settings.cache_dir() {
                Some(dir) => ResponseCache::with_dir(dir, settings.cache_expire())?,
                None => ResponseCache::in_memory(settings.cache_expire()),
            };
            Some(Arc::new(cache))
        } else {
            None
        };
        Ok(self)
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Header sent with every request
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn cache(mut self, cache: ResponseCache) -> Self {
        self.cache = Some(Arc::new(cache));
        self
    }

    /// Share one cache between several clients
    pub fn shared_cache(mut self, cache: Arc<ResponseCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn no_cache(mut self) -> Self {
        self.cache = None;
        self
    }

    /// Requests in flight for [`RestClient::fetch_all`]
    pub fn concurrency(mut self, workers: usize) -> Self {
        self.concurrency = workers.max(1);
        self
    }

    /// Query parameter kept out of logs, errors and cache metadata
    pub fn secret_param(mut self, name: impl Into<String>) -> Self {
        self.secret_params.push(name.into());
        self
    }

    pub fn build(self) -> Result<RestClient> {
        parse_url(&self.base_url)?;

        let mut headers = HeaderMap::new();
        for (name, value) in &self.headers {
            let header_name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| ServiceError::invalid_parameter("header", name, &[] as &[&str]))?;
            let header_value = HeaderValue::from_str(value)
                .map_err(|_| ServiceError::invalid_parameter(name, value, &[] as &[&str]))?;
            headers.insert(header_name, header_value);
        }

        let http = Client::builder()
            .timeout(self.timeout)
            .user_agent(self.user_agent)
            .default_headers(headers)
            .build()
            .map_err(ServiceError::ClientBuild)?;

        Ok(RestClient {
            name: self.name,
            base_url: self.base_url,
            http,
            cache: self.cache,
            concurrency: self.concurrency.max(1),
            secret_params: self.secret_params,
        })
    }
}

fn parse_url(raw: &str) -> Result<Url> {
    Url::parse(raw).map_err(|e| ServiceError::InvalidUrl {
        url: raw.to_string(),
        message: e.to_string(),
    })
}

impl RestClient {
    /// Client with default settings
    pub fn new(name: &str, base_url: &str) -> Result<Self> {
        Self::builder(name, base_url).build()
    }

    pub fn builder(name: &str, base_url: &str) -> RestClientBuilder {
        RestClientBuilder::new(name, base_url)
    }

    /// Client for a service, honouring a base URL override in settings
    pub fn from_settings(name: &str, default_url: &str, settings: &Settings) -> Result<Self> {
        let base_url = settings.base_url(name).unwrap_or(default_url);
        Self::builder(name, base_url).settings(settings)?.build()
    }

    /// Same connection pool, timeout, user agent, cache and secrets, bound
    /// to another endpoint
    pub fn rebase(&self, name: &str, base_url: &str) -> Result<Self> {
        let base_url = base_url.trim_end_matches('/');
        parse_url(base_url)?;
        Ok(Self {
            name: name.to_string(),
            base_url: base_url.to_string(),
            ..self.clone()
        })
    }

    /// Mark a query parameter as secret on an existing client
    pub fn with_secret_param(mut self, name: impl Into<String>) -> Self {
        self.secret_params.push(name.into());
        self
    }

    /// Service name, used in logs and errors
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Requests in flight for [`RestClient::fetch_all`]
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Absolute URL for a path below the base URL
    ///
    /// Absolute `http(s)://` paths are returned unchanged. The path is used
    /// as is; identifiers that may hold `/`, `#` or `?` belong in
    /// [`RestClient::segments_url`].
    pub fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else if path.is_empty() {
            self.base_url.clone()
        } else {
            format!("{}/{}", self.base_url, path.trim_start_matches('/'))
        }
    }

    /// Absolute URL with each segment percent-encoded as one path segment
    ///
    /// `["similarity", "CC#N", "70"]` becomes `<base>/similarity/CC%23N/70`.
    pub fn segments_url<S: AsRef<str>>(&self, segments: &[S]) -> Result<String> {
        let mut url = parse_url(&self.base_url)?;
        url.path_segments_mut()
            .map_err(|_| ServiceError::InvalidUrl {
                url: self.base_url.clone(),
                message: "base URL cannot have path segments".to_string(),
            })?
            .pop_if_empty()
            .extend(segments.iter().map(AsRef::as_ref));
        Ok(url.to_string())
    }

    /// Absolute URL with an encoded query string
    pub fn url_with_params(&self, path: &str, params: &QueryParams) -> Result<String> {
        let mut url = parse_url(&self.url(path))?;
        if !params.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(params.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        }
        Ok(url.to_string())
    }

    /// `url` without its secret query parameters
    pub fn redact(&self, url: &str) -> String {
        if self.secret_params.is_empty() {
            return url.to_string();
        }
        let Ok(mut parsed) = Url::parse(url) else {
            return url.to_string();
        };

        let kept: Vec<(String, String)> = parsed
            .query_pairs()
            .filter(|(k, _)| !self.secret_params.iter().any(|secret| secret == k))
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        if kept.is_empty() {
            parsed.set_query(None);
        } else {
            parsed.query_pairs_mut().clear().extend_pairs(kept);
        }
        parsed.to_string()
    }

    pub async fn get(
        &self,
        path: &str,
        params: &QueryParams,
        format: ResponseFormat,
    ) -> Result<RawResponse> {
        let url = self.url_with_params(path, params)?;
        self.get_url(&url, format).await
    }

    /// GET that always goes to the server and is never stored
    ///
    /// For resources that change between calls, such as job status.
    pub async fn get_fresh(
        &self,
        path: &str,
        params: &QueryParams,
        format: ResponseFormat,
    ) -> Result<RawResponse> {
        let url = self.url_with_params(path, params)?;
        let request = self.http.get(&url).header(ACCEPT, format.accept());
        self.execute("GET", &url, request).await
    }

    /// GET an absolute URL, e.g. a pagination link
    pub async fn get_url(&self, url: &str, format: ResponseFormat) -> Result<RawResponse> {
        let accept = format.accept();
        let key = ResponseCache::key("GET", url, accept);

        if let Some(cache) = &self.cache {
            if let Some(hit) = cache.get(&key) {
                debug!(service = %self.name, url = %hit.url, "Serving cached response");
                return Ok(RawResponse::from_cache(hit.url, hit.headers, hit.body));
            }
        }

        let request = self.http.get(url).header(ACCEPT, accept);
        let response = self.execute("GET", url, request).await?;

        if let Some(cache) = &self.cache {
            cache.put(
                &key,
                CachedResponse {
                    url: response.url().to_string(),
                    headers: response.headers().to_vec(),
                    body: response.body().to_vec(),
                    stored_at: chrono::Utc::now(),
                },
            );
        }

        Ok(response)
    }

    pub async fn get_text(&self, path: &str, params: &QueryParams) -> Result<String> {
        self.get(path, params, ResponseFormat::Text).await?.text()
    }

    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &QueryParams,
    ) -> Result<T> {
        self.get(path, params, ResponseFormat::Json).await?.json()
    }

    pub async fn get_xml(&self, path: &str, params: &QueryParams) -> Result<XmlElement> {
        self.get(path, params, ResponseFormat::Xml).await?.xml()
    }

    pub async fn get_bytes(&self, path: &str, params: &QueryParams) -> Result<Vec<u8>> {
        Ok(self
            .get(path, params, ResponseFormat::Binary)
            .await?
            .into_bytes())
    }

    /// POST an url-encoded form
    pub async fn post_form(
        &self,
        path: &str,
        form: &QueryParams,
        format: ResponseFormat,
    ) -> Result<RawResponse> {
        let url = self.url(path);
        let pairs: Vec<(&str, &str)> = form.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
        let request = self
            .http
            .post(&url)
            .header(ACCEPT, format.accept())
            .form(&pairs);
        self.execute("POST", &url, request).await
    }

    /// POST a JSON document
    pub async fn post_json<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
        format: ResponseFormat,
    ) -> Result<RawResponse> {
        let url = self.url(path);
        let request = self
            .http
            .post(&url)
            .header(ACCEPT, format.accept())
            .json(body);
        self.execute("POST", &url, request).await
    }

    /// POST a raw body with an explicit content type and extra headers
    pub async fn post_body(
        &self,
        path: &str,
        body: String,
        content_type: &str,
        headers: &[(&str, &str)],
        format: ResponseFormat,
    ) -> Result<RawResponse> {
        let response = self
            .post_body_any_status(path, body, content_type, headers, format)
            .await?;
        self.check_status(response)
    }

    /// Like [`RestClient::post_body`], but a non-2xx answer is returned
    /// with its full body instead of becoming [`ServiceError::Http`]
    pub async fn post_body_any_status(
        &self,
        path: &str,
        body: String,
        content_type: &str,
        headers: &[(&str, &str)],
        format: ResponseFormat,
    ) -> Result<RawResponse> {
        let url = self.url(path);
        let mut request = self
            .http
            .post(&url)
            .header(ACCEPT, format.accept())
            .header(CONTENT_TYPE, content_type)
            .body(body);
        for (name, value) in headers {
            request = request.header(*name, *value);
        }
        self.send("POST", &url, request).await
    }

    pub fn cache(&self) -> Option<&ResponseCache> {
        self.cache.as_deref()
    }

    pub fn cache_stats(&self) -> Option<CacheStats> {
        self.cache.as_ref().map(|cache| cache.stats())
    }

    pub fn cache_clear(&self) -> Result<()> {
        if let Some(cache) = &self.cache {
            cache.clear()?;
        }
        Ok(())
    }

    async fn execute(&self, method: &str, url: &str, request: RequestBuilder) -> Result<RawResponse> {
        let response = self.send(method, url, request).await?;
        self.check_status(response)
    }

    /// Send and read the whole body; only transport failures are errors
    async fn send(&self, method: &str, url: &str, request: RequestBuilder) -> Result<RawResponse> {
        let shown = self.redact(url);
        debug!(service = %self.name, method, url = %shown, "Sending request");

        let response = request.send().await.map_err(|e| {
            let e = e.without_url();
            warn!(service = %self.name, method, url = %shown, error = %e, "Request failed");
            ServiceError::Network {
                url: shown.clone(),
                source: e,
            }
        })?;

        let status = response.status();
        let final_url = self.redact(response.url().as_str());
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(|e| ServiceError::Network {
                url: shown.clone(),
                source: e.without_url(),
            })?
            .to_vec();

        Ok(RawResponse::new(final_url, status, &headers, body))
    }

    fn check_status(&self, response: RawResponse) -> Result<RawResponse> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        warn!(
            service = %self.name,
            url = %response.url(),
            status = status.as_u16(),
            "Service returned an error status"
        );
        Err(ServiceError::http(response.url(), status.as_u16(), response.body()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_url_joining() {
        let client = RestClient::new("kegg", "https://rest.kegg.jp/").unwrap();
        assert_eq!(client.base_url(), "https://rest.kegg.jp");
        assert_eq!(client.url("info/kegg"), "https://rest.kegg.jp/info/kegg");
        assert_eq!(client.url("/info/kegg"), "https://rest.kegg.jp/info/kegg");
        assert_eq!(client.url(""), "https://rest.kegg.jp");
        assert_eq!(client.url("https://other.example/x"), "https://other.example/x");
    }

    #[test]
    fn test_url_with_params_encodes_query() {
        let client = RestClient::new("uniprot", "https://rest.uniprot.org").unwrap();
        let mut params = QueryParams::new();
        params.push("query", "gene:zap70 AND organism_id:9606");
        let url = client.url_with_params("uniprotkb/search", &params).unwrap();
        assert_eq!(
            url,
            "https://rest.uniprot.org/uniprotkb/search?query=gene%3Azap70+AND+organism_id%3A9606"
        );

        let bare = client
            .url_with_params("uniprotkb/P43403", &QueryParams::new())
            .unwrap();
        assert_eq!(bare, "https://rest.uniprot.org/uniprotkb/P43403");
    }

    #[test]
    fn test_invalid_base_url() {
        let err = RestClient::new("broken", "not a url").unwrap_err();
        assert!(matches!(err, ServiceError::InvalidUrl { .. }));
    }

    #[test]
    fn test_base_url_override_from_settings() {
        let mut settings = Settings::default();
        settings
            .set("urls.kegg", "http://localhost:9999/kegg/")
            .unwrap();
        let client = RestClient::from_settings("kegg", "https://rest.kegg.jp", &settings).unwrap();
        assert_eq!(client.base_url(), "http://localhost:9999/kegg");
    }

    #[tokio::test]
    async fn test_get_sends_accept_header() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/entry"))
            .and(query_param("id", "42"))
            .and(header("accept", "application/json"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"id": 42}"#))
            .expect(1)
            .mount(&server)
            .await;

        let client = RestClient::new("test", &server.uri()).unwrap();
        let mut params = QueryParams::new();
        params.push("id", 42);
        let value: serde_json::Value = client.get_json("entry", &params).await.unwrap();
        assert_eq!(value["id"], 42);
    }

    #[tokio::test]
    async fn test_http_error_carries_url_and_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404).set_body_string("no such entry"))
            .mount(&server)
            .await;

        let client = RestClient::new("test", &server.uri()).unwrap();
        let err = client
            .get_text("missing", &QueryParams::new())
            .await
            .unwrap_err();

        match &err {
            ServiceError::Http { url, status, body } => {
                assert!(url.ends_with("/missing"));
                assert_eq!(*status, 404);
                assert_eq!(body, "no such entry");
            },
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_network_error() {
        let client = RestClient::builder("test", "http://127.0.0.1:1")
            .timeout(Duration::from_secs(2))
            .build()
            .unwrap();
        let err = client.get_text("x", &QueryParams::new()).await.unwrap_err();
        assert!(matches!(err, ServiceError::Network { .. }));
    }

    #[tokio::test]
    async fn test_cached_get_skips_second_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/info/kegg"))
            .respond_with(ResponseTemplate::new(200).set_body_string("kegg Release 110.0"))
            .expect(1)
            .mount(&server)
            .await;

        let client = RestClient::builder("kegg", &server.uri())
            .cache(ResponseCache::in_memory(Duration::from_secs(60)))
            .build()
            .unwrap();

        let first = client.get("info/kegg", &QueryParams::new(), ResponseFormat::Text).await.unwrap();
        let second = client.get("info/kegg", &QueryParams::new(), ResponseFormat::Text).await.unwrap();

        assert!(!first.is_cached());
        assert!(second.is_cached());
        assert_eq!(second.text().unwrap(), "kegg Release 110.0");
        let stats = client.cache_stats().unwrap();
        assert_eq!(stats.hits, 1);

        client.cache_clear().unwrap();
        assert_eq!(client.cache_stats().unwrap().entries, 0);
    }

    #[tokio::test]
    async fn test_post_form_and_default_headers() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/idmapping/run"))
            .and(header("x-test", "yes"))
            .and(body_string_contains("ids=P43403"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"jobId": "abc"}"#))
            .expect(1)
            .mount(&server)
            .await;

        let client = RestClient::builder("uniprot", &server.uri())
            .header("x-test", "yes")
            .build()
            .unwrap();
        let mut form = QueryParams::new();
        form.push("from", "UniProtKB_AC-ID").push("to", "PDB").push("ids", "P43403");
        let response = client
            .post_form("idmapping/run", &form, ResponseFormat::Json)
            .await
            .unwrap();
        let value: serde_json::Value = response.json().unwrap();
        assert_eq!(value["jobId"], "abc");
    }

    #[test]
    fn test_segments_url_encodes_reserved_characters() {
        let client = RestClient::new("chembl", "https://www.ebi.ac.uk/chembl/api/data/").unwrap();
        let url = client.segments_url(&["similarity", "CC#N", "70"]).unwrap();
        assert_eq!(url, "https://www.ebi.ac.uk/chembl/api/data/similarity/CC%23N/70");

        let url = client.segments_url(&["substructure", "F/C=C/F"]).unwrap();
        assert_eq!(url, "https://www.ebi.ac.uk/chembl/api/data/substructure/F%2FC=C%2FF");

        let url = client.segments_url(&["molecule", "a b?c"]).unwrap();
        assert_eq!(url, "https://www.ebi.ac.uk/chembl/api/data/molecule/a%20b%3Fc");
    }

    #[test]
    fn test_redact_drops_secret_params() {
        let client = RestClient::builder("eutils", "https://eutils.ncbi.nlm.nih.gov/entrez/eutils")
            .secret_param("api_key")
            .build()
            .unwrap();
        assert_eq!(
            client.redact("https://eutils.ncbi.nlm.nih.gov/esearch.fcgi?db=pubmed&api_key=s3cr3t"),
            "https://eutils.ncbi.nlm.nih.gov/esearch.fcgi?db=pubmed"
        );
        assert_eq!(
            client.redact("https://eutils.ncbi.nlm.nih.gov/einfo.fcgi?api_key=s3cr3t"),
            "https://eutils.ncbi.nlm.nih.gov/einfo.fcgi"
        );

        let plain = RestClient::new("kegg", "https://rest.kegg.jp").unwrap();
        assert_eq!(plain.redact("https://rest.kegg.jp/x?api_key=1"), "https://rest.kegg.jp/x?api_key=1");
    }

    #[test]
    fn test_rebase_keeps_settings() {
        let mut settings = Settings::default();
        settings.general.concurrency = 2;
        let client = RestClient::from_settings("pdb", "https://data.rcsb.org", &settings)
            .unwrap()
            .with_secret_param("token");

        let files = client.rebase("pdb-files", "https://files.rcsb.org/").unwrap();
        assert_eq!(files.name(), "pdb-files");
        assert_eq!(files.base_url(), "https://files.rcsb.org");
        assert_eq!(files.concurrency(), 2);
        assert_eq!(files.cache_stats().is_some(), client.cache_stats().is_some());
        assert_eq!(files.redact("https://files.rcsb.org/x?token=t"), "https://files.rcsb.org/x");

        assert!(client.rebase("pdb-files", "not a url").is_err());
    }

    #[tokio::test]
    async fn test_get_fresh_bypasses_cache() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/status/42"))
            .respond_with(ResponseTemplate::new(200).set_body_string("RUNNING"))
            .expect(3)
            .mount(&server)
            .await;

        let client = RestClient::builder("uniprot", &server.uri())
            .cache(ResponseCache::in_memory(Duration::from_secs(60)))
            .build()
            .unwrap();

        for _ in 0..2 {
            let response = client
                .get_fresh("status/42", &QueryParams::new(), ResponseFormat::Text)
                .await
                .unwrap();
            assert!(!response.is_cached());
        }
        assert_eq!(client.cache_stats().unwrap().entries, 0);

        client.get("status/42", &QueryParams::new(), ResponseFormat::Text).await.unwrap();
        assert_eq!(client.cache_stats().unwrap().entries, 1);
    }

    #[tokio::test]
    async fn test_post_body_any_status_keeps_full_body() {
        let server = MockServer::start().await;
        let long = "x".repeat(crate::error::MAX_ERROR_BODY_LEN + 2000);
        Mock::given(method("POST"))
            .and(path("/ws"))
            .respond_with(ResponseTemplate::new(500).set_body_string(long.clone()))
            .mount(&server)
            .await;

        let client = RestClient::new("chebi", &server.uri()).unwrap();
        let response = client
            .post_body_any_status("ws", String::new(), "text/xml", &[], ResponseFormat::Xml)
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 500);
        assert_eq!(response.body().len(), long.len());

        let err = client
            .post_body("ws", String::new(), "text/xml", &[], ResponseFormat::Xml)
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(500));
    }
}
