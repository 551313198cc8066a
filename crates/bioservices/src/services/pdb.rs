//! RCSB Protein Data Bank
//!
//! Three hosts are involved: coordinate files (`files.rcsb.org`), entry
//! metadata (`data.rcsb.org`, the main base URL) and the search API
//! (`search.rcsb.org`). Files and search have their own overrides,
//! `urls.pdb_files` and `urls.pdb_search`.

use crate::error::Result;
use crate::params::{ParamSpec, QueryParams};
use crate::service::Service;
use crate::transport::RestClient;
use bioservices_common::{ResponseFormat, Settings};
use serde_json::{json, Value};

pub const FILES_NAME: &str = "pdb_files";
pub const FILES_URL: &str = "https://files.rcsb.org/download";
pub const SEARCH_NAME: &str = "pdb_search";
pub const SEARCH_URL: &str = "https://search.rcsb.org/rcsbsearch/v2";

pub const FILE_FORMATS: &[&str] = &["pdb", "cif", "xml"];

const FILE_FORMAT: ParamSpec = ParamSpec::one_of("format", FILE_FORMATS);

const UNIPROT_ATTRIBUTE: &str =
    "rcsb_polymer_entity_container_identifiers.reference_sequence_identifiers.database_accession";

#[derive(Debug, Clone)]
pub struct Pdb {
    client: RestClient,
    files: RestClient,
    search: RestClient,
}

impl Service for Pdb {
    const NAME: &'static str = "pdb";
    const DEFAULT_URL: &'static str = "https://data.rcsb.org/rest/v1";

    fn from_client(client: RestClient, settings: &Settings) -> Result<Self> {
        Ok(Self {
            client,
            files: RestClient::from_settings(FILES_NAME, FILES_URL, settings)?,
            search: RestClient::from_settings(SEARCH_NAME, SEARCH_URL, settings)?,
        })
    }

    fn client(&self) -> &RestClient {
        &self.client
    }
}

impl Pdb {
    /// Use other file and search endpoints with the data client's
    /// timeout, user agent and cache
    pub fn with_endpoints(mut self, files_url: &str, search_url: &str) -> Result<Self> {
        self.files = self.client.rebase(FILES_NAME, files_url)?;
        self.search = self.client.rebase(SEARCH_NAME, search_url)?;
        Ok(self)
    }

    /// Coordinate file of an entry: pdb, cif or xml
    pub async fn get_file(&self, id: &str, format: &str) -> Result<String> {
        FILE_FORMAT.check(format)?;
        let file = format!("{}.{}", id.to_uppercase(), format);
        let url = self.files.segments_url(&[file])?;
        self.files.get_text(&url, &QueryParams::new()).await
    }

    /// Entry metadata
    pub async fn get_entry(&self, id: &str) -> Result<Value> {
        let id = id.to_uppercase();
        let url = self.client.segments_url(&["core", "entry", id.as_str()])?;
        self.client.get_json(&url, &QueryParams::new()).await
    }

    /// Entries with a polymer mapped to a UniProt accession
    pub async fn search_uniprot(&self, accession: &str) -> Result<Vec<String>> {
        let query = json!({
            "query": {
                "type": "terminal",
                "service": "text",
                "parameters": {
                    "attribute": UNIPROT_ATTRIBUTE,
                    "operator": "exact_match",
                    "value": accession,
                }
            },
            "return_type": "entry",
            "request_options": {"return_all_hits": true}
        });

        let response = self
            .search
            .post_json("query", &query, ResponseFormat::Json)
            .await?;
        // No hits is a 204 with an empty body
        if response.is_empty() {
            return Ok(Vec::new());
        }

        let result: Value = response.json()?;
        Ok(result["result_set"]
            .as_array()
            .map(|hits| {
                hits.iter()
                    .filter_map(|hit| hit["identifier"].as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default())
    }
}
