//! UniProt REST API (`rest.uniprot.org`)
//!
//! Search and retrieval of UniProtKB entries plus the asynchronous ID
//! mapping service. Search results are paged by the server through
//! `Link: <...>; rel="next"` headers; [`UniProt::search`] follows them
//! until the requested number of records is collected.

use crate::error::{Result, ServiceError};
use crate::params::{check_in, join_list, ParamSpec, QueryParams};
use crate::parse::non_empty_lines;
use crate::registry::Registry;
use crate::service::Service;
use crate::transport::RestClient;
use bioservices_common::{ResponseFormat, Settings};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::debug;

/// Largest page the search endpoint serves
pub const PAGE_SIZE: usize = 500;

pub const SEARCH_FORMATS: &[&str] = &["json", "tsv", "list", "fasta"];

pub const RETRIEVE_FORMATS: &[&str] = &["json", "fasta", "txt", "xml", "gff", "rdf", "tsv"];

const SEARCH_FORMAT: ParamSpec = ParamSpec::one_of("format", SEARCH_FORMATS);
const RETRIEVE_FORMAT: ParamSpec = ParamSpec::one_of("format", RETRIEVE_FORMATS);

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(3);
const DEFAULT_MAX_POLLS: usize = 100;

/// A database usable in ID mapping
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingDatabase {
    pub name: String,
    #[serde(rename = "displayName", default)]
    pub display_name: String,
    #[serde(default)]
    pub from: bool,
    #[serde(default)]
    pub to: bool,
}

#[derive(Debug)]
pub struct UniProt {
    client: RestClient,
    poll_interval: Duration,
    max_polls: usize,
    mapping_databases: Registry<Vec<MappingDatabase>>,
}

impl Service for UniProt {
    const NAME: &'static str = "uniprot";
    const DEFAULT_URL: &'static str = "https://rest.uniprot.org";

    fn from_client(client: RestClient, _settings: &Settings) -> Result<Self> {
        Ok(Self {
            client,
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_polls: DEFAULT_MAX_POLLS,
            mapping_databases: Registry::new(),
        })
    }

    fn client(&self) -> &RestClient {
        &self.client
    }
}

impl UniProt {
    /// Delay between ID mapping status checks
    pub fn with_poll_interval(mut self, interval: Duration, max_polls: usize) -> Self {
        self.poll_interval = interval;
        self.max_polls = max_polls.max(1);
        self
    }

    /// Search UniProtKB
    ///
    /// `fields` selects the returned columns (`accession`, `gene_names`,
    /// `length`, ...); empty means the server default. With `limit` unset
    /// every page is fetched. Pages are merged into a single document in
    /// the requested format: one header line for `tsv`, a single
    /// `{"results": [...]}` object for `json`.
    pub async fn search(
        &self,
        query: &str,
        format: &str,
        fields: &[&str],
        limit: Option<usize>,
    ) -> Result<String> {
        SEARCH_FORMAT.check(format)?;
        if let Some(limit) = limit {
            crate::params::check_range("limit", limit, 1, usize::MAX)?;
        }

        let mut params = QueryParams::new();
        params.push("query", query).push("format", format);
        if !fields.is_empty() {
            params.push("fields", join_list(fields, ","));
        }
        params.push("size", limit.map_or(PAGE_SIZE, |l| l.min(PAGE_SIZE)));

        let accept = accept_for(format);
        let mut url = self.client.url_with_params("uniprotkb/search", &params)?;
        let mut records = Records::for_format(format);
        let mut pages = 0;

        loop {
            let response = self.client.get_url(&url, accept).await?;
            records.add_page(&response.text()?)?;
            pages += 1;

            match response.next_link() {
                Some(next) if limit.map_or(true, |l| records.len() < l) => url = next,
                _ => break,
            }
        }

        if let Some(limit) = limit {
            records.truncate(limit);
        }
        debug!(query, pages, records = records.len(), "UniProt search done");
        records.render()
    }

    /// Search and return the JSON result objects
    pub async fn search_json(
        &self,
        query: &str,
        fields: &[&str],
        limit: Option<usize>,
    ) -> Result<Vec<Value>> {
        let text = self.search(query, "json", fields, limit).await?;
        let mut document: Value = serde_json::from_str(&text)?;
        Ok(match document["results"].take() {
            Value::Array(items) => items,
            _ => Vec::new(),
        })
    }

    /// One entry in the given format
    pub async fn retrieve(&self, accession: &str, format: &str) -> Result<String> {
        RETRIEVE_FORMAT.check(format)?;
        let mut params = QueryParams::new();
        params.push("format", format);
        let url = self.client.segments_url(&["uniprotkb", accession])?;
        let url = self.client.url_with_params(&url, &params)?;
        self.client.get_url(&url, accept_for(format)).await?.text()
    }

    /// One entry as a JSON document
    pub async fn entry(&self, accession: &str) -> Result<Value> {
        let text = self.retrieve(accession, "json").await?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Cross-reference ids of `database` (e.g. `PDB`) in an entry
    pub async fn cross_references(&self, accession: &str, database: &str) -> Result<Vec<String>> {
        let entry = self.entry(accession).await?;
        Ok(cross_references(&entry, database))
    }

    /// Databases accepted by [`UniProt::id_mapping`]
    pub async fn mapping_databases(&self) -> Result<&[MappingDatabase]> {
        let databases = self
            .mapping_databases
            .get_or_fetch(|| async {
                let document: Value = self
                    .client
                    .get_json("configure/idmapping/fields", &QueryParams::new())
                    .await?;
                parse_mapping_databases(&document)
            })
            .await?;
        Ok(databases.as_slice())
    }

    /// Map identifiers between databases
    ///
    /// Submits a job, polls until it finishes and collects every result
    /// page. Identifiers the service could not map are absent from the
    /// returned map.
    pub async fn id_mapping(
        &self,
        from: &str,
        to: &str,
        ids: &[&str],
    ) -> Result<BTreeMap<String, Vec<String>>> {
        if ids.is_empty() {
            return Err(ServiceError::MissingParameter("ids".to_string()));
        }

        let databases = self.mapping_databases().await?;
        let sources: Vec<&str> = databases
            .iter()
            .filter(|db| db.from)
            .map(|db| db.name.as_str())
            .collect();
        let targets: Vec<&str> = databases
            .iter()
            .filter(|db| db.to)
            .map(|db| db.name.as_str())
            .collect();
        check_in("from", from, &sources)?;
        check_in("to", to, &targets)?;

        let mut form = QueryParams::new();
        form.push("from", from)
            .push("to", to)
            .push("ids", join_list(ids, ","));
        let submitted: Value = self
            .client
            .post_form("idmapping/run", &form, ResponseFormat::Json)
            .await?
            .json()?;
        let job_id = submitted["jobId"]
            .as_str()
            .ok_or_else(|| ServiceError::parse("ID mapping submission returned no jobId"))?
            .to_string();
        debug!(job_id = %job_id, from, to, count = ids.len(), "Submitted ID mapping job");

        let mut url = self.wait_for_job(&job_id).await?;
        let mut mapping: BTreeMap<String, Vec<String>> = BTreeMap::new();

        loop {
            let response = self.client.get_url(&url, ResponseFormat::Json).await?;
            let page: Value = response.json()?;
            collect_mapping(&page, &mut mapping);
            match response.next_link() {
                Some(next) => url = next,
                None => break,
            }
        }

        Ok(mapping)
    }

    /// Poll the job status; returns the URL of the first results page
    async fn wait_for_job(&self, job_id: &str) -> Result<String> {
        let mut results = QueryParams::new();
        results.push("size", PAGE_SIZE);
        let results_url = self.client.segments_url(&["idmapping", "results", job_id])?;
        let results_url = self.client.url_with_params(&results_url, &results)?;
        let status_url = self.client.segments_url(&["idmapping", "status", job_id])?;

        for _ in 0..self.max_polls {
            // Status changes between polls and must never be served from the cache
            let status: Value = self
                .client
                .get_fresh(&status_url, &QueryParams::new(), ResponseFormat::Json)
                .await?
                .json()?;

            // A finished job may redirect straight to its results
            if status.get("results").is_some() {
                return Ok(results_url);
            }

            match status["jobStatus"].as_str() {
                Some("FINISHED") => return Ok(results_url),
                Some("NEW") | Some("RUNNING") => {
                    debug!(job_id, "ID mapping job still running");
                    tokio::time::sleep(self.poll_interval).await;
                },
                other => {
                    return Err(ServiceError::JobFailed {
                        service: Self::NAME.to_string(),
                        job_id: job_id.to_string(),
                        status: other.unwrap_or("unknown").to_string(),
                    })
                },
            }
        }

        Err(ServiceError::JobFailed {
            service: Self::NAME.to_string(),
            job_id: job_id.to_string(),
            status: "still running after polling limit".to_string(),
        })
    }
}

fn accept_for(format: &str) -> ResponseFormat {
    match format {
        "json" => ResponseFormat::Json,
        "xml" | "rdf" => ResponseFormat::Xml,
        _ => ResponseFormat::Text,
    }
}

fn parse_mapping_databases(document: &Value) -> Result<Vec<MappingDatabase>> {
    let groups = document["groups"]
        .as_array()
        .ok_or_else(|| ServiceError::parse("ID mapping fields document has no groups"))?;

    let mut databases = Vec::new();
    for group in groups {
        if let Some(items) = group["items"].as_array() {
            for item in items {
                databases.push(serde_json::from_value(item.clone())?);
            }
        }
    }
    Ok(databases)
}

fn collect_mapping(page: &Value, mapping: &mut BTreeMap<String, Vec<String>>) {
    let Some(results) = page["results"].as_array() else {
        return;
    };

    for result in results {
        let Some(from) = result["from"].as_str() else {
            continue;
        };
        let to = match &result["to"] {
            Value::String(s) => Some(s.clone()),
            Value::Object(entry) => entry
                .get("primaryAccession")
                .and_then(Value::as_str)
                .map(str::to_string),
            _ => None,
        };
        if let Some(to) = to {
            mapping.entry(from.to_string()).or_default().push(to);
        }
    }
}

/// Ids of one database in an entry's `uniProtKBCrossReferences`
pub fn cross_references(entry: &Value, database: &str) -> Vec<String> {
    entry["uniProtKBCrossReferences"]
        .as_array()
        .map(|refs| {
            refs.iter()
                .filter(|r| r["database"].as_str() == Some(database))
                .filter_map(|r| r["id"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

/// Search pages accumulated across pagination
#[derive(Debug)]
enum Records {
    Json(Vec<Value>),
    Table {
        header: Option<String>,
        rows: Vec<String>,
    },
    Lines(Vec<String>),
    Fasta(Vec<String>),
}

impl Records {
    fn for_format(format: &str) -> Self {
        match format {
            "json" => Records::Json(Vec::new()),
            "tsv" => Records::Table {
                header: None,
                rows: Vec::new(),
            },
            "fasta" => Records::Fasta(Vec::new()),
            _ => Records::Lines(Vec::new()),
        }
    }

    fn add_page(&mut self, text: &str) -> Result<()> {
        match self {
            Records::Json(items) => {
                let mut page: Value = serde_json::from_str(text)?;
                if let Value::Array(results) = page["results"].take() {
                    items.extend(results);
                }
            },
            Records::Table { header, rows } => {
                let mut lines = non_empty_lines(text).into_iter();
                if let Some(first) = lines.next() {
                    header.get_or_insert_with(|| first.to_string());
                }
                rows.extend(lines.map(str::to_string));
            },
            Records::Lines(lines) => {
                lines.extend(non_empty_lines(text).into_iter().map(str::to_string));
            },
            Records::Fasta(records) => {
                for line in non_empty_lines(text) {
                    if line.starts_with('>') || records.is_empty() {
                        records.push(String::new());
                    }
                    if let Some(record) = records.last_mut() {
                        record.push_str(line);
                        record.push('\n');
                    }
                }
            },
        }
        Ok(())
    }

    fn len(&self) -> usize {
        match self {
            Records::Json(items) => items.len(),
            Records::Table { rows, .. } => rows.len(),
            Records::Lines(lines) | Records::Fasta(lines) => lines.len(),
        }
    }

    fn truncate(&mut self, len: usize) {
        match self {
            Records::Json(items) => items.truncate(len),
            Records::Table { rows, .. } => rows.truncate(len),
            Records::Lines(lines) | Records::Fasta(lines) => lines.truncate(len),
        }
    }

    fn render(self) -> Result<String> {
        Ok(match self {
            Records::Json(items) => serde_json::to_string(&serde_json::json!({ "results": items }))?,
            Records::Table { header, rows } => {
                let mut out = String::new();
                for line in header.iter().chain(rows.iter()) {
                    out.push_str(line);
                    out.push('\n');
                }
                out
            },
            Records::Lines(lines) => lines.iter().map(|l| format!("{}\n", l)).collect(),
            Records::Fasta(records) => records.concat(),
        })
    }
}
