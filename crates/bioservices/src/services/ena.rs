//! European Nucleotide Archive
//!
//! Records come from the browser API (`ena/browser/api/<format>/<acc>`);
//! searches go to the portal API, which lives under a different path and
//! has its own base URL override, `urls.ena_portal`.

use crate::error::Result;
use crate::params::{check_range, join_list, ParamSpec, QueryParams};
use crate::parse::{parse_tsv, Table};
use crate::service::Service;
use crate::transport::RestClient;
use bioservices_common::Settings;

pub const PORTAL_NAME: &str = "ena_portal";
pub const PORTAL_URL: &str = "https://www.ebi.ac.uk/ena/portal/api";

pub const DATA_FORMATS: &[&str] = &["fasta", "embl", "xml", "text"];

pub const RESULT_TYPES: &[&str] = &[
    "analysis",
    "assembly",
    "coding",
    "noncoding",
    "read_experiment",
    "read_run",
    "sample",
    "sequence",
    "study",
    "taxon",
    "tsa_set",
    "wgs_set",
];

const DATA_FORMAT: ParamSpec = ParamSpec::one_of("format", DATA_FORMATS);
const RESULT: ParamSpec = ParamSpec::one_of("result", RESULT_TYPES);

#[derive(Debug, Clone)]
pub struct Ena {
    client: RestClient,
    portal: RestClient,
}

impl Service for Ena {
    const NAME: &'static str = "ena";
    const DEFAULT_URL: &'static str = "https://www.ebi.ac.uk/ena/browser/api";

    fn from_client(client: RestClient, settings: &Settings) -> Result<Self> {
        let portal = RestClient::from_settings(PORTAL_NAME, PORTAL_URL, settings)?;
        Ok(Self { client, portal })
    }

    fn client(&self) -> &RestClient {
        &self.client
    }
}

impl Ena {
    /// Point searches at another portal endpoint
    pub fn with_portal_url(mut self, url: &str) -> Result<Self> {
        self.portal = self.client.rebase(PORTAL_NAME, url)?;
        Ok(self)
    }

    /// One record (or a comma-separated list) as fasta, embl, xml or text
    pub async fn get_data(&self, accession: &str, format: &str) -> Result<String> {
        DATA_FORMAT.check(format)?;
        let url = self.client.segments_url(&[format, accession])?;
        self.client.get_text(&url, &QueryParams::new()).await
    }

    /// Portal search returning the requested fields as a table
    pub async fn search(
        &self,
        result: &str,
        query: &str,
        fields: &[&str],
        limit: Option<usize>,
    ) -> Result<Table> {
        let mut params = QueryParams::new();
        params.push_checked(&RESULT, result)?;
        params.push("query", query).push("format", "tsv");
        if !fields.is_empty() {
            params.push("fields", join_list(fields, ","));
        }
        if let Some(limit) = limit {
            check_range("limit", limit, 1, usize::MAX)?;
            params.push("limit", limit);
        }

        let text = self.portal.get_text("search", &params).await?;
        parse_tsv(&text, true)
    }
}
