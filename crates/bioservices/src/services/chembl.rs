//! ChEMBL web services (`www.ebi.ac.uk/chembl/api/data`)
//!
//! Collections are paged with `limit`/`offset`; each JSON page carries a
//! `page_meta.next` path that is followed until enough records are read.

use crate::error::{Result, ServiceError};
use crate::params::{check_range, ParamSpec, QueryParams};
use crate::service::Service;
use crate::transport::RestClient;
use bioservices_common::{ResponseFormat, Settings};
use reqwest::Url;
use serde_json::Value;

pub const RESOURCES: &[&str] = &[
    "activity",
    "assay",
    "atc_class",
    "binding_site",
    "biotherapeutic",
    "cell_line",
    "chembl_id_lookup",
    "compound_record",
    "compound_structural_alert",
    "document",
    "document_similarity",
    "drug",
    "drug_indication",
    "drug_warning",
    "go_slim",
    "mechanism",
    "metabolism",
    "molecule",
    "molecule_form",
    "organism",
    "protein_classification",
    "source",
    "target",
    "target_component",
    "target_relation",
    "tissue",
    "xref_source",
];

/// Resources with a full-text `search` endpoint
pub const SEARCHABLE: &[&str] = &[
    "activity",
    "assay",
    "chembl_id_lookup",
    "document",
    "molecule",
    "protein_classification",
    "target",
];

const RESOURCE: ParamSpec = ParamSpec::one_of("resource", RESOURCES);
const SEARCH_RESOURCE: ParamSpec = ParamSpec::one_of("resource", SEARCHABLE);

/// Largest page the API serves
pub const MAX_PAGE_SIZE: usize = 1000;

#[derive(Debug, Clone)]
pub struct ChEMBL {
    client: RestClient,
}

impl Service for ChEMBL {
    const NAME: &'static str = "chembl";
    const DEFAULT_URL: &'static str = "https://www.ebi.ac.uk/chembl/api/data";

    fn from_client(client: RestClient, _settings: &Settings) -> Result<Self> {
        Ok(Self { client })
    }

    fn client(&self) -> &RestClient {
        &self.client
    }
}

impl ChEMBL {
    /// One record by its ChEMBL id (or resource key)
    pub async fn get(&self, resource: &str, id: &str) -> Result<Value> {
        RESOURCE.check(resource)?;
        let mut params = QueryParams::new();
        params.push("format", "json");
        let url = self.client.segments_url(&[resource, id])?;
        self.client.get_json(&url, &params).await
    }

    /// Full-text search in a resource
    pub async fn search(&self, resource: &str, query: &str, limit: Option<usize>) -> Result<Vec<Value>> {
        SEARCH_RESOURCE.check(resource)?;
        let mut params = QueryParams::new();
        params.push("q", query);
        self.collect(&format!("{}/search", resource), params, limit).await
    }

    /// Records matching Django-style filters, e.g.
    /// `("pref_name__iexact", "aspirin")`
    pub async fn filter(
        &self,
        resource: &str,
        filters: &[(&str, &str)],
        limit: Option<usize>,
    ) -> Result<Vec<Value>> {
        RESOURCE.check(resource)?;
        let params = QueryParams::from_pairs(filters);
        self.collect(resource, params, limit).await
    }

    /// Molecules similar to a SMILES string; `similarity` is a percentage
    pub async fn similarity(
        &self,
        smiles: &str,
        similarity: u32,
        limit: Option<usize>,
    ) -> Result<Vec<Value>> {
        check_range("similarity", similarity, 40, 100)?;
        let similarity = similarity.to_string();
        let url = self
            .client
            .segments_url(&["similarity", smiles, similarity.as_str()])?;
        self.collect(&url, QueryParams::new(), limit).await
    }

    /// Molecules containing a SMILES substructure
    pub async fn substructure(&self, smiles: &str, limit: Option<usize>) -> Result<Vec<Value>> {
        let url = self.client.segments_url(&["substructure", smiles])?;
        self.collect(&url, QueryParams::new(), limit).await
    }

    /// Database release information
    pub async fn status(&self) -> Result<Value> {
        let mut params = QueryParams::new();
        params.push("format", "json");
        self.client.get_json("status", &params).await
    }

    async fn collect(&self, path: &str, mut params: QueryParams, limit: Option<usize>) -> Result<Vec<Value>> {
        if let Some(limit) = limit {
            check_range("limit", limit, 1, usize::MAX)?;
        }
        params
            .push("format", "json")
            .push("limit", limit.map_or(MAX_PAGE_SIZE, |l| l.min(MAX_PAGE_SIZE)));

        let mut url = self.client.url_with_params(path, &params)?;
        let mut items = Vec::new();

        loop {
            let page: Value = self.client.get_url(&url, ResponseFormat::Json).await?.json()?;
            items.extend(page_items(&page));

            let next = page["page_meta"]["next"].as_str();
            match next {
                Some(next) if limit.map_or(true, |l| items.len() < l) => {
                    url = self.resolve(next)?;
                },
                _ => break,
            }
        }

        if let Some(limit) = limit {
            items.truncate(limit);
        }
        Ok(items)
    }

    /// `page_meta.next` is a server-absolute path
    fn resolve(&self, next: &str) -> Result<String> {
        let base = Url::parse(self.client.base_url()).map_err(|e| ServiceError::InvalidUrl {
            url: self.client.base_url().to_string(),
            message: e.to_string(),
        })?;
        base.join(next)
            .map(|url| url.to_string())
            .map_err(|e| ServiceError::InvalidUrl {
                url: next.to_string(),
                message: e.to_string(),
            })
    }
}

/// Records of a page: the first array field other than `page_meta`
fn page_items(page: &Value) -> Vec<Value> {
    page.as_object()
        .and_then(|fields| {
            fields
                .iter()
                .filter(|(key, _)| key.as_str() != "page_meta")
                .find_map(|(_, value)| value.as_array())
        })
        .cloned()
        .unwrap_or_default()
}
