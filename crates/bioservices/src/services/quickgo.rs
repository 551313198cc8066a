//! QuickGO Gene Ontology browser (`www.ebi.ac.uk/QuickGO/services`)

use crate::error::{Result, ServiceError};
use crate::params::{check_range, join_list, QueryParams};
use crate::service::Service;
use crate::transport::RestClient;
use bioservices_common::Settings;
use serde_json::Value;

/// Largest annotation page QuickGO serves
pub const MAX_ANNOTATIONS: usize = 200;

#[derive(Debug, Clone)]
pub struct QuickGo {
    client: RestClient,
}

impl Service for QuickGo {
    const NAME: &'static str = "quickgo";
    const DEFAULT_URL: &'static str = "https://www.ebi.ac.uk/QuickGO/services";

    fn from_client(client: RestClient, _settings: &Settings) -> Result<Self> {
        Ok(Self { client })
    }

    fn client(&self) -> &RestClient {
        &self.client
    }
}

impl QuickGo {
    /// Term records for GO identifiers (`GO:0003824`)
    pub async fn terms(&self, ids: &[&str]) -> Result<Vec<Value>> {
        if ids.is_empty() {
            return Err(ServiceError::MissingParameter("ids".to_string()));
        }
        for id in ids {
            check_go_id(id)?;
        }

        let ids = join_list(ids, ",");
        let url = self.client.segments_url(&["ontology", "go", "terms", ids.as_str()])?;
        let document: Value = self.client.get_json(&url, &QueryParams::new()).await?;
        Ok(results(document))
    }

    /// GO annotations of gene products (`UniProtKB:P43403`), optionally
    /// limited to some GO terms
    pub async fn annotations(
        &self,
        gene_product_ids: &[&str],
        go_ids: &[&str],
        limit: usize,
    ) -> Result<Vec<Value>> {
        if gene_product_ids.is_empty() {
            return Err(ServiceError::MissingParameter("geneProductId".to_string()));
        }
        check_range("limit", limit, 1, MAX_ANNOTATIONS)?;
        for id in go_ids {
            check_go_id(id)?;
        }

        let mut params = QueryParams::new();
        params.push("geneProductId", join_list(gene_product_ids, ","));
        if !go_ids.is_empty() {
            params.push("goId", join_list(go_ids, ","));
        }
        params.push("limit", limit);

        let document: Value = self.client.get_json("annotation/search", &params).await?;
        Ok(results(document))
    }
}

/// `GO:` followed by seven digits
pub fn is_go_id(id: &str) -> bool {
    id.strip_prefix("GO:")
        .is_some_and(|digits| digits.len() == 7 && digits.bytes().all(|b| b.is_ascii_digit()))
}

fn check_go_id(id: &str) -> Result<()> {
    if is_go_id(id) {
        Ok(())
    } else {
        Err(ServiceError::invalid_parameter("goId", id, &["GO:0000000"]))
    }
}

fn results(mut document: Value) -> Vec<Value> {
    match document["results"].take() {
        Value::Array(items) => items,
        _ => Vec::new(),
    }
}
