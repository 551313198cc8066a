//! Reactome Content Service (`reactome.org/ContentService`)

use crate::error::{Result, ServiceError};
use crate::params::QueryParams;
use crate::registry::Registry;
use crate::service::Service;
use crate::transport::RestClient;
use bioservices_common::Settings;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A species Reactome holds pathways for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactomeSpecies {
    pub db_id: u64,
    pub display_name: String,
    #[serde(default)]
    pub tax_id: String,
    #[serde(default)]
    pub abbreviation: String,
}

#[derive(Debug)]
pub struct Reactome {
    client: RestClient,
    species: Registry<Vec<ReactomeSpecies>>,
}

impl Service for Reactome {
    const NAME: &'static str = "reactome";
    const DEFAULT_URL: &'static str = "https://reactome.org/ContentService";

    fn from_client(client: RestClient, _settings: &Settings) -> Result<Self> {
        Ok(Self {
            client,
            species: Registry::new(),
        })
    }

    fn client(&self) -> &RestClient {
        &self.client
    }
}

impl Reactome {
    /// Current release number
    pub async fn database_version(&self) -> Result<String> {
        let text = self
            .client
            .get_text("data/database/version", &QueryParams::new())
            .await?;
        Ok(text.trim().to_string())
    }

    /// Any database object by stable id (`R-HSA-...`) or database id
    pub async fn query(&self, id: &str) -> Result<Value> {
        let url = self.client.segments_url(&["data", "query", id])?;
        self.client.get_json(&url, &QueryParams::new()).await
    }

    /// Lowest-level pathways containing a physical entity
    ///
    /// `species` is a display name or taxonomy id and is checked against
    /// [`Reactome::species`].
    pub async fn pathways_for_entity(&self, id: &str, species: Option<&str>) -> Result<Vec<Value>> {
        let mut params = QueryParams::new();
        if let Some(species) = species {
            let known = self.species().await?;
            let found = known
                .iter()
                .find(|s| s.display_name == species || s.tax_id == species)
                .ok_or_else(|| {
                    let names: Vec<&str> = known.iter().map(|s| s.display_name.as_str()).collect();
                    ServiceError::invalid_parameter("species", species, &names)
                })?;
            params.push("species", &found.tax_id);
        }
        let url = self
            .client
            .segments_url(&["data", "pathways", "low", "entity", id])?;
        self.client.get_json(&url, &params).await
    }

    /// Every species in Reactome, fetched once
    pub async fn species(&self) -> Result<&[ReactomeSpecies]> {
        let species = self
            .species
            .get_or_fetch(|| async {
                self.client
                    .get_json::<Vec<ReactomeSpecies>>("data/species/all", &QueryParams::new())
                    .await
            })
            .await?;
        Ok(species.as_slice())
    }
}
