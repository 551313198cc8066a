//! Ensembl REST API (`rest.ensembl.org`)

use crate::error::{Result, ServiceError};
use crate::params::{ParamSpec, QueryParams};
use crate::registry::Registry;
use crate::service::Service;
use crate::transport::RestClient;
use bioservices_common::Settings;
use serde::{Deserialize, Serialize};
use serde_json::Value;

const SEQUENCE_TYPE: ParamSpec = ParamSpec::one_of("type", &["genomic", "cds", "cdna", "protein"]);

/// A species from `info/species`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnsemblSpecies {
    pub name: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub common_name: String,
    #[serde(default)]
    pub assembly: String,
    #[serde(default)]
    pub taxon_id: String,
    #[serde(default)]
    pub aliases: Vec<String>,
}

#[derive(Debug)]
pub struct Ensembl {
    client: RestClient,
    species: Registry<Vec<EnsemblSpecies>>,
}

impl Service for Ensembl {
    const NAME: &'static str = "ensembl";
    const DEFAULT_URL: &'static str = "https://rest.ensembl.org";

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

impl Ensembl {
    /// Gene, transcript or protein by stable id; `expand` includes children
    pub async fn lookup_id(&self, id: &str, expand: bool) -> Result<Value> {
        let mut params = QueryParams::new();
        params.push("expand", u8::from(expand));
        let url = self.client.segments_url(&["lookup", "id", id])?;
        self.client.get_json(&url, &params).await
    }

    /// Gene by symbol in one species
    pub async fn lookup_symbol(&self, species: &str, symbol: &str) -> Result<Value> {
        self.check_species(species).await?;
        let url = self.client.segments_url(&["lookup", "symbol", species, symbol])?;
        self.client.get_json(&url, &QueryParams::new()).await
    }

    /// Sequence of a stable id; `seq_type` is genomic, cds, cdna or protein
    pub async fn sequence_id(&self, id: &str, seq_type: &str) -> Result<Value> {
        let mut params = QueryParams::new();
        params.push_checked(&SEQUENCE_TYPE, seq_type)?;
        let url = self.client.segments_url(&["sequence", "id", id])?;
        self.client.get_json(&url, &params).await
    }

    /// Cross references of a stable id, optionally limited to one database
    pub async fn xrefs_id(&self, id: &str, external_db: Option<&str>) -> Result<Vec<Value>> {
        let mut params = QueryParams::new();
        params.push_opt("external_db", external_db);
        let url = self.client.segments_url(&["xrefs", "id", id])?;
        self.client.get_json(&url, &params).await
    }

    /// Species served by this Ensembl release, fetched once
    pub async fn species(&self) -> Result<&[EnsemblSpecies]> {
        let species = self
            .species
            .get_or_fetch(|| async {
                let mut document: Value = self
                    .client
                    .get_json("info/species", &QueryParams::new())
                    .await?;
                match document["species"].take() {
                    Value::Array(items) => items
                        .into_iter()
                        .map(|item| serde_json::from_value(item).map_err(ServiceError::from))
                        .collect(),
                    _ => Err(ServiceError::parse("Ensembl species list is missing")),
                }
            })
            .await?;
        Ok(species.as_slice())
    }

    async fn check_species(&self, species: &str) -> Result<()> {
        let known = self.species().await?;
        let found = known
            .iter()
            .any(|s| s.name == species || s.aliases.iter().any(|a| a == species));
        if found {
            Ok(())
        } else {
            let names: Vec<&str> = known.iter().map(|s| s.name.as_str()).collect();
            Err(ServiceError::invalid_parameter("species", species, &names))
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn mount_species(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/info/species"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "species": [
                    {"name": "homo_sapiens", "display_name": "Human", "taxon_id": "9606",
                     "assembly": "GRCh38", "aliases": ["human", "hsap"]},
                    {"name": "mus_musculus", "display_name": "Mouse", "taxon_id": "10090"}
                ]
            })))
            .expect(1)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_lookup_symbol_checks_species_once() {
        let server = MockServer::start().await;
        mount_species(&server).await;
        Mock::given(method("GET"))
            .and(path("/lookup/symbol/human/BRCA2"))
            .and(header("accept", "application/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "ENSG00000139618", "display_name": "BRCA2"
            })))
            .mount(&server)
            .await;

        let ensembl = Ensembl::with_base_url(&server.uri()).unwrap();
        let gene = ensembl.lookup_symbol("human", "BRCA2").await.unwrap();
        assert_eq!(gene["id"], "ENSG00000139618");

        let err = ensembl.lookup_symbol("dragon", "BRCA2").await.unwrap_err();
        match err {
            ServiceError::InvalidParameter { allowed, .. } => {
                assert_eq!(allowed, vec!["homo_sapiens", "mus_musculus"]);
            },
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_sequence_type_validated() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/sequence/id/ENST00000380152"))
            .and(query_param("type", "protein"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "ENSP00000369497", "molecule": "protein", "seq": "MPIGSKERPTFFEIFKTRCNKADLGPISLNWFEEL"
            })))
            .mount(&server)
            .await;

        let ensembl = Ensembl::with_base_url(&server.uri()).unwrap();
        let sequence = ensembl.sequence_id("ENST00000380152", "protein").await.unwrap();
        assert_eq!(sequence["molecule"], "protein");
        assert!(sequence["seq"].as_str().unwrap().starts_with("MPIGSKERPT"));

        let err = ensembl.sequence_id("ENST00000380152", "rna").await.unwrap_err();
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn test_xrefs_with_external_db() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/xrefs/id/ENSG00000139618"))
            .and(query_param("external_db", "HGNC"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"dbname": "HGNC", "primary_id": "HGNC:1101", "display_id": "BRCA2"}
            ])))
            .mount(&server)
            .await;

        let ensembl = Ensembl::with_base_url(&server.uri()).unwrap();
        let xrefs = ensembl.xrefs_id("ENSG00000139618", Some("HGNC")).await.unwrap();
        assert_eq!(xrefs[0]["display_id"], "BRCA2");
    }
}
