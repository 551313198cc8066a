//! ChEBI chemical entities web service (SOAP)

use crate::error::{Result, ServiceError};
use crate::params::{check_range, ParamSpec};
use crate::parse::XmlElement;
use crate::service::Service;
use crate::transport::{RestClient, SoapClient};
use bioservices_common::{ServiceKind, Settings};
use serde::Serialize;

pub const NAMESPACE: &str = "https://www.ebi.ac.uk/webservices/chebi";

pub const SEARCH_CATEGORIES: &[&str] = &[
    "ALL",
    "CHEBI ID",
    "CHEBI NAME",
    "DEFINITION",
    "ALL NAMES",
    "IUPAC NAME",
    "CITATIONS",
    "REGISTRY NUMBERS",
    "MANUAL XREFS",
    "AUTOMATIC XREFS",
    "FORMULA",
    "MASS",
    "MONOISOTOPIC MASS",
    "CHARGE",
    "INCHI/INCHI KEY",
    "SMILES",
    "SPECIES",
];

pub const STARS: &[&str] = &["ALL", "TWO ONLY", "THREE ONLY"];

pub const MAX_RESULTS: u32 = 5000;

const SEARCH_CATEGORY: ParamSpec = ParamSpec::one_of("searchCategory", SEARCH_CATEGORIES);
const STARS_CATEGORY: ParamSpec = ParamSpec::one_of("starsCategory", STARS);

/// Search hit from `getLiteEntity`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LiteEntity {
    pub chebi_id: String,
    pub name: String,
    pub search_score: f64,
    pub stars: u8,
}

/// The commonly used parts of a complete entity
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChebiEntity {
    pub chebi_id: String,
    pub name: String,
    pub definition: Option<String>,
    pub smiles: Option<String>,
    pub inchi_key: Option<String>,
    pub mass: Option<f64>,
    pub formulae: Vec<String>,
    pub synonyms: Vec<String>,
}

impl ChebiEntity {
    pub fn from_xml(entity: &XmlElement) -> Result<Self> {
        let chebi_id = entity
            .child_text("chebiId")
            .ok_or_else(|| ServiceError::parse("ChEBI entity has no chebiId"))?;

        let owned = |tag: &str| entity.child_text(tag).map(str::to_string);
        let data_of = |tag: &str| -> Vec<String> {
            entity
                .children_named(tag)
                .filter_map(|e| e.child_text("data").map(str::to_string))
                .collect()
        };

        Ok(Self {
            chebi_id: chebi_id.to_string(),
            name: owned("chebiAsciiName").unwrap_or_default(),
            definition: owned("definition"),
            smiles: owned("smiles"),
            inchi_key: owned("inchiKey"),
            mass: entity.child_text("mass").and_then(|m| m.parse().ok()),
            formulae: data_of("Formulae"),
            synonyms: data_of("Synonyms"),
        })
    }
}

#[derive(Debug, Clone)]
pub struct ChEBI {
    soap: SoapClient,
}

impl Service for ChEBI {
    const NAME: &'static str = "chebi";
    const DEFAULT_URL: &'static str = "https://www.ebi.ac.uk/webservices/chebi/2.0/webservice";
    const KIND: ServiceKind = ServiceKind::Soap;

    fn from_client(client: RestClient, _settings: &Settings) -> Result<Self> {
        Ok(Self {
            soap: SoapClient::new(client, NAMESPACE),
        })
    }

    fn client(&self) -> &RestClient {
        self.soap.rest()
    }
}

impl ChEBI {
    /// Search entities; `category` and `stars` take the service's
    /// enumerated values (`"ALL"`, `"CHEBI NAME"`, `"THREE ONLY"`...)
    pub async fn get_lite_entity(
        &self,
        search: &str,
        category: &str,
        max_results: u32,
        stars: &str,
    ) -> Result<Vec<LiteEntity>> {
        SEARCH_CATEGORY.check(category)?;
        STARS_CATEGORY.check(stars)?;
        check_range("maximumResults", max_results, 1, MAX_RESULTS)?;

        let max = max_results.to_string();
        let response = self
            .soap
            .call(
                "getLiteEntity",
                &[
                    ("search", search),
                    ("searchCategory", category),
                    ("maximumResults", max.as_str()),
                    ("starsCategory", stars),
                ],
            )
            .await?;

        Ok(response
            .find_all("ListElement")
            .into_iter()
            .filter_map(|element| {
                Some(LiteEntity {
                    chebi_id: element.child_text("chebiId")?.to_string(),
                    name: element.child_text("chebiAsciiName").unwrap_or_default().to_string(),
                    search_score: element
                        .child_text("searchScore")
                        .and_then(|s| s.parse().ok())
                        .unwrap_or(0.0),
                    stars: element
                        .child_text("entityStar")
                        .and_then(|s| s.parse().ok())
                        .unwrap_or(0),
                })
            })
            .collect())
    }

    /// The complete entity document of one ChEBI id
    pub async fn get_complete_entity_xml(&self, chebi_id: &str) -> Result<XmlElement> {
        let response = self
            .soap
            .call("getCompleteEntity", &[("chebiId", chebi_id)])
            .await?;
        response
            .find("return")
            .cloned()
            .ok_or_else(|| ServiceError::parse(format!("ChEBI returned no entity for {}", chebi_id)))
    }

    pub async fn get_complete_entity(&self, chebi_id: &str) -> Result<ChebiEntity> {
        let entity = self.get_complete_entity_xml(chebi_id).await?;
        ChebiEntity::from_xml(&entity)
    }
}
