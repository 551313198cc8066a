//! KEGG REST API (`rest.kegg.jp`)
//!
//! Every operation maps to one URL of the form
//! `/<operation>/<argument>[/<argument>]` and answers with plain text,
//! mostly tab-separated.

use crate::error::{Result, ServiceError};
use crate::params::{check_range, join_list, ParamSpec, QueryParams};
use crate::parse::{non_empty_lines, parse_mapping};
use crate::registry::Registry;
use crate::service::Service;
use crate::transport::RestClient;
use bioservices_common::Settings;
use serde::Serialize;
use std::collections::BTreeMap;

pub const DATABASES: &[&str] = &[
    "kegg", "pathway", "brite", "module", "ko", "genes", "genome", "compound", "glycan",
    "reaction", "rclass", "enzyme", "network", "variant", "disease", "drug", "dgroup",
    "organism",
];

/// Outside databases accepted by `conv`
pub const CONV_DATABASES: &[&str] = &[
    "ncbi-geneid", "ncbi-proteinid", "uniprot", "pubchem", "chebi", "compound", "drug", "glycan",
];

/// Most entries `get` accepts in one request
pub const MAX_GET_ENTRIES: usize = 10;

const GET_OPTION: ParamSpec = ParamSpec::one_of(
    "option",
    &["aaseq", "ntseq", "mol", "kcf", "image", "conf", "kgml", "json"],
);
const FIND_OPTION: ParamSpec =
    ParamSpec::one_of("option", &["formula", "exact_mass", "mol_weight", "nop"]);

/// A KEGG organism from `list/organism`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Organism {
    pub t_number: String,
    pub code: String,
    pub name: String,
    pub lineage: Vec<String>,
}

#[derive(Debug)]
pub struct Kegg {
    client: RestClient,
    organisms: Registry<Vec<Organism>>,
}

impl Service for Kegg {
    const NAME: &'static str = "kegg";
    const DEFAULT_URL: &'static str = "https://rest.kegg.jp";

    fn from_client(client: RestClient, _settings: &Settings) -> Result<Self> {
        Ok(Self {
            client,
            organisms: Registry::new(),
        })
    }

    fn client(&self) -> &RestClient {
        &self.client
    }
}

impl Kegg {
    /// Release and statistics of a database
    pub async fn info(&self, database: &str) -> Result<String> {
        self.check_database(database).await?;
        self.call(&["info", database]).await
    }

    /// Entry list of a database or organism
    pub async fn list(&self, database: &str) -> Result<BTreeMap<String, String>> {
        self.check_database(database).await?;
        let text = self.call(&["list", database]).await?;
        Ok(non_empty_lines(&text)
            .into_iter()
            .filter_map(|line| line.split_once('\t'))
            .map(|(id, description)| (id.to_string(), description.to_string()))
            .collect())
    }

    /// Entries whose keywords or chemical properties match `query`
    pub async fn find(
        &self,
        database: &str,
        query: &str,
        option: Option<&str>,
    ) -> Result<Vec<(String, String)>> {
        self.check_database(database).await?;
        let mut path = vec!["find", database, query];
        if let Some(option) = option {
            FIND_OPTION.check(option)?;
            path.push(option);
        }
        let text = self.call(&path).await?;
        Ok(crate::parse::parse_pairs(&text))
    }

    /// Flat file (or the selected `option`) of up to ten entries
    pub async fn get(&self, ids: &[&str], option: Option<&str>) -> Result<String> {
        if ids.is_empty() {
            return Err(ServiceError::MissingParameter("ids".to_string()));
        }
        check_range("ids", ids.len(), 1, MAX_GET_ENTRIES)?;

        let joined = join_list(ids, "+");
        let mut path = vec!["get", joined.as_str()];
        if let Some(option) = option {
            GET_OPTION.check(option)?;
            path.push(option);
        }
        self.call(&path).await
    }

    /// One entry parsed from its flat file
    pub async fn get_entry(&self, id: &str) -> Result<BTreeMap<String, String>> {
        let text = self.get(&[id], None).await?;
        parse_flat_entries(&text)
            .into_iter()
            .next()
            .ok_or_else(|| ServiceError::parse(format!("KEGG returned no entry for {}", id)))
    }

    /// Identifier conversion between KEGG and outside databases
    ///
    /// `target` and `source` are organism codes, KEGG databases or one of
    /// [`CONV_DATABASES`]; `source` may also be a `+`-joined id list.
    pub async fn conv(&self, target: &str, source: &str) -> Result<BTreeMap<String, Vec<String>>> {
        self.check_conv_database(target).await?;
        if !source.contains(':') {
            self.check_conv_database(source).await?;
        }
        let text = self.call(&["conv", target, source]).await?;
        Ok(parse_mapping(&text))
    }

    /// Cross-references from `source` entries to a `target` database
    pub async fn link(&self, target: &str, source: &str) -> Result<BTreeMap<String, Vec<String>>> {
        self.check_database(target).await?;
        if !source.contains(':') {
            self.check_database(source).await?;
        }
        let text = self.call(&["link", target, source]).await?;
        Ok(parse_mapping(&text))
    }

    /// Pathways of an organism, id to title
    pub async fn pathways(&self, organism: &str) -> Result<BTreeMap<String, String>> {
        if !self.is_organism(organism).await? {
            return Err(ServiceError::invalid_parameter(
                "organism",
                organism,
                &[] as &[&str],
            ));
        }
        let text = self.call(&["list", "pathway", organism]).await?;
        Ok(crate::parse::parse_pairs(&text).into_iter().collect())
    }

    /// Every organism KEGG knows, fetched once
    pub async fn organisms(&self) -> Result<&[Organism]> {
        let organisms = self
            .organisms
            .get_or_fetch(|| async {
                let text = self.call(&["list", "organism"]).await?;
                Ok(parse_organisms(&text))
            })
            .await?;
        Ok(organisms.as_slice())
    }

    pub async fn is_organism(&self, code: &str) -> Result<bool> {
        Ok(self.organisms().await?.iter().any(|o| o.code == code || o.t_number == code))
    }

    async fn check_database(&self, database: &str) -> Result<()> {
        if DATABASES.contains(&database) || self.is_organism(database).await? {
            Ok(())
        } else {
            Err(ServiceError::invalid_parameter("database", database, DATABASES))
        }
    }

    async fn check_conv_database(&self, database: &str) -> Result<()> {
        if CONV_DATABASES.contains(&database) || self.is_organism(database).await? {
            Ok(())
        } else {
            Err(ServiceError::invalid_parameter("database", database, CONV_DATABASES))
        }
    }

    async fn call(&self, segments: &[&str]) -> Result<String> {
        self.client
            .get_text(&segments.join("/"), &QueryParams::new())
            .await
    }
}

fn parse_organisms(text: &str) -> Vec<Organism> {
    non_empty_lines(text)
        .into_iter()
        .filter_map(|line| {
            let mut fields = line.split('\t');
            let t_number = fields.next()?;
            let code = fields.next()?;
            let name = fields.next()?;
            let lineage = fields
                .next()
                .map(|l| l.split(';').map(str::to_string).collect())
                .unwrap_or_default();
            Some(Organism {
                t_number: t_number.to_string(),
                code: code.to_string(),
                name: name.to_string(),
                lineage,
            })
        })
        .collect()
}

/// Width of the field-name column in KEGG flat files
const KEY_WIDTH: usize = 12;

/// Split flat-file text into entries of field name to value
///
/// Continuation lines are appended to the previous field with a newline;
/// a repeated field name (e.g. `REFERENCE`) continues the same value.
pub fn parse_flat_entries(text: &str) -> Vec<BTreeMap<String, String>> {
    let mut entries = Vec::new();
    let mut current: BTreeMap<String, String> = BTreeMap::new();
    let mut key = String::new();

    for line in text.lines() {
        if line.starts_with("///") {
            if !current.is_empty() {
                entries.push(std::mem::take(&mut current));
            }
            key.clear();
            continue;
        }
        if line.trim().is_empty() {
            continue;
        }

        let split = line
            .char_indices()
            .nth(KEY_WIDTH)
            .map_or(line.len(), |(i, _)| i);
        let (head, value) = line.split_at(split);
        let head = head.trim();
        let value = value.trim();

        if !head.is_empty() {
            key = head.to_string();
        }
        if key.is_empty() {
            continue;
        }

        let field = current.entry(key.clone()).or_default();
        if !field.is_empty() {
            field.push('\n');
        }
        field.push_str(value);
    }

    if !current.is_empty() {
        entries.push(current);
    }
    entries
}
