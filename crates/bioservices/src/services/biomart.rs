//! BioMart martservice (`www.ensembl.org/biomart/martservice`)
//!
//! Metadata (marts, datasets, attributes, filters) comes from `type=`
//! queries; data queries are XML documents built with [`BioMartQuery`]
//! and posted as the `query` form field.

use crate::error::{Result, ServiceError};
use crate::params::QueryParams;
use crate::parse::{non_empty_lines, parse_tsv, Table};
use crate::registry::Registry;
use crate::service::Service;
use crate::transport::RestClient;
use bioservices_common::{ResponseFormat, Settings};
use quick_xml::escape::escape;
use serde::Serialize;
use std::collections::BTreeMap;

/// A mart from the registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Mart {
    pub name: String,
    pub display_name: String,
    pub visible: bool,
}

/// A dataset inside a mart
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dataset {
    pub name: String,
    pub display_name: String,
}

/// A data query in BioMart's XML query language
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BioMartQuery {
    dataset: String,
    virtual_schema: String,
    attributes: Vec<String>,
    filters: Vec<(String, String)>,
    header: bool,
    unique_rows: bool,
}

impl BioMartQuery {
    pub fn new(dataset: impl Into<String>) -> Self {
        Self {
            dataset: dataset.into(),
            virtual_schema: "default".to_string(),
            attributes: Vec::new(),
            filters: Vec::new(),
            header: true,
            unique_rows: false,
        }
    }

    pub fn virtual_schema(mut self, schema: impl Into<String>) -> Self {
        self.virtual_schema = schema.into();
        self
    }

    pub fn attribute(mut self, name: impl Into<String>) -> Self {
        self.attributes.push(name.into());
        self
    }

    pub fn attributes<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attributes.extend(names.into_iter().map(Into::into));
        self
    }

    /// Filter on a value; several values are comma-separated
    pub fn filter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.push((name.into(), value.into()));
        self
    }

    pub fn header(mut self, header: bool) -> Self {
        self.header = header;
        self
    }

    pub fn unique_rows(mut self, unique: bool) -> Self {
        self.unique_rows = unique;
        self
    }

    pub fn dataset(&self) -> &str {
        &self.dataset
    }

    pub fn to_xml(&self) -> String {
        let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?><!DOCTYPE Query>");
        xml.push_str(&format!(
            "<Query virtualSchemaName=\"{}\" formatter=\"TSV\" header=\"{}\" uniqueRows=\"{}\" datasetConfigVersion=\"0.6\">",
            escape(self.virtual_schema.as_str()),
            u8::from(self.header),
            u8::from(self.unique_rows),
        ));
        xml.push_str(&format!(
            "<Dataset name=\"{}\" interface=\"default\">",
            escape(self.dataset.as_str())
        ));
        for (name, value) in &self.filters {
            xml.push_str(&format!(
                "<Filter name=\"{}\" value=\"{}\"/>",
                escape(name.as_str()),
                escape(value.as_str())
            ));
        }
        for name in &self.attributes {
            xml.push_str(&format!("<Attribute name=\"{}\"/>", escape(name.as_str())));
        }
        xml.push_str("</Dataset></Query>");
        xml
    }
}

#[derive(Debug)]
pub struct BioMart {
    client: RestClient,
    marts: Registry<Vec<Mart>>,
}

impl Service for BioMart {
    const NAME: &'static str = "biomart";
    const DEFAULT_URL: &'static str = "https://www.ensembl.org/biomart/martservice";

    fn from_client(client: RestClient, _settings: &Settings) -> Result<Self> {
        Ok(Self {
            client,
            marts: Registry::new(),
        })
    }

    fn client(&self) -> &RestClient {
        &self.client
    }
}

impl BioMart {
    /// Marts served by this host, fetched once
    pub async fn registry(&self) -> Result<&[Mart]> {
        let marts = self
            .marts
            .get_or_fetch(|| async {
                let mut params = QueryParams::new();
                params.push("type", "registry");
                let document = self.client.get_xml("", &params).await?;
                Ok(document
                    .find_all("MartURLLocation")
                    .into_iter()
                    .filter_map(|location| {
                        Some(Mart {
                            name: location.attr("name")?.to_string(),
                            display_name: location
                                .attr("displayName")
                                .unwrap_or_default()
                                .to_string(),
                            visible: location.attr("visible") != Some("0"),
                        })
                    })
                    .collect())
            })
            .await?;
        Ok(marts.as_slice())
    }

    pub async fn datasets(&self, mart: &str) -> Result<Vec<Dataset>> {
        let marts = self.registry().await?;
        if !marts.iter().any(|m| m.name == mart) {
            let names: Vec<&str> = marts.iter().map(|m| m.name.as_str()).collect();
            return Err(ServiceError::invalid_parameter("mart", mart, &names));
        }

        let text = self.metadata("datasets", "mart", mart).await?;
        Ok(non_empty_lines(&text)
            .into_iter()
            .filter_map(|line| {
                let mut columns = line.split('\t').skip(1);
                let name = columns.next()?.trim();
                let display_name = columns.next().unwrap_or_default().trim();
                (!name.is_empty()).then(|| Dataset {
                    name: name.to_string(),
                    display_name: display_name.to_string(),
                })
            })
            .collect())
    }

    /// Attribute name to display name
    pub async fn attributes(&self, dataset: &str) -> Result<BTreeMap<String, String>> {
        let text = self.metadata("attributes", "dataset", dataset).await?;
        Ok(first_two_columns(&text))
    }

    /// Filter name to display name
    pub async fn filters(&self, dataset: &str) -> Result<BTreeMap<String, String>> {
        let text = self.metadata("filters", "dataset", dataset).await?;
        Ok(first_two_columns(&text))
    }

    /// Run a data query
    pub async fn query(&self, query: &BioMartQuery) -> Result<Table> {
        if query.attributes.is_empty() {
            return Err(ServiceError::MissingParameter("attributes".to_string()));
        }

        let mut form = QueryParams::new();
        form.push("query", query.to_xml());
        let text = self
            .client
            .post_form("", &form, ResponseFormat::Text)
            .await?
            .text()?;

        check_query_error(&text)?;
        parse_tsv(&text, query.header)
    }

    async fn metadata(&self, kind: &str, key: &str, value: &str) -> Result<String> {
        let mut params = QueryParams::new();
        params.push("type", kind).push(key, value);
        let text = self.client.get_text("", &params).await?;
        check_query_error(&text)?;
        Ok(text)
    }
}

/// BioMart answers errors with a 200 and a "Query ERROR" body
fn check_query_error(text: &str) -> Result<()> {
    let trimmed = text.trim_start();
    if trimmed.starts_with("Query ERROR") || trimmed.starts_with("Problem retrieving") {
        return Err(ServiceError::remote(BioMart::NAME, trimmed.trim_end()));
    }
    Ok(())
}

fn first_two_columns(text: &str) -> BTreeMap<String, String> {
    non_empty_lines(text)
        .into_iter()
        .filter_map(|line| {
            let mut columns = line.split('\t');
            let name = columns.next()?.trim();
            let display = columns.next().unwrap_or_default().trim();
            Some((name.to_string(), display.to_string()))
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::parse::XmlElement;
    use wiremock::matchers::{body_string_contains, method, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_query_xml() {
        let query = BioMartQuery::new("hsapiens_gene_ensembl")
            .filter("chromosome_name", "1")
            .filter("hgnc_symbol", "A<B")
            .attributes(["ensembl_gene_id", "hgnc_symbol"])
            .unique_rows(true);

        let xml = query.to_xml();
        assert!(xml.contains("<Filter name=\"hgnc_symbol\" value=\"A&lt;B\"/>"));
        let parsed = XmlElement::parse(&xml).unwrap();
        assert_eq!(parsed.attr("uniqueRows"), Some("1"));
        assert_eq!(parsed.attr("header"), Some("1"));
        let dataset = parsed.child("Dataset").unwrap();
        assert_eq!(dataset.attr("name"), Some("hsapiens_gene_ensembl"));
        assert_eq!(dataset.children_named("Attribute").count(), 2);
        assert_eq!(dataset.children_named("Filter").count(), 2);
    }

    #[tokio::test]
    async fn test_registry_and_datasets() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("type", "registry"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"<MartRegistry>
                  <MartURLLocation name="ENSEMBL_MART_ENSEMBL" displayName="Ensembl Genes 110" visible="1"/>
                  <MartURLLocation name="ENSEMBL_MART_MOUSE" displayName="Mouse strains 110" visible="0"/>
                </MartRegistry>"#,
            ))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(query_param("type", "datasets"))
            .and(query_param("mart", "ENSEMBL_MART_ENSEMBL"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                "\nTableSet\thsapiens_gene_ensembl\tHuman genes (GRCh38.p14)\t1\tGRCh38.p14\n\
                 TableSet\tmmusculus_gene_ensembl\tMouse genes (GRCm39)\t1\tGRCm39\n",
            ))
            .mount(&server)
            .await;

        let biomart = BioMart::with_base_url(&server.uri()).unwrap();
        let marts = biomart.registry().await.unwrap();
        assert_eq!(marts.len(), 2);
        assert!(!marts[1].visible);

        let datasets = biomart.datasets("ENSEMBL_MART_ENSEMBL").await.unwrap();
        assert_eq!(datasets[0].name, "hsapiens_gene_ensembl");
        assert_eq!(datasets[1].display_name, "Mouse genes (GRCm39)");

        assert!(biomart.datasets("NOPE").await.unwrap_err().is_validation());
    }

    #[tokio::test]
    async fn test_query_returns_table() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_string_contains("query="))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                "Gene stable ID\tHGNC symbol\nENSG00000115085\tZAP70\n",
            ))
            .mount(&server)
            .await;

        let biomart = BioMart::with_base_url(&server.uri()).unwrap();
        let query = BioMartQuery::new("hsapiens_gene_ensembl")
            .filter("hgnc_symbol", "ZAP70")
            .attributes(["ensembl_gene_id", "hgnc_symbol"]);
        let table = biomart.query(&query).await.unwrap();

        assert_eq!(table.headers, vec!["Gene stable ID", "HGNC symbol"]);
        assert_eq!(table.column("HGNC symbol").unwrap(), vec!["ZAP70"]);
    }

    #[tokio::test]
    async fn test_query_error_body_is_remote_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                "Query ERROR: caught BioMart::Exception::Usage: Attribute foo NOT FOUND\n",
            ))
            .mount(&server)
            .await;

        let biomart = BioMart::with_base_url(&server.uri()).unwrap();
        let err = biomart
            .query(&BioMartQuery::new("hsapiens_gene_ensembl").attribute("foo"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Remote { ref message, .. } if message.contains("NOT FOUND")));
    }

    #[tokio::test]
    async fn test_query_without_attributes() {
        let biomart = BioMart::with_base_url("http://localhost").unwrap();
        let err = biomart
            .query(&BioMartQuery::new("hsapiens_gene_ensembl"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::MissingParameter(_)));
    }
}
