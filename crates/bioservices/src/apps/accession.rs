//! Nucleotide record download from ENA or NCBI

use crate::apps::fasta::{parse_fasta, FastaRecord};
use crate::error::{Result, ServiceError};
use crate::service::Service;
use crate::services::{EUtils, Ena};
use bioservices_common::Settings;
use serde::Serialize;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tracing::info;

/// Where to fetch the record from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessionSource {
    #[default]
    Ena,
    Eutils,
}

impl AccessionSource {
    pub const ALL: &'static [&'static str] = &["ena", "eutils"];
}

impl FromStr for AccessionSource {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "ena" => Ok(Self::Ena),
            "eutils" | "ncbi" => Ok(Self::Eutils),
            _ => Err(ServiceError::invalid_parameter("method", s, Self::ALL)),
        }
    }
}

impl fmt::Display for AccessionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ena => write!(f, "ena"),
            Self::Eutils => write!(f, "eutils"),
        }
    }
}

/// Fetch the FASTA record of `accession` and write it to `output`
///
/// The file is only written when the response parses as FASTA with at
/// least one record. Returns the first record.
pub async fn download_accession(
    settings: &Settings,
    accession: &str,
    source: AccessionSource,
    output: &Path,
) -> Result<FastaRecord> {
    let accession = accession.trim();
    if accession.is_empty() {
        return Err(ServiceError::MissingParameter("accession".to_string()));
    }

    let text = match source {
        AccessionSource::Ena => {
            Ena::with_settings(settings)?
                .get_data(accession, "fasta")
                .await?
        },
        AccessionSource::Eutils => {
            EUtils::with_settings(settings)?
                .efetch("nuccore", &[accession], "fasta", "text")
                .await?
        },
    };

    let record = parse_fasta(&text)?
        .into_iter()
        .next()
        .ok_or_else(|| {
            ServiceError::remote(source.to_string(), format!("no FASTA record for {}", accession))
        })?;

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(output, &text).await?;

    info!(
        accession,
        source = %source,
        output = %output.display(),
        length = record.len(),
        "Downloaded accession"
    );
    Ok(record)
}

/// Default output file name for an accession
pub fn default_output(accession: &str) -> String {
    format!("{}.fa", accession.trim())
}
