//! bioservices
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Thin async clients for biological web services.
//!
//! # Overview
//!
//! - **Transport**: [`RestClient`] and [`SoapClient`] wrap `reqwest` with
//!   per-service base URLs, `Accept` negotiation, optional response caching
//!   and errors that name the failing URL
//! - **Parsing**: [`XmlElement`], JSON search helpers and tab-separated
//!   [`Table`]s
//! - **Parameters**: [`ParamSpec`] tables validate values before any
//!   request is sent; [`Registry`] memoizes lists fetched from the services
//! - **Services**: UniProt, KEGG, ChEMBL, Ensembl, Reactome, PSICQUIC,
//!   BioMart, NCBI EUtils, ENA, RCSB PDB, QuickGO, HGNC and ChEBI
//! - **Apps**: accession download and UniProt to PDB lookups
//!
//! # Example
//!
//! ```no_run
//! use bioservices::services::Kegg;
//! use bioservices::Service;
//!
//! # async fn run() -> bioservices::Result<()> {
//! let kegg = Kegg::new()?;
//! let mapping = kegg.conv("uniprot", "hsa:7535").await?;
//! println!("{:?}", mapping.get("hsa:7535"));
//! # Ok(())
//! # }
//! ```

pub mod apps;
pub mod error;
pub mod params;
pub mod parse;
pub mod registry;
pub mod service;
pub mod services;
pub mod transport;

// Re-export commonly used types
pub use bioservices_common::{ResponseFormat, ServiceKind, Settings};
pub use error::{Result, ServiceError};
pub use params::{ParamSpec, QueryParams};
pub use parse::{Table, XmlElement};
pub use registry::Registry;
pub use service::{catalogue, find_service, Service, ServiceInfo};
pub use transport::{RawResponse, ResponseCache, RestClient, SoapClient};
