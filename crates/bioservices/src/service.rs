//! Common construction for service clients

use crate::error::Result;
use crate::services::{
    biomart::BioMart, chebi::ChEBI, chembl::ChEMBL, ena::Ena, ensembl::Ensembl, eutils::EUtils,
    hgnc::Hgnc, kegg::Kegg, pdb::Pdb, psicquic::Psicquic, quickgo::QuickGo, reactome::Reactome,
    uniprot::UniProt,
};
use crate::transport::RestClient;
use bioservices_common::{ServiceKind, Settings};
use serde::Serialize;

/// A client for one remote service
///
/// Implementors only say how to wrap a [`RestClient`]; the constructors
/// are shared. `NAME` is also the settings key for base URL overrides
/// (`urls.<name>` or `BIOSERVICES_URL_<NAME>`).
pub trait Service: Sized {
    const NAME: &'static str;
    const DEFAULT_URL: &'static str;
    const KIND: ServiceKind = ServiceKind::Rest;

    fn from_client(client: RestClient, settings: &Settings) -> Result<Self>;

    fn client(&self) -> &RestClient;

    /// Client configured from the user settings file and environment
    fn new() -> Result<Self> {
        let settings = Settings::load()?;
        Self::with_settings(&settings)
    }

    fn with_settings(settings: &Settings) -> Result<Self> {
        let client = RestClient::from_settings(Self::NAME, Self::DEFAULT_URL, settings)?;
        Self::from_client(client, settings)
    }

    /// Client for a different endpoint, default settings otherwise
    fn with_base_url(url: &str) -> Result<Self> {
        let settings = Settings::default();
        let client = RestClient::builder(Self::NAME, url)
            .settings(&settings)?
            .build()?;
        Self::from_client(client, &settings)
    }
}

/// Static description of a service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ServiceInfo {
    pub name: &'static str,
    pub default_url: &'static str,
    pub kind: ServiceKind,
}

impl ServiceInfo {
    fn of<S: Service>() -> Self {
        Self {
            name: S::NAME,
            default_url: S::DEFAULT_URL,
            kind: S::KIND,
        }
    }

    /// Base URL after applying settings overrides
    pub fn effective_url<'a>(&self, settings: &'a Settings) -> &'a str {
        settings.base_url(self.name).unwrap_or(self.default_url)
    }
}

/// Every service this crate has a client for
pub fn catalogue() -> Vec<ServiceInfo> {
    vec![
        ServiceInfo::of::<BioMart>(),
        ServiceInfo::of::<ChEBI>(),
        ServiceInfo::of::<ChEMBL>(),
        ServiceInfo::of::<Ena>(),
        ServiceInfo::of::<Ensembl>(),
        ServiceInfo::of::<EUtils>(),
        ServiceInfo::of::<Hgnc>(),
        ServiceInfo::of::<Kegg>(),
        ServiceInfo::of::<Pdb>(),
        ServiceInfo::of::<Psicquic>(),
        ServiceInfo::of::<QuickGo>(),
        ServiceInfo::of::<Reactome>(),
        ServiceInfo::of::<UniProt>(),
    ]
}

/// Look up a service by name, case-insensitively
pub fn find_service(name: &str) -> Option<ServiceInfo> {
    catalogue()
        .into_iter()
        .find(|info| info.name.eq_ignore_ascii_case(name))
}
