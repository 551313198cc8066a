//! Service clients
//!
//! Each module wraps one remote API. Clients are built through the
//! [`Service`](crate::service::Service) trait and validate parameters
//! before sending anything.

pub mod biomart;
pub mod chebi;
pub mod chembl;
pub mod ena;
pub mod ensembl;
pub mod eutils;
pub mod hgnc;
pub mod kegg;
pub mod pdb;
pub mod psicquic;
pub mod quickgo;
pub mod reactome;
pub mod uniprot;

pub use biomart::{BioMart, BioMartQuery};
pub use chebi::ChEBI;
pub use chembl::ChEMBL;
pub use ena::Ena;
pub use ensembl::Ensembl;
pub use eutils::EUtils;
pub use hgnc::Hgnc;
pub use kegg::Kegg;
pub use pdb::Pdb;
pub use psicquic::Psicquic;
pub use quickgo::QuickGo;
pub use reactome::Reactome;
pub use uniprot::UniProt;
