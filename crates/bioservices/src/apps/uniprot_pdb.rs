//! From a UniProt accession to a PDB structure file

use crate::error::Result;
use crate::services::{Pdb, UniProt};
use serde::Serialize;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PdbStructure {
    /// Structure whose file was fetched
    pub pdb_id: String,
    /// Every PDB id cross-referenced by the UniProt entry
    pub all_ids: Vec<String>,
    pub content: String,
}

/// Fetch the first PDB structure cross-referenced by a UniProt entry
///
/// Returns `None` when the entry has no PDB cross-reference.
pub async fn uniprot_to_pdb(
    uniprot: &UniProt,
    pdb: &Pdb,
    accession: &str,
    format: &str,
) -> Result<Option<PdbStructure>> {
    let ids = uniprot.cross_references(accession, "PDB").await?;
    debug!(accession, count = ids.len(), "PDB cross-references");

    let Some(first) = ids.first() else {
        return Ok(None);
    };

    let content = pdb.get_file(first, format).await?;
    Ok(Some(PdbStructure {
        pdb_id: first.clone(),
        all_ids: ids,
        content,
    }))
}
