//! Small workflows combining several services

pub mod accession;
pub mod fasta;
pub mod uniprot_pdb;

pub use accession::{default_output, download_accession, AccessionSource};
pub use fasta::{parse_fasta, FastaRecord};
pub use uniprot_pdb::{uniprot_to_pdb, PdbStructure};
