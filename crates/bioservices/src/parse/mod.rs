//! Response helpers
//!
//! Schema-free convenience traversal over the payloads services return:
//! XML trees, JSON documents and tab-separated text.

pub mod json;
pub mod tabular;
pub mod xml;

pub use json::{find_first, find_values, string_list};
pub use tabular::{non_empty_lines, parse_csv, parse_mapping, parse_pairs, parse_tsv, Table};
pub use xml::XmlElement;
