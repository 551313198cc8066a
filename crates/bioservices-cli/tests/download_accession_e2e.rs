//! End-to-end tests for the bioservices binary
//!
//! Every test points the binary at a temporary settings file and at a
//! local mock server through `BIOSERVICES_URL_*` overrides.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;
use wiremock::{
    matchers::{method, path, query_param},
    Mock, MockServer, ResponseTemplate,
};

const ENA_FASTA: &str = ">ENA|AB000263|AB000263.1 Homo sapiens mRNA for prepro cortistatin like peptide\n\
ACAAGATGCCATTGTCCCCCGGCCTCCTGCTGCTGCTGCTCTCCGGGGCCACGGCCACCGCTGCCCTGCC\n\
CCTGGAGGGTGGCCCCACCGGCCGAGACAGCGAGCATATGCAGGAAGCGGCAGGAATAAGGAAAAGCAGC\n";

/// Binary configured with an isolated settings file
fn bioservices(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("bioservices").unwrap();
    cmd.current_dir(dir.path())
        .env("BIOSERVICES_CONFIG", dir.path().join("bioservices.toml"))
        .env_remove("BIOSERVICES_URL_ENA")
        .env_remove("BIOSERVICES_URL_EUTILS")
        .env_remove("BIOSERVICES_TOKEN_NCBI");
    cmd
}

#[tokio::test(flavor = "multi_thread")]
async fn test_download_from_ena_default_output() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/fasta/AB000263"))
        .respond_with(ResponseTemplate::new(200).set_body_string(ENA_FASTA))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    bioservices(&dir)
        .env("BIOSERVICES_URL_ENA", server.uri())
        .args(["download-accession", "--accession", "AB000263"])
        .assert()
        .success()
        .stdout(predicate::str::contains("AB000263"))
        .stdout(predicate::str::contains("AB000263.fa"));

    let written = fs::read_to_string(dir.path().join("AB000263.fa")).unwrap();
    assert_eq!(written, ENA_FASTA);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_download_from_eutils_to_custom_output() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/efetch.fcgi"))
        .and(query_param("db", "nuccore"))
        .and(query_param("id", "AB000263"))
        .and(query_param("rettype", "fasta"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            ">AB000263.1 Homo sapiens mRNA for prepro cortistatin like peptide\nACAAGATGCC\n",
        ))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    bioservices(&dir)
        .env("BIOSERVICES_URL_EUTILS", server.uri())
        .args([
            "download-accession",
            "--accession",
            "AB000263",
            "--method",
            "eutils",
            "--output",
            "seqs/cortistatin.fasta",
        ])
        .assert()
        .success();

    let written = fs::read_to_string(dir.path().join("seqs").join("cortistatin.fasta")).unwrap();
    assert!(written.starts_with(">AB000263.1"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_download_unknown_accession_fails() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/fasta/NOPE0000"))
        .respond_with(ResponseTemplate::new(404).set_body_string("Not found"))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    bioservices(&dir)
        .env("BIOSERVICES_URL_ENA", server.uri())
        .args(["download-accession", "--accession", "NOPE0000"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("404"));

    assert!(!dir.path().join("NOPE0000.fa").exists());
}

#[test]
fn test_unknown_method_is_usage_error() {
    let dir = TempDir::new().unwrap();
    bioservices(&dir)
        .args(["download-accession", "--accession", "AB000263", "--method", "genbank"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("genbank"));
}

#[test]
fn test_missing_subcommand() {
    let dir = TempDir::new().unwrap();
    bioservices(&dir)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("subcommand is required"));
}

#[test]
fn test_config_set_get_roundtrip_through_file() {
    let dir = TempDir::new().unwrap();

    bioservices(&dir)
        .args(["config", "set", "urls.kegg", "http://localhost:9999/"])
        .assert()
        .success();

    bioservices(&dir)
        .args(["config", "get", "urls.kegg"])
        .assert()
        .success()
        .stdout(predicate::str::diff("http://localhost:9999\n"));

    bioservices(&dir)
        .args(["services", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("http://localhost:9999"));
}

#[test]
fn test_config_get_unknown_key() {
    let dir = TempDir::new().unwrap();
    bioservices(&dir)
        .args(["config", "get", "colour"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("colour"));
}

#[test]
fn test_config_path_honours_flag() {
    let dir = TempDir::new().unwrap();
    let custom = dir.path().join("custom.toml");
    bioservices(&dir)
        .args(["config", "path", "--config"])
        .arg(&custom)
        .assert()
        .success()
        .stdout(predicate::str::contains("custom.toml"));
}
