//! Load candidate pools produced by the scoring collaborator.
//! JSON: a top-level array or `{ "candidates": [...] }`. CSV: one candidate per row with
//! headers `id,name,group,category,price,predicted_score`.

use std::fs;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use crate::data::candidate::Candidate;
use crate::error::LoadError;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PoolFile {
    Wrapped { candidates: Vec<Candidate> },
    Bare(Vec<Candidate>),
}

pub fn load_pool(path: impl AsRef<Path>) -> Result<Vec<Candidate>, LoadError> {
    let path = path.as_ref();
    let display = path.display().to_string();
    let raw = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: display.clone(),
        source,
    })?;

    let is_csv = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
    if is_csv {
        parse_csv_pool(raw.as_bytes()).map_err(|source| LoadError::Csv {
            path: display,
            source,
        })
    } else {
        parse_json_pool(&raw).map_err(|source| LoadError::Json {
            path: display,
            source,
        })
    }
}

pub fn parse_json_pool(raw: &str) -> Result<Vec<Candidate>, serde_json::Error> {
    let parsed: PoolFile = serde_json::from_str(raw)?;
    Ok(match parsed {
        PoolFile::Wrapped { candidates } => candidates,
        PoolFile::Bare(candidates) => candidates,
    })
}

pub fn parse_csv_pool(reader: impl Read) -> Result<Vec<Candidate>, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    reader.deserialize().collect()
}
