use std::fs;
use std::path::{Path, PathBuf};

use preview_core::FileRecord;
use serde::Deserialize;

use super::cli::Cli;

#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("failed to read records {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse records {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("no file records given; use --record or --encrypted-id")]
    Empty,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RecordFile {
    Many(Vec<FileRecord>),
    One(FileRecord),
}

/// Collects records from `--record` files, then the inline record, in order.
pub fn collect_records(cli: &Cli) -> Result<Vec<FileRecord>, RecordError> {
    let mut records = Vec::new();
    for path in &cli.records {
        records.extend(read_record_file(path)?);
    }

    if let Some(encrypted_id) = &cli.encrypted_id {
        let name = cli.name.clone().unwrap_or_else(|| encrypted_id.clone());
        let mut record = FileRecord::new(name, encrypted_id.clone());
        if let Some(link) = &cli.content_link {
            record = record.with_content_link(link.clone());
        }
        records.push(record);
    }

    if records.is_empty() {
        return Err(RecordError::Empty);
    }
    Ok(records)
}

fn read_record_file(path: &Path) -> Result<Vec<FileRecord>, RecordError> {
    let content = fs::read_to_string(path).map_err(|source| RecordError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let parsed: RecordFile =
        serde_json::from_str(&content).map_err(|source| RecordError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(match parsed {
        RecordFile::Many(records) => records,
        RecordFile::One(record) => vec![record],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::ffi::OsString;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn reads_single_and_array_files_then_inline_record() {
        let temp = TempDir::new().unwrap();
        let one = temp.path().join("one.json");
        let many = temp.path().join("many.json");
        fs::write(
            &one,
            r#"{"name":"a.png","encryptedId":"enc-a","encryptedWebContentLink":"https://x/a"}"#,
        )
        .unwrap();
        fs::write(
            &many,
            r#"[{"name":"b.png","encryptedId":"enc-b"},{"name":"c.png","encryptedId":"enc-c"}]"#,
        )
        .unwrap();

        let args: Vec<OsString> = vec![
            "image-preview".into(),
            "--record".into(),
            one.into_os_string(),
            "--record".into(),
            many.into_os_string(),
            "--encrypted-id".into(),
            "enc-d".into(),
            "--content-link".into(),
            "https://x/d".into(),
        ];
        let cli = Cli::parse_from(args);

        let records = collect_records(&cli).unwrap();
        let ids: Vec<_> = records.iter().map(|r| r.encrypted_id.as_str()).collect();
        assert_eq!(ids, vec!["enc-a", "enc-b", "enc-c", "enc-d"]);
        assert!(records[0].has_previewable_content());
        assert!(!records[1].has_previewable_content());
        assert_eq!(records[3].name, "enc-d");
        assert!(records[3].has_previewable_content());
    }

    #[test]
    fn no_records_is_an_error() {
        let cli = Cli::parse_from(["image-preview"]);
        assert!(matches!(collect_records(&cli), Err(RecordError::Empty)));
    }

    #[test]
    fn malformed_record_file_is_an_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("bad.json");
        fs::write(&path, r#"{"name": 1}"#).unwrap();

        assert!(matches!(
            read_record_file(&path),
            Err(RecordError::Parse { .. })
        ));
    }
}
