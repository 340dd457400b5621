//! CSV encoding of census records

use crate::lens::census::AsnRecord;
use anyhow::{anyhow, Result};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Column headers, in output order
pub const CSV_HEADER: [&str; 4] = [
    "AS Number",
    "Organization Name",
    "Announced IPv4 Prefix Count",
    "Announced IPv6 Prefix Count",
];

/// Write records as CSV (header row first) to any writer
pub fn write_records<W: Write>(records: &[AsnRecord], writer: W) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    wtr.write_record(CSV_HEADER)?;
    for record in records {
        wtr.serialize(record)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Encode records into a CSV document
pub fn to_csv_string(records: &[AsnRecord]) -> Result<String> {
    let mut buf = vec![];
    write_records(records, &mut buf)?;
    String::from_utf8(buf).map_err(|e| anyhow!("CSV output is not valid UTF-8: {}", e))
}

/// Write records to a CSV file, replacing any existing file
///
/// The document is written to a sibling `.tmp` file and renamed over the
/// target, so `path` holds either the previous content or the complete new
/// one.
pub fn write_csv_file(path: &Path, records: &[AsnRecord]) -> Result<()> {
    let content = to_csv_string(records)?;
    let tmp_path = tmp_path_for(path);

    if let Err(e) = std::fs::write(&tmp_path, content) {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(anyhow!("Unable to write {}: {}", tmp_path.display(), e));
    }
    std::fs::rename(&tmp_path, path).map_err(|e| {
        let _ = std::fs::remove_file(&tmp_path);
        anyhow!("Unable to move CSV into {}: {}", path.display(), e)
    })
}

fn tmp_path_for(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lens::asn_list::Asn;

    fn record(asn: u32, name: &str, v4: u64, v6: u64) -> AsnRecord {
        AsnRecord {
            asn: Asn(asn),
            organization_name: name.to_string(),
            prefix_count_v4: v4,
            prefix_count_v6: v6,
        }
    }

    #[test]
    fn test_header_and_rows() {
        let records = vec![record(701, "UUNET", 120, 4), record(702, "VERIZON", 0, 0)];
        let output = to_csv_string(&records).unwrap();
        assert_eq!(
            output,
            "AS Number,Organization Name,Announced IPv4 Prefix Count,Announced IPv6 Prefix Count\n\
             701,UUNET,120,4\n\
             702,VERIZON,0,0\n"
        );
    }

    #[test]
    fn test_quoting() {
        let records = vec![
            record(1, "Acme, Inc.", 1, 0),
            record(2, "The \"Best\" ISP", 2, 0),
            record(3, "Line\nBreak", 3, 0),
        ];
        let output = to_csv_string(&records).unwrap();
        assert!(output.contains("1,\"Acme, Inc.\",1,0\n"));
        assert!(output.contains("2,\"The \"\"Best\"\" ISP\",2,0\n"));
        assert!(output.contains("3,\"Line\nBreak\",3,0\n"));
    }

    #[test]
    fn test_header_only_when_empty() {
        let output = to_csv_string(&[]).unwrap();
        assert_eq!(output.lines().count(), 1);
        assert!(output.starts_with("AS Number,"));
    }

    #[test]
    fn test_write_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("NL.csv");
        let records = vec![record(1136, "KPN KPN National, NL", 10, 2)];

        write_csv_file(&path, &records).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, to_csv_string(&records).unwrap());

        // rewriting the same records is byte-identical
        write_csv_file(&path, &records).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), content);
        assert!(!dir.path().join("NL.csv.tmp").exists());
    }

    #[test]
    fn test_write_file_failure_leaves_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing-dir").join("NL.csv");
        let records = vec![record(1136, "KPN", 10, 2)];

        assert!(write_csv_file(&path, &records).is_err());
        assert!(!path.exists());
        assert!(!dir.path().join("missing-dir").exists());
    }

    #[test]
    fn test_failed_replace_keeps_previous_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("NL.csv");
        let old = vec![record(1136, "KPN", 10, 2)];
        write_csv_file(&path, &old).unwrap();
        let before = std::fs::read_to_string(&path).unwrap();

        // a directory squatting on the temp name makes the write fail
        std::fs::create_dir(dir.path().join("NL.csv.tmp")).unwrap();
        let new = vec![record(1136, "KPN", 11, 2), record(1200, "AMS-IX", 1, 1)];
        assert!(write_csv_file(&path, &new).is_err());

        assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
    }
}
