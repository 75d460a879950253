//! Export of extraction records: one row per processed image.

mod sheet;

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::ExportError;
use crate::fields::FieldSpec;
use crate::models::record::ExtractionRecord;

/// Columns written before the field columns in tabular formats.
pub const LEADING_COLUMNS: [&str; 2] = ["source", "processed_at"];

/// Output format for extraction records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// JSON array of records
    #[default]
    Json,
    /// CSV with one header row
    Csv,
    /// Plain text summary
    Text,
    /// Excel workbook
    Xlsx,
    /// OCR text as recognized
    Raw,
}

impl ExportFormat {
    /// File extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
            ExportFormat::Text => "txt",
            ExportFormat::Xlsx => "xlsx",
            ExportFormat::Raw => "txt",
        }
    }

    /// Guess a tabular format from a file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "json" => Some(ExportFormat::Json),
            "csv" => Some(ExportFormat::Csv),
            "xlsx" => Some(ExportFormat::Xlsx),
            "txt" => Some(ExportFormat::Text),
            _ => None,
        }
    }

    /// Whether the output is binary and cannot go to a terminal.
    pub fn is_binary(&self) -> bool {
        matches!(self, ExportFormat::Xlsx)
    }
}

/// Writes records with a fixed column layout taken from a field table.
#[derive(Debug, Clone)]
pub struct Exporter {
    columns: Vec<String>,
    sheet_name: String,
}

impl Exporter {
    pub fn new(spec: &FieldSpec) -> Self {
        Self {
            columns: spec.names().map(str::to_string).collect(),
            sheet_name: "Rail Fields".to_string(),
        }
    }

    /// Worksheet name for XLSX output.
    pub fn with_sheet_name(mut self, name: impl Into<String>) -> Self {
        self.sheet_name = name.into();
        self
    }

    /// Header row for tabular formats.
    pub fn headers(&self) -> Vec<&str> {
        LEADING_COLUMNS
            .iter()
            .copied()
            .chain(self.columns.iter().map(String::as_str))
            .collect()
    }

    /// One row of cells per record; not-found fields are empty.
    fn rows<'a>(&'a self, records: &'a [ExtractionRecord]) -> impl Iterator<Item = Vec<String>> + 'a {
        records.iter().map(move |record| {
            let mut row = vec![record.source.clone(), record.processed_at.to_rfc3339()];
            row.extend(
                self.columns
                    .iter()
                    .map(|c| record.fields.value(c).unwrap_or_default().to_string()),
            );
            row
        })
    }

    /// Render records in `format`.
    pub fn write(
        &self,
        records: &[ExtractionRecord],
        format: ExportFormat,
    ) -> Result<Vec<u8>, ExportError> {
        debug!("Writing {} records as {:?}", records.len(), format);
        match format {
            ExportFormat::Json => Ok(serde_json::to_vec_pretty(records)?),
            ExportFormat::Csv => self.write_csv(records),
            ExportFormat::Text => Ok(self.write_text(records).into_bytes()),
            ExportFormat::Xlsx => sheet::write_xlsx(&self.sheet_name, &self.headers(), self.rows(records)),
            ExportFormat::Raw => Ok(records
                .iter()
                .map(|r| r.raw_text.as_str())
                .collect::<Vec<_>>()
                .join("\n\n")
                .into_bytes()),
        }
    }

    /// Render records in `format` and write them to `path`.
    pub fn save(
        &self,
        records: &[ExtractionRecord],
        format: ExportFormat,
        path: &Path,
    ) -> Result<(), ExportError> {
        let bytes = self.write(records, format)?;
        std::fs::write(path, &bytes)?;
        info!("Saved {} records to {}", records.len(), path.display());
        Ok(())
    }

    fn write_csv(&self, records: &[ExtractionRecord]) -> Result<Vec<u8>, ExportError> {
        let mut wtr = csv::Writer::from_writer(vec![]);

        wtr.write_record(self.headers())?;
        for row in self.rows(records) {
            wtr.write_record(&row)?;
        }

        wtr.into_inner().map_err(|e| {
            ExportError::Io(std::io::Error::new(e.error().kind(), e.error().to_string()))
        })
    }

    fn write_text(&self, records: &[ExtractionRecord]) -> String {
        let mut output = String::new();

        for (i, record) in records.iter().enumerate() {
            if i > 0 {
                output.push('\n');
            }
            output.push_str(&format!("Source: {}\n", record.source));
            for column in &self.columns {
                let value = record.fields.value(column).unwrap_or("(not found)");
                output.push_str(&format!("  {}: {}\n", column, value));
            }
        }

        output
    }
}

/// Render records with the columns of `spec`.
pub fn write_records(
    records: &[ExtractionRecord],
    spec: &FieldSpec,
    format: ExportFormat,
) -> Result<Vec<u8>, ExportError> {
    Exporter::new(spec).write(records, format)
}

/// Render records with the columns of `spec` and write them to `path`.
pub fn save_records(
    records: &[ExtractionRecord],
    spec: &FieldSpec,
    format: ExportFormat,
    path: &Path,
) -> Result<(), ExportError> {
    Exporter::new(spec).save(records, format, path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::extract_fields;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn records() -> Vec<ExtractionRecord> {
        let ts = Utc.with_ymd_and_hms(2024, 5, 1, 8, 30, 0).unwrap();
        vec![
            ExtractionRecord::new(
                "plate1.jpg",
                "DATE: 2024-05-01\nWELDER1: Smith",
                extract_fields("DATE: 2024-05-01\nWELDER1: Smith"),
            )
            .with_timestamp(ts),
            ExtractionRecord::new(
                "plate2.jpg",
                "RAIL TYPE: UIC 60 PEAK",
                extract_fields("RAIL TYPE: UIC 60 PEAK"),
            )
            .with_timestamp(ts),
        ]
    }

    #[test]
    fn test_csv_layout() {
        let bytes = write_records(&records(), &FieldSpec::rail(), ExportFormat::Csv).unwrap();
        let csv = String::from_utf8(bytes).unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[0],
            "source,processed_at,DATE,TIME,TEMP,WELDER1,WELDER2,PROFILE,TRUCK,KM,TAPPING,WELD,PORTION,RAIL TYPE"
        );
        assert_eq!(
            lines[1],
            "plate1.jpg,2024-05-01T08:30:00+00:00,2024-05-01,,,Smith,,,,,,,,"
        );
        assert_eq!(
            lines[2],
            "plate2.jpg,2024-05-01T08:30:00+00:00,,,,,,,,,,,,UIC 60"
        );
    }

    #[test]
    fn test_csv_without_records_has_header() {
        let bytes = write_records(&[], &FieldSpec::rail(), ExportFormat::Csv).unwrap();
        assert_eq!(String::from_utf8(bytes).unwrap().lines().count(), 1);
    }

    #[test]
    fn test_json_keeps_nulls() {
        let bytes = write_records(&records(), &FieldSpec::rail(), ExportFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(value[0]["source"], "plate1.jpg");
        assert_eq!(value[0]["fields"]["WELDER1"], "Smith");
        assert!(value[0]["fields"]["TIME"].is_null());
        assert_eq!(value[1]["fields"]["RAIL TYPE"], "UIC 60");
        assert!(value[0].get("raw_text").is_none());
    }

    #[test]
    fn test_text_summary() {
        let bytes = write_records(&records()[..1], &FieldSpec::rail(), ExportFormat::Text).unwrap();
        let text = String::from_utf8(bytes).unwrap();

        assert!(text.starts_with("Source: plate1.jpg\n"));
        assert!(text.contains("  DATE: 2024-05-01\n"));
        assert!(text.contains("  TIME: (not found)\n"));
        assert_eq!(text.lines().count(), 13);
    }

    #[test]
    fn test_raw_text() {
        let bytes = write_records(&records(), &FieldSpec::rail(), ExportFormat::Raw).unwrap();
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            "DATE: 2024-05-01\nWELDER1: Smith\n\nRAIL TYPE: UIC 60 PEAK"
        );
    }

    #[test]
    fn test_xlsx_is_zip() {
        let bytes = write_records(&records(), &FieldSpec::rail(), ExportFormat::Xlsx).unwrap();
        assert!(bytes.starts_with(b"PK"));
    }

    #[test]
    fn test_save_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fields.xlsx");

        save_records(&records(), &FieldSpec::rail(), ExportFormat::Xlsx, &path).unwrap();
        assert!(std::fs::metadata(&path).unwrap().len() > 0);
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(ExportFormat::from_path(Path::new("a/b.XLSX")), Some(ExportFormat::Xlsx));
        assert_eq!(ExportFormat::from_path(Path::new("summary.csv")), Some(ExportFormat::Csv));
        assert_eq!(ExportFormat::from_path(Path::new("noext")), None);
        assert_eq!(ExportFormat::Raw.extension(), "txt");
    }
}
