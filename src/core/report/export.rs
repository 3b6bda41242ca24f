//! Export functionality for cleanup reports.
//!
//! Supports CSV for spreadsheets and JSON for tooling.

use std::io::Write;
use std::path::Path;

use super::CleanupReport;

/// Export the report to CSV.
///
/// Columns: Published Name, Provider, Class, Version, Date, Size (bytes),
/// Folder, Duplicate Of
pub fn export_csv<W: Write>(report: &CleanupReport, mut writer: W) -> std::io::Result<()> {
    writeln!(
        writer,
        "Published Name,Provider,Class,Version,Date,Size (bytes),Folder,Duplicate Of"
    )?;

    for entry in &report.entries {
        writeln!(
            writer,
            "{},{},{},{},{},{},{},{}",
            csv_field(&entry.published_name),
            csv_field(&entry.provider),
            csv_field(&entry.class_name),
            csv_field(&entry.raw_version),
            csv_field(&entry.raw_date),
            entry.size_bytes,
            csv_field(&entry.folder_path.display().to_string()),
            csv_field(entry.duplicate_of.as_deref().unwrap_or("")),
        )?;
    }

    Ok(())
}

/// Quote a field when it contains CSV metacharacters. Vendor strings
/// like `Advanced Micro Devices, Inc.` need this routinely.
fn csv_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Export the report as pretty-printed JSON
pub fn export_json<W: Write>(report: &CleanupReport, writer: W) -> serde_json::Result<()> {
    serde_json::to_writer_pretty(writer, report)
}

/// Supported export formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
}

/// Export the report to a file
pub fn export_to_file(
    report: &CleanupReport,
    path: &Path,
    format: ExportFormat,
) -> std::io::Result<()> {
    let file = std::fs::File::create(path)?;
    let writer = std::io::BufWriter::new(file);

    match format {
        ExportFormat::Csv => export_csv(report, writer),
        ExportFormat::Json => export_json(report, writer).map_err(std::io::Error::from),
    }
}
