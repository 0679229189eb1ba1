use analysis_core::AnalysisError;
use std::io::{Cursor, Seek, Write};
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::records::ReportInput;
use crate::summary::summary_text;
use crate::workbook::build_workbook;

pub const DEFAULT_ARCHIVE_NAME: &str = "full_portfolio_export.zip";
pub const SUMMARY_ENTRY: &str = "portfolio_summary.txt";

fn export_err(e: impl std::fmt::Display) -> AnalysisError {
    AnalysisError::ExportError(e.to_string())
}

/// Packs the workbook sheets and the text summary into one zip archive.
#[derive(Debug, Clone, Copy)]
pub struct ReportAssembler {
    compression: CompressionMethod,
}

impl Default for ReportAssembler {
    fn default() -> Self {
        Self {
            compression: CompressionMethod::Deflated,
        }
    }
}

impl ReportAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store entries uncompressed
    pub fn stored(mut self) -> Self {
        self.compression = CompressionMethod::Stored;
        self
    }

    /// Write the archive into any seekable sink. Returns the entry names in write order.
    pub fn write<W: Write + Seek>(&self, input: &ReportInput, sink: W) -> Result<Vec<String>, AnalysisError> {
        let sheets = build_workbook(input)?;
        let summary = summary_text(&input.fundamentals);
        let options = SimpleFileOptions::default().compression_method(self.compression);

        let mut zip = ZipWriter::new(sink);
        let mut entries = Vec::with_capacity(sheets.len() + 1);

        for sheet in &sheets {
            let name = sheet.entry_name();
            zip.start_file(name.as_str(), options).map_err(export_err)?;
            zip.write_all(&sheet.csv).map_err(export_err)?;
            entries.push(name);
        }

        zip.start_file(SUMMARY_ENTRY, options).map_err(export_err)?;
        zip.write_all(summary.as_bytes()).map_err(export_err)?;
        entries.push(SUMMARY_ENTRY.to_string());

        zip.finish().map_err(export_err)?;

        tracing::info!(
            "Assembled export: {} fundamentals rows, {} technical rows, {} holdings",
            input.fundamentals.len(),
            input.technicals.len(),
            input.holdings.len()
        );
        Ok(entries)
    }

    pub fn to_bytes(&self, input: &ReportInput) -> Result<Vec<u8>, AnalysisError> {
        let mut cursor = Cursor::new(Vec::new());
        self.write(input, &mut cursor)?;
        Ok(cursor.into_inner())
    }

    /// Build the archive in memory first so a failed build leaves no partial file behind.
    pub fn write_to_path(&self, input: &ReportInput, path: impl AsRef<Path>) -> Result<(), AnalysisError> {
        let bytes = self.to_bytes(input)?;
        std::fs::write(path.as_ref(), bytes).map_err(|e| {
            AnalysisError::ExportError(format!("{}: {}", path.as_ref().display(), e))
        })
    }
}
