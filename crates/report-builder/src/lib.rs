//! Export archive for a portfolio: CSV workbook sheets plus a plain-text summary,
//! packed into one zip file.

pub mod assembler;
pub mod records;
pub mod summary;
pub mod workbook;

pub use assembler::{ReportAssembler, DEFAULT_ARCHIVE_NAME, SUMMARY_ENTRY};
pub use records::{FundamentalsRecord, ReportInput, TechnicalRecord};
pub use summary::{summary_line, summary_text};
pub use workbook::{build_workbook, write_sheet, Sheet};
