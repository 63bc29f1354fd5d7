pub mod excel_importer;

pub use excel_importer::{ExcelImportError, ExcelImporter, FormatValidation};
