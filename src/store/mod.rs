pub mod saved;
pub mod spreadsheet;
