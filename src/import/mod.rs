pub mod bank;
pub mod journal;

pub use bank::{ColumnFilter, CsvOptions};
pub use journal::Journal;
