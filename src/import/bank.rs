use anyhow::{bail, Context as _, Result};
use chrono::NaiveDate;
use console::style;
use crc::{Crc, CRC_32_BZIP2};
use rust_decimal::Decimal;
use std::path::Path;
use std::str::FromStr;

use crate::transaction::{Transaction, TransactionId};

const ROW_CHECKSUM: Crc<u32> = Crc::<u32>::new(&CRC_32_BZIP2);

/// Which CSV columns are looked at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnFilter {
    All,
    Select(Vec<usize>),
    Ignore(Vec<usize>),
}

impl ColumnFilter {
    fn includes(&self, column: usize) -> bool {
        match self {
            ColumnFilter::All => true,
            ColumnFilter::Select(columns) => columns.contains(&column),
            ColumnFilter::Ignore(columns) => !columns.contains(&column),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CsvOptions {
    pub date_format: String,
    pub skip: usize,
    pub columns: ColumnFilter,
    pub currency: String,
}

pub fn load(path: &Path, options: &CsvOptions) -> Result<Vec<Transaction>> {
    log::info!("Loading bank transactions...");
    let content = std::fs::read(path)
        .with_context(|| format!("Failed to read CSV file {}", path.display()))?;
    let transactions = parse(&content, options)
        .with_context(|| format!("Failed to import CSV file {}", path.display()))?;
    log::info!("Loading bank transactions...done");
    Ok(transactions)
}

/// Bank exports don't agree on a column layout, so every selected cell is
/// tried as a date, then as an amount, and taken as the description otherwise.
/// Later cells win.
pub fn parse(content: &[u8], options: &CsvOptions) -> Result<Vec<Transaction>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(content);
    let mut result = vec![];
    for (row, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("Failed to read CSV line {}", row + 1))?;
        if row < options.skip {
            continue;
        }
        result.push(parse_row(row, &record, options)?);
    }
    Ok(result)
}

fn parse_row(row: usize, record: &csv::StringRecord, options: &CsvOptions) -> Result<Transaction> {
    let mut date = None;
    let mut amount = Decimal::ZERO;
    let mut description = String::new();
    let mut picked = vec![];
    for (column, cell) in record.iter().enumerate() {
        if !options.columns.includes(column) {
            continue;
        }
        picked.push(cell);
        let cell = cell.trim();
        if cell.is_empty() {
            continue;
        }
        if let Ok(parsed) = NaiveDate::parse_from_str(cell, &options.date_format) {
            date = Some(parsed);
        } else if let Ok(parsed) = Decimal::from_str(cell) {
            amount = parsed;
        } else {
            description = cell.replace('"', "");
        }
    }

    let Some(date) = date.filter(|_| !description.is_empty() && !amount.is_zero()) else {
        println!();
        println!(
            "{}",
            style("ERROR           : Unable to parse transaction from the selected columns in CSV.")
                .red()
                .bold()
        );
        println!("Selected CSV    : {}", picked.join(", "));
        println!("Parsed Date     : {date:?}");
        println!("Parsed Desc     : {description}");
        println!("Parsed Amount   : {amount}");
        bail!(
            "Line {} doesn't contain all of date, description and a non-zero amount",
            row + 1
        );
    };

    let raw = record.iter().collect::<Vec<_>>().join(",");
    let id = TransactionId::new(format!("{row}-{:08x}", ROW_CHECKSUM.checksum(raw.as_bytes())));
    Ok(Transaction::new(
        id,
        date,
        description,
        amount,
        options.currency.clone(),
    ))
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::transaction::testutils::date;

    fn options(columns: ColumnFilter, skip: usize) -> CsvOptions {
        CsvOptions {
            date_format: "%m/%d/%Y".to_string(),
            skip,
            columns,
            currency: "USD".to_string(),
        }
    }

    const CSV: &str = "Date,Description,Amount,Balance\n\
                       03/01/2024,\"STARBUCKS #12, SEATTLE\",-4.50,995.50\n\
                       03/02/2024,PAYROLL ACME,2500,3495.50\n";

    #[test]
    fn skips_header_and_ignores_balance() {
        let transactions =
            parse(CSV.as_bytes(), &options(ColumnFilter::Ignore(vec![3]), 1)).unwrap();
        assert_eq!(2, transactions.len());
        assert_eq!(date(2024, 3, 1), transactions[0].date);
        assert_eq!("STARBUCKS #12, SEATTLE", transactions[0].description);
        assert_eq!(Decimal::new(-450, 2), transactions[0].amount);
        assert_eq!("USD", transactions[0].currency);
        assert_eq!(Decimal::new(2500, 0), transactions[1].amount);
        assert!(!transactions[0].done);
    }

    #[rstest]
    #[case(ColumnFilter::Select(vec![0, 1, 2]))]
    #[case(ColumnFilter::Ignore(vec![3]))]
    fn select_and_ignore_agree(#[case] columns: ColumnFilter) {
        let transactions = parse(CSV.as_bytes(), &options(columns, 1)).unwrap();
        assert_eq!(Decimal::new(-450, 2), transactions[0].amount);
    }

    #[test]
    fn later_amount_column_wins() {
        // Without a filter the balance column overrides the amount
        let transactions = parse(CSV.as_bytes(), &options(ColumnFilter::All, 1)).unwrap();
        assert_eq!(Decimal::new(99550, 2), transactions[0].amount);
    }

    #[test]
    fn ids_are_stable_and_distinct() {
        let first = parse(CSV.as_bytes(), &options(ColumnFilter::All, 1)).unwrap();
        let second = parse(CSV.as_bytes(), &options(ColumnFilter::All, 1)).unwrap();
        assert_eq!(first[0].id, second[0].id);
        assert_ne!(first[0].id, first[1].id);
    }

    #[rstest]
    #[case::header_not_skipped(CSV, 0)]
    #[case::missing_description("03/01/2024,-4.50\n", 0)]
    #[case::zero_amount("03/01/2024,FEE,0.00\n", 0)]
    #[case::bad_date("2024-03-01,FEE,-1.00\n", 0)]
    fn incomplete_rows_are_fatal(#[case] content: &str, #[case] skip: usize) {
        assert!(parse(content.as_bytes(), &options(ColumnFilter::All, skip)).is_err());
    }

    #[test]
    fn flexible_row_lengths() {
        let content = "03/01/2024,FEE,-1.00\n03/02/2024,INTEREST,0.12,extra\n";
        let transactions = parse(content.as_bytes(), &options(ColumnFilter::All, 0)).unwrap();
        assert_eq!(2, transactions.len());
        assert_eq!("extra", transactions[1].description);
    }
}
