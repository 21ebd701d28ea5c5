use clap::Parser;
use std::path::PathBuf;

/// Import bank transactions from a CSV file into a ledger journal, categorizing
/// them interactively based on the journal's history.
#[derive(Parser, Debug)]
pub struct Args {
    /// Existing journal to learn from
    #[clap(short, long)]
    pub journal: PathBuf,

    /// Journal file to append to. Defaults to the journal
    #[clap(short, long)]
    pub output: Option<PathBuf>,

    /// CSV file containing the new transactions
    #[clap(long)]
    pub csv: PathBuf,

    /// Account the CSV was exported from, e.g. Assets:Checking
    #[clap(short = 'a', long)]
    pub account: String,

    /// Currency appended to amounts
    #[clap(short, long)]
    pub currency: Option<String>,

    /// Date format of the CSV, e.g. %m/%d/%Y
    #[clap(short, long)]
    pub date_format: Option<String>,

    /// Number of header lines in the CSV to skip
    #[clap(short, long)]
    pub skip: Option<usize>,

    /// Comma separated list of CSV columns to ignore
    #[clap(long = "ic", value_delimiter = ',')]
    pub ignore_columns: Vec<usize>,

    /// Comma separated list of CSV columns to select. Wins over --ic
    #[clap(long = "sc", value_delimiter = ',')]
    pub select_columns: Vec<usize>,

    /// Consider transactions duplicates if their dates are at most this many hours apart
    #[clap(long)]
    pub within: Option<u32>,

    /// Categorize spends up to this amount as Expenses:Small
    #[clap(long)]
    pub below: Option<rust_decimal::Decimal>,

    /// Config directory, defaults to $HOME/.into-ledger
    #[clap(long)]
    pub conf: Option<PathBuf>,

    /// Name of the shortcuts file in the config directory
    #[clap(long, default_value = "shortcuts.yaml")]
    pub short: String,

    /// Keep decisions in this directory so an interrupted run can be resumed
    #[clap(long)]
    pub stage: Option<PathBuf>,

    /// JSON file with category suggestions per description
    #[clap(long)]
    pub suggestions: Option<PathBuf>,
}

pub fn parse() -> Args {
    Args::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_short_and_long_flags() {
        let args = Args::try_parse_from([
            "ledger-import",
            "-j",
            "main.ledger",
            "--csv",
            "bank.csv",
            "-a",
            "Assets:Checking",
            "--ic",
            "0,3",
            "--below",
            "2.50",
        ])
        .unwrap();
        assert_eq!(PathBuf::from("main.ledger"), args.journal);
        assert_eq!("Assets:Checking", args.account);
        assert_eq!(vec![0, 3], args.ignore_columns);
        assert!(args.select_columns.is_empty());
        assert_eq!(Some(rust_decimal::Decimal::new(250, 2)), args.below);
        assert_eq!("shortcuts.yaml", args.short);
        assert_eq!(None, args.stage);
    }

    #[test]
    fn csv_is_required() {
        let result =
            Args::try_parse_from(["ledger-import", "-j", "main.ledger", "-a", "Assets:Checking"]);
        assert!(result.is_err());
    }
}
