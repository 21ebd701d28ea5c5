use anyhow::{Context as _, Result};
use chrono::{DateTime, Local};
use std::io::Write as _;
use std::path::Path;

use crate::transaction::Transaction;

const ACCOUNT_WIDTH: usize = 20;

/// Appends `transactions` to the journal at `path`, preceded by a comment
/// marking the run. Creates the file if needed.
pub fn append_to_journal(
    path: &Path,
    transactions: &[Transaction],
    run_at: DateTime<Local>,
) -> Result<()> {
    log::info!("Writing transactions...");
    let mut content = format!(
        "; ledger-import run at {}\n\n",
        run_at.format("%Y-%m-%d %H:%M:%S %z")
    );
    for transaction in transactions {
        content.push_str(&format_transaction(transaction));
    }
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open output file {}", path.display()))?;
    file.write_all(content.as_bytes())
        .with_context(|| format!("Failed to write to output file {}", path.display()))?;
    file.sync_all()?;
    log::info!("Writing transactions...done");
    Ok(())
}

/// Reviewed transactions are cleared (`*`), accepted guesses pending (`!`).
pub fn format_transaction(transaction: &Transaction) -> String {
    let flag = if transaction.done { '*' } else { '!' };
    format!(
        "{} {} {}\n\t{:<width$}\t{:.2}{}\n\t{}\n\n",
        transaction.date.format("%Y/%m/%d"),
        flag,
        transaction.description,
        transaction.to_account,
        transaction.amount.abs(),
        transaction.currency,
        transaction.from_account,
        width = ACCOUNT_WIDTH,
    )
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone as _;

    use super::*;
    use crate::transaction::testutils::{date, transaction};

    fn spend() -> Transaction {
        let mut t = transaction("1", date(2024, 3, 1), "STARBUCKS #12", -450);
        t.currency = " USD".to_string();
        t.to_account = "Expenses:Food".to_string();
        t.from_account = "Assets:Checking".to_string();
        t.done = true;
        t
    }

    #[test]
    fn formats_reviewed_spend() {
        assert_eq!(
            "2024/03/01 * STARBUCKS #12\n\tExpenses:Food       \t4.50 USD\n\tAssets:Checking\n\n",
            format_transaction(&spend())
        );
    }

    #[test]
    fn formats_pending_receipt() {
        let mut t = transaction("2", date(2024, 3, 2), "PAYROLL", 250000);
        t.to_account = "Assets:Checking".to_string();
        t.from_account = "Income:Salary".to_string();
        assert_eq!(
            "2024/03/02 ! PAYROLL\n\tAssets:Checking     \t2500.00USD\n\tIncome:Salary\n\n",
            format_transaction(&t)
        );
    }

    #[test]
    fn appends_with_header() {
        let tempdir = tempfile::tempdir().unwrap();
        let path = tempdir.path().join("main.ledger");
        std::fs::write(&path, "; existing\n").unwrap();
        let run_at = Local.with_ymd_and_hms(2024, 3, 5, 10, 30, 0).unwrap();

        append_to_journal(&path, &[spend()], run_at).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("; existing\n; ledger-import run at 2024-03-05 10:30:00"));
        assert!(content.ends_with(&format_transaction(&spend())));
    }

    #[test]
    fn creates_missing_output() {
        let tempdir = tempfile::tempdir().unwrap();
        let path = tempdir.path().join("new.ledger");
        append_to_journal(&path, &[], Local::now()).unwrap();
        assert!(std::fs::read_to_string(&path)
            .unwrap()
            .starts_with("; ledger-import run at "));
    }
}
