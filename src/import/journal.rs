use anyhow::{bail, ensure, Context as _, Result};
use chrono::NaiveDate;
use regex::Regex;
use rust_decimal::Decimal;
use std::io::Write as _;
use std::path::Path;
use std::process::Command;
use std::str::FromStr;

use crate::terminal::prompt_yes_no;
use crate::transaction::{Transaction, TransactionId};

const LEDGER_DATE_FORMAT: &str = "%Y/%m/%d";

const BASIC_ACCOUNTS: &str = "\
; Basic accounts, feel free to rename or extend them

account Assets:Checking
account Assets:Savings
account Assets:Cash

account Income:Salary
account Income:Interest
account Income:Other

account Expenses:Home
account Expenses:Food
account Expenses:Kids
account Expenses:Travel
account Expenses:Wants
account Expenses:Others
account Expenses:Small

account Liabilities:Credit

2024/01/01 * Sample grocery purchase
    Expenses:Food               $25.00
    Assets:Checking

2024/01/02 * Sample gas purchase
    Expenses:Travel             $40.00
    Assets:Checking

";

/// What an existing journal tells us about the user's accounts.
#[derive(Debug)]
pub struct Journal {
    /// Accounts from `account` directives, including those of included files.
    pub declared_accounts: Vec<String>,
    /// One entry per posting, as reported by `ledger csv`.
    pub history: Vec<Transaction>,
}

impl Journal {
    pub fn load(path: &Path) -> Result<Self> {
        log::info!("Loading journal...");
        let text = read_with_includes(path)?;
        let declared_accounts = declared_accounts(&text)?;
        let history = parse_history(&run_ledger_csv(path)?)
            .with_context(|| format!("Failed to read history of {}", path.display()))?;
        log::info!(
            "Loading journal...done ({} accounts, {} postings)",
            declared_accounts.len(),
            history.len()
        );
        Ok(Self {
            declared_accounts,
            history,
        })
    }

    /// Like [`Journal::load`], but offers to set up basic accounts in a missing or
    /// empty journal.
    pub fn load_or_set_up(path: &Path) -> Result<Self> {
        if !path.try_exists()? {
            std::fs::File::create(path)
                .with_context(|| format!("Failed to create journal {}", path.display()))?;
        }
        let journal = Self::load(path)?;
        if !journal.needs_setup() {
            return Ok(journal);
        }
        println!("Your journal has no transactions and lacks basic account categories.");
        if !prompt_yes_no(
            "Add common accounts like Assets, Income and Expenses to the journal?",
            true,
        )? {
            bail!("Journal {} has nothing to learn from", path.display());
        }
        append_basic_accounts(path)?;
        Self::load(path)
    }

    fn needs_setup(&self) -> bool {
        self.history.is_empty() && !has_basic_accounts(&self.declared_accounts)
    }

    /// Declared accounts followed by every account used in the history.
    pub fn known_accounts(&self) -> impl Iterator<Item = &str> {
        self.declared_accounts
            .iter()
            .chain(self.history.iter().map(|t| &t.to_account))
            .map(String::as_str)
    }
}

/// The journal text with the content of every `include` line appended.
fn read_with_includes(path: &Path) -> Result<String> {
    let mut text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read journal {}", path.display()))?;
    let dir = path.parent().unwrap_or_else(|| Path::new(""));
    let includes: Vec<String> = text
        .lines()
        .filter_map(|line| line.strip_prefix("include "))
        .map(|name| name.trim().to_string())
        .collect();
    for name in includes {
        let included = dir.join(&name);
        let content = std::fs::read_to_string(&included)
            .with_context(|| format!("Failed to read included file {}", included.display()))?;
        text.push('\n');
        text.push_str(&content);
    }
    Ok(text)
}

fn declared_accounts(text: &str) -> Result<Vec<String>> {
    let directive = Regex::new(r"^account\W+(.*)")?;
    Ok(text
        .lines()
        .filter_map(|line| directive.captures(line))
        .filter_map(|captures| captures.get(1))
        .map(|account| account.as_str().trim().to_string())
        .filter(|account| !account.is_empty())
        .collect())
}

fn has_basic_accounts(declared: &[String]) -> bool {
    declared.iter().any(|account| {
        ["Expenses", "Assets", "Income"]
            .iter()
            .any(|basic| account.starts_with(basic))
    })
}

fn append_basic_accounts(path: &Path) -> Result<()> {
    let mut file = std::fs::OpenOptions::new()
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open journal {}", path.display()))?;
    file.write_all(format!("\n{BASIC_ACCOUNTS}").as_bytes())?;
    file.sync_all()?;
    Ok(())
}

fn run_ledger_csv(journal: &Path) -> Result<Vec<u8>> {
    let output = Command::new("ledger")
        .arg("-f")
        .arg(journal)
        .arg("csv")
        .output()
        .context("Failed to run ledger. Is it installed and in PATH?")?;
    ensure!(
        output.status.success(),
        "Unable to convert journal to csv: {}",
        String::from_utf8_lossy(&output.stderr).trim()
    );
    Ok(output.stdout)
}

/// Parses `ledger csv` output: date, code, payee, account, commodity, amount, ...
fn parse_history(content: &[u8]) -> Result<Vec<Transaction>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .escape(Some(b'\\'))
        .from_reader(content);
    let mut history = vec![];
    for (row, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("Failed to read line {}", row + 1))?;
        ensure!(
            record.len() >= 6,
            "Expected at least 6 columns in line {}, found {}",
            row + 1,
            record.len()
        );
        let date = NaiveDate::parse_from_str(&record[0], LEDGER_DATE_FORMAT)
            .with_context(|| format!("Unable to parse date '{}'", &record[0]))?;
        let account = record[3].trim();
        ensure!(!account.is_empty(), "Expected an account in line {}", row + 1);
        let amount = Decimal::from_str(&record[5].replace(',', ""))
            .with_context(|| format!("Unable to parse amount '{}'", &record[5]))?;

        let mut transaction = Transaction::new(
            TransactionId::new(format!("journal-{row}")),
            date,
            record[2].trim().to_string(),
            amount,
            record[4].to_string(),
        );
        transaction.to_account = account.to_string();
        transaction.skip_classification = skips_classification(account);
        transaction.done = true;
        history.push(transaction);
    }
    Ok(history)
}

/// Balance sheet accounts are where money comes from, not what it was spent on.
fn skips_classification(account: &str) -> bool {
    if account.starts_with("Assets:Reimbursements:") {
        return false;
    }
    ["Assets:", "Equity:", "Liabilities:"]
        .iter()
        .any(|prefix| account.starts_with(prefix))
}
