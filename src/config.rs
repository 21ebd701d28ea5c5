use anyhow::{anyhow, Context as _, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::args::Args;
use crate::import::bank::ColumnFilter;

pub const CONFIG_FILE: &str = "config.yaml";
pub const RULES_FILE: &str = "rules.yaml";

const DEFAULT_CONFIG_DIR: &str = ".into-ledger";
const DEFAULT_DATE_FORMAT: &str = "%m/%d/%Y";
const DEFAULT_TOLERANCE_HOURS: u32 = 24;

/// Contents of `config.yaml`, e.g.
///
/// ```yaml
/// accounts:
///   Assets:Checking:
///     date_format: "%Y-%m-%d"
///     skip: 1
///     ignore_columns: [2]
/// noise: [pos, purchase]
/// ```
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Import settings per counter account, used when it matches `-a`.
    #[serde(default)]
    pub accounts: HashMap<String, AccountConfig>,
    /// Extra words the classifier ignores.
    #[serde(default)]
    pub noise: Vec<String>,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountConfig {
    pub currency: Option<String>,
    pub date_format: Option<String>,
    pub skip: Option<usize>,
    pub ignore_columns: Vec<usize>,
    pub select_columns: Vec<usize>,
    pub within: Option<u32>,
    #[serde(with = "rust_decimal::serde::str_option")]
    pub below: Option<Decimal>,
}

/// The settings a run works with after merging flags, config and defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportSettings {
    pub account: String,
    pub currency: String,
    pub date_format: String,
    pub skip: usize,
    pub columns: ColumnFilter,
    pub tolerance_hours: u32,
    pub below: Decimal,
}

impl Config {
    /// Returns an empty config if the file doesn't exist.
    pub fn load(path: &Path) -> Result<Self> {
        log::info!("Loading config...");
        if !path.try_exists()? {
            log::info!("Loading config...not found");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        log::info!("Loading config...done");
        Ok(config)
    }

    /// Flags given on the command line win over the config of the account.
    pub fn settings_for(&self, args: &Args) -> ImportSettings {
        let account = self.accounts.get(&args.account).cloned().unwrap_or_default();
        let select = first_non_empty(&args.select_columns, &account.select_columns);
        let ignore = first_non_empty(&args.ignore_columns, &account.ignore_columns);
        let columns = if !select.is_empty() {
            ColumnFilter::Select(select.to_vec())
        } else if !ignore.is_empty() {
            ColumnFilter::Ignore(ignore.to_vec())
        } else {
            ColumnFilter::All
        };
        ImportSettings {
            account: args.account.clone(),
            currency: args
                .currency
                .clone()
                .or(account.currency)
                .unwrap_or_default(),
            date_format: args
                .date_format
                .clone()
                .or(account.date_format)
                .unwrap_or_else(|| DEFAULT_DATE_FORMAT.to_string()),
            skip: args.skip.or(account.skip).unwrap_or(0),
            columns,
            tolerance_hours: args
                .within
                .or(account.within)
                .unwrap_or(DEFAULT_TOLERANCE_HOURS),
            below: args.below.or(account.below).unwrap_or(Decimal::ZERO),
        }
    }
}

fn first_non_empty<'a>(first: &'a [usize], second: &'a [usize]) -> &'a [usize] {
    if first.is_empty() {
        second
    } else {
        first
    }
}

/// `--conf` if given, else `$HOME/.into-ledger`.
pub fn config_dir(args: &Args) -> Result<PathBuf> {
    if let Some(dir) = &args.conf {
        return Ok(dir.clone());
    }
    let home = std::env::var_os("HOME")
        .ok_or_else(|| anyhow!("HOME isn't set, please pass --conf"))?;
    Ok(PathBuf::from(home).join(DEFAULT_CONFIG_DIR))
}
