use anyhow::{Context as _, Result};
use regex::Regex;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::path::Path;

use crate::stage::Stage;
use crate::terminal::{summary_line, Position, Terminal};
use crate::transaction::Transaction;

pub const SMALL_CATEGORY: &str = "Expenses:Small";

/// Categories assigned by description patterns, loaded from a YAML file like
///
/// ```yaml
/// Expenses:Travel:
///   - ^LYFT +\*RIDE
/// Expenses:Food:
///   - ^STARBUCKS
/// ```
#[derive(Debug, Default)]
pub struct Rules {
    rules: Vec<(String, Regex)>,
}

impl Rules {
    /// No rules if the file doesn't exist.
    pub fn load(path: &Path) -> Result<Self> {
        log::info!("Loading rules...");
        if !path.try_exists()? {
            log::info!("Loading rules...not found");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read rules file {}", path.display()))?;
        let rules = Self::parse(&content)
            .with_context(|| format!("Failed to parse rules file {}", path.display()))?;
        log::info!("Loading rules...done");
        Ok(rules)
    }

    fn parse(content: &str) -> Result<Self> {
        let by_category: BTreeMap<String, Vec<String>> = serde_yaml::from_str(content)?;
        let mut rules = vec![];
        for (category, patterns) in by_category {
            for pattern in patterns {
                let regex = Regex::new(&pattern)
                    .with_context(|| format!("Invalid pattern '{pattern}' for {category}"))?;
                rules.push((category.clone(), regex));
            }
        }
        Ok(Self { rules })
    }

    pub fn category_for(&self, description: &str) -> Option<&str> {
        self.rules
            .iter()
            .find(|(_, regex)| regex.is_match(description))
            .map(|(category, _)| category.as_str())
    }

    /// Stages every transaction matching a rule and returns the others.
    pub fn apply(
        &self,
        batch: Vec<Transaction>,
        stage: &Stage,
        terminal: &mut impl Terminal,
    ) -> Result<Vec<Transaction>> {
        let mut unmatched = Vec::with_capacity(batch.len());
        let mut count = 0;
        for mut transaction in batch {
            let category = match self.category_for(&transaction.description) {
                Some(category) if !transaction.done => category,
                _ => {
                    unmatched.push(transaction);
                    continue;
                }
            };
            transaction.set_category(category.to_string());
            transaction.done = true;
            count += 1;
            stage.put(&transaction)?;
            terminal.write_line(&summary_line(
                &transaction,
                Position::InBatch {
                    index: count - 1,
                    total: count,
                },
            ))?;
        }
        terminal.write_line(&format!(
            "\t{count} transactions have been categorized based on rules.\n"
        ))?;
        Ok(unmatched)
    }
}

/// Stages spends of at most `below` as [`SMALL_CATEGORY`] and returns the others.
pub fn categorize_small(
    batch: Vec<Transaction>,
    below: Decimal,
    stage: &Stage,
    terminal: &mut impl Terminal,
) -> Result<Vec<Transaction>> {
    let mut unmatched = Vec::with_capacity(batch.len());
    let mut count = 0;
    let mut total = Decimal::ZERO;
    for mut transaction in batch {
        if transaction.done || !transaction.is_spend() || transaction.amount < -below {
            unmatched.push(transaction);
            continue;
        }
        transaction.set_category(SMALL_CATEGORY.to_string());
        transaction.done = true;
        count += 1;
        total += transaction.amount;
        stage.put(&transaction)?;
        terminal.write_line(&summary_line(
            &transaction,
            Position::InBatch {
                index: count - 1,
                total: count,
            },
        ))?;
    }
    terminal.write_line(&format!(
        "\t{count} transactions totaling {:.2} below {below:.2} \
         have been categorized as '{SMALL_CATEGORY}'.\n",
        total.abs(),
    ))?;
    Ok(unmatched)
}
