use anyhow::{Context as _, Result};
use chrono::Local;
use console::style;
use std::path::{Path, PathBuf};

use crate::args::Args;
use crate::categorize::{sort_for_review, Session, SuggestionsFile};
use crate::classifier::{Classifier, Tokenizer};
use crate::config::{self, Config, ImportSettings, CONFIG_FILE, RULES_FILE};
use crate::dedup::{remove_duplicates, Deduplicated};
use crate::export;
use crate::import::{bank, CsvOptions, Journal};
use crate::rules::{categorize_small, Rules};
use crate::shortcuts::ShortcutTree;
use crate::stage::Stage;
use crate::terminal::{summary_line, ConsoleTerminal, Position, Terminal};
use crate::transaction::Transaction;

pub fn main(args: Args) -> Result<()> {
    let config_dir = config::config_dir(&args)?;
    std::fs::create_dir_all(&config_dir).with_context(|| {
        format!("Failed to create config directory {}", config_dir.display())
    })?;
    let config = Config::load(&config_dir.join(CONFIG_FILE))?;
    let shortcuts_path = config_dir.join(&args.short);
    let mut shortcuts = ShortcutTree::load(&shortcuts_path)?;

    let cli = Cli {
        settings: config.settings_for(&args),
        args: &args,
        config: &config,
        config_dir,
        terminal: ConsoleTerminal::new_stdout(),
    };
    let result = cli.run(&mut shortcuts);
    // Saved even if the run failed
    let saved = shortcuts
        .save(&shortcuts_path)
        .context("Failed to save shortcuts");
    result.and(saved)
}

pub struct Cli<'a> {
    args: &'a Args,
    config: &'a Config,
    settings: ImportSettings,
    config_dir: PathBuf,
    terminal: ConsoleTerminal,
}

impl Cli<'_> {
    pub fn run(mut self, shortcuts: &mut ShortcutTree) -> Result<()> {
        let mut journal = Journal::load_or_set_up(&self.args.journal)?;
        for account in journal.known_accounts() {
            shortcuts.assign_account(account)?;
        }
        let classifier = Classifier::train(
            &journal.history,
            Tokenizer::new(self.config.noise.iter().cloned()),
        )
        .context("Failed to train classifier on the journal")?;

        let batch = self.import_batch()?;
        let Deduplicated { mut kept, duplicates } =
            remove_duplicates(&mut journal.history, batch, self.settings.tolerance_hours);
        self.print_duplicates(&duplicates)?;

        let stage = match &self.args.stage {
            Some(dir) => Stage::open(dir)?,
            None => Stage::temporary()?,
        };
        let resumed = resume_from_stage(&mut kept, &stage)?;
        if resumed > 0 {
            self.terminal.write_line(&format!(
                "\t{resumed} transactions resumed from an earlier run.\n"
            ))?;
        }

        sort_for_review(&mut kept);
        let rules = Rules::load(&self.config_dir.join(RULES_FILE))?;
        let kept = rules.apply(kept, &stage, &mut self.terminal)?;
        let mut batch = categorize_small(kept, self.settings.below, &stage, &mut self.terminal)?;

        let suggestions = self
            .args
            .suggestions
            .as_deref()
            .map(SuggestionsFile::load)
            .transpose()?;
        {
            let mut session =
                Session::new(&classifier, shortcuts, &stage, ConsoleTerminal::new_stdout());
            if let Some(suggestions) = &suggestions {
                session = session.with_advisor(suggestions);
            }
            session.run(&mut batch)?;
        }

        let output = self.args.output.as_deref().unwrap_or(&self.args.journal);
        export_decisions(stage, output)?;
        self.terminal.write_line(&format!(
            "Transactions written to file: {}",
            style(output.display()).bold()
        ))?;
        Ok(())
    }

    fn import_batch(&mut self) -> Result<Vec<Transaction>> {
        let options = CsvOptions {
            date_format: self.settings.date_format.clone(),
            skip: self.settings.skip,
            columns: self.settings.columns.clone(),
            currency: self.settings.currency.clone(),
        };
        let mut batch = bank::load(&self.args.csv, &options)?;
        for transaction in &mut batch {
            transaction.set_counter_account(self.settings.account.clone());
        }
        batch.sort_by_key(|t| t.date);
        if let (Some(first), Some(last)) = (batch.first(), batch.last()) {
            self.terminal
                .write_line(&style("Earliest and latest transactions:").bold().to_string())?;
            self.terminal
                .write_line(&summary_line(first, Position::InBatch { index: 0, total: 2 }))?;
            self.terminal
                .write_line(&summary_line(last, Position::InBatch { index: 1, total: 2 }))?;
            self.terminal.write_line("")?;
        }
        Ok(batch)
    }

    fn print_duplicates(&mut self, duplicates: &[Transaction]) -> Result<()> {
        for duplicate in duplicates {
            self.terminal
                .write_line(&summary_line(duplicate, Position::Duplicate))?;
        }
        self.terminal.write_line(&format!(
            "\t{} duplicates found and ignored.\n",
            duplicates.len()
        ))?;
        Ok(())
    }
}

/// Appends everything in `stage` to `output` by date, then empties the stage.
fn export_decisions(stage: Stage, output: &Path) -> Result<()> {
    let mut decided = stage.scan_all()?;
    decided.sort_by_key(|t| t.date);
    export::append_to_journal(output, &decided, Local::now())?;
    stage.discard()
}

/// Replaces transactions that already have a decision in `stage` by that decision.
/// Returns how many were replaced.
fn resume_from_stage(batch: &mut [Transaction], stage: &Stage) -> Result<usize> {
    let mut resumed = 0;
    for transaction in batch.iter_mut() {
        if let Some(staged) = stage.get(&transaction.id)? {
            *transaction = staged;
            resumed += 1;
        }
    }
    Ok(resumed)
}
