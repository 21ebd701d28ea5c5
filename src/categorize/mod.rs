use anyhow::Result;
use console::style;
use std::cmp::Reverse;

mod advisor;
mod propagate;
mod review;

pub use advisor::{merge_shortlist, Advisor, Suggestion, SuggestionsFile};
pub use propagate::apply_to_similar;
pub use review::{review, ReviewOutcome};

use crate::classifier::Classifier;
use crate::sanitize::letters_only;
use crate::shortcuts::{ShortcutTree, ROOT};
use crate::stage::Stage;
use crate::terminal::{side_label, summary_line, Keystroke, Position, Terminal};
use crate::transaction::Transaction;

const DESCRIPTION_WIDTH: usize = 40;
const CATEGORY_WIDTH: usize = 20;

/// Orders a batch so that transactions of the same merchant are adjacent,
/// newest first.
pub fn sort_for_review(batch: &mut [Transaction]) {
    batch.sort_by_cached_key(|t| (letters_only(&t.description), Reverse(t.date)));
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PassEnd {
    /// The cursor left the batch on either end.
    Exhausted,
    Quit,
}

/// The interactive categorization loop over one batch of new transactions.
pub struct Session<'a, T: Terminal> {
    classifier: &'a Classifier,
    shortcuts: &'a mut ShortcutTree,
    stage: &'a Stage,
    advisor: Option<&'a dyn Advisor>,
    terminal: T,
}

impl<'a, T: Terminal> Session<'a, T> {
    pub fn new(
        classifier: &'a Classifier,
        shortcuts: &'a mut ShortcutTree,
        stage: &'a Stage,
        terminal: T,
    ) -> Self {
        Self {
            classifier,
            shortcuts,
            stage,
            advisor: None,
            terminal,
        }
    }

    pub fn with_advisor(mut self, advisor: &'a dyn Advisor) -> Self {
        self.advisor = Some(advisor);
        self
    }

    pub fn into_terminal(self) -> T {
        self.terminal
    }

    /// Runs until the user quits or declines another review pass.
    ///
    /// Every decision is in the stage by the time the next key is read.
    pub fn run(&mut self, batch: &mut [Transaction]) -> Result<()> {
        if batch.is_empty() {
            return Ok(());
        }
        loop {
            match self.browse(batch)? {
                BrowseChoice::Review => {}
                BrowseChoice::Accept => return self.accept_as_is(batch),
                BrowseChoice::Quit => return Ok(()),
            }
            if self.review_pass(batch)? == PassEnd::Quit {
                return Ok(());
            }
        }
    }

    /// Shows the batch with a best guess for everything not reviewed yet.
    fn browse(&mut self, batch: &mut [Transaction]) -> Result<BrowseChoice> {
        let total = batch.len();
        for (index, transaction) in batch.iter_mut().enumerate() {
            if !transaction.done {
                if let Some(best) = self.classifier.top_hits(&transaction.description).first() {
                    transaction.set_category(best.to_string());
                }
            }
            self.terminal
                .write_line(&summary_line(transaction, Position::InBatch { index, total }))?;
        }
        self.terminal.write_line("")?;
        self.terminal
            .write_line(&format!("Found {total} transactions. Review (Y/n/q)?"))?;
        Ok(match self.terminal.read_key()? {
            Keystroke::Char('n') | Keystroke::Char('N') => BrowseChoice::Accept,
            Keystroke::Char('q') | Keystroke::Char('Q') => BrowseChoice::Quit,
            _ => BrowseChoice::Review,
        })
    }

    /// Stages the best guesses of everything that wasn't reviewed, as pending.
    fn accept_as_is(&mut self, batch: &[Transaction]) -> Result<()> {
        let mut count = 0;
        for transaction in batch.iter().filter(|t| !t.done && t.is_complete()) {
            self.stage.put(transaction)?;
            count += 1;
        }
        self.terminal
            .write_line(&format!("\t{count} transactions accepted as-is."))?;
        Ok(())
    }

    fn review_pass(&mut self, batch: &mut [Transaction]) -> Result<PassEnd> {
        let mut cursor: usize = 0;
        while cursor < batch.len() {
            match self.categorize(batch, cursor)? {
                // ShowAll never leaves categorize
                ReviewOutcome::Commit { drilled_down: true }
                | ReviewOutcome::Unchanged
                | ReviewOutcome::ShowAll => {}
                ReviewOutcome::Commit {
                    drilled_down: false,
                } => {
                    self.shortcuts.assign_account(batch[cursor].category())?;
                    cursor = self.propagate(batch, cursor)?;
                }
                ReviewOutcome::Skip => cursor += 1,
                ReviewOutcome::Back => match cursor.checked_sub(1) {
                    Some(previous) => cursor = previous,
                    None => return Ok(PassEnd::Exhausted),
                },
                ReviewOutcome::Quit => return Ok(PassEnd::Quit),
            }
        }
        Ok(PassEnd::Exhausted)
    }

    /// Reviews `batch[index]` against its shortlist, or against all shortcuts
    /// if the user asks for them.
    fn categorize(&mut self, batch: &mut [Transaction], index: usize) -> Result<ReviewOutcome> {
        let total = batch.len();
        let transaction = &mut batch[index];
        self.print_header(transaction, index, total)?;

        let suggestions = self
            .advisor
            .map(|advisor| advisor.suggest(transaction))
            .unwrap_or_default();
        let hits = self.classifier.top_hits(&transaction.description);
        let mut shortlist = ShortcutTree::new();
        for label in merge_shortlist(&suggestions, &hits) {
            shortlist.auto_assign(&label, ROOT)?;
        }

        let outcome = review(&mut self.terminal, self.stage, &mut shortlist, transaction)?;
        if outcome != ReviewOutcome::ShowAll {
            return Ok(outcome);
        }

        self.terminal.clear()?;
        self.terminal
            .write_line(&summary_line(transaction, Position::InBatch { index, total }))?;
        match review(&mut self.terminal, self.stage, &mut *self.shortcuts, transaction)? {
            ReviewOutcome::ShowAll => Ok(ReviewOutcome::Unchanged),
            outcome => Ok(outcome),
        }
    }

    /// Applies the category just committed at `index` to the similar transactions
    /// right after it. Returns where the cursor continues.
    fn propagate(&mut self, batch: &mut [Transaction], index: usize) -> Result<usize> {
        let upto = apply_to_similar(batch, index);
        if upto == index + 1 {
            return Ok(upto);
        }
        let total = batch.len();
        self.terminal.clear()?;
        for (i, transaction) in batch.iter().enumerate().take(upto).skip(index) {
            if i > index {
                self.stage.put(transaction)?;
            }
            self.terminal
                .write_line(&summary_line(transaction, Position::InBatch { index: i, total }))?;
        }
        self.terminal.write_line("")?;
        self.terminal.write_line(&format!(
            "The above {} transactions were similar to the last categorized one, \
             and were categorized accordingly. They can be changed by going back.",
            upto - index - 1
        ))?;
        self.terminal.read_key()?;
        Ok(upto)
    }

    fn print_header(
        &mut self,
        transaction: &Transaction,
        index: usize,
        total: usize,
    ) -> Result<()> {
        self.terminal.clear()?;
        self.terminal
            .write_line(&summary_line(transaction, Position::InBatch { index, total }))?;
        self.terminal.write_line("")?;
        if transaction.description.chars().count() > DESCRIPTION_WIDTH {
            self.terminal.write_line(
                &style(format!("{:>6} {}", "[DESC]", transaction.description))
                    .black()
                    .on_white()
                    .to_string(),
            )?;
        }
        let category = transaction.category();
        if category.chars().count() > CATEGORY_WIDTH {
            self.terminal.write_line(
                &style(format!(
                    "{:>6} {}",
                    side_label(transaction.category_side()),
                    category
                ))
                .black()
                .on_green()
                .to_string(),
            )?;
        }
        self.terminal.write_line("")?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BrowseChoice {
    Review,
    Accept,
    Quit,
}
