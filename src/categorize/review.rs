use anyhow::Result;
use console::{pad_str, style, Alignment};

use crate::shortcuts::{Navigation, ShortcutTree, ROOT};
use crate::stage::Stage;
use crate::terminal::{Keystroke, Terminal};
use crate::transaction::Transaction;

const OPTIONS_PER_ROW: usize = 4;
const OPTION_WIDTH: usize = 28;
const TODO_LABEL: &str = "TODO";
/// Path length after which a `TODO` placeholder is offered next to the children.
const TODO_DEPTH: usize = 2;

/// What a single review of one transaction ended with.
///
/// How far the cursor moves is up to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewOutcome {
    /// Both sides were set and the transaction was staged and marked done.
    /// `drilled_down` is set if the path was picked across several levels.
    Commit { drilled_down: bool },
    Skip,
    Back,
    ShowAll,
    Quit,
    /// Unmapped key, a leaf was picked or Enter was pressed on an incomplete transaction.
    Unchanged,
}

impl From<Navigation> for ReviewOutcome {
    fn from(nav: Navigation) -> Self {
        match nav {
            Navigation::Back => ReviewOutcome::Back,
            Navigation::Skip => ReviewOutcome::Skip,
            Navigation::Quit => ReviewOutcome::Quit,
            Navigation::ShowAll => ReviewOutcome::ShowAll,
        }
    }
}

/// Lets the user pick a category for `transaction` using the shortcuts in `scope`.
///
/// Picking a label that has children in `scope` continues one level deeper on
/// the same transaction. Enter commits once both sides are set.
///
/// On the third level a `TODO` entry is added to `scope`, for categories that
/// still need a proper name.
pub fn review(
    terminal: &mut impl Terminal,
    stage: &Stage,
    scope: &mut ShortcutTree,
    transaction: &mut Transaction,
) -> Result<ReviewOutcome> {
    let mut parent = ROOT.to_string();
    let mut path: Vec<String> = vec![];
    let mut drilled_down = false;
    loop {
        if path.len() == TODO_DEPTH {
            scope.auto_assign(TODO_LABEL, &parent)?;
        }
        if !path.is_empty() {
            terminal.write_line("")?;
            terminal.write_line(
                &style(format!("Selected [{}]", path.join(":")))
                    .black()
                    .on_white()
                    .to_string(),
            )?;
        }
        print_options(terminal, scope, &parent)?;

        let key = match terminal.read_key()? {
            Keystroke::Enter => {
                if !transaction.is_complete() {
                    return Ok(ReviewOutcome::Unchanged);
                }
                transaction.done = true;
                stage.put(transaction)?;
                return Ok(ReviewOutcome::Commit { drilled_down });
            }
            Keystroke::Char(key) => key,
            Keystroke::Other => return Ok(ReviewOutcome::Unchanged),
        };
        let Some(label) = scope.maps_to(key, &parent) else {
            return Ok(ReviewOutcome::Unchanged);
        };
        if let Some(nav) = Navigation::from_label(label) {
            return Ok(nav.into());
        }

        path.push(label.to_string());
        transaction.set_category(path.join(":"));
        if !scope.has_children(label) {
            return Ok(ReviewOutcome::Unchanged);
        }
        parent = label.to_string();
        drilled_down = true;
    }
}

fn print_options(terminal: &mut impl Terminal, scope: &ShortcutTree, parent: &str) -> Result<()> {
    let options = scope.options(parent);
    for row in options.chunks(OPTIONS_PER_ROW) {
        let line: String = row
            .iter()
            .map(|(key, label)| {
                let entry = format!("{} {}", style(format!("[{key}]")).cyan().bold(), label);
                pad_str(&entry, OPTION_WIDTH, Alignment::Left, Some("…")).into_owned()
            })
            .collect();
        terminal.write_line(line.trim_end())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terminal::testutils::ScriptedTerminal;
    use crate::transaction::testutils::{date, transaction};

    fn spend() -> Transaction {
        let mut t = transaction("1", date(2024, 3, 1), "STARBUCKS", -450);
        t.from_account = "Assets:Checking".to_string();
        t
    }

    fn tree() -> ShortcutTree {
        let mut tree = ShortcutTree::new();
        tree.assign_account("Expenses:Food:Restaurants").unwrap();
        tree.assign_account("Expenses:Travel").unwrap();
        tree.assign_account("Income:Salary").unwrap();
        tree
    }

    #[test]
    fn enter_on_incomplete_transaction_is_unchanged() {
        let stage = Stage::temporary().unwrap();
        let mut terminal = ScriptedTerminal::new("\n");
        let mut t = spend();
        let outcome = review(&mut terminal, &stage, &mut tree(), &mut t).unwrap();
        assert_eq!(ReviewOutcome::Unchanged, outcome);
        assert!(!t.done);
        assert!(stage.scan_all().unwrap().is_empty());
    }

    #[test]
    fn enter_commits_complete_transaction() {
        let stage = Stage::temporary().unwrap();
        let mut terminal = ScriptedTerminal::new("\n");
        let mut t = spend();
        t.to_account = "Expenses:Food".to_string();
        let outcome = review(&mut terminal, &stage, &mut tree(), &mut t).unwrap();
        assert_eq!(ReviewOutcome::Commit { drilled_down: false }, outcome);
        assert!(t.done);
        let staged = stage.scan_all().unwrap();
        assert_eq!(1, staged.len());
        assert_eq!("Expenses:Food", staged[0].to_account);
        assert!(staged[0].done);
    }

    #[test]
    fn navigation_keys() {
        let stage = Stage::temporary().unwrap();
        for (script, expected) in [
            ("b", ReviewOutcome::Back),
            ("s", ReviewOutcome::Skip),
            ("q", ReviewOutcome::Quit),
            ("a", ReviewOutcome::ShowAll),
            ("z", ReviewOutcome::Unchanged),
        ] {
            let mut terminal = ScriptedTerminal::new(script);
            let mut t = spend();
            assert_eq!(expected, review(&mut terminal, &stage, &mut tree(), &mut t).unwrap());
            assert!(!t.done);
        }
    }

    #[test]
    fn drill_down_to_leaf() {
        let stage = Stage::temporary().unwrap();
        let mut terminal = ScriptedTerminal::new("efr");
        let mut t = spend();
        let outcome = review(&mut terminal, &stage, &mut tree(), &mut t).unwrap();
        assert_eq!(ReviewOutcome::Unchanged, outcome);
        assert_eq!("Expenses:Food:Restaurants", t.to_account);
        assert!(!t.done);
        assert!(terminal
            .output()
            .contains("Selected [Expenses:Food]"));
    }

    #[test]
    fn enter_after_drill_down_commits_partial_path() {
        let stage = Stage::temporary().unwrap();
        let mut terminal = ScriptedTerminal::new("e\n");
        let mut t = spend();
        let outcome = review(&mut terminal, &stage, &mut tree(), &mut t).unwrap();
        assert_eq!(ReviewOutcome::Commit { drilled_down: true }, outcome);
        assert_eq!("Expenses", t.to_account);
        assert!(t.done);
        assert_eq!(vec![t], stage.scan_all().unwrap());
    }

    #[test]
    fn todo_offered_on_third_level() {
        let stage = Stage::temporary().unwrap();
        let mut scope = tree();
        let mut terminal = ScriptedTerminal::new("eft");
        let mut t = spend();
        let outcome = review(&mut terminal, &stage, &mut scope, &mut t).unwrap();
        assert_eq!(ReviewOutcome::Unchanged, outcome);
        assert_eq!("Expenses:Food:TODO", t.to_account);
        assert_eq!(Some("TODO"), scope.maps_to('t', "Food"));
        // Not offered above the third level
        assert_eq!(None, scope.maps_to('t', "Expenses").filter(|l| *l == "TODO"));
    }

    #[test]
    fn receipts_fill_from_side() {
        let stage = Stage::temporary().unwrap();
        let mut terminal = ScriptedTerminal::new("is");
        let mut t = transaction("1", date(2024, 3, 1), "PAYROLL", 100000);
        t.to_account = "Assets:Checking".to_string();
        let outcome = review(&mut terminal, &stage, &mut tree(), &mut t).unwrap();
        assert_eq!(ReviewOutcome::Unchanged, outcome);
        assert_eq!("Income:Salary", t.from_account);
        assert_eq!("Assets:Checking", t.to_account);
    }

    #[test]
    fn navigation_only_at_top_level() {
        let stage = Stage::temporary().unwrap();
        let mut terminal = ScriptedTerminal::new("eq");
        let mut t = spend();
        let outcome = review(&mut terminal, &stage, &mut tree(), &mut t).unwrap();
        assert_eq!(ReviewOutcome::Unchanged, outcome);
        assert_eq!("Expenses", t.to_account);
    }
}
