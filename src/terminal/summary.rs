use console::{pad_str, style, Alignment, StyledObject};
use rust_decimal::Decimal;

use crate::transaction::{Side, Transaction};

const DESCRIPTION_WIDTH: usize = 40;
const CATEGORY_WIDTH: usize = 20;

#[derive(Debug, Clone, Copy)]
pub enum Position {
    /// Zero based index into a batch of `total` transactions.
    InBatch { index: usize, total: usize },
    Duplicate,
}

/// One line overview of a transaction, e.g.
/// ` R  [ 3 of 12]  2024/03/01  STARBUCKS COFFEE ...  [TO] Expenses:Food  -4.50 USD`
pub fn summary_line(transaction: &Transaction, position: Position) -> String {
    format!(
        "{} {} {} {} {} {}",
        style_status(transaction.done),
        style_position(position),
        style(transaction.date.format("%Y/%m/%d").to_string()).yellow(),
        style(pad_str(
            &transaction.description,
            DESCRIPTION_WIDTH,
            Alignment::Left,
            Some("…"),
        ))
        .bold(),
        style_category(transaction),
        style_amount(transaction.amount, &transaction.currency),
    )
}

pub fn side_label(side: Side) -> &'static str {
    match side {
        Side::To => "[TO]",
        Side::From => "[FROM]",
    }
}

fn style_status(done: bool) -> StyledObject<&'static str> {
    if done {
        style(" R ").black().on_green()
    } else {
        style(" N ").white().on_red()
    }
}

fn style_position(position: Position) -> StyledObject<String> {
    let text = match position {
        Position::InBatch { index, total } => {
            let width = total.to_string().len().max(2);
            format!("[{:>width$} of {:>width$}]", index + 1, total)
        }
        Position::Duplicate => "[DUPLICATE]".to_string(),
    };
    style(text).blue()
}

fn style_category(transaction: &Transaction) -> StyledObject<String> {
    let category = transaction.category();
    if category.is_empty() {
        return style(String::new());
    }
    // Long paths are cut from the left, the leaf is the interesting part.
    let chars: Vec<char> = category.chars().collect();
    let category: String = chars[chars.len().saturating_sub(CATEGORY_WIDTH)..]
        .iter()
        .collect();
    style(format!(
        "{} {:<width$}",
        side_label(transaction.category_side()),
        category,
        width = CATEGORY_WIDTH
    ))
    .green()
}

fn style_amount(amount: Decimal, currency: &str) -> StyledObject<String> {
    let result = style(format!("{:>10.2} {}", amount, currency)).bold();
    if amount < Decimal::ZERO {
        result.red()
    } else {
        result.green()
    }
}
