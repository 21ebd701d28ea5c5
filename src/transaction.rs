use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransactionId(pub String);

impl TransactionId {
    pub fn new(id: String) -> Self {
        Self(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Which posting of a transaction gets categorized interactively.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    To,
    From,
}

#[derive(Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub id: TransactionId,
    pub date: NaiveDate,
    pub description: String,
    pub to_account: String,
    pub from_account: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub amount: Decimal,
    pub currency: String,
    /// Internal transfers and asset/equity/liability targets. Never used for training.
    pub skip_classification: bool,
    pub done: bool,
}

impl Transaction {
    pub fn new(
        id: TransactionId,
        date: NaiveDate,
        description: String,
        amount: Decimal,
        currency: String,
    ) -> Self {
        Self {
            id,
            date,
            description,
            to_account: String::new(),
            from_account: String::new(),
            amount,
            currency,
            skip_classification: false,
            done: false,
        }
    }

    /// Spends (negative amounts) get their target categorized, receipts their source.
    pub fn category_side(&self) -> Side {
        if self.amount > Decimal::ZERO {
            Side::From
        } else {
            Side::To
        }
    }

    pub fn category(&self) -> &str {
        match self.category_side() {
            Side::To => &self.to_account,
            Side::From => &self.from_account,
        }
    }

    pub fn set_category(&mut self, category: String) {
        match self.category_side() {
            Side::To => self.to_account = category,
            Side::From => self.from_account = category,
        }
    }

    /// Sets the account that isn't categorized interactively.
    pub fn set_counter_account(&mut self, account: String) {
        match self.category_side() {
            Side::To => self.from_account = account,
            Side::From => self.to_account = account,
        }
    }

    pub fn is_complete(&self) -> bool {
        !self.to_account.is_empty() && !self.from_account.is_empty()
    }

    pub fn is_spend(&self) -> bool {
        self.amount < Decimal::ZERO
    }
}

impl Debug for Transaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} \"{}\" {} {} [{} <- {}]{}",
            self.id.0,
            self.date.format("%Y/%m/%d"),
            self.description,
            self.amount,
            self.currency,
            self.to_account,
            self.from_account,
            if self.done { " done" } else { "" },
        )
    }
}
