use crate::sanitize::sanitize;
use crate::transaction::Transaction;

/// History entries earlier than this before the first candidate are never looked at.
const MIN_LOOKBACK_HOURS: i64 = 24;

#[derive(Debug)]
pub struct Deduplicated {
    pub kept: Vec<Transaction>,
    pub duplicates: Vec<Transaction>,
}

/// Drops candidates that already appear in `history`.
///
/// A candidate is a duplicate if some historic transaction has the same sanitized
/// description, the same absolute amount and a date at most `tolerance_hours` away.
/// Both lists get sorted by date first, the window scan below relies on it.
pub fn remove_duplicates(
    history: &mut [Transaction],
    mut candidates: Vec<Transaction>,
    tolerance_hours: u32,
) -> Deduplicated {
    if candidates.is_empty() {
        return Deduplicated {
            kept: candidates,
            duplicates: vec![],
        };
    }

    history.sort_by_key(|t| t.date);
    candidates.sort_by_key(|t| t.date);

    let tolerance = i64::from(tolerance_hours);
    let lookback = tolerance.max(MIN_LOOKBACK_HOURS);
    let earliest = candidates[0].date;
    let window_start = history.partition_point(|h| (earliest - h.date).num_hours() > lookback);
    let window = &history[window_start..];

    let (duplicates, kept): (Vec<_>, Vec<_>) = candidates
        .into_iter()
        .partition(|candidate| is_duplicate(window, candidate, tolerance));

    log::info!(
        "Found {} duplicates among {} transactions",
        duplicates.len(),
        duplicates.len() + kept.len()
    );
    Deduplicated { kept, duplicates }
}

fn is_duplicate(window: &[Transaction], candidate: &Transaction, tolerance: i64) -> bool {
    let description = sanitize(&candidate.description);
    let amount = candidate.amount.abs();
    for previous in window {
        let delta = (previous.date - candidate.date).num_hours();
        if delta > tolerance {
            break;
        }
        if delta.abs() <= tolerance
            && previous.amount.abs() == amount
            && sanitize(&previous.description) == description
        {
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::transaction::testutils::{date, historic, transaction};

    fn history() -> Vec<Transaction> {
        vec![
            historic(date(2024, 3, 10), "WHOLE FOODS #12", -5423, "Expenses:Food"),
            historic(date(2024, 1, 2), "RENT", -150000, "Expenses:Home"),
            historic(date(2024, 3, 1), "STARBUCKS COFFEE", -450, "Expenses:Food"),
        ]
    }

    #[test]
    fn empty_candidates() {
        let result = remove_duplicates(&mut history(), vec![], 24);
        assert!(result.kept.is_empty());
        assert!(result.duplicates.is_empty());
    }

    #[test]
    fn identical_transaction_is_dropped() {
        let candidate = transaction("c1", date(2024, 3, 1), "STARBUCKS COFFEE", -450);
        let result = remove_duplicates(&mut history(), vec![candidate.clone()], 24);
        assert!(result.kept.is_empty());
        assert_eq!(vec![candidate], result.duplicates);
    }

    #[test]
    fn description_is_compared_sanitized_and_amount_absolute() {
        let candidate = transaction("c1", date(2024, 3, 10), "Whole Foods 12", 5423);
        // Case differs, so not a duplicate.
        let result = remove_duplicates(&mut history(), vec![candidate], 24);
        assert_eq!(1, result.kept.len());

        let candidate = transaction("c2", date(2024, 3, 10), "WHOLE FOODS (12)", 5423);
        let result = remove_duplicates(&mut history(), vec![candidate], 24);
        assert_eq!(1, result.duplicates.len());
    }

    #[test]
    fn transaction_differing_everywhere_is_kept() {
        let candidate = transaction("c1", date(2024, 6, 1), "SHELL OIL", -3000);
        let result = remove_duplicates(&mut history(), vec![candidate.clone()], 24);
        assert_eq!(vec![candidate], result.kept);
        assert!(result.duplicates.is_empty());
    }

    #[rstest]
    #[case::one_day_before(date(2024, 2, 29), true)]
    #[case::one_day_after(date(2024, 3, 2), true)]
    #[case::two_days_before(date(2024, 2, 28), false)]
    #[case::two_days_after(date(2024, 3, 3), false)]
    fn tolerance_is_symmetric(#[case] candidate_date: chrono::NaiveDate, #[case] duplicate: bool) {
        let candidate = transaction("c1", candidate_date, "STARBUCKS COFFEE", -450);
        let result = remove_duplicates(&mut history(), vec![candidate], 24);
        assert_eq!(duplicate, result.duplicates.len() == 1);
        assert_eq!(!duplicate, result.kept.len() == 1);
    }

    #[test]
    fn tolerance_larger_than_a_day_looks_back_far_enough() {
        let candidate = transaction("c1", date(2024, 3, 4), "STARBUCKS COFFEE", -450);
        let result = remove_duplicates(&mut history(), vec![candidate], 72);
        assert_eq!(1, result.duplicates.len());
    }

    #[test]
    fn unsorted_inputs_are_handled() {
        let candidates = vec![
            transaction("late", date(2024, 3, 10), "WHOLE FOODS #12", -5423),
            transaction("new", date(2024, 3, 5), "NEW MERCHANT", -100),
            transaction("early", date(2024, 1, 2), "RENT", -150000),
        ];
        let result = remove_duplicates(&mut history(), candidates, 24);
        let kept: Vec<_> = result.kept.iter().map(|t| t.id.as_str()).collect();
        let mut dropped: Vec<_> = result.duplicates.iter().map(|t| t.id.as_str()).collect();
        dropped.sort();
        assert_eq!(vec!["new"], kept);
        assert_eq!(vec!["early", "late"], dropped);
    }
}
