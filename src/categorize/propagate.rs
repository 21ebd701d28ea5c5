use crate::sanitize::letters_only;
use crate::transaction::Transaction;

/// Copies the category of `batch[from]` onto the directly following transactions
/// with the same letters-only description that are categorized on the same side,
/// and marks them done.
///
/// Only the description letters and the sign are compared, not the amount, so
/// recurring merchants with varying amounts are grouped.
///
/// Returns the index after the last transaction that got the category.
pub fn apply_to_similar(batch: &mut [Transaction], from: usize) -> usize {
    let Some((source, rest)) = batch[from..].split_first_mut() else {
        return from;
    };
    let description = letters_only(&source.description);
    let side = source.category_side();
    let category = source.category().to_string();

    let mut upto = from + 1;
    for target in rest {
        if target.category_side() != side || letters_only(&target.description) != description {
            break;
        }
        target.set_category(category.clone());
        target.done = true;
        upto += 1;
    }
    upto
}
