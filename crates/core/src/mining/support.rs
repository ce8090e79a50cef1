use crate::domain::item::ItemId;
use crate::transactions::Transaction;

/// Fraction of `transactions` containing every item of `itemset`.
///
/// Returns 0.0 for an empty transaction set.
pub fn support(itemset: &[ItemId], transactions: &[Transaction]) -> f64 {
    let count = transactions.iter().filter(|transaction| transaction.contains_all(itemset)).count();
    ratio(count, transactions.len())
}

pub(crate) fn ratio(count: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    count as f64 / total as f64
}
