//! Greedy simplification: walk debtors and creditors in order, pairing them off.

use splitledger_core::{Money, UserId};

use crate::balances::Transaction;

/// Settle `balances` (which must sum to zero) by pairing debtors with creditors.
///
/// Debtors and creditors are taken in the order given. Each step transfers
/// `min(|debtor|, creditor)` and advances whichever side reached zero, so the plan
/// has at most `debtors + creditors − 1` transactions. Not guaranteed minimal.
pub fn settle(balances: &[(UserId, Money)]) -> Vec<Transaction> {
    let mut debtors: Vec<(UserId, Money)> = balances
        .iter()
        .filter(|(_, m)| m.is_negative())
        .map(|&(u, m)| (u, m.abs()))
        .collect();
    let mut creditors: Vec<(UserId, Money)> = balances
        .iter()
        .filter(|(_, m)| m.is_positive())
        .copied()
        .collect();

    let mut transactions = Vec::with_capacity(debtors.len() + creditors.len());
    let (mut d, mut c) = (0, 0);

    while d < debtors.len() && c < creditors.len() {
        let (debtor, owes) = debtors[d];
        let (creditor, owed) = creditors[c];
        let amount = owes.min(owed);

        transactions.push(Transaction::new(debtor, creditor, amount));
        debtors[d].1 -= amount;
        creditors[c].1 -= amount;

        if debtors[d].1.is_zero() {
            d += 1;
        }
        if creditors[c].1.is_zero() {
            c += 1;
        }
    }

    transactions
}
