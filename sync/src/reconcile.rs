//! Transaction reconciler.
//!
//! The wallet service reports each transaction's net `amount` plus a list of
//! transfers, but not which way it went, who the other side was, or whether
//! it has matured. Those are derived here:
//!
//! - **Direction**: `In` when `amount > 0`, otherwise `Out`.
//! - **Counterparty**: the address of the transfer whose amount equals the
//!   target amount, `amount` for incoming and `-(amount + fee)` for outgoing.
//!   When several transfers match, the last one wins and the record is
//!   flagged [`CounterpartyMatch::Ambiguous`].
//! - **Confirmation**: `unlockTime == 0` or
//!   `unlockTime <= blockCount - MATURITY_DEPTH`.

use serde::Serialize;

use walletview_types::{Block, RawTransaction, Timestamp, Transfer, WalletAddress};

/// Blocks a nonzero-unlock (reward) transaction must be buried under before
/// it counts as confirmed.
pub const MATURITY_DEPTH: u64 = 40;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum Direction {
    In,
    Out,
}

impl Direction {
    pub fn of(amount: i64) -> Self {
        if amount > 0 {
            Self::In
        } else {
            Self::Out
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::In => "In",
            Self::Out => "Out",
        }
    }
}

/// Outcome of matching a transaction against its transfer list.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum CounterpartyMatch {
    /// Exactly one transfer carried the target amount.
    Unique(WalletAddress),
    /// Several transfers carried the target amount. `chosen` is the last of
    /// `candidates`; which one is really meant cannot be told from the data.
    Ambiguous {
        chosen: WalletAddress,
        candidates: Vec<WalletAddress>,
    },
    /// No transfer carried the target amount.
    Unmatched,
}

impl CounterpartyMatch {
    /// The resolved address, if any.
    pub fn address(&self) -> Option<&WalletAddress> {
        match self {
            Self::Unique(address) => Some(address),
            Self::Ambiguous { chosen, .. } => Some(chosen),
            Self::Unmatched => None,
        }
    }

    pub fn is_ambiguous(&self) -> bool {
        matches!(self, Self::Ambiguous { .. })
    }
}

/// A raw transaction with its derived attributes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ReconciledTransaction {
    /// Stable identifier used to diff consecutive cycles.
    pub key: String,
    pub direction: Direction,
    pub confirmed: bool,
    pub amount: i64,
    pub fee: u64,
    pub timestamp: Timestamp,
    pub counterparty: CounterpartyMatch,
    pub payment_id: String,
}

/// The transfer amount that identifies the counterparty.
pub fn target_amount(tx: &RawTransaction) -> i128 {
    let amount = i128::from(tx.amount);
    if amount < 0 {
        -(amount + i128::from(tx.fee))
    } else {
        amount
    }
}

/// Scan `transfers` in order for entries carrying `target`. Last match wins.
pub fn resolve_counterparty(transfers: &[Transfer], target: i128) -> CounterpartyMatch {
    let mut candidates: Vec<WalletAddress> = transfers
        .iter()
        .filter(|t| i128::from(t.amount) == target)
        .map(|t| t.address.clone())
        .collect();

    match candidates.len() {
        0 => CounterpartyMatch::Unmatched,
        1 => CounterpartyMatch::Unique(candidates.remove(0)),
        _ => {
            let chosen = candidates[candidates.len() - 1].clone();
            CounterpartyMatch::Ambiguous { chosen, candidates }
        }
    }
}

/// Whether a transaction with `unlock_time` is settled at height `block_count`.
pub fn is_confirmed(unlock_time: u64, block_count: u64) -> bool {
    unlock_time == 0
        || block_count
            .checked_sub(MATURITY_DEPTH)
            .is_some_and(|settled_height| unlock_time <= settled_height)
}

/// Identifier for diffing: the transaction hash, or block and position when
/// the service omits the hash.
fn transaction_key(tx: &RawTransaction, block_position: usize, tx_position: usize) -> String {
    if tx.transaction_hash.is_empty() {
        let block = tx.block_index.unwrap_or(block_position as u64);
        format!("{block}:{tx_position}")
    } else {
        tx.transaction_hash.clone()
    }
}

/// Reconcile every transaction that has transfers.
///
/// Blocks are walked newest-first (the reverse of service order); within a
/// block the original transaction order is kept.
pub fn reconcile(blocks: &[Block], block_count: u64) -> Vec<ReconciledTransaction> {
    let mut out = Vec::new();

    for (block_position, block) in blocks.iter().enumerate().rev() {
        for (tx_position, tx) in block.transactions.iter().enumerate() {
            if tx.transfers.is_empty() {
                continue;
            }

            let key = transaction_key(tx, block_position, tx_position);
            let counterparty = resolve_counterparty(&tx.transfers, target_amount(tx));
            match &counterparty {
                CounterpartyMatch::Unmatched => {
                    tracing::debug!(key = %key, amount = tx.amount, "no transfer matches transaction amount");
                }
                CounterpartyMatch::Ambiguous { candidates, .. } => {
                    tracing::debug!(key = %key, candidates = candidates.len(), "several transfers match transaction amount");
                }
                CounterpartyMatch::Unique(_) => {}
            }

            out.push(ReconciledTransaction {
                key,
                direction: Direction::of(tx.amount),
                confirmed: is_confirmed(tx.unlock_time, block_count),
                amount: tx.amount,
                fee: tx.fee,
                timestamp: tx.timestamp,
                counterparty,
                payment_id: tx.payment_id.clone(),
            });
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tx(hash: &str, amount: i64, fee: u64, transfers: Vec<Transfer>) -> RawTransaction {
        RawTransaction {
            transaction_hash: hash.to_string(),
            amount,
            fee,
            timestamp: Timestamp::new(1_500_000_000),
            transfers,
            ..Default::default()
        }
    }

    fn block(transactions: Vec<RawTransaction>) -> Block {
        Block {
            block_hash: None,
            transactions,
        }
    }

    #[test]
    fn direction_follows_sign() {
        assert_eq!(Direction::of(1), Direction::In);
        assert_eq!(Direction::of(-1), Direction::Out);
        assert_eq!(Direction::of(0), Direction::Out);
    }

    #[test]
    fn outgoing_target_nets_out_fee() {
        let t = tx("h", -150, 10, vec![]);
        assert_eq!(target_amount(&t), 140);
    }

    #[test]
    fn incoming_target_is_amount() {
        let t = tx("h", 250, 10, vec![]);
        assert_eq!(target_amount(&t), 250);
    }

    #[test]
    fn outgoing_resolves_transfer_net_of_fee() {
        let t = tx(
            "h",
            -150,
            10,
            vec![Transfer::new("A", 140), Transfer::new("B", 160)],
        );
        let result = resolve_counterparty(&t.transfers, target_amount(&t));
        assert_eq!(result, CounterpartyMatch::Unique(WalletAddress::new("A")));
    }

    #[test]
    fn tie_break_takes_last_match_and_flags_it() {
        let transfers = vec![
            Transfer::new("A", 160),
            Transfer::new("X", 5),
            Transfer::new("B", 160),
        ];
        let result = resolve_counterparty(&transfers, 160);
        assert_eq!(result.address(), Some(&WalletAddress::new("B")));
        assert!(result.is_ambiguous());
        match result {
            CounterpartyMatch::Ambiguous { candidates, .. } => {
                assert_eq!(candidates, vec![WalletAddress::new("A"), WalletAddress::new("B")]);
            }
            other => panic!("expected ambiguous match, got {other:?}"),
        }
    }

    #[test]
    fn no_match_is_unmatched() {
        let result = resolve_counterparty(&[Transfer::new("A", 1)], 2);
        assert_eq!(result, CounterpartyMatch::Unmatched);
        assert_eq!(result.address(), None);
    }

    #[test]
    fn confirmation_boundaries() {
        assert!(is_confirmed(0, 0));
        assert!(is_confirmed(960, 1000)); // blockCount - 40
        assert!(!is_confirmed(961, 1000)); // blockCount - 39
        assert!(is_confirmed(1, 1000));
    }

    #[test]
    fn short_chain_never_confirms_locked_transactions() {
        assert!(!is_confirmed(1, 39));
        assert!(!is_confirmed(1, 40));
        assert!(is_confirmed(1, 41));
    }

    #[test]
    fn newest_block_first_and_in_block_order_kept() {
        let blocks = vec![
            block(vec![tx("b1", 1, 0, vec![Transfer::new("A", 1)])]),
            block(vec![
                tx("b2a", 2, 0, vec![Transfer::new("A", 2)]),
                tx("b2b", 3, 0, vec![Transfer::new("A", 3)]),
            ]),
            block(vec![tx("b3", 4, 0, vec![Transfer::new("A", 4)])]),
        ];
        let keys: Vec<String> = reconcile(&blocks, 100).into_iter().map(|r| r.key).collect();
        assert_eq!(keys, vec!["b3", "b2a", "b2b", "b1"]);
    }

    #[test]
    fn transactions_without_transfers_are_skipped() {
        let blocks = vec![block(vec![
            tx("kept", 5, 0, vec![Transfer::new("A", 5)]),
            tx("skipped", 5, 0, vec![]),
        ])];
        let reconciled = reconcile(&blocks, 100);
        assert_eq!(reconciled.len(), 1);
        assert_eq!(reconciled[0].key, "kept");
    }

    #[test]
    fn unmatched_transaction_is_kept() {
        let blocks = vec![block(vec![tx("h", 5, 0, vec![Transfer::new("A", 7)])])];
        let reconciled = reconcile(&blocks, 100);
        assert_eq!(reconciled.len(), 1);
        assert_eq!(reconciled[0].counterparty, CounterpartyMatch::Unmatched);
    }

    #[test]
    fn missing_hash_falls_back_to_position_key() {
        let mut first = tx("", 5, 0, vec![Transfer::new("A", 5)]);
        first.block_index = Some(77);
        let second = tx("", 6, 0, vec![Transfer::new("A", 6)]);
        let blocks = vec![block(vec![]), block(vec![first, second])];
        let keys: Vec<String> = reconcile(&blocks, 100).into_iter().map(|r| r.key).collect();
        assert_eq!(keys, vec!["77:0", "1:1"]);
    }

    #[test]
    fn reward_transaction_confirms_after_maturity() {
        let mut reward = tx("r", 500, 0, vec![Transfer::new("A", 500)]);
        reward.unlock_time = 100;
        reward.is_base = true;
        let blocks = vec![block(vec![reward])];
        assert!(!reconcile(&blocks, 139)[0].confirmed);
        assert!(reconcile(&blocks, 140)[0].confirmed);
    }
}
