/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Balance bookkeeping for the storage network's wallets.
//!
//! Every operation checks all of its preconditions before it touches the table, so a failed
//! operation leaves the table exactly as it found it.

use std::collections::BTreeMap;

/// Table of wallet id → balance. Wallets whose balance reaches zero through a transfer are removed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Wallets(BTreeMap<String, u64>);

impl Wallets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open wallet `id` with an initial `balance`.
    pub fn add(&mut self, id: &str, balance: u64) -> Result<(), WalletError> {
        if balance == 0 {
            return Err(WalletError::ZeroBalance { id: id.to_string() });
        }
        if self.0.contains_key(id) {
            return Err(WalletError::DuplicateWallet { id: id.to_string() });
        }
        self.0.insert(id.to_string(), balance);
        Ok(())
    }

    /// Move `amount` from `src` to `dst`. A wallet emptied by the move is deleted.
    pub fn move_balance(&mut self, src: &str, dst: &str, amount: u64) -> Result<(), WalletError> {
        let src_balance = self.balance(src).ok_or_else(|| WalletError::WalletNotFound { id: src.to_string() })?;
        if src_balance < amount {
            return Err(WalletError::InsufficientBalance {
                id: src.to_string(),
                balance: src_balance,
                requested: amount,
            });
        }
        let dst_balance = self.balance(dst).ok_or_else(|| WalletError::WalletNotFound { id: dst.to_string() })?;
        if src == dst {
            return Ok(());
        }
        let new_dst_balance = dst_balance
            .checked_add(amount)
            .ok_or_else(|| WalletError::BalanceOverflow { id: dst.to_string() })?;

        let new_src_balance = src_balance - amount;
        if new_src_balance == 0 {
            self.0.remove(src);
        } else {
            self.0.insert(src.to_string(), new_src_balance);
        }
        self.0.insert(dst.to_string(), new_dst_balance);
        Ok(())
    }

    pub fn balance(&self, id: &str) -> Option<u64> {
        self.0.get(id).copied()
    }

    pub fn snapshot(&self) -> BTreeMap<String, u64> {
        self.0.clone()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WalletError {
    ZeroBalance { id: String },
    DuplicateWallet { id: String },
    WalletNotFound { id: String },
    InsufficientBalance { id: String, balance: u64, requested: u64 },
    BalanceOverflow { id: String },
}
