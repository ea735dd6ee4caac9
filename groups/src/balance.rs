//! Voting-credit balances.

use crate::error::GroupError;
use crate::members::{load_user, save_user};
use civitas_store::Tree;
use civitas_types::{Credits, User};

fn check_amount(amount: Credits) -> Result<(), GroupError> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(GroupError::InvalidAmount(amount));
    }
    Ok(())
}

pub fn balance(tree: &Tree, user: &User) -> Result<Credits, GroupError> {
    Ok(load_user(tree, user)?.credits)
}

/// Credit `amount` to `user`. Returns the new balance.
pub fn deposit(tree: &mut Tree, user: &User, amount: Credits) -> Result<Credits, GroupError> {
    check_amount(amount)?;
    let mut record = load_user(tree, user)?;
    if amount > 0.0 {
        record.credits += amount;
        save_user(tree, &record)?;
    }
    Ok(record.credits)
}

/// Debit `amount` from `user`, refusing to overdraw. Returns the new balance.
pub fn withdraw(tree: &mut Tree, user: &User, amount: Credits) -> Result<Credits, GroupError> {
    check_amount(amount)?;
    let mut record = load_user(tree, user)?;
    if record.credits < amount {
        return Err(GroupError::InsufficientCredits {
            user: user.to_string(),
            balance: record.credits,
            requested: amount,
        });
    }
    if amount > 0.0 {
        record.credits -= amount;
        save_user(tree, &record)?;
    }
    Ok(record.credits)
}
