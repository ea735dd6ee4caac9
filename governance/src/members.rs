//! Membership operations.

use crate::error::GovError;
use crate::orchestrator::GovernanceOrchestrator;
use civitas_groups::UserRecord;
use civitas_types::{Credits, User};

impl GovernanceOrchestrator {
    /// Register `user` with an initial credit balance.
    pub fn add_user(&self, user: &User, credits: Credits) -> Result<UserRecord, GovError> {
        self.transact(&format!("add user {user}"), |txn| {
            let mut record = civitas_groups::add_user(txn.tree, user)?;
            record.credits = civitas_groups::deposit(txn.tree, user, credits)?;
            Ok(record)
        })
    }

    /// Deregister `user` and drop their group memberships. Their balance
    /// goes with the record; credits advanced to open ballots are reported
    /// as forfeited when those ballots end.
    pub fn remove_user(&self, user: &User) -> Result<(), GovError> {
        self.transact(&format!("remove user {user}"), |txn| {
            Ok(civitas_groups::remove_user(txn.tree, user)?)
        })
    }

    /// Set a property on `user`. Returns whether anything changed.
    pub fn set_user_property(
        &self,
        user: &User,
        key: &str,
        value: serde_json::Value,
        overwrite: bool,
    ) -> Result<bool, GovError> {
        self.transact(&format!("set property {key} of user {user}"), |txn| {
            Ok(civitas_groups::set_property(txn.tree, user, key, value.clone(), overwrite)?)
        })
    }

    /// Credit `amount` to an existing user.
    pub fn deposit_credits(&self, user: &User, amount: Credits) -> Result<Credits, GovError> {
        self.transact(&format!("deposit {amount} credits to user {user}"), |txn| {
            Ok(civitas_groups::deposit(txn.tree, user, amount)?)
        })
    }

    pub fn show_user(&self, user: &User) -> Result<UserRecord, GovError> {
        self.read(|tree, _| Ok(civitas_groups::get_user(tree, user)?))
    }

    pub fn list_users(&self) -> Result<Vec<User>, GovError> {
        self.read(|tree, _| Ok(civitas_groups::list_users(tree)))
    }
}
