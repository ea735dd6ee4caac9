//! Community membership stored in the community tree.
//!
//! Users and voter groups are plain JSON records under `member/`. Every
//! registered user belongs to the `everybody` group, which is the default
//! participant group of a ballot. User records also carry free-form
//! properties and the user's voting-credit balance.

pub mod balance;
pub mod error;
pub mod members;
pub mod properties;
pub mod types;

pub use balance::{balance, deposit, withdraw};
pub use error::GroupError;
pub use members::{
    add_member, add_user, get_user, is_member, list_members, list_users, remove_member, remove_user,
    set_group, user_exists,
};
pub use properties::{get_property, set_property, validate_property_key};
pub use types::{GroupRecord, UserRecord};
