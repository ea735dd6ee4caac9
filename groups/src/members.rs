//! Users and voter groups.

use crate::error::GroupError;
use crate::types::{GroupRecord, UserRecord};
use civitas_store::{layout, Tree};
use civitas_types::{Group, User};

pub(crate) fn load_user(tree: &Tree, user: &User) -> Result<UserRecord, GroupError> {
    tree.try_read_json(&layout::user(user))?
        .ok_or_else(|| GroupError::UserNotFound(user.to_string()))
}

pub(crate) fn save_user(tree: &mut Tree, record: &UserRecord) -> Result<(), GroupError> {
    tree.write_json(&layout::user(&record.user), record)?;
    Ok(())
}

fn load_group(tree: &Tree, group: &Group) -> Result<GroupRecord, GroupError> {
    tree.try_read_json(&layout::group(group))?
        .ok_or_else(|| GroupError::GroupNotFound(group.to_string()))
}

fn save_group(tree: &mut Tree, record: &GroupRecord) -> Result<(), GroupError> {
    tree.write_json(&layout::group(&record.group), record)?;
    Ok(())
}

pub fn get_user(tree: &Tree, user: &User) -> Result<UserRecord, GroupError> {
    load_user(tree, user)
}

pub fn user_exists(tree: &Tree, user: &User) -> bool {
    tree.exists(&layout::user(user))
}

/// Create `group` if it does not exist. Returns whether it was created.
pub fn set_group(tree: &mut Tree, group: &Group) -> Result<bool, GroupError> {
    group.validate()?;
    if tree.exists(&layout::group(group)) {
        return Ok(false);
    }
    save_group(tree, &GroupRecord::new(group.clone()))?;
    tracing::debug!(group = %group, "created group");
    Ok(true)
}

/// Register a new user and add them to the everybody group.
pub fn add_user(tree: &mut Tree, user: &User) -> Result<UserRecord, GroupError> {
    user.validate()?;
    if user_exists(tree, user) {
        return Err(GroupError::UserExists(user.to_string()));
    }
    let record = UserRecord::new(user.clone());
    save_user(tree, &record)?;
    let everybody = Group::everybody();
    set_group(tree, &everybody)?;
    add_member(tree, &everybody, user)?;
    tracing::info!(user = %user, "added user");
    Ok(record)
}

/// Remove a user record and every group membership.
pub fn remove_user(tree: &mut Tree, user: &User) -> Result<(), GroupError> {
    if !tree.remove(&layout::user(user)) {
        return Err(GroupError::UserNotFound(user.to_string()));
    }
    for entry in tree.list_dir(layout::GROUPS_DIR) {
        let Some(name) = layout::record_name(&entry) else {
            continue;
        };
        let mut record = load_group(tree, &Group::new(name))?;
        if record.members.remove(user) {
            save_group(tree, &record)?;
        }
    }
    tracing::info!(user = %user, "removed user");
    Ok(())
}

/// Add an existing user to an existing group. Adding twice is a no-op.
pub fn add_member(tree: &mut Tree, group: &Group, user: &User) -> Result<(), GroupError> {
    if !user_exists(tree, user) {
        return Err(GroupError::UserNotFound(user.to_string()));
    }
    let mut record = load_group(tree, group)?;
    if record.members.insert(user.clone()) {
        save_group(tree, &record)?;
    }
    Ok(())
}

pub fn remove_member(tree: &mut Tree, group: &Group, user: &User) -> Result<(), GroupError> {
    if group.as_str() == Group::EVERYBODY {
        return Err(GroupError::CannotLeaveEverybody);
    }
    let mut record = load_group(tree, group)?;
    if record.members.remove(user) {
        save_group(tree, &record)?;
    }
    Ok(())
}

pub fn is_member(tree: &Tree, group: &Group, user: &User) -> Result<bool, GroupError> {
    Ok(load_group(tree, group)?.members.contains(user))
}

/// Members of `group`, sorted.
pub fn list_members(tree: &Tree, group: &Group) -> Result<Vec<User>, GroupError> {
    Ok(load_group(tree, group)?.members.into_iter().collect())
}

/// All registered users, sorted.
pub fn list_users(tree: &Tree) -> Vec<User> {
    tree.list_dir(layout::USERS_DIR)
        .iter()
        .filter_map(|entry| layout::record_name(entry))
        .map(User::new)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn u(name: &str) -> User {
        User::new(name)
    }

    #[test]
    fn new_users_join_everybody() {
        let mut tree = Tree::new();
        add_user(&mut tree, &u("alice")).unwrap();
        add_user(&mut tree, &u("bob")).unwrap();
        assert!(is_member(&tree, &Group::everybody(), &u("alice")).unwrap());
        assert_eq!(list_users(&tree), vec![u("alice"), u("bob")]);
        assert_eq!(
            list_members(&tree, &Group::everybody()).unwrap(),
            vec![u("alice"), u("bob")]
        );
    }

    #[test]
    fn duplicate_and_invalid_users_are_rejected() {
        let mut tree = Tree::new();
        add_user(&mut tree, &u("alice")).unwrap();
        assert!(matches!(
            add_user(&mut tree, &u("alice")),
            Err(GroupError::UserExists(_))
        ));
        assert!(matches!(
            add_user(&mut tree, &u("../etc")),
            Err(GroupError::Types(_))
        ));
    }

    #[test]
    fn custom_groups() {
        let mut tree = Tree::new();
        add_user(&mut tree, &u("alice")).unwrap();
        let devs = Group::new("devs");
        assert!(set_group(&mut tree, &devs).unwrap());
        assert!(!set_group(&mut tree, &devs).unwrap());
        add_member(&mut tree, &devs, &u("alice")).unwrap();
        add_member(&mut tree, &devs, &u("alice")).unwrap();
        assert_eq!(list_members(&tree, &devs).unwrap().len(), 1);
        assert!(matches!(
            add_member(&mut tree, &devs, &u("carol")),
            Err(GroupError::UserNotFound(_))
        ));
        remove_member(&mut tree, &devs, &u("alice")).unwrap();
        assert!(!is_member(&tree, &devs, &u("alice")).unwrap());
    }

    #[test]
    fn unknown_group_is_an_error() {
        let tree = Tree::new();
        assert!(matches!(
            is_member(&tree, &Group::new("ghosts"), &u("alice")),
            Err(GroupError::GroupNotFound(_))
        ));
    }

    #[test]
    fn removing_a_user_clears_memberships() {
        let mut tree = Tree::new();
        add_user(&mut tree, &u("alice")).unwrap();
        let devs = Group::new("devs");
        set_group(&mut tree, &devs).unwrap();
        add_member(&mut tree, &devs, &u("alice")).unwrap();
        remove_user(&mut tree, &u("alice")).unwrap();
        assert!(!is_member(&tree, &devs, &u("alice")).unwrap());
        assert!(!is_member(&tree, &Group::everybody(), &u("alice")).unwrap());
        assert!(list_users(&tree).is_empty());
    }

    #[test]
    fn everybody_cannot_be_left() {
        let mut tree = Tree::new();
        add_user(&mut tree, &u("alice")).unwrap();
        assert!(matches!(
            remove_member(&mut tree, &Group::everybody(), &u("alice")),
            Err(GroupError::CannotLeaveEverybody)
        ));
    }
}
