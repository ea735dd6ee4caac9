//! Free-form user properties.

use crate::error::GroupError;
use crate::members::{load_user, save_user};
use civitas_store::Tree;
use civitas_types::User;

/// Property keys may contain ASCII alphanumerics, `_`, `-` and `.`.
pub fn validate_property_key(key: &str) -> Result<(), GroupError> {
    let ok = !key.is_empty()
        && !key.starts_with('.')
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
    if ok {
        Ok(())
    } else {
        Err(GroupError::InvalidPropertyKey(key.to_string()))
    }
}

/// Set a user property. Replacing a different existing value requires
/// `overwrite`. Returns whether the record changed.
pub fn set_property(
    tree: &mut Tree,
    user: &User,
    key: &str,
    value: serde_json::Value,
    overwrite: bool,
) -> Result<bool, GroupError> {
    validate_property_key(key)?;
    let mut record = load_user(tree, user)?;
    match record.properties.get(key) {
        Some(existing) if *existing == value => return Ok(false),
        Some(_) if !overwrite => {
            return Err(GroupError::PropertyExists {
                user: user.to_string(),
                key: key.to_string(),
            })
        }
        _ => {}
    }
    record.properties.insert(key.to_string(), value);
    save_user(tree, &record)?;
    tracing::debug!(user = %user, key, "set user property");
    Ok(true)
}

pub fn get_property(tree: &Tree, user: &User, key: &str) -> Result<Option<serde_json::Value>, GroupError> {
    validate_property_key(key)?;
    Ok(load_user(tree, user)?.properties.get(key).cloned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::members::add_user;
    use serde_json::json;

    #[test]
    fn keys_are_sanitized() {
        for bad in ["", ".hidden", "a/b", "a b", "ключ"] {
            assert!(validate_property_key(bad).is_err(), "{bad}");
        }
        for good in ["github_handle", "email.work", "x-1"] {
            validate_property_key(good).unwrap();
        }
    }

    #[test]
    fn overwrite_requires_flag() {
        let mut tree = Tree::new();
        let alice = User::new("alice");
        add_user(&mut tree, &alice).unwrap();
        assert!(set_property(&mut tree, &alice, "github", json!("al"), false).unwrap());
        // Same value again is a no-op, not an overwrite.
        assert!(!set_property(&mut tree, &alice, "github", json!("al"), false).unwrap());
        assert!(matches!(
            set_property(&mut tree, &alice, "github", json!("al2"), false),
            Err(GroupError::PropertyExists { .. })
        ));
        assert!(set_property(&mut tree, &alice, "github", json!("al2"), true).unwrap());
        assert_eq!(get_property(&tree, &alice, "github").unwrap(), Some(json!("al2")));
        assert_eq!(get_property(&tree, &alice, "missing").unwrap(), None);
    }

    #[test]
    fn unknown_user() {
        let mut tree = Tree::new();
        assert!(matches!(
            set_property(&mut tree, &User::new("nobody"), "k", json!(1), true),
            Err(GroupError::UserNotFound(_))
        ));
    }
}
