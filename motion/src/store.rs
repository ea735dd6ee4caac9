//! Motion persistence and reference-graph maintenance.

use crate::error::MotionError;
use crate::motion::{Motion, MotionMeta, NewMotion};
use crate::refs::Ref;
use civitas_store::{layout, Tree};
use civitas_types::{MotionId, Timestamp};
use std::cmp::Ordering;

/// Motion operations against a cloned tree.
#[derive(Clone, Copy, Debug, Default)]
pub struct MotionStore;

impl MotionStore {
    pub fn exists(&self, tree: &Tree, id: &MotionId) -> bool {
        tree.exists(&layout::motion(id))
    }

    pub fn get(&self, tree: &Tree, id: &MotionId) -> Result<Motion, MotionError> {
        let mut motion: Motion = tree
            .try_read_json(&layout::motion(id))?
            .ok_or_else(|| MotionError::NotFound(id.to_string()))?;
        motion.ref_to.normalize();
        motion.ref_by.normalize();
        Ok(motion)
    }

    pub fn put(&self, tree: &mut Tree, motion: &Motion) -> Result<(), MotionError> {
        motion.id.validate()?;
        tree.write_json(&layout::motion(&motion.id), motion)?;
        Ok(())
    }

    /// Create a motion. Ids are never reused.
    pub fn open_motion(&self, tree: &mut Tree, spec: NewMotion, now: Timestamp) -> Result<Motion, MotionError> {
        spec.id.validate()?;
        spec.policy.validate()?;
        if let Some(author) = &spec.author {
            author.validate()?;
        }
        if self.exists(tree, &spec.id) {
            return Err(MotionError::AlreadyExists(spec.id.to_string()));
        }
        let motion = Motion::new(spec, now);
        self.put(tree, &motion)?;
        tracing::info!(motion = %motion.id, kind = %motion.motion_type, policy = %motion.policy, "opened motion");
        Ok(motion)
    }

    /// Every motion, sorted by id.
    pub fn list(&self, tree: &Tree) -> Result<Vec<Motion>, MotionError> {
        let mut motions = Vec::new();
        for entry in tree.list_dir(layout::MOTION_DIR) {
            if let Some(name) = layout::record_name(&entry) {
                motions.push(self.get(tree, &MotionId::new(name))?);
            }
        }
        sort_by_id(&mut motions);
        Ok(motions)
    }

    /// Motions that are neither closed nor cancelled, sorted by id.
    pub fn list_open(&self, tree: &Tree) -> Result<Vec<Motion>, MotionError> {
        let mut motions = self.list(tree)?;
        motions.retain(Motion::is_open);
        Ok(motions)
    }

    pub fn update_meta(&self, tree: &mut Tree, id: &MotionId, meta: MotionMeta) -> Result<Motion, MotionError> {
        let mut motion = self.get(tree, id)?;
        motion.apply_meta(meta);
        self.put(tree, &motion)?;
        Ok(motion)
    }

    pub fn set_attention(&self, tree: &mut Tree, id: &MotionId, attention: f64) -> Result<Motion, MotionError> {
        if !attention.is_finite() {
            return Err(MotionError::InvalidAttention(attention));
        }
        let mut motion = self.get(tree, id)?;
        motion.score.attention = attention;
        self.put(tree, &motion)?;
        Ok(motion)
    }

    /// Load, mutate and save a motion in one step.
    pub fn update<F>(&self, tree: &mut Tree, id: &MotionId, f: F) -> Result<Motion, MotionError>
    where
        F: FnOnce(&mut Motion) -> Result<(), MotionError>,
    {
        let mut motion = self.get(tree, id)?;
        f(&mut motion)?;
        self.put(tree, &motion)?;
        Ok(motion)
    }

    fn endpoints(&self, tree: &Tree, r: &Ref) -> Result<(Motion, Motion), MotionError> {
        if r.from == r.to {
            return Err(MotionError::SelfReference(r.from.to_string()));
        }
        Ok((self.get(tree, &r.from)?, self.get(tree, &r.to)?))
    }

    /// Add `r` to the source's `ref_to` and mirror it into the target's
    /// `ref_by`. Adding an existing edge changes nothing. Returns whether
    /// either side changed.
    pub fn add_ref(&self, tree: &mut Tree, r: &Ref) -> Result<bool, MotionError> {
        let (mut from, mut to) = self.endpoints(tree, r)?;
        let added_to = from.ref_to.insert(r.clone());
        let added_by = to.ref_by.insert(r.clone());
        if added_to {
            self.put(tree, &from)?;
        }
        if added_by {
            self.put(tree, &to)?;
        }
        if added_to || added_by {
            tracing::debug!(reference = %r, "added reference");
        }
        Ok(added_to || added_by)
    }

    /// Remove `r` from both ends. Returns whether either side changed.
    pub fn remove_ref(&self, tree: &mut Tree, r: &Ref) -> Result<bool, MotionError> {
        let (mut from, mut to) = self.endpoints(tree, r)?;
        let removed_to = from.ref_to.remove(r);
        let removed_by = to.ref_by.remove(r);
        if removed_to {
            self.put(tree, &from)?;
        }
        if removed_by {
            self.put(tree, &to)?;
        }
        if removed_to || removed_by {
            tracing::debug!(reference = %r, "removed reference");
        }
        Ok(removed_to || removed_by)
    }
}

/// Ascending attention; equal attention falls back to id order.
pub fn ranked_by_attention(motions: &mut [Motion]) {
    motions.sort_by(|a, b| {
        a.score
            .attention
            .partial_cmp(&b.score.attention)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.id.cmp(&b.id))
    });
}

pub fn sort_by_id(motions: &mut [Motion]) {
    motions.sort_by(|a, b| a.id.cmp(&b.id));
}
