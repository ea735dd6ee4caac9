//! Community initialisation.

use crate::error::GovError;
use crate::orchestrator::GovernanceOrchestrator;
use civitas_crypto::{IdentityProvider, PrivateCredentials, PublicCredentials};
use civitas_store::{layout, Cloned};
use civitas_types::Group;
use std::sync::Arc;

impl GovernanceOrchestrator {
    /// Publish the community's credentials and create the `everybody` group.
    ///
    /// Private credentials go to the private branch first; that write claims
    /// the community for this identity. Public credentials and the
    /// `everybody` group then go to the community branch. If the second step
    /// fails, running `boot` again with the same identity resumes it.
    ///
    /// Fails with [`GovError::Precondition`] before writing anything if the
    /// community branch is already booted or the private branch holds another
    /// identity's credentials.
    pub fn boot(&self, identity: &dyn IdentityProvider) -> Result<PublicCredentials, GovError> {
        let private = identity.credentials()?;
        private.verify()?;
        let public = private.public_credentials.clone();

        let community = self.config().community_branch.clone();
        let private_branch = self.config().private_branch.clone();
        self.ensure_absent(&community, layout::PUBLIC_CREDENTIALS)?;
        let resumed = self.check_private_claim(&private_branch, &public)?;
        if resumed {
            tracing::warn!(id = %public.id, branch = %private_branch, "resuming interrupted boot");
        }

        self.transact_on(&private_branch, "initialize private credentials", |txn| {
            match txn.tree.try_read_json::<PrivateCredentials>(layout::PRIVATE_CREDENTIALS)? {
                Some(existing) if existing.public_credentials == public => {}
                Some(_) => return Err(already_booted(&private_branch, layout::PRIVATE_CREDENTIALS)),
                None => txn.tree.write_json(layout::PRIVATE_CREDENTIALS, &private)?,
            }
            Ok(public.clone())
        })?;

        let public = self.transact_on(&community, "initialize community", |txn| {
            if txn.tree.exists(layout::PUBLIC_CREDENTIALS) {
                return Err(already_booted(&community, layout::PUBLIC_CREDENTIALS));
            }
            txn.tree.write_json(layout::PUBLIC_CREDENTIALS, &public)?;
            civitas_groups::set_group(txn.tree, &Group::everybody())?;
            Ok(public.clone())
        })?;
        tracing::info!(id = %public.id, branch = %community, "community booted");
        Ok(public)
    }

    fn ensure_absent(&self, branch: &str, path: &str) -> Result<(), GovError> {
        let cloned = Cloned::clone_from(Arc::clone(self.remote()), branch)?;
        if cloned.tree().exists(path) {
            return Err(already_booted(branch, path));
        }
        Ok(())
    }

    /// Whether the private branch already holds `public`'s credentials.
    /// Credentials of a different identity are a precondition failure.
    fn check_private_claim(&self, branch: &str, public: &PublicCredentials) -> Result<bool, GovError> {
        let cloned = Cloned::clone_from(Arc::clone(self.remote()), branch)?;
        match cloned
            .tree()
            .try_read_json::<PrivateCredentials>(layout::PRIVATE_CREDENTIALS)?
        {
            Some(existing) if existing.public_credentials == *public => Ok(true),
            Some(_) => Err(already_booted(branch, layout::PRIVATE_CREDENTIALS)),
            None => Ok(false),
        }
    }
}

fn already_booted(branch: &str, path: &str) -> GovError {
    GovError::Precondition(format!("{path} already exists on branch {branch}"))
}
