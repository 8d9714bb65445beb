//! # Share Link Persistence
//!
//! The repository owns the one operation that must be linearized: the
//! access-count increment. [`ShareLinkRepository::increment_access_if_below`]
//! is a single atomic grant-or-ceiling step, so concurrent validations can
//! never push `access_count` past `max_access`. The in-memory
//! implementation linearizes under one write lock; a SQL store would use a
//! conditional UPDATE.

use std::sync::{Arc, RwLock};
use uuid::Uuid;

use super::crypto::constant_time_str_eq;
use super::errors::{DenyReason, ShareError, ShareResult};
use super::link::ShareLink;

/// Result of the atomic increment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessGrant {
    /// Counter incremented; access granted
    Granted,
    /// Counter already at the ceiling; nothing changed
    CeilingReached,
}

/// Share link persistence seam.
pub trait ShareLinkRepository: Send + Sync {
    /// Insert a new link. A token collision is a hard error, never
    /// silently ignored.
    fn insert(&self, link: &ShareLink) -> ShareResult<()>;

    /// Fetch by token; None if absent.
    fn find_by_token(&self, token: &str) -> ShareResult<Option<ShareLink>>;

    /// Atomically increment `access_count` unless it has reached the
    /// ceiling. `ceiling` is the link's `max_access`.
    fn increment_access_if_below(
        &self,
        token: &str,
        ceiling: Option<u64>,
    ) -> ShareResult<AccessGrant>;

    /// Add to the lifetime upload accounting of an upload link.
    fn add_uploaded(&self, token: &str, size: u64) -> ShareResult<ShareLink>;

    /// Flip the active flag.
    fn set_active(&self, token: &str, active: bool) -> ShareResult<()>;

    /// Remove a link entirely.
    fn delete(&self, token: &str) -> ShareResult<()>;

    /// Every link created by one user.
    fn list_by_creator(&self, created_by: Uuid) -> ShareResult<Vec<ShareLink>>;
}

// Lets a repository be shared between a service and other consumers
// (adapters, tests) without changing the service's ownership model.
impl<T: ShareLinkRepository + ?Sized> ShareLinkRepository for Arc<T> {
    fn insert(&self, link: &ShareLink) -> ShareResult<()> {
        (**self).insert(link)
    }

    fn find_by_token(&self, token: &str) -> ShareResult<Option<ShareLink>> {
        (**self).find_by_token(token)
    }

    fn increment_access_if_below(
        &self,
        token: &str,
        ceiling: Option<u64>,
    ) -> ShareResult<AccessGrant> {
        (**self).increment_access_if_below(token, ceiling)
    }

    fn add_uploaded(&self, token: &str, size: u64) -> ShareResult<ShareLink> {
        (**self).add_uploaded(token, size)
    }

    fn set_active(&self, token: &str, active: bool) -> ShareResult<()> {
        (**self).set_active(token, active)
    }

    fn delete(&self, token: &str) -> ShareResult<()> {
        (**self).delete(token)
    }

    fn list_by_creator(&self, created_by: Uuid) -> ShareResult<Vec<ShareLink>> {
        (**self).list_by_creator(created_by)
    }
}

/// In-memory link table.
#[derive(Debug, Default)]
pub struct InMemoryShareLinkRepository {
    links: RwLock<Vec<ShareLink>>,
}

impl InMemoryShareLinkRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ShareLinkRepository for InMemoryShareLinkRepository {
    fn insert(&self, link: &ShareLink) -> ShareResult<()> {
        let mut links = self
            .links
            .write()
            .map_err(|_| ShareError::Storage("Lock poisoned".into()))?;

        if links.iter().any(|l| l.token == link.token) {
            return Err(ShareError::TokenCollision);
        }
        links.push(link.clone());
        Ok(())
    }

    fn find_by_token(&self, token: &str) -> ShareResult<Option<ShareLink>> {
        let links = self
            .links
            .read()
            .map_err(|_| ShareError::Storage("Lock poisoned".into()))?;
        Ok(links
            .iter()
            .find(|l| constant_time_str_eq(&l.token, token))
            .cloned())
    }

    fn increment_access_if_below(
        &self,
        token: &str,
        ceiling: Option<u64>,
    ) -> ShareResult<AccessGrant> {
        let mut links = self
            .links
            .write()
            .map_err(|_| ShareError::Storage("Lock poisoned".into()))?;

        let link = links
            .iter_mut()
            .find(|l| constant_time_str_eq(&l.token, token))
            .ok_or(ShareError::Denied(DenyReason::NotFound))?;

        if matches!(ceiling, Some(max) if link.access_count >= max) {
            return Ok(AccessGrant::CeilingReached);
        }
        link.access_count += 1;
        Ok(AccessGrant::Granted)
    }

    fn add_uploaded(&self, token: &str, size: u64) -> ShareResult<ShareLink> {
        let mut links = self
            .links
            .write()
            .map_err(|_| ShareError::Storage("Lock poisoned".into()))?;

        let link = links
            .iter_mut()
            .find(|l| constant_time_str_eq(&l.token, token))
            .ok_or(ShareError::Denied(DenyReason::NotFound))?;

        link.total_uploaded_size = link.total_uploaded_size.saturating_add(size);
        link.upload_count += 1;
        Ok(link.clone())
    }

    fn set_active(&self, token: &str, active: bool) -> ShareResult<()> {
        let mut links = self
            .links
            .write()
            .map_err(|_| ShareError::Storage("Lock poisoned".into()))?;

        let link = links
            .iter_mut()
            .find(|l| constant_time_str_eq(&l.token, token))
            .ok_or(ShareError::Denied(DenyReason::NotFound))?;
        link.is_active = active;
        Ok(())
    }

    fn delete(&self, token: &str) -> ShareResult<()> {
        let mut links = self
            .links
            .write()
            .map_err(|_| ShareError::Storage("Lock poisoned".into()))?;
        links.retain(|l| !constant_time_str_eq(&l.token, token));
        Ok(())
    }

    fn list_by_creator(&self, created_by: Uuid) -> ShareResult<Vec<ShareLink>> {
        let links = self
            .links
            .read()
            .map_err(|_| ShareError::Storage("Lock poisoned".into()))?;
        Ok(links
            .iter()
            .filter(|l| l.created_by == created_by)
            .cloned()
            .collect())
    }
}
