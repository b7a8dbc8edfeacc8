//! Request-scoped subsite context.
//!
//! Every scoped read, write-time binding and access check takes a
//! [`TenantContext`] explicitly. Temporary overrides (switching subsite,
//! forcing a subsite, disabling the filter) go through a
//! [`ContextGuard`], which restores the previous state when dropped, so
//! early returns and `?` cannot leak an override into later work.

use std::ops::{Deref, DerefMut};

use crate::error::{SubsitesError, SubsitesResult};
use crate::models::subsite::{Subsite, SubsiteId};
use crate::repository::SubsiteRepository;

/// The subsite selected by the request (session, query string, host).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CurrentSubsite {
    /// Nothing selected; resolves to the main site.
    #[default]
    Unset,
    Selected(SubsiteId),
    /// A value was supplied but could not be understood.
    Indeterminate(String),
}

#[derive(Debug, Clone, Default)]
pub struct TenantContext {
    selected: CurrentSubsite,
    forced: Option<SubsiteId>,
    filter_disabled: bool,
}

impl TenantContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_subsite(id: SubsiteId) -> Self {
        Self {
            selected: CurrentSubsite::Selected(id),
            ..Self::default()
        }
    }

    /// Build a context from a raw request value such as a `SubsiteID`
    /// session entry or query parameter.
    pub fn from_request_value(raw: Option<&str>) -> Self {
        let selected = match raw {
            None => CurrentSubsite::Unset,
            Some(value) => match value.parse::<SubsiteId>() {
                Ok(id) => CurrentSubsite::Selected(id),
                Err(_) => CurrentSubsite::Indeterminate(value.to_string()),
            },
        };
        Self {
            selected,
            ..Self::default()
        }
    }

    /// Forced subsite, else the selected one, else main. `None` when the
    /// request selection is indeterminate and nothing is forced.
    pub fn resolve_subsite_id(&self) -> Option<SubsiteId> {
        if let Some(forced) = self.forced {
            return Some(forced);
        }
        match &self.selected {
            CurrentSubsite::Unset => Some(SubsiteId::MAIN),
            CurrentSubsite::Selected(id) => Some(*id),
            CurrentSubsite::Indeterminate(_) => None,
        }
    }

    pub fn current_subsite_id(&self) -> SubsiteId {
        self.resolve_subsite_id().unwrap_or(SubsiteId::MAIN)
    }

    pub fn selected(&self) -> &CurrentSubsite {
        &self.selected
    }

    pub fn set_current_subsite(&mut self, id: SubsiteId) {
        self.selected = CurrentSubsite::Selected(id);
    }

    pub fn forced_subsite(&self) -> Option<SubsiteId> {
        self.forced
    }

    /// Returns the previous value so callers can put it back.
    pub fn set_forced_subsite(&mut self, forced: Option<SubsiteId>) -> Option<SubsiteId> {
        std::mem::replace(&mut self.forced, forced)
    }

    pub fn is_filter_disabled(&self) -> bool {
        self.filter_disabled
    }

    /// Returns the previous value so callers can put it back.
    pub fn set_filter_disabled(&mut self, disabled: bool) -> bool {
        std::mem::replace(&mut self.filter_disabled, disabled)
    }

    /// Snapshot the context; the snapshot is restored when the guard drops.
    pub fn scope(&mut self) -> ContextGuard<'_> {
        let saved = self.clone();
        ContextGuard { ctx: self, saved }
    }

    pub fn without_filter(&mut self) -> ContextGuard<'_> {
        let mut guard = self.scope();
        guard.filter_disabled = true;
        guard
    }

    pub fn switched_to(&mut self, id: SubsiteId) -> ContextGuard<'_> {
        let mut guard = self.scope();
        guard.selected = CurrentSubsite::Selected(id);
        guard
    }

    pub fn forced_to(&mut self, id: SubsiteId) -> ContextGuard<'_> {
        let mut guard = self.scope();
        guard.forced = Some(id);
        guard
    }

    /// Load the current subsite record. `None` for the main site, for an
    /// indeterminate selection, and for ids with no record.
    pub async fn current_subsite<R: SubsiteRepository>(
        &self,
        subsites: &R,
    ) -> SubsitesResult<Option<Subsite>> {
        let id = match self.resolve_subsite_id() {
            Some(id) if !id.is_main() => id,
            _ => return Ok(None),
        };
        match subsites.get_by_id(id).await {
            Ok(subsite) => Ok(Some(subsite)),
            Err(SubsitesError::NotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

/// Restores the wrapped context to its state at creation on drop.
#[must_use = "the override is undone as soon as the guard is dropped"]
pub struct ContextGuard<'a> {
    ctx: &'a mut TenantContext,
    saved: TenantContext,
}

impl Deref for ContextGuard<'_> {
    type Target = TenantContext;

    fn deref(&self) -> &TenantContext {
        self.ctx
    }
}

impl DerefMut for ContextGuard<'_> {
    fn deref_mut(&mut self) -> &mut TenantContext {
        self.ctx
    }
}

impl Drop for ContextGuard<'_> {
    fn drop(&mut self) {
        *self.ctx = std::mem::take(&mut self.saved);
    }
}
