//! Who may see and change what.
//!
//! Catalog data is public to read and staff-only to change. Reservations
//! belong to their owner (staff can see them too). A profile is private to
//! its user.

use crate::context::RequestContext;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Catalog,
    Reservation { owner_id: i64 },
    Profile { user_id: i64 },
}

pub fn can_view(user: Option<&RequestContext>, resource: Resource) -> bool {
    match (resource, user) {
        (Resource::Catalog, _) => true,
        (_, None) => false,
        (Resource::Reservation { owner_id }, Some(ctx)) => ctx.is_staff || ctx.user_id == owner_id,
        (Resource::Profile { user_id }, Some(ctx)) => ctx.user_id == user_id,
    }
}

pub fn can_modify(user: Option<&RequestContext>, resource: Resource) -> bool {
    match (resource, user) {
        (_, None) => false,
        (Resource::Catalog, Some(ctx)) => ctx.is_staff,
        (Resource::Reservation { owner_id }, Some(ctx)) => ctx.is_staff || ctx.user_id == owner_id,
        (Resource::Profile { user_id }, Some(ctx)) => ctx.user_id == user_id,
    }
}

/// Unauthorized for anonymous callers, Forbidden for everyone else.
pub fn ensure_can_modify(user: Option<&RequestContext>, resource: Resource) -> Result<()> {
    if can_modify(user, resource) {
        return Ok(());
    }
    match user {
        None => Err(Error::unauthorized()),
        Some(_) => Err(Error::forbidden()),
    }
}
