//! # Access Control Gate
//!
//! Pure per-request predicates over (caller identity, resource owner,
//! visibility, role). No state, no caching: every request is re-evaluated
//! against an explicit `RequestContext`, never ambient globals.

use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{Gallery, Image, Role};

/// The authenticated caller, threaded into every core operation.
#[derive(Debug, Clone, Copy)]
pub struct RequestContext {
    pub user_id: Uuid,
    pub role: Role,
}

impl RequestContext {
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

/// 401 when there is no session at all.
pub fn require_auth(ctx: Option<&RequestContext>) -> Result<&RequestContext> {
    ctx.ok_or_else(|| AppError::Unauthorized("authentication required".into()))
}

/// A resource may only be mutated or deleted by its owner.
pub fn ensure_owner(ctx: &RequestContext, owner_id: Uuid) -> Result<()> {
    if ctx.user_id == owner_id {
        Ok(())
    } else {
        Err(AppError::Forbidden("not the resource owner".into()))
    }
}

/// Role changes and cross-user profile reads require ADMIN.
pub fn ensure_admin(ctx: &RequestContext) -> Result<()> {
    if ctx.is_admin() {
        Ok(())
    } else {
        Err(AppError::Forbidden("admin role required".into()))
    }
}

/// Profile access: the user themself, or an admin.
pub fn ensure_self_or_admin(ctx: &RequestContext, user_id: Uuid) -> Result<()> {
    if ctx.user_id == user_id || ctx.is_admin() {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "not permitted to access this user".into(),
        ))
    }
}

/// Read gate for galleries. Public galleries are visible to anyone. A
/// private gallery answers 401 to anonymous callers and NotFound to other
/// authenticated users, so its existence never leaks.
pub fn ensure_gallery_visible(ctx: Option<&RequestContext>, gallery: &Gallery) -> Result<()> {
    if gallery.is_public {
        return Ok(());
    }
    match ctx {
        Some(ctx) if ctx.user_id == gallery.owner_id => Ok(()),
        Some(_) => Err(AppError::not_found("Gallery", gallery.id)),
        None => Err(AppError::Unauthorized("authentication required".into())),
    }
}

/// Checks that every requested image id resolved to an image owned by
/// `owner_id`. Run before any gallery write so a failed check leaves zero
/// rows behind.
pub fn ensure_images_owned(owner_id: Uuid, requested: &[Uuid], found: &[Image]) -> Result<()> {
    for id in requested {
        match found.iter().find(|img| img.id == *id) {
            Some(img) if img.owner_id == owner_id => {}
            Some(_) => {
                return Err(AppError::Conflict(format!(
                    "image {id} is not owned by the gallery owner"
                )))
            }
            None => return Err(AppError::Conflict(format!("image {id} does not exist"))),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::GalleryTheme;
    use chrono::Utc;

    fn ctx(role: Role) -> RequestContext {
        RequestContext {
            user_id: Uuid::now_v7(),
            role,
        }
    }

    fn gallery(owner_id: Uuid, is_public: bool) -> Gallery {
        Gallery {
            id: Uuid::now_v7(),
            owner_id,
            title: "t".into(),
            description: None,
            is_public,
            cover_image_id: None,
            theme: GalleryTheme::default(),
            created_at: Utc::now(),
        }
    }

    fn image(owner_id: Uuid) -> Image {
        Image {
            id: Uuid::now_v7(),
            owner_id,
            url: "/static/x".into(),
            title: "x".into(),
            description: None,
            tags: vec![],
            created_at: Utc::now(),
        }
    }

    #[test]
    fn private_gallery_hidden_from_non_owner() {
        let owner = ctx(Role::User);
        let g = gallery(owner.user_id, false);

        assert!(ensure_gallery_visible(Some(&owner), &g).is_ok());
        assert!(matches!(
            ensure_gallery_visible(None, &g),
            Err(AppError::Unauthorized(_))
        ));
        let other = ctx(Role::User);
        assert!(matches!(
            ensure_gallery_visible(Some(&other), &g),
            Err(AppError::NotFound(_, _))
        ));
    }

    #[test]
    fn public_gallery_visible_to_anyone() {
        let g = gallery(Uuid::now_v7(), true);
        assert!(ensure_gallery_visible(None, &g).is_ok());
        assert!(ensure_gallery_visible(Some(&ctx(Role::User)), &g).is_ok());
    }

    #[test]
    fn admin_gate_denies_plain_users() {
        assert!(ensure_admin(&ctx(Role::Admin)).is_ok());
        assert!(matches!(
            ensure_admin(&ctx(Role::User)),
            Err(AppError::Forbidden(_))
        ));
    }

    #[test]
    fn self_or_admin_profile_access() {
        let me = ctx(Role::User);
        assert!(ensure_self_or_admin(&me, me.user_id).is_ok());
        assert!(ensure_self_or_admin(&ctx(Role::Admin), Uuid::now_v7()).is_ok());

        // The denial must not claim the check was admin-only.
        let err = ensure_self_or_admin(&me, Uuid::now_v7()).unwrap_err();
        assert!(
            matches!(&err, AppError::Forbidden(msg) if !msg.contains("admin role required"))
        );
    }

    #[test]
    fn foreign_and_missing_images_are_conflicts() {
        let owner = Uuid::now_v7();
        let mine = image(owner);
        let theirs = image(Uuid::now_v7());

        let found = vec![mine.clone(), theirs.clone()];
        assert!(ensure_images_owned(owner, &[mine.id], &found).is_ok());
        assert!(matches!(
            ensure_images_owned(owner, &[theirs.id], &found),
            Err(AppError::Conflict(_))
        ));
        assert!(matches!(
            ensure_images_owned(owner, &[Uuid::now_v7()], &found),
            Err(AppError::Conflict(_))
        ));
    }
}
