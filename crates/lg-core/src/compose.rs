//! # Gallery Composition
//!
//! Ordering policy and set validation for gallery membership. All pure
//! functions; persistence happens behind `GalleryRepo`.

use std::collections::HashSet;

use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::GalleryImage;

/// One requested membership entry, before order normalization.
#[derive(Debug, Clone)]
pub struct MembershipDraft {
    pub image_id: Uuid,
    pub description: Option<String>,
    /// Explicit position request. Missing means "sort last".
    pub order: Option<i64>,
}

/// Builds the membership rows for a gallery from caller drafts.
///
/// Ordering policy: entries are stably sorted by explicit `order` (entries
/// without one sort last, keeping their relative input order), then every
/// entry is renumbered to its zero-based position. The stored orders are
/// therefore always exactly {0..n-1}.
///
/// Rejects drafts listing the same image twice: an image can appear in a
/// gallery at most once.
pub fn build_memberships(gallery_id: Uuid, drafts: Vec<MembershipDraft>) -> Result<Vec<GalleryImage>> {
    let mut seen = HashSet::with_capacity(drafts.len());
    for draft in &drafts {
        if !seen.insert(draft.image_id) {
            return Err(AppError::ValidationError(format!(
                "image {} listed more than once",
                draft.image_id
            )));
        }
    }

    let mut drafts = drafts;
    // Stable sort: missing orders land after all explicit ones.
    drafts.sort_by_key(|d| d.order.unwrap_or(i64::MAX));

    Ok(drafts
        .into_iter()
        .enumerate()
        .map(|(position, draft)| GalleryImage {
            id: Uuid::now_v7(),
            gallery_id,
            image_id: draft.image_id,
            description: draft.description,
            order: position as i64,
        })
        .collect())
}

/// Checks that a proposed reorder covers the current membership exactly:
/// same ids, no duplicates, no foreign ids, none missing. Partial reorders
/// are rejected so a failed drag-and-drop can never half-apply.
pub fn validate_reorder(current: &[Uuid], proposed: &[Uuid]) -> Result<()> {
    if proposed.len() != current.len() {
        return Err(AppError::ValidationError(format!(
            "reorder must cover all {} memberships, got {}",
            current.len(),
            proposed.len()
        )));
    }
    let current_set: HashSet<Uuid> = current.iter().copied().collect();
    let mut seen = HashSet::with_capacity(proposed.len());
    for id in proposed {
        if !current_set.contains(id) {
            return Err(AppError::ValidationError(format!(
                "membership {id} does not belong to this gallery"
            )));
        }
        if !seen.insert(*id) {
            return Err(AppError::ValidationError(format!(
                "membership {id} listed more than once"
            )));
        }
    }
    Ok(())
}

/// A cover image must be inside the (resulting) membership or absent.
pub fn validate_cover(cover_image_id: Option<Uuid>, member_image_ids: &[Uuid]) -> Result<()> {
    match cover_image_id {
        Some(id) if !member_image_ids.contains(&id) => Err(AppError::Conflict(format!(
            "cover image {id} is not part of the gallery"
        ))),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(image_id: Uuid, order: Option<i64>) -> MembershipDraft {
        MembershipDraft {
            image_id,
            description: None,
            order,
        }
    }

    #[test]
    fn explicit_orders_kept_missing_sorts_last_then_dense() {
        let (a, b, c) = (Uuid::now_v7(), Uuid::now_v7(), Uuid::now_v7());
        // a:2, b:0, c:none  →  b=0, a=1, c=2
        let rows = build_memberships(
            Uuid::now_v7(),
            vec![draft(a, Some(2)), draft(b, Some(0)), draft(c, None)],
        )
        .unwrap();

        let got: Vec<(Uuid, i64)> = rows.iter().map(|m| (m.image_id, m.order)).collect();
        assert_eq!(got, vec![(b, 0), (a, 1), (c, 2)]);
    }

    #[test]
    fn orders_are_always_dense_from_zero() {
        let drafts = vec![
            draft(Uuid::now_v7(), Some(100)),
            draft(Uuid::now_v7(), Some(7)),
            draft(Uuid::now_v7(), None),
            draft(Uuid::now_v7(), Some(7)),
        ];
        let rows = build_memberships(Uuid::now_v7(), drafts).unwrap();
        let orders: Vec<i64> = rows.iter().map(|m| m.order).collect();
        assert_eq!(orders, vec![0, 1, 2, 3]);
    }

    #[test]
    fn ties_and_missing_orders_keep_input_sequence() {
        let (a, b, c) = (Uuid::now_v7(), Uuid::now_v7(), Uuid::now_v7());
        let rows =
            build_memberships(Uuid::now_v7(), vec![draft(a, None), draft(b, None), draft(c, None)])
                .unwrap();
        let got: Vec<Uuid> = rows.iter().map(|m| m.image_id).collect();
        assert_eq!(got, vec![a, b, c]);
    }

    #[test]
    fn duplicate_image_rejected() {
        let a = Uuid::now_v7();
        let err = build_memberships(Uuid::now_v7(), vec![draft(a, None), draft(a, Some(0))])
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[test]
    fn membership_ids_are_fresh_not_image_ids() {
        let a = Uuid::now_v7();
        let rows = build_memberships(Uuid::now_v7(), vec![draft(a, None)]).unwrap();
        assert_ne!(rows[0].id, rows[0].image_id);
    }

    #[test]
    fn reorder_requires_exact_set() {
        let (a, b, c) = (Uuid::now_v7(), Uuid::now_v7(), Uuid::now_v7());
        let current = [a, b];

        assert!(validate_reorder(&current, &[b, a]).is_ok());
        // Partial
        assert!(validate_reorder(&current, &[a]).is_err());
        // Foreign id
        assert!(validate_reorder(&current, &[a, c]).is_err());
        // Duplicate
        assert!(validate_reorder(&current, &[a, a]).is_err());
    }

    #[test]
    fn cover_must_be_in_membership() {
        let (inside, outside) = (Uuid::now_v7(), Uuid::now_v7());
        assert!(validate_cover(None, &[inside]).is_ok());
        assert!(validate_cover(Some(inside), &[inside]).is_ok());
        let err = validate_cover(Some(outside), &[inside]).unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }
}
