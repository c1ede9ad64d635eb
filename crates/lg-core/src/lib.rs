//! lumen-gallery/crates/lg-core/src/lib.rs
//!
//! The central domain logic and interface definitions for Lumen-Gallery.

pub mod access;
pub mod compose;
pub mod error;
pub mod models;
pub mod traits;

// Re-exporting for easier access in other crates
pub use error::*;
pub use models::*;
pub use traits::*;

#[cfg(test)]
mod tests {
    use super::models::*;
    use uuid::Uuid;

    #[test]
    fn test_membership_row_v7() {
        let id = Uuid::now_v7();
        let row = GalleryImage {
            id,
            gallery_id: Uuid::now_v7(),
            image_id: Uuid::now_v7(),
            description: Some("holiday".to_string()),
            order: 0,
        };
        assert_eq!(row.id, id);
        assert_ne!(row.id, row.image_id);
    }

    #[test]
    fn test_role_wire_format() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"ADMIN\"");
        assert_eq!(serde_json::to_string(&Role::User).unwrap(), "\"USER\"");
    }
}
