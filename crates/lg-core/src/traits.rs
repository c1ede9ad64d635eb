//! # Core Traits (Ports)
//!
//! Any plugin must implement these traits to be used by the binary.

use async_trait::async_trait;
use serde::Serialize;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{Gallery, GalleryDetail, GalleryImage, Image, Role, User};

/// Sort order for image listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ImageSort {
    #[default]
    Newest,
    Oldest,
    Title,
}

/// Filter/pagination options for `list_images`.
#[derive(Debug, Clone)]
pub struct ImageQuery {
    pub tag: Option<String>,
    pub search: Option<String>,
    pub sort: ImageSort,
    /// 1-based page number.
    pub page: u32,
    pub page_size: u32,
}

impl Default for ImageQuery {
    fn default() -> Self {
        Self {
            tag: None,
            search: None,
            sort: ImageSort::default(),
            page: 1,
            page_size: 20,
        }
    }
}

/// One page of a listing, with the total count for pagination controls.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: u32,
    pub page_size: u32,
}

/// Data persistence contract for users, images, galleries, and memberships.
///
/// Every multi-row mutation (gallery create with members, membership
/// replace, remove-with-cover-clear, reorder, cascade deletes) must be
/// all-or-nothing: implementations wrap them in a transaction.
#[async_trait]
pub trait GalleryRepo: Send + Sync {
    // User operations
    async fn create_user(&self, user: User) -> Result<()>;
    async fn get_user(&self, id: Uuid) -> Result<Option<User>>;
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>>;
    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>>;
    async fn set_user_role(&self, id: Uuid, role: Role) -> Result<bool>;
    /// Deletes the user and cascades to owned images and galleries.
    async fn delete_user(&self, id: Uuid) -> Result<bool>;

    // Image operations
    /// Creates the image row and upserts its tags (created on first use).
    async fn create_image(&self, image: Image) -> Result<()>;
    async fn get_image(&self, id: Uuid) -> Result<Option<Image>>;
    async fn get_images_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Image>>;
    async fn list_images(&self, owner_id: Uuid, query: &ImageQuery) -> Result<Page<Image>>;
    /// Rewrites title/description and the tag set.
    async fn update_image(&self, image: Image) -> Result<()>;
    /// Deletes the image, its memberships, and nulls any cover reference.
    async fn delete_image(&self, id: Uuid) -> Result<bool>;

    // Gallery operations
    async fn create_gallery(&self, gallery: Gallery, memberships: Vec<GalleryImage>) -> Result<()>;
    async fn get_gallery(&self, id: Uuid) -> Result<Option<Gallery>>;
    async fn get_gallery_detail(&self, id: Uuid) -> Result<Option<GalleryDetail>>;
    /// Galleries visible to `viewer`: public ones, plus the viewer's own
    /// private ones. Newest first.
    async fn list_galleries(&self, viewer: Option<Uuid>) -> Result<Vec<Gallery>>;
    /// Updates scalar fields; when `memberships` is Some, replaces the whole
    /// membership set (delete-all, recreate) in the same transaction.
    async fn update_gallery(
        &self,
        gallery: Gallery,
        memberships: Option<Vec<GalleryImage>>,
    ) -> Result<()>;
    async fn delete_gallery(&self, id: Uuid) -> Result<bool>;

    // Membership operations
    async fn list_memberships(&self, gallery_id: Uuid) -> Result<Vec<GalleryImage>>;
    /// Removes one membership, keyed by its own id (never the image id).
    /// Clears the gallery's cover in the same transaction when the removed
    /// membership's image was the cover. NotFound if the id is unknown;
    /// ValidationError if it belongs to a different gallery.
    async fn remove_membership(&self, gallery_id: Uuid, membership_id: Uuid) -> Result<()>;
    /// Assigns order 0..n-1 by position in `ordered_ids`. ValidationError
    /// unless the ids exactly match the current membership set.
    async fn reorder_memberships(&self, gallery_id: Uuid, ordered_ids: &[Uuid]) -> Result<()>;

    /// Wipes all rows. Only reachable behind the test-mode flag.
    async fn wipe_all(&self) -> Result<()>;
}

/// Media storage contract for handling uploads.
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Saves raw bytes and returns a media id for URL resolution.
    async fn save_upload(&self, data: Vec<u8>, content_type: &str) -> Result<String>;
    /// Public URL of the original media.
    fn public_url(&self, media_id: &str) -> String;
    /// Public URL of the thumbnail.
    fn thumbnail_url(&self, media_id: &str) -> String;
}

/// Identity contract: password hashing and session tokens.
pub trait AuthProvider: Send + Sync {
    fn hash_password(&self, password: &str) -> Result<String>;
    fn verify_password(&self, password: &str, hash: &str) -> bool;
    /// Issues a signed bearer token for the user.
    fn issue_token(&self, user_id: Uuid) -> String;
    /// Returns the user id when the token is authentic and unexpired.
    fn verify_token(&self, token: &str) -> Option<Uuid>;
}
