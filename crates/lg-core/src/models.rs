//! # Domain Models
//!
//! These structs represent the core entities of Lumen-Gallery.
//! We use UUID v7 for time-ordered, globally unique identification.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Account role. Admins may change roles and view other users' profiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "USER")]
    User,
    #[serde(rename = "ADMIN")]
    Admin,
}

impl Role {
    pub fn is_admin(self) -> bool {
        matches!(self, Role::Admin)
    }
}

/// A registered account. Owns Images and Galleries; deleting the user
/// cascades to both.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    /// Argon2 PHC string. Never leaves the server.
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// An uploaded picture. `url` is an opaque reference resolved by the
/// MediaStore; the bytes themselves never pass through the domain layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub url: String,
    pub title: String,
    pub description: Option<String>,
    /// Tag names, globally unique, created on first use.
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// A globally shared label. Tags have no owner and are never deleted;
/// orphans are tolerated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tag {
    pub id: Uuid,
    pub name: String,
}

/// Per-gallery theming attributes. All independent, optional, freeform
/// strings — no cross-field rules are enforced at this layer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GalleryTheme {
    pub theme_color: Option<String>,
    pub background_color: Option<String>,
    pub accent_color: Option<String>,
    pub font_family: Option<String>,
    pub display_mode: Option<String>,
    pub layout_type: Option<String>,
}

/// A named, ordered collection of Images owned by one User.
///
/// `cover_image_id` is a weak reference: it must always point at an Image
/// currently in the gallery's membership, or be null.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Gallery {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub is_public: bool,
    pub cover_image_id: Option<Uuid>,
    #[serde(flatten)]
    pub theme: GalleryTheme,
    pub created_at: DateTime<Utc>,
}

/// The membership join row: one Image's inclusion in one Gallery.
///
/// Its `id` lives in a different id space than the Image's own id, and the
/// two must never be conflated — removal and reordering key on this id,
/// never on `image_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GalleryImage {
    pub id: Uuid,
    pub gallery_id: Uuid,
    pub image_id: Uuid,
    /// Caption specific to this gallery, distinct from the Image's own
    /// description.
    pub description: Option<String>,
    /// Zero-based display position. Always dense: {0..n-1} per gallery.
    pub order: i64,
}

/// A membership with its Image resolved, as returned by gallery reads.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GalleryImageDetail {
    /// The membership id, not the image id.
    pub id: Uuid,
    pub image: Image,
    pub description: Option<String>,
    pub order: i64,
}

/// A gallery with its full, order-sorted membership.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GalleryDetail {
    #[serde(flatten)]
    pub gallery: Gallery,
    pub images: Vec<GalleryImageDetail>,
}
