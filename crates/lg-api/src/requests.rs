//! Request payloads and their validation.
//!
//! One explicit struct per mutating endpoint, each with a `validate` method
//! returning a typed value or a `ValidationError`. Nothing unvalidated
//! crosses into the handlers.

use lg_core::compose::MembershipDraft;
use lg_core::error::{AppError, Result};
use lg_core::models::{Gallery, GalleryTheme};
use lg_core::traits::{ImageQuery, ImageSort};
use serde::{Deserialize, Deserializer};
use uuid::Uuid;

/// Distinguishes "field absent" (outer None) from "field explicitly null"
/// (Some(None)) in PATCH bodies.
fn double_option<'de, T, D>(deserializer: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

/// Trims, drops empties, and dedupes while keeping first-seen order.
pub fn normalize_tags(raw: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(raw.len());
    for tag in raw {
        let tag = tag.trim().to_string();
        if tag.is_empty() || out.contains(&tag) {
            continue;
        }
        out.push(tag);
    }
    out
}

fn require_title(title: &str) -> Result<String> {
    let title = title.trim();
    if title.is_empty() {
        return Err(AppError::ValidationError("title must not be empty".into()));
    }
    Ok(title.to_string())
}

// ── Auth ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub username: String,
    pub password: String,
}

impl RegisterRequest {
    pub fn validate(self) -> Result<Self> {
        let email = self.email.trim().to_string();
        if !email.contains('@') || email.len() < 3 {
            return Err(AppError::ValidationError("invalid email address".into()));
        }
        let username = self.username.trim().to_string();
        if username.len() < 3 || username.len() > 32 {
            return Err(AppError::ValidationError(
                "username must be 3-32 characters".into(),
            ));
        }
        if self.password.len() < 8 {
            return Err(AppError::ValidationError(
                "password must be at least 8 characters".into(),
            ));
        }
        Ok(Self {
            email,
            username,
            password: self.password,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

// ── Galleries ────────────────────────────────────────────────────────────

/// One entry of a gallery's `images` array. `id` is the *image* id here;
/// membership ids are minted server-side.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MembershipEntry {
    pub id: Uuid,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub order: Option<i64>,
}

impl MembershipEntry {
    fn into_draft(self) -> MembershipDraft {
        MembershipDraft {
            image_id: self.id,
            description: self.description.filter(|d| !d.trim().is_empty()),
            order: self.order,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGalleryRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default)]
    pub cover_image_id: Option<Uuid>,
    #[serde(flatten)]
    pub theme: GalleryTheme,
    #[serde(default)]
    pub images: Vec<MembershipEntry>,
}

pub struct ValidatedCreateGallery {
    pub title: String,
    pub description: Option<String>,
    pub is_public: bool,
    pub cover_image_id: Option<Uuid>,
    pub theme: GalleryTheme,
    pub drafts: Vec<MembershipDraft>,
}

impl CreateGalleryRequest {
    pub fn validate(self) -> Result<ValidatedCreateGallery> {
        Ok(ValidatedCreateGallery {
            title: require_title(&self.title)?,
            description: self.description.filter(|d| !d.trim().is_empty()),
            is_public: self.is_public,
            cover_image_id: self.cover_image_id,
            theme: self.theme,
            drafts: self.images.into_iter().map(MembershipEntry::into_draft).collect(),
        })
    }
}

/// PATCH body for a gallery. Absent fields are left untouched; explicit
/// nulls clear nullable fields.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateGalleryRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    #[serde(default)]
    pub is_public: Option<bool>,
    #[serde(default, deserialize_with = "double_option")]
    pub cover_image_id: Option<Option<Uuid>>,
    #[serde(default, deserialize_with = "double_option")]
    pub theme_color: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub background_color: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub accent_color: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub font_family: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub display_mode: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub layout_type: Option<Option<String>>,
    /// When present, replaces the whole membership set.
    #[serde(default)]
    pub images: Option<Vec<MembershipEntry>>,
}

pub struct ValidatedUpdateGallery {
    title: Option<String>,
    description: Option<Option<String>>,
    is_public: Option<bool>,
    cover_image_id: Option<Option<Uuid>>,
    theme_color: Option<Option<String>>,
    background_color: Option<Option<String>>,
    accent_color: Option<Option<String>>,
    font_family: Option<Option<String>>,
    display_mode: Option<Option<String>>,
    layout_type: Option<Option<String>>,
    pub images: Option<Vec<MembershipDraft>>,
}

impl UpdateGalleryRequest {
    pub fn validate(self) -> Result<ValidatedUpdateGallery> {
        let title = match self.title {
            Some(t) => Some(require_title(&t)?),
            None => None,
        };
        Ok(ValidatedUpdateGallery {
            title,
            description: self.description,
            is_public: self.is_public,
            cover_image_id: self.cover_image_id,
            theme_color: self.theme_color,
            background_color: self.background_color,
            accent_color: self.accent_color,
            font_family: self.font_family,
            display_mode: self.display_mode,
            layout_type: self.layout_type,
            images: self
                .images
                .map(|entries| entries.into_iter().map(MembershipEntry::into_draft).collect()),
        })
    }
}

impl ValidatedUpdateGallery {
    /// Applies the scalar part of the patch, returning the membership
    /// replacement (if any) for the caller to sequence and persist.
    pub fn apply(self, gallery: &mut Gallery) -> Option<Vec<MembershipDraft>> {
        if let Some(title) = self.title {
            gallery.title = title;
        }
        if let Some(description) = self.description {
            gallery.description = description;
        }
        if let Some(is_public) = self.is_public {
            gallery.is_public = is_public;
        }
        if let Some(cover) = self.cover_image_id {
            gallery.cover_image_id = cover;
        }
        if let Some(v) = self.theme_color {
            gallery.theme.theme_color = v;
        }
        if let Some(v) = self.background_color {
            gallery.theme.background_color = v;
        }
        if let Some(v) = self.accent_color {
            gallery.theme.accent_color = v;
        }
        if let Some(v) = self.font_family {
            gallery.theme.font_family = v;
        }
        if let Some(v) = self.display_mode {
            gallery.theme.display_mode = v;
        }
        if let Some(v) = self.layout_type {
            gallery.theme.layout_type = v;
        }
        self.images
    }
}

/// PATCH /galleries/{id}/images/order — `id` here is the *membership* id.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReorderEntry {
    pub id: Uuid,
    pub order: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReorderRequest {
    pub images: Vec<ReorderEntry>,
}

impl ReorderRequest {
    /// Produces the membership id sequence: entries sorted by their
    /// requested order, which must be non-negative.
    pub fn validate(self) -> Result<Vec<Uuid>> {
        if self.images.is_empty() {
            return Err(AppError::ValidationError(
                "images must not be empty".into(),
            ));
        }
        for entry in &self.images {
            if entry.order < 0 {
                return Err(AppError::ValidationError(format!(
                    "order must be >= 0, got {}",
                    entry.order
                )));
            }
        }
        let mut entries = self.images;
        entries.sort_by_key(|e| e.order);
        Ok(entries.into_iter().map(|e| e.id).collect())
    }
}

// ── Images ───────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateImageRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

impl UpdateImageRequest {
    pub fn validate(self) -> Result<Self> {
        let title = match self.title {
            Some(t) => Some(require_title(&t)?),
            None => None,
        };
        Ok(Self {
            title,
            description: self.description,
            tags: self.tags.map(normalize_tags),
        })
    }
}

/// GET /images query string.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageListQuery {
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub sort: Option<String>,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub page_size: Option<u32>,
}

impl ImageListQuery {
    pub fn validate(self) -> Result<ImageQuery> {
        let sort = match self.sort.as_deref() {
            None | Some("newest") => ImageSort::Newest,
            Some("oldest") => ImageSort::Oldest,
            Some("title") => ImageSort::Title,
            Some(other) => {
                return Err(AppError::ValidationError(format!("unknown sort: {other}")))
            }
        };
        let page = self.page.unwrap_or(1);
        if page == 0 {
            return Err(AppError::ValidationError("page is 1-based".into()));
        }
        let page_size = self.page_size.unwrap_or(20);
        if page_size == 0 || page_size > 100 {
            return Err(AppError::ValidationError(
                "pageSize must be between 1 and 100".into(),
            ));
        }
        Ok(ImageQuery {
            tag: self.tag.filter(|t| !t.trim().is_empty()),
            search: self.search.filter(|s| !s.trim().is_empty()),
            sort,
            page,
            page_size,
        })
    }
}

// ── Users ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminToggleRequest {
    pub is_admin: bool,
}
