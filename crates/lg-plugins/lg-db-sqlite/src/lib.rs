//! # lg-db-sqlite Implementation
//!
//! This module implements the data mapping between the SQLite relational
//! model and the `lg-core` domain models. Every multi-row mutation runs
//! inside a transaction so a failure partway through rolls the whole
//! operation back.

mod schema;

use std::str::FromStr;

use async_trait::async_trait;
use lg_core::error::{AppError, Result};
use lg_core::models::{Gallery, GalleryDetail, GalleryImage, GalleryImageDetail, GalleryTheme, Image, Role, User};
use lg_core::traits::{GalleryRepo, ImageQuery, ImageSort, Page};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use uuid::Uuid;

pub struct SqliteGalleryStore {
    pool: SqlitePool,
}

// Helpers for UUID conversion
fn uuid_to_blob(id: Uuid) -> Vec<u8> {
    id.as_bytes().to_vec()
}

fn blob_to_uuid(blob: &[u8]) -> Uuid {
    Uuid::from_slice(blob).unwrap_or_default()
}

fn role_to_str(role: Role) -> &'static str {
    match role {
        Role::Admin => "ADMIN",
        Role::User => "USER",
    }
}

fn str_to_role(s: &str) -> Role {
    if s == "ADMIN" {
        Role::Admin
    } else {
        Role::User
    }
}

fn row_to_user(row: &SqliteRow) -> User {
    User {
        id: blob_to_uuid(row.get::<Vec<u8>, _>("id").as_slice()),
        email: row.get("email"),
        username: row.get("username"),
        password_hash: row.get("password_hash"),
        role: str_to_role(&row.get::<String, _>("role")),
        created_at: row.get("created_at"),
    }
}

/// Image row without its tags; tags are joined in separately.
fn row_to_image(row: &SqliteRow) -> Image {
    Image {
        id: blob_to_uuid(row.get::<Vec<u8>, _>("id").as_slice()),
        owner_id: blob_to_uuid(row.get::<Vec<u8>, _>("owner_id").as_slice()),
        url: row.get("url"),
        title: row.get("title"),
        description: row.get("description"),
        tags: Vec::new(),
        created_at: row.get("created_at"),
    }
}

fn row_to_gallery(row: &SqliteRow) -> Gallery {
    Gallery {
        id: blob_to_uuid(row.get::<Vec<u8>, _>("id").as_slice()),
        owner_id: blob_to_uuid(row.get::<Vec<u8>, _>("owner_id").as_slice()),
        title: row.get("title"),
        description: row.get("description"),
        is_public: row.get("is_public"),
        cover_image_id: row
            .get::<Option<Vec<u8>>, _>("cover_image_id")
            .map(|b| blob_to_uuid(&b)),
        theme: GalleryTheme {
            theme_color: row.get("theme_color"),
            background_color: row.get("background_color"),
            accent_color: row.get("accent_color"),
            font_family: row.get("font_family"),
            display_mode: row.get("display_mode"),
            layout_type: row.get("layout_type"),
        },
        created_at: row.get("created_at"),
    }
}

fn row_to_membership(row: &SqliteRow) -> GalleryImage {
    GalleryImage {
        id: blob_to_uuid(row.get::<Vec<u8>, _>("id").as_slice()),
        gallery_id: blob_to_uuid(row.get::<Vec<u8>, _>("gallery_id").as_slice()),
        image_id: blob_to_uuid(row.get::<Vec<u8>, _>("image_id").as_slice()),
        description: row.get("description"),
        order: row.get("ord"),
    }
}

impl SqliteGalleryStore {
    pub async fn new(url: &str) -> anyhow::Result<Self> {
        let opts = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new().connect_with(opts).await?;
        Self::init_schema(&pool).await?;
        Ok(Self { pool })
    }

    /// A single-connection in-memory store. SQLite gives every connection
    /// its own `:memory:` database, so the pool must stay at one.
    pub async fn new_in_memory() -> anyhow::Result<Self> {
        let opts = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(opts)
            .await?;
        Self::init_schema(&pool).await?;
        Ok(Self { pool })
    }

    async fn init_schema(pool: &SqlitePool) -> anyhow::Result<()> {
        for stmt in schema::STATEMENTS {
            sqlx::query(stmt).execute(pool).await?;
        }
        log::debug!("sqlite schema ready ({} statements)", schema::STATEMENTS.len());
        Ok(())
    }

    async fn tags_for_image(&self, image_id: Uuid) -> Result<Vec<String>> {
        let rows = sqlx::query(
            "SELECT t.name FROM tags t
             JOIN image_tags it ON it.tag_id = t.id
             WHERE it.image_id = ? ORDER BY t.name ASC",
        )
        .bind(uuid_to_blob(image_id))
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::internal)?;

        Ok(rows.into_iter().map(|r| r.get("name")).collect())
    }
}

/// Upserts tag names and links them to the image. Runs inside the caller's
/// transaction.
async fn write_tags(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    image_id: Uuid,
    tags: &[String],
) -> std::result::Result<(), sqlx::Error> {
    for name in tags {
        sqlx::query("INSERT INTO tags (id, name) VALUES (?, ?) ON CONFLICT(name) DO NOTHING")
            .bind(uuid_to_blob(Uuid::now_v7()))
            .bind(name)
            .execute(&mut **tx)
            .await?;
        let tag_id: Vec<u8> = sqlx::query("SELECT id FROM tags WHERE name = ?")
            .bind(name)
            .fetch_one(&mut **tx)
            .await?
            .get("id");
        sqlx::query(
            "INSERT INTO image_tags (image_id, tag_id) VALUES (?, ?)
             ON CONFLICT(image_id, tag_id) DO NOTHING",
        )
        .bind(uuid_to_blob(image_id))
        .bind(tag_id)
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}

/// Inserts membership rows for a gallery inside the caller's transaction.
async fn insert_memberships(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    memberships: &[GalleryImage],
) -> std::result::Result<(), sqlx::Error> {
    for m in memberships {
        sqlx::query(
            "INSERT INTO gallery_images (id, gallery_id, image_id, description, ord)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(uuid_to_blob(m.id))
        .bind(uuid_to_blob(m.gallery_id))
        .bind(uuid_to_blob(m.image_id))
        .bind(&m.description)
        .bind(m.order)
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}

/// Renumbers a gallery's memberships to a dense 0..n-1 sequence, keeping
/// their current relative order. Used after a removal opens a gap.
async fn renumber_memberships(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    gallery_id: Uuid,
) -> std::result::Result<(), sqlx::Error> {
    let ids: Vec<Vec<u8>> = sqlx::query(
        "SELECT id FROM gallery_images WHERE gallery_id = ? ORDER BY ord ASC",
    )
    .bind(uuid_to_blob(gallery_id))
    .fetch_all(&mut **tx)
    .await?
    .into_iter()
    .map(|r| r.get("id"))
    .collect();

    for (position, id) in ids.into_iter().enumerate() {
        sqlx::query("UPDATE gallery_images SET ord = ? WHERE id = ?")
            .bind(position as i64)
            .bind(id)
            .execute(&mut **tx)
            .await?;
    }
    Ok(())
}

#[async_trait]
impl GalleryRepo for SqliteGalleryStore {
    // ── Users ────────────────────────────────────────────────────────────

    async fn create_user(&self, user: User) -> Result<()> {
        sqlx::query(
            "INSERT INTO users (id, email, username, password_hash, role, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(uuid_to_blob(user.id))
        .bind(user.email)
        .bind(user.username)
        .bind(user.password_hash)
        .bind(role_to_str(user.role))
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(AppError::internal)?;
        Ok(())
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE id = ?")
            .bind(uuid_to_blob(id))
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::internal)?;
        Ok(row.as_ref().map(row_to_user))
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::internal)?;
        Ok(row.as_ref().map(row_to_user))
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::internal)?;
        Ok(row.as_ref().map(row_to_user))
    }

    async fn set_user_role(&self, id: Uuid, role: Role) -> Result<bool> {
        let result = sqlx::query("UPDATE users SET role = ? WHERE id = ?")
            .bind(role_to_str(role))
            .bind(uuid_to_blob(id))
            .execute(&self.pool)
            .await
            .map_err(AppError::internal)?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_user(&self, id: Uuid) -> Result<bool> {
        let mut tx = self.pool.begin().await.map_err(AppError::internal)?;
        let blob = uuid_to_blob(id);

        // Explicit cascade: memberships of owned galleries and of owned
        // images, tag links, then galleries, images, and the user itself.
        sqlx::query(
            "DELETE FROM gallery_images WHERE gallery_id IN
             (SELECT id FROM galleries WHERE owner_id = ?)",
        )
        .bind(&blob)
        .execute(&mut *tx)
        .await
        .map_err(AppError::internal)?;
        sqlx::query(
            "DELETE FROM gallery_images WHERE image_id IN
             (SELECT id FROM images WHERE owner_id = ?)",
        )
        .bind(&blob)
        .execute(&mut *tx)
        .await
        .map_err(AppError::internal)?;
        sqlx::query(
            "UPDATE galleries SET cover_image_id = NULL WHERE cover_image_id IN
             (SELECT id FROM images WHERE owner_id = ?)",
        )
        .bind(&blob)
        .execute(&mut *tx)
        .await
        .map_err(AppError::internal)?;
        sqlx::query(
            "DELETE FROM image_tags WHERE image_id IN
             (SELECT id FROM images WHERE owner_id = ?)",
        )
        .bind(&blob)
        .execute(&mut *tx)
        .await
        .map_err(AppError::internal)?;
        sqlx::query("DELETE FROM galleries WHERE owner_id = ?")
            .bind(&blob)
            .execute(&mut *tx)
            .await
            .map_err(AppError::internal)?;
        sqlx::query("DELETE FROM images WHERE owner_id = ?")
            .bind(&blob)
            .execute(&mut *tx)
            .await
            .map_err(AppError::internal)?;
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(&blob)
            .execute(&mut *tx)
            .await
            .map_err(AppError::internal)?;

        tx.commit().await.map_err(AppError::internal)?;
        Ok(result.rows_affected() > 0)
    }

    // ── Images ───────────────────────────────────────────────────────────

    async fn create_image(&self, image: Image) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(AppError::internal)?;

        sqlx::query(
            "INSERT INTO images (id, owner_id, url, title, description, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(uuid_to_blob(image.id))
        .bind(uuid_to_blob(image.owner_id))
        .bind(&image.url)
        .bind(&image.title)
        .bind(&image.description)
        .bind(image.created_at)
        .execute(&mut *tx)
        .await
        .map_err(AppError::internal)?;

        write_tags(&mut tx, image.id, &image.tags)
            .await
            .map_err(AppError::internal)?;

        tx.commit().await.map_err(AppError::internal)?;
        Ok(())
    }

    async fn get_image(&self, id: Uuid) -> Result<Option<Image>> {
        let row = sqlx::query("SELECT * FROM images WHERE id = ?")
            .bind(uuid_to_blob(id))
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::internal)?;

        match row {
            Some(row) => {
                let mut image = row_to_image(&row);
                image.tags = self.tags_for_image(image.id).await?;
                Ok(Some(image))
            }
            None => Ok(None),
        }
    }

    async fn get_images_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Image>> {
        let mut images = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(image) = self.get_image(*id).await? {
                images.push(image);
            }
        }
        Ok(images)
    }

    async fn list_images(&self, owner_id: Uuid, query: &ImageQuery) -> Result<Page<Image>> {
        let order_clause = match query.sort {
            ImageSort::Newest => "i.created_at DESC",
            ImageSort::Oldest => "i.created_at ASC",
            ImageSort::Title => "i.title ASC",
        };
        let search_pattern = query.search.as_ref().map(|s| format!("%{s}%"));
        let offset = i64::from(query.page.saturating_sub(1)) * i64::from(query.page_size);

        let filter = "FROM images i
             LEFT JOIN image_tags it ON it.image_id = i.id
             LEFT JOIN tags t ON t.id = it.tag_id
             WHERE i.owner_id = ?
               AND (? IS NULL OR t.name = ?)
               AND (? IS NULL OR i.title LIKE ? OR IFNULL(i.description, '') LIKE ?)";

        let total: i64 = sqlx::query(&format!("SELECT COUNT(DISTINCT i.id) AS n {filter}"))
            .bind(uuid_to_blob(owner_id))
            .bind(&query.tag)
            .bind(&query.tag)
            .bind(&search_pattern)
            .bind(&search_pattern)
            .bind(&search_pattern)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::internal)?
            .get("n");

        let rows = sqlx::query(&format!(
            "SELECT DISTINCT i.id, i.owner_id, i.url, i.title, i.description, i.created_at
             {filter} ORDER BY {order_clause} LIMIT ? OFFSET ?"
        ))
        .bind(uuid_to_blob(owner_id))
        .bind(&query.tag)
        .bind(&query.tag)
        .bind(&search_pattern)
        .bind(&search_pattern)
        .bind(&search_pattern)
        .bind(i64::from(query.page_size))
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::internal)?;

        let mut items = Vec::with_capacity(rows.len());
        for row in &rows {
            let mut image = row_to_image(row);
            image.tags = self.tags_for_image(image.id).await?;
            items.push(image);
        }

        Ok(Page {
            items,
            total,
            page: query.page,
            page_size: query.page_size,
        })
    }

    async fn update_image(&self, image: Image) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(AppError::internal)?;

        sqlx::query("UPDATE images SET title = ?, description = ? WHERE id = ?")
            .bind(&image.title)
            .bind(&image.description)
            .bind(uuid_to_blob(image.id))
            .execute(&mut *tx)
            .await
            .map_err(AppError::internal)?;

        // Rewrite the tag set; tag rows themselves are never deleted.
        sqlx::query("DELETE FROM image_tags WHERE image_id = ?")
            .bind(uuid_to_blob(image.id))
            .execute(&mut *tx)
            .await
            .map_err(AppError::internal)?;
        write_tags(&mut tx, image.id, &image.tags)
            .await
            .map_err(AppError::internal)?;

        tx.commit().await.map_err(AppError::internal)?;
        Ok(())
    }

    async fn delete_image(&self, id: Uuid) -> Result<bool> {
        let mut tx = self.pool.begin().await.map_err(AppError::internal)?;
        let blob = uuid_to_blob(id);

        // Weak cover references are cleared, never left dangling.
        sqlx::query("UPDATE galleries SET cover_image_id = NULL WHERE cover_image_id = ?")
            .bind(&blob)
            .execute(&mut *tx)
            .await
            .map_err(AppError::internal)?;

        // Removing memberships can open order gaps in affected galleries.
        let affected: Vec<Uuid> = sqlx::query(
            "SELECT DISTINCT gallery_id FROM gallery_images WHERE image_id = ?",
        )
        .bind(&blob)
        .fetch_all(&mut *tx)
        .await
        .map_err(AppError::internal)?
        .into_iter()
        .map(|r| blob_to_uuid(r.get::<Vec<u8>, _>("gallery_id").as_slice()))
        .collect();

        sqlx::query("DELETE FROM gallery_images WHERE image_id = ?")
            .bind(&blob)
            .execute(&mut *tx)
            .await
            .map_err(AppError::internal)?;
        for gallery_id in affected {
            renumber_memberships(&mut tx, gallery_id)
                .await
                .map_err(AppError::internal)?;
        }

        sqlx::query("DELETE FROM image_tags WHERE image_id = ?")
            .bind(&blob)
            .execute(&mut *tx)
            .await
            .map_err(AppError::internal)?;
        let result = sqlx::query("DELETE FROM images WHERE id = ?")
            .bind(&blob)
            .execute(&mut *tx)
            .await
            .map_err(AppError::internal)?;

        tx.commit().await.map_err(AppError::internal)?;
        Ok(result.rows_affected() > 0)
    }

    // ── Galleries ────────────────────────────────────────────────────────

    /// Atomic operation to create a gallery and its membership rows.
    ///
    /// A transaction ensures we don't end up with a gallery whose membership
    /// only partially matches what the caller asked for.
    async fn create_gallery(&self, gallery: Gallery, memberships: Vec<GalleryImage>) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(AppError::internal)?;

        sqlx::query(
            "INSERT INTO galleries (id, owner_id, title, description, is_public,
                cover_image_id, theme_color, background_color, accent_color,
                font_family, display_mode, layout_type, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(uuid_to_blob(gallery.id))
        .bind(uuid_to_blob(gallery.owner_id))
        .bind(&gallery.title)
        .bind(&gallery.description)
        .bind(gallery.is_public)
        .bind(gallery.cover_image_id.map(uuid_to_blob))
        .bind(&gallery.theme.theme_color)
        .bind(&gallery.theme.background_color)
        .bind(&gallery.theme.accent_color)
        .bind(&gallery.theme.font_family)
        .bind(&gallery.theme.display_mode)
        .bind(&gallery.theme.layout_type)
        .bind(gallery.created_at)
        .execute(&mut *tx)
        .await
        .map_err(AppError::internal)?;

        insert_memberships(&mut tx, &memberships)
            .await
            .map_err(AppError::internal)?;

        tx.commit().await.map_err(AppError::internal)?;
        Ok(())
    }

    async fn get_gallery(&self, id: Uuid) -> Result<Option<Gallery>> {
        let row = sqlx::query("SELECT * FROM galleries WHERE id = ?")
            .bind(uuid_to_blob(id))
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::internal)?;
        Ok(row.as_ref().map(row_to_gallery))
    }

    async fn get_gallery_detail(&self, id: Uuid) -> Result<Option<GalleryDetail>> {
        let gallery = match self.get_gallery(id).await? {
            Some(g) => g,
            None => return Ok(None),
        };

        let rows = sqlx::query(
            "SELECT * FROM gallery_images WHERE gallery_id = ? ORDER BY ord ASC",
        )
        .bind(uuid_to_blob(id))
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::internal)?;

        let mut images = Vec::with_capacity(rows.len());
        for row in &rows {
            let membership = row_to_membership(row);
            let image = self
                .get_image(membership.image_id)
                .await?
                .ok_or_else(|| AppError::not_found("Image", membership.image_id))?;
            images.push(GalleryImageDetail {
                id: membership.id,
                image,
                description: membership.description,
                order: membership.order,
            });
        }

        Ok(Some(GalleryDetail { gallery, images }))
    }

    async fn list_galleries(&self, viewer: Option<Uuid>) -> Result<Vec<Gallery>> {
        let rows = sqlx::query(
            "SELECT * FROM galleries WHERE is_public = 1 OR owner_id = ?
             ORDER BY created_at DESC",
        )
        .bind(viewer.map(uuid_to_blob))
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::internal)?;
        Ok(rows.iter().map(row_to_gallery).collect())
    }

    /// Scalar update plus, when requested, a total membership replacement:
    /// delete-all then recreate, all inside one transaction.
    async fn update_gallery(
        &self,
        gallery: Gallery,
        memberships: Option<Vec<GalleryImage>>,
    ) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(AppError::internal)?;

        sqlx::query(
            "UPDATE galleries SET title = ?, description = ?, is_public = ?,
                cover_image_id = ?, theme_color = ?, background_color = ?,
                accent_color = ?, font_family = ?, display_mode = ?, layout_type = ?
             WHERE id = ?",
        )
        .bind(&gallery.title)
        .bind(&gallery.description)
        .bind(gallery.is_public)
        .bind(gallery.cover_image_id.map(uuid_to_blob))
        .bind(&gallery.theme.theme_color)
        .bind(&gallery.theme.background_color)
        .bind(&gallery.theme.accent_color)
        .bind(&gallery.theme.font_family)
        .bind(&gallery.theme.display_mode)
        .bind(&gallery.theme.layout_type)
        .bind(uuid_to_blob(gallery.id))
        .execute(&mut *tx)
        .await
        .map_err(AppError::internal)?;

        if let Some(memberships) = memberships {
            sqlx::query("DELETE FROM gallery_images WHERE gallery_id = ?")
                .bind(uuid_to_blob(gallery.id))
                .execute(&mut *tx)
                .await
                .map_err(AppError::internal)?;
            insert_memberships(&mut tx, &memberships)
                .await
                .map_err(AppError::internal)?;
        }

        tx.commit().await.map_err(AppError::internal)?;
        Ok(())
    }

    async fn delete_gallery(&self, id: Uuid) -> Result<bool> {
        let mut tx = self.pool.begin().await.map_err(AppError::internal)?;

        sqlx::query("DELETE FROM gallery_images WHERE gallery_id = ?")
            .bind(uuid_to_blob(id))
            .execute(&mut *tx)
            .await
            .map_err(AppError::internal)?;
        let result = sqlx::query("DELETE FROM galleries WHERE id = ?")
            .bind(uuid_to_blob(id))
            .execute(&mut *tx)
            .await
            .map_err(AppError::internal)?;

        tx.commit().await.map_err(AppError::internal)?;
        Ok(result.rows_affected() > 0)
    }

    // ── Memberships ──────────────────────────────────────────────────────

    async fn list_memberships(&self, gallery_id: Uuid) -> Result<Vec<GalleryImage>> {
        let rows = sqlx::query(
            "SELECT * FROM gallery_images WHERE gallery_id = ? ORDER BY ord ASC",
        )
        .bind(uuid_to_blob(gallery_id))
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::internal)?;
        Ok(rows.iter().map(row_to_membership).collect())
    }

    /// Keyed strictly by the membership's own id. An image id passed here
    /// lands in the wrong id space and answers NotFound.
    async fn remove_membership(&self, gallery_id: Uuid, membership_id: Uuid) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(AppError::internal)?;

        let row = sqlx::query("SELECT gallery_id, image_id FROM gallery_images WHERE id = ?")
            .bind(uuid_to_blob(membership_id))
            .fetch_optional(&mut *tx)
            .await
            .map_err(AppError::internal)?;

        let row = match row {
            Some(row) => row,
            None => return Err(AppError::not_found("Membership", membership_id)),
        };
        let found_gallery = blob_to_uuid(row.get::<Vec<u8>, _>("gallery_id").as_slice());
        if found_gallery != gallery_id {
            return Err(AppError::ValidationError(format!(
                "membership {membership_id} belongs to a different gallery"
            )));
        }
        let image_id = blob_to_uuid(row.get::<Vec<u8>, _>("image_id").as_slice());

        sqlx::query("DELETE FROM gallery_images WHERE id = ?")
            .bind(uuid_to_blob(membership_id))
            .execute(&mut *tx)
            .await
            .map_err(AppError::internal)?;

        // The cover is a weak reference into the membership: clear it when
        // the removed row carried the cover image.
        sqlx::query(
            "UPDATE galleries SET cover_image_id = NULL WHERE id = ? AND cover_image_id = ?",
        )
        .bind(uuid_to_blob(gallery_id))
        .bind(uuid_to_blob(image_id))
        .execute(&mut *tx)
        .await
        .map_err(AppError::internal)?;

        renumber_memberships(&mut tx, gallery_id)
            .await
            .map_err(AppError::internal)?;

        tx.commit().await.map_err(AppError::internal)?;
        Ok(())
    }

    async fn reorder_memberships(&self, gallery_id: Uuid, ordered_ids: &[Uuid]) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(AppError::internal)?;

        let current: Vec<Uuid> = sqlx::query(
            "SELECT id FROM gallery_images WHERE gallery_id = ? ORDER BY ord ASC",
        )
        .bind(uuid_to_blob(gallery_id))
        .fetch_all(&mut *tx)
        .await
        .map_err(AppError::internal)?
        .into_iter()
        .map(|r| blob_to_uuid(r.get::<Vec<u8>, _>("id").as_slice()))
        .collect();

        // All-or-nothing: a sequence that doesn't cover the membership
        // exactly is rejected before any row is touched.
        lg_core::compose::validate_reorder(&current, ordered_ids)?;

        for (position, id) in ordered_ids.iter().enumerate() {
            sqlx::query("UPDATE gallery_images SET ord = ? WHERE id = ? AND gallery_id = ?")
                .bind(position as i64)
                .bind(uuid_to_blob(*id))
                .bind(uuid_to_blob(gallery_id))
                .execute(&mut *tx)
                .await
                .map_err(AppError::internal)?;
        }

        tx.commit().await.map_err(AppError::internal)?;
        Ok(())
    }

    async fn wipe_all(&self) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(AppError::internal)?;
        for table in [
            "gallery_images",
            "image_tags",
            "galleries",
            "images",
            "tags",
            "users",
        ] {
            sqlx::query(&format!("DELETE FROM {table}"))
                .execute(&mut *tx)
                .await
                .map_err(AppError::internal)?;
        }
        tx.commit().await.map_err(AppError::internal)?;
        log::warn!("test reset: all rows wiped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use lg_core::compose::{build_memberships, MembershipDraft};

    async fn store() -> SqliteGalleryStore {
        SqliteGalleryStore::new_in_memory().await.unwrap()
    }

    async fn seed_user(store: &SqliteGalleryStore) -> User {
        let user = User {
            id: Uuid::now_v7(),
            email: format!("{}@example.com", Uuid::now_v7()),
            username: Uuid::now_v7().to_string(),
            password_hash: "$argon2id$stub".into(),
            role: Role::User,
            created_at: Utc::now(),
        };
        store.create_user(user.clone()).await.unwrap();
        user
    }

    async fn seed_image(store: &SqliteGalleryStore, owner: &User, tags: &[&str]) -> Image {
        let image = Image {
            id: Uuid::now_v7(),
            owner_id: owner.id,
            url: "/static/uploads/ab/cd/abcd".into(),
            title: "sunset".into(),
            description: None,
            tags: tags.iter().map(|t| t.to_string()).collect(),
            created_at: Utc::now(),
        };
        store.create_image(image.clone()).await.unwrap();
        image
    }

    fn draft(image_id: Uuid, order: Option<i64>) -> MembershipDraft {
        MembershipDraft {
            image_id,
            description: None,
            order,
        }
    }

    async fn seed_gallery(
        store: &SqliteGalleryStore,
        owner: &User,
        image_ids: &[Uuid],
        cover: Option<Uuid>,
    ) -> Gallery {
        let gallery = Gallery {
            id: Uuid::now_v7(),
            owner_id: owner.id,
            title: "holiday".into(),
            description: None,
            is_public: true,
            cover_image_id: cover,
            theme: GalleryTheme::default(),
            created_at: Utc::now(),
        };
        let drafts = image_ids.iter().map(|id| draft(*id, None)).collect();
        let memberships = build_memberships(gallery.id, drafts).unwrap();
        store
            .create_gallery(gallery.clone(), memberships)
            .await
            .unwrap();
        gallery
    }

    fn orders(detail: &GalleryDetail) -> Vec<i64> {
        detail.images.iter().map(|m| m.order).collect()
    }

    #[tokio::test]
    async fn test_create_and_read_gallery_detail() {
        let store = store().await;
        let owner = seed_user(&store).await;
        let a = seed_image(&store, &owner, &[]).await;
        let b = seed_image(&store, &owner, &[]).await;

        let gallery = seed_gallery(&store, &owner, &[a.id, b.id], Some(a.id)).await;

        let detail = store.get_gallery_detail(gallery.id).await.unwrap().unwrap();
        assert_eq!(detail.gallery.cover_image_id, Some(a.id));
        assert_eq!(orders(&detail), vec![0, 1]);
        assert_eq!(detail.images[0].image.id, a.id);
    }

    #[tokio::test]
    async fn test_remove_membership_by_image_id_is_not_found() {
        // The historical defect: the membership id and the image id live in
        // different id spaces even when the image is in only one gallery.
        let store = store().await;
        let owner = seed_user(&store).await;
        let img = seed_image(&store, &owner, &[]).await;
        let gallery = seed_gallery(&store, &owner, &[img.id], None).await;

        let err = store
            .remove_membership(gallery.id, img.id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_, _)));

        // The membership survived the wrong-id attempt.
        let detail = store.get_gallery_detail(gallery.id).await.unwrap().unwrap();
        assert_eq!(detail.images.len(), 1);
    }

    #[tokio::test]
    async fn test_remove_membership_clears_cover_and_renumbers() {
        let store = store().await;
        let owner = seed_user(&store).await;
        let a = seed_image(&store, &owner, &[]).await;
        let b = seed_image(&store, &owner, &[]).await;
        let c = seed_image(&store, &owner, &[]).await;
        let gallery = seed_gallery(&store, &owner, &[a.id, b.id, c.id], Some(b.id)).await;

        let memberships = store.list_memberships(gallery.id).await.unwrap();
        let b_membership = memberships.iter().find(|m| m.image_id == b.id).unwrap();

        store
            .remove_membership(gallery.id, b_membership.id)
            .await
            .unwrap();

        let detail = store.get_gallery_detail(gallery.id).await.unwrap().unwrap();
        assert_eq!(detail.gallery.cover_image_id, None);
        // Dense again after the middle row vanished.
        assert_eq!(orders(&detail), vec![0, 1]);
        let ids: Vec<Uuid> = detail.images.iter().map(|m| m.image.id).collect();
        assert_eq!(ids, vec![a.id, c.id]);
    }

    #[tokio::test]
    async fn test_remove_membership_keeps_unrelated_cover() {
        let store = store().await;
        let owner = seed_user(&store).await;
        let a = seed_image(&store, &owner, &[]).await;
        let b = seed_image(&store, &owner, &[]).await;
        let gallery = seed_gallery(&store, &owner, &[a.id, b.id], Some(a.id)).await;

        let memberships = store.list_memberships(gallery.id).await.unwrap();
        let b_membership = memberships.iter().find(|m| m.image_id == b.id).unwrap();
        store
            .remove_membership(gallery.id, b_membership.id)
            .await
            .unwrap();

        let detail = store.get_gallery_detail(gallery.id).await.unwrap().unwrap();
        assert_eq!(detail.gallery.cover_image_id, Some(a.id));
    }

    #[tokio::test]
    async fn test_remove_membership_of_other_gallery_is_rejected() {
        let store = store().await;
        let owner = seed_user(&store).await;
        let a = seed_image(&store, &owner, &[]).await;
        let b = seed_image(&store, &owner, &[]).await;
        let gallery_a = seed_gallery(&store, &owner, &[a.id], None).await;
        let gallery_b = seed_gallery(&store, &owner, &[b.id], None).await;

        let foreign = store.list_memberships(gallery_b.id).await.unwrap()[0].id;
        let err = store
            .remove_membership(gallery_a.id, foreign)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_update_replaces_membership_set_totally() {
        let store = store().await;
        let owner = seed_user(&store).await;
        let a = seed_image(&store, &owner, &[]).await;
        let b = seed_image(&store, &owner, &[]).await;
        let c = seed_image(&store, &owner, &[]).await;
        let gallery = seed_gallery(&store, &owner, &[a.id, b.id], None).await;

        // New set overlaps on `a`, drops `b`, adds `c`.
        let new_rows =
            build_memberships(gallery.id, vec![draft(c.id, Some(0)), draft(a.id, Some(1))])
                .unwrap();
        store
            .update_gallery(gallery.clone(), Some(new_rows))
            .await
            .unwrap();

        let detail = store.get_gallery_detail(gallery.id).await.unwrap().unwrap();
        let ids: Vec<Uuid> = detail.images.iter().map(|m| m.image.id).collect();
        assert_eq!(ids, vec![c.id, a.id]);
        assert_eq!(orders(&detail), vec![0, 1]);
    }

    #[tokio::test]
    async fn test_reorder_persists_and_is_idempotent() {
        let store = store().await;
        let owner = seed_user(&store).await;
        let a = seed_image(&store, &owner, &[]).await;
        let b = seed_image(&store, &owner, &[]).await;
        let c = seed_image(&store, &owner, &[]).await;
        let gallery = seed_gallery(&store, &owner, &[a.id, b.id, c.id], None).await;

        let memberships = store.list_memberships(gallery.id).await.unwrap();
        let mut sequence: Vec<Uuid> = memberships.iter().map(|m| m.id).collect();
        sequence.reverse();

        store
            .reorder_memberships(gallery.id, &sequence)
            .await
            .unwrap();
        let first = store.list_memberships(gallery.id).await.unwrap();

        store
            .reorder_memberships(gallery.id, &sequence)
            .await
            .unwrap();
        let second = store.list_memberships(gallery.id).await.unwrap();

        let firsts: Vec<(Uuid, i64)> = first.iter().map(|m| (m.id, m.order)).collect();
        let seconds: Vec<(Uuid, i64)> = second.iter().map(|m| (m.id, m.order)).collect();
        assert_eq!(firsts, seconds);
        assert_eq!(first[0].image_id, c.id);
        assert_eq!(orders(&store.get_gallery_detail(gallery.id).await.unwrap().unwrap()), vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn test_reorder_rejects_foreign_or_partial_sets() {
        let store = store().await;
        let owner = seed_user(&store).await;
        let a = seed_image(&store, &owner, &[]).await;
        let b = seed_image(&store, &owner, &[]).await;
        let gallery = seed_gallery(&store, &owner, &[a.id, b.id], None).await;

        let memberships = store.list_memberships(gallery.id).await.unwrap();
        let partial = vec![memberships[0].id];
        assert!(store
            .reorder_memberships(gallery.id, &partial)
            .await
            .is_err());

        let with_foreign = vec![memberships[0].id, Uuid::now_v7()];
        assert!(store
            .reorder_memberships(gallery.id, &with_foreign)
            .await
            .is_err());

        // Nothing applied: ordering unchanged.
        let after = store.list_memberships(gallery.id).await.unwrap();
        assert_eq!(after[0].id, memberships[0].id);
        assert_eq!(after[1].id, memberships[1].id);
    }

    #[tokio::test]
    async fn test_delete_image_clears_membership_and_cover() {
        let store = store().await;
        let owner = seed_user(&store).await;
        let a = seed_image(&store, &owner, &[]).await;
        let b = seed_image(&store, &owner, &[]).await;
        let gallery = seed_gallery(&store, &owner, &[a.id, b.id], Some(a.id)).await;

        assert!(store.delete_image(a.id).await.unwrap());

        let detail = store.get_gallery_detail(gallery.id).await.unwrap().unwrap();
        assert_eq!(detail.gallery.cover_image_id, None);
        assert_eq!(detail.images.len(), 1);
        assert_eq!(orders(&detail), vec![0]);
    }

    #[tokio::test]
    async fn test_tags_upsert_and_filter() {
        let store = store().await;
        let owner = seed_user(&store).await;
        let tagged = seed_image(&store, &owner, &["beach", "sunset"]).await;
        let _plain = seed_image(&store, &owner, &[]).await;
        // Same tag name on a second image reuses the row.
        let also_beach = seed_image(&store, &owner, &["beach"]).await;

        let fetched = store.get_image(tagged.id).await.unwrap().unwrap();
        assert_eq!(fetched.tags, vec!["beach".to_string(), "sunset".to_string()]);

        let query = ImageQuery {
            tag: Some("beach".into()),
            ..ImageQuery::default()
        };
        let page = store.list_images(owner.id, &query).await.unwrap();
        assert_eq!(page.total, 2);
        let ids: Vec<Uuid> = page.items.iter().map(|i| i.id).collect();
        assert!(ids.contains(&tagged.id) && ids.contains(&also_beach.id));
    }

    #[tokio::test]
    async fn test_list_images_search_and_pagination() {
        let store = store().await;
        let owner = seed_user(&store).await;
        for n in 0..3 {
            let image = Image {
                id: Uuid::now_v7(),
                owner_id: owner.id,
                url: "/static/x".into(),
                title: format!("alpine trip {n}"),
                description: None,
                tags: vec![],
                created_at: Utc::now(),
            };
            store.create_image(image).await.unwrap();
        }
        let _other = seed_image(&store, &owner, &[]).await; // "sunset"

        let query = ImageQuery {
            search: Some("alpine".into()),
            page_size: 2,
            ..ImageQuery::default()
        };
        let page = store.list_images(owner.id, &query).await.unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.items.len(), 2);

        let page_two = store
            .list_images(
                owner.id,
                &ImageQuery {
                    search: Some("alpine".into()),
                    page: 2,
                    page_size: 2,
                    ..ImageQuery::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(page_two.items.len(), 1);
    }

    #[tokio::test]
    async fn test_delete_user_cascades() {
        let store = store().await;
        let owner = seed_user(&store).await;
        let img = seed_image(&store, &owner, &["beach"]).await;
        let gallery = seed_gallery(&store, &owner, &[img.id], Some(img.id)).await;

        assert!(store.delete_user(owner.id).await.unwrap());
        assert!(store.get_user(owner.id).await.unwrap().is_none());
        assert!(store.get_image(img.id).await.unwrap().is_none());
        assert!(store.get_gallery(gallery.id).await.unwrap().is_none());
        assert!(store
            .list_memberships(gallery.id)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_private_galleries_hidden_from_listing() {
        let store = store().await;
        let owner = seed_user(&store).await;
        let stranger = seed_user(&store).await;

        let private = Gallery {
            id: Uuid::now_v7(),
            owner_id: owner.id,
            title: "secret".into(),
            description: None,
            is_public: false,
            cover_image_id: None,
            theme: GalleryTheme::default(),
            created_at: Utc::now(),
        };
        store.create_gallery(private.clone(), vec![]).await.unwrap();

        let anon = store.list_galleries(None).await.unwrap();
        assert!(anon.iter().all(|g| g.id != private.id));

        let as_stranger = store.list_galleries(Some(stranger.id)).await.unwrap();
        assert!(as_stranger.iter().all(|g| g.id != private.id));

        let as_owner = store.list_galleries(Some(owner.id)).await.unwrap();
        assert!(as_owner.iter().any(|g| g.id == private.id));
    }
}
