//! SQLite schema for the gallery store. Applied statement-by-statement on
//! pool init; idempotent via IF NOT EXISTS.
//!
//! UUIDs are stored as 16-byte BLOBs. The membership display position is
//! named `ord` because `order` is reserved in SQL; the domain field is still
//! `order`.

pub const STATEMENTS: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS users (
        id            BLOB PRIMARY KEY,
        email         TEXT NOT NULL UNIQUE,
        username      TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        role          TEXT NOT NULL DEFAULT 'USER',
        created_at    TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS images (
        id          BLOB PRIMARY KEY,
        owner_id    BLOB NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        url         TEXT NOT NULL,
        title       TEXT NOT NULL,
        description TEXT,
        created_at  TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS tags (
        id   BLOB PRIMARY KEY,
        name TEXT NOT NULL UNIQUE
    )",
    "CREATE TABLE IF NOT EXISTS image_tags (
        image_id BLOB NOT NULL REFERENCES images(id) ON DELETE CASCADE,
        tag_id   BLOB NOT NULL REFERENCES tags(id) ON DELETE CASCADE,
        PRIMARY KEY (image_id, tag_id)
    )",
    "CREATE TABLE IF NOT EXISTS galleries (
        id               BLOB PRIMARY KEY,
        owner_id         BLOB NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        title            TEXT NOT NULL,
        description      TEXT,
        is_public        INTEGER NOT NULL DEFAULT 0,
        cover_image_id   BLOB REFERENCES images(id) ON DELETE SET NULL,
        theme_color      TEXT,
        background_color TEXT,
        accent_color     TEXT,
        font_family      TEXT,
        display_mode     TEXT,
        layout_type      TEXT,
        created_at       TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS gallery_images (
        id          BLOB PRIMARY KEY,
        gallery_id  BLOB NOT NULL REFERENCES galleries(id) ON DELETE CASCADE,
        image_id    BLOB NOT NULL REFERENCES images(id) ON DELETE CASCADE,
        description TEXT,
        ord         INTEGER NOT NULL,
        UNIQUE (image_id, gallery_id)
    )",
    "CREATE INDEX IF NOT EXISTS idx_images_owner ON images(owner_id)",
    "CREATE INDEX IF NOT EXISTS idx_galleries_owner ON galleries(owner_id)",
    "CREATE INDEX IF NOT EXISTS idx_gallery_images_gallery ON gallery_images(gallery_id)",
];
