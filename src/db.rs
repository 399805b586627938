use rusqlite::{params, Connection, OptionalExtension, Result};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::auth::hash_password;

pub type DbConnection = Arc<Mutex<Connection>>;

pub fn establish_connection(path: &str) -> Result<DbConnection> {
    let conn = Connection::open(path)?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            email TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS auth_tokens (
            token TEXT PRIMARY KEY,
            user_id INTEGER NOT NULL,
            created_at TEXT NOT NULL,
            FOREIGN KEY (user_id) REFERENCES users (id)
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS updates (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            description TEXT NOT NULL,
            category TEXT,
            image_url TEXT,
            published INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS certificates (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            certificate_name TEXT NOT NULL,
            full_name TEXT NOT NULL,
            issuer TEXT NOT NULL,
            image_path TEXT NOT NULL,
            issue_date TEXT NOT NULL,
            certificate_number TEXT,
            score TEXT,
            skills_covered TEXT,
            description TEXT,
            is_visible INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS images (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            file_name TEXT NOT NULL,
            file_path TEXT NOT NULL,
            file_type TEXT,
            file_size INTEGER,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        [],
    )?;

    Ok(Arc::new(Mutex::new(conn)))
}

/// Insert the administrator account if no user with this email exists yet.
pub async fn seed_admin(conn: &DbConnection, name: &str, email: &str, password: &str) -> Result<()> {
    let conn = conn.lock().await;

    let existing: Option<i64> = conn
        .query_row("SELECT id FROM users WHERE email = ?", [email], |row| {
            row.get(0)
        })
        .optional()?;
    if existing.is_some() {
        return Ok(());
    }

    let now = chrono::Utc::now().to_rfc3339();
    conn.execute(
        "INSERT INTO users (name, email, password_hash, created_at, updated_at) VALUES (?, ?, ?, ?, ?)",
        params![name, email, hash_password(password), now, now],
    )?;
    tracing::info!(email, "seeded admin user");

    Ok(())
}
