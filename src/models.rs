use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::Type;
use rusqlite::Row;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub const COLUMNS: &'static str = "id, name, email, password_hash, created_at, updated_at";

    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(User {
            id: row.get(0)?,
            name: row.get(1)?,
            email: row.get(2)?,
            password_hash: row.get(3)?,
            created_at: parse_timestamp(4, &row.get::<_, String>(4)?)?,
            updated_at: parse_timestamp(5, &row.get::<_, String>(5)?)?,
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Update {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub category: Option<String>,
    pub image_url: Option<String>,
    pub published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Update {
    pub const COLUMNS: &'static str =
        "id, title, description, category, image_url, published, created_at, updated_at";

    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Update {
            id: row.get(0)?,
            title: row.get(1)?,
            description: row.get(2)?,
            category: row.get(3)?,
            image_url: row.get(4)?,
            published: row.get(5)?,
            created_at: parse_timestamp(6, &row.get::<_, String>(6)?)?,
            updated_at: parse_timestamp(7, &row.get::<_, String>(7)?)?,
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Certificate {
    pub id: i64,
    pub certificate_name: String,
    pub full_name: String,
    pub issuer: String,
    /// Root-relative public URL of the stored image, e.g.
    /// `/storage/certificates/1714550000_valid.jpg`.
    pub image_path: String,
    pub issue_date: NaiveDate,
    pub certificate_number: Option<String>,
    pub score: Option<String>,
    pub skills_covered: Option<String>,
    pub description: Option<String>,
    pub is_visible: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Certificate {
    pub const COLUMNS: &'static str = "id, certificate_name, full_name, issuer, image_path, \
         issue_date, certificate_number, score, skills_covered, description, is_visible, \
         created_at, updated_at";

    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Certificate {
            id: row.get(0)?,
            certificate_name: row.get(1)?,
            full_name: row.get(2)?,
            issuer: row.get(3)?,
            image_path: row.get(4)?,
            issue_date: parse_date(5, &row.get::<_, String>(5)?)?,
            certificate_number: row.get(6)?,
            score: row.get(7)?,
            skills_covered: row.get(8)?,
            description: row.get(9)?,
            is_visible: row.get(10)?,
            created_at: parse_timestamp(11, &row.get::<_, String>(11)?)?,
            updated_at: parse_timestamp(12, &row.get::<_, String>(12)?)?,
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Image {
    pub id: i64,
    pub file_name: String,
    pub file_path: String,
    pub file_type: Option<String>,
    pub file_size: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Image {
    pub const COLUMNS: &'static str =
        "id, file_name, file_path, file_type, file_size, created_at, updated_at";

    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Image {
            id: row.get(0)?,
            file_name: row.get(1)?,
            file_path: row.get(2)?,
            file_type: row.get(3)?,
            file_size: row.get(4)?,
            created_at: parse_timestamp(5, &row.get::<_, String>(5)?)?,
            updated_at: parse_timestamp(6, &row.get::<_, String>(6)?)?,
        })
    }
}

fn parse_timestamp(idx: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|err| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err)))
}

fn parse_date(idx: usize, raw: &str) -> rusqlite::Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|err| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err)))
}
