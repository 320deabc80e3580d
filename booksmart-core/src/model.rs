//! Domain model types for the BookSmart client.
//!
//! This module defines the payloads exchanged with the library service:
//! - [`Role`] - Which sign-in flow and menu set a session uses
//! - [`SignUpRequest`] / [`SignInRequest`] - Credential bodies
//! - [`Book`], [`NewBook`], [`BookFilter`] - Catalog entries and queries
//! - [`Reservation`], [`LibCard`] - Reader resources
//! - [`RatingInput`], [`Rating`], [`AvgRating`] - Book ratings

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::browser::Listed;
use crate::cache::Secret;

/// Opaque identifier of a listed item.
pub type ItemId = Uuid;

/// Which kind of account a session belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Reader,
    Admin,
}

impl Role {
    /// Sign-in endpoint for this role.
    pub fn sign_in_path(&self) -> &'static str {
        match self {
            Role::Reader => "/auth/sign-in",
            Role::Admin => "/auth/admin/sign-in",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Reader => "reader",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Registration payload for a new reader.
#[derive(Debug, Clone, Serialize)]
pub struct SignUpRequest {
    pub fio: String,
    pub phone_number: String,
    pub age: u32,
    pub password: Secret,
}

/// Credentials for reader or administrator sign-in.
#[derive(Debug, Clone, Serialize)]
pub struct SignInRequest {
    pub phone_number: String,
    pub password: Secret,
}

/// A catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    pub id: ItemId,
    pub title: String,
    pub author: String,
    #[serde(default)]
    pub publisher: String,
    #[serde(default)]
    pub copies_number: u32,
    #[serde(default)]
    pub rarity: String,
    #[serde(default)]
    pub genre: String,
    #[serde(default)]
    pub publishing_year: u32,
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub age_limit: u32,
}

impl Listed for Book {
    fn item_id(&self) -> ItemId {
        self.id
    }
}

/// Payload for adding a book to the catalog.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub publisher: String,
    pub copies_number: u32,
    pub rarity: String,
    pub genre: String,
    pub publishing_year: u32,
    pub language: String,
    pub age_limit: u32,
}

/// Optional catalog search fields. Empty strings and zeros mean "any".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookFilter {
    pub title: String,
    pub author: String,
    pub publisher: String,
    pub copies_number: u32,
    pub rarity: String,
    pub genre: String,
    pub publishing_year: u32,
    pub language: String,
    pub age_limit: u32,
}

impl BookFilter {
    /// Query parameters for the fields that are set.
    pub fn to_query(&self) -> BTreeMap<String, String> {
        let text = [
            ("title", &self.title),
            ("author", &self.author),
            ("publisher", &self.publisher),
            ("rarity", &self.rarity),
            ("genre", &self.genre),
            ("language", &self.language),
        ];
        let numbers = [
            ("copies_number", self.copies_number),
            ("publishing_year", self.publishing_year),
            ("age_limit", self.age_limit),
        ];

        let mut query = BTreeMap::new();
        for (name, value) in text {
            let value = value.trim();
            if !value.is_empty() {
                query.insert(name.to_string(), value.to_string());
            }
        }
        for (name, value) in numbers {
            if value > 0 {
                query.insert(name.to_string(), value.to_string());
            }
        }
        query
    }
}

/// A reader's reservation of a book.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reservation {
    pub id: ItemId,
    #[serde(default)]
    pub reader_id: Option<Uuid>,
    #[serde(default)]
    pub book_id: Option<Uuid>,
    pub issue_date: DateTime<Utc>,
    pub return_date: DateTime<Utc>,
    pub state: String,
}

impl Listed for Reservation {
    fn item_id(&self) -> ItemId {
        self.id
    }
}

/// A reader's library card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LibCard {
    pub lib_card_num: String,
    /// Validity period in days.
    pub validity: i32,
    pub issue_date: DateTime<Utc>,
    pub action_status: bool,
}

/// A rating submitted by a reader.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatingInput {
    pub book_id: ItemId,
    pub review: String,
    pub rating: i32,
}

/// A rating as listed for a book.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub reader: String,
    pub review: String,
    pub rating: i32,
}

/// Average rating of a book.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AvgRating {
    pub avg_rating: f32,
}
