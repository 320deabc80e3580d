//! Library-service actions on top of a [`Session`].
//!
//! Public catalog reads go out without credentials. Everything under `/api`
//! carries the session's bearer token and fails with
//! [`ClientError::Unauthenticated`] on a 401.

use reqwest::StatusCode;
use tracing::info;

use crate::browser::{Browser, Page};
use crate::error::ClientError;
use crate::model::{AvgRating, Book, ItemId, LibCard, NewBook, Rating, RatingInput, Reservation};
use crate::requests;
use crate::session::Session;

/// Book detail together with its average rating, when it has one.
#[derive(Debug, Clone, PartialEq)]
pub struct BookDetails {
    pub book: Book,
    pub rating: Option<AvgRating>,
}

/// Action client borrowing a [`Session`].
#[derive(Debug, Clone, Copy)]
pub struct Library<'s> {
    session: &'s Session,
}

impl<'s> Library<'s> {
    pub fn new(session: &'s Session) -> Self {
        Self { session }
    }

    /// Fetch one book and its average rating.
    pub async fn book_details(&self, id: ItemId) -> Result<BookDetails, ClientError> {
        let response = self.session.send(requests::book(id)).await?;
        let book: Book = response.expect_status(StatusCode::OK)?.json()?;
        let rating = self.average_rating(id).await?;
        Ok(BookDetails { book, rating })
    }

    /// Average rating of a book; `None` when nobody rated it yet.
    pub async fn average_rating(&self, book_id: ItemId) -> Result<Option<AvgRating>, ClientError> {
        let response = self.session.send(requests::average_rating(book_id)).await?;
        if response.status_code == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        Ok(Some(response.expect_status(StatusCode::OK)?.json()?))
    }

    pub async fn ratings(&self, book_id: ItemId) -> Result<Vec<Rating>, ClientError> {
        let response = self.session.send(requests::ratings(book_id)).await?;
        response.expect_status(StatusCode::OK)?.json()
    }

    pub async fn add_rating(&self, input: &RatingInput) -> Result<(), ClientError> {
        let response = self
            .session
            .send_authenticated(requests::add_rating(input)?)
            .await?;
        response.expect_status(StatusCode::CREATED)?;
        info!(book_id = %input.book_id, "rating added");
        Ok(())
    }

    pub async fn add_favorite(&self, book_id: ItemId) -> Result<(), ClientError> {
        let response = self
            .session
            .send_authenticated(requests::add_favorite(book_id)?)
            .await?;
        response.expect_status(StatusCode::CREATED)?;
        info!(%book_id, "book added to favorites");
        Ok(())
    }

    pub async fn reserve(&self, book_id: ItemId) -> Result<(), ClientError> {
        let response = self
            .session
            .send_authenticated(requests::reserve(book_id)?)
            .await?;
        response.expect_status(StatusCode::CREATED)?;
        info!(%book_id, "book reserved");
        Ok(())
    }

    /// List the reader's reservations, replacing the reservations row index.
    pub async fn reservations(
        &self,
        browser: &Browser<Reservation>,
    ) -> Result<Page<Reservation>, ClientError> {
        let response = self
            .session
            .send_authenticated(requests::reservations())
            .await?;
        browser.accept_unpaged(&response)
    }

    pub async fn extend_reservation(&self, reservation_id: ItemId) -> Result<(), ClientError> {
        let response = self
            .session
            .send_authenticated(requests::extend_reservation(reservation_id)?)
            .await?;
        response.expect_status(StatusCode::OK)?;
        info!(%reservation_id, "reservation extended");
        Ok(())
    }

    pub async fn create_lib_card(&self) -> Result<(), ClientError> {
        let response = self
            .session
            .send_authenticated(requests::create_lib_card())
            .await?;
        response.expect_status(StatusCode::CREATED)?;
        Ok(())
    }

    pub async fn update_lib_card(&self) -> Result<(), ClientError> {
        let response = self
            .session
            .send_authenticated(requests::update_lib_card())
            .await?;
        response.expect_status(StatusCode::OK)?;
        Ok(())
    }

    pub async fn lib_card(&self) -> Result<LibCard, ClientError> {
        let response = self.session.send_authenticated(requests::lib_card()).await?;
        response.expect_status(StatusCode::OK)?.json()
    }

    /// Add a book to the catalog (administrators only).
    pub async fn add_book(&self, book: &NewBook) -> Result<(), ClientError> {
        let response = self
            .session
            .send_authenticated(requests::add_book(book)?)
            .await?;
        response.expect_status(StatusCode::CREATED)?;
        info!(title = %book.title, "book added");
        Ok(())
    }

    /// Delete a book (administrators only).
    ///
    /// Refused with [`ClientError::Conflict`] while any reservation of the
    /// book exists.
    pub async fn delete_book(&self, book_id: ItemId) -> Result<(), ClientError> {
        self.ensure_not_reserved(book_id).await?;

        let response = self
            .session
            .send_authenticated(requests::delete_book(book_id))
            .await?;
        response.expect_status(StatusCode::OK)?;
        info!(%book_id, "book deleted");
        Ok(())
    }

    async fn ensure_not_reserved(&self, book_id: ItemId) -> Result<(), ClientError> {
        let response = self
            .session
            .send_authenticated(requests::reservations_for_book(book_id))
            .await?;
        if response.status_code == StatusCode::NOT_FOUND {
            return Ok(());
        }
        let reservations: Vec<Reservation> = response.expect_status(StatusCode::OK)?.json()?;
        if !reservations.is_empty() {
            return Err(ClientError::Conflict {
                message: "this book cannot be deleted, it is reserved".to_string(),
            });
        }
        Ok(())
    }
}

impl Session {
    /// Action client for this session.
    pub fn library(&self) -> Library<'_> {
        Library::new(self)
    }
}
