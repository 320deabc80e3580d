//! Request builders for each library-service action.
//!
//! Every function here is pure: it returns the [`RequestSpec`] for one call
//! without touching the network or the session. Authentication and timeouts
//! are applied by the caller.

use crate::model::{ItemId, NewBook, RatingInput, Role, SignInRequest, SignUpRequest};
use crate::request::{RequestSpec, TransportError};

pub const SIGN_UP_PATH: &str = "/auth/sign-up";
pub const BOOKS_PATH: &str = "/books";
pub const RATINGS_PATH: &str = "/ratings";
pub const AVG_RATING_PATH: &str = "/ratings/avg";
pub const FAVORITES_PATH: &str = "/api/favorites";
pub const RATE_PATH: &str = "/api/ratings";
pub const RESERVATIONS_PATH: &str = "/api/reservations";
pub const LIB_CARDS_PATH: &str = "/api/lib-cards";
pub const ADMIN_BOOKS_PATH: &str = "/api/admin/books";
pub const ADMIN_RESERVATIONS_PATH: &str = "/api/admin/reservations";

pub fn sign_up(request: &SignUpRequest) -> Result<RequestSpec, TransportError> {
    RequestSpec::post(SIGN_UP_PATH).json(request)
}

pub fn sign_in(request: &SignInRequest, role: Role) -> Result<RequestSpec, TransportError> {
    RequestSpec::post(role.sign_in_path()).json(request)
}

pub fn book(id: ItemId) -> RequestSpec {
    RequestSpec::get(format!("{BOOKS_PATH}/{id}"))
}

pub fn average_rating(book_id: ItemId) -> RequestSpec {
    RequestSpec::get(AVG_RATING_PATH).query("book_id", book_id.to_string())
}

pub fn ratings(book_id: ItemId) -> RequestSpec {
    RequestSpec::get(RATINGS_PATH).query("book_id", book_id.to_string())
}

pub fn add_rating(input: &RatingInput) -> Result<RequestSpec, TransportError> {
    RequestSpec::post(RATE_PATH).json(input)
}

/// The body is the bare book id.
pub fn add_favorite(book_id: ItemId) -> Result<RequestSpec, TransportError> {
    RequestSpec::post(FAVORITES_PATH).json(&book_id)
}

/// The body is the bare book id.
pub fn reserve(book_id: ItemId) -> Result<RequestSpec, TransportError> {
    RequestSpec::post(RESERVATIONS_PATH).json(&book_id)
}

pub fn reservations() -> RequestSpec {
    RequestSpec::get(RESERVATIONS_PATH)
}

pub fn extend_reservation(reservation_id: ItemId) -> Result<RequestSpec, TransportError> {
    RequestSpec::put(format!("{RESERVATIONS_PATH}/{reservation_id}")).json(&reservation_id)
}

pub fn create_lib_card() -> RequestSpec {
    RequestSpec::post(LIB_CARDS_PATH)
}

pub fn update_lib_card() -> RequestSpec {
    RequestSpec::put(LIB_CARDS_PATH)
}

pub fn lib_card() -> RequestSpec {
    RequestSpec::get(LIB_CARDS_PATH)
}

pub fn add_book(book: &NewBook) -> Result<RequestSpec, TransportError> {
    RequestSpec::post(ADMIN_BOOKS_PATH).json(book)
}

pub fn delete_book(book_id: ItemId) -> RequestSpec {
    RequestSpec::delete(format!("{ADMIN_BOOKS_PATH}/{book_id}"))
}

pub fn reservations_for_book(book_id: ItemId) -> RequestSpec {
    RequestSpec::get(ADMIN_RESERVATIONS_PATH).query("book_id", book_id.to_string())
}
