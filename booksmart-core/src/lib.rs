//! # BookSmart Core
//!
//! Session and pagination engine for the BookSmart library client.
//!
//! This crate provides:
//! - A declarative request pipeline over `reqwest`
//! - A typed in-memory session cache shared by the foreground and the
//!   background refresh task
//! - A cancellable token refresh loop
//! - A paginated browser that maps displayed row numbers back to item ids
//! - The session controller and the library-service actions built on it
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use booksmart_core::{Role, Session, SessionSettings, SignInRequest, Secret};
//!
//! async fn first_page() -> Result<(), booksmart_core::ClientError> {
//!     let mut session = Session::new(SessionSettings::default())?;
//!     let credentials = SignInRequest {
//!         phone_number: "+79990001122".to_string(),
//!         password: Secret::new("password"),
//!     };
//!     session.sign_in(&credentials, Role::Reader).await?;
//!
//!     let catalog = session.catalog();
//!     catalog.enter();
//!     let page = catalog.fetch_first_page(Default::default()).await?;
//!     let third = catalog.resolve_row(page.display_offset as i64 + 2)?;
//!     session.library().add_favorite(third).await?;
//!
//!     session.sign_out().await;
//!     Ok(())
//! }
//! ```

pub mod browser;
pub mod cache;
pub mod error;
pub mod library;
pub mod model;
pub mod refresh;
pub mod request;
pub mod requests;
pub mod session;
pub mod token;

// Re-export commonly used types at crate root
pub use browser::{Browser, IndexMap, Listed, Page, PageCursor, SelectionError};

pub use cache::{CacheError, CacheKey, Secret, SessionCache, keys};

pub use error::ClientError;

pub use library::{BookDetails, Library};

pub use model::{
    AvgRating,
    Book,
    BookFilter,
    ItemId,
    LibCard,
    NewBook,
    Rating,
    RatingInput,
    Reservation,
    Role,
    SignInRequest,
    SignUpRequest,
};

pub use refresh::{RefreshLoop, RefreshLoopHandle, RefreshPolicy, SessionStatus};

pub use request::{RequestExecutor, RequestSpec, ResponseEnvelope, TransportError, TransportErrorKind};

pub use session::{Session, SessionSettings};

pub use token::{HttpTokenRefresher, RefreshError, TokenPair, TokenRefresher};
