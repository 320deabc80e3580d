//! Numbered menus.
//!
//! Every menu loops until `0` is chosen. Unknown numbers are reported and the
//! menu is shown again. A failed action prints its [`ClientError`] and returns
//! to the same menu; only a failure to read input ends the program.

use anyhow::Result;
use booksmart_core::{
    Book, BookFilter, Browser, ClientError, ItemId, NewBook, RatingInput, Reservation, Role,
    Session, SessionStatus, SignInRequest, SignUpRequest,
};
use tracing::debug;

use crate::prompt::Prompt;
use crate::render::{self, TableSink};

const MAIN_MENU: &str = "Main menu:
\t1 -- sign up
\t2 -- sign in as reader
\t3 -- sign in as administrator
\t4 -- view books catalog
\t0 -- exit program";

const ROLE_MENU: &str = "Main menu:
\t1 -- go to books catalog
\t2 -- go to library card
\t3 -- go to your reservations
\t0 -- log out";

const CATALOG_MENU: &str = "Catalog menu:
\t1 -- view books
\t2 -- next page
\t3 -- view info about book
\t4 -- add book to favorites
\t5 -- reserve book
\t6 -- view book ratings
\t7 -- add book rating
\t0 -- go to main menu";

const ADMIN_CATALOG_MENU: &str = "Admin's catalog menu:
\t1 -- view books
\t2 -- next page
\t3 -- view info about book
\t4 -- add book to favorites
\t5 -- reserve book
\t6 -- add new book
\t7 -- delete book
\t0 -- go to main menu";

const LIB_CARD_MENU: &str = "Library card menu:
\t1 -- create library card
\t2 -- update library card
\t3 -- view info library card
\t0 -- go to main menu";

const RESERVATIONS_MENU: &str = "Reservations menu:
\t1 -- view your reservations
\t2 -- update your reservation
\t0 -- go to main menu";

const MENU_ITEM: &str = "Input menu item";
const WRONG_ITEM: &str = "Wrong menu item!";

/// The interactive client.
pub struct App<P, S> {
    session: Session,
    prompt: P,
    sink: S,
}

impl<P: Prompt, S: TableSink> App<P, S> {
    pub fn new(session: Session, prompt: P, sink: S) -> Self {
        Self {
            session,
            prompt,
            sink,
        }
    }

    /// Run the main menu until the user exits.
    pub async fn run(&mut self) -> Result<()> {
        loop {
            self.sink.message(MAIN_MENU);
            let result = match self.prompt.int(MENU_ITEM)? {
                1 => self.sign_up().await,
                2 => self.sign_in(Role::Reader).await,
                3 => self.sign_in(Role::Admin).await,
                4 => self.catalog_menu(false).await,
                0 => {
                    self.session.sign_out().await;
                    return Ok(());
                }
                _ => {
                    self.sink.message(WRONG_ITEM);
                    continue;
                }
            };
            self.settle(result)?;
        }
    }

    /// Report a failed action and carry on; anything else is fatal.
    fn settle(&mut self, result: Result<()>) -> Result<()> {
        let err = match result {
            Ok(()) => return Ok(()),
            Err(err) => err,
        };
        match err.downcast::<ClientError>() {
            Ok(err) if err.is_cache_miss() => {
                debug!("{}", err);
                self.sink.message("Nothing to select yet, view the list first");
                Ok(())
            }
            Ok(err) => {
                self.sink.message(&err.to_string());
                Ok(())
            }
            Err(fatal) => Err(fatal),
        }
    }

    /// Ask until the answer fits in `T`.
    fn number<T: TryFrom<i64>>(&mut self, label: &str) -> Result<T> {
        loop {
            let value = self.prompt.int(label)?;
            match T::try_from(value) {
                Ok(n) => return Ok(n),
                Err(_) => self.sink.message(&format!("{} is out of range", value)),
            }
        }
    }

    async fn sign_up(&mut self) -> Result<()> {
        let request = SignUpRequest {
            fio: self.prompt.text("Input your FIO")?,
            phone_number: self.prompt.text("Input your phone number")?,
            age: self.number("Input your age")?,
            password: self.prompt.password("Input your password")?,
        };
        self.session.sign_up(&request).await?;
        self.sink.message("You have successfully signed up!");
        Ok(())
    }

    async fn sign_in(&mut self, role: Role) -> Result<()> {
        let request = SignInRequest {
            phone_number: self.prompt.text("Input your phone number")?,
            password: self.prompt.password("Input your password")?,
        };
        self.session.sign_in(&request, role).await?;
        self.sink.message("You have successfully signed in!");
        self.role_menu(role).await
    }

    async fn role_menu(&mut self, role: Role) -> Result<()> {
        loop {
            if self.session.status() == Some(SessionStatus::Expired) {
                self.session.sign_out().await;
                self.sink.message(&ClientError::SessionExpired.to_string());
                return Ok(());
            }

            self.sink.message(ROLE_MENU);
            let result = match self.prompt.int(MENU_ITEM)? {
                1 => self.catalog_menu(role == Role::Admin).await,
                2 => self.lib_card_menu().await,
                3 => self.reservations_menu().await,
                0 => {
                    self.session.sign_out().await;
                    self.sink.message("You have logged out");
                    return Ok(());
                }
                _ => {
                    self.sink.message(WRONG_ITEM);
                    continue;
                }
            };
            self.settle(result)?;
        }
    }

    async fn catalog_menu(&mut self, admin: bool) -> Result<()> {
        let catalog = self.session.catalog();
        catalog.enter();
        let result = self.catalog_loop(&catalog, admin).await;
        catalog.exit();
        result
    }

    async fn catalog_loop(&mut self, catalog: &Browser<Book>, admin: bool) -> Result<()> {
        loop {
            self.sink
                .message(if admin { ADMIN_CATALOG_MENU } else { CATALOG_MENU });
            let result = match (self.prompt.int(MENU_ITEM)?, admin) {
                (0, _) => return Ok(()),
                (1, _) => self.first_page(catalog).await,
                (2, _) => self.next_page(catalog).await,
                (3, _) => self.view_book(catalog).await,
                (4, _) => self.add_favorite(catalog).await,
                (5, _) => self.reserve(catalog).await,
                (6, false) => self.view_ratings(catalog).await,
                (7, false) => self.add_rating(catalog).await,
                (6, true) => self.add_book().await,
                (7, true) => self.delete_book(catalog).await,
                _ => {
                    self.sink.message(WRONG_ITEM);
                    continue;
                }
            };
            self.settle(result)?;
        }
    }

    fn book_filter(&mut self) -> Result<BookFilter> {
        Ok(BookFilter {
            title: self.prompt.text("Title (empty for any)")?,
            author: self.prompt.text("Author (empty for any)")?,
            publisher: self.prompt.text("Publisher (empty for any)")?,
            copies_number: self.number("Copies number (0 for any)")?,
            rarity: self.prompt.text("Rarity (empty for any)")?,
            genre: self.prompt.text("Genre (empty for any)")?,
            publishing_year: self.number("Publishing year (0 for any)")?,
            language: self.prompt.text("Language (empty for any)")?,
            age_limit: self.number("Age limit (0 for any)")?,
        })
    }

    async fn first_page(&mut self, catalog: &Browser<Book>) -> Result<()> {
        let filter = if self.prompt.confirm("Search with parameters?")? {
            self.book_filter()?
        } else {
            BookFilter::default()
        };
        let page = catalog.fetch_first_page(filter.to_query()).await?;
        if page.items.is_empty() {
            self.sink.message("No books found");
        } else {
            render::books(&mut self.sink, &page);
        }
        Ok(())
    }

    async fn next_page(&mut self, catalog: &Browser<Book>) -> Result<()> {
        let page = catalog.fetch_next_page().await?;
        if page.items.is_empty() {
            self.sink.message("No more books");
        } else {
            render::books(&mut self.sink, &page);
        }
        Ok(())
    }

    /// Ask for a row number of the current page.
    fn select_book(&mut self, catalog: &Browser<Book>) -> Result<(i64, ItemId)> {
        let row = self.prompt.int("Input book number")?;
        let id = catalog.resolve_row(row)?;
        Ok((row, id))
    }

    async fn view_book(&mut self, catalog: &Browser<Book>) -> Result<()> {
        let (row, id) = self.select_book(catalog)?;
        let details = self.session.library().book_details(id).await?;
        render::book_details(&mut self.sink, row, &details);
        Ok(())
    }

    async fn add_favorite(&mut self, catalog: &Browser<Book>) -> Result<()> {
        let (_, id) = self.select_book(catalog)?;
        self.session.library().add_favorite(id).await?;
        self.sink.message("Book successfully added to your favorites!");
        Ok(())
    }

    async fn reserve(&mut self, catalog: &Browser<Book>) -> Result<()> {
        let (_, id) = self.select_book(catalog)?;
        self.session.library().reserve(id).await?;
        self.sink.message("Book successfully reserved!");
        Ok(())
    }

    async fn view_ratings(&mut self, catalog: &Browser<Book>) -> Result<()> {
        let (_, id) = self.select_book(catalog)?;
        let ratings = self.session.library().ratings(id).await?;
        render::ratings(&mut self.sink, &ratings);
        Ok(())
    }

    async fn add_rating(&mut self, catalog: &Browser<Book>) -> Result<()> {
        let (_, book_id) = self.select_book(catalog)?;
        let input = RatingInput {
            book_id,
            review: self.prompt.text("Input your review")?,
            rating: self.number("Input your rating")?,
        };
        self.session.library().add_rating(&input).await?;
        self.sink.message("Rating was successfully added!");
        Ok(())
    }

    async fn add_book(&mut self) -> Result<()> {
        let book = NewBook {
            title: self.prompt.text("Title")?,
            author: self.prompt.text("Author")?,
            publisher: self.prompt.text("Publisher")?,
            copies_number: self.number("Copies number")?,
            rarity: self.prompt.text("Rarity")?,
            genre: self.prompt.text("Genre")?,
            publishing_year: self.number("Publishing year")?,
            language: self.prompt.text("Language")?,
            age_limit: self.number("Age limit")?,
        };
        self.session.library().add_book(&book).await?;
        self.sink.message("Book successfully added!");
        Ok(())
    }

    async fn delete_book(&mut self, catalog: &Browser<Book>) -> Result<()> {
        let (_, id) = self.select_book(catalog)?;
        self.session.library().delete_book(id).await?;
        self.sink.message("Book successfully deleted!");
        Ok(())
    }

    async fn lib_card_menu(&mut self) -> Result<()> {
        loop {
            self.sink.message(LIB_CARD_MENU);
            let result = match self.prompt.int(MENU_ITEM)? {
                1 => self.create_lib_card().await,
                2 => self.update_lib_card().await,
                3 => self.view_lib_card().await,
                0 => return Ok(()),
                _ => {
                    self.sink.message(WRONG_ITEM);
                    continue;
                }
            };
            self.settle(result)?;
        }
    }

    async fn create_lib_card(&mut self) -> Result<()> {
        self.session.library().create_lib_card().await?;
        self.sink.message("Library card successfully created!");
        Ok(())
    }

    async fn update_lib_card(&mut self) -> Result<()> {
        self.session.library().update_lib_card().await?;
        self.sink.message("Library card successfully updated!");
        Ok(())
    }

    async fn view_lib_card(&mut self) -> Result<()> {
        let card = self.session.library().lib_card().await?;
        render::lib_card(&mut self.sink, &card);
        Ok(())
    }

    async fn reservations_menu(&mut self) -> Result<()> {
        let browser = self.session.reservations();
        browser.enter();
        let result = self.reservations_loop(&browser).await;
        browser.exit();
        result
    }

    async fn reservations_loop(&mut self, browser: &Browser<Reservation>) -> Result<()> {
        loop {
            self.sink.message(RESERVATIONS_MENU);
            let result = match self.prompt.int(MENU_ITEM)? {
                1 => self.view_reservations(browser).await,
                2 => self.extend_reservation(browser).await,
                0 => return Ok(()),
                _ => {
                    self.sink.message(WRONG_ITEM);
                    continue;
                }
            };
            self.settle(result)?;
        }
    }

    async fn view_reservations(&mut self, browser: &Browser<Reservation>) -> Result<()> {
        let page = self.session.library().reservations(browser).await?;
        render::reservations(&mut self.sink, &page);
        Ok(())
    }

    async fn extend_reservation(&mut self, browser: &Browser<Reservation>) -> Result<()> {
        let row = self.prompt.int("Input reservation number")?;
        let id = browser.resolve_row(row)?;
        self.session.library().extend_reservation(id).await?;
        self.sink.message("Reservation successfully extended!");
        Ok(())
    }
}
