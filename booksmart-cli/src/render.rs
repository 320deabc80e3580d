//! Plain-text output.

use booksmart_core::{Book, BookDetails, LibCard, Page, Rating, Reservation};

/// Destination for tables and one-line messages.
pub trait TableSink {
    fn table(&mut self, headers: &[&str], rows: Vec<Vec<String>>);
    fn message(&mut self, text: &str);
}

/// Writes to standard output.
#[derive(Debug, Default)]
pub struct StdoutSink;

impl TableSink for StdoutSink {
    fn table(&mut self, headers: &[&str], rows: Vec<Vec<String>>) {
        println!("\n{}", render_table(headers, &rows));
    }

    fn message(&mut self, text: &str) {
        println!("\n{}", text);
    }
}

/// Render rows as an aligned table with a header rule.
pub fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            let len = cell.chars().count();
            match widths.get_mut(i) {
                Some(w) => *w = (*w).max(len),
                None => widths.push(len),
            }
        }
    }

    let mut out = String::new();
    out.push_str(&format_line(headers.iter().copied(), &widths));
    out.push('\n');
    out.push_str(
        &widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("-+-"),
    );
    for row in rows {
        out.push('\n');
        out.push_str(&format_line(row.iter().map(String::as_str), &widths));
    }
    out
}

fn format_line<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    cells
        .zip(widths)
        .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
        .collect::<Vec<_>>()
        .join(" | ")
        .trim_end()
        .to_string()
}

pub fn books(sink: &mut dyn TableSink, page: &Page<Book>) {
    let rows = page
        .items
        .iter()
        .enumerate()
        .map(|(i, book)| {
            vec![
                (page.display_offset as usize + i).to_string(),
                book.title.clone(),
                book.author.clone(),
                book.publisher.clone(),
                book.copies_number.to_string(),
                book.rarity.clone(),
                book.genre.clone(),
                book.publishing_year.to_string(),
                book.language.clone(),
                book.age_limit.to_string(),
            ]
        })
        .collect();
    sink.table(
        &[
            "No", "Title", "Author", "Publisher", "Copies", "Rarity", "Genre", "Year", "Language",
            "Age limit",
        ],
        rows,
    );
    sink.message(&format!("Page {}", page.page_number));
}

pub fn book_details(sink: &mut dyn TableSink, row: i64, details: &BookDetails) {
    let book = &details.book;
    let rating = match details.rating {
        Some(avg) => format!("{:.1}", avg.avg_rating),
        None => "no ratings".to_string(),
    };
    let rows = vec![vec![
        row.to_string(),
        book.title.clone(),
        book.author.clone(),
        book.publisher.clone(),
        book.copies_number.to_string(),
        book.rarity.clone(),
        book.genre.clone(),
        book.publishing_year.to_string(),
        book.language.clone(),
        book.age_limit.to_string(),
        rating,
    ]];
    sink.table(
        &[
            "No", "Title", "Author", "Publisher", "Copies", "Rarity", "Genre", "Year", "Language",
            "Age limit", "Rating",
        ],
        rows,
    );
}

pub fn ratings(sink: &mut dyn TableSink, ratings: &[Rating]) {
    if ratings.is_empty() {
        sink.message("This book has no ratings yet");
        return;
    }
    let rows = ratings
        .iter()
        .enumerate()
        .map(|(i, r)| vec![i.to_string(), r.reader.clone(), r.review.clone(), r.rating.to_string()])
        .collect();
    sink.table(&["No", "Reader", "Review", "Rating"], rows);
}

pub fn reservations(sink: &mut dyn TableSink, page: &Page<Reservation>) {
    if page.items.is_empty() {
        sink.message("You have no reservations");
        return;
    }
    let rows = page
        .items
        .iter()
        .enumerate()
        .map(|(i, r)| {
            vec![
                (page.display_offset as usize + i).to_string(),
                r.issue_date.format("%Y-%m-%d").to_string(),
                r.return_date.format("%Y-%m-%d").to_string(),
                r.state.clone(),
            ]
        })
        .collect();
    sink.table(&["No", "Issued", "Return by", "State"], rows);
}

pub fn lib_card(sink: &mut dyn TableSink, card: &LibCard) {
    let status = if card.action_status { "active" } else { "expired" };
    sink.table(
        &["Number", "Issued", "Validity (days)", "Status"],
        vec![vec![
            card.lib_card_num.clone(),
            card.issue_date.format("%Y-%m-%d").to_string(),
            card.validity.to_string(),
            status.to_string(),
        ]],
    );
}

/// Collects output for assertions in menu tests.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct CaptureSink {
    pub tables: Vec<Vec<Vec<String>>>,
    pub messages: Vec<String>,
}

#[cfg(test)]
impl TableSink for CaptureSink {
    fn table(&mut self, _headers: &[&str], rows: Vec<Vec<String>>) {
        self.tables.push(rows);
    }

    fn message(&mut self, text: &str) {
        self.messages.push(text.to_string());
    }
}
