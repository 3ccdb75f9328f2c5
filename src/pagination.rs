//! Page slicing for feeds.
//!
//! Page numbers are 1-based. [`Paginator::get_page`] is lenient: a missing or
//! garbled number gives the first page and anything out of range gives the
//! last one. [`Paginator::page`] is the strict variant.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PaginationError {
    #[error("That page number is less than 1")]
    LessThanOne,
    #[error("That page contains no results")]
    NoResults,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginator {
    count: u64,
    per_page: u32,
}

/// The part of a list that makes up one page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub number: u32,
    pub num_pages: u32,
    pub count: u64,
    pub offset: u64,
    pub limit: u32,
}

impl Paginator {
    pub fn new(count: u64, per_page: u32) -> Self {
        Self {
            count,
            per_page: per_page.max(1),
        }
    }

    pub fn num_pages(&self) -> u32 {
        if self.count == 0 {
            // an empty list still renders one empty page
            return 1;
        }
        let per_page = u64::from(self.per_page);
        ((self.count + per_page - 1) / per_page) as u32
    }

    pub fn page(&self, number: i64) -> Result<PageWindow, PaginationError> {
        if number < 1 {
            return Err(PaginationError::LessThanOne);
        }
        let num_pages = self.num_pages();
        if number > i64::from(num_pages) {
            return Err(PaginationError::NoResults);
        }
        let number = number as u32;
        let offset = u64::from(number - 1) * u64::from(self.per_page);
        let limit = (self.count - offset).min(u64::from(self.per_page)) as u32;
        Ok(PageWindow {
            number,
            num_pages,
            count: self.count,
            offset,
            limit,
        })
    }

    pub fn get_page(&self, raw: Option<&str>) -> PageWindow {
        let number = requested_page(raw);
        match self.page(i64::from(number)) {
            Ok(window) => window,
            Err(_) => self.last_page(),
        }
    }

    fn last_page(&self) -> PageWindow {
        match self.page(i64::from(self.num_pages())) {
            Ok(window) => window,
            Err(_) => unreachable!("the last page always exists"),
        }
    }
}

/// Normalizes a raw `?page=` value. Non-numeric input reads as page 1,
/// numbers below 1 are kept so the paginator can clamp them.
pub fn requested_page(raw: Option<&str>) -> i32 {
    raw.and_then(|value| value.trim().parse::<i32>().ok())
        .unwrap_or(1)
}

impl PageWindow {
    pub fn has_next(&self) -> bool {
        self.number < self.num_pages
    }

    pub fn has_previous(&self) -> bool {
        self.number > 1
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: u32,
    pub num_pages: u32,
    pub count: u64,
    pub has_next: bool,
    pub has_previous: bool,
    pub next_page_number: Option<u32>,
    pub previous_page_number: Option<u32>,
}

impl<T> Page<T> {
    pub fn from_window(window: PageWindow, items: Vec<T>) -> Self {
        Page {
            items,
            number: window.number,
            num_pages: window.num_pages,
            count: window.count,
            has_next: window.has_next(),
            has_previous: window.has_previous(),
            next_page_number: window.has_next().then(|| window.number + 1),
            previous_page_number: window.has_previous().then(|| window.number - 1),
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            number: self.number,
            num_pages: self.num_pages,
            count: self.count,
            has_next: self.has_next,
            has_previous: self.has_previous,
            next_page_number: self.next_page_number,
            previous_page_number: self.previous_page_number,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Slices an in-memory list into the page named by `page_number`.
pub fn paginate<T>(items: Vec<T>, page_size: u32, page_number: Option<&str>) -> Page<T> {
    let window = Paginator::new(items.len() as u64, page_size).get_page(page_number);
    let items = items
        .into_iter()
        .skip(window.offset as usize)
        .take(window.limit as usize)
        .collect();
    Page::from_window(window, items)
}
