//! Client-side search, filtering, sorting and pagination of backend
//! collection snapshots.

mod collections;
pub mod filter;
pub mod pagination;

use std::cmp::Ordering;

use tracing::debug;

use crate::fetch::LoadState;

pub use filter::SortOrder;
pub use pagination::{PageControl, page_window};

/// Value a row exposes for one sortable field.
#[derive(Debug, Clone, Copy)]
pub enum SortKey<'a> {
    /// Compared case-insensitively. Missing values sort as the empty string.
    Text(Option<&'a str>),
    /// Missing counts sort as zero.
    Count(Option<u64>),
    Flag(bool),
    /// Missing or unparseable timestamps sort as the Unix epoch.
    Time(Option<jiff::Timestamp>),
}

impl SortKey<'_> {
    pub fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (SortKey::Text(a), SortKey::Text(b)) => {
                let a = a.unwrap_or_default().chars().flat_map(char::to_lowercase);
                let b = b.unwrap_or_default().chars().flat_map(char::to_lowercase);
                a.cmp(b)
            }
            (SortKey::Count(a), SortKey::Count(b)) => a.unwrap_or(0).cmp(&b.unwrap_or(0)),
            (SortKey::Flag(a), SortKey::Flag(b)) => a.cmp(b),
            (SortKey::Time(a), SortKey::Time(b)) => a
                .unwrap_or(jiff::Timestamp::UNIX_EPOCH)
                .cmp(&b.unwrap_or(jiff::Timestamp::UNIX_EPOCH)),
            // A field always yields the same variant.
            _ => Ordering::Equal,
        }
    }
}

/// Dimension filters of one collection.
pub trait ItemFilter<T> {
    type Dimension;

    /// Replaces a single dimension, leaving the others untouched.
    fn set(&mut self, dimension: Self::Dimension);

    /// Conjunction of every active dimension.
    fn matches(&self, item: &T) -> bool;
}

/// A row type that can be shown through a [`ListController`].
pub trait Listable: Sized {
    type SortBy: Copy + PartialEq + std::fmt::Debug;
    type Filter: ItemFilter<Self> + Default;

    const DEFAULT_SORT_BY: Self::SortBy;
    const DEFAULT_SORT_ORDER: SortOrder = SortOrder::Desc;

    /// Strings matched by the free-text search.
    fn search_fields(&self) -> impl Iterator<Item = &str>;

    fn sort_key(&self, by: Self::SortBy) -> SortKey<'_>;
}

/// One page of the filtered and sorted collection.
#[derive(Debug)]
pub struct VisiblePage<'a, T> {
    pub items: Vec<&'a T>,
    /// 1-based; always within `1..=total_pages` when there are pages.
    pub current_page: usize,
    /// `ceil(total_items / items_per_page)`, zero for an empty result.
    pub total_pages: usize,
    /// Size of the filtered set.
    pub total_items: usize,
    /// 1-based index of the first row shown, zero when empty.
    pub first_index: usize,
    /// 1-based index of the last row shown, zero when empty.
    pub last_index: usize,
}

impl<T> VisiblePage<'_, T> {
    pub fn window(&self) -> Vec<PageControl> {
        page_window(self.current_page, self.total_pages)
    }
}

/// What the caller should render.
#[derive(Debug)]
pub enum ListView<'a, T> {
    Loading,
    Failed(&'a str),
    /// Loaded, but nothing survived the search and filters.
    Empty { query: Option<&'a str> },
    Page(VisiblePage<'a, T>),
}

/// Search, filter, sort and page state for one list view.
pub struct ListController<T: Listable> {
    items: LoadState<Vec<T>>,
    search_query: String,
    filter: T::Filter,
    sort_by: T::SortBy,
    sort_order: SortOrder,
    current_page: usize,
    items_per_page: usize,
}

impl<T: Listable> ListController<T> {
    pub fn new(items_per_page: usize) -> Self {
        Self {
            items: LoadState::Idle,
            search_query: String::new(),
            filter: T::Filter::default(),
            sort_by: T::DEFAULT_SORT_BY,
            sort_order: T::DEFAULT_SORT_ORDER,
            current_page: 1,
            items_per_page: items_per_page.max(1),
        }
    }

    pub fn with_items(items_per_page: usize, items: Vec<T>) -> Self {
        let mut controller = Self::new(items_per_page);
        controller.set_items(items);
        controller
    }

    pub fn begin_loading(&mut self) {
        self.items = LoadState::Loading;
    }

    /// Replaces the snapshot, keeping search, filter and sort.
    pub fn set_items(&mut self, items: Vec<T>) {
        self.items = LoadState::Loaded(items);
        self.clamp_page();
    }

    pub fn set_failed<S: Into<String>>(&mut self, message: S) {
        self.items = LoadState::Failed(message.into());
    }

    pub fn load_state(&self) -> &LoadState<Vec<T>> {
        &self.items
    }

    pub fn search_query(&self) -> &str {
        &self.search_query
    }

    pub fn sort(&self) -> (T::SortBy, SortOrder) {
        (self.sort_by, self.sort_order)
    }

    pub fn filter(&self) -> &T::Filter {
        &self.filter
    }

    pub fn items_per_page(&self) -> usize {
        self.items_per_page
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn set_search_query<S: Into<String>>(&mut self, query: S) {
        self.search_query = query.into();
        self.current_page = 1;
    }

    /// Column-click semantics: the active field toggles direction, a new
    /// field starts ascending.
    pub fn set_sort(&mut self, by: T::SortBy) {
        if self.sort_by == by {
            self.sort_order = self.sort_order.toggled();
        } else {
            self.sort_by = by;
            self.sort_order = SortOrder::Asc;
        }
        debug!(sort_by = ?self.sort_by, sort_order = ?self.sort_order, "sort changed");
    }

    pub fn set_sort_explicit(&mut self, by: T::SortBy, order: SortOrder) {
        self.sort_by = by;
        self.sort_order = order;
    }

    pub fn set_filter(&mut self, dimension: <T::Filter as ItemFilter<T>>::Dimension) {
        self.filter.set(dimension);
        self.current_page = 1;
    }

    pub fn set_page(&mut self, page: usize) {
        self.current_page = page;
        self.clamp_page();
    }

    pub fn next_page(&mut self) {
        self.set_page(self.current_page.saturating_add(1));
    }

    pub fn prev_page(&mut self) {
        self.set_page(self.current_page.saturating_sub(1));
    }

    pub fn total_pages(&self) -> usize {
        self.filtered().len().div_ceil(self.items_per_page)
    }

    /// Search, then each filter dimension, then a stable sort.
    pub fn filtered(&self) -> Vec<&T> {
        let items = match &self.items {
            LoadState::Loaded(items) => items.as_slice(),
            _ => &[],
        };

        let needle = self.search_query.to_lowercase();
        let mut rows: Vec<&T> = items
            .iter()
            .filter(|item| {
                needle.is_empty()
                    || item
                        .search_fields()
                        .any(|field| field.to_lowercase().contains(&needle))
            })
            .filter(|item| self.filter.matches(item))
            .collect();

        // `sort_by` is stable, so equal keys keep their snapshot order.
        rows.sort_by(|a, b| {
            let ord = a
                .sort_key(self.sort_by)
                .compare(&b.sort_key(self.sort_by));
            self.sort_order.apply(ord)
        });

        rows
    }

    pub fn visible_page(&self) -> VisiblePage<'_, T> {
        let rows = self.filtered();
        let total_items = rows.len();
        let total_pages = total_items.div_ceil(self.items_per_page);
        let current_page = self.current_page.clamp(1, total_pages.max(1));

        let start = (current_page - 1) * self.items_per_page;
        let items: Vec<&T> = rows
            .into_iter()
            .skip(start)
            .take(self.items_per_page)
            .collect();

        let (first_index, last_index) = if items.is_empty() {
            (0, 0)
        } else {
            (start + 1, start + items.len())
        };

        VisiblePage {
            items,
            current_page,
            total_pages,
            total_items,
            first_index,
            last_index,
        }
    }

    pub fn view(&self) -> ListView<'_, T> {
        match &self.items {
            LoadState::Idle | LoadState::Loading => ListView::Loading,
            LoadState::Failed(message) => ListView::Failed(message.as_str()),
            LoadState::Loaded(_) => {
                let page = self.visible_page();
                if page.total_items == 0 {
                    let query = (!self.search_query.is_empty()).then_some(self.search_query.as_str());
                    ListView::Empty { query }
                } else {
                    ListView::Page(page)
                }
            }
        }
    }

    fn clamp_page(&mut self) {
        let total_pages = self.total_pages();
        self.current_page = self.current_page.clamp(1, total_pages.max(1));
    }
}
