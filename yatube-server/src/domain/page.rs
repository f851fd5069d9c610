/// Posts shown on every paginated listing.
pub const POSTS_PER_PAGE: usize = 10;

/// The page a client asked for through the `page` query parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageRequest {
    Number(i64),
    Last,
}

impl PageRequest {
    /// Missing or non-numeric values select the first page; `last` selects the last one.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some("last") => PageRequest::Last,
            Some(value) => PageRequest::Number(value.parse().unwrap_or(1)),
            None => PageRequest::Number(1),
        }
    }

    /// Stable textual form, used to key cached pages.
    pub fn cache_token(&self) -> String {
        match self {
            PageRequest::Number(n) if *n <= 1 => "1".to_string(),
            PageRequest::Number(n) => n.to_string(),
            PageRequest::Last => "last".to_string(),
        }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        PageRequest::Number(1)
    }
}

/// Offset/limit pair for one page of a listing of known size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub number: usize,
    pub total_pages: usize,
    pub total_items: usize,
    pub offset: usize,
    pub limit: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct Paginator {
    page_size: usize,
}

impl Default for Paginator {
    fn default() -> Self {
        Self::new(POSTS_PER_PAGE)
    }
}

impl Paginator {
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size: page_size.max(1),
        }
    }

    /// An empty listing still has one (empty) page.
    pub fn total_pages(&self, total_items: usize) -> usize {
        if total_items == 0 {
            1
        } else {
            total_items.div_ceil(self.page_size)
        }
    }

    /// Clamps the request into `1..=total_pages`: pages past the end resolve to
    /// the last page, non-positive numbers to the first.
    pub fn window(&self, total_items: usize, request: PageRequest) -> PageWindow {
        let total_pages = self.total_pages(total_items);
        let number = match request {
            PageRequest::Last => total_pages,
            PageRequest::Number(n) if n < 1 => 1,
            PageRequest::Number(n) => usize::try_from(n)
                .unwrap_or(usize::MAX)
                .min(total_pages),
        };
        let offset = (number - 1) * self.page_size;
        PageWindow {
            number,
            total_pages,
            total_items,
            offset,
            limit: self.page_size.min(total_items.saturating_sub(offset)),
        }
    }

    pub fn paginate<T>(&self, items: Vec<T>, request: PageRequest) -> Page<T> {
        let window = self.window(items.len(), request);
        let items = items
            .into_iter()
            .skip(window.offset)
            .take(window.limit)
            .collect();
        Page::new(items, window)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: usize,
    pub total_pages: usize,
    pub total_items: usize,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, window: PageWindow) -> Self {
        Self {
            items,
            number: window.number,
            total_pages: window.total_pages,
            total_items: window.total_items,
        }
    }

    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    pub fn has_next(&self) -> bool {
        self.number < self.total_pages
    }

    pub fn has_other_pages(&self) -> bool {
        self.has_previous() || self.has_next()
    }

    pub fn previous_number(&self) -> usize {
        self.number.saturating_sub(1).max(1)
    }

    pub fn next_number(&self) -> usize {
        (self.number + 1).min(self.total_pages)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbers(n: i32) -> Vec<i32> {
        (1..=n).collect()
    }

    #[test]
    fn splits_thirteen_items_into_ten_and_three() {
        let paginator = Paginator::default();

        let first = paginator.paginate(numbers(13), PageRequest::Number(1));
        assert_eq!(first.len(), 10);
        assert_eq!(first.total_pages, 2);
        assert!(!first.has_previous());
        assert!(first.has_next());

        let second = paginator.paginate(numbers(13), PageRequest::Number(2));
        assert_eq!(second.items, vec![11, 12, 13]);
        assert!(second.has_previous());
        assert!(!second.has_next());
    }

    #[test]
    fn out_of_range_page_resolves_to_last_page() {
        let paginator = Paginator::default();
        let last = paginator.paginate(numbers(13), PageRequest::Number(2));
        let far = paginator.paginate(numbers(13), PageRequest::Number(999));
        assert_eq!(far, last);
        assert_eq!(far.number, 2);
    }

    #[test]
    fn non_positive_page_is_first_page() {
        let paginator = Paginator::default();
        for n in [0, -1, i64::MIN] {
            let page = paginator.paginate(numbers(13), PageRequest::Number(n));
            assert_eq!(page.number, 1);
            assert_eq!(page.items, numbers(10));
        }
    }

    #[test]
    fn empty_listing_has_one_empty_page() {
        let page = Paginator::default().paginate(Vec::<i32>::new(), PageRequest::Number(5));
        assert_eq!(page.number, 1);
        assert_eq!(page.total_pages, 1);
        assert!(page.is_empty());
        assert!(!page.has_other_pages());
    }

    #[test]
    fn window_matches_in_memory_slice() {
        let window = Paginator::default().window(13, PageRequest::Last);
        assert_eq!(
            window,
            PageWindow {
                number: 2,
                total_pages: 2,
                total_items: 13,
                offset: 10,
                limit: 3,
            }
        );
    }

    #[test]
    fn parses_page_query_values() {
        assert_eq!(PageRequest::parse(None), PageRequest::Number(1));
        assert_eq!(PageRequest::parse(Some("3")), PageRequest::Number(3));
        assert_eq!(PageRequest::parse(Some("abc")), PageRequest::Number(1));
        assert_eq!(PageRequest::parse(Some("last")), PageRequest::Last);
        assert_eq!(PageRequest::Number(-4).cache_token(), "1");
    }
}
