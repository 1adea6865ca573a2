/// One link in a numbered pager
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageLink {
    Page(u32),
    Ellipsis,
}

/// Number of pages needed for `total` results, never less than one
pub fn total_pages(total: u64, limit: u32) -> u32 {
    let limit = u64::from(limit.max(1));
    let pages = total.div_ceil(limit).max(1);
    u32::try_from(pages).unwrap_or(u32::MAX)
}

/// Pages to show around `current`: first, last, the current page with
/// `siblings` neighbours on each side, and an ellipsis for every gap of more
/// than one page. A gap of exactly one page shows that page instead.
pub fn page_range(current: u32, total_pages: u32, siblings: u32) -> Vec<PageLink> {
    let total_pages = total_pages.max(1);
    let current = current.clamp(1, total_pages);

    let start = current.saturating_sub(siblings).max(1);
    let end = current.saturating_add(siblings).min(total_pages);

    let mut links = Vec::new();
    if start > 1 {
        links.push(PageLink::Page(1));
        match start {
            2 => {}
            3 => links.push(PageLink::Page(2)),
            _ => links.push(PageLink::Ellipsis),
        }
    }
    links.extend((start..=end).map(PageLink::Page));
    if end < total_pages {
        match total_pages - end {
            1 => {}
            2 => links.push(PageLink::Page(total_pages - 1)),
            _ => links.push(PageLink::Ellipsis),
        }
        links.push(PageLink::Page(total_pages));
    }
    links
}

#[cfg(test)]
mod tests {
    use super::PageLink::{Ellipsis, Page};
    use super::*;

    #[test]
    fn counts_pages() {
        assert_eq!(total_pages(0, 20), 1);
        assert_eq!(total_pages(20, 20), 1);
        assert_eq!(total_pages(21, 20), 2);
        assert_eq!(total_pages(5, 0), 5);
    }

    #[test]
    fn short_ranges_list_every_page() {
        assert_eq!(page_range(2, 3, 1), vec![Page(1), Page(2), Page(3)]);
        assert_eq!(page_range(1, 1, 2), vec![Page(1)]);
    }

    #[test]
    fn long_ranges_elide_gaps() {
        assert_eq!(
            page_range(10, 20, 1),
            vec![Page(1), Ellipsis, Page(9), Page(10), Page(11), Ellipsis, Page(20)]
        );
        assert_eq!(
            page_range(1, 20, 1),
            vec![Page(1), Page(2), Ellipsis, Page(20)]
        );
        assert_eq!(
            page_range(20, 20, 1),
            vec![Page(1), Ellipsis, Page(19), Page(20)]
        );
    }

    #[test]
    fn single_page_gaps_are_filled() {
        assert_eq!(
            page_range(4, 7, 1),
            vec![Page(1), Page(2), Page(3), Page(4), Page(5), Page(6), Page(7)]
        );
    }

    #[test]
    fn out_of_range_current_is_clamped() {
        assert_eq!(page_range(99, 3, 1), vec![Page(1), Page(2), Page(3)]);
    }
}
