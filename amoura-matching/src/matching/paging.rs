use serde::ser::Serializer;
use serde::Serialize;

/// Fixed page size of the matches grid.
pub const PAGE_SIZE: usize = 16;

pub fn total_pages(len: usize) -> usize {
    (len + PAGE_SIZE - 1) / PAGE_SIZE
}

/// 1-based page slice; out-of-range pages are empty.
pub fn page<T>(items: &[T], page_number: usize) -> &[T] {
    if page_number == 0 {
        return &[];
    }
    let start = (page_number - 1).saturating_mul(PAGE_SIZE);
    if start >= items.len() {
        return &[];
    }
    let end = (start + PAGE_SIZE).min(items.len());
    &items[start..end]
}

/// One element of the page-number strip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageControl {
    Page(usize),
    Ellipsis,
}

impl Serialize for PageControl {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            PageControl::Page(n) => serializer.serialize_u64(*n as u64),
            PageControl::Ellipsis => serializer.serialize_str("..."),
        }
    }
}

/// Sliding-window page strip: every page when there are few, otherwise the
/// first and last page bracketing a current±1 window, with ellipses for the
/// gaps.
pub fn page_controls(total: usize, current: usize) -> Vec<PageControl> {
    const FULL_STRIP_MAX: usize = 7;

    if total == 0 {
        return vec![];
    }
    let current = current.clamp(1, total);

    if total <= FULL_STRIP_MAX {
        return (1..=total).map(PageControl::Page).collect();
    }

    let mut strip = vec![PageControl::Page(1)];

    let window_start = current.saturating_sub(1).max(2);
    let window_end = (current + 1).min(total - 1);

    if window_start > 2 {
        strip.push(PageControl::Ellipsis);
    }
    for n in window_start..=window_end {
        strip.push(PageControl::Page(n));
    }
    if window_end < total - 1 {
        strip.push(PageControl::Ellipsis);
    }

    strip.push(PageControl::Page(total));
    strip
}

#[cfg(test)]
mod tests {
    use super::*;
    use PageControl::{Ellipsis, Page};

    #[test]
    fn second_page_is_items_16_to_31() {
        let items: Vec<usize> = (0..40).collect();
        assert_eq!(page(&items, 2), (16..32).collect::<Vec<_>>().as_slice());
    }

    #[test]
    fn last_page_may_be_short() {
        let items: Vec<usize> = (0..40).collect();
        assert_eq!(page(&items, 3), (32..40).collect::<Vec<_>>().as_slice());
        assert!(page(&items, 4).is_empty());
        assert!(page(&items, 0).is_empty());
    }

    #[test]
    fn total_pages_is_ceiling() {
        assert_eq!(total_pages(0), 0);
        assert_eq!(total_pages(1), 1);
        assert_eq!(total_pages(16), 1);
        assert_eq!(total_pages(17), 2);
        assert_eq!(total_pages(48), 3);
    }

    #[test]
    fn short_strip_lists_every_page() {
        assert_eq!(
            page_controls(4, 2),
            vec![Page(1), Page(2), Page(3), Page(4)]
        );
        assert_eq!(page_controls(0, 1), vec![]);
    }

    #[test]
    fn long_strip_windows_around_current() {
        assert_eq!(
            page_controls(10, 5),
            vec![Page(1), Ellipsis, Page(4), Page(5), Page(6), Ellipsis, Page(10)]
        );
    }

    #[test]
    fn window_at_the_edges_drops_ellipses() {
        assert_eq!(
            page_controls(10, 1),
            vec![Page(1), Page(2), Ellipsis, Page(10)]
        );
        assert_eq!(
            page_controls(10, 10),
            vec![Page(1), Ellipsis, Page(9), Page(10)]
        );
    }

    #[test]
    fn out_of_range_current_is_clamped() {
        assert_eq!(page_controls(10, 99), page_controls(10, 10));
    }

    #[test]
    fn controls_serialize_as_numbers_and_ellipsis() {
        let json = serde_json::to_string(&page_controls(10, 5)).unwrap();
        assert_eq!(json, r#"[1,"...",4,5,6,"...",10]"#);
    }
}
