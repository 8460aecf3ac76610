/// One entry of the page-number control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageControl {
    Page(usize),
    Ellipsis,
}

const MAX_VISIBLE_PAGES: usize = 5;

/// Page numbers to render for `current` out of `total` pages.
pub fn page_window(current: usize, total: usize) -> Vec<PageControl> {
    use PageControl::{Ellipsis, Page};

    if total <= MAX_VISIBLE_PAGES {
        return (1..=total).map(Page).collect();
    }

    let mut controls = Vec::with_capacity(7);
    if current <= 3 {
        controls.extend((1..=4).map(Page));
        controls.push(Ellipsis);
        controls.push(Page(total));
    } else if current >= total - 2 {
        controls.push(Page(1));
        controls.push(Ellipsis);
        controls.extend((total - 3..=total).map(Page));
    } else {
        controls.push(Page(1));
        controls.push(Ellipsis);
        controls.extend((current - 1..=current + 1).map(Page));
        controls.push(Ellipsis);
        controls.push(Page(total));
    }

    controls
}
