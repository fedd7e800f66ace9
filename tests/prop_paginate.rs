use proptest::prelude::*;
use scoutlite::query::{PageRef, PageSpec, page_window, paginate};

proptest! {
    #[test]
    fn window_and_links_agree(total in 0usize..2_000, page in 1usize..60, limit in 1usize..120) {
        let spec = PageSpec::new(page, limit).unwrap();
        let w = page_window(&spec);
        prop_assert_eq!(w.skip, (page - 1) * limit);
        prop_assert_eq!(w.limit, limit);

        let p = paginate(total, &spec);
        let shown = total.saturating_sub(w.skip).min(limit);
        prop_assert_eq!(p.next.is_some(), w.skip + shown < total);
        prop_assert_eq!(p.previous, (page > 1).then_some(PageRef { page: page - 1, limit }));
        if let Some(next) = p.next {
            prop_assert_eq!(next, PageRef { page: page + 1, limit });
            prop_assert_eq!(shown, limit);
        }
    }

    #[test]
    fn pages_cover_every_item_once(total in 0usize..500, limit in 1usize..40) {
        let mut seen = 0usize;
        let mut page = 1usize;
        loop {
            let spec = PageSpec::new(page, limit).unwrap();
            let w = page_window(&spec);
            seen += total.saturating_sub(w.skip).min(w.limit);
            match paginate(total, &spec).next {
                Some(next) => page = next.page,
                None => break,
            }
        }
        prop_assert_eq!(seen, total);
    }
}
