pub mod category_queries;
pub mod product_queries;
pub mod slide_queries;
pub mod user_queries;

const MAX_PAGE_SIZE: i64 = 100;

/// Returns (page, per_page, offset) with sane bounds.
pub(crate) fn page_params(
    page: Option<i64>,
    per_page: Option<i64>,
    default_per_page: i64,
) -> (i64, i64, i64) {
    let page = page.unwrap_or(1).max(1);
    let per_page = per_page
        .unwrap_or(default_per_page)
        .clamp(1, MAX_PAGE_SIZE);
    (page, per_page, (page - 1) * per_page)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_page_params() {
        assert_eq!(page_params(None, None, 12), (1, 12, 0));
        assert_eq!(page_params(Some(3), Some(15), 12), (3, 15, 30));
        assert_eq!(page_params(Some(0), Some(0), 12), (1, 1, 0));
        assert_eq!(page_params(Some(2), Some(1000), 12), (2, 100, 100));
    }
}
