use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct PageMeta {
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub last_page: i64,
}

/// Paginated list envelope: `{ "data": [...], "meta": { ... } }`.
#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub meta: PageMeta,
}

impl<T> Page<T> {
    pub fn new(data: Vec<T>, total: i64, page: i64, per_page: i64) -> Self {
        let per_page = per_page.max(1);
        let last_page = if total == 0 {
            1
        } else {
            (total + per_page - 1) / per_page
        };

        Self {
            data,
            meta: PageMeta {
                total,
                page,
                per_page,
                last_page,
            },
        }
    }

    /// Transforms the rows into their response shape, keeping the meta.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            data: self.data.into_iter().map(f).collect(),
            meta: self.meta,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn computes_last_page() {
        assert_eq!(Page::new(vec![1, 2], 25, 1, 12).meta.last_page, 3);
        assert_eq!(Page::new(vec![1], 24, 2, 12).meta.last_page, 2);
        assert_eq!(Page::<i32>::new(vec![], 0, 1, 12).meta.last_page, 1);
    }
}
