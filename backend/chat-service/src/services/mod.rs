pub mod chat_service;
pub mod message_service;
pub mod user_service;

const DEFAULT_PAGE_SIZE: i64 = 50;
const MAX_PAGE_SIZE: i64 = 100;

/// Clamp caller-supplied pagination into sane bounds.
pub fn clamp_page(limit: Option<i64>, offset: Option<i64>) -> (i64, i64) {
    let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    let offset = offset.unwrap_or(0).max(0);
    (limit, offset)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_page_defaults() {
        assert_eq!(clamp_page(None, None), (50, 0));
    }

    #[test]
    fn test_clamp_page_bounds() {
        assert_eq!(clamp_page(Some(0), Some(-5)), (1, 0));
        assert_eq!(clamp_page(Some(1000), Some(20)), (100, 20));
        assert_eq!(clamp_page(Some(25), Some(10)), (25, 10));
    }
}
