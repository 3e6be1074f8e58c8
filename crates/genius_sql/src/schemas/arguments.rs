pub const DEFAULT_PAGE_LIMIT: i64 = 10;
pub const MAX_PAGE_LIMIT: i64 = 100;
/// Highest page whose offset still fits in an i64 at any limit
pub const MAX_PAGE: i64 = i64::MAX / MAX_PAGE_LIMIT;

/// One-based pagination arguments, clamped to sane bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageArgs {
    pub page: i64,
    pub limit: i64,
}

impl PageArgs {
    pub fn new(page: Option<i64>, limit: Option<i64>) -> Self {
        PageArgs {
            page: page.unwrap_or(1).clamp(1, MAX_PAGE),
            limit: limit
                .unwrap_or(DEFAULT_PAGE_LIMIT)
                .clamp(1, MAX_PAGE_LIMIT),
        }
    }

    pub fn offset(&self) -> i64 {
        self.page.saturating_sub(1).saturating_mul(self.limit)
    }
}

impl Default for PageArgs {
    fn default() -> Self {
        PageArgs::new(None, None)
    }
}

#[derive(Debug, Clone, Default)]
pub struct RoleArgs {
    pub role_name: String,
    pub name: String,
    pub description: String,
    pub is_super: bool,
}
