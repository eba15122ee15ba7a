//! Keyset pagination shared by every list operation.
//!
//! A page request is "rows with `id > after_id`, at most `limit` of them".
//! Lists fetch `limit + 1` rows; the extra row only signals that another page
//! exists. The page token is the decimal id of the last row returned, so a
//! token stays valid while rows are inserted behind the cursor.

pub const DEFAULT_PAGE_SIZE: i64 = 50;
pub const MAX_PAGE_SIZE: i64 = 1000;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PaginationError {
    #[error("invalid page token")]
    InvalidToken,

    #[error("invalid page size {0:?}")]
    InvalidPageSize(String),
}

/// Decoded pagination parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub after_id: i64,
    pub limit: i64,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            after_id: 0,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_page_token: Option<String>,
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            next_page_token: self.next_page_token,
        }
    }
}

impl PageRequest {
    /// Row limit to pass to the store: one more than the page size.
    pub const fn fetch_limit(self) -> i64 {
        self.limit.saturating_add(1)
    }

    /// Trim rows fetched with [`fetch_limit`](Self::fetch_limit) to a page,
    /// emitting a next-page token if the extra row came back.
    pub fn finish<T>(self, mut rows: Vec<T>, id_of: impl Fn(&T) -> i64) -> Page<T> {
        let limit = usize::try_from(self.limit).unwrap_or(usize::MAX);
        let next_page_token = if rows.len() > limit {
            rows.truncate(limit);
            rows.last().map(|row| encode_page_token(id_of(row)))
        } else {
            None
        };

        Page {
            items: rows,
            next_page_token,
        }
    }
}

/// Decode the `pageToken` and `pageSize` request parameters.
///
/// Empty values count as absent. An absent size means
/// [`DEFAULT_PAGE_SIZE`]; sizes below 1 are rejected and sizes above
/// [`MAX_PAGE_SIZE`] are clamped.
pub fn parse_pagination(
    page_token: Option<&str>,
    page_size: Option<&str>,
) -> Result<PageRequest, PaginationError> {
    let after_id = match page_token.filter(|t| !t.is_empty()) {
        Some(token) => decode_page_token(token).ok_or(PaginationError::InvalidToken)?,
        None => 0,
    };

    let limit = match page_size.filter(|s| !s.is_empty()) {
        Some(size) => {
            let parsed: i64 = size
                .parse()
                .map_err(|_| PaginationError::InvalidPageSize(size.to_string()))?;
            if parsed < 1 {
                return Err(PaginationError::InvalidPageSize(size.to_string()));
            }
            parsed.min(MAX_PAGE_SIZE)
        }
        None => DEFAULT_PAGE_SIZE,
    };

    Ok(PageRequest { after_id, limit })
}

/// Encode the id of the last row on a page as the token for the next page.
pub fn encode_page_token(id: i64) -> String {
    id.to_string()
}

/// Decode a page token. `None` for anything that is not a non-negative
/// decimal id.
pub fn decode_page_token(token: &str) -> Option<i64> {
    token.parse::<i64>().ok().filter(|id| *id >= 0)
}
