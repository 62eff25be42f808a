//! Offset pagination with opaque page tokens.
//!
//! A page token is the URL-safe base64 encoding of `offset:<n>`. Clients
//! must treat it as opaque. An empty `next_page_token` means there are no
//! further results.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;

use crate::error::{FleetError, FleetResult};

/// Page size used when the request asks for zero or a negative size.
pub const DEFAULT_PAGE_SIZE: u64 = 10;

/// Upper bound on a single page.
pub const MAX_PAGE_SIZE: u64 = 1000;

const TOKEN_PREFIX: &str = "offset:";

/// Offset/limit pair handed to repositories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub offset: u64,
    pub limit: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

/// A decoded list request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub offset: u64,
    pub page_size: u64,
}

impl PageRequest {
    /// Decode wire-level `page_size` / `page_token`.
    pub fn from_wire(page_size: i32, page_token: &str) -> FleetResult<Self> {
        let page_size = if page_size <= 0 {
            DEFAULT_PAGE_SIZE
        } else {
            (page_size as u64).min(MAX_PAGE_SIZE)
        };
        let offset = if page_token.is_empty() {
            0
        } else {
            decode_token(page_token)?
        };
        Ok(Self { offset, page_size })
    }

    /// Fetch one row more than the page size to detect a following page.
    pub fn probe(&self) -> Pagination {
        Pagination {
            offset: self.offset,
            limit: self.page_size + 1,
        }
    }

    /// Trim the probe overflow and compute the next token.
    pub fn finish<T>(&self, mut items: Vec<T>) -> Page<T> {
        let has_more = items.len() as u64 > self.page_size;
        items.truncate(self.page_size as usize);
        let next_page_token = if has_more {
            encode_token(self.offset + self.page_size)
        } else {
            String::new()
        };
        Page {
            items,
            next_page_token,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_page_token: String,
}

pub fn encode_token(offset: u64) -> String {
    URL_SAFE_NO_PAD.encode(format!("{TOKEN_PREFIX}{offset}"))
}

fn decode_token(token: &str) -> FleetResult<u64> {
    let invalid = || FleetError::Validation {
        message: "invalid page_token".into(),
    };
    let raw = URL_SAFE_NO_PAD.decode(token).map_err(|_| invalid())?;
    let raw = String::from_utf8(raw).map_err(|_| invalid())?;
    raw.strip_prefix(TOKEN_PREFIX)
        .and_then(|n| n.parse::<u64>().ok())
        .ok_or_else(invalid)
}
