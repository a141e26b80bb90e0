use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use storage::dto::common::{DEFAULT_PAGE_SIZE, is_valid_page_size};
use time::Duration;

pub const PAGE_SIZE_COOKIE: &str = "page_size";
pub const FLASH_COOKIE: &str = "flash";

const PAGE_SIZE_MAX_AGE_DAYS: i64 = 30;

/// Page size remembered from an earlier visit, if it is usable.
pub fn page_size_preference(jar: &CookieJar) -> Option<i64> {
    jar.get(PAGE_SIZE_COOKIE)
        .and_then(|cookie| cookie.value().trim().parse().ok())
        .filter(|size| is_valid_page_size(*size))
}

/// Explicit request value, then the cookie, then the default.
pub fn resolve_page_size(requested: Option<i64>, jar: &CookieJar) -> i64 {
    requested
        .or_else(|| page_size_preference(jar))
        .unwrap_or(DEFAULT_PAGE_SIZE)
}

pub fn page_size_cookie(page_size: i64) -> Cookie<'static> {
    Cookie::build((PAGE_SIZE_COOKIE, page_size.to_string()))
        .path("/")
        .max_age(Duration::days(PAGE_SIZE_MAX_AGE_DAYS))
        .same_site(SameSite::Lax)
        .build()
}

/// One-shot notice shown on the next rendered page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flash {
    Added,
    Updated,
    Removed,
}

impl Flash {
    fn code(self) -> &'static str {
        match self {
            Self::Added => "added",
            Self::Updated => "updated",
            Self::Removed => "removed",
        }
    }

    fn from_code(code: &str) -> Option<Self> {
        match code {
            "added" => Some(Self::Added),
            "updated" => Some(Self::Updated),
            "removed" => Some(Self::Removed),
            _ => None,
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            Self::Added => "Catch added successfully!",
            Self::Updated => "Catch updated successfully!",
            Self::Removed => "Catch removed successfully!",
        }
    }
}

pub fn set_flash(jar: CookieJar, flash: Flash) -> CookieJar {
    jar.add(
        Cookie::build((FLASH_COOKIE, flash.code()))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .build(),
    )
}

/// Reads the pending flash, if any, and clears it.
pub fn take_flash(jar: CookieJar) -> (CookieJar, Option<Flash>) {
    let Some(flash) = jar.get(FLASH_COOKIE).map(|c| Flash::from_code(c.value())) else {
        return (jar, None);
    };

    let jar = jar.remove(Cookie::build(FLASH_COOKIE).path("/"));
    (jar, flash)
}
