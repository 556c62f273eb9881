//! Source of the current request's locale code.
//!
//! Detection (headers, session, user preference) belongs to the host
//! application; the library only needs the resolved code.

use std::sync::{PoisonError, RwLock};

pub trait RequestLocale: Send + Sync {
    fn current_locale(&self) -> String;
}

/// A request locale that can be changed at runtime, e.g. per request.
#[derive(Debug)]
pub struct SharedLocale {
    code: RwLock<String>,
}

impl SharedLocale {
    pub fn new(code: &str) -> Self {
        Self {
            code: RwLock::new(code.to_string()),
        }
    }

    pub fn set(&self, code: &str) {
        *self.code.write().unwrap_or_else(PoisonError::into_inner) = code.to_string();
    }
}

impl RequestLocale for SharedLocale {
    fn current_locale(&self) -> String {
        self.code
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl<F> RequestLocale for F
where
    F: Fn() -> String + Send + Sync,
{
    fn current_locale(&self) -> String {
        self()
    }
}
