//! Deduplicated resolver warnings.
//!
//! A single bad declaration or selector can be hit once per matching node,
//! so every distinct message is reported only once per resolution run.
//! Messages go through the [`log`] facade with a `marten::<component>` target.

use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

/// Global set of warnings we've already reported (to deduplicate)
static WARNED: Mutex<Option<HashSet<String>>> = Mutex::new(None);

/// Warn about a recoverable failure (logged once per unique message)
///
/// # Example
/// ```
/// marten_common::warning::warn_once("CSS", "unknown unit in width: 3pt");
/// ```
pub fn warn_once(component: &str, message: &str) {
    let key = format!("[{component}] {message}");
    let should_log = WARNED
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .get_or_insert_with(HashSet::new)
        .insert(key);

    if should_log {
        log::warn!(target: "marten", "[{component}] {message}");
    }
}

/// Clear all recorded warnings (call when resolving a new document)
pub fn clear_warnings() {
    let mut guard = WARNED.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(set) = guard.as_mut() {
        set.clear();
    }
}

/// Returns `true` if the given message has already been reported.
#[must_use]
pub fn was_warned(component: &str, message: &str) -> bool {
    let key = format!("[{component}] {message}");
    WARNED
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .as_ref()
        .is_some_and(|set| set.contains(&key))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warn_once_records_message() {
        warn_once("TEST", "recorded once");
        assert!(was_warned("TEST", "recorded once"));
        assert!(!was_warned("TEST", "never reported"));
    }
}
