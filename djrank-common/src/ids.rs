//! Performer identifier utilities
//!
//! Identifiers are opaque strings. Callers may supply their own; otherwise the
//! store derives one from the current epoch milliseconds. Derived ids are
//! strictly increasing within a process so two performers created in the same
//! millisecond still get distinct ids.

use std::sync::atomic::{AtomicI64, Ordering};

static LAST_ISSUED: AtomicI64 = AtomicI64::new(0);

/// Generate a new timestamp-derived identifier
pub fn generate() -> String {
    let now = crate::time::now_millis();
    let mut last = LAST_ISSUED.load(Ordering::Relaxed);
    loop {
        let next = if now > last { now } else { last + 1 };
        match LAST_ISSUED.compare_exchange_weak(last, next, Ordering::Relaxed, Ordering::Relaxed) {
            Ok(_) => return next.to_string(),
            Err(observed) => last = observed,
        }
    }
}

/// Normalize a caller-supplied identifier
///
/// Returns `None` for absent or blank ids so the store assigns one.
pub fn normalize(id: Option<&str>) -> Option<String> {
    id.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generated_ids_are_unique() {
        let ids: HashSet<String> = (0..1000).map(|_| generate()).collect();
        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn test_generated_ids_are_numeric_and_increasing() {
        let a: i64 = generate().parse().unwrap();
        let b: i64 = generate().parse().unwrap();
        assert!(b > a);
    }

    #[test]
    fn test_normalize_blank_ids() {
        assert_eq!(normalize(None), None);
        assert_eq!(normalize(Some("")), None);
        assert_eq!(normalize(Some("   ")), None);
        assert_eq!(normalize(Some(" demo-1 ")), Some("demo-1".to_string()));
    }
}
