//! Admission gate for incoming items.
//!
//! Every item returned by a fetch passes through the engine's
//! [`AdmissionPolicy`] before entering the store: filtered items and
//! duplicates of already-stored items are rejected. Rejection only affects
//! the store; the loaded-count cursor still advances by the full response
//! size so offset paging stays aligned with the backend.

/// Application-supplied filter and duplicate detection.
///
/// Both methods default to admitting everything.
pub trait AdmissionPolicy<T> {
    /// Returns `true` to reject `item` outright.
    fn filter(&self, item: &T) -> bool {
        let _ = item;
        false
    }

    /// Returns `true` when `incoming` duplicates an `existing` stored item.
    fn is_duplicate(&self, incoming: &T, existing: &T) -> bool {
        let _ = (incoming, existing);
        false
    }
}

/// Admits every item; the engine default.
#[derive(Clone, Copy, Debug, Default)]
pub struct AdmitAll;

impl<T> AdmissionPolicy<T> for AdmitAll {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admit_all_rejects_nothing() {
        assert!(!AdmissionPolicy::filter(&AdmitAll, &7));
        assert!(!AdmissionPolicy::is_duplicate(&AdmitAll, &7, &7));
    }
}
