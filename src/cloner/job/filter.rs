//! Range selection over collected history.

use crate::types::{CloneRange, MessageSnapshot};

/// Keep exactly the messages whose id lies in `range`, preserving order
///
/// Without a range the input is returned unchanged.
pub(crate) fn filter_range(
    messages: Vec<MessageSnapshot>,
    range: Option<CloneRange>,
) -> Vec<MessageSnapshot> {
    match range {
        Some(range) => messages
            .into_iter()
            .filter(|m| range.contains(m.id))
            .collect(),
        None => messages,
    }
}
