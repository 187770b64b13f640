//! History collection: page through the source channel, oldest-first result.

use crate::client::{ChannelHandle, MessagingClient};
use crate::types::{Event, MessageSnapshot};

use super::context::JobContext;
use super::report::Reporter;

/// Announce the running total every this many collected messages
const COLLECT_ANNOUNCE_EVERY: usize = 100;

/// How collection ended
pub(crate) enum Collection {
    /// Reached the beginning of the channel
    Complete(Vec<MessageSnapshot>),
    /// A page request failed; holds what was gathered before it
    Partial(Vec<MessageSnapshot>),
    /// A stop request was consumed before the next page
    Stopped(Vec<MessageSnapshot>),
}

/// Walk the channel history newest-to-oldest, then return it in ascending id order
///
/// Each page is anchored at the id of the previous page's last (oldest)
/// message; an empty page ends the walk. The stop signal is checked before
/// every page request.
pub(crate) async fn collect_history(
    ctx: &JobContext,
    client: &dyn MessagingClient,
    source: &ChannelHandle,
    reporter: &mut Reporter,
) -> Collection {
    let page_size = ctx.config.cloning.page_size;
    let mut messages: Vec<MessageSnapshot> = Vec::new();
    let mut offset_id = 0;

    let finish = |mut messages: Vec<MessageSnapshot>| {
        messages.reverse();
        messages
    };

    loop {
        if ctx.stop.take().await {
            tracing::info!(user_id = %ctx.user, collected = messages.len(), "Stop requested during collection");
            return Collection::Stopped(finish(messages));
        }

        let page = match client.fetch_history(source, offset_id, page_size).await {
            Ok(page) => page,
            Err(e) => {
                tracing::warn!(user_id = %ctx.user, offset_id, error = %e, "History request failed");
                ctx.log_error(&format!("Collection error: {e}")).await;
                reporter.update("❌ Collection error").await;
                return Collection::Partial(finish(messages));
            }
        };

        let Some(oldest) = page.last() else {
            break;
        };
        if offset_id != 0 && oldest.id >= offset_id {
            // The anchor must strictly decrease or the walk never ends.
            tracing::warn!(user_id = %ctx.user, offset_id, oldest = oldest.id, "History page did not advance");
            break;
        }
        offset_id = oldest.id;
        tracing::debug!(user_id = %ctx.user, page_len = page.len(), offset_id, "Collected history page");

        for message in page {
            messages.push(message);
            if messages.len() % COLLECT_ANNOUNCE_EVERY == 0 {
                let count = messages.len();
                ctx.emit(Event::Collected {
                    user_id: ctx.user,
                    count: count as u64,
                });
                reporter.update(format!("📥 Collected {count} messages")).await;
            }
        }
    }

    Collection::Complete(finish(messages))
}
