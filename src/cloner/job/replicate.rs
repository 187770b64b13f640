//! Sequential replication of the selected messages into the target channel.

use crate::client::{ChannelHandle, ClientResult, MessagingClient};
use crate::types::{Event, MessageSnapshot};
use crate::utils::progress_interval;

use super::context::JobContext;
use super::report::Reporter;
use super::scratch::ScratchFile;

/// How replication ended
#[derive(Debug, Default)]
pub(crate) struct Replication {
    /// A stop request was consumed before the end of the selection
    pub(crate) stopped: bool,
    /// Items that failed to transfer and were skipped
    pub(crate) failed: u64,
}

/// Replicate `messages` in order
///
/// The stop signal is checked before every item. A failed item is logged,
/// reported to the user and skipped; it never aborts the job. The configured
/// delay follows every item whatever its outcome, and is cut short when the
/// job's token is cancelled.
pub(crate) async fn replicate(
    ctx: &JobContext,
    client: &dyn MessagingClient,
    target: &ChannelHandle,
    messages: &[MessageSnapshot],
    reporter: &mut Reporter,
) -> Replication {
    let total = messages.len() as u64;
    let interval = progress_interval(total, ctx.config.cloning.progress_steps);
    let delay = ctx.config.cloning.send_delay;
    let mut outcome = Replication::default();

    for (index, message) in messages.iter().enumerate() {
        if ctx.stop.take().await {
            let progress = reporter.progress();
            tracing::info!(user_id = %ctx.user, %progress, "Stop requested during cloning");
            reporter
                .update(format!(
                    "⛔ Stopped ({}/{} done)",
                    progress.done, progress.total
                ))
                .await;
            outcome.stopped = true;
            break;
        }

        match transfer(ctx, client, target, message).await {
            Ok(()) => {
                if let Err(e) = ctx.store.append_sent(ctx.user, message.id).await {
                    tracing::warn!(user_id = %ctx.user, message_id = message.id, error = %e, "Failed to record sent message");
                    ctx.log_error(&format!("Sent log update failed for {}: {e}", message.id))
                        .await;
                }

                let progress = reporter.advance().await;
                ctx.emit(Event::Progress {
                    user_id: ctx.user,
                    done: progress.done,
                    total: progress.total,
                });

                let is_last = index + 1 == messages.len();
                if progress.done % interval == 0 || is_last {
                    reporter
                        .update(format!(
                            "⏳ Cloning: {:.1}% complete\n({}/{} messages)",
                            progress.percent(),
                            progress.done,
                            progress.total
                        ))
                        .await;
                }
            }
            Err(e) => {
                outcome.failed += 1;
                tracing::warn!(user_id = %ctx.user, message_id = message.id, error = %e, "Message transfer failed, continuing");
                ctx.log_error(&format!("Message {} failed: {e}", message.id))
                    .await;
                ctx.emit(Event::ItemFailed {
                    user_id: ctx.user,
                    message_id: message.id,
                    error: e.to_string(),
                });
                reporter
                    .update(format!("⚠️ Error on message {} (continuing)", message.id))
                    .await;
            }
        }

        if !delay.is_zero() {
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = ctx.stop.cancelled() => {}
            }
        }
    }

    outcome
}

/// Copy one message: media is downloaded and re-uploaded, text is re-sent,
/// anything else is a no-op.
async fn transfer(
    ctx: &JobContext,
    client: &dyn MessagingClient,
    target: &ChannelHandle,
    message: &MessageSnapshot,
) -> ClientResult<()> {
    if let Some(media) = &message.media {
        let path = client.download(media, &ctx.scratch_dir()).await?;
        let scratch = ScratchFile::new(path);
        let caption = message.body().unwrap_or_default();
        let result = client.send_file(target, scratch.path(), caption).await;
        scratch.release().await;
        result
    } else if let Some(text) = message.body() {
        client.send_text(target, text).await
    } else {
        tracing::debug!(user_id = %ctx.user, message_id = message.id, "Nothing to copy");
        Ok(())
    }
}
