//! Clone job orchestration: the top-level lifecycle of one user's job.

use crate::client::MessagingClient;
use crate::config::UserConfig;
use crate::error::{ClientError, JobError, Result};
use crate::types::{Event, JobOutcome, JobState};
use crate::utils::normalize_channel_id;

use super::collect::{Collection, collect_history};
use super::context::JobContext;
use super::filter::filter_range;
use super::replicate::replicate;
use super::report::Reporter;

/// Run a clone job to a terminal state
///
/// Phases:
/// 1. Load the user's settings and open a client session
/// 2. Resolve source and target channels
/// 3. Collect the source history
/// 4. Select the requested range
/// 5. Replicate the selection
/// 6. Finalize: final status, release the session and the user's slot
pub(crate) async fn run_clone_job(ctx: JobContext, mut reporter: Reporter) -> JobOutcome {
    let user = ctx.user;
    tracing::info!(user_id = %user, range = ?ctx.range, "Clone job started");

    // Phase 1: Settings and session
    let settings = match ctx.store.load_user_config(user).await {
        Ok(settings) => settings,
        Err(e) => {
            ctx.log_error(&e.to_string()).await;
            return fail(&ctx, &mut reporter, "❌ Client initialization failed").await;
        }
    };

    let client = match connect(&ctx, &settings).await {
        Ok(client) => client,
        Err(e) => {
            tracing::error!(user_id = %user, error = %e, "Client initialization failed");
            ctx.log_error(&e.to_string()).await;
            return fail(&ctx, &mut reporter, "❌ Client initialization failed").await;
        }
    };

    // Every path from here on releases the session.
    let failed_items = run_with_client(&ctx, client.as_ref(), &settings, &mut reporter).await;
    client.disconnect().await;

    finalize(&ctx, &reporter, failed_items).await
}

async fn connect(ctx: &JobContext, settings: &UserConfig) -> Result<Box<dyn MessagingClient>> {
    if !settings.has_credentials() {
        return Err(JobError::MissingCredentials {
            user_id: ctx.user.get(),
        }
        .into());
    }
    let session = ctx.store.session_path(ctx.user);
    Ok(ctx.connector.connect(ctx.user, settings, &session).await?)
}

/// Phases 2 to 5. Publishes the terminal status, leaves the reporter in its
/// terminal state and returns the number of skipped items.
async fn run_with_client(
    ctx: &JobContext,
    client: &dyn MessagingClient,
    settings: &UserConfig,
    reporter: &mut Reporter,
) -> u64 {
    let user = ctx.user;

    // Phase 2: Channel resolution
    let Some((source_ref, target_ref)) = settings.channels() else {
        let e = JobError::MissingChannels {
            user_id: user.get(),
        };
        ctx.log_error(&e.to_string()).await;
        reporter.set_state(JobState::Failed).await;
        reporter.update("❌ Missing source or target channel").await;
        return 0;
    };

    let resolved = async {
        let source = client.resolve(normalize_channel_id(source_ref)?).await?;
        let target = client.resolve(normalize_channel_id(target_ref)?).await?;
        Ok::<_, ClientError>((source, target))
    }
    .await;
    let (source, target) = match resolved {
        Ok(pair) => pair,
        Err(e) => {
            tracing::error!(user_id = %user, error = %e, "Channel access failed");
            ctx.log_error(&format!("Channel access failed: {e}")).await;
            reporter.set_state(JobState::Failed).await;
            reporter.update("❌ Channel access failed").await;
            return 0;
        }
    };

    // Phase 3: Collection
    reporter.set_state(JobState::Collecting).await;
    reporter.update("📂 Collecting messages...").await;
    let collected = match collect_history(ctx, client, &source, reporter).await {
        Collection::Complete(messages) | Collection::Partial(messages) => messages,
        Collection::Stopped(messages) => {
            // The request only cuts collection short; what was gathered is still cloned.
            reporter.update("⛔ Stopped by user request").await;
            messages
        }
    };

    // Phase 4: Range selection
    let selected = filter_range(collected, ctx.range);
    let total = selected.len() as u64;
    reporter.set_total(total).await;
    reporter.set_state(JobState::Ready).await;
    ctx.emit(Event::Ready {
        user_id: user,
        total,
    });
    reporter
        .update(format!("📊 Ready to clone {total} messages"))
        .await;

    // Phase 5: Replication
    reporter.set_state(JobState::Cloning).await;
    let replication = replicate(ctx, client, &target, &selected, reporter).await;
    // A request that arrived during the last item still ends the job as stopped.
    let stopped = replication.stopped || ctx.stop.take().await;
    let progress = reporter.progress();
    if stopped {
        reporter.set_state(JobState::StoppedEarly).await;
        reporter
            .update(format!(
                "⏹️ Stopped early: {}/{}",
                progress.done, progress.total
            ))
            .await;
    } else {
        reporter.set_state(JobState::Completed).await;
        reporter
            .update(format!(
                "✅ Completed: {}/{} messages",
                progress.done, progress.total
            ))
            .await;
    }
    replication.failed
}

/// Phase 6: release the user's slot and announce the outcome
async fn finalize(ctx: &JobContext, reporter: &Reporter, failed_items: u64) -> JobOutcome {
    let progress = reporter.progress();
    let state = reporter.state();
    ctx.remove_from_active().await;
    ctx.emit(Event::JobFinished {
        user_id: ctx.user,
        state,
        progress,
    });
    tracing::info!(user_id = %ctx.user, ?state, %progress, failed_items, "Clone job finished");

    JobOutcome {
        user_id: ctx.user,
        state,
        progress,
        failed_items,
    }
}

async fn fail(ctx: &JobContext, reporter: &mut Reporter, message: &str) -> JobOutcome {
    reporter.set_state(JobState::Failed).await;
    reporter.update(message).await;
    finalize(ctx, reporter, 0).await
}
