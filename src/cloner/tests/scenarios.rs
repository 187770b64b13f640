use super::*;

#[tokio::test]
async fn test_full_clone_of_250_messages() {
    let env = create_test_cloner().await;
    env.configure_user(USER);
    env.seed_text_channel(1..=250);

    let outcome = env
        .cloner
        .start_clone(USER, CHAT, None)
        .await
        .unwrap()
        .wait()
        .await
        .unwrap();

    assert_eq!(outcome.state, JobState::Completed);
    assert_eq!(outcome.progress.as_pair(), (250, 250));
    assert_eq!(outcome.failed_items, 0);

    // Replicated in ascending id order
    let expected: Vec<String> = (1..=250).map(|id| format!("msg {id}")).collect();
    assert_eq!(env.sent_texts(), expected);
    assert_eq!(
        env.cloner.store().sent_ids(USER).await.unwrap(),
        (1..=250).collect::<Vec<_>>()
    );

    // Ten progress notifications, one every 25 items
    let texts = env.notifier.texts();
    assert_eq!(
        cloning_checkpoints(&texts),
        (1..=10).map(|n| n * 25).collect::<Vec<u64>>()
    );
    assert!(texts.iter().any(|t| t.contains("📥 Collected 100 messages")));
    assert!(texts.iter().any(|t| t.contains("📥 Collected 200 messages")));
    assert!(texts.iter().any(|t| t.contains("📊 Ready to clone 250 messages")));
    assert!(env.notifier.chats().iter().all(|chat| *chat == CHAT));

    let status = env.cloner.persisted_status(USER).await.unwrap().unwrap();
    assert_eq!(status.message, "✅ Completed: 250/250 messages");
    assert!(status.message.contains("250/250"));
    assert_eq!(status.progress, (250, 250));

    // Session released, slot free again
    assert_eq!(env.platform.connects(), 1);
    assert_eq!(env.platform.disconnects(), 1);
    assert_eq!(env.cloner.job_status(USER).await.state, JobState::Idle);
}

#[tokio::test]
async fn test_range_clone_selects_inclusive_interval() {
    let env = create_test_cloner().await;
    env.configure_user(USER);
    env.seed_text_channel(1..=30);

    let outcome = env
        .cloner
        .start_clone(USER, CHAT, Some(CloneRange::new(10, 20)))
        .await
        .unwrap()
        .wait()
        .await
        .unwrap();

    assert_eq!(outcome.state, JobState::Completed);
    assert_eq!(outcome.progress.total, 11);
    assert_eq!(
        env.cloner.store().sent_ids(USER).await.unwrap(),
        (10..=20).collect::<Vec<_>>()
    );
    assert_eq!(
        env.sent_texts(),
        (10..=20).map(|id| format!("msg {id}")).collect::<Vec<_>>()
    );
}

#[tokio::test]
async fn test_stop_marker_ends_clone_early() {
    let env = create_test_cloner().await;
    env.configure_user(USER);
    env.seed_text_channel(1..=250);

    // An out-of-process writer drops the marker after the 50th send.
    let stop_path = env.cloner.store().path_for(USER, StoreFile::Stop);
    env.platform.on_send(move |count| {
        if count == 50 {
            std::fs::write(&stop_path, "stop").unwrap();
        }
    });

    let outcome = env
        .cloner
        .start_clone(USER, CHAT, None)
        .await
        .unwrap()
        .wait()
        .await
        .unwrap();

    assert_eq!(outcome.state, JobState::StoppedEarly);
    assert!((50..=51).contains(&outcome.progress.done));
    assert_eq!(outcome.progress.total, 250);
    assert!(!env.file_exists(USER, StoreFile::Stop));

    let sent = env.cloner.store().sent_ids(USER).await.unwrap();
    assert_eq!(sent.len() as u64, outcome.progress.done);

    let texts = env.notifier.texts();
    assert!(
        texts
            .iter()
            .any(|t| t.contains(&format!("⛔ Stopped ({}/250 done)", outcome.progress.done)))
    );
    let status = env.cloner.persisted_status(USER).await.unwrap().unwrap();
    assert!(status.message.starts_with("⏹️ Stopped early:"));
}

#[tokio::test]
async fn test_stop_during_last_item_ends_stopped() {
    let env = create_test_cloner().await;
    env.configure_user(USER);
    env.seed_text_channel(1..=3);

    // The marker lands while the final message is being sent.
    let stop_path = env.cloner.store().path_for(USER, StoreFile::Stop);
    env.platform.on_send(move |count| {
        if count == 3 {
            std::fs::write(&stop_path, "stop").unwrap();
        }
    });

    let outcome = env
        .cloner
        .start_clone(USER, CHAT, None)
        .await
        .unwrap()
        .wait()
        .await
        .unwrap();

    assert_eq!(outcome.state, JobState::StoppedEarly);
    assert_eq!(outcome.progress.as_pair(), (3, 3));
    assert!(!env.file_exists(USER, StoreFile::Stop));

    let status = env.cloner.persisted_status(USER).await.unwrap().unwrap();
    assert_eq!(status.message, "⏹️ Stopped early: 3/3");
}

#[tokio::test]
async fn test_stop_during_collection_clones_what_was_collected() {
    let env = create_test_cloner().await;
    env.configure_user(USER);
    env.seed_text_channel(1..=250);

    // The marker lands right after the first (newest) page arrives.
    let stop_path = env.cloner.store().path_for(USER, StoreFile::Stop);
    env.platform.on_history_page(move |page| {
        if page == 0 {
            std::fs::write(&stop_path, "stop").unwrap();
        }
    });

    let outcome = env
        .cloner
        .start_clone(USER, CHAT, None)
        .await
        .unwrap()
        .wait()
        .await
        .unwrap();

    assert_eq!(outcome.state, JobState::Completed);
    assert_eq!(outcome.progress.as_pair(), (100, 100));
    assert_eq!(
        env.cloner.store().sent_ids(USER).await.unwrap(),
        (151..=250).collect::<Vec<_>>()
    );
    assert!(!env.file_exists(USER, StoreFile::Stop));
    assert!(
        env.notifier
            .texts()
            .iter()
            .any(|t| t.contains("⛔ Stopped by user request"))
    );
}

#[tokio::test]
async fn test_resume_continues_after_last_logged_id() {
    let env = create_test_cloner().await;
    env.configure_user(USER);
    env.seed_text_channel(1..=10);
    std::fs::write(
        env.cloner.store().path_for(USER, StoreFile::SentLog),
        "1\n2\n3\n",
    )
    .unwrap();

    let handle = env.cloner.resume(USER, CHAT).await.unwrap();
    assert_eq!(
        env.cloner.job_status(USER).await.range,
        Some(CloneRange::starting_at(4))
    );
    let outcome = handle.wait().await.unwrap();

    assert_eq!(outcome.state, JobState::Completed);
    assert_eq!(outcome.progress.as_pair(), (7, 7));
    assert_eq!(
        env.sent_texts(),
        (4..=10).map(|id| format!("msg {id}")).collect::<Vec<_>>()
    );
    assert_eq!(
        env.cloner.store().sent_ids(USER).await.unwrap(),
        (1..=10).collect::<Vec<_>>()
    );
}

#[tokio::test]
async fn test_resume_after_complete_clone_selects_nothing() {
    let env = create_test_cloner().await;
    env.configure_user(USER);
    env.seed_text_channel(1..=5);

    env.cloner
        .start_clone(USER, CHAT, None)
        .await
        .unwrap()
        .wait()
        .await
        .unwrap();
    let outcome = env
        .cloner
        .resume(USER, CHAT)
        .await
        .unwrap()
        .wait()
        .await
        .unwrap();

    assert_eq!(outcome.state, JobState::Completed);
    assert_eq!(outcome.progress.as_pair(), (0, 0));
    assert_eq!(env.sent_texts().len(), 5);
}

#[tokio::test]
async fn test_missing_credentials_fail_before_connecting() {
    let env = create_test_cloner().await;
    env.write_user_config(
        USER,
        &UserConfig {
            source_channel_id: Some(ChannelRef::Id(SOURCE_ID)),
            target_channel_id: Some(ChannelRef::Id(TARGET_ID)),
            ..Default::default()
        },
    );
    env.seed_text_channel(1..=3);

    let outcome = env
        .cloner
        .start_clone(USER, CHAT, None)
        .await
        .unwrap()
        .wait()
        .await
        .unwrap();

    assert_eq!(outcome.state, JobState::Failed);
    assert_eq!(env.platform.connects(), 0);
    assert!(env.platform.sent().is_empty());

    let status = env.cloner.persisted_status(USER).await.unwrap().unwrap();
    assert_eq!(status.message, "❌ Client initialization failed");
    let errors = env.cloner.store().error_entries(USER).await.unwrap();
    assert!(errors.iter().any(|e| e.contains("missing credentials")));
    assert_eq!(env.cloner.job_status(USER).await.state, JobState::Idle);
}

#[tokio::test]
async fn test_connection_failure_fails_job() {
    let env = create_test_cloner().await;
    env.configure_user(USER);
    env.seed_text_channel(1..=3);
    env.platform.refuse_connections("flood wait");

    let outcome = env
        .cloner
        .start_clone(USER, CHAT, None)
        .await
        .unwrap()
        .wait()
        .await
        .unwrap();

    assert_eq!(outcome.state, JobState::Failed);
    let errors = env.cloner.store().error_entries(USER).await.unwrap();
    assert!(errors.iter().any(|e| e.contains("flood wait")));
}

#[tokio::test]
async fn test_missing_target_channel_fails_and_disconnects() {
    let env = create_test_cloner().await;
    env.write_user_config(
        USER,
        &UserConfig {
            api_id: Some(1),
            api_hash: Some("hash".to_string()),
            phone: Some("+1".to_string()),
            source_channel_id: Some(ChannelRef::Id(SOURCE_ID)),
            target_channel_id: None,
        },
    );
    env.seed_text_channel(1..=3);

    let outcome = env
        .cloner
        .start_clone(USER, CHAT, None)
        .await
        .unwrap()
        .wait()
        .await
        .unwrap();

    assert_eq!(outcome.state, JobState::Failed);
    assert_eq!(env.platform.disconnects(), 1);
    let status = env.cloner.persisted_status(USER).await.unwrap().unwrap();
    assert_eq!(status.message, "❌ Missing source or target channel");
}

#[tokio::test]
async fn test_unresolvable_channel_fails_job() {
    let env = create_test_cloner().await;
    env.configure_user(USER);
    // Only the source exists on the platform.
    env.platform
        .add_channel(SOURCE_PEER, [MessageSnapshot::text(1, "hello")]);

    let outcome = env
        .cloner
        .start_clone(USER, CHAT, None)
        .await
        .unwrap()
        .wait()
        .await
        .unwrap();

    assert_eq!(outcome.state, JobState::Failed);
    assert_eq!(env.platform.disconnects(), 1);
    assert!(env.platform.sent().is_empty());

    let texts = env.notifier.texts();
    assert!(texts.iter().any(|t| t.contains("❌ Channel access failed")));
    let errors = env.cloner.store().error_entries(USER).await.unwrap();
    assert!(errors.iter().any(|e| e.contains("Channel access failed")));
}

#[tokio::test]
async fn test_failed_message_is_skipped_and_logged() {
    let env = create_test_cloner().await;
    env.configure_user(USER);
    env.seed_text_channel(1..=5);
    env.platform.fail_text("msg 3");

    let outcome = env
        .cloner
        .start_clone(USER, CHAT, None)
        .await
        .unwrap()
        .wait()
        .await
        .unwrap();

    assert_eq!(outcome.state, JobState::Completed);
    assert_eq!(outcome.failed_items, 1);
    assert_eq!(outcome.progress.as_pair(), (4, 5));
    assert_eq!(
        env.cloner.store().sent_ids(USER).await.unwrap(),
        vec![1, 2, 4, 5]
    );

    let errors = env.cloner.store().error_entries(USER).await.unwrap();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("Message 3 failed"));
    assert!(
        env.notifier
            .texts()
            .iter()
            .any(|t| t.contains("⚠️ Error on message 3 (continuing)"))
    );
    // The final item still triggers a progress notification.
    assert_eq!(cloning_checkpoints(&env.notifier.texts()).last(), Some(&4));
}

#[tokio::test]
async fn test_media_is_reuploaded_and_scratch_removed() {
    let env = create_test_cloner().await;
    env.configure_user(USER);
    env.platform.add_channel(
        SOURCE_PEER,
        [
            MessageSnapshot::media(
                1,
                MediaRef {
                    id: "photo-1".to_string(),
                    file_name: Some("photo.jpg".to_string()),
                },
                Some("sunset".to_string()),
            ),
            MessageSnapshot::media(2, MediaRef::new("doc-2"), None),
            MessageSnapshot::empty(3),
            MessageSnapshot::text(4, "plain"),
            MessageSnapshot::media(5, MediaRef::new("gone"), Some("lost".to_string())),
        ],
    );
    env.platform.add_channel(TARGET_PEER, []);
    env.platform.add_media("photo-1", b"jpeg".to_vec());
    env.platform.add_media("doc-2", b"pdf".to_vec());

    let outcome = env
        .cloner
        .start_clone(USER, CHAT, None)
        .await
        .unwrap()
        .wait()
        .await
        .unwrap();

    assert_eq!(outcome.progress.as_pair(), (4, 5));
    assert_eq!(outcome.failed_items, 1);
    assert_eq!(
        env.platform.sent(),
        vec![
            SentItem::File {
                channel: TARGET_PEER,
                file_name: "photo.jpg".to_string(),
                caption: "sunset".to_string(),
            },
            SentItem::File {
                channel: TARGET_PEER,
                file_name: "doc-2".to_string(),
                caption: String::new(),
            },
            SentItem::Text {
                channel: TARGET_PEER,
                text: "plain".to_string(),
            },
        ]
    );
    // Empty message 3 counts as processed.
    assert_eq!(
        env.cloner.store().sent_ids(USER).await.unwrap(),
        vec![1, 2, 3, 4]
    );

    let downloads = env.platform.downloads();
    assert_eq!(downloads.len(), 2);
    assert!(downloads.iter().all(|path| !path.exists()));
}

#[tokio::test]
async fn test_failed_upload_still_removes_scratch_file() {
    let env = create_test_cloner().await;
    env.configure_user(USER);
    env.platform.add_channel(
        SOURCE_PEER,
        [
            MessageSnapshot::text(1, "before"),
            MessageSnapshot::media(
                2,
                MediaRef {
                    id: "doc-2".to_string(),
                    file_name: Some("broken.pdf".to_string()),
                },
                Some("report".to_string()),
            ),
            MessageSnapshot::text(3, "after"),
        ],
    );
    env.platform.add_channel(TARGET_PEER, []);
    env.platform.add_media("doc-2", b"pdf".to_vec());
    env.platform.fail_upload("broken.pdf");

    let outcome = env
        .cloner
        .start_clone(USER, CHAT, None)
        .await
        .unwrap()
        .wait()
        .await
        .unwrap();

    assert_eq!(outcome.state, JobState::Completed);
    assert_eq!(outcome.failed_items, 1);
    assert_eq!(outcome.progress.as_pair(), (2, 3));
    assert_eq!(env.sent_texts(), vec!["before", "after"]);
    assert_eq!(env.cloner.store().sent_ids(USER).await.unwrap(), vec![1, 3]);

    let errors = env.cloner.store().error_entries(USER).await.unwrap();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("Message 2 failed"));

    // The download happened, and nothing of it is left behind.
    let downloads = env.platform.downloads();
    assert_eq!(downloads.len(), 1);
    assert!(!downloads[0].exists());
    let scratch = env
        .cloner
        .get_config()
        .storage
        .scratch_dir
        .join(USER.to_string());
    assert_eq!(std::fs::read_dir(scratch).unwrap().count(), 0);
}

#[tokio::test]
async fn test_collection_error_keeps_partial_history() {
    let env = create_test_cloner().await;
    env.configure_user(USER);
    env.seed_text_channel(1..=250);
    // First page (ids 250..151) succeeds, the second fails.
    env.platform.fail_history_at_page(1);

    let outcome = env
        .cloner
        .start_clone(USER, CHAT, None)
        .await
        .unwrap()
        .wait()
        .await
        .unwrap();

    assert_eq!(outcome.state, JobState::Completed);
    assert_eq!(outcome.progress.as_pair(), (100, 100));
    assert_eq!(
        env.cloner.store().sent_ids(USER).await.unwrap(),
        (151..=250).collect::<Vec<_>>()
    );
    assert!(
        env.notifier
            .texts()
            .iter()
            .any(|t| t.contains("❌ Collection error"))
    );
    let errors = env.cloner.store().error_entries(USER).await.unwrap();
    assert!(errors.iter().any(|e| e.contains("Collection error")));
}

#[tokio::test]
async fn test_notification_failures_do_not_fail_the_job() {
    let env = create_test_cloner().await;
    env.configure_user(USER);
    env.seed_text_channel(1..=3);
    env.notifier.fail();

    let outcome = env
        .cloner
        .start_clone(USER, CHAT, None)
        .await
        .unwrap()
        .wait()
        .await
        .unwrap();

    assert_eq!(outcome.state, JobState::Completed);
    assert_eq!(outcome.progress.as_pair(), (3, 3));

    let errors = env.cloner.store().error_entries(USER).await.unwrap();
    assert!(!errors.is_empty());
    assert!(errors.iter().all(|e| e.contains("Status update failed")));
    // Status is still persisted.
    let status = env.cloner.persisted_status(USER).await.unwrap().unwrap();
    assert_eq!(status.message, "✅ Completed: 3/3 messages");
}

#[tokio::test]
async fn test_events_follow_job_lifecycle() {
    let env = create_test_cloner().await;
    env.configure_user(USER);
    env.seed_text_channel(1..=4);
    let mut events = env.cloner.subscribe();

    env.cloner
        .start_clone(USER, CHAT, None)
        .await
        .unwrap()
        .wait()
        .await
        .unwrap();

    let mut seen = Vec::new();
    while let Ok(event) = events.try_recv() {
        seen.push(event);
    }

    assert!(matches!(seen.first(), Some(Event::JobStarted { user_id, range: None }) if *user_id == USER));
    assert!(
        seen.iter()
            .any(|e| matches!(e, Event::Ready { total: 4, .. }))
    );
    let progress: Vec<u64> = seen
        .iter()
        .filter_map(|e| match e {
            Event::Progress { done, .. } => Some(*done),
            _ => None,
        })
        .collect();
    assert_eq!(progress, vec![1, 2, 3, 4]);
    assert!(matches!(
        seen.last(),
        Some(Event::JobFinished {
            state: JobState::Completed,
            ..
        })
    ));
}

#[tokio::test]
async fn test_users_clone_independently() {
    let env = create_test_cloner().await;
    let other = UserId(7);
    env.configure_user(USER);
    env.configure_user(other);
    env.seed_text_channel(1..=20);

    let first = env.cloner.start_clone(USER, CHAT, None).await.unwrap();
    let second = env
        .cloner
        .start_clone(other, 77, Some(CloneRange::new(1, 5)))
        .await
        .unwrap();

    let (first, second) = (first.wait().await.unwrap(), second.wait().await.unwrap());
    assert_eq!(first.progress.as_pair(), (20, 20));
    assert_eq!(second.progress.as_pair(), (5, 5));
    assert_eq!(env.cloner.store().sent_ids(other).await.unwrap(), vec![1, 2, 3, 4, 5]);
    assert_eq!(env.platform.connects(), 2);
    assert_eq!(env.platform.disconnects(), 2);
}
