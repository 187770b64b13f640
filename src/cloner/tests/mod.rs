use super::test_helpers::*;
use crate::client::SentItem;
use crate::config::{ChannelRef, UserConfig};
use crate::error::{Error, JobError};
use crate::storage::StoreFile;
use crate::types::{CloneRange, Event, JobState, MediaRef, MessageSnapshot, UserId};
use std::time::Duration;

mod scenarios;
