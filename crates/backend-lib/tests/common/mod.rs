//! Shared setup for the integration tests.
#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use larder_backend_lib::{
    auth::{generate_secret, HashParams, SigningSecret},
    config::{RawSecret, Settings},
    notify::{Notifier, NotifyError},
    storage::MemoryStorage,
    AppState,
};
use larder_common::Notification;

/// Notifier that keeps every delivery in memory
#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<(String, Notification)>>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<(String, Notification)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn dispatch(&self, target: &str, notification: &Notification) -> Result<(), NotifyError> {
        self.sent
            .lock()
            .unwrap()
            .push((target.to_string(), notification.clone()));
        Ok(())
    }
}

/// Hashing parameters cheap enough for tests
pub fn cheap_hashing() -> HashParams {
    HashParams {
        time_cost: 1,
        memory_kib: 1024,
        parallelism: 1,
    }
}

/// Application state over fresh in-memory storage
pub fn test_state() -> (AppState, Arc<MemoryStorage>, Arc<RecordingNotifier>) {
    test_state_with_admins(&[])
}

/// Like [`test_state`], with `admins` registering as admins
pub fn test_state_with_admins(admins: &[&str]) -> (AppState, Arc<MemoryStorage>, Arc<RecordingNotifier>) {
    let secret = generate_secret();
    let settings = Settings {
        signing_secret: RawSecret::new(secret.clone()),
        hashing: cheap_hashing(),
        admin_emails: admins.iter().map(|a| a.to_string()).collect(),
        ..Settings::default()
    };
    let storage = Arc::new(MemoryStorage::new());
    let notifier = Arc::new(RecordingNotifier::default());
    let state = AppState::new(
        storage.clone(),
        settings,
        &SigningSecret::new(&secret).unwrap(),
        notifier.clone(),
    )
    .unwrap();
    (state, storage, notifier)
}
