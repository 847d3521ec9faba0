//! Expiry scan against in-memory storage.
mod common;

use std::sync::Arc;

use chrono::{Duration, Utc};
use larder_backend_lib::{
    scheduler::{ScanScheduler, ScanSettings},
    storage::{AccountStore, MemoryStorage, NewUser},
};
use larder_common::StorageLocation;

async fn user(storage: &MemoryStorage, email: &str, target: Option<&str>) -> u64 {
    let user = storage
        .create_user(NewUser {
            name: email.to_string(),
            email: email.to_string(),
            password_hash: "salt$key".to_string(),
            is_admin: false,
        })
        .await
        .unwrap();
    if let Some(target) = target {
        storage
            .set_delivery_target(user.id, target.to_string())
            .await
            .unwrap();
    }
    user.id
}

#[tokio::test]
async fn one_day_scan_only_reports_items_inside_the_window() {
    let storage = Arc::new(MemoryStorage::new());
    let notifier = Arc::new(common::RecordingNotifier::default());
    let now = Utc::now();

    let cook = user(&storage, "cook@example.com", Some("cook-device")).await;
    let _idle = user(&storage, "idle@example.com", Some("idle-device")).await;
    let offline = user(&storage, "offline@example.com", None).await;

    storage.add_item(cook, "Spinach", now + Duration::hours(20), StorageLocation::Refrigerator);
    storage.add_item(cook, "Flour", now + Duration::days(10), StorageLocation::DryPantry);
    storage.add_item(offline, "Peas", now + Duration::hours(1), StorageLocation::DeepFreeze);

    let scheduler = ScanScheduler::new(
        storage.clone(),
        storage.clone(),
        notifier.clone(),
        &ScanSettings::default(),
    );
    let report = scheduler.run_scan(Duration::hours(24), now).await.unwrap();

    assert_eq!(report.scanned, 3);
    assert_eq!(report.notified, 1);
    assert_eq!(report.skipped_no_target, 1);
    assert_eq!(report.dispatch_failures, 0);

    let sent = notifier.sent();
    assert_eq!(sent.len(), 1);
    let (target, notification) = &sent[0];
    assert_eq!(target, "cook-device");
    assert_eq!(notification.title, "1 item expiring in 0 days");
    assert!(notification.body.starts_with("Spinach is expiring on "));
    assert_eq!(notification.data["type"], "expiry_alert");
    assert_eq!(notification.data["count"], "1");
    assert!(!notification.data["details"].contains("Flour"));
}

#[tokio::test]
async fn week_scan_groups_items_per_user() {
    let storage = Arc::new(MemoryStorage::new());
    let notifier = Arc::new(common::RecordingNotifier::default());
    let now = Utc::now();

    let cook = user(&storage, "cook@example.com", Some("cook-device")).await;
    storage.add_item(cook, "Flour", now + Duration::days(6), StorageLocation::DryPantry);
    storage.add_item(cook, "Spinach", now + Duration::hours(20), StorageLocation::Refrigerator);
    storage.add_item(cook, "Butter", now + Duration::days(3), StorageLocation::Refrigerator);

    let scheduler = ScanScheduler::new(
        storage.clone(),
        storage.clone(),
        notifier.clone(),
        &ScanSettings::default(),
    );
    scheduler.run_scan(Duration::days(7), now).await.unwrap();

    let sent = notifier.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].1.title, "3 items expiring in 0 days");
    assert_eq!(sent[0].1.body, "Items: Spinach, Butter and Flour");
}
