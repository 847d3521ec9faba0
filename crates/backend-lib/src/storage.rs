// ============================
// larder-backend-lib/src/storage.rs
// ============================
//! Storage collaborators with an in-memory implementation.
//!
//! The authorization pipeline and the scan scheduler only read through
//! [`UserDirectory`] and [`InventoryStore`]. Writes from the HTTP handlers go
//! through [`AccountStore`] and [`PantryStore`]. Implementations must tolerate
//! concurrent calls from request handlers and every scan task at once.
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::{mapref::entry::Entry, DashMap};
use larder_common::{GroceryItem, NewGroceryItem, StorageLocation, UserId, UserSummary};
use thiserror::Error;

/// Errors surfaced by storage backends
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    #[error("user {0} not found")]
    UserNotFound(UserId),

    #[error("email already registered")]
    EmailTaken,

    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
}

/// A stored user account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub id: UserId,
    pub name: String,
    pub email: String,
    /// Encoded credential record, see [`crate::auth::CredentialHasher`]
    pub password_hash: String,
    /// Push registration token, if the user registered a device
    pub delivery_target: Option<String>,
    pub is_admin: bool,
}

impl UserRecord {
    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            is_admin: self.is_admin,
            has_delivery_target: self.delivery_target.is_some(),
        }
    }
}

/// Account fields supplied when registering
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub is_admin: bool,
}

/// Replacement values for an existing account. `None` keeps the current value.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    /// A complete new credential record, never a partial edit
    pub password_hash: Option<String>,
}

/// Read access to user identities
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Fetch one user by id
    async fn lookup_user(&self, id: UserId) -> Result<UserRecord, StorageError>;

    /// Ids of every known user, in no particular order
    async fn list_user_ids(&self) -> Result<Vec<UserId>, StorageError>;
}

/// Queries over stored inventory
#[async_trait]
pub trait InventoryStore: Send + Sync {
    /// Items of `user_id` whose expiry falls within `[start, end]`
    async fn expiring_items(
        &self,
        user_id: UserId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<GroceryItem>, StorageError>;
}

/// Inventory reads and writes used by the HTTP handlers
#[async_trait]
pub trait PantryStore: InventoryStore {
    /// Store a new item for `user_id` and return it with its assigned id
    async fn insert_item(&self, user_id: UserId, item: NewGroceryItem) -> Result<GroceryItem, StorageError>;

    /// Every item of `user_id`, soonest expiry first
    async fn list_items(&self, user_id: UserId) -> Result<Vec<GroceryItem>, StorageError>;
}

/// Account writes used by the HTTP handlers
#[async_trait]
pub trait AccountStore: UserDirectory {
    /// Persist a new account and return it with its assigned id
    async fn create_user(&self, user: NewUser) -> Result<UserRecord, StorageError>;

    /// Look an account up by its normalized email
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, StorageError>;

    /// Register or replace the push delivery target of a user
    async fn set_delivery_target(&self, id: UserId, target: String) -> Result<(), StorageError>;

    /// Every account ordered by id
    async fn list_users(&self) -> Result<Vec<UserRecord>, StorageError>;

    /// Apply `update` and return the stored account
    async fn update_user(&self, id: UserId, update: UserUpdate) -> Result<UserRecord, StorageError>;
}

/// DashMap-backed implementation of every storage trait
#[derive(Default)]
pub struct MemoryStorage {
    users: DashMap<UserId, UserRecord>,
    /// email -> id, doubles as the uniqueness guard
    emails: DashMap<String, UserId>,
    items: DashMap<UserId, Vec<GroceryItem>>,
    next_user_id: AtomicU64,
    next_item_id: AtomicU64,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one unit of an inventory item for a user and return its id
    pub fn add_item(
        &self,
        user_id: UserId,
        name: &str,
        expiry_date: DateTime<Utc>,
        storage_location: StorageLocation,
    ) -> u64 {
        self.push_item(
            user_id,
            NewGroceryItem {
                name: name.to_string(),
                quantity: 1.0,
                unit: String::new(),
                expiry_date,
                storage_location,
            },
        )
        .id
    }

    fn push_item(&self, user_id: UserId, item: NewGroceryItem) -> GroceryItem {
        let id = self.next_item_id.fetch_add(1, Ordering::Relaxed) + 1;
        let stored = GroceryItem {
            id,
            user_id,
            name: item.name,
            quantity: item.quantity,
            unit: item.unit,
            expiry_date: item.expiry_date,
            storage_location: item.storage_location,
        };
        self.items.entry(user_id).or_default().push(stored.clone());
        stored
    }

    /// Grant or revoke the admin role
    pub fn set_admin(&self, id: UserId, is_admin: bool) -> Result<(), StorageError> {
        let mut user = self.users.get_mut(&id).ok_or(StorageError::UserNotFound(id))?;
        user.is_admin = is_admin;
        Ok(())
    }
}

#[async_trait]
impl UserDirectory for MemoryStorage {
    async fn lookup_user(&self, id: UserId) -> Result<UserRecord, StorageError> {
        self.users
            .get(&id)
            .map(|u| u.value().clone())
            .ok_or(StorageError::UserNotFound(id))
    }

    async fn list_user_ids(&self) -> Result<Vec<UserId>, StorageError> {
        Ok(self.users.iter().map(|u| *u.key()).collect())
    }
}

#[async_trait]
impl InventoryStore for MemoryStorage {
    async fn expiring_items(
        &self,
        user_id: UserId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<GroceryItem>, StorageError> {
        let Some(items) = self.items.get(&user_id) else {
            return Ok(Vec::new());
        };

        Ok(items
            .iter()
            .filter(|item| item.expiry_date >= start && item.expiry_date <= end)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl PantryStore for MemoryStorage {
    async fn insert_item(&self, user_id: UserId, item: NewGroceryItem) -> Result<GroceryItem, StorageError> {
        Ok(self.push_item(user_id, item))
    }

    async fn list_items(&self, user_id: UserId) -> Result<Vec<GroceryItem>, StorageError> {
        let mut items = self
            .items
            .get(&user_id)
            .map(|items| items.value().clone())
            .unwrap_or_default();
        items.sort_by_key(|item| (item.expiry_date, item.id));
        Ok(items)
    }
}

#[async_trait]
impl AccountStore for MemoryStorage {
    async fn create_user(&self, user: NewUser) -> Result<UserRecord, StorageError> {
        let slot = match self.emails.entry(user.email.clone()) {
            Entry::Occupied(_) => return Err(StorageError::EmailTaken),
            Entry::Vacant(slot) => slot,
        };

        let id = self.next_user_id.fetch_add(1, Ordering::Relaxed) + 1;
        let record = UserRecord {
            id,
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            delivery_target: None,
            is_admin: user.is_admin,
        };
        self.users.insert(id, record.clone());
        slot.insert(id);
        Ok(record)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, StorageError> {
        let Some(id) = self.emails.get(email).map(|id| *id) else {
            return Ok(None);
        };
        Ok(self.users.get(&id).map(|u| u.value().clone()))
    }

    async fn set_delivery_target(&self, id: UserId, target: String) -> Result<(), StorageError> {
        let mut user = self.users.get_mut(&id).ok_or(StorageError::UserNotFound(id))?;
        user.delivery_target = Some(target);
        Ok(())
    }

    async fn list_users(&self) -> Result<Vec<UserRecord>, StorageError> {
        let mut users: Vec<UserRecord> = self.users.iter().map(|u| u.value().clone()).collect();
        users.sort_by_key(|u| u.id);
        Ok(users)
    }

    async fn update_user(&self, id: UserId, update: UserUpdate) -> Result<UserRecord, StorageError> {
        let current_email = self
            .users
            .get(&id)
            .map(|u| u.email.clone())
            .ok_or(StorageError::UserNotFound(id))?;
        let new_email = update.email.filter(|email| *email != current_email);

        // The email index is always locked before the user map
        if let Some(email) = &new_email {
            match self.emails.entry(email.clone()) {
                Entry::Occupied(_) => return Err(StorageError::EmailTaken),
                Entry::Vacant(slot) => {
                    slot.insert(id);
                },
            }
        }

        let record = {
            let Some(mut user) = self.users.get_mut(&id) else {
                if let Some(email) = &new_email {
                    self.emails.remove(email);
                }
                return Err(StorageError::UserNotFound(id));
            };
            if let Some(name) = update.name {
                user.name = name;
            }
            if let Some(email) = &new_email {
                user.email = email.clone();
            }
            if let Some(password_hash) = update.password_hash {
                user.password_hash = password_hash;
            }
            user.value().clone()
        };

        if new_email.is_some() {
            self.emails.remove(&current_email);
        }
        Ok(record)
    }
}
