//! In-memory user store.
//!
//! Every operation runs under [`Instrumentation`], so each call leaves one
//! record with its arguments, result and timing.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::Local;
use parking_lot::RwLock;
use veneer::prelude::*;

use crate::model::{Page, User, UserCondition};

/// Code raised when saving an id that is already stored.
pub const USER_EXISTS: &str = "USER_1001";
/// Code raised when updating without an id.
pub const USER_ID_REQUIRED: &str = "USER_1002";
/// Code raised when looking up a negative id.
pub const USER_ID_INVALID: &str = "USER_ID_INVALID";

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Thread-safe user store keyed by id.
#[derive(Debug)]
pub struct UserRepository {
    users: RwLock<BTreeMap<i64, User>>,
    next_id: AtomicI64,
    aspect: Instrumentation,
}

impl UserRepository {
    /// Creates an empty store whose calls are recorded by `aspect`.
    pub fn new(aspect: Instrumentation) -> Self {
        Self {
            users: RwLock::new(BTreeMap::new()),
            next_id: AtomicI64::new(1),
            aspect,
        }
    }

    /// Stores a new user, assigning an id when none is given.
    pub fn save(&self, mut user: User) -> Result<User, PipelineError> {
        let site = CallSite::of::<Self>("save").description("store a new user");
        let args = Args::new().arg(&user);
        self.aspect.invoke(&site, args, || {
            let id = match user.id {
                Some(id) => id,
                None => self.next_id.fetch_add(1, Ordering::SeqCst),
            };
            let mut users = self.users.write();
            if users.contains_key(&id) {
                return Err(PipelineError::business_code(USER_EXISTS));
            }
            let now = now();
            user.id = Some(id);
            user.create_time = Some(now.clone());
            user.modify_time = Some(now);
            users.insert(id, user.clone());
            Ok(user)
        })
    }

    /// Replaces a stored user. The id is required.
    pub fn update(&self, mut user: User) -> Result<(), PipelineError> {
        let site = CallSite::of::<Self>("update");
        let args = Args::new().arg(&user);
        self.aspect.invoke(&site, args, || {
            let Some(id) = user.id else {
                return Err(PipelineError::business(USER_ID_REQUIRED, "用户ID不能为空"));
            };
            let mut users = self.users.write();
            user.create_time = users.get(&id).and_then(|existing| existing.create_time.clone());
            user.modify_time = Some(now());
            users.insert(id, user);
            Ok(())
        })
    }

    /// Removes a user. Unknown ids are ignored.
    pub fn remove(&self, id: i64) -> Result<(), PipelineError> {
        let site = CallSite::of::<Self>("remove");
        self.aspect.invoke(&site, Args::new().arg(&id), || {
            self.users.write().remove(&id);
            Ok(())
        })
    }

    /// Looks up one user.
    pub fn find(&self, id: i64) -> Result<Option<User>, PipelineError> {
        let site = CallSite::of::<Self>("find");
        self.aspect.invoke(&site, Args::new().arg(&id), || {
            if id < 0 {
                return Err(PipelineError::business(USER_ID_INVALID, "用户ID异常"));
            }
            Ok(self.users.read().get(&id).cloned())
        })
    }

    /// Returns one page of users in id order.
    pub fn list(&self, page_num: usize, page_size: usize) -> Result<Page<User>, PipelineError> {
        let site = CallSite::of::<Self>("list");
        let args = Args::new().arg(&page_num).arg(&page_size);
        self.aspect.invoke(&site, args, || {
            let users = self.users.read();
            let skip = page_num.saturating_sub(1).saturating_mul(page_size);
            Ok(Page {
                total: users.len(),
                page_num,
                page_size,
                items: users.values().skip(skip).take(page_size).cloned().collect(),
            })
        })
    }

    /// Returns every user matching `condition`.
    pub fn list_by(&self, condition: &UserCondition) -> Result<Vec<User>, PipelineError> {
        let site = CallSite::of::<Self>("list_by");
        self.aspect.invoke(&site, Args::new().arg(condition), || {
            Ok(self
                .users
                .read()
                .values()
                .filter(|user| condition.matches(user))
                .cloned()
                .collect())
        })
    }
}

fn now() -> String {
    Local::now().format(TIME_FORMAT).to_string()
}
