//! HTTP surface of the user service.
//!
//! Handlers live in this module so their replies fall under the
//! `user_service::controller` envelope package.

use std::sync::Arc;

use veneer::prelude::*;
use veneer::server::AppBuilder;

use crate::model::{Page, PageQuery, User, UserCondition};
use crate::repository::UserRepository;

/// User CRUD endpoints.
#[derive(Debug, Clone)]
pub struct UserController {
    repository: Arc<UserRepository>,
}

impl UserController {
    /// Creates a controller over `repository`.
    pub fn new(repository: Arc<UserRepository>) -> Self {
        Self { repository }
    }

    /// Registers every user route on `builder`.
    ///
    /// Literal list routes come before `/user/{id}` since the first matching
    /// route wins.
    pub fn routes(self: Arc<Self>, builder: AppBuilder) -> AppBuilder {
        let list = Arc::clone(&self);
        let condition = Arc::clone(&self);
        let find = Arc::clone(&self);
        let save = Arc::clone(&self);
        let update = Arc::clone(&self);
        let remove = self;

        builder
            .get(
                "/user/list",
                HandlerMeta::of::<Self>("list"),
                move |call: Call| {
                    let this = Arc::clone(&list);
                    async move { this.list(&call) }
                },
            )
            .get(
                "/user/list/condition",
                HandlerMeta::of::<Self>("list_by_condition"),
                move |call: Call| {
                    let this = Arc::clone(&condition);
                    async move { this.list_by_condition(&call) }
                },
            )
            .get(
                "/user/{id}",
                HandlerMeta::of::<Self>("find"),
                move |call: Call| {
                    let this = Arc::clone(&find);
                    async move { this.find(&call) }
                },
            )
            .post("/user", HandlerMeta::of::<Self>("save"), move |call: Call| {
                let this = Arc::clone(&save);
                async move { this.save(&call) }
            })
            .put("/user", HandlerMeta::of::<Self>("update"), move |call: Call| {
                let this = Arc::clone(&update);
                async move { this.update(&call) }
            })
            .delete(
                "/user/{id}",
                HandlerMeta::of::<Self>("remove"),
                move |call: Call| {
                    let this = Arc::clone(&remove);
                    async move { this.remove(&call) }
                },
            )
    }

    fn save(&self, call: &Call) -> Result<User, PipelineError> {
        let user: User = call.body()?;
        self.repository.save(user)
    }

    fn update(&self, call: &Call) -> Result<(), PipelineError> {
        let user: User = call.body()?;
        self.repository.update(user)
    }

    fn remove(&self, call: &Call) -> Result<(), PipelineError> {
        let Path(id) = call.extract::<Path<i64>>()?;
        self.repository.remove(id)
    }

    fn find(&self, call: &Call) -> Result<Option<User>, PipelineError> {
        let Path(id) = call.extract::<Path<i64>>()?;
        self.repository.find(id)
    }

    fn list(&self, call: &Call) -> Result<Page<User>, PipelineError> {
        let Query(page) = call.extract::<Query<PageQuery>>()?;
        self.repository.list(page.page_num, page.page_size)
    }

    fn list_by_condition(&self, call: &Call) -> Result<Vec<User>, PipelineError> {
        let condition: UserCondition = call
            .json(&JsonParam::new("query").required(false))?
            .unwrap_or_default();
        self.repository.list_by(&condition)
    }
}
