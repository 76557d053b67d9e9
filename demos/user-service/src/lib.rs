//! Example user service.
//!
//! Wires a [`UserController`](controller::UserController) over an in-memory
//! [`UserRepository`](repository::UserRepository) into a veneer [`App`].
//! Replies are enveloped, failures become `{code, message}` bodies, and
//! repository calls are instrumented.

use std::sync::Arc;

use veneer::prelude::*;

pub mod controller;
pub mod model;
pub mod repository;

use controller::UserController;
use repository::UserRepository;

/// Default location of the service configuration.
pub const CONFIG_PATH: &str = "config/veneer.toml";

/// Builds the service application from `config`.
pub fn build_app(config: VeneerConfig) -> Result<App, ServerError> {
    assemble(App::builder(config))
}

/// Registers the user routes on `builder` and builds the app.
///
/// The repository records its calls through the builder's instrumentation,
/// so a sink set with [`AppBuilder::aspect_sink`] sees them.
pub fn assemble(builder: AppBuilder) -> Result<App, ServerError> {
    let repository = Arc::new(UserRepository::new(builder.instrumentation()?));
    let controller = Arc::new(UserController::new(repository));

    let app = controller.routes(builder).build()?;
    tracing::info!(routes = app.route_count(), "user service assembled");
    Ok(app)
}
