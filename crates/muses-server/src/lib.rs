//! Process wiring for the MuSES resource services.
//!
//! One binary serves one resource, chosen at startup. This crate turns a
//! [`ServerConfig`] into a ready-to-serve axum [`Router`]: it opens the store,
//! builds the authentication service client, and mounts the resource routes
//! next to the probes.

pub mod error;
pub mod probes;

pub use error::{Error, Result};

use std::{
  path::{Path, PathBuf},
  sync::Arc,
  time::Duration,
};

use axum::{Router, routing::get};
use clap::ValueEnum;
use config::{Config, ConfigError, Environment, File, builder::DefaultState};
use muses_api::{HttpAuthority, Shared};
use muses_core::{
  artwork::Artwork,
  entity::Entity,
  museum::Museum,
  repository::{Repository, Timeouts},
  service::EntityService,
  user::User,
};
use muses_store_sqlite::SqliteStore;
use serde::Deserialize;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{Level, info};

// ─── Resource ────────────────────────────────────────────────────────────────

/// Which of the three services this process runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Resource {
  Users,
  Museums,
  Artworks,
}

impl Resource {
  pub fn default_port(self) -> u16 {
    match self {
      Self::Users | Self::Museums => 8000,
      Self::Artworks => 4000,
    }
  }

  pub fn default_collection(self) -> &'static str {
    match self {
      Self::Users => "users",
      Self::Museums => "museums",
      Self::Artworks => "opere",
    }
  }

  /// Whether creates and deletes are mirrored into the auth service.
  pub fn linked(self) -> bool {
    match self {
      Self::Users => User::LINKED,
      Self::Museums => Museum::LINKED,
      Self::Artworks => Artwork::LINKED,
    }
  }
}

// ─── Configuration ───────────────────────────────────────────────────────────

/// Runtime server configuration.
///
/// Built from per-resource defaults, then an optional TOML file, then
/// environment variables named after the upper-cased keys (`PORT`,
/// `DB_PATH`, `AUTH_SVC_NAME`, ...).
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  pub listen_host:         String,
  pub port:                u16,
  pub db_path:             PathBuf,
  pub coll_name:           String,
  /// Host name of the authentication service. Blank or absent disables
  /// linkage.
  #[serde(default)]
  pub auth_svc_name:       Option<String>,
  pub auth_timeout_ms:     u64,
  pub store_timeout_ms:    u64,
  pub scan_timeout_ms:     u64,
  pub shutdown_grace_secs: u64,
}

impl ServerConfig {
  /// Defaults for `resource`, before any file or environment source.
  pub fn defaults(resource: Resource) -> Result<config::ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
      .set_default("listen_host", "0.0.0.0")?
      .set_default("port", i64::from(resource.default_port()))?
      .set_default("db_path", format!("{}.db", resource.default_collection()))?
      .set_default("coll_name", resource.default_collection())?
      .set_default("auth_timeout_ms", 5_000_i64)?
      .set_default("store_timeout_ms", 5_000_i64)?
      .set_default("scan_timeout_ms", 10_000_i64)?
      .set_default("shutdown_grace_secs", 30_i64)
  }

  pub fn load(resource: Resource, file: &Path) -> Result<Self, ConfigError> {
    Self::defaults(resource)?
      .add_source(File::from(file).required(false))
      .add_source(Environment::default().try_parsing(true))
      .build()?
      .try_deserialize()
  }

  pub fn address(&self) -> String { format!("{}:{}", self.listen_host, self.port) }

  pub fn timeouts(&self) -> Timeouts {
    Timeouts {
      single: Duration::from_millis(self.store_timeout_ms),
      scan:   Duration::from_millis(self.scan_timeout_ms),
    }
  }

  pub fn shutdown_grace(&self) -> Duration { Duration::from_secs(self.shutdown_grace_secs) }

  /// The auth service client for `resource`, if linkage applies and is
  /// configured.
  pub fn authority(&self, resource: Resource) -> Result<Option<HttpAuthority>> {
    if !resource.linked() {
      return Ok(None);
    }
    let name = self.auth_svc_name.as_deref().unwrap_or_default();
    let timeout = Duration::from_millis(self.auth_timeout_ms);
    Ok(HttpAuthority::for_service(name, timeout)?)
  }
}

// ─── Router ──────────────────────────────────────────────────────────────────

type Service<E> = EntityService<E, SqliteStore, HttpAuthority>;

/// Open the configured store and build the router for `resource`.
pub async fn build(resource: Resource, cfg: &ServerConfig) -> Result<Router> {
  let store = SqliteStore::open(&cfg.db_path).await?;
  info!(path = %cfg.db_path.display(), "opened store");
  app(resource, cfg, Arc::new(store))
}

/// Build the router for `resource` over an already-open store.
pub fn app(resource: Resource, cfg: &ServerConfig, store: Arc<SqliteStore>) -> Result<Router> {
  let authority = cfg.authority(resource)?;
  match &authority {
    Some(a) => info!(base = %a.base(), "auth service linkage enabled"),
    None if resource.linked() => info!("auth service linkage disabled"),
    None => {}
  }

  let router = match resource {
    Resource::Users => {
      let svc = service::<User>(cfg, store, authority);
      mount(muses_api::users_router(Arc::clone(&svc)), svc)
    }
    Resource::Museums => {
      let svc = service::<Museum>(cfg, store, authority);
      mount(muses_api::museums_router(Arc::clone(&svc)), svc)
    }
    Resource::Artworks => {
      let svc = service::<Artwork>(cfg, store, authority);
      mount(muses_api::artworks_router(Arc::clone(&svc)), svc)
    }
  };
  Ok(router)
}

fn service<E: Entity>(
  cfg: &ServerConfig,
  store: Arc<SqliteStore>,
  authority: Option<HttpAuthority>,
) -> Shared<E, SqliteStore, HttpAuthority> {
  let repo = Repository::new(store, cfg.coll_name.clone()).with_timeouts(cfg.timeouts());
  Arc::new(Service::<E>::new(repo, authority))
}

/// Probes next to the resource routes. Probe traffic is traced at `DEBUG`
/// so orchestrator polling stays out of the default log.
fn mount<E: Entity>(routes: Router, svc: Shared<E, SqliteStore, HttpAuthority>) -> Router {
  let probes = Router::new()
    .route("/health", get(probes::health::<E>))
    .route("/ready", get(probes::ready::<E, SqliteStore, HttpAuthority>))
    .with_state(svc)
    .layer(
      TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::DEBUG))
        .on_response(DefaultOnResponse::new().level(Level::DEBUG)),
    );

  let routes = routes.layer(
    TraceLayer::new_for_http()
      .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
      .on_response(DefaultOnResponse::new().level(Level::INFO)),
  );

  probes.merge(routes)
}
