//! Kino Bind Core - lifecycle binding for adaptive-streaming playback
//!
//! This crate embeds an external streaming engine (hls.js in the browser)
//! into a component-based UI:
//! - Engine setup/teardown tied to mount, update and unmount
//! - Configuration merged over engine defaults
//! - Fallback to native HLS playback
//! - Event forwarding and fatal-error recovery
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        Kino Bind Core                           │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                                                                 │
//! │   mount / update / unmount          EngineEvent                 │
//! │            │                             ▲                      │
//! │            ▼                             │                      │
//! │   ┌──────────────────┐  construct  ┌─────┴────────┐             │
//! │   │ LifecycleBinder  │────────────▶│   Streaming  │             │
//! │   │                  │   destroy   │    Engine    │             │
//! │   └───┬──────────┬───┘             └──────┬───────┘             │
//! │       │          │                        │ attach              │
//! │       │          ▼                        ▼                     │
//! │       │   ┌──────────────┐         ┌──────────────┐             │
//! │       │   │ExternalHandle│         │   Playback   │             │
//! │       │   └──────────────┘         │   Surface    │             │
//! │       ▼                            └──────────────┘             │
//! │   Callbacks                                                     │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod error;
pub mod types;
pub mod config;
pub mod events;
pub mod surface;
pub mod engine;
pub mod props;
pub mod binder;

pub use error::{Error, Result};
pub use types::*;
pub use config::EngineConfig;
pub use events::{EngineError, EngineEvent, EngineEventKind, ErrorCategory, RecoveryAction};
pub use surface::{LocalBoxFuture, PlaybackSurface, Spawn, HLS_MIME_TYPE};
pub use engine::{EngineFactory, EventHandler, StreamingEngine};
pub use props::{BindInputs, BinderProps, Callbacks};
pub use binder::LifecycleBinder;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
