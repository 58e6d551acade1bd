//! Prompt overlay backend: prompt state and review scheduling for articles
//! overlaid with spaced-repetition prompts.
//!
//! Layout, leaves first:
//!   - `selector`    : anchor selectors (pure data)
//!   - `domain`      : prompts and review outcomes
//!   - `store`       : prompt entity store, transitions, due-set projection
//!   - `hypothesis`  : authored prompts from a Hypothes.is export
//!   - `loader`      : baseline loading (dir / http), failures degrade to empty
//!   - `persistence` : get-all / set-all per document
//!   - `review`      : review queue composition and outcome sync
//!   - `session`     : one document's store, init / flush / teardown
//!   - `state`, `logic`, `protocol`, `routes` : axum HTTP + WebSocket surface

pub mod config;
pub mod content;
pub mod domain;
pub mod error;
pub mod hypothesis;
pub mod loader;
pub mod logic;
pub mod persistence;
pub mod protocol;
pub mod review;
pub mod routes;
pub mod selector;
pub mod session;
pub mod state;
pub mod store;
pub mod telemetry;
