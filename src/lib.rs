// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! ROOMFORGE - iterative room and exterior redesign.
//!
//! A project starts from a photo of a room or building. Each edit sends the
//! current version to a multimodal image model and records the result in a
//! linear undo/redo history. Projects are saved to a local text store.

pub mod app;
pub mod config;
pub mod error;
pub mod generation;
pub mod io;
pub mod models;
pub mod session;
pub mod util;

pub use app::App;
pub use config::AppConfig;
pub use error::{EditorError, Result};
pub use session::SessionManager;
