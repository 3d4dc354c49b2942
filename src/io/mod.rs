// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! I/O operations for images and saved projects.

pub mod flush;
pub mod media;
pub mod serialization;
pub mod store;
