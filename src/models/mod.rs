// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Data models for projects, images and generation history.

pub mod history;
pub mod image;
pub mod project;
