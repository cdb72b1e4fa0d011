// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

pub mod builder;
pub mod fallback;
pub mod index_manager;
pub mod monitor;
pub mod query;
pub mod registry;
pub mod sanitize;
pub mod search;
pub mod store;
