// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

use serde::{Deserialize, Serialize};

/// Response for the version endpoint
#[derive(Debug, Serialize, Deserialize)]
pub struct VersionResponse {
    pub agent: String,
    pub version: String,
}
