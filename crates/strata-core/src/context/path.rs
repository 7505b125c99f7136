// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::renderer::api::RasterizePath;
use crate::renderer::error::RenderError;

/// How the rasterize path of a context was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathResolution {
    /// The device supports the requested path.
    Requested(RasterizePath),
    /// The device lacks the requested path and the other one is used instead.
    Fallback {
        /// The configured path.
        requested: RasterizePath,
        /// The path actually installed.
        used: RasterizePath,
    },
}

impl PathResolution {
    /// The path to install.
    pub fn path(&self) -> RasterizePath {
        match self {
            PathResolution::Requested(path) => *path,
            PathResolution::Fallback { used, .. } => *used,
        }
    }

    /// Returns `true` if the requested path was not available.
    pub fn is_fallback(&self) -> bool {
        matches!(self, PathResolution::Fallback { .. })
    }
}

/// Picks the rasterize path, falling back to the other one when `supports`
/// rejects the requested path.
///
/// ## Errors
/// * `RenderError::InitializationFailed` - If neither path is supported.
pub fn resolve_rasterize_path(
    requested: RasterizePath,
    supports: impl Fn(RasterizePath) -> bool,
) -> Result<PathResolution, RenderError> {
    if supports(requested) {
        return Ok(PathResolution::Requested(requested));
    }

    let used = requested.alternate();
    if supports(used) {
        log::warn!(
            "Rasterize path {:?} is unavailable, falling back to {:?}",
            requested,
            used
        );
        return Ok(PathResolution::Fallback { requested, used });
    }

    Err(RenderError::InitializationFailed(format!(
        "no rasterize path available (requested {requested:?})"
    )))
}
