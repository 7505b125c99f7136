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

/// Counters describing the work a context has recorded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContextStats {
    /// Draw calls accepted, including empty ones.
    pub draws: u64,
    /// Primitives handed to the rasterize stage.
    pub primitives: u64,
    /// Clear calls accepted.
    pub clears: u64,
    /// Explicit flushes.
    pub flushes: u64,
    /// Resolutions that found dirty state.
    pub state_resolutions: u64,
    /// Batches submitted to the device, explicit and automatic.
    pub submitted_batches: u64,
    /// Words submitted to the device.
    pub submitted_words: u64,
}
