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

use crate::renderer::api::{BufferId, MappedBuffer};
use std::fmt::Debug;

/// Owns buffer memory and hands out CPU mappings of it.
///
/// Mapping is a scoped borrow: a buffer is mapped at most once at a time and
/// every `map` is paired with one `unmap` by the same caller. Violations are
/// caller bugs and implementations panic on them rather than returning errors.
pub trait BufferStore: Send + Sync + Debug {
    /// Returns `true` if `id` names a live buffer.
    fn contains(&self, id: BufferId) -> bool;

    /// Returns the size in bytes of buffer `id`.
    fn size(&self, id: BufferId) -> Option<u64>;

    /// Maps buffer `id` for reading.
    ///
    /// # Panics
    ///
    /// Panics if `id` is unknown or already mapped.
    fn map(&self, id: BufferId) -> MappedBuffer;

    /// Ends the mapping of buffer `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` is unknown or not mapped.
    fn unmap(&self, id: BufferId);
}
