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

use crate::renderer::api::*;
use crate::renderer::error::{RenderError, ResourceError};
use std::fmt::Debug;

/// The device (screen) a context records for.
///
/// The device is externally owned and shared between contexts; a context only
/// keeps an `Arc` to it.
pub trait GraphicsDevice: Send + Sync + Debug + 'static {
    /// Allocates a command batch.
    /// ## Arguments
    /// * `descriptor` - The batch size and label.
    /// ## Errors
    /// * `ResourceError` - If the device cannot allocate the batch.
    fn create_batch(&self, descriptor: &BatchDescriptor) -> Result<BatchHandle, ResourceError>;

    /// Releases a batch allocated by [`GraphicsDevice::create_batch`].
    fn destroy_batch(&self, batch: BatchHandle);

    /// Submits the recorded words of `batch` for execution.
    ///
    /// Submission is synchronous: the call returns once the device accepted the words.
    /// ## Errors
    /// * `RenderError::SubmissionFailed` - If the device rejects the batch.
    fn submit_batch(&self, batch: BatchHandle, words: &[u32]) -> Result<(), RenderError>;

    /// Describes the device.
    fn device_info(&self) -> DeviceInfo;

    /// Indicates whether the device can drive the given rasterize path.
    fn supports_path(&self, path: RasterizePath) -> bool;
}
