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

//! # Strata Infra
//!
//! Concrete implementations of the contracts defined in `strata-core`: a
//! system-memory buffer store, a software device that validates and
//! publishes submitted batches, and a reference primitive assembler.

#![warn(missing_docs)]

pub mod graphics;

pub use graphics::software::{
    BufferStoreStats, HostBufferStore, SoftwareAssembler, SoftwareDevice, SoftwareDeviceBuilder,
    Submission, SubmissionSummary, DEFAULT_FEED_CAPACITY,
};
