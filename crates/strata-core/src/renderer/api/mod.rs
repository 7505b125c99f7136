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

//! Backend-agnostic value types of the graphics context.
//!
//! Organized into several logical sub-modules:
//!
//! - **[`buffer`]**: buffer handles, descriptors, bindings and mappings.
//! - **[`device`]**: batch handles and device information.
//! - **[`draw`]**: the [`DrawInfo`] describing one draw call.
//! - **[`enums`]**: generic rendering enums.
//! - **[`settings`]**: context configuration.
//! - **[`state`]**: pipeline state descriptors.
//! - **[`surface`]**: surfaces and the framebuffer.

pub mod buffer;
pub mod device;
pub mod draw;
pub mod enums;
pub mod settings;
pub mod state;
pub mod surface;

pub use self::buffer::*;
pub use self::device::*;
pub use self::draw::*;
pub use self::enums::*;
pub use self::settings::*;
pub use self::state::*;
pub use self::surface::*;
