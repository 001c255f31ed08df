// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Process exit codes

/// Run completed; failing checks alone do not change this
pub const SUCCESS: i32 = 0;
/// `--fail-on-violation` was set and at least one check failed
pub const VIOLATION: i32 = 1;
/// Unreadable model, invalid configuration or bad arguments
pub const INVALID_INPUT: i32 = 2;
