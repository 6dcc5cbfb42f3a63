// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Chunked transfer of large resources over a size-bounded request/reply
//! channel.
//!
//! The bus limits the size of one message, so a firmware image is pulled by
//! the client one chunk at a time. [`TransferEngine`] owns the cursor and the
//! open handle; the client only states how many bytes it wants next.

mod engine;
mod session;

pub use engine::{ChunkResult, DEFAULT_MAX_CHUNK_SIZE, TransferEngine};
pub use session::{SessionId, TransferSession, TransferState};
