// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//
use std::error::Error;
use std::sync::Arc;

use crate::decoder::DecodeError;
use crate::storage::StorageError;

/// Why the load of an instrument failed. Only custom loaders and the runtime can fail
/// a load; individual samples that cannot be loaded are skipped instead.
#[derive(Debug, Clone, thiserror::Error)]
pub enum LoadError {
    /// The custom loader returned this error.
    #[error(transparent)]
    Loader(Arc<dyn Error + Send + Sync>),

    #[error("No tokio runtime was available to load samples")]
    NoRuntime,

    #[error("The load task ended without reporting a result")]
    Aborted,
}

/// Why a single sample was left out of the registry.
#[derive(Debug, thiserror::Error)]
pub enum SkipReason {
    #[error("Fetch failed: {0}")]
    Fetch(#[from] StorageError),

    #[error("No data")]
    NoData,

    #[error("Decode failed: {0}")]
    Decode(#[from] DecodeError),

    #[error("Decode task aborted: {0}")]
    Aborted(String),
}
