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
/// Error types for storage fetches
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("IO error reading {id}: {source}")]
    Io {
        id: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Unsupported identifier scheme: {0}")]
    UnsupportedScheme(String),

    #[error("HTTP error fetching {id}: {source}")]
    Http {
        id: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Unexpected HTTP status {status} fetching {id}")]
    Status { id: String, status: u16 },
}
