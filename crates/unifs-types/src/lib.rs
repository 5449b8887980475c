//! unifs-types: pure data types shared by every unifs backend.
//!
//! Nothing in here performs I/O:
//!
//! - **FileType** / **FileInfo**: normalized metadata for one directory entry
//! - **DirEntry**: the backend-neutral `FileInfo` value
//! - **ConnectionState**: lifecycle of a remote adapter
//! - **FsError**: the error taxonomy every adapter reports in

mod error;
mod info;
mod state;

pub use error::{FsError, FsResult};
pub use info::{DirEntry, FileInfo, FileType};
pub use state::ConnectionState;
