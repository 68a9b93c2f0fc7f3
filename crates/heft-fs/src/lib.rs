//! Filesystem boundary for Heft.
//!
//! `heft-core` never touches the disk. Everything that reads build output
//! or writes reports goes through the [`FileSystem`] trait, which has a
//! native backend (blocking `std::fs` calls moved onto tokio's blocking
//! pool) and an in-memory backend used by tests and embedders.
//!
//! # Example
//!
//! ```no_run
//! use heft_fs::{FileSystem, NativeFileSystem};
//! use std::path::Path;
//!
//! # #[tokio::main]
//! # async fn main() -> std::io::Result<()> {
//! let fs = NativeFileSystem::new(".")?;
//! for file in fs.list_files(Path::new("dist")).await? {
//!     println!("{}", file.display());
//! }
//! # Ok(())
//! # }
//! ```

mod file_system;
pub use file_system::FileSystem;

#[cfg(feature = "native")]
pub mod native;
#[cfg(feature = "native")]
pub use native::{normalize_lexically, NativeFileSystem};

#[cfg(feature = "memory")]
pub mod memory;
#[cfg(feature = "memory")]
pub use memory::MemoryFileSystem;
