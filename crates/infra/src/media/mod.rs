//! Media source loading

pub mod fs_loader;

pub use fs_loader::{content_type_for, FsMediaSourceLoader};
