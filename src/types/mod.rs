// ABOUTME: Validated domain types shared across modules.
// ABOUTME: Keeps path validation in one place.

mod relative_path;

pub use relative_path::{RelativePath, RelativePathError};
