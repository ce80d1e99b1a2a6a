// ABOUTME: Version-control target: detect changes, commit and push.
// ABOUTME: The git binary sits behind the VersionControlClient trait.

mod error;
mod git;
mod publisher;

pub use error::{Error, Result, Step};
pub use git::{GitCli, VersionControlClient, WorkingTreeStatus};
pub use publisher::{PublishResult, VersionControlPublisher, commit_message};
