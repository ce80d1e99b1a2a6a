// ABOUTME: Remote file host access over the SSH file-transfer subsystem.
// ABOUTME: Exposes the session, its connector and the traits the deployer consumes.

mod error;
mod session;
mod target;
mod traits;

pub use error::{Result, TransferError};
pub use session::{RemoteSession, SftpConnector};
pub use target::RemoteTarget;
pub use traits::{RemoteConnector, RemoteEntry, RemoteFileClient};
