// ABOUTME: Deployment orchestration over the git and remote-host targets.
// ABOUTME: Exports the deployer, target selection and outcome types.

mod deployer;
mod outcome;

pub use deployer::{CheckReport, DeployOptions, Deployer, UploadSummary};
pub use outcome::{DeploymentOutcome, Selector, TargetKind, all_succeeded};
