// ABOUTME: Deploy command implementation.
// ABOUTME: Runs the selected targets and prints a per-target summary.

use sitepush::config::Config;
use sitepush::deploy::{Deployer, Selector, all_succeeded};
use sitepush::error::{Error, Result};
use sitepush::output::Output;

/// Publish to the selected targets. Fails if any requested target failed.
pub async fn deploy(config: Config, selector: Selector, mut output: Output) -> Result<()> {
    output.start_timer();
    let deployer = Deployer::from_config(&config)?;

    output.progress(&format!(
        "Publishing {} ({} target(s))",
        config.local_root().display(),
        selector.targets().len()
    ));

    let outcomes = deployer.run(selector, &output).await;

    for outcome in &outcomes {
        for warning in &outcome.warnings {
            output.warning(warning);
        }
    }

    output.summary(&outcomes);

    if all_succeeded(&outcomes) {
        output.success("Deployment complete!");
        Ok(())
    } else {
        let failed = outcomes.iter().filter(|o| !o.succeeded).count();
        Err(Error::TargetsFailed(failed))
    }
}
