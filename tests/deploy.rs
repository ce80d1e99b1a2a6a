// ABOUTME: Integration tests for the deployer against fake git and remote host.
// ABOUTME: Covers target ordering, protection, best-effort uploads and session cleanup.

mod support;

use sitepush::deploy::{DeployOptions, Deployer, Selector, TargetKind, all_succeeded};
use sitepush::filter::PathFilter;
use sitepush::output::{Output, OutputMode};
use sitepush::tree::TreeEnumerator;
use sitepush::vcs::Step;
use support::{FakeRemote, FakeVcs, REMOTE_ROOT, deployer, relative_to_root, touch};
use tempfile::TempDir;

fn quiet() -> Output {
    Output::new(OutputMode::Quiet)
}

fn site() -> TempDir {
    let dir = TempDir::new().unwrap();
    touch(dir.path(), "index.html");
    touch(dir.path(), "css/main.css");
    touch(dir.path(), "img/logo/logo.svg");
    dir
}

fn no_rules() -> PathFilter {
    PathFilter::default()
}

/// Test: remote root `/srv/site`, protected `blog`, local `blog/new-post.html`.
/// Expected: no write call references anything under `blog/`.
#[tokio::test]
async fn protected_subtree_is_never_written() {
    support::init_tracing();
    let dir = site();
    touch(dir.path(), "blog/new-post.html");
    touch(dir.path(), "blog/2024/archive.html");
    touch(dir.path(), "blogroll.html");

    let remote = FakeRemote::default();
    let filter = PathFilter::new(Vec::<String>::new(), ["blog"]).unwrap();
    let deployer = deployer(dir.path(), filter, FakeVcs::clean(), remote.connector());

    let outcome = deployer.deploy_host(&quiet()).await;

    assert!(outcome.succeeded, "outcome: {:?}", outcome);
    for write in remote.writes() {
        let rel = relative_to_root(&write).unwrap_or("");
        assert!(
            rel != "blog" && !rel.starts_with("blog/"),
            "write issued for protected path {write}"
        );
    }
    let files = remote.files();
    assert!(files.contains_key("/srv/site/blogroll.html"));
    assert!(files.contains_key("/srv/site/index.html"));
    assert_eq!(outcome.files_transferred, 4);
    assert_eq!(outcome.warnings, ["blog skipped (protected remote path)"]);
}

/// Test: remote connection fails while the git push succeeds.
/// Expected: outcomes are [git ok, host failed] in that order.
#[tokio::test]
async fn connection_failure_does_not_affect_git_outcome() {
    let dir = site();
    let remote = FakeRemote::default();
    let vcs = FakeVcs::dirty(&[" M index.html"]);
    let deployer = deployer(dir.path(), no_rules(), vcs.clone(), remote.failing_connector());

    let outcomes = deployer.run(Selector::Both, &quiet()).await;

    assert_eq!(outcomes.len(), 2);
    assert_eq!(outcomes[0].target, TargetKind::VersionControl);
    assert!(outcomes[0].succeeded);
    assert_eq!(outcomes[1].target, TargetKind::RemoteHost);
    assert!(!outcomes[1].succeeded);
    assert!(outcomes[1].message.contains("connection refused"));
    assert!(!all_succeeded(&outcomes));
    assert!(vcs.calls().contains(&"push".to_string()));
}

/// Test: git fails but the remote host is still attempted.
#[tokio::test]
async fn git_failure_does_not_prevent_host_upload() {
    let dir = site();
    let remote = FakeRemote::default();
    let vcs = FakeVcs::dirty(&["?? new.html"]).failing_at(Step::Push);
    let deployer = deployer(dir.path(), no_rules(), vcs, remote.connector());

    let outcomes = deployer.run(Selector::Both, &quiet()).await;

    assert_eq!(
        outcomes.iter().map(|o| o.target).collect::<Vec<_>>(),
        [TargetKind::VersionControl, TargetKind::RemoteHost]
    );
    assert!(!outcomes[0].succeeded);
    assert!(outcomes[0].message.contains("git push failed"));
    assert!(outcomes[1].succeeded);
    assert_eq!(outcomes[1].files_transferred, 3);
}

/// Test: single-target selectors produce exactly one outcome.
#[tokio::test]
async fn single_target_selectors() {
    let dir = site();
    let remote = FakeRemote::default();
    let vcs = FakeVcs::clean();
    let deployer = deployer(dir.path(), no_rules(), vcs.clone(), remote.connector());

    let git_only = deployer.run(Selector::Git, &quiet()).await;
    assert_eq!(git_only.len(), 1);
    assert_eq!(git_only[0].target, TargetKind::VersionControl);
    assert_eq!(remote.state.lock().opened, 0);

    let host_only = deployer.run(Selector::RemoteHost, &quiet()).await;
    assert_eq!(host_only.len(), 1);
    assert_eq!(host_only[0].target, TargetKind::RemoteHost);
    assert_eq!(vcs.calls(), ["status"]);
}

/// Test: deploying twice against an unchanged tree leaves the same remote state.
#[tokio::test]
async fn repeated_deploy_is_idempotent() {
    let dir = site();
    let remote = FakeRemote::default();
    let deployer = deployer(dir.path(), no_rules(), FakeVcs::clean(), remote.connector());

    let first = deployer.deploy_host(&quiet()).await;
    let files_after_first = remote.files();
    let dirs_after_first = remote.dirs();

    let second = deployer.deploy_host(&quiet()).await;

    assert!(first.succeeded && second.succeeded);
    assert_eq!(first.files_transferred, second.files_transferred);
    assert_eq!(remote.files(), files_after_first);
    assert_eq!(remote.dirs(), dirs_after_first);
    assert_eq!(remote.state.lock().opened, 2);
    assert_eq!(remote.state.lock().closed, 2);
}

/// Test: directories are created before the files inside them.
#[tokio::test]
async fn parent_directories_precede_files() {
    let dir = site();
    let remote = FakeRemote::default();
    let deployer = deployer(dir.path(), no_rules(), FakeVcs::clean(), remote.connector());

    deployer.deploy_host(&quiet()).await;

    let writes = remote.writes();
    assert_eq!(writes[0], REMOTE_ROOT);
    let position = |p: &str| writes.iter().position(|w| w == p).unwrap();
    assert!(position("/srv/site/img") < position("/srv/site/img/logo"));
    assert!(position("/srv/site/img/logo") < position("/srv/site/img/logo/logo.svg"));
    assert!(position("/srv/site/css") < position("/srv/site/css/main.css"));
}

/// Test: one failing upload is reported but the remaining files still go out.
#[tokio::test]
async fn failed_upload_does_not_abort_queue() {
    let dir = site();
    let remote = FakeRemote::default();
    remote
        .state
        .lock()
        .fail_uploads
        .insert("/srv/site/css/main.css".to_string());
    let deployer = deployer(dir.path(), no_rules(), FakeVcs::clean(), remote.connector());

    let outcome = deployer.deploy_host(&quiet()).await;

    assert!(!outcome.succeeded);
    assert_eq!(outcome.files_transferred, 2);
    assert!(outcome.message.contains("first error: css/main.css"));
    let files = remote.files();
    assert!(files.contains_key("/srv/site/index.html"));
    assert!(files.contains_key("/srv/site/img/logo/logo.svg"));
    assert_eq!(remote.state.lock().closed, 1);
}

/// Test: the first failure is the one reported when several uploads fail.
#[tokio::test]
async fn first_error_is_reported() {
    let dir = site();
    let remote = FakeRemote::default();
    {
        let mut state = remote.state.lock();
        state.fail_uploads.insert("/srv/site/css/main.css".to_string());
        state.fail_uploads.insert("/srv/site/index.html".to_string());
    }
    let deployer = deployer(dir.path(), no_rules(), FakeVcs::clean(), remote.connector());

    let outcome = deployer.deploy_host(&quiet()).await;

    assert!(outcome.message.contains("2 failed"));
    assert!(outcome.message.contains("first error: css/main.css"));
}

/// Test: a remote root that cannot be created fails the target and closes the session.
#[tokio::test]
async fn uncreatable_root_is_fatal_and_session_closed() {
    let dir = site();
    let remote = FakeRemote::default();
    remote
        .state
        .lock()
        .fail_dirs
        .insert(REMOTE_ROOT.to_string());
    let deployer = deployer(dir.path(), no_rules(), FakeVcs::clean(), remote.connector());

    let outcome = deployer.deploy_host(&quiet()).await;

    assert!(!outcome.succeeded);
    assert_eq!(outcome.files_transferred, 0);
    assert!(remote.files().is_empty());
    assert_eq!(remote.state.lock().closed, 1);
}

/// Test: an unreadable local root fails before any connection is attempted.
#[tokio::test]
async fn enumeration_failure_skips_connection() {
    let remote = FakeRemote::default();
    let deployer = deployer(
        std::path::Path::new("/nonexistent/sitepush/site"),
        no_rules(),
        FakeVcs::clean(),
        remote.connector(),
    );

    let outcome = deployer.deploy_host(&quiet()).await;

    assert!(!outcome.succeeded);
    assert!(outcome.message.contains("cannot read"));
    assert_eq!(remote.state.lock().opened, 0);
}

/// Test: an unresolved remote target fails only the host outcome.
#[tokio::test]
async fn unresolved_target_fails_host_only() {
    let dir = site();
    let remote = FakeRemote::default();
    let options = DeployOptions {
        local_root: dir.path().to_path_buf(),
        target: Err("missing required environment variable: SITEPUSH_PASSWORD".to_string()),
        commit_prefix: "Deploy".to_string(),
    };
    let deployer = Deployer::new(
        options,
        no_rules(),
        Box::new(TreeEnumerator::new(no_rules())),
        Box::new(FakeVcs::clean()),
        Box::new(remote.connector()),
    );

    let outcomes = deployer.run(Selector::Both, &quiet()).await;

    assert!(outcomes[0].succeeded);
    assert!(!outcomes[1].succeeded);
    assert!(outcomes[1].message.contains("SITEPUSH_PASSWORD"));
}

/// Test: excluded local entries never reach the remote host.
#[tokio::test]
async fn excluded_entries_are_not_uploaded() {
    let dir = site();
    touch(dir.path(), ".git/HEAD");
    touch(dir.path(), ".env");
    touch(dir.path(), "node_modules/pkg/index.js");

    let remote = FakeRemote::default();
    let filter =
        PathFilter::new([".git", ".env", "node_modules"], Vec::<String>::new()).unwrap();
    let deployer = deployer(dir.path(), filter, FakeVcs::clean(), remote.connector());

    let outcome = deployer.deploy_host(&quiet()).await;

    assert!(outcome.succeeded);
    assert!(remote.writes().iter().all(|w| {
        !w.contains("/.git") && !w.contains("/.env") && !w.contains("node_modules")
    }));
}

/// Test: check lists the hosting root and remote root without writing.
#[tokio::test]
async fn check_is_read_only() {
    let dir = site();
    let remote = FakeRemote::default();
    {
        let mut state = remote.state.lock();
        state.dirs.insert("/srv".to_string());
        state.dirs.insert("/srv/site".to_string());
        state.dirs.insert("/srv/other".to_string());
        state
            .files
            .insert("/srv/site/index.html".to_string(), b"old".to_vec());
    }
    let deployer = deployer(dir.path(), no_rules(), FakeVcs::clean(), remote.connector());

    let report = deployer.check().await.unwrap();

    assert_eq!(
        report.hosting_dirs,
        Some(vec!["other".to_string(), "site".to_string()])
    );
    let entries = report.remote_root_entries.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].name, "index.html");
    assert!(remote.writes().is_empty());
    assert_eq!(remote.state.lock().closed, 1);
}

/// Test: check reports a missing remote root instead of failing.
#[tokio::test]
async fn check_reports_missing_remote_root() {
    let dir = site();
    let remote = FakeRemote::default();
    remote.state.lock().dirs.insert("/srv".to_string());
    let deployer = deployer(dir.path(), no_rules(), FakeVcs::clean(), remote.connector());

    let report = deployer.check().await.unwrap();

    assert!(report.remote_root_entries.is_none());
    assert!(remote.writes().is_empty());
}

/// Test: check surfaces connection failures as errors.
#[tokio::test]
async fn check_connection_failure_is_error() {
    let dir = site();
    let remote = FakeRemote::default();
    let deployer = deployer(dir.path(), no_rules(), FakeVcs::clean(), remote.failing_connector());

    let err = deployer.check().await.unwrap_err();
    assert!(err.to_string().contains("connection refused"));
}
