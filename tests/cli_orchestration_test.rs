use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;
use git2::Oid;
use tempfile::TempDir;

use depbump::cli::orchestration::{BumpWorkflow, WorkflowStage};
use depbump::cli::Args;
use depbump::config::{Config, Credentials};
use depbump::domain::BumpRequest;
use depbump::git::mock::{MockCall, MockOperation};
use depbump::git::MockRepository;
use depbump::hosting::MockHostingApi;
use depbump::DepBumpError;

const MANIFEST: &str = r#"{
  "name": "widgets",
  "version": "2.0.0",
  "dependencies": {
    "lodash": "^4.17.21",
    "left-pad": "1.0.0"
  }
}
"#;

const BRANCH: &str = "bump-left-pad-v1.2.0";

fn fixture() -> (TempDir, MockRepository) {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("package.json"), MANIFEST).unwrap();

    let mut repo = MockRepository::new(dir.path());
    repo.add_branch("master", Oid::from_bytes(&[0xaa; 20]).unwrap());
    repo.set_remote_url("origin", "git@github.com:acme/widgets.git");
    (dir, repo)
}

fn credentials() -> Credentials {
    Credentials::new("octocat", "hunter2")
}

fn left_pad_request(dir: &Path) -> BumpRequest {
    BumpRequest::new(dir, "left-pad", "1.0.0", "^1.2.0")
}

fn manifest_on_disk(dir: &Path) -> String {
    fs::read_to_string(dir.join("package.json")).unwrap()
}

fn mutations(repo: &MockRepository) -> Vec<MockCall> {
    repo.calls().into_iter().filter(MockCall::is_mutation).collect()
}

#[test]
fn test_left_pad_end_to_end() {
    let (dir, repo) = fixture();
    let hosting = MockHostingApi::new();
    let config = Config::default();
    let workflow = BumpWorkflow::new(&repo, &hosting, &config, credentials());

    let outcome = workflow.run(&left_pad_request(dir.path())).unwrap();

    assert_eq!(outcome.branch, BRANCH);
    assert_eq!(
        outcome.pull_request.html_url,
        "https://github.com/acme/widgets/pull/1"
    );
    assert_eq!(workflow.stage(), WorkflowStage::PullRequestCreated);

    let requests = hosting.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].owner, "acme");
    assert_eq!(requests[0].repo, "widgets");
    assert_eq!(requests[0].head, BRANCH);
    assert_eq!(requests[0].base, "master");
    assert_eq!(requests[0].title, "[Technical] Bump left-pad to v1.2.0");
    assert_eq!(requests[0].body, None);
    assert_eq!(
        hosting.authentications(),
        vec![("https://api.github.com".to_string(), "octocat".to_string())]
    );

    let expected_manifest = MANIFEST.replace(
        r#""left-pad": "1.0.0""#,
        r#""left-pad": "^1.2.0""#,
    );
    assert_eq!(manifest_on_disk(dir.path()), expected_manifest);

    assert_eq!(
        repo.calls(),
        vec![
            MockCall::Status,
            MockCall::RemoteUrl("origin".to_string()),
            MockCall::DefaultBranch("origin".to_string()),
            MockCall::Checkout("master".to_string()),
            MockCall::Fetch("origin".to_string()),
            MockCall::Merge {
                local: "master".to_string(),
                remote_branch: "origin/master".to_string(),
            },
            MockCall::CreateBranch(BRANCH.to_string()),
            MockCall::Checkout(BRANCH.to_string()),
            MockCall::Commit {
                paths: vec![PathBuf::from("package.json")],
                message: "Bump left-pad to v1.2.0".to_string(),
            },
            MockCall::Push {
                remote: "origin".to_string(),
                branch: BRANCH.to_string(),
            },
        ]
    );
    assert_eq!(repo.branch_oid(BRANCH), Some(outcome.commit));
    assert_eq!(repo.head_branch().as_deref(), Some(BRANCH));
}

#[test]
fn test_missing_password_fails_without_side_effects() {
    let (dir, repo) = fixture();
    let hosting = MockHostingApi::new();
    let config = Config::default();
    let workflow = BumpWorkflow::new(&repo, &hosting, &config, Credentials::new("octocat", ""));

    let err = workflow.run(&left_pad_request(dir.path())).unwrap_err();

    assert!(matches!(err, DepBumpError::Configuration(_)));
    assert!(err.to_string().contains("GITHUB_PASSWORD"));
    assert_eq!(workflow.stage(), WorkflowStage::Start);
    assert!(repo.calls().is_empty());
    assert!(hosting.authentications().is_empty());
    assert_eq!(manifest_on_disk(dir.path()), MANIFEST);
}

#[test]
fn test_dirty_tree_fails_before_any_mutation() {
    let (dir, mut repo) = fixture();
    repo.add_changed_path("src/index.js");
    let hosting = MockHostingApi::new();
    let config = Config::default();
    let workflow = BumpWorkflow::new(&repo, &hosting, &config, credentials());

    let err = workflow.run(&left_pad_request(dir.path())).unwrap_err();

    assert!(err.is_precondition());
    assert!(err.to_string().contains("repo has uncommitted changes"));
    assert!(err.to_string().contains("src/index.js"));
    assert_eq!(workflow.stage(), WorkflowStage::CredentialsChecked);
    assert!(mutations(&repo).is_empty());
    assert_eq!(manifest_on_disk(dir.path()), MANIFEST);
}

#[test]
fn test_version_mismatch_fails_before_branch_creation() {
    let (dir, repo) = fixture();
    let hosting = MockHostingApi::new();
    let config = Config::default();
    let workflow = BumpWorkflow::new(&repo, &hosting, &config, credentials());

    let request = BumpRequest::new(dir.path(), "left-pad", "0.9.0", "^1.2.0");
    let err = workflow.run(&request).unwrap_err();

    assert!(err.is_precondition());
    assert!(err.to_string().contains("left-pad is at 1.0.0"));
    assert!(err.to_string().contains("expected 0.9.0"));
    assert_eq!(workflow.stage(), WorkflowStage::Synced);
    assert!(!repo
        .calls()
        .iter()
        .any(|call| matches!(call, MockCall::CreateBranch(_))));
    assert_eq!(manifest_on_disk(dir.path()), MANIFEST);
}

#[test]
fn test_version_check_is_exact() {
    let (dir, repo) = fixture();
    let hosting = MockHostingApi::new();
    let config = Config::default();
    let workflow = BumpWorkflow::new(&repo, &hosting, &config, credentials());

    // "^4.17.21" is recorded; the bare version must not match
    let request = BumpRequest::new(dir.path(), "lodash", "4.17.21", "^4.18.0");
    let err = workflow.run(&request).unwrap_err();
    assert!(err.is_precondition());
}

#[test]
fn test_unknown_package_is_precondition_error() {
    let (dir, repo) = fixture();
    let hosting = MockHostingApi::new();
    let config = Config::default();
    let workflow = BumpWorkflow::new(&repo, &hosting, &config, credentials());

    let request = BumpRequest::new(dir.path(), "react", "18.0.0", "18.2.0");
    let err = workflow.run(&request).unwrap_err();

    assert!(err.is_precondition());
    assert!(err.to_string().contains("react is not listed in 'dependencies'"));
}

#[test]
fn test_existing_branch_is_not_reused() {
    let (dir, mut repo) = fixture();
    repo.add_branch(BRANCH, Oid::from_bytes(&[9; 20]).unwrap());
    let hosting = MockHostingApi::new();
    let config = Config::default();
    let workflow = BumpWorkflow::new(&repo, &hosting, &config, credentials());

    let err = workflow.run(&left_pad_request(dir.path())).unwrap_err();

    assert!(matches!(err, DepBumpError::VersionControl(_)));
    assert!(err.to_string().contains("already exists"));
    assert_eq!(workflow.stage(), WorkflowStage::VersionVerified);
    assert_eq!(repo.branch_oid(BRANCH), Some(Oid::from_bytes(&[9; 20]).unwrap()));
    assert_eq!(manifest_on_disk(dir.path()), MANIFEST);
}

#[test]
fn test_merge_conflict_is_fatal() {
    let (dir, mut repo) = fixture();
    repo.fail_on(
        MockOperation::Merge,
        "Merging 'origin/master' into 'master' has conflicts: package.json",
    );
    let hosting = MockHostingApi::new();
    let config = Config::default();
    let workflow = BumpWorkflow::new(&repo, &hosting, &config, credentials());

    let err = workflow.run(&left_pad_request(dir.path())).unwrap_err();

    assert!(matches!(err, DepBumpError::VersionControl(_)));
    assert!(err.to_string().contains("has conflicts"));
    assert_eq!(workflow.stage(), WorkflowStage::TreeClean);
    assert!(hosting.requests().is_empty());
}

#[test]
fn test_rejected_push_keeps_local_commit_and_opens_no_pull_request() {
    let (dir, mut repo) = fixture();
    repo.fail_on(
        MockOperation::Push,
        "Failed to push 'bump-left-pad-v1.2.0' to 'origin': cannot push non-fastforwardable reference",
    );
    let hosting = MockHostingApi::new();
    let config = Config::default();
    let workflow = BumpWorkflow::new(&repo, &hosting, &config, credentials());

    let err = workflow.run(&left_pad_request(dir.path())).unwrap_err();

    assert!(matches!(err, DepBumpError::VersionControl(_)));
    assert!(err
        .to_string()
        .ends_with("cannot push non-fastforwardable reference"));
    assert_eq!(workflow.stage(), WorkflowStage::Committed);
    assert!(repo
        .calls()
        .iter()
        .any(|call| matches!(call, MockCall::Commit { .. })));
    assert_ne!(repo.branch_oid(BRANCH), repo.branch_oid("master"));
    assert!(hosting.authentications().is_empty());
    assert!(hosting.requests().is_empty());
    assert!(manifest_on_disk(dir.path()).contains(r#""left-pad": "^1.2.0""#));
}

#[test]
fn test_pull_request_rejection_is_hosting_error() {
    let (dir, repo) = fixture();
    let hosting = MockHostingApi::new();
    hosting.reject_with("creating pull request failed (422 Unprocessable Entity): Validation Failed");
    let config = Config::default();
    let workflow = BumpWorkflow::new(&repo, &hosting, &config, credentials());

    let err = workflow.run(&left_pad_request(dir.path())).unwrap_err();

    assert!(matches!(err, DepBumpError::HostingApi(_)));
    assert_eq!(workflow.stage(), WorkflowStage::Pushed);
}

#[test]
fn test_enterprise_remote_uses_enterprise_api() {
    let (dir, mut repo) = fixture();
    repo.set_remote_url("origin", "https://git.example.com/platform/widgets.git");
    let hosting = MockHostingApi::new();
    let config = Config::default();
    let workflow = BumpWorkflow::new(&repo, &hosting, &config, credentials());

    let outcome = workflow.run(&left_pad_request(dir.path())).unwrap();

    assert_eq!(
        hosting.authentications()[0].0,
        "https://git.example.com/api/v3"
    );
    assert_eq!(hosting.requests()[0].owner, "platform");
    assert_eq!(
        outcome.pull_request.html_url,
        "https://git.example.com/platform/widgets/pull/1"
    );
}

#[test]
fn test_unparsable_remote_fails_before_checkout() {
    let (dir, mut repo) = fixture();
    repo.set_remote_url("origin", "/srv/git/widgets.git");
    let hosting = MockHostingApi::new();
    let config = Config::default();
    let workflow = BumpWorkflow::new(&repo, &hosting, &config, credentials());

    let err = workflow.run(&left_pad_request(dir.path())).unwrap_err();

    assert!(err.to_string().contains("cannot determine owner/name"));
    assert!(mutations(&repo).is_empty());
}

#[test]
fn test_remote_head_and_configuration() {
    let dir = TempDir::new().unwrap();
    fs::create_dir(dir.path().join("web")).unwrap();
    fs::write(
        dir.path().join("web/package.json"),
        r#"{"devDependencies":{"@types/node":"~20.1.0"}}"#,
    )
    .unwrap();

    let mut repo = MockRepository::new(dir.path());
    repo.add_branch("main", Oid::from_bytes(&[1; 20]).unwrap());
    repo.set_remote_url("upstream", "git@github.com:acme/widgets.git");
    repo.set_remote_head("main");

    let mut config = Config::default();
    config.remote = "upstream".to_string();
    config.manifest = "web/package.json".to_string();
    config.dependency_field = "devDependencies".to_string();
    config.pull_request.title_prefix = String::new();
    config.pull_request.body = "Automated bump".to_string();

    let hosting = MockHostingApi::new();
    let workflow = BumpWorkflow::new(&repo, &hosting, &config, credentials());
    let request = BumpRequest::new(dir.path(), "@types/node", "~20.1.0", "~20.2.0");

    let outcome = workflow.run(&request).unwrap();

    assert_eq!(outcome.branch, "bump-typesnode-v20.2.0");
    let pr = &hosting.requests()[0];
    assert_eq!(pr.base, "main");
    assert_eq!(pr.title, "Bump typesnode to v20.2.0");
    assert_eq!(pr.body.as_deref(), Some("Automated bump"));
    assert!(repo.calls().contains(&MockCall::Commit {
        paths: vec![PathBuf::from("web/package.json")],
        message: "Bump typesnode to v20.2.0".to_string(),
    }));
    assert!(repo.calls().contains(&MockCall::Push {
        remote: "upstream".to_string(),
        branch: "bump-typesnode-v20.2.0".to_string(),
    }));
    assert_eq!(
        fs::read_to_string(dir.path().join("web/package.json")).unwrap(),
        "{\n  \"devDependencies\": {\n    \"@types/node\": \"~20.2.0\"\n  }\n}\n"
    );
}

#[test]
fn test_dot_prefixed_manifest_is_staged_repository_relative() {
    let (dir, repo) = fixture();
    let hosting = MockHostingApi::new();
    let config = Config {
        manifest: "./package.json".to_string(),
        ..Config::default()
    };
    let workflow = BumpWorkflow::new(&repo, &hosting, &config, credentials());

    workflow.run(&left_pad_request(dir.path())).unwrap();

    let commits: Vec<MockCall> = repo
        .calls()
        .into_iter()
        .filter(|call| matches!(call, MockCall::Commit { .. }))
        .collect();
    assert_eq!(
        commits,
        vec![MockCall::Commit {
            paths: vec![PathBuf::from("package.json")],
            message: "Bump left-pad to v1.2.0".to_string(),
        }]
    );
}

#[test]
fn test_manifest_outside_repository_fails_before_touching_it() {
    let (dir, repo) = fixture();
    let hosting = MockHostingApi::new();
    let config = Config {
        manifest: "../package.json".to_string(),
        ..Config::default()
    };
    let workflow = BumpWorkflow::new(&repo, &hosting, &config, credentials());

    let err = workflow.run(&left_pad_request(dir.path())).unwrap_err();

    assert!(matches!(err, DepBumpError::Configuration(_)));
    assert!(err.to_string().contains("../package.json"));
    assert_eq!(workflow.stage(), WorkflowStage::Start);
    assert!(repo.calls().is_empty());
    assert_eq!(manifest_on_disk(dir.path()), MANIFEST);
}

#[test]
fn test_args_positional() {
    let args = Args::try_parse_from(["depbump", "/repo", "left-pad", "1.0.0", "^1.2.0"]).unwrap();

    assert_eq!(
        args.bump_request(),
        BumpRequest::new("/repo", "left-pad", "1.0.0", "^1.2.0")
    );
    assert!(!args.verbose);

    let mut config = Config::default();
    args.apply_overrides(&mut config);
    assert_eq!(config, Config::default());
}

#[test]
fn test_args_missing_positional_is_rejected() {
    assert!(Args::try_parse_from(["depbump", "/repo", "left-pad", "1.0.0"]).is_err());
}

#[test]
fn test_args_overrides() {
    let args = Args::try_parse_from([
        "depbump",
        "/repo",
        "left-pad",
        "1.0.0",
        "^1.2.0",
        "--remote",
        "upstream",
        "--base",
        "main",
        "--manifest",
        "web/package.json",
        "--body",
        "Automated bump",
        "-v",
    ])
    .unwrap();

    let mut config = Config::default();
    args.apply_overrides(&mut config);

    assert!(args.verbose);
    assert_eq!(config.remote, "upstream");
    assert_eq!(config.default_branch.as_deref(), Some("main"));
    assert_eq!(config.manifest, "web/package.json");
    assert_eq!(config.pull_request.body, "Automated bump");
}
