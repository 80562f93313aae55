//! Reconciliation E2E tests against real project trees

mod helper;

use std::sync::Arc;

use rstest::rstest;

use helper::{MapRegistry, TestProject};
use npm_outdated::config::Settings;
use npm_outdated::engine::{DependencyOutcome, Reconciler, Report, ResultSet, Severity};
use npm_outdated::parser::DependencyKind;

async fn run(project: &TestProject, registry: MapRegistry, settings: Settings) -> ResultSet {
    Reconciler::new(Arc::new(registry))
        .run(&project.manifest_path(), &settings)
        .await
}

fn outcome<'a>(results: &'a ResultSet, name: &str) -> &'a DependencyOutcome {
    results
        .get(name)
        .unwrap_or_else(|| panic!("No outcome for {name}"))
}

#[tokio::test]
async fn in_range_upgrade_is_outdated() {
    let project = TestProject::new(r#"{"dependencies": {"lodash": "^4.0.0"}}"#);
    project.install("lodash", "4.0.0");
    let registry = MapRegistry::new().with_tags("lodash", Some("4.1.0"), None);

    let results = run(&project, registry, Settings::default()).await;

    assert_eq!(
        results.into_vec(),
        vec![DependencyOutcome {
            name: "lodash".to_string(),
            version_range: "^4.0.0".to_string(),
            kind: DependencyKind::Production,
            local_version: Some("4.0.0".to_string()),
            local_outdated: false,
            npm_version_latest: Some("4.1.0".to_string()),
            npm_version_beta: None,
            npm_version: Some("4.1.0".to_string()),
            outdated: true,
            outdated_not_wanted: false,
        }]
    );
}

#[tokio::test]
async fn missing_install_is_unresolved_and_never_fetched() {
    let project = TestProject::new(r#"{"dependencies": {"left-pad": "^1.0.0"}}"#);
    let registry = Arc::new(MapRegistry::new().with_tags("left-pad", Some("1.3.0"), None));

    let results = Reconciler::new(registry.clone())
        .run(&project.manifest_path(), &Settings::default())
        .await;

    let left_pad = outcome(&results, "left-pad");
    assert!(left_pad.local_outdated);
    assert!(!left_pad.outdated);
    assert!(!left_pad.outdated_not_wanted);
    assert_eq!(left_pad.npm_version, None);
    assert!(registry.requests().is_empty());
}

#[tokio::test]
async fn out_of_range_upgrade_is_not_wanted() {
    let project = TestProject::new(r#"{"dependencies": {"foo": "^1.0.0"}}"#);
    project.install("foo", "1.0.0");
    let registry = MapRegistry::new().with_tags("foo", Some("2.0.0"), None);

    let results = run(&project, registry, Settings::default()).await;

    let foo = outcome(&results, "foo");
    assert!(!foo.local_outdated);
    assert_eq!(foo.npm_version.as_deref(), Some("2.0.0"));
    assert!(foo.outdated_not_wanted);
    assert!(!foo.outdated);
}

#[tokio::test]
async fn dev_only_manifest_is_empty_when_dev_checks_are_off() {
    let project = TestProject::new(r#"{"devDependencies": {"jest": "^29.0.0"}}"#);
    project.install("jest", "29.0.0");
    let registry = MapRegistry::new().with_tags("jest", Some("29.7.0"), None);
    let settings = Settings {
        check_dev_dependencies: false,
        ..Settings::default()
    };

    let results = run(&project, registry, settings).await;

    assert!(results.is_empty());
}

#[tokio::test]
async fn registry_failure_is_isolated_to_one_dependency() {
    let project = TestProject::new(
        r#"{"dependencies": {"a": "^1.0.0", "b": "^1.0.0", "c": "^1.0.0"}}"#,
    );
    project
        .install("a", "1.0.0")
        .install("b", "1.0.0")
        .install("c", "1.0.0");
    let registry = MapRegistry::new()
        .with_tags("a", Some("1.1.0"), None)
        .with_failure("b")
        .with_tags("c", Some("2.0.0"), None);

    let results = run(&project, registry, Settings::default()).await;

    let names: Vec<&str> = results.iter().map(|o| o.name.as_str()).collect();
    assert_eq!(names, vec!["a", "b", "c"]);

    let a = outcome(&results, "a");
    assert_eq!(a.npm_version_latest.as_deref(), Some("1.1.0"));
    assert!(a.outdated);

    let b = outcome(&results, "b");
    assert!(!b.local_outdated);
    assert_eq!(b.npm_version_latest, None);
    assert_eq!(b.npm_version, None);
    assert!(!b.outdated && !b.outdated_not_wanted);

    let c = outcome(&results, "c");
    assert_eq!(c.npm_version.as_deref(), Some("2.0.0"));
    assert!(c.outdated_not_wanted);
}

#[tokio::test]
async fn latest_wins_when_both_channels_satisfy() {
    let project = TestProject::new(r#"{"dependencies": {"pkg": ">=1.0.0"}}"#);
    project.install("pkg", "1.0.0");
    let registry = MapRegistry::new().with_tags("pkg", Some("1.5.0"), Some("1.6.0"));
    let settings = Settings {
        use_beta_channel: true,
        ..Settings::default()
    };

    let results = run(&project, registry, settings).await;

    let pkg = outcome(&results, "pkg");
    assert_eq!(pkg.npm_version.as_deref(), Some("1.5.0"));
    assert_eq!(pkg.npm_version_beta.as_deref(), Some("1.6.0"));
    assert!(pkg.outdated);
    assert!(!pkg.outdated_not_wanted);
}

#[tokio::test]
async fn prerelease_beta_above_bounded_range_is_not_wanted() {
    let project = TestProject::new(r#"{"dependencies": {"pkg": ">=1.0.0 <2.0.0"}}"#);
    project.install("pkg", "1.0.0");
    let registry = MapRegistry::new().with_tags("pkg", Some("0.9.0"), Some("2.0.0-beta.1"));
    let settings = Settings {
        use_beta_channel: true,
        ..Settings::default()
    };

    let results = run(&project, registry, settings).await;

    let pkg = outcome(&results, "pkg");
    assert_eq!(pkg.npm_version.as_deref(), Some("2.0.0-beta.1"));
    assert!(pkg.outdated_not_wanted);
    assert!(!pkg.outdated);
}

#[tokio::test]
async fn oversized_range_components_suppress_verdicts() {
    let project = TestProject::new(r#"{"dependencies": {"pkg": "^18446744073709551615.0.0"}}"#);
    project.install("pkg", "1.0.0");
    let registry = MapRegistry::new().with_tags("pkg", Some("2.0.0"), None);

    let results = run(&project, registry, Settings::default()).await;

    let pkg = outcome(&results, "pkg");
    assert!(!pkg.local_outdated);
    assert!(!pkg.outdated && !pkg.outdated_not_wanted);
}

#[tokio::test]
async fn satisfying_beta_beats_unwanted_latest() {
    let project = TestProject::new(r#"{"dependencies": {"pkg": "^1.0.0"}}"#);
    project.install("pkg", "1.0.0");
    let registry = MapRegistry::new().with_tags("pkg", Some("2.0.0"), Some("1.2.0"));
    let settings = Settings {
        use_beta_channel: true,
        ..Settings::default()
    };

    let results = run(&project, registry, settings).await;

    let pkg = outcome(&results, "pkg");
    assert_eq!(pkg.npm_version.as_deref(), Some("1.2.0"));
    assert!(pkg.outdated);
    assert!(!pkg.outdated_not_wanted);
}

#[rstest]
#[case::corrupt_json("{ not json")]
#[case::missing_version(r#"{"name": "pkg"}"#)]
#[case::numeric_version(r#"{"name": "pkg", "version": 1}"#)]
#[tokio::test]
async fn unreadable_local_manifest_counts_as_not_installed(#[case] content: &str) {
    let project = TestProject::new(r#"{"dependencies": {"pkg": "^1.0.0"}}"#);
    project.install_raw("pkg", content);
    let registry = MapRegistry::new().with_tags("pkg", Some("1.1.0"), None);

    let results = run(&project, registry, Settings::default()).await;

    let pkg = outcome(&results, "pkg");
    assert_eq!(pkg.local_version, None);
    assert!(pkg.local_outdated);
    assert!(!pkg.outdated);
}

#[tokio::test]
async fn unparseable_range_suppresses_verdicts() {
    let project = TestProject::new(r#"{"dependencies": {"pkg": "not a range"}}"#);
    project.install("pkg", "1.0.0");
    let registry = MapRegistry::new().with_tags("pkg", Some("2.0.0"), None);

    let results = run(&project, registry, Settings::default()).await;

    let pkg = outcome(&results, "pkg");
    assert!(!pkg.local_outdated);
    assert!(!pkg.outdated);
    assert!(!pkg.outdated_not_wanted);
    assert_eq!(pkg.npm_version, None);
}

#[tokio::test]
async fn invalid_manifest_yields_empty_results() {
    let project = TestProject::new("{ broken");

    let results = run(&project, MapRegistry::new(), Settings::default()).await;

    assert!(results.is_empty());
}

#[tokio::test]
async fn duplicate_names_produce_one_outcome_per_map() {
    let project = TestProject::new(
        r#"{"dependencies": {"pkg": "^1.0.0"}, "devDependencies": {"pkg": "^1.0.0"}}"#,
    );
    project.install("pkg", "1.0.0");
    let registry = MapRegistry::new().with_tags("pkg", Some("1.0.0"), None);

    let results = run(&project, registry, Settings::default()).await;

    let kinds: Vec<DependencyKind> = results.iter().map(|o| o.kind).collect();
    assert_eq!(
        kinds,
        vec![DependencyKind::Production, DependencyKind::Development]
    );
}

#[tokio::test]
async fn scoped_packages_resolve_locally_and_remotely() {
    let project = TestProject::new(r#"{"dependencies": {"@types/node": "^20.0.0"}}"#);
    project.install("@types/node", "20.1.0");
    let registry = MapRegistry::new().with_tags("@types/node", Some("20.11.5"), None);

    let results = run(&project, registry, Settings::default()).await;

    let node = outcome(&results, "@types/node");
    assert_eq!(node.local_version.as_deref(), Some("20.1.0"));
    assert!(node.outdated);
}

#[tokio::test]
async fn rerun_on_unchanged_state_is_identical() {
    let project = TestProject::new(
        r#"{"dependencies": {"a": "^1.0.0", "b": "^1.0.0"}, "devDependencies": {"c": "~2.0.0"}}"#,
    );
    project.install("a", "1.0.0").install("c", "2.0.1");
    let registry = Arc::new(
        MapRegistry::new()
            .with_tags("a", Some("1.2.0"), None)
            .with_tags("c", Some("2.1.0"), None),
    );
    let reconciler = Reconciler::new(registry);

    let first = reconciler
        .run(&project.manifest_path(), &Settings::default())
        .await;
    let second = reconciler
        .run(&project.manifest_path(), &Settings::default())
        .await;

    assert_eq!(first, second);
    for outcome in &first {
        assert!(!(outcome.outdated && outcome.outdated_not_wanted));
    }
}

#[tokio::test]
async fn report_renders_every_category_in_declaration_order() {
    let project = TestProject::new(
        r#"{"dependencies": {"lodash": "^4.0.0", "left-pad": "^1.0.0", "foo": "^1.0.0"}}"#,
    );
    project.install("lodash", "4.0.0").install("foo", "1.0.0");
    let registry = MapRegistry::new()
        .with_tags("lodash", Some("4.1.0"), None)
        .with_tags("foo", Some("2.0.0"), None);
    let settings = Settings::default();

    let results = run(&project, registry, settings).await;
    let notification = Report::from_results(&results, &settings)
        .notification("package.json")
        .unwrap();

    assert_eq!(notification.severity, Severity::Warning);
    assert_eq!(
        notification.lines,
        vec![
            "lodash outdated: 4.0.0 => 4.1.0",
            "left-pad needs update",
            "foo updated: 1.0.0 => 2.0.0",
        ]
    );
}
