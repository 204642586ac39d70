use rigging_core::artifact::ArtifactDescriptor;
use rigging_core::config::GlobalConfig;
use rigging_core::coordinate::ModuleVersionId;
use rigging_ops::ops_tree::{self, TreeOptions};
use rigging_ops::{ops_dependencies, ops_resolve, Project};
use rigging_repo::{FileRepository, ModuleDescriptor};
use tempfile::TempDir;

const MANIFEST: &str = r#"
[project]
name = "app"
repository = "repo"

[configurations.compile]
description = "Compile classpath"
dependencies = ["org.app:core:1.0"]

[configurations.testCompile]
extends = ["compile"]
dependencies = ["org.test:junit:4.13"]

[configurations.broken]
visible = false
dependencies = ["org.none:missing:1.0"]
"#;

fn publish(repo: &FileRepository, coordinate: &str, dependencies: &[&str]) {
    let id = ModuleVersionId::parse(coordinate).unwrap();
    let jar = ArtifactDescriptor::primary(&id.name);
    repo.install(
        &id,
        &ModuleDescriptor::with_dependencies(dependencies),
        &[(jar, coordinate.as_bytes())],
    )
    .unwrap();
}

fn project_dir() -> TempDir {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("Rigging.toml"), MANIFEST).unwrap();
    let repo = FileRepository::new(dir.path().join("repo"));
    publish(&repo, "org.app:core:1.0", &["org.lib:log:1.0", "org.lib:json:2.0"]);
    publish(&repo, "org.lib:json:2.0", &["org.lib:log:1.1"]);
    publish(&repo, "org.lib:log:1.0", &[]);
    publish(&repo, "org.lib:log:1.1", &[]);
    publish(&repo, "org.test:junit:4.13", &[]);
    dir
}

fn load(dir: &TempDir) -> Project {
    Project::load(dir.path(), &GlobalConfig::default()).unwrap()
}

#[tokio::test]
async fn discover_walks_up_to_the_manifest() {
    let dir = project_dir();
    let nested = dir.path().join("src").join("main");
    std::fs::create_dir_all(&nested).unwrap();
    let project = Project::discover(&nested, &GlobalConfig::default()).unwrap();
    assert_eq!(project.root, dir.path());
    assert_eq!(project.manifest.project.name, "app");
}

#[tokio::test]
async fn visible_configurations_resolve_concurrently() {
    let dir = project_dir();
    let project = load(&dir);
    let names = project.selected_configurations(&[]);
    assert_eq!(names, ["compile", "testCompile"]);

    let results = project.resolve_all(&names).await.unwrap();
    assert_eq!(results[0].configuration(), "compile");
    assert_eq!(results[0].files().len(), 3);
    assert_eq!(results[1].files().len(), 4);
    for file in results[0].files() {
        assert!(results[1].contains_file(file));
    }

    let listing = ops_resolve::render_files(&results);
    assert!(listing.starts_with("compile:\n"));
    assert!(listing.contains("log-1.1.jar"));
    assert!(!listing.contains("log-1.0.jar"));
}

#[tokio::test]
async fn json_lists_modules_and_conflicts() {
    let dir = project_dir();
    let project = load(&dir);
    let results = project.resolve_all(&["compile".to_string()]).await.unwrap();

    let json: serde_json::Value =
        serde_json::from_str(&ops_resolve::render_json(&results).unwrap()).unwrap();
    let compile = &json["configurations"][0];
    assert_eq!(compile["name"], "compile");
    assert_eq!(compile["modules"].as_array().unwrap().len(), 3);
    assert_eq!(compile["conflicts"][0]["requested"], "1.0");
    assert_eq!(compile["conflicts"][0]["selected"], "1.1");
}

#[tokio::test]
async fn failing_configuration_fails_the_batch() {
    let dir = project_dir();
    let project = load(&dir);
    let err = project
        .resolve_all(&["compile".to_string(), "broken".to_string()])
        .await
        .unwrap_err();
    assert!(err.to_string().contains("broken"), "{err}");
    assert!(project.configurations.state("compile").unwrap().is_resolved());
}

#[tokio::test]
async fn tree_views() {
    let dir = project_dir();
    let project = load(&dir);
    let name = project.tree_configuration(None).unwrap();
    assert_eq!(name, "compile");
    let result = project.resolve(&name).await.unwrap();

    let tree = ops_tree::render(&result, &TreeOptions::default());
    assert!(tree.contains("org.app:core:1.0"));
    assert!(tree.contains("org.lib:log:1.0 -> 1.1"));

    let shallow = ops_tree::render(
        &result,
        &TreeOptions {
            depth: Some(1),
            ..TreeOptions::default()
        },
    );
    assert!(!shallow.contains("org.lib:json"));

    let why = ops_tree::render(
        &result,
        &TreeOptions {
            why: Some("json".into()),
            ..TreeOptions::default()
        },
    );
    assert!(why.starts_with("Path to json:\n"));
    assert!(why.contains("org.lib:json:2.0"));

    let conflicts = ops_tree::render(
        &result,
        &TreeOptions {
            conflicts: true,
            ..TreeOptions::default()
        },
    );
    assert!(conflicts.contains("org.lib:log"));

    let inverted = ops_tree::render(
        &result,
        &TreeOptions {
            inverted: Some("org.lib:log".into()),
            ..TreeOptions::default()
        },
    );
    assert!(inverted.starts_with("org.lib:log:1.1\n"));
    assert!(inverted.contains("org.lib:json:2.0"));

    let missing = ops_tree::render(
        &result,
        &TreeOptions {
            inverted: Some("nothing".into()),
            ..TreeOptions::default()
        },
    );
    assert!(missing.contains("not found"));
}

#[tokio::test]
async fn dependencies_report_includes_failures_inline() {
    let dir = project_dir();
    let project = load(&dir);
    let report = ops_dependencies::report(
        &project,
        &["testCompile".to_string(), "broken".to_string()],
    )
    .await
    .unwrap();

    assert!(report.contains("testCompile\n  extends: compile\n"));
    assert!(report.contains("org.test:junit:4.13"));
    assert!(report.contains("broken\nFAILED:"));
    assert!(report.contains("org.none:missing:1.0"));
}

#[tokio::test]
async fn unknown_configuration_is_reported() {
    let dir = project_dir();
    let project = load(&dir);
    let err = ops_dependencies::report(&project, &["nope".to_string()])
        .await
        .unwrap_err();
    assert!(err.to_string().contains("nope"));
}
