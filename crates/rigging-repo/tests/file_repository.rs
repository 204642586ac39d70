use std::sync::Arc;

use rigging_core::artifact::ArtifactDescriptor;
use rigging_core::coordinate::{ModuleId, ModuleVersionId};
use rigging_core::dependency::Dependency;
use rigging_core::manifest::DependencySpec;
use rigging_repo::checksum::sidecar_path;
use rigging_repo::{FileRepository, ModuleDescriptor};
use rigging_resolver::cache::CachingMetadataProvider;
use rigging_resolver::metadata::{ArtifactMaterializer, FetchError, ModuleMetadataProvider};
use rigging_resolver::{ConfigurationContainer, ResolveError, Resolver};
use tempfile::TempDir;

fn id(coordinate: &str) -> ModuleVersionId {
    ModuleVersionId::parse(coordinate).unwrap()
}

/// Install `coordinate` with the given dependencies and a primary jar.
fn publish(repo: &FileRepository, coordinate: &str, dependencies: &[&str]) {
    let id = id(coordinate);
    let jar = ArtifactDescriptor::primary(&id.name);
    repo.install(
        &id,
        &ModuleDescriptor::with_dependencies(dependencies),
        &[(jar, coordinate.as_bytes())],
    )
    .unwrap();
}

fn setup() -> (TempDir, FileRepository) {
    let dir = TempDir::new().unwrap();
    let repo = FileRepository::new(dir.path());
    (dir, repo)
}

fn resolver_for(repo: FileRepository) -> Resolver {
    let repo = Arc::new(repo);
    Resolver::new(Arc::new(CachingMetadataProvider::new(repo.clone())), repo)
}

#[tokio::test]
async fn lookup_reads_installed_descriptor() {
    let (_dir, repo) = setup();
    publish(&repo, "org.a:a:1.0", &["org.b:b:2.0"]);

    let metadata = repo.lookup(&id("org.a:a:1.0")).await.unwrap().unwrap();
    assert_eq!(metadata.dependencies.len(), 1);
    assert_eq!(metadata.dependencies[0].dependency.to_string(), "org.b:b:2.0");
    assert_eq!(metadata.artifacts, [ArtifactDescriptor::primary("a")]);
}

#[tokio::test]
async fn missing_module_is_none() {
    let (_dir, repo) = setup();
    assert!(repo.lookup(&id("org.a:a:1.0")).await.unwrap().is_none());
}

#[tokio::test]
async fn broken_descriptor_is_a_metadata_error() {
    let (dir, repo) = setup();
    let version_dir = dir.path().join("org/a/a/1.0");
    std::fs::create_dir_all(&version_dir).unwrap();
    std::fs::write(version_dir.join("module.toml"), "dependencies = 42").unwrap();

    let err = repo.lookup(&id("org.a:a:1.0")).await.unwrap_err();
    assert!(err.message.contains("module.toml"));
}

#[tokio::test]
async fn list_versions_only_counts_published_versions() {
    let (dir, repo) = setup();
    publish(&repo, "org.a:a:1.0", &[]);
    publish(&repo, "org.a:a:1.2", &[]);
    std::fs::create_dir_all(dir.path().join("org/a/a/2.0-wip")).unwrap();

    let versions = repo
        .list_versions(&ModuleId::new(Some("org.a"), "a"))
        .await
        .unwrap();
    assert_eq!(versions, ["1.0", "1.2"]);
    assert!(repo
        .list_versions(&ModuleId::new(Some("org.none"), "none"))
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn fetch_detects_tampered_artifact() {
    let (_dir, repo) = setup();
    publish(&repo, "org.a:a:1.0", &[]);
    let jar = ArtifactDescriptor::primary("a");
    let path = repo.fetch(&id("org.a:a:1.0"), &jar).await.unwrap();
    std::fs::write(&path, b"tampered").unwrap();

    let err = repo.fetch(&id("org.a:a:1.0"), &jar).await.unwrap_err();
    assert!(matches!(err, FetchError::Checksum { ref file, .. } if file == "a-1.0.jar"));

    let unchecked = repo.clone().without_checksums();
    assert_eq!(unchecked.fetch(&id("org.a:a:1.0"), &jar).await.unwrap(), path);
}

#[tokio::test]
async fn fetch_missing_file_is_not_found() {
    let (_dir, repo) = setup();
    publish(&repo, "org.a:a:1.0", &[]);
    let sources = ArtifactDescriptor {
        classifier: Some("sources".into()),
        ..ArtifactDescriptor::primary("a")
    };
    let err = repo.fetch(&id("org.a:a:1.0"), &sources).await.unwrap_err();
    assert!(matches!(err, FetchError::NotFound { ref file } if file == "a-1.0-sources.jar"));
}

#[tokio::test]
async fn install_writes_sidecars() {
    let (_dir, repo) = setup();
    publish(&repo, "org.a:a:1.0", &[]);
    let jar = repo
        .layout()
        .artifact_path(&id("org.a:a:1.0"), &ArtifactDescriptor::primary("a"));
    assert!(jar.is_file());
    assert!(sidecar_path(&jar).is_file());
}

#[tokio::test]
async fn resolves_transitive_graph_from_disk() {
    let (_dir, repo) = setup();
    publish(&repo, "org.app:core:1.0", &["org.lib:json:2.0", "org.lib:log:1.0"]);
    publish(&repo, "org.lib:json:2.0", &["org.lib:log:1.1"]);
    publish(&repo, "org.lib:log:1.0", &[]);
    publish(&repo, "org.lib:log:1.1", &[]);
    let resolver = resolver_for(repo);

    let mut configurations = ConfigurationContainer::new();
    configurations
        .create("compile")
        .unwrap()
        .add_dependency(Dependency::parse("org.app:core:1.0").unwrap());

    let result = configurations.resolve("compile", &resolver).await.unwrap();
    let mut names: Vec<String> = result.modules().iter().map(|m| m.id.to_string()).collect();
    names.sort();
    assert_eq!(names, ["org.app:core:1.0", "org.lib:json:2.0", "org.lib:log:1.1"]);
    assert_eq!(result.files().len(), 3);
    assert!(result.files().iter().all(|f| f.is_file()));
    assert_eq!(result.conflicts().len(), 1);
}

#[tokio::test]
async fn prefix_version_picks_highest_published() {
    let (_dir, repo) = setup();
    publish(&repo, "org.lib:log:1.0", &[]);
    publish(&repo, "org.lib:log:1.9", &[]);
    publish(&repo, "org.lib:log:2.0", &[]);
    let resolver = resolver_for(repo);

    let mut configurations = ConfigurationContainer::new();
    configurations
        .create("compile")
        .unwrap()
        .add_dependency(Dependency::parse("org.lib:log:1.+").unwrap());

    let result = configurations.resolve("compile", &resolver).await.unwrap();
    assert_eq!(result.modules()[0].id, id("org.lib:log:1.9"));
}

#[tokio::test]
async fn scoped_dependencies_follow_target_configuration() {
    let (_dir, repo) = setup();
    let mut descriptor = ModuleDescriptor::with_dependencies(&["org.lib:log:1.0"]);
    descriptor.configurations = vec!["runtime".into(), "test".into()];
    descriptor
        .scoped_dependencies
        .insert("test".into(), vec![DependencySpec::Short("org.lib:junit:4.13".into())]);
    repo.install(
        &id("org.app:core:1.0"),
        &descriptor,
        &[(ArtifactDescriptor::primary("core"), b"core".as_slice())],
    )
    .unwrap();
    publish(&repo, "org.lib:log:1.0", &[]);
    publish(&repo, "org.lib:junit:4.13", &[]);
    let resolver = resolver_for(repo);

    let mut configurations = ConfigurationContainer::new();
    configurations.create("runtime").unwrap().add_dependency(
        Dependency::parse("org.app:core:1.0")
            .unwrap()
            .with_target_configuration("runtime")
            .unwrap(),
    );
    configurations.create("test").unwrap().add_dependency(
        Dependency::parse("org.app:core:1.0")
            .unwrap()
            .with_target_configuration("test")
            .unwrap(),
    );

    let runtime = configurations.resolve("runtime", &resolver).await.unwrap();
    let test = configurations.resolve("test", &resolver).await.unwrap();
    assert_eq!(runtime.modules().len(), 2);
    assert_eq!(test.modules().len(), 3);
}

#[tokio::test]
async fn tampered_transitive_artifact_fails_resolution() {
    let (_dir, repo) = setup();
    publish(&repo, "org.a:a:1.0", &["org.b:b:1.0"]);
    publish(&repo, "org.b:b:1.0", &[]);
    let jar = repo
        .layout()
        .artifact_path(&id("org.b:b:1.0"), &ArtifactDescriptor::primary("b"));
    std::fs::write(&jar, b"tampered").unwrap();
    let resolver = resolver_for(repo);

    let mut configurations = ConfigurationContainer::new();
    configurations
        .create("compile")
        .unwrap()
        .add_dependency(Dependency::parse("org.a:a:1.0").unwrap());

    let err = configurations.resolve("compile", &resolver).await.unwrap_err();
    let rendered = err.to_string();
    assert!(rendered.contains("compile"), "{rendered}");
    match configurations.state("compile").unwrap().error().map(|e| e.as_ref()) {
        Some(ResolveError::ArtifactFetch { module, path, .. }) => {
            assert_eq!(module, "org.b:b:1.0");
            assert!(path.contains("org.a:a:1.0"), "{path}");
        }
        other => panic!("unexpected state: {other:?}"),
    }
}

#[tokio::test]
async fn coordinates_cannot_escape_the_root() {
    let (dir, _) = setup();
    let root = dir.path().join("repo");
    std::fs::create_dir(&root).unwrap();
    let repo = FileRepository::new(&root);
    let planted = ModuleVersionId::new(Some("org"), "..", "1.0");

    assert!(repo.lookup(&planted).await.is_err());
    assert!(repo
        .list_versions(&ModuleId::new(Some("../.."), "lib"))
        .await
        .is_err());
    assert!(matches!(
        repo.fetch(&planted, &ArtifactDescriptor::primary("lib")).await,
        Err(FetchError::NotFound { .. })
    ));
    assert!(repo
        .install(
            &planted,
            &ModuleDescriptor::default(),
            &[(ArtifactDescriptor::primary("lib"), b"x".as_slice())],
        )
        .is_err());
    assert!(!root.join("1.0").exists());
}
