use rigging_core::dependency::DEFAULT_CONFIGURATION;
use rigging_core::error::DeclarationError;
use rigging_core::manifest::{DependencySpec, Manifest};

const MANIFEST: &str = r#"
[project]
name = "app"
repository = "repo"

[configurations.compile]
description = "Compile classpath"
dependencies = [
    "org.a:a:1.0",
    { group = "org.b", name = "b", version = "2.0", configuration = "runtime", exclude = [{ group = "org.x" }, { module = "noisy" }], artifacts = [{ name = "b", classifier = "sources" }], force = true },
]

[configurations.testCompile]
extends = ["compile"]
transitive = false
dependencies = ["org.junit:junit:4.13"]
"#;

#[test]
fn test_parse_configurations() {
    let manifest = Manifest::parse_toml(MANIFEST).unwrap();
    assert_eq!(manifest.project.name, "app");
    assert_eq!(manifest.project.repository.as_deref(), Some("repo"));
    assert_eq!(manifest.configurations.len(), 2);

    let test = &manifest.configurations["testCompile"];
    assert_eq!(test.extends, vec!["compile".to_string()]);
    assert!(!test.transitive);
    assert!(test.visible);
}

#[test]
fn test_detailed_dependency_conversion() {
    let manifest = Manifest::parse_toml(MANIFEST).unwrap();
    let deps = manifest.configurations["compile"].dependencies().unwrap();
    assert_eq!(deps.len(), 2);

    assert_eq!(deps[0].to_string(), "org.a:a:1.0");
    assert_eq!(deps[0].target_configuration(), DEFAULT_CONFIGURATION);

    let b = &deps[1];
    assert_eq!(b.target_configuration(), "runtime");
    assert_eq!(b.exclude_rules().len(), 2);
    assert_eq!(b.artifacts().len(), 1);
    assert!(b.is_force());
    assert!(b.is_transitive());
}

#[test]
fn test_empty_target_configuration_in_manifest_fails() {
    let spec: DependencySpec =
        toml::from_str::<toml::Value>(r#"d = { name = "b", configuration = "" }"#)
            .unwrap()
            .get("d")
            .cloned()
            .unwrap()
            .try_into()
            .unwrap();
    assert!(matches!(
        spec.to_dependency(),
        Err(DeclarationError::EmptyTargetConfiguration { .. })
    ));
}

#[test]
fn test_invalid_toml_is_manifest_error() {
    let err = Manifest::parse_toml("[project").unwrap_err();
    assert!(err.to_string().contains("Manifest error"), "got: {err}");
}

#[test]
fn test_missing_project_name_fails() {
    assert!(Manifest::parse_toml("[project]\n").is_err());
}
