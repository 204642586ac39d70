use std::collections::hash_map::DefaultHasher;
use std::collections::HashSet;
use std::hash::{Hash, Hasher};

use rigging_core::artifact::DependencyArtifact;
use rigging_core::dependency::{Dependency, DEFAULT_CONFIGURATION};
use rigging_core::error::DeclarationError;
use rigging_core::exclude::ExcludeRule;

fn hash_of(dep: &Dependency) -> u64 {
    let mut hasher = DefaultHasher::new();
    dep.hash(&mut hasher);
    hasher.finish()
}

#[test]
fn equal_coordinates_are_equal_regardless_of_rules_and_artifacts() {
    let plain = Dependency::parse("org.a:lib:1.0").unwrap();
    let decorated = Dependency::parse("org.a:lib:1.0")
        .unwrap()
        .with_exclude(ExcludeRule::group("org.x").unwrap())
        .with_artifact(DependencyArtifact::new("lib", "jar").with_classifier("sources"))
        .with_target_configuration("runtime")
        .unwrap();
    assert_eq!(plain, decorated);
    assert_eq!(hash_of(&plain), hash_of(&decorated));
}

#[test]
fn absent_group_and_version_hash_consistently() {
    let a = Dependency::new(None, "lib", None).unwrap();
    let b = Dependency::new(Some(""), "lib", Some("")).unwrap();
    assert_eq!(a, b);
    assert_eq!(hash_of(&a), hash_of(&b));
}

#[test]
fn different_versions_are_different_declarations() {
    let a = Dependency::parse("org.a:lib:1.0").unwrap();
    let b = Dependency::parse("org.a:lib:2.0").unwrap();
    assert_ne!(a, b);
    let set: HashSet<_> = [a, b].into_iter().collect();
    assert_eq!(set.len(), 2);
}

#[test]
fn empty_name_is_rejected() {
    assert_eq!(
        Dependency::new(Some("org.a"), "  ", None).unwrap_err(),
        DeclarationError::EmptyName
    );
}

#[test]
fn empty_target_configuration_fails_and_keeps_previous_value() {
    let mut dep = Dependency::parse("org.a:lib:1.0").unwrap();
    dep.set_target_configuration("runtime").unwrap();

    let err = dep.set_target_configuration("").unwrap_err();
    assert!(matches!(err, DeclarationError::EmptyTargetConfiguration { .. }));
    assert_eq!(dep.target_configuration(), "runtime");

    assert!(dep.set_target_configuration("   ").is_err());
    assert_eq!(dep.target_configuration(), "runtime");
}

#[test]
fn default_target_configuration() {
    let dep = Dependency::parse("org.a:lib:1.0").unwrap();
    assert_eq!(dep.target_configuration(), DEFAULT_CONFIGURATION);
}

#[test]
fn exclude_is_idempotent_and_chains() {
    let mut dep = Dependency::parse("org.a:lib:1.0").unwrap();
    dep.exclude(ExcludeRule::group("org.x").unwrap())
        .exclude(ExcludeRule::group("org.x").unwrap())
        .exclude(ExcludeRule::module("noisy").unwrap());
    assert_eq!(dep.exclude_rules().len(), 2);
}

#[test]
fn exclude_module_validates_before_mutating() {
    let mut dep = Dependency::parse("org.a:lib:1.0").unwrap();
    assert!(dep.exclude_module(None, None).is_err());
    assert!(dep.exclude_rules().is_empty());
    dep.exclude_module(Some("org.x"), Some("one")).unwrap();
    assert_eq!(dep.exclude_rules().len(), 1);
}

#[test]
fn duplicate_artifacts_are_deduplicated() {
    let mut dep = Dependency::parse("org.a:lib:1.0").unwrap();
    let sources = DependencyArtifact::new("lib", "jar").with_classifier("sources");
    dep.add_artifact(sources.clone()).add_artifact(sources);
    dep.add_artifact(DependencyArtifact::new("lib", "jar").with_classifier("javadoc"));
    assert_eq!(dep.artifacts().len(), 2);
}
