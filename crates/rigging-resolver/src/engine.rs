//! The resolution engine.
//!
//! Resolution of one configuration runs in rounds:
//!
//! 1. Walk the declarations depth-first over the metadata fetched so far,
//!    recording every request, edge and exclusion-scoped expansion. A module
//!    whose metadata is not known yet is noted as missing.
//! 2. Select one version per module from the requests of this walk alone,
//!    so a version whose requesters were evicted is dropped again. Forced
//!    versions stay pinned once seen.
//! 3. If the selection changed, walk again. Otherwise fetch the missing
//!    metadata (and version listings for dynamic requests) concurrently and
//!    walk again. A round with nothing missing and a stable selection is final.
//!
//! A selection that comes back to an earlier state without new metadata in
//! between would repeat forever and is reported as a conflict.
//!
//! Artifacts of the final graph are then materialized concurrently.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::iter;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use rigging_core::artifact::ArtifactDescriptor;
use rigging_core::config::{ConflictStrategy, ResolutionConfig};
use rigging_core::coordinate::{ModuleId, ModuleVersionId};
use rigging_core::dependency::Dependency;
use rigging_core::exclude::ExcludeRule;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::conflict::{ConflictReason, ConflictReport, VersionConflict};
use crate::error::ResolveError;
use crate::graph::{DependencyEdge, DependencyGraph};
use crate::metadata::{ArtifactMaterializer, ModuleMetadata, ModuleMetadataProvider};
use crate::result::{FirstLevelDependency, ResolutionResult, ResolvedArtifact, ResolvedModule};
use crate::version::{Version, VersionSelector};

const DEFAULT_MAX_CONCURRENT_FETCHES: usize = 8;

/// Tunables for a [`Resolver`].
#[derive(Debug, Clone)]
pub struct ResolverSettings {
    pub conflict_strategy: ConflictStrategy,
    /// Upper bound for one configuration's resolution. `None` waits forever.
    pub timeout: Option<Duration>,
    pub max_concurrent_fetches: usize,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            conflict_strategy: ConflictStrategy::Latest,
            timeout: None,
            max_concurrent_fetches: DEFAULT_MAX_CONCURRENT_FETCHES,
        }
    }
}

impl ResolverSettings {
    /// Settings from the `[resolution]` table. A zero timeout disables it.
    pub fn from_config(config: &ResolutionConfig) -> Self {
        Self {
            conflict_strategy: config.conflict_strategy,
            timeout: (config.timeout_secs > 0).then(|| Duration::from_secs(config.timeout_secs)),
            max_concurrent_fetches: config.max_concurrent_fetches.max(1),
        }
    }
}

/// Turns declarations into a [`ResolutionResult`] using injected metadata and
/// artifact capabilities.
///
/// Cloning is cheap; clones share the capabilities and the resolution counter.
#[derive(Clone)]
pub struct Resolver {
    metadata: Arc<dyn ModuleMetadataProvider>,
    materializer: Arc<dyn ArtifactMaterializer>,
    settings: ResolverSettings,
    resolutions: Arc<AtomicUsize>,
}

impl Resolver {
    pub fn new(
        metadata: Arc<dyn ModuleMetadataProvider>,
        materializer: Arc<dyn ArtifactMaterializer>,
    ) -> Self {
        Self {
            metadata,
            materializer,
            settings: ResolverSettings::default(),
            resolutions: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_settings(mut self, settings: ResolverSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn settings(&self) -> &ResolverSettings {
        &self.settings
    }

    /// How many graph traversals this resolver (and its clones) has started.
    pub fn resolutions(&self) -> usize {
        self.resolutions.load(Ordering::SeqCst)
    }

    /// Resolve `dependencies` as the effective declarations of `configuration`.
    ///
    /// With `transitive == false` only the declared modules are resolved.
    pub async fn resolve(
        &self,
        configuration: &str,
        dependencies: &[Dependency],
        transitive: bool,
    ) -> Result<ResolutionResult, ResolveError> {
        self.resolutions.fetch_add(1, Ordering::SeqCst);
        tracing::info!(
            "resolving configuration `{configuration}` ({} declarations)",
            dependencies.len()
        );
        let run = self.run(configuration, dependencies, transitive);
        let result = match self.settings.timeout {
            Some(limit) => tokio::time::timeout(limit, run).await.map_err(|_| {
                ResolveError::Timeout {
                    configuration: configuration.to_string(),
                    elapsed: limit,
                }
            })?,
            None => run.await,
        };
        match &result {
            Ok(resolved) => tracing::info!(
                "resolved configuration `{configuration}`: {} modules, {} files",
                resolved.modules().len(),
                resolved.files().len()
            ),
            Err(err) => tracing::debug!("configuration `{configuration}` is unresolvable: {err}"),
        }
        result
    }

    async fn run(
        &self,
        configuration: &str,
        dependencies: &[Dependency],
        transitive: bool,
    ) -> Result<ResolutionResult, ResolveError> {
        let mut session = Session::new(configuration, dependencies, transitive, &self.settings);
        let mut rounds = Rounds::default();
        let mut round = 0usize;
        loop {
            round += 1;
            let walk = session.walk()?;
            let selection = session.select(&walk);
            tracing::debug!(
                "round {round}: {} modules, {} missing, selection {}",
                walk.order.len(),
                walk.missing.len(),
                if selection.changed { "changed" } else { "stable" }
            );
            if selection.changed {
                rounds.settle(session.snapshot())?;
                continue;
            }
            if !walk.missing.is_empty() || !selection.unlisted.is_empty() {
                rounds.reset();
                let (metadata, listings) = tokio::join!(
                    self.fetch_metadata(&walk.missing),
                    self.list_versions(&selection.unlisted)
                );
                session.memo.extend(metadata?);
                session.listed.extend(listings?);
                continue;
            }
            if let Some(err) = selection.errors.into_iter().next() {
                return Err(err);
            }
            return self.assemble(&session, walk).await;
        }
    }

    /// Look up every missing coordinate once. Not-found is an error carrying
    /// the requester path.
    async fn fetch_metadata(
        &self,
        missing: &BTreeMap<ModuleVersionId, String>,
    ) -> Result<HashMap<ModuleVersionId, Arc<ModuleMetadata>>, ResolveError> {
        let semaphore = Arc::new(Semaphore::new(self.settings.max_concurrent_fetches.max(1)));
        let mut join_set = JoinSet::new();
        for id in missing.keys() {
            let provider = Arc::clone(&self.metadata);
            let sem = Arc::clone(&semaphore);
            let id = id.clone();
            join_set.spawn(async move {
                let _permit = sem.acquire().await;
                tracing::debug!("fetching metadata of {id}");
                let result = provider.lookup(&id).await;
                (id, result)
            });
        }

        let mut fetched = HashMap::new();
        let mut failures = BTreeMap::new();
        while let Some(joined) = join_set.join_next().await {
            let (id, result) = joined.map_err(|e| ResolveError::Internal {
                message: e.to_string(),
            })?;
            match result {
                Ok(Some(metadata)) => {
                    fetched.insert(id, Arc::new(metadata));
                }
                Ok(None) => {
                    failures.insert(id, None);
                }
                Err(err) => {
                    failures.insert(id, Some(err));
                }
            }
        }

        // First failure in coordinate order, so errors are deterministic.
        if let Some((id, failure)) = failures.into_iter().next() {
            let path = missing.get(&id).cloned().unwrap_or_default();
            return Err(match failure {
                None => ResolveError::ModuleNotFound {
                    module: id.to_string(),
                    path,
                },
                Some(source) => ResolveError::Metadata {
                    module: id.to_string(),
                    path,
                    source,
                },
            });
        }
        Ok(fetched)
    }

    async fn list_versions(
        &self,
        modules: &BTreeMap<ModuleId, String>,
    ) -> Result<HashMap<ModuleId, Vec<Version>>, ResolveError> {
        let mut join_set = JoinSet::new();
        for module in modules.keys() {
            let provider = Arc::clone(&self.metadata);
            let module = module.clone();
            join_set.spawn(async move {
                tracing::debug!("listing versions of {module}");
                let result = provider.list_versions(&module).await;
                (module, result)
            });
        }

        let mut listed = HashMap::new();
        while let Some(joined) = join_set.join_next().await {
            let (module, result) = joined.map_err(|e| ResolveError::Internal {
                message: e.to_string(),
            })?;
            let mut versions: Vec<Version> = result
                .map_err(|source| ResolveError::Metadata {
                    module: module.to_string(),
                    path: modules.get(&module).cloned().unwrap_or_default(),
                    source,
                })?
                .iter()
                .map(|v| Version::parse(v))
                .collect();
            versions.sort();
            listed.insert(module, versions);
        }
        Ok(listed)
    }

    /// Build the graph, conflict report and materialized modules of the
    /// final round.
    async fn assemble(
        &self,
        session: &Session<'_>,
        walk: Walk,
    ) -> Result<ResolutionResult, ResolveError> {
        let mut graph = DependencyGraph::new(session.configuration);
        let mut conflicts = ConflictReport::new();
        let mut ids = Vec::with_capacity(walk.order.len());
        let mut jobs = Vec::new();

        for module in &walk.order {
            let id = session.selected_id(module)?;
            let metadata = session.memo.get(&id).ok_or_else(|| ResolveError::Internal {
                message: format!("metadata of {id} vanished"),
            })?;
            graph.add_module(id.clone());
            record_redirects(module, &id, &walk, session, &mut conflicts);

            for descriptor in walk.descriptors(module, metadata) {
                jobs.push((ids.len(), descriptor));
            }
            ids.push(id);
        }

        for edge in &walk.edges {
            let from = match &edge.from {
                None => Some(graph.root()),
                Some(module) => graph.find(&module.to_string()),
            };
            if let (Some(from), Some(to)) = (from, graph.find(&edge.to.to_string())) {
                graph.add_edge(
                    from,
                    to,
                    DependencyEdge {
                        requested: edge.requested.clone(),
                        configuration: edge.configuration.clone(),
                    },
                );
            }
        }

        let files = self.materialize(&ids, &jobs, &walk).await?;
        let mut modules: Vec<ResolvedModule> = ids
            .into_iter()
            .map(|id| ResolvedModule {
                id,
                artifacts: Vec::new(),
            })
            .collect();
        for ((owner, descriptor), file) in jobs.iter().zip(files) {
            let artifact = ResolvedArtifact::new(descriptor, file);
            let artifacts = &mut modules[*owner].artifacts;
            if !artifacts.contains(&artifact) {
                artifacts.push(artifact);
            }
        }

        let first_level = session
            .roots
            .iter()
            .filter_map(|declaration| {
                let selected = session.selected_id(&declaration.module()).ok()?;
                Some(FirstLevelDependency {
                    declaration: declaration.clone(),
                    selected,
                })
            })
            .collect();

        Ok(ResolutionResult::new(
            session.configuration,
            modules,
            first_level,
            graph,
            conflicts,
        ))
    }

    /// Fetch every artifact concurrently; files come back in job order.
    async fn materialize(
        &self,
        ids: &[ModuleVersionId],
        jobs: &[(usize, ArtifactDescriptor)],
        walk: &Walk,
    ) -> Result<Vec<PathBuf>, ResolveError> {
        let semaphore = Arc::new(Semaphore::new(self.settings.max_concurrent_fetches.max(1)));
        let mut join_set = JoinSet::new();
        for (index, (owner, descriptor)) in jobs.iter().enumerate() {
            let materializer = Arc::clone(&self.materializer);
            let sem = Arc::clone(&semaphore);
            let id = ids[*owner].clone();
            let descriptor = descriptor.clone();
            join_set.spawn(async move {
                let _permit = sem.acquire().await;
                (index, materializer.fetch(&id, &descriptor).await)
            });
        }

        let mut results: Vec<Option<_>> = (0..jobs.len()).map(|_| None).collect();
        while let Some(joined) = join_set.join_next().await {
            let (index, result) = joined.map_err(|e| ResolveError::Internal {
                message: e.to_string(),
            })?;
            results[index] = Some(result);
        }

        let mut files = Vec::with_capacity(jobs.len());
        for ((owner, descriptor), result) in jobs.iter().zip(results) {
            let id = &ids[*owner];
            match result {
                Some(Ok(file)) => files.push(file),
                Some(Err(source)) => {
                    return Err(ResolveError::ArtifactFetch {
                        module: id.to_string(),
                        artifact: descriptor.file_name(&id.version),
                        path: walk.path_of(&id.module()),
                        source,
                    })
                }
                None => {
                    return Err(ResolveError::Internal {
                        message: format!("no fetch result for {id}"),
                    })
                }
            }
        }
        Ok(files)
    }
}

fn record_redirects(
    module: &ModuleId,
    selected: &ModuleVersionId,
    walk: &Walk,
    session: &Session<'_>,
    conflicts: &mut ConflictReport,
) {
    let forced = session.forced.contains_key(module);
    for request in walk.requests.get(module).into_iter().flatten() {
        let Some(requested) = request.version.as_deref() else {
            continue;
        };
        if requested == selected.version {
            continue;
        }
        let reason = match VersionSelector::parse(Some(requested)) {
            Ok(selector) if selector.is_dynamic() => ConflictReason::Dynamic,
            _ if forced => ConflictReason::Forced,
            _ => ConflictReason::HighestWins,
        };
        if reason == ConflictReason::Forced
            && Version::parse(requested) > Version::parse(&selected.version)
        {
            tracing::warn!("{module}:{requested} downgraded to forced version {}", selected.version);
        } else {
            tracing::debug!("{module}:{requested} -> {} ({reason})", selected.version);
        }
        conflicts.add(VersionConflict {
            module: module.clone(),
            requested: requested.to_string(),
            selected: selected.version.clone(),
            reason,
        });
    }
}

/// One request for a module, as seen on some path.
#[derive(Debug, Clone)]
struct Request {
    version: Option<String>,
    force: bool,
    path: String,
}

#[derive(Debug)]
struct Edge {
    /// `None` for declarations of the configuration itself.
    from: Option<ModuleId>,
    to: ModuleId,
    requested: Option<String>,
    configuration: String,
}

/// A module on the current walk path.
struct Frame {
    module: ModuleId,
    id: ModuleVersionId,
}

/// Everything one depth-first walk discovered.
#[derive(Default)]
struct Walk {
    order: Vec<ModuleId>,
    requests: HashMap<ModuleId, Vec<Request>>,
    edges: Vec<Edge>,
    edge_keys: HashSet<(Option<ModuleId>, ModuleId)>,
    artifacts: HashMap<ModuleId, Vec<ArtifactDescriptor>>,
    /// Target configurations of edges that named no artifacts.
    default_targets: HashMap<ModuleId, Vec<String>>,
    /// Versions visited before the module had a selection.
    provisional: HashMap<ModuleId, String>,
    /// Coordinates without metadata yet, with the first requester path.
    missing: BTreeMap<ModuleVersionId, String>,
    /// Exclusion sets each (module version, configuration) was expanded with.
    expanded: HashMap<(ModuleVersionId, String), Vec<BTreeSet<ExcludeRule>>>,
}

impl Walk {
    fn record(&mut self, parent: Option<&ModuleId>, dep: &Dependency, module: &ModuleId, path: &str) {
        if !self.requests.contains_key(module) {
            self.order.push(module.clone());
        }
        let requests = self.requests.entry(module.clone()).or_default();
        let version = dep.version().map(str::to_string);
        if !requests
            .iter()
            .any(|r| r.version == version && r.force == dep.is_force())
        {
            requests.push(Request {
                version,
                force: dep.is_force(),
                path: path.to_string(),
            });
        }

        if self.edge_keys.insert((parent.cloned(), module.clone())) {
            self.edges.push(Edge {
                from: parent.cloned(),
                to: module.clone(),
                requested: dep.version().map(str::to_string),
                configuration: dep.target_configuration().to_string(),
            });
        }

        if dep.artifacts().is_empty() {
            let targets = self.default_targets.entry(module.clone()).or_default();
            if !targets.iter().any(|t| t == dep.target_configuration()) {
                targets.push(dep.target_configuration().to_string());
            }
            return;
        }
        let artifacts = self.artifacts.entry(module.clone()).or_default();
        for artifact in dep.artifacts() {
            let descriptor = artifact.to_descriptor();
            if !artifacts.contains(&descriptor) {
                artifacts.push(descriptor);
            }
        }
    }

    /// Explicit artifacts of every edge, plus the module's defaults for each
    /// edge that named none.
    fn descriptors(&self, module: &ModuleId, metadata: &ModuleMetadata) -> Vec<ArtifactDescriptor> {
        let mut descriptors = self.artifacts.get(module).cloned().unwrap_or_default();
        for target in self.default_targets.get(module).into_iter().flatten() {
            for descriptor in metadata.default_artifacts(target) {
                if !descriptors.contains(&descriptor) {
                    descriptors.push(descriptor);
                }
            }
        }
        descriptors
    }

    fn path_of(&self, module: &ModuleId) -> String {
        self.requests
            .get(module)
            .and_then(|requests| requests.first())
            .map(|r| r.path.clone())
            .unwrap_or_default()
    }
}

/// Outcome of one selection pass.
#[derive(Default)]
struct Selection {
    changed: bool,
    /// Modules with only dynamic requests whose versions are not listed yet.
    unlisted: BTreeMap<ModuleId, String>,
    /// Reported only once the graph is complete.
    errors: Vec<ResolveError>,
}

/// State kept across the rounds of one resolution.
struct Session<'a> {
    configuration: &'a str,
    root_label: String,
    roots: &'a [Dependency],
    transitive: bool,
    strategy: ConflictStrategy,
    memo: HashMap<ModuleVersionId, Arc<ModuleMetadata>>,
    listed: HashMap<ModuleId, Vec<Version>>,
    selected: HashMap<ModuleId, String>,
    forced: HashMap<ModuleId, Version>,
}

impl<'a> Session<'a> {
    fn new(
        configuration: &'a str,
        roots: &'a [Dependency],
        transitive: bool,
        settings: &ResolverSettings,
    ) -> Self {
        Self {
            configuration,
            root_label: format!("configuration '{configuration}'"),
            roots,
            transitive,
            strategy: settings.conflict_strategy,
            memo: HashMap::new(),
            listed: HashMap::new(),
            selected: HashMap::new(),
            forced: HashMap::new(),
        }
    }

    fn selected_id(&self, module: &ModuleId) -> Result<ModuleVersionId, ResolveError> {
        self.selected
            .get(module)
            .map(|version| module.with_version(version))
            .ok_or_else(|| ResolveError::Internal {
                message: format!("no version selected for {module}"),
            })
    }

    fn path(&self, stack: &[Frame]) -> String {
        iter::once(self.root_label.clone())
            .chain(stack.iter().map(|f| f.id.to_string()))
            .collect::<Vec<_>>()
            .join(" -> ")
    }

    fn walk(&self) -> Result<Walk, ResolveError> {
        let mut walk = Walk::default();
        let mut stack = Vec::new();
        let none = BTreeSet::new();
        for dep in self.roots {
            self.visit(&mut walk, None, dep, &none, &mut stack, self.transitive)?;
        }
        Ok(walk)
    }

    fn visit(
        &self,
        walk: &mut Walk,
        parent: Option<&ModuleId>,
        dep: &Dependency,
        inherited: &BTreeSet<ExcludeRule>,
        stack: &mut Vec<Frame>,
        expand: bool,
    ) -> Result<(), ResolveError> {
        let module = dep.module();
        if inherited.iter().any(|rule| rule.matches(&module)) {
            tracing::debug!("{module} excluded below {}", self.path(stack));
            return Ok(());
        }
        if let Some(start) = stack.iter().position(|f| f.module == module) {
            let chain = stack[start..]
                .iter()
                .map(|f| f.id.to_string())
                .chain(iter::once(dep.to_string()))
                .collect::<Vec<_>>()
                .join(" -> ");
            return Err(ResolveError::Cycle { chain });
        }

        let path = self.path(stack);
        walk.record(parent, dep, &module, &path);

        let Some(version) = self.version_to_visit(walk, &module, dep) else {
            return Ok(());
        };
        let id = module.with_version(&version);
        let Some(metadata) = self.memo.get(&id).cloned() else {
            walk.missing.entry(id).or_insert(path);
            return Ok(());
        };

        let configuration = dep.target_configuration();
        if !metadata.has_configuration(configuration) {
            return Err(ResolveError::UnknownTargetConfiguration {
                module: id.to_string(),
                configuration: configuration.to_string(),
                path,
            });
        }
        if !expand || !dep.is_transitive() {
            return Ok(());
        }

        let mut exclusions = inherited.clone();
        exclusions.extend(dep.exclude_rules().iter().cloned());
        let seen = walk
            .expanded
            .entry((id.clone(), configuration.to_string()))
            .or_default();
        // Expanded before with fewer exclusions: nothing new is reachable.
        if seen.iter().any(|earlier| earlier.is_subset(&exclusions)) {
            return Ok(());
        }
        seen.push(exclusions.clone());

        stack.push(Frame {
            module: module.clone(),
            id,
        });
        for child in metadata.dependencies_for(configuration) {
            self.visit(walk, Some(&module), child, &exclusions, stack, true)?;
        }
        stack.pop();
        Ok(())
    }

    /// The selected version, or the first exact request of this walk.
    fn version_to_visit(&self, walk: &mut Walk, module: &ModuleId, dep: &Dependency) -> Option<String> {
        if let Some(version) = self.selected.get(module) {
            return Some(version.clone());
        }
        if let Some(version) = walk.provisional.get(module) {
            return Some(version.clone());
        }
        match VersionSelector::parse(dep.version()) {
            Ok(VersionSelector::Exact(version)) => {
                walk.provisional.insert(module.clone(), version.original.clone());
                Some(version.original)
            }
            _ => None,
        }
    }

    fn select(&mut self, walk: &Walk) -> Selection {
        let mut selection = Selection::default();
        for module in &walk.order {
            let requests = walk.requests.get(module).map(Vec::as_slice).unwrap_or_default();
            match self.select_module(module, requests) {
                Ok(Some(version)) => {
                    if self.selected.get(module) != Some(&version) {
                        tracing::debug!("selected {module}:{version}");
                        self.selected.insert(module.clone(), version);
                        selection.changed = true;
                    }
                }
                Ok(None) => {
                    let path = requests.first().map(|r| r.path.clone()).unwrap_or_default();
                    selection.unlisted.insert(module.clone(), path);
                }
                Err(err) => selection.errors.push(err),
            }
        }
        let before = self.selected.len();
        self.selected.retain(|module, _| walk.requests.contains_key(module));
        if self.selected.len() != before {
            selection.changed = true;
        }
        selection
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            selected: self
                .selected
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            forced: self
                .forced
                .iter()
                .map(|(k, v)| (k.clone(), v.original.clone()))
                .collect(),
        }
    }

    /// `Ok(None)` means the module needs its published versions listed first.
    fn select_module(
        &mut self,
        module: &ModuleId,
        requests: &[Request],
    ) -> Result<Option<String>, ResolveError> {
        let coordinate = |version: &str| module.with_version(version).to_string();

        let mut exact: Vec<(Version, &Request)> = Vec::new();
        let mut dynamic: Vec<(VersionSelector, &Request)> = Vec::new();
        let mut malformed = None;
        for request in requests {
            match VersionSelector::parse(request.version.as_deref()) {
                Ok(VersionSelector::Unspecified) => {}
                Ok(VersionSelector::Exact(version)) => exact.push((version, request)),
                Ok(selector) => dynamic.push((selector, request)),
                Err(err) => {
                    malformed.get_or_insert((err, request));
                }
            }
        }

        if let Some((err, request)) = malformed {
            let mut distinct: Vec<&str> = Vec::new();
            for version in requests.iter().filter_map(|r| r.version.as_deref()) {
                if !distinct.contains(&version) {
                    distinct.push(version);
                }
            }
            return Err(match distinct.as_slice() {
                [first, second, ..] => ResolveError::Conflict {
                    module: module.to_string(),
                    first: coordinate(first),
                    second: coordinate(second),
                    reason: format!("{err} cannot be ordered"),
                },
                _ => ResolveError::InvalidVersion {
                    module: module.to_string(),
                    version: err.0,
                    path: request.path.clone(),
                },
            });
        }

        if let Some(forced) = highest(exact.iter().filter(|(_, r)| r.force).map(|(v, _)| v)) {
            let pinned = match self.forced.get(module) {
                Some(previous) if previous >= forced => previous.clone(),
                _ => forced.clone(),
            };
            self.forced.insert(module.clone(), pinned.clone());
            return Ok(Some(pinned.original));
        }
        if let Some(pinned) = self.forced.get(module) {
            return Ok(Some(pinned.original.clone()));
        }

        if self.strategy == ConflictStrategy::Fail {
            if let Some((first, _)) = exact.first() {
                if let Some((second, _)) = exact.iter().find(|(v, _)| v != first) {
                    return Err(ResolveError::Conflict {
                        module: module.to_string(),
                        first: coordinate(&first.original),
                        second: coordinate(&second.original),
                        reason: "conflict strategy is `fail`".to_string(),
                    });
                }
            }
        }

        // An equally ordered spelling of the current selection keeps it.
        let current = self
            .selected
            .get(module)
            .and_then(|current| exact.iter().find(|(v, _)| &v.original == current));
        let chosen = match (highest(exact.iter().map(|(v, _)| v)), current) {
            (Some(candidate), Some((current, _))) if current == candidate => Some(current.clone()),
            (candidate, _) => candidate.cloned(),
        };

        if let Some(chosen) = chosen {
            for (selector, request) in &dynamic {
                if !selector.accepts(&chosen) {
                    let requested = request.version.as_deref().unwrap_or_default();
                    return Err(ResolveError::Conflict {
                        module: module.to_string(),
                        first: coordinate(&chosen.original),
                        second: coordinate(requested),
                        reason: format!("`{requested}` does not accept {chosen}"),
                    });
                }
            }
            return Ok(Some(chosen.original));
        }

        let Some((_, first_dynamic)) = dynamic.first() else {
            return Err(ResolveError::NoMatchingVersion {
                module: module.to_string(),
                requested: "no version declared".to_string(),
                path: requests.first().map(|r| r.path.clone()).unwrap_or_default(),
            });
        };
        let Some(listed) = self.listed.get(module) else {
            return Ok(None);
        };
        match listed
            .iter()
            .rev()
            .find(|v| dynamic.iter().all(|(selector, _)| selector.accepts(v)))
        {
            Some(version) => Ok(Some(version.original.clone())),
            None => Err(ResolveError::NoMatchingVersion {
                module: module.to_string(),
                requested: dynamic
                    .iter()
                    .filter_map(|(_, r)| r.version.as_deref())
                    .collect::<Vec<_>>()
                    .join(", "),
                path: first_dynamic.path.clone(),
            }),
        }
    }
}

/// Selection state after a changed round.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Snapshot {
    selected: BTreeMap<ModuleId, String>,
    forced: BTreeMap<ModuleId, String>,
}

/// Selection states seen since metadata last grew.
#[derive(Default)]
struct Rounds {
    history: Vec<Snapshot>,
}

impl Rounds {
    /// Fails when `snapshot` repeats a state of the current history: with the
    /// same metadata the rounds would cycle through it forever.
    fn settle(&mut self, snapshot: Snapshot) -> Result<(), ResolveError> {
        if let Some(start) = self.history.iter().position(|seen| *seen == snapshot) {
            return Err(unsettled(&self.history[start..]));
        }
        self.history.push(snapshot);
        Ok(())
    }

    fn reset(&mut self) {
        self.history.clear();
    }
}

/// Conflict naming the first module whose selection moves within `cycle`.
fn unsettled(cycle: &[Snapshot]) -> ResolveError {
    let modules: BTreeSet<&ModuleId> = cycle.iter().flat_map(|s| s.selected.keys()).collect();
    for module in modules {
        let mut versions: Vec<Option<&String>> = Vec::new();
        for state in cycle {
            let version = state.selected.get(module);
            if !versions.contains(&version) {
                versions.push(version);
            }
        }
        if versions.len() < 2 {
            continue;
        }
        let mut present = versions.iter().flatten();
        let first = present.next().map(|v| module.with_version(v).to_string());
        let second = present.next().map(|v| module.with_version(v).to_string());
        return ResolveError::Conflict {
            module: module.to_string(),
            first: first.unwrap_or_else(|| module.to_string()),
            second: second.unwrap_or_else(|| format!("{module} (evicted)")),
            reason: "the selection alternates between rounds".to_string(),
        };
    }
    ResolveError::Internal {
        message: "selection repeats without any change".to_string(),
    }
}

/// Highest version; on equal ordering the first one wins.
fn highest<'v>(versions: impl Iterator<Item = &'v Version>) -> Option<&'v Version> {
    versions.fold(None, |best, v| match best {
        Some(best) if v <= best => Some(best),
        _ => Some(v),
    })
}
