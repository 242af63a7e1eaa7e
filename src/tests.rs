use crate::builders::generator::{
    Generator, GeneratorBase, GroupGenerator, ImportGenerator, ServiceGenerator, Visit,
};
use crate::builders::ignores::DEFAULT_IGNORE_FILE;
use crate::builders::records::{GroupConfig, ServiceConfig};
use crate::core::engine::GeneratorCollection;
use crate::core::error::DiscoveryError;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tempfile::TempDir;

type EventLog = Rc<RefCell<Vec<String>>>;

/// What a scripted generator does when it reaches a directory.
#[derive(Clone)]
enum Action {
    Visit(Visit),
    Fail(&'static str),
    RecordError(&'static str),
}

/// A generator that replays scripted answers per directory and logs every
/// lifecycle call as `"<name>:<event>"`, with directories relative to the
/// scan root.
struct ScriptedGenerator {
    name: String,
    base: GeneratorBase,
    log: EventLog,
    script: HashMap<PathBuf, Action>,
    services: Vec<ServiceConfig>,
    groups: Vec<GroupConfig>,
    imports: Vec<String>,
    produces: bool,
}

impl ScriptedGenerator {
    fn new(name: &str, log: &EventLog) -> Self {
        Self {
            name: name.to_string(),
            base: GeneratorBase::new(),
            log: Rc::clone(log),
            script: HashMap::new(),
            services: Vec::new(),
            groups: Vec::new(),
            imports: Vec::new(),
            produces: true,
        }
    }

    fn on(mut self, dir: &str, action: Action) -> Self {
        self.script.insert(PathBuf::from(dir), action);
        self
    }

    fn with_services(mut self, names: &[&str]) -> Self {
        self.services = names.iter().map(|n| ServiceConfig::new(*n)).collect();
        self
    }

    fn with_groups(mut self, names: &[&str]) -> Self {
        self.groups = names.iter().map(|n| GroupConfig::new(*n, vec![])).collect();
        self
    }

    fn with_imports(mut self, imports: &[&str]) -> Self {
        self.imports = imports.iter().map(|i| i.to_string()).collect();
        self
    }

    /// Implements only the base contract.
    fn without_capabilities(mut self) -> Self {
        self.produces = false;
        self
    }

    fn relative(&self, path: &Path) -> PathBuf {
        let relative = path.strip_prefix(self.base.base_path()).unwrap();
        if relative.as_os_str().is_empty() {
            PathBuf::from(".")
        } else {
            relative.to_path_buf()
        }
    }

    fn event(&self, event: String) {
        self.log.borrow_mut().push(format!("{}:{}", self.name, event));
    }
}

impl Generator for ScriptedGenerator {
    fn name(&self) -> &str {
        &self.name
    }

    fn base(&self) -> &GeneratorBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut GeneratorBase {
        &mut self.base
    }

    fn start_walk(&mut self, base_path: &Path) {
        self.base.start_walk(base_path);
        self.event("start".to_string());
    }

    fn visit_dir(&mut self, path: &Path) -> anyhow::Result<Visit> {
        let relative = self.relative(path);
        self.event(relative.display().to_string());

        match self.script.get(&relative).cloned() {
            None => Ok(Visit::none()),
            Some(Action::Visit(visit)) => Ok(visit),
            Some(Action::Fail(msg)) => Err(anyhow::anyhow!(msg)),
            Some(Action::RecordError(msg)) => {
                self.set_err(anyhow::anyhow!(msg));
                Ok(Visit::none())
            }
        }
    }

    fn stop_walk(&mut self) {
        self.event("stop".to_string());
    }

    fn as_service_generator(&self) -> Option<&dyn ServiceGenerator> {
        if self.produces { Some(self) } else { None }
    }

    fn as_group_generator(&self) -> Option<&dyn GroupGenerator> {
        if self.produces { Some(self) } else { None }
    }

    fn as_import_generator(&self) -> Option<&dyn ImportGenerator> {
        if self.produces { Some(self) } else { None }
    }
}

impl ServiceGenerator for ScriptedGenerator {
    fn services(&self) -> &[ServiceConfig] {
        &self.services
    }
}

impl GroupGenerator for ScriptedGenerator {
    fn groups(&self) -> &[GroupConfig] {
        &self.groups
    }
}

impl ImportGenerator for ScriptedGenerator {
    fn imports(&self) -> &[String] {
        &self.imports
    }
}

/// Creates the standard fixture tree:
///
/// ```text
/// root/
///   a/
///     a1/
///   b/
///     b1/
///   c/
/// ```
fn setup_tree() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    for sub in ["a/a1", "b/b1", "c"] {
        fs::create_dir_all(dir.path().join(sub)).unwrap();
    }
    dir
}

fn events(log: &EventLog, name: &str) -> Vec<String> {
    let prefix = format!("{name}:");
    log.borrow()
        .iter()
        .filter_map(|e| e.strip_prefix(&prefix).map(str::to_string))
        .filter(|e| e != "start" && e != "stop")
        .collect()
}

fn names<T: crate::builders::records::Named>(records: &[T]) -> Vec<&str> {
    records.iter().map(|r| r.name()).collect()
}

#[test]
fn test_single_generator_visits_every_directory_in_preorder() {
    let dir = setup_tree();
    let log = EventLog::default();
    let mut collection = GeneratorCollection::new(dir.path())
        .with_generator(Box::new(ScriptedGenerator::new("g", &log)));

    let summary = collection.generate().unwrap();

    assert_eq!(events(&log, "g"), vec![".", "a", "a/a1", "b", "b/b1", "c"]);
    assert_eq!(summary.directories, 6);
    assert_eq!(summary.visits, 6);
}

#[test]
fn test_ignored_directory_is_never_visited() {
    let dir = setup_tree();
    fs::write(dir.path().join(DEFAULT_IGNORE_FILE), "b\n").unwrap();
    let log = EventLog::default();
    let generator = ScriptedGenerator::new("g", &log)
        .on("a", Action::Visit(Visit::found()))
        .with_services(&["svc-a"]);
    let mut collection = GeneratorCollection::new(dir.path()).with_generator(Box::new(generator));

    collection.generate().unwrap();

    let visited = events(&log, "g");
    assert!(!visited.iter().any(|d| d.starts_with('b')));
    assert_eq!(visited, vec![".", "a", "a/a1", "c"]);
    assert_eq!(names(&collection.services()), vec!["svc-a"]);
}

#[test]
fn test_found_hides_directory_from_later_generators() {
    let dir = setup_tree();
    let log = EventLog::default();
    let mut collection = GeneratorCollection::new(dir.path())
        .with_generator(Box::new(
            ScriptedGenerator::new("g1", &log).on("a", Action::Visit(Visit::found())),
        ))
        .with_generator(Box::new(ScriptedGenerator::new("g2", &log)));

    collection.generate().unwrap();

    // g1 keeps walking below its claim; g2 never sees a or a/a1.
    assert_eq!(events(&log, "g1"), vec![".", "a", "a/a1", "b", "b/b1", "c"]);
    assert_eq!(events(&log, "g2"), vec![".", "b", "b/b1", "c"]);
}

#[test]
fn test_found_by_later_generator_keeps_earlier_ones() {
    let dir = setup_tree();
    let log = EventLog::default();
    let mut collection = GeneratorCollection::new(dir.path())
        .with_generator(Box::new(ScriptedGenerator::new("g1", &log)))
        .with_generator(Box::new(
            ScriptedGenerator::new("g2", &log).on("b", Action::Visit(Visit::found())),
        ))
        .with_generator(Box::new(ScriptedGenerator::new("g3", &log)));

    collection.generate().unwrap();

    assert_eq!(events(&log, "g1"), vec![".", "a", "a/a1", "b", "b/b1", "c"]);
    assert_eq!(events(&log, "g2"), vec![".", "a", "a/a1", "b", "b/b1", "c"]);
    assert_eq!(events(&log, "g3"), vec![".", "a", "a/a1", "c"]);
}

#[test]
fn test_visit_order_within_a_directory_follows_generator_order() {
    let dir = tempfile::tempdir().unwrap();
    let log = EventLog::default();
    let mut collection = GeneratorCollection::new(dir.path())
        .with_generator(Box::new(ScriptedGenerator::new("g2", &log)))
        .with_generator(Box::new(ScriptedGenerator::new("g1", &log)));

    collection.generate().unwrap();

    assert_eq!(
        *log.borrow(),
        vec!["g2:start", "g1:start", "g2:.", "g1:.", "g2:stop", "g1:stop"]
    );
}

#[test]
fn test_skip_subtree_only_affects_descendants() {
    let dir = setup_tree();
    let log = EventLog::default();
    let mut collection = GeneratorCollection::new(dir.path())
        .with_generator(Box::new(
            ScriptedGenerator::new("g1", &log).on("a", Action::Visit(Visit::skip_subtree())),
        ))
        .with_generator(Box::new(ScriptedGenerator::new("g2", &log)));

    collection.generate().unwrap();

    assert_eq!(events(&log, "g1"), vec![".", "a", "b", "b/b1", "c"]);
    assert_eq!(events(&log, "g2"), vec![".", "a", "a/a1", "b", "b/b1", "c"]);
}

#[test]
fn test_found_and_skip_subtree_together() {
    let dir = setup_tree();
    let log = EventLog::default();
    let mut collection = GeneratorCollection::new(dir.path())
        .with_generator(Box::new(
            ScriptedGenerator::new("g1", &log)
                .on("a", Action::Visit(Visit::found().and_skip_subtree())),
        ))
        .with_generator(Box::new(ScriptedGenerator::new("g2", &log)));

    collection.generate().unwrap();

    // Nobody is left for a/a1.
    assert_eq!(events(&log, "g1"), vec![".", "a", "b", "b/b1", "c"]);
    assert_eq!(events(&log, "g2"), vec![".", "b", "b/b1", "c"]);
}

#[test]
fn test_excluded_generator_is_not_readmitted_deeper() {
    let dir = setup_tree();
    fs::create_dir_all(dir.path().join("a/a1/a2")).unwrap();
    let log = EventLog::default();
    let mut collection = GeneratorCollection::new(dir.path())
        .with_generator(Box::new(
            ScriptedGenerator::new("g1", &log).on("a", Action::Visit(Visit::found())),
        ))
        .with_generator(Box::new(ScriptedGenerator::new("g2", &log)));

    collection.generate().unwrap();

    let g2 = events(&log, "g2");
    assert!(!g2.iter().any(|d| d.starts_with('a')));
}

#[test]
fn test_visit_error_aborts_walk_but_stops_every_generator() {
    let dir = setup_tree();
    let log = EventLog::default();
    let mut collection = GeneratorCollection::new(dir.path())
        .with_generator(Box::new(
            ScriptedGenerator::new("g1", &log).on("a", Action::Fail("manifest unreadable")),
        ))
        .with_generator(Box::new(ScriptedGenerator::new("g2", &log)));

    let err = collection.generate().unwrap_err();

    assert!(format!("{err:#}").contains("manifest unreadable"));
    assert!(format!("{err:#}").contains("g1"));
    // Nothing after the failure is visited, not even g2 at a.
    assert_eq!(events(&log, "g1"), vec![".", "a"]);
    assert_eq!(events(&log, "g2"), vec!["."]);

    let log = log.borrow();
    assert_eq!(log.iter().filter(|e| *e == "g1:stop").count(), 1);
    assert_eq!(log.iter().filter(|e| *e == "g2:stop").count(), 1);
}

#[test]
fn test_recorded_error_discards_all_results_but_run_succeeds() {
    let dir = setup_tree();
    let log = EventLog::default();
    let mut collection = GeneratorCollection::new(dir.path())
        .with_generator(Box::new(
            ScriptedGenerator::new("broken", &log)
                .on("b/b1", Action::RecordError("bad manifest"))
                .with_services(&["api"])
                .with_groups(&["backend"])
                .with_imports(&["shared.toml"]),
        ))
        .with_generator(Box::new(
            ScriptedGenerator::new("healthy", &log)
                .with_services(&["web"])
                .with_groups(&["frontend"])
                .with_imports(&["web.toml"]),
        ));

    collection.generate().unwrap();

    // The recorded error does not stop the walk.
    assert_eq!(events(&log, "broken"), vec![".", "a", "a/a1", "b", "b/b1", "c"]);
    assert_eq!(names(&collection.services()), vec!["web"]);
    assert_eq!(names(&collection.groups()), vec!["frontend"]);
    assert_eq!(collection.imports(), vec!["web.toml"]);
}

#[test]
fn test_discarded_generators_are_known_after_the_run() {
    let dir = setup_tree();
    let log = EventLog::default();
    let mut collection = GeneratorCollection::new(dir.path())
        .with_generator(Box::new(ScriptedGenerator::new("healthy", &log)))
        .with_generator(Box::new(
            ScriptedGenerator::new("broken", &log).on("a", Action::RecordError("bad manifest")),
        ));

    assert!(collection.discarded().is_empty());
    collection.generate().unwrap();

    // Reading the results again does not change which generators were dropped.
    let _ = collection.report();
    let _ = collection.report();
    assert_eq!(collection.discarded(), vec!["broken"]);
}

#[test]
fn test_services_are_sorted_and_not_deduplicated() {
    let dir = tempfile::tempdir().unwrap();
    let log = EventLog::default();
    let mut collection = GeneratorCollection::new(dir.path())
        .with_generator(Box::new(
            ScriptedGenerator::new("g1", &log).with_services(&["worker", "api"]),
        ))
        .with_generator(Box::new(
            ScriptedGenerator::new("g2", &log).with_services(&["db", "api"]),
        ));

    collection.generate().unwrap();

    assert_eq!(
        names(&collection.services()),
        vec!["api", "api", "db", "worker"]
    );
}

#[test]
fn test_targets_filter_services_and_groups() {
    let dir = tempfile::tempdir().unwrap();
    let log = EventLog::default();
    let mut collection = GeneratorCollection::new(dir.path())
        .with_targets(vec!["worker".to_string(), "backend".to_string(), "api".to_string()])
        .with_generator(Box::new(
            ScriptedGenerator::new("g1", &log)
                .with_services(&["worker", "web", "api"])
                .with_groups(&["frontend", "backend"]),
        ))
        .with_generator(Box::new(
            ScriptedGenerator::new("g2", &log)
                .on(".", Action::RecordError("broken"))
                .with_services(&["api"]),
        ));

    collection.generate().unwrap();

    // g2's api is dropped with the rest of its results.
    assert_eq!(names(&collection.services()), vec!["api", "worker"]);
    assert_eq!(names(&collection.groups()), vec!["backend"]);
}

#[test]
fn test_imports_keep_generator_order_unsorted() {
    let dir = tempfile::tempdir().unwrap();
    let log = EventLog::default();
    let mut collection = GeneratorCollection::new(dir.path())
        .with_targets(vec!["nothing-matches".to_string()])
        .with_generator(Box::new(
            ScriptedGenerator::new("g1", &log).with_imports(&["z.toml", "a.toml"]),
        ))
        .with_generator(Box::new(ScriptedGenerator::new("g2", &log).without_capabilities()))
        .with_generator(Box::new(
            ScriptedGenerator::new("g3", &log).with_imports(&["m.toml"]),
        ));

    collection.generate().unwrap();

    assert_eq!(collection.imports(), vec!["z.toml", "a.toml", "m.toml"]);
}

#[test]
fn test_generator_without_capabilities_contributes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let log = EventLog::default();
    let mut collection = GeneratorCollection::new(dir.path()).with_generator(Box::new(
        ScriptedGenerator::new("g", &log)
            .with_services(&["api"])
            .without_capabilities(),
    ));

    collection.generate().unwrap();

    assert!(collection.services().is_empty());
    assert!(collection.groups().is_empty());
    assert!(collection.imports().is_empty());
    assert!(collection.report().is_empty());
}

#[test]
fn test_root_must_be_a_directory() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("services.toml");
    fs::write(&file, "").unwrap();
    let log = EventLog::default();
    let mut collection =
        GeneratorCollection::new(&file).with_generator(Box::new(ScriptedGenerator::new("g", &log)));

    let err = collection.generate().unwrap_err();

    assert!(matches!(
        err.downcast_ref::<DiscoveryError>(),
        Some(DiscoveryError::NotADirectory(_))
    ));
    assert!(log.borrow().is_empty());
}

#[test]
fn test_missing_root_fails() {
    let dir = tempfile::tempdir().unwrap();
    let log = EventLog::default();
    let mut collection = GeneratorCollection::new(dir.path().join("missing"))
        .with_generator(Box::new(ScriptedGenerator::new("g", &log)));

    assert!(collection.generate().is_err());
    assert!(log.borrow().is_empty());
}

#[test]
fn test_invalid_ignore_file_fails_before_any_generator_starts() {
    let dir = setup_tree();
    fs::write(dir.path().join("b").join(DEFAULT_IGNORE_FILE), "[broken\n").unwrap();
    let log = EventLog::default();
    let mut collection = GeneratorCollection::new(dir.path())
        .with_generator(Box::new(ScriptedGenerator::new("g", &log)));

    let err = collection.generate().unwrap_err();

    assert!(err.chain().any(|cause| matches!(
        cause.downcast_ref::<DiscoveryError>(),
        Some(DiscoveryError::InvalidIgnoreFile { .. })
    )));
    assert!(log.borrow().is_empty());
}

#[test]
fn test_custom_ignore_file_name() {
    let dir = setup_tree();
    fs::write(dir.path().join(".scanignore"), "a\nc\n").unwrap();
    fs::write(dir.path().join(DEFAULT_IGNORE_FILE), "b\n").unwrap();
    let log = EventLog::default();
    let mut collection = GeneratorCollection::new(dir.path())
        .with_ignore_file(".scanignore")
        .with_generator(Box::new(ScriptedGenerator::new("g", &log)));

    collection.generate().unwrap();

    assert_eq!(events(&log, "g"), vec![".", "b", "b/b1"]);
}
