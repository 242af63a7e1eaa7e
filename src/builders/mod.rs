// This file is the module declaration file for the `builders` module.
// It declares and makes public all the sub-modules within the `src/builders`
// directory. These modules hold the pieces the discovery core is assembled
// from: the generator contract, the records generators produce, ignore rules,
// and the configuration and reporting helpers around a run.

// `generator` module:
// Defines the `Generator` trait every discovery plugin implements, its
// optional capabilities (`ServiceGenerator`, `GroupGenerator`,
// `ImportGenerator`), the `Visit` outcome returned for each directory, and
// the `GeneratorBase` carrying per-run state.
pub mod generator;

// `ignores` module:
// Loads and compiles the per-directory ignore file (`.discoverignore` by
// default) into `IgnoreRules`.
pub mod ignores;

// `manifest` module:
// `ManifestGenerator`, the built-in generator that reads `services.toml`
// manifests and implements all three capabilities.
pub mod manifest;

// `records` module:
// The discovered record types (`ServiceConfig`, `GroupConfig`) and the
// `Named` trait the aggregator sorts and filters by.
pub mod records;

// `reporter` module:
// `DiscoveryReport`, its JSON/YAML/TOML rendering, and the
// `ConsoleReporter` that prints it for humans.
pub mod reporter;

// `validator` module:
// The `ConfigValidator` trait and its `StandardValidator` implementation,
// which checks a configuration for problems before a run.
pub mod validator;
