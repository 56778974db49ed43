//! # Pipeline Driver
//!
//! Sequences a complete run. The pipeline is linear:
//!
//! ```text
//! START -> RESOLVE -> FETCH_ALL -> [MERGE_CUSTOM] -> (INVOKE_GENERATOR -> INSTALL)* -> DONE
//! ```
//!
//! The privilege guard runs before anything touches the filesystem. Any
//! failure aborts the remaining stages and is returned as is. Nothing is
//! rolled back: repositories fetched before the failure stay in the workspace
//! and are reused by the next run.
//!
//! ## Generation targets
//!
//! - With a custom package, the merged custom package is the only target.
//! - Otherwise every fetched source is a target, in source-list order, except
//!   the configured prebuilt packages. Sources without a `msg` directory are
//!   skipped with a warning.
//!
//! Each target is generated and then installed. Its package directory is
//! prepended to the build `PYTHONPATH` first, and the final value is saved as
//! an activation script in the workspace root.

use std::fmt;
use std::path::PathBuf;

use log::{debug, error, info, warn};

use crate::config::PipelineConfig;
use crate::defaults;
use crate::error::{Error, Result};
use crate::generator::{Generator, Installer, PipInstaller, RospyBuild};
use crate::privilege::{ensure_unprivileged, PrivilegeCheck, ProcessPrivilege};
use crate::pythonpath::PythonPath;
use crate::repository::{FetchResult, RepoFetcher};
use crate::sources::{self, SourceList};
use crate::workspace;

/// Stages of a pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Start,
    Resolve,
    FetchAll,
    MergeCustom,
    InvokeGenerator,
    Install,
    Done,
    Failed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Start => "START",
            Stage::Resolve => "RESOLVE",
            Stage::FetchAll => "FETCH_ALL",
            Stage::MergeCustom => "MERGE_CUSTOM",
            Stage::InvokeGenerator => "INVOKE_GENERATOR",
            Stage::Install => "INSTALL",
            Stage::Done => "DONE",
            Stage::Failed => "FAILED",
        };
        f.write_str(name)
    }
}

/// Summary of a successful run.
#[derive(Debug, Clone, Default)]
pub struct Report {
    /// Stages entered, in order.
    pub stages: Vec<Stage>,
    /// Fetch outcome per source, in source-list order.
    pub fetched: Vec<(String, FetchResult)>,
    /// Where the custom package was merged, if one was given.
    pub custom_package: Option<PathBuf>,
    /// Package directories generated and installed, in order.
    pub generated: Vec<PathBuf>,
    /// Sources skipped because no message package was found in them.
    pub skipped: Vec<String>,
    /// Activation script written at the end of the run.
    pub activation_script: Option<PathBuf>,
}

impl Report {
    fn enter(&mut self, stage: Stage) {
        info!("Stage {}", stage);
        self.stages.push(stage);
    }

    fn current(&self) -> Stage {
        self.stages.last().copied().unwrap_or(Stage::Start)
    }
}

pub struct Pipeline {
    config: PipelineConfig,
    fetcher: RepoFetcher,
    generator: Box<dyn Generator>,
    installer: Box<dyn Installer>,
    privilege: Box<dyn PrivilegeCheck>,
}

impl Pipeline {
    /// Pipeline with the system `git`, `rospy-build` and `pip`.
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            fetcher: RepoFetcher::new(),
            generator: Box::new(RospyBuild::new(defaults::GENERATOR_PROGRAM)),
            installer: Box::new(PipInstaller::new(defaults::python_program())),
            privilege: Box::new(ProcessPrivilege),
        }
    }

    pub fn with_fetcher(mut self, fetcher: RepoFetcher) -> Self {
        self.fetcher = fetcher;
        self
    }

    pub fn with_generator(mut self, generator: Box<dyn Generator>) -> Self {
        self.generator = generator;
        self
    }

    pub fn with_installer(mut self, installer: Box<dyn Installer>) -> Self {
        self.installer = installer;
        self
    }

    pub fn with_privilege_check(mut self, privilege: Box<dyn PrivilegeCheck>) -> Self {
        self.privilege = privilege;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Resolve and fetch the sources only.
    pub fn fetch(&self) -> Result<Vec<(String, FetchResult)>> {
        ensure_unprivileged(self.privilege.as_ref())?;
        let sources = sources::resolve(&self.config.sources_path)?;
        self.fetch_sources(&sources)
    }

    /// Execute the whole pipeline.
    pub fn run(&self) -> Result<Report> {
        let mut report = Report::default();
        report.enter(Stage::Start);

        match self.run_stages(&mut report) {
            Ok(()) => {
                report.enter(Stage::Done);
                Ok(report)
            }
            Err(e) => {
                error!("Stage {} failed: {}", report.current(), e);
                report.enter(Stage::Failed);
                Err(e)
            }
        }
    }

    fn run_stages(&self, report: &mut Report) -> Result<()> {
        ensure_unprivileged(self.privilege.as_ref())?;

        if let Some(custom_dir) = &self.config.custom_dir {
            if !custom_dir.is_dir() {
                return Err(Error::Copy {
                    src: custom_dir.clone(),
                    dst: self.config.workspace_root.clone(),
                    message: "custom package directory does not exist or is not a directory"
                        .to_string(),
                });
            }
        }

        report.enter(Stage::Resolve);
        let sources = sources::resolve(&self.config.sources_path)?;
        if self.config.custom_dir.is_some() && sources.is_empty() {
            return Err(Error::Validation {
                message: format!(
                    "source list {} is empty; custom packages need the standard message sources",
                    self.config.sources_path.display()
                ),
            });
        }

        report.enter(Stage::FetchAll);
        report.fetched = self.fetch_sources(&sources)?;

        let targets = match &self.config.custom_dir {
            Some(custom_dir) => {
                report.enter(Stage::MergeCustom);
                let merged = workspace::merge(custom_dir, &self.config.workspace_root)?;
                let package_dir =
                    workspace::find_package_dir(&merged).unwrap_or_else(|| merged.clone());
                report.custom_package = Some(merged);
                vec![package_dir]
            }
            None => self.source_targets(&sources, &mut report.skipped),
        };

        let mut python_path = PythonPath::new(self.config.inherited_python_path.clone());
        for package_dir in targets {
            python_path.prepend(&package_dir);

            report.enter(Stage::InvokeGenerator);
            self.generator
                .generate(&self.config.workspace_root, &package_dir, &python_path)?;

            report.enter(Stage::Install);
            self.installer.install(&package_dir, &python_path)?;

            report.generated.push(package_dir);
        }

        report.activation_script =
            Some(python_path.write_activation_script(&self.config.workspace_root)?);
        Ok(())
    }

    fn fetch_sources(&self, sources: &SourceList) -> Result<Vec<(String, FetchResult)>> {
        let results = self.fetcher.fetch_all(
            sources,
            &self.config.workspace_root,
            self.config.parallel_fetch,
        )?;
        Ok(sources
            .iter()
            .map(|entry| entry.name.clone())
            .zip(results)
            .collect())
    }

    fn source_targets(&self, sources: &SourceList, skipped: &mut Vec<String>) -> Vec<PathBuf> {
        let mut targets = Vec::new();
        for entry in sources {
            if self.config.is_prebuilt(&entry.name) {
                debug!("{} is prebuilt, not generating it", entry.name);
                continue;
            }
            let checkout = self.config.workspace_root.join(&entry.name);
            match workspace::find_package_dir(&checkout) {
                Some(package_dir) => targets.push(package_dir),
                None => {
                    warn!("No message directory found in {}. Skipping.", entry.name);
                    skipped.push(entry.name.clone());
                }
            }
        }
        targets
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::GitOperations;
    use std::fs;
    use std::path::Path;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    type Calls = Arc<Mutex<Vec<String>>>;

    /// Mock git operations producing a checkout with a `msg` directory,
    /// except for URLs containing "docs"
    struct MockGitOperations {
        clones: Calls,
    }

    impl GitOperations for MockGitOperations {
        fn clone_shallow(
            &self,
            url: &str,
            _ref_name: Option<&str>,
            target_dir: &Path,
        ) -> Result<()> {
            self.clones.lock().unwrap().push(url.to_string());
            fs::create_dir_all(target_dir)?;
            fs::write(target_dir.join("README.md"), url)?;
            if !url.contains("docs") {
                fs::create_dir_all(target_dir.join("msg"))?;
            }
            Ok(())
        }
    }

    /// Records every external tool invocation into one shared log
    struct RecordingTool {
        log: Calls,
        fail_with: Option<i32>,
    }

    impl Generator for RecordingTool {
        fn generate(
            &self,
            workspace_root: &Path,
            package_dir: &Path,
            python_path: &PythonPath,
        ) -> Result<()> {
            self.log.lock().unwrap().push(format!(
                "generate {} {} [{}]",
                workspace_root.display(),
                package_dir.display(),
                python_path.entries().len()
            ));
            match self.fail_with {
                Some(code) => Err(Error::ExternalTool {
                    tool: "rospy-build".to_string(),
                    code: Some(code),
                    message: "exited unsuccessfully".to_string(),
                }),
                None => Ok(()),
            }
        }
    }

    impl Installer for RecordingTool {
        fn install(&self, package_dir: &Path, _python_path: &PythonPath) -> Result<()> {
            self.log
                .lock()
                .unwrap()
                .push(format!("install {}", package_dir.display()));
            Ok(())
        }
    }

    struct Elevated;

    impl PrivilegeCheck for Elevated {
        fn is_elevated(&self) -> bool {
            true
        }
    }

    struct NotElevated;

    impl PrivilegeCheck for NotElevated {
        fn is_elevated(&self) -> bool {
            false
        }
    }

    struct Harness {
        temp_dir: TempDir,
        clones: Calls,
        tools: Calls,
    }

    impl Harness {
        fn new(sources: &str) -> Self {
            let temp_dir = TempDir::new().unwrap();
            fs::write(temp_dir.path().join("source_list.json"), sources).unwrap();
            Self {
                temp_dir,
                clones: Arc::new(Mutex::new(Vec::new())),
                tools: Arc::new(Mutex::new(Vec::new())),
            }
        }

        fn root(&self) -> PathBuf {
            self.temp_dir.path().join("genmsg")
        }

        fn config(&self) -> PipelineConfig {
            PipelineConfig::from_base_dir(self.temp_dir.path())
        }

        fn pipeline(&self, config: PipelineConfig) -> Pipeline {
            self.pipeline_with(config, None)
        }

        fn pipeline_with(&self, config: PipelineConfig, fail_with: Option<i32>) -> Pipeline {
            Pipeline::new(config)
                .with_fetcher(RepoFetcher::with_operations(Box::new(MockGitOperations {
                    clones: self.clones.clone(),
                })))
                .with_generator(Box::new(RecordingTool {
                    log: self.tools.clone(),
                    fail_with,
                }))
                .with_installer(Box::new(RecordingTool {
                    log: self.tools.clone(),
                    fail_with: None,
                }))
                .with_privilege_check(Box::new(NotElevated))
        }

        fn tool_calls(&self) -> Vec<String> {
            self.tools.lock().unwrap().clone()
        }
    }

    const STD_MSGS: &str = r#"[{"name": "std_msgs", "url": "https://example/std_msgs.git"}]"#;

    #[test]
    fn test_run_fetches_and_generates_single_source() {
        let harness = Harness::new(STD_MSGS);
        let report = harness.pipeline(harness.config()).run().unwrap();

        let root = harness.root();
        assert!(root.join("std_msgs/msg").is_dir());
        assert_eq!(
            report.fetched,
            vec![("std_msgs".to_string(), FetchResult::Cloned)]
        );
        assert_eq!(
            harness.tool_calls(),
            vec![
                format!(
                    "generate {} {} [1]",
                    root.display(),
                    root.join("std_msgs").display()
                ),
                format!("install {}", root.join("std_msgs").display()),
            ]
        );
        assert_eq!(
            report.stages,
            vec![
                Stage::Start,
                Stage::Resolve,
                Stage::FetchAll,
                Stage::InvokeGenerator,
                Stage::Install,
                Stage::Done
            ]
        );
    }

    #[test]
    fn test_second_run_reuses_clones() {
        let harness = Harness::new(STD_MSGS);
        harness.pipeline(harness.config()).run().unwrap();
        let report = harness.pipeline(harness.config()).run().unwrap();

        assert_eq!(harness.clones.lock().unwrap().len(), 1);
        assert_eq!(
            report.fetched,
            vec![("std_msgs".to_string(), FetchResult::AlreadyPresent)]
        );
    }

    #[test]
    fn test_elevated_user_is_rejected_before_any_mutation() {
        let harness = Harness::new(STD_MSGS);
        let pipeline = harness
            .pipeline(harness.config())
            .with_privilege_check(Box::new(Elevated));

        let err = pipeline.run().unwrap_err();

        assert!(matches!(err, Error::Privilege { .. }));
        assert!(!harness.root().exists());
        assert!(harness.clones.lock().unwrap().is_empty());
        assert!(harness.tool_calls().is_empty());
    }

    #[test]
    fn test_prebuilt_sources_are_fetched_but_not_generated() {
        let harness = Harness::new(
            r#"[
                {"name": "std_msgs", "url": "https://example/std_msgs.git"},
                {"name": "robot_msgs", "url": "https://example/robot_msgs.git"}
            ]"#,
        );
        let config = harness.config().with_prebuilt(["std_msgs", "common_msgs"]);
        let report = harness.pipeline(config).run().unwrap();

        assert_eq!(report.fetched.len(), 2);
        assert_eq!(report.generated, vec![harness.root().join("robot_msgs")]);
    }

    #[test]
    fn test_sources_without_messages_are_skipped() {
        let harness = Harness::new(
            r#"[
                {"name": "manual", "url": "https://example/docs.git"},
                {"name": "robot_msgs", "url": "https://example/robot_msgs.git"}
            ]"#,
        );
        let report = harness.pipeline(harness.config()).run().unwrap();

        assert_eq!(report.skipped, vec!["manual".to_string()]);
        assert_eq!(report.generated, vec![harness.root().join("robot_msgs")]);
    }

    #[test]
    fn test_python_path_accumulates_across_targets() {
        let harness = Harness::new(
            r#"[
                {"name": "a_msgs", "url": "https://example/a.git"},
                {"name": "b_msgs", "url": "https://example/b.git"}
            ]"#,
        );
        let config = harness.config().with_inherited_python_path(None);
        let report = harness.pipeline(config).run().unwrap();

        let calls = harness.tool_calls();
        assert!(calls[0].ends_with("[1]"));
        assert!(calls[2].ends_with("[2]"));

        let script = report.activation_script.unwrap();
        assert!(script.starts_with(harness.root()));
        let content = fs::read_to_string(script).unwrap();
        assert!(content.contains("b_msgs"));
        assert!(content.contains("a_msgs"));
    }

    #[test]
    fn test_custom_package_is_merged_and_only_target() {
        let harness = Harness::new(STD_MSGS);
        let custom = harness.temp_dir.path().join("interfaces").join("team_msgs");
        fs::create_dir_all(custom.join("msg")).unwrap();
        fs::write(custom.join("msg/Pose.msg"), "float64 x").unwrap();

        let config = harness.config().with_custom_dir(&custom);
        let report = harness.pipeline(config).run().unwrap();

        let merged = harness.root().join("team_msgs");
        assert_eq!(report.custom_package, Some(merged.clone()));
        assert!(merged.join("msg/Pose.msg").is_file());
        assert!(harness.root().join("std_msgs").is_dir());
        assert_eq!(report.generated, vec![merged.clone()]);
        assert_eq!(
            harness.tool_calls()[0],
            format!(
                "generate {} {} [1]",
                harness.root().display(),
                merged.display()
            )
        );
        assert!(report.stages.contains(&Stage::MergeCustom));
    }

    #[test]
    fn test_custom_package_replaces_previous_snapshot() {
        let harness = Harness::new(STD_MSGS);
        let custom = harness.temp_dir.path().join("team_msgs");
        fs::create_dir_all(custom.join("msg")).unwrap();
        fs::write(custom.join("msg/Old.msg"), "int32 a").unwrap();
        harness
            .pipeline(harness.config().with_custom_dir(&custom))
            .run()
            .unwrap();

        fs::remove_file(custom.join("msg/Old.msg")).unwrap();
        fs::write(custom.join("msg/New.msg"), "int32 b").unwrap();
        harness
            .pipeline(harness.config().with_custom_dir(&custom))
            .run()
            .unwrap();

        let merged = harness.root().join("team_msgs/msg");
        assert!(merged.join("New.msg").exists());
        assert!(!merged.join("Old.msg").exists());
    }

    #[test]
    fn test_missing_custom_dir_fails_before_fetching() {
        let harness = Harness::new(STD_MSGS);
        let config = harness
            .config()
            .with_custom_dir(harness.temp_dir.path().join("nope"));

        let err = harness.pipeline(config).run().unwrap_err();

        assert!(matches!(err, Error::Copy { .. }));
        assert!(harness.clones.lock().unwrap().is_empty());
    }

    #[test]
    fn test_custom_with_empty_source_list_is_rejected() {
        let harness = Harness::new("[]");
        let custom = harness.temp_dir.path().join("team_msgs");
        fs::create_dir_all(custom.join("msg")).unwrap();

        let err = harness
            .pipeline(harness.config().with_custom_dir(&custom))
            .run()
            .unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
    }

    #[test]
    fn test_empty_source_list_without_custom_is_done() {
        let harness = Harness::new("[]");
        let report = harness.pipeline(harness.config()).run().unwrap();
        assert!(report.generated.is_empty());
        assert_eq!(report.stages.last(), Some(&Stage::Done));
    }

    #[test]
    fn test_generator_failure_aborts_and_keeps_clones() {
        let harness = Harness::new(STD_MSGS);
        let err = harness
            .pipeline_with(harness.config(), Some(3))
            .run()
            .unwrap_err();

        assert_eq!(err.exit_code(), 3);
        // Installer never ran
        assert_eq!(harness.tool_calls().len(), 1);
        assert!(harness.root().join("std_msgs").is_dir());
        assert!(!harness.root().join("set_build_python_path.sh").exists());
    }

    #[test]
    fn test_missing_source_list() {
        let harness = Harness::new(STD_MSGS);
        let config = PipelineConfig::new(
            harness.temp_dir.path().join("other.json"),
            harness.root(),
        );
        let err = harness.pipeline(config).run().unwrap_err();
        assert!(matches!(err, Error::SourceListNotFound { .. }));
    }

    #[test]
    fn test_fetch_only() {
        let harness = Harness::new(STD_MSGS);
        let fetched = harness.pipeline(harness.config()).fetch().unwrap();

        assert_eq!(fetched, vec![("std_msgs".to_string(), FetchResult::Cloned)]);
        assert!(harness.tool_calls().is_empty());
    }

    #[test]
    fn test_stage_display() {
        assert_eq!(Stage::FetchAll.to_string(), "FETCH_ALL");
        assert_eq!(Stage::InvokeGenerator.to_string(), "INVOKE_GENERATOR");
    }
}
