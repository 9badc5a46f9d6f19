use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::common::geometry::Insets;
use crate::sys::gateway::WindowInfo;

pub fn data_dir() -> PathBuf { dirs::home_dir().unwrap().join(".quilt") }
pub fn restore_file() -> PathBuf { data_dir().join("layout.ron") }
pub fn config_file() -> PathBuf { dirs::home_dir().unwrap().join(".quilt.toml") }

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Pixels reserved at the top of every monitor for the status bar.
    pub bar_height: i32,
    /// Delay before re-layout after a burst of monitor changes, in ms.
    pub monitor_settle_ms: u64,
    /// Delay before refreshing monitors after a session unlock, in ms. The OS
    /// may report a stale work area immediately after unlock.
    pub unlock_refresh_ms: u64,
    pub outer_gaps: Insets,
    pub inner_gap: i32,
    /// Split ratio for the slice engine's primary window.
    pub primary_ratio: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            bar_height: 0,
            monitor_settle_ms: 1000,
            unlock_refresh_ms: 3000,
            outer_gaps: Insets::default(),
            inner_gap: 0,
            primary_ratio: 0.5,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum MatchBy {
    Class,
    Process,
    Title,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone, Copy, Default)]
#[serde(rename_all = "snake_case")]
pub enum PatternKind {
    #[default]
    Exact,
    Regex,
}

/// Matches one attribute of a window against an exact string or a regex.
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct WindowMatcher {
    pub by: MatchBy,
    pub pattern: String,
    #[serde(default)]
    pub kind: PatternKind,
}

/// Routes matched windows to a workspace by name.
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct RouterRule {
    #[serde(flatten)]
    pub matcher: WindowMatcher,
    pub workspace: String,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum EngineKind {
    Column,
    Tree,
    Slice,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct WorkspaceDef {
    pub name: String,
    #[serde(default = "default_engines")]
    pub engines: Vec<EngineKind>,
}

pub fn default_engines() -> Vec<EngineKind> { vec![EngineKind::Column, EngineKind::Tree] }

/// Assigns an initial workspace to a monitor by monitor name. A `"*"` monitor
/// pattern means "any remaining monitor".
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct MonitorAssignment {
    pub monitor: String,
    pub workspace: String,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, Default)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub settings: Settings,
    /// Windows matching any filter are never tracked.
    pub filters: Vec<WindowMatcher>,
    /// Checked in order; first match wins.
    pub routers: Vec<RouterRule>,
    pub workspaces: Vec<WorkspaceDef>,
    pub monitors: Vec<MonitorAssignment>,
}

impl Config {
    pub fn read(path: &Path) -> anyhow::Result<Config> {
        let buf = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config at {}", path.display()))?;
        let config: Config = toml::from_str(&buf)?;
        let issues = config.validate();
        if !issues.is_empty() {
            bail!("invalid config:\n  {}", issues.join("\n  "));
        }
        Ok(config)
    }

    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if self.settings.monitor_settle_ms == 0 {
            issues.push("settings.monitor_settle_ms must be at least 1".to_string());
        }
        if self.settings.bar_height < 0 {
            issues.push("settings.bar_height must not be negative".to_string());
        }
        if !(0.05..=0.95).contains(&self.settings.primary_ratio) {
            issues.push("settings.primary_ratio must be within 0.05..=0.95".to_string());
        }

        let mut seen_names = crate::common::collections::HashSet::default();
        for def in &self.workspaces {
            if def.name.is_empty() {
                issues.push("workspace name must not be empty".to_string());
            }
            if !seen_names.insert(def.name.as_str()) {
                issues.push(format!("duplicate workspace name '{}'", def.name));
            }
            if def.engines.is_empty() {
                issues.push(format!("workspace '{}' has no layout engines", def.name));
            }
        }

        for router in &self.routers {
            if !seen_names.contains(router.workspace.as_str()) {
                issues.push(format!(
                    "router for pattern '{}' references unknown workspace '{}'",
                    router.matcher.pattern, router.workspace
                ));
            }
        }
        for assignment in &self.monitors {
            if !seen_names.contains(assignment.workspace.as_str()) {
                issues.push(format!(
                    "monitor assignment '{}' references unknown workspace '{}'",
                    assignment.monitor, assignment.workspace
                ));
            }
        }

        for matcher in
            self.filters.iter().chain(self.routers.iter().map(|router| &router.matcher))
        {
            if matcher.kind == PatternKind::Regex {
                if let Err(e) = Regex::new(&matcher.pattern) {
                    issues.push(format!("invalid regex '{}': {e}", matcher.pattern));
                }
            }
        }

        issues
    }
}

enum CompiledPattern {
    Exact(String),
    Regex(Regex),
}

impl CompiledPattern {
    fn matches(&self, value: &str) -> bool {
        match self {
            CompiledPattern::Exact(s) => s == value,
            CompiledPattern::Regex(re) => re.is_match(value),
        }
    }
}

pub struct CompiledMatcher {
    by: MatchBy,
    pattern: CompiledPattern,
}

impl CompiledMatcher {
    fn compile(matcher: &WindowMatcher) -> anyhow::Result<CompiledMatcher> {
        let pattern = match matcher.kind {
            PatternKind::Exact => CompiledPattern::Exact(matcher.pattern.clone()),
            PatternKind::Regex => CompiledPattern::Regex(
                Regex::new(&matcher.pattern)
                    .with_context(|| format!("invalid regex '{}'", matcher.pattern))?,
            ),
        };
        Ok(CompiledMatcher { by: matcher.by, pattern })
    }

    pub fn matches(&self, info: &WindowInfo) -> bool {
        let value = match self.by {
            MatchBy::Class => &info.class,
            MatchBy::Process => &info.process,
            MatchBy::Title => &info.title,
        };
        self.pattern.matches(value)
    }
}

/// Filters and routers with their patterns compiled once at startup.
pub struct Rules {
    filters: Vec<CompiledMatcher>,
    routers: Vec<(CompiledMatcher, String)>,
}

impl Rules {
    pub fn compile(config: &Config) -> anyhow::Result<Rules> {
        let filters = config
            .filters
            .iter()
            .map(CompiledMatcher::compile)
            .collect::<anyhow::Result<Vec<_>>>()?;
        let routers = config
            .routers
            .iter()
            .map(|router| {
                Ok((
                    CompiledMatcher::compile(&router.matcher)?,
                    router.workspace.clone(),
                ))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;
        Ok(Rules { filters, routers })
    }

    pub fn is_filtered(&self, info: &WindowInfo) -> bool {
        self.filters.iter().any(|filter| filter.matches(info))
    }

    /// Returns the destination workspace name of the first matching router.
    pub fn route(&self, info: &WindowInfo) -> Option<&str> {
        self.routers
            .iter()
            .find(|(matcher, _)| matcher.matches(info))
            .map(|(_, workspace)| workspace.as_str())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::sys::gateway::WindowHandle;

    fn window(class: &str, process: &str, title: &str) -> WindowInfo {
        WindowInfo {
            handle: WindowHandle::new(1),
            title: title.to_string(),
            process: process.to_string(),
            class: class.to_string(),
            minimized: false,
            maximized: false,
        }
    }

    #[test]
    fn parses_full_config() {
        let config: Config = toml::from_str(
            r#"
            [settings]
            bar_height = 30
            inner_gap = 8

            [[filters]]
            by = "process"
            pattern = "screensnip.exe"

            [[routers]]
            by = "title"
            pattern = ".*Music.*"
            kind = "regex"
            workspace = "media"

            [[workspaces]]
            name = "main"
            engines = ["column", "tree"]

            [[workspaces]]
            name = "media"

            [[monitors]]
            monitor = "*"
            workspace = "main"
            "#,
        )
        .unwrap();

        assert_eq!(config.settings.bar_height, 30);
        assert_eq!(config.settings.monitor_settle_ms, 1000);
        assert_eq!(config.workspaces.len(), 2);
        assert_eq!(config.workspaces[1].engines, default_engines());
        assert!(config.validate().is_empty());
    }

    #[test]
    fn validate_flags_unknown_workspace_references() {
        let config = Config {
            routers: vec![RouterRule {
                matcher: WindowMatcher {
                    by: MatchBy::Class,
                    pattern: "x".into(),
                    kind: PatternKind::Exact,
                },
                workspace: "nope".into(),
            }],
            ..Config::default()
        };
        let issues = config.validate();
        assert_eq!(issues.len(), 1);
        assert!(issues[0].contains("nope"));
    }

    #[test]
    fn rules_filter_and_route_in_order() {
        let config: Config = toml::from_str(
            r#"
            [[filters]]
            by = "class"
            pattern = "Tooltip"

            [[routers]]
            by = "process"
            pattern = "term.exe"
            workspace = "dev"

            [[routers]]
            by = "process"
            pattern = ".*\\.exe"
            kind = "regex"
            workspace = "misc"

            [[workspaces]]
            name = "dev"

            [[workspaces]]
            name = "misc"
            "#,
        )
        .unwrap();
        let rules = Rules::compile(&config).unwrap();

        assert!(rules.is_filtered(&window("Tooltip", "any.exe", "")));
        assert!(!rules.is_filtered(&window("Main", "any.exe", "")));
        assert_eq!(rules.route(&window("Main", "term.exe", "")), Some("dev"));
        assert_eq!(rules.route(&window("Main", "other.exe", "")), Some("misc"));
        assert_eq!(rules.route(&window("Main", "other", "")), None);
    }
}
