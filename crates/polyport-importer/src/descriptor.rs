//! Typed view of `problem.xml`
//!
//! The descriptor is parsed once per job; later stages consume the typed
//! form and read referenced archive members lazily by path.

use roxmltree::{Document, Node};

use crate::error::{ImportError, ImportResult};

/// Everything the importer consumes from the package descriptor
#[derive(Debug, Clone)]
pub struct Descriptor {
    pub revision: i64,
    pub names: Vec<ProblemName>,
    pub testsets: Vec<Testset>,
    pub checker: Option<CheckerSpec>,
    pub interactor: Option<InteractorSpec>,
    pub statements: Vec<StatementSpec>,
    pub main_solution: Option<SolutionSpec>,
    pub tags: Vec<String>,
}

/// Problem display name in one language
#[derive(Debug, Clone)]
pub struct ProblemName {
    pub language: Option<String>,
    pub value: String,
}

/// One `<testset>` block
#[derive(Debug, Clone)]
pub struct Testset {
    pub name: String,
    /// Milliseconds
    pub time_limit_ms: Option<f64>,
    /// Bytes
    pub memory_limit_bytes: Option<u64>,
    /// printf-style pattern with one integer placeholder
    pub input_pattern: Option<String>,
    pub answer_pattern: Option<String>,
    pub tests: Vec<TestSpec>,
    /// `None` when the testset has no `<groups>` block at all
    pub groups: Option<Vec<GroupSpec>>,
}

/// One `<test>` entry
#[derive(Debug, Clone)]
pub struct TestSpec {
    pub points: f64,
    pub group: Option<String>,
}

/// Scoring policy of a group
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointsPolicy {
    CompleteGroup,
    EachTest,
}

/// One `<group>` entry
#[derive(Debug, Clone)]
pub struct GroupSpec {
    pub name: String,
    pub points: f64,
    pub policy: PointsPolicy,
    /// Names of groups this one depends on
    pub dependencies: Vec<String>,
}

/// `<checker>` with its source member
#[derive(Debug, Clone)]
pub struct CheckerSpec {
    pub kind: Option<String>,
    pub source_path: Option<String>,
}

/// `<interactor>` with its source member
#[derive(Debug, Clone)]
pub struct InteractorSpec {
    pub source_path: Option<String>,
}

/// `<statement>` reference
#[derive(Debug, Clone)]
pub struct StatementSpec {
    pub kind: Option<String>,
    pub language: Option<String>,
    pub path: Option<String>,
}

/// `<solution tag="main">` source reference
#[derive(Debug, Clone)]
pub struct SolutionSpec {
    pub source_path: Option<String>,
    pub source_type: Option<String>,
}

fn child<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.children()
        .find(|c| c.is_element() && c.has_tag_name(name))
}

fn child_text(node: Node<'_, '_>, name: &str) -> Option<String> {
    child(node, name)
        .and_then(|c| c.text())
        .map(ToString::to_string)
}

fn attr(node: Node<'_, '_>, name: &str) -> Option<String> {
    node.attribute(name).map(ToString::to_string)
}

impl Descriptor {
    pub fn parse(xml: &str) -> ImportResult<Self> {
        let doc = Document::parse(xml)?;
        let root = doc.root_element();

        let revision = root
            .attribute("revision")
            .and_then(|r| r.parse().ok())
            .ok_or_else(|| ImportError::import("Descriptor has no revision"))?;

        let names = root
            .descendants()
            .filter(|n| n.is_element() && n.has_tag_name("name") && n.has_attribute("value"))
            .map(|n| ProblemName {
                language: attr(n, "language"),
                value: attr(n, "value").unwrap_or_default(),
            })
            .collect();

        let testsets = root
            .descendants()
            .filter(|n| n.is_element() && n.has_tag_name("testset"))
            .map(parse_testset)
            .collect::<ImportResult<Vec<_>>>()?;

        let checker = root
            .descendants()
            .find(|n| n.is_element() && n.has_tag_name("checker"))
            .map(|n| CheckerSpec {
                kind: attr(n, "type"),
                source_path: child(n, "source").and_then(|s| attr(s, "path")),
            });

        let interactor = root
            .descendants()
            .find(|n| n.is_element() && n.has_tag_name("interactor"))
            .map(|n| InteractorSpec {
                source_path: child(n, "source").and_then(|s| attr(s, "path")),
            });

        let statements = root
            .descendants()
            .filter(|n| n.is_element() && n.has_tag_name("statement"))
            .map(|n| StatementSpec {
                kind: attr(n, "type"),
                language: attr(n, "language"),
                path: attr(n, "path"),
            })
            .collect();

        let main_solution = root
            .descendants()
            .find(|n| {
                n.is_element() && n.has_tag_name("solution") && n.attribute("tag") == Some("main")
            })
            .map(|n| SolutionSpec {
                source_path: child(n, "source").and_then(|s| attr(s, "path")),
                source_type: child(n, "source").and_then(|s| attr(s, "type")),
            });

        let tags = root
            .descendants()
            .filter(|n| n.is_element() && n.has_tag_name("tags"))
            .flat_map(|tags| {
                tags.children()
                    .filter(|t| t.is_element() && t.has_tag_name("tag"))
                    .filter_map(|t| attr(t, "value"))
                    .collect::<Vec<_>>()
            })
            .collect();

        Ok(Self {
            revision,
            names,
            testsets,
            checker,
            interactor,
            statements,
            main_solution,
            tags,
        })
    }

    /// Testset by name
    pub fn testset(&self, name: &str) -> Option<&Testset> {
        self.testsets.iter().find(|t| t.name == name)
    }

    /// Display name for a language; `None` asks for any name
    pub fn name_for(&self, language: Option<&str>) -> Option<&str> {
        match language {
            Some(language) => self
                .names
                .iter()
                .find(|n| n.language.as_deref() == Some(language))
                .map(|n| n.value.as_str()),
            None => self.names.first().map(|n| n.value.as_str()),
        }
    }

    /// Whether a `<tags>` entry carries this value
    pub fn has_tag(&self, value: &str) -> bool {
        self.tags.iter().any(|t| t == value)
    }
}

fn parse_testset(node: Node<'_, '_>) -> ImportResult<Testset> {
    let name = attr(node, "name")
        .ok_or_else(|| ImportError::import("Testset has no name attribute"))?;

    let tests = child(node, "tests")
        .map(|tests| {
            tests
                .children()
                .filter(|t| t.is_element() && t.has_tag_name("test"))
                .map(|t| TestSpec {
                    points: t
                        .attribute("points")
                        .and_then(|p| p.parse().ok())
                        .unwrap_or(0.0),
                    group: attr(t, "group"),
                })
                .collect()
        })
        .unwrap_or_default();

    let groups = child(node, "groups")
        .map(|groups| {
            groups
                .children()
                .filter(|g| g.is_element() && g.has_tag_name("group"))
                .map(parse_group)
                .collect::<ImportResult<Vec<_>>>()
        })
        .transpose()?;

    Ok(Testset {
        name,
        time_limit_ms: child_text(node, "time-limit").and_then(|t| t.parse().ok()),
        memory_limit_bytes: child_text(node, "memory-limit").and_then(|t| t.parse().ok()),
        input_pattern: child_text(node, "input-path-pattern"),
        answer_pattern: child_text(node, "answer-path-pattern"),
        tests,
        groups,
    })
}

fn parse_group(node: Node<'_, '_>) -> ImportResult<GroupSpec> {
    let name =
        attr(node, "name").ok_or_else(|| ImportError::import("Group has no name attribute"))?;

    let policy = match node.attribute("points-policy") {
        Some("complete-group") => PointsPolicy::CompleteGroup,
        Some("each-test") => PointsPolicy::EachTest,
        other => {
            return Err(ImportError::import(format!(
                "Group {name} has unsupported points policy {}",
                other.unwrap_or("<missing>")
            )))
        }
    };

    let dependencies = child(node, "dependencies")
        .map(|deps| {
            deps.children()
                .filter(|d| d.is_element() && d.has_tag_name("dependency"))
                .filter_map(|d| attr(d, "group"))
                .collect()
        })
        .unwrap_or_default();

    Ok(GroupSpec {
        name,
        points: node
            .attribute("points")
            .and_then(|p| p.parse().ok())
            .unwrap_or(0.0),
        policy,
        dependencies,
    })
}
