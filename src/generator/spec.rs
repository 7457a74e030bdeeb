use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_yaml::Value as Yaml;
use tracing::debug;

use super::naming::UniqueNames;
use crate::api::Methods;
use crate::errors::{GenError, Result};

/// One YAML test file.
#[derive(Debug, Clone, Serialize)]
pub struct TestSpec {
    pub file_name: String,
    pub module_name: String,
    /// Canonical name of the method under test.
    pub method: String,
    /// Skip declared in `setup`; applies to every test in the file.
    pub skip: Option<Skip>,
    pub setup: Vec<Action>,
    pub teardown: Vec<Action>,
    pub tests: Vec<TestCase>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TestCase {
    pub name: String,
    pub fn_name: String,
    pub skip: Option<Skip>,
    pub actions: Vec<Action>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Skip {
    pub version: Option<String>,
    pub reason: Option<String>,
    #[serde(default)]
    pub features: Vec<String>,
}

impl Skip {
    /// Why a test carrying this skip must not run, given the features the
    /// target client supports. `None` means the test runs.
    pub fn ignore_reason(&self, supported: &[String]) -> Option<String> {
        let missing: Vec<&str> = self
            .features
            .iter()
            .filter(|f| !supported.contains(f))
            .map(String::as_str)
            .collect();
        if self.version.is_none() && missing.is_empty() {
            return None;
        }
        if let Some(reason) = &self.reason {
            return Some(reason.clone());
        }
        Some(match &self.version {
            Some(v) => format!("skipped for version {}", v.trim()),
            None => format!("unsupported features: {}", missing.join(", ")),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Action {
    Do(DoAction),
    Set { path: String, variable: String },
    Assert(Assertion),
}

/// A request against another API method.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DoAction {
    pub api: String,
    pub params: serde_json::Map<String, Value>,
    pub catch: Option<String>,
    pub headers: Vec<(String, String)>,
    pub warnings: Vec<String>,
    pub allowed_warnings: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AssertOp {
    Match,
    IsTrue,
    IsFalse,
    Length,
    Lt,
    Gt,
    Lte,
    Gte,
    Contains,
}

impl AssertOp {
    fn from_key(key: &str) -> Option<Self> {
        Some(match key {
            "match" => AssertOp::Match,
            "is_true" => AssertOp::IsTrue,
            "is_false" => AssertOp::IsFalse,
            "length" => AssertOp::Length,
            "lt" => AssertOp::Lt,
            "gt" => AssertOp::Gt,
            "lte" => AssertOp::Lte,
            "gte" => AssertOp::Gte,
            "contains" => AssertOp::Contains,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Assertion {
    pub op: AssertOp,
    pub path: String,
    pub expected: Value,
}

/// Read and parse one spec file. `do` blocks are checked against `methods`.
pub fn parse_file(path: &Path, methods: &Methods, method: &str) -> Result<TestSpec> {
    let text = fs::read_to_string(path)?;
    parse_str(path, &text, methods, method)
}

pub fn parse_str(path: &Path, text: &str, methods: &Methods, method: &str) -> Result<TestSpec> {
    let parser = Parser { file: path, methods };
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = path
        .file_stem()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut spec = TestSpec {
        file_name,
        module_name: super::naming::ident(&stem),
        method: method.to_string(),
        skip: None,
        setup: Vec::new(),
        teardown: Vec::new(),
        tests: Vec::new(),
    };
    // Test fns share a module with the generated setup/teardown helpers.
    let mut fn_names = UniqueNames::with_reserved(&["setup", "teardown"]);
    let (mut seen_setup, mut seen_teardown) = (false, false);

    for document in serde_yaml::Deserializer::from_str(text) {
        let value = Yaml::deserialize(document).map_err(|source| GenError::Yaml {
            file: path.to_path_buf(),
            source,
        })?;
        let sections = match value {
            Yaml::Null => continue,
            Yaml::Mapping(m) => m,
            _ => return Err(parser.err("each document must be a mapping")),
        };

        for (key, body) in sections {
            let name = scalar_string(&key).ok_or_else(|| parser.err("section names must be scalars"))?;
            let steps = parser.steps(&name, body)?;
            match name.as_str() {
                "setup" => {
                    if std::mem::replace(&mut seen_setup, true) {
                        return Err(parser.err("duplicate setup section"));
                    }
                    let (skip, actions) = parser.block(steps)?;
                    spec.skip = skip;
                    spec.setup = actions;
                }
                "teardown" => {
                    if std::mem::replace(&mut seen_teardown, true) {
                        return Err(parser.err("duplicate teardown section"));
                    }
                    let (skip, actions) = parser.block(steps)?;
                    if skip.is_some() {
                        return Err(parser.err("skip is not allowed in teardown"));
                    }
                    spec.teardown = actions;
                }
                _ => {
                    let (skip, actions) = parser.block(steps)?;
                    spec.tests.push(TestCase {
                        fn_name: fn_names.claim(&name),
                        name,
                        skip,
                        actions,
                    });
                }
            }
        }
    }

    debug!(
        file = %path.display(),
        tests = spec.tests.len(),
        setup = spec.setup.len(),
        teardown = spec.teardown.len(),
        "parsed test spec"
    );
    Ok(spec)
}

struct Parser<'a> {
    file: &'a Path,
    methods: &'a Methods,
}

impl Parser<'_> {
    fn err(&self, message: impl Into<String>) -> GenError {
        GenError::spec(self.file, message)
    }

    fn steps(&self, section: &str, body: Yaml) -> Result<Vec<Yaml>> {
        match body {
            Yaml::Null => Ok(Vec::new()),
            Yaml::Sequence(seq) => Ok(seq),
            _ => Err(self.err(format!("section \"{section}\" must be a list of actions"))),
        }
    }

    fn block(&self, steps: Vec<Yaml>) -> Result<(Option<Skip>, Vec<Action>)> {
        let mut skip = None;
        let mut actions = Vec::with_capacity(steps.len());

        for (idx, step) in steps.into_iter().enumerate() {
            let (key, value) = self.single_entry(step)?;
            match key.as_str() {
                "skip" => {
                    if idx != 0 {
                        return Err(self.err("skip must be the first action of a section"));
                    }
                    skip = Some(self.skip(value)?);
                }
                "do" => actions.push(Action::Do(self.do_action(value)?)),
                "set" => {
                    for (path, variable) in self.entries("set", value)? {
                        let variable = scalar_string(&variable)
                            .ok_or_else(|| self.err(format!("set target for \"{path}\" must be a scalar")))?;
                        actions.push(Action::Set { path, variable });
                    }
                }
                "is_true" | "is_false" => {
                    let path = scalar_string(&value)
                        .ok_or_else(|| self.err(format!("{key} expects a path")))?;
                    let op = if key == "is_true" {
                        AssertOp::IsTrue
                    } else {
                        AssertOp::IsFalse
                    };
                    actions.push(Action::Assert(Assertion {
                        op,
                        path,
                        expected: Value::Null,
                    }));
                }
                other => {
                    let op = AssertOp::from_key(other)
                        .ok_or_else(|| self.err(format!("unsupported action \"{other}\"")))?;
                    for (path, expected) in self.entries(other, value)? {
                        actions.push(Action::Assert(Assertion {
                            op,
                            path,
                            expected: to_json(&expected)?,
                        }));
                    }
                }
            }
        }
        Ok((skip, actions))
    }

    fn single_entry(&self, step: Yaml) -> Result<(String, Yaml)> {
        let map = match step {
            Yaml::Mapping(m) if m.len() == 1 => m,
            _ => return Err(self.err("each action must be a mapping with exactly one key")),
        };
        let (key, value) = map
            .into_iter()
            .next()
            .ok_or_else(|| self.err("empty action"))?;
        let key = scalar_string(&key).ok_or_else(|| self.err("action names must be scalars"))?;
        Ok((key, value))
    }

    fn entries(&self, action: &str, value: Yaml) -> Result<Vec<(String, Yaml)>> {
        let map = match value {
            Yaml::Mapping(m) => m,
            _ => return Err(self.err(format!("{action} expects a mapping"))),
        };
        map.into_iter()
            .map(|(k, v)| {
                let k = scalar_string(&k).ok_or_else(|| self.err(format!("{action} keys must be scalars")))?;
                Ok((k, v))
            })
            .collect()
    }

    fn skip(&self, value: Yaml) -> Result<Skip> {
        let mut skip = Skip::default();
        for (key, v) in self.entries("skip", value)? {
            match key.as_str() {
                "version" => skip.version = scalar_string(&v),
                "reason" => skip.reason = scalar_string(&v),
                "features" => skip.features = self.string_list("features", v)?,
                other => debug!(file = %self.file.display(), key = other, "ignoring skip key"),
            }
        }
        Ok(skip)
    }

    fn do_action(&self, value: Yaml) -> Result<DoAction> {
        let mut action = DoAction::default();
        let mut api: Option<(String, Yaml)> = None;

        for (key, v) in self.entries("do", value)? {
            match key.as_str() {
                "catch" => action.catch = scalar_string(&v),
                "headers" => {
                    for (name, header) in self.entries("headers", v)? {
                        let header = scalar_string(&header)
                            .ok_or_else(|| self.err(format!("header \"{name}\" must be a scalar")))?;
                        action.headers.push((name, header));
                    }
                }
                "warnings" => action.warnings = self.string_list("warnings", v)?,
                "allowed_warnings" => action.allowed_warnings = self.string_list("allowed_warnings", v)?,
                "node_selector" => debug!(file = %self.file.display(), "ignoring node_selector"),
                _ => {
                    if let Some((prev, _)) = &api {
                        return Err(self.err(format!("do calls more than one API: {prev} and {key}")));
                    }
                    api = Some((key, v));
                }
            }
        }

        let (name, params) = api.ok_or_else(|| self.err("do without an API call"))?;
        if !self.methods.contains_key(&name) {
            return Err(self.err(format!("unknown API \"{name}\"")));
        }
        action.params = match to_json(&params)? {
            Value::Null => serde_json::Map::new(),
            Value::Object(map) => map,
            _ => return Err(self.err(format!("params for {name} must be a mapping"))),
        };
        action.api = name;
        Ok(action)
    }

    fn string_list(&self, what: &str, value: Yaml) -> Result<Vec<String>> {
        match value {
            Yaml::Null => Ok(Vec::new()),
            Yaml::Sequence(items) => items
                .iter()
                .map(|i| scalar_string(i).ok_or_else(|| self.err(format!("{what} must contain scalars"))))
                .collect(),
            other => scalar_string(&other)
                .map(|s| vec![s])
                .ok_or_else(|| self.err(format!("{what} must be a scalar or a list"))),
        }
    }
}

fn scalar_string(value: &Yaml) -> Option<String> {
    match value {
        Yaml::String(s) => Some(s.clone()),
        Yaml::Number(n) => Some(n.to_string()),
        Yaml::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn to_json(value: &Yaml) -> Result<Value> {
    Ok(serde_json::to_value(value)?)
}
