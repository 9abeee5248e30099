use crate::error::ResolveError;
use regex::Regex;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::OnceLock;

/// The parts of a `pyproject.toml` the build cares about
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectMetadata {
    pub name: Option<String>,
    pub requires_python: Option<String>,
    pub dependencies: Vec<String>,
    pub optional_dependencies: BTreeMap<String, Vec<String>>,
}

impl ProjectMetadata {
    pub fn parse(content: &str, path: &Path) -> Result<Self, ResolveError> {
        let parsed: toml::Table = toml::from_str(content).map_err(|source| ResolveError::Malformed {
            path: path.to_path_buf(),
            source,
        })?;

        let project = parsed
            .get("project")
            .and_then(|p| p.as_table())
            .ok_or_else(|| ResolveError::MissingProjectTable(path.to_path_buf()))?;

        let name = optional_string(project, "name")?;
        let requires_python = optional_string(project, "requires-python")?;

        let dependencies = match project.get("dependencies") {
            Some(value) => requirement_list("project.dependencies", value)?,
            None => Vec::new(),
        };

        let mut optional_dependencies = BTreeMap::new();
        if let Some(value) = project.get("optional-dependencies") {
            let groups = value.as_table().ok_or_else(|| ResolveError::InvalidField {
                field: "project.optional-dependencies".to_string(),
                expected: "a table of dependency groups",
            })?;

            for (group, requirements) in groups {
                let field = format!("project.optional-dependencies.{}", group);
                optional_dependencies.insert(group.clone(), requirement_list(&field, requirements)?);
            }
        }

        Ok(Self {
            name,
            requires_python,
            dependencies,
            optional_dependencies,
        })
    }

    /// Minimum `major.minor` Python version from `requires-python`.
    ///
    /// `">=3.11,<4"` and `"~=3.11.2"` both yield `"3.11"`.
    pub fn python_version(&self) -> Option<String> {
        static VERSION_RE: OnceLock<Regex> = OnceLock::new();
        let re = VERSION_RE.get_or_init(|| Regex::new(r"(\d+)\.(\d+)").expect("valid regex"));

        let constraint = self.requires_python.as_deref()?;
        let caps = re.captures(constraint)?;
        Some(format!("{}.{}", &caps[1], &caps[2]))
    }
}

fn optional_string(table: &toml::Table, key: &str) -> Result<Option<String>, ResolveError> {
    match table.get(key) {
        None => Ok(None),
        Some(value) => value
            .as_str()
            .map(|s| Some(s.to_string()))
            .ok_or_else(|| ResolveError::InvalidField {
                field: format!("project.{}", key),
                expected: "a string",
            }),
    }
}

fn requirement_list(field: &str, value: &toml::Value) -> Result<Vec<String>, ResolveError> {
    let items = value.as_array().ok_or_else(|| ResolveError::InvalidField {
        field: field.to_string(),
        expected: "an array of requirement strings",
    })?;

    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            let raw = item.as_str().ok_or_else(|| ResolveError::InvalidField {
                field: format!("{}[{}]", field, index),
                expected: "a requirement string",
            })?;

            let requirement = raw.trim();
            if requirement.is_empty() || requirement.contains('\n') {
                return Err(ResolveError::InvalidRequirement {
                    field: field.to_string(),
                    index,
                    value: raw.to_string(),
                });
            }
            Ok(requirement.to_string())
        })
        .collect()
}
