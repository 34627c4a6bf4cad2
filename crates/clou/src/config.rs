//! the authored configuration file
//!
//! ```yaml
//! version: "1"
//! name: my-app
//! vars:
//!   env: npr
//! default: web
//! deployments:
//!   web:
//!     provider: aws
//!     using: web-template
//!     regions: us-east-1
//!     parameters:
//!       Name: '{{ ref vars.env }}-web'
//!   shared:
//!     provider: aws
//!     regions: [ us-east-1, eu-west-1 ]
//!     specs:
//!       a: { using: queue, parameters: { Name: first } }
//!       b: { using: queue, parameters: { Name: second } }
//! ```
//!
//! A deployment uses either one template (`using`) or composes several `specs`.
use crate::error::{Error, Result};
use crate::value::{Mapping, Value};
use indexmap::IndexMap;

#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        match self {
            OneOrMany::One(one) => std::slice::from_ref(one).iter(),
            OneOrMany::Many(many) => many.iter(),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, OneOrMany::Many(many) if many.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
pub struct Config {
    pub version: String,
    pub name: String,
    #[serde(default)]
    pub vars: Mapping,
    #[serde(default)]
    pub default: Option<OneOrMany<String>>,
    pub deployments: IndexMap<String, OneOrMany<Deployment>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Aws,
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deployment {
    pub provider: Provider,
    #[serde(default)]
    pub using: Option<String>,
    #[serde(default)]
    pub specs: IndexMap<String, Spec>,
    pub regions: OneOrMany<String>,
    #[serde(default)]
    pub pre_build: Option<String>,
    #[serde(default)]
    pub disable_rollback: bool,
    #[serde(default)]
    pub parameters: Mapping,
}

/// One named instantiation of a template inside a composed deployment
#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
pub struct Spec {
    pub using: String,
    #[serde(default)]
    pub parameters: Mapping,
}

impl Spec {
    /// The document `{{ ref ... }}` placeholders of this spec's template are resolved against
    pub fn to_value(&self) -> Value {
        Value::Object(Mapping::from([
            ("using".to_string(), Value::from(self.using.as_str())),
            ("parameters".to_string(), Value::Object(self.parameters.clone())),
        ]))
    }
}

impl Config {
    /// Read and validate a (substituted) configuration document
    pub fn from_value(value: &Value) -> Result<Self> {
        let json = serde_json::to_value(value)?;
        let config: Config =
            serde_json::from_value(json).map_err(|error| Error::Config(error.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        for (name, deployments) in &self.deployments {
            if deployments.is_empty() {
                return Err(Error::Config(format!("deployment '{name}' is an empty list")));
            }

            for deployment in deployments.iter() {
                match (&deployment.using, deployment.specs.is_empty()) {
                    (Some(_), false) => {
                        return Err(Error::Config(format!(
                            "deployment '{name}' has both 'using' and 'specs'"
                        )))
                    }
                    (None, true) => {
                        return Err(Error::Config(format!(
                            "deployment '{name}' needs either 'using' or 'specs'"
                        )))
                    }
                    _ => {}
                }

                if deployment.regions.is_empty() {
                    return Err(Error::Config(format!("deployment '{name}' has no regions")));
                }
            }
        }

        Ok(())
    }

    /// Names of the deployments to render
    ///
    /// Requested names win, `default` is used when nothing was requested.
    pub fn select<'a>(&'a self, requested: &'a [String]) -> Result<Vec<&'a str>> {
        let selected: Vec<&str> = if requested.is_empty() {
            self.default
                .iter()
                .flat_map(OneOrMany::iter)
                .map(String::as_str)
                .collect()
        } else {
            requested.iter().map(String::as_str).collect()
        };

        if selected.is_empty() {
            return Err(Error::Config("no deployments specified".to_string()));
        }

        if let Some(missing) = selected
            .iter()
            .find(|name| !self.deployments.contains_key(**name))
        {
            return Err(Error::Config(format!(
                "no deployment named '{missing}' in config"
            )));
        }

        Ok(selected)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::doc;
    use pretty_assertions::assert_eq;

    fn config(default: &str) -> Config {
        let text = format!(
            r#"
version: "1"
name: app
{default}
deployments:
  web: {{ provider: aws, using: web, regions: us-east-1 }}
  db:
    - {{ provider: aws, using: db, regions: [ us-east-1, eu-west-1 ], disableRollback: true }}
    - {{ provider: aws, using: db, regions: eu-central-1, preBuild: make }}
"#
        );
        Config::from_value(&doc!(&text)).unwrap()
    }

    fn strings(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    #[test]
    fn parse_deployments() {
        let config = config("");
        assert_eq!(config.name, "app");
        assert_eq!(config.deployments.len(), 2);

        let db: Vec<&Deployment> = config.deployments["db"].iter().collect();
        assert_eq!(db.len(), 2);
        assert!(db[0].disable_rollback);
        assert_eq!(
            db[0].regions.iter().collect::<Vec<_>>(),
            vec!["us-east-1", "eu-west-1"]
        );
        assert_eq!(db[1].pre_build.as_deref(), Some("make"));
        assert_eq!(db[1].provider, Provider::Aws);
    }

    #[test]
    fn select_default_string() {
        assert_eq!(config("default: web").select(&[]).unwrap(), vec!["web"]);
    }

    #[test]
    fn select_default_list() {
        assert_eq!(
            config("default: [ db, web ]").select(&[]).unwrap(),
            vec!["db", "web"]
        );
    }

    #[test]
    fn select_requested_over_default() {
        let requested = strings(&["db"]);
        assert_eq!(
            config("default: web").select(&requested).unwrap(),
            vec!["db"]
        );
    }

    #[test]
    fn select_nothing() {
        let error = config("").select(&[]).unwrap_err();
        assert_eq!(error.to_string(), "invalid config: no deployments specified");
    }

    #[test]
    fn select_missing() {
        let requested = strings(&["web", "cache"]);
        let error = config("").select(&requested).unwrap_err();
        assert_eq!(
            error.to_string(),
            "invalid config: no deployment named 'cache' in config"
        );
    }

    #[test]
    fn invalid_deployments() {
        let cases = [
            "{ provider: gcp, using: a, regions: x }",
            "{ provider: aws, regions: x }",
            "{ provider: aws, using: a, specs: { s: { using: b } }, regions: x }",
            "{ provider: aws, using: a, regions: [] }",
            "[]",
        ];
        for case in cases {
            let text = format!("version: '1'\nname: app\ndeployments:\n  web: {case}\n");
            let error = Config::from_value(&doc!(&text)).unwrap_err();
            assert!(matches!(error, Error::Config(_)), "{case}: {error}");
        }
    }

    #[test]
    fn spec_as_context() {
        let spec: Spec =
            serde_json::from_value(serde_json::json!({ "using": "tpl", "parameters": { "A": 1 } }))
                .unwrap();
        assert_eq!(spec.to_value(), doc!("{ using: tpl, parameters: { A: 1 } }"));
    }
}
