//! configuration in, one ready-to-deploy template per deployment out
use crate::compose::Composer;
use crate::config::{Config, Deployment, OneOrMany};
use crate::error::Result;
use crate::expression::{ContentProvider, Evaluator};
use crate::interpolate::interpolate;
use crate::options::Options;
use crate::path::Segment;
use crate::substitute::Substitutor;
use crate::template::{apply_substitution_map, strip_substitution, TemplateLoader, PARAMETERS};
use crate::value::{Mapping, Value};

#[derive(derive_new::new)]
pub struct Renderer<'a> {
    content: &'a dyn ContentProvider,
    templates: &'a dyn TemplateLoader,
    options: &'a Options,
}

/// Everything the deploy step needs for one deployment
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedDeployment {
    pub name: String,
    /// Position when the deployment is one of a list
    pub index: Option<usize>,
    pub stack_name: String,
    pub regions: Vec<String>,
    pub pre_build: Option<String>,
    pub disable_rollback: bool,
    /// Deployment parameters declared in the template's `Parameters`
    pub parameter_overrides: Mapping,
    pub template: Value,
}

impl RenderedDeployment {
    /// File name (without extension) the template is written to
    pub fn file_stem(&self) -> String {
        match self.index {
            Some(index) => format!("{}-{index}", self.stack_name),
            None => self.stack_name.clone(),
        }
    }
}

impl<'a> Renderer<'a> {
    fn substitutor(&self) -> Substitutor<'a> {
        Substitutor::new(Evaluator::new(self.content), self.options.max_depth)
    }

    /// The configuration with every placeholder resolved against itself
    pub fn resolve(&self, config: &Value) -> Result<Value> {
        self.substitutor().substitute_all(config)
    }

    /// Interpolate `input` against the resolved configuration
    pub fn evaluate(&self, config: &Value, input: &str) -> Result<Value> {
        let resolved = self.resolve(config)?;
        interpolate(self.substitutor().evaluator(), &resolved, input)
    }

    /// Render the `requested` deployments, or the configured default ones
    #[tracing::instrument(level = "debug", skip(self, config))]
    pub fn render(&self, config: &Value, requested: &[String]) -> Result<Vec<RenderedDeployment>> {
        let resolved = self.resolve(config)?;
        let config = Config::from_value(&resolved)?;

        let mut rendered = Vec::new();
        for name in config.select(requested)? {
            let deployments = &config.deployments[name];
            let listed = matches!(deployments, OneOrMany::Many(_));

            for (index, deployment) in deployments.iter().enumerate() {
                let index = listed.then_some(index);
                let deployment = self
                    .render_deployment(&config, name, index, deployment)
                    .map_err(|error| {
                        let mut location = vec![Segment::key("deployments"), Segment::key(name)];
                        location.extend(index.map(|index| Segment::Index(index as i64)));
                        error.at(&location)
                    })?;

                tracing::info!(
                    deployment = %name,
                    stack = %deployment.stack_name,
                    regions = ?deployment.regions,
                    "rendered deployment"
                );
                rendered.push(deployment);
            }
        }

        Ok(rendered)
    }

    fn render_deployment(
        &self,
        config: &Config,
        name: &str,
        index: Option<usize>,
        deployment: &Deployment,
    ) -> Result<RenderedDeployment> {
        let template = match &deployment.using {
            Some(using) => {
                let template = self.templates.load(using)?;
                let mut template = apply_substitution_map(&template, &deployment.parameters)?;
                strip_substitution(&mut template);
                template
            }
            None => Composer::new(self.substitutor(), self.templates, &self.options.prefix_suffix)
                .compose(&deployment.specs)?,
        };

        let declared = template.get(PARAMETERS).and_then(Value::as_object);
        let parameter_overrides = deployment
            .parameters
            .iter()
            .filter(|(key, _)| declared.is_some_and(|declared| declared.contains_key(*key)))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        Ok(RenderedDeployment {
            name: name.to_string(),
            index,
            stack_name: format!("{}-{name}", config.name),
            regions: deployment.regions.iter().cloned().collect(),
            pre_build: deployment.pre_build.clone(),
            disable_rollback: deployment.disable_rollback,
            parameter_overrides,
            template,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::doc;
    use crate::error::Error;
    use crate::expression::StaticContent;
    use indexmap::IndexMap;
    use pretty_assertions::assert_eq;

    fn templates() -> IndexMap<String, Value> {
        IndexMap::from([(
            "bucket".to_string(),
            doc!(
                r#"
                Metadata:
                  Substitution:
                    Name: { Path: Resources.Bucket.Properties, At: BucketName }
                Parameters:
                  Env: { Type: String }
                Resources:
                  Bucket:
                    Type: AWS::S3::Bucket
                    Properties:
                      BucketName: placeholder
                "#
            ),
        )])
    }

    fn config() -> Value {
        doc!(
            r#"
            version: "1"
            name: shop
            vars: { env: npr, motd: '{{ file motd.txt }}' }
            default: web
            deployments:
              web:
                provider: aws
                using: bucket
                regions: us-east-1
                parameters:
                  Name: '{{ ref vars.env }}-assets'
                  Env: '{{ ref vars.env }}'
                  Unused: 1
              both:
                - { provider: aws, using: bucket, regions: us-east-1 }
                - { provider: aws, using: missing, regions: eu-west-1 }
            "#
        )
    }

    fn render(requested: &[&str]) -> Result<Vec<RenderedDeployment>> {
        let content = StaticContent::default().with("motd.txt", "hello");
        let templates = templates();
        let options = Options::default();
        let requested: Vec<String> = requested.iter().map(|name| name.to_string()).collect();
        Renderer::new(&content, &templates, &options).render(&config(), &requested)
    }

    #[test]
    fn render_default_deployment() {
        let rendered = render(&[]).unwrap();
        assert_eq!(rendered.len(), 1);

        let web = &rendered[0];
        assert_eq!(web.name, "web");
        assert_eq!(web.stack_name, "shop-web");
        assert_eq!(web.file_stem(), "shop-web");
        assert_eq!(web.regions, vec!["us-east-1".to_string()]);
        assert_eq!(
            Value::Object(web.parameter_overrides.clone()),
            doc!("{ Env: npr }")
        );
        assert_eq!(
            web.template,
            doc!(
                r#"
                Parameters:
                  Env: { Type: String }
                Resources:
                  Bucket:
                    Type: AWS::S3::Bucket
                    Properties:
                      BucketName: npr-assets
                "#
            )
        );
    }

    #[test]
    fn failing_list_entry_names_its_position() {
        let error = render(&["both"]).unwrap_err();
        assert_eq!(error.to_string(), "at 'deployments.both[1]'");
        assert!(matches!(error.root_cause(), Error::TemplateNotFound { name } if name == "missing"));
    }

    #[test]
    fn evaluate_against_resolved_config() {
        let content = StaticContent::default().with("motd.txt", "hello");
        let templates = templates();
        let options = Options::default();
        let renderer = Renderer::new(&content, &templates, &options);

        assert_eq!(
            renderer
                .evaluate(&config(), "{{ ref vars.motd }} from {{ ref name }}")
                .unwrap(),
            Value::from("hello from shop")
        );
        assert_eq!(
            renderer
                .evaluate(&config(), "{{ ref deployments.web.parameters.Name }}")
                .unwrap(),
            Value::from("npr-assets")
        );
    }
}
