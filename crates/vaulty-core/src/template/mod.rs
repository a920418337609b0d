//! Template drift engine
//!
//! A template `<name><extension>` renders to `<name>` next to it. Every
//! inspection derives the state of the pair from disk:
//!
//! * the template must exist and the output must be writeable (fatal);
//! * a missing or older output is a warning with a render fix;
//! * an output inside a git work tree must be ignored (fatal, no fix).

pub mod data;
pub mod discovery;
pub mod engine;
pub mod filters;

pub use data::{SECRETS_CACHE_FILE, TemplateData, read_secrets_cache};
pub use engine::build_engine;

use std::path::PathBuf;
use std::time::SystemTime;

use serde::Serialize;
use vaulty_fs::{NormalizedPath, io, is_path_writeable};

use crate::context::Context;
use crate::fix::FixKind;
use crate::issue::{CollectExt, IssueInput, IssuesCollector, Scope};
use crate::Result;

/// A template and its rendered output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    /// Path relative to the project root, `/` separated.
    pub template: String,
    pub template_path: PathBuf,
    pub last_update: SystemTime,
    /// Output path relative to the project root.
    pub output: String,
    pub output_path: PathBuf,
    /// `None` when the output does not exist.
    pub last_output: Option<SystemTime>,
}

impl Template {
    /// The output exists and is at least as recent as the template.
    pub fn is_fresh(&self) -> bool {
        self.last_output
            .is_some_and(|last_output| last_output >= self.last_update)
    }
}

impl Context {
    fn template_issues(&self, template: &str) -> IssuesCollector {
        self.issues().scoped(Scope::Template, Some(template))
    }

    /// Output name of `template`, failing when it lacks the extension.
    fn output_name(&self, template: &NormalizedPath, extension: &str) -> Result<NormalizedPath> {
        template.strip_suffix(extension).ok_or_else(|| {
            self.template_issues(template.as_str())
                .fail(IssueInput::error(format!(
                    "Template name must end with {extension}"
                )))
        })
    }

    /// Inspect one template, recording drift issues.
    pub fn get_template(&self, name: &str) -> Result<Template> {
        let config = self.config()?;
        let relative = NormalizedPath::new(name);
        let output = self.output_name(&relative, &config.extension)?;
        let issues = self.template_issues(relative.as_str());

        let template_path = config.project.join(relative.as_str());
        let output_path = config.project.join(output.as_str());
        let last_update = io::modified(&NormalizedPath::new(&template_path)).unwrap_or_else(SystemTime::now);
        let last_output = io::modified(&NormalizedPath::new(&output_path));

        if !template_path.is_file() {
            return Err(issues.fail(IssueInput::error("Template does not exist")));
        }

        if !is_path_writeable(&output_path) {
            return Err(issues.fail(IssueInput::error("Output is not writeable")));
        }

        let render_fix = FixKind::RenderTemplate {
            template: relative.as_str().to_string(),
        };
        match last_output {
            None => {
                issues.add(IssueInput::warn("Output does not exist").with_fix(render_fix));
            }
            Some(last_output) if last_output < last_update => {
                issues.add(IssueInput::warn("Output is out of date").with_fix(render_fix));
            }
            Some(_) => {}
        }

        let status = vaulty_git::ignore_status(&output_path).collect_into(&issues)?;
        if status.is_exposed() {
            return Err(issues.fail(IssueInput::error("Output is not ignored by Git")));
        }

        Ok(Template {
            template: relative.as_str().to_string(),
            template_path,
            last_update,
            output: output.as_str().to_string(),
            output_path,
            last_output,
        })
    }

    /// Names of the discovered templates selected by `patterns`, relative to
    /// the project root.
    pub fn find_templates(&self, patterns: &[String]) -> Result<Vec<String>> {
        let config = self.config()?;
        let found = discovery::discover(&config);
        discovery::select(&found, patterns)
            .collect_into(&self.issues().scoped(Scope::Template, None::<String>))
    }

    /// Discover templates and inspect those selected by `patterns`.
    ///
    /// Every selected template is inspected even when one fails; the first
    /// failure is returned.
    pub fn get_templates(&self, patterns: &[String]) -> Result<Vec<Template>> {
        let inspected: Vec<Result<Template>> = self
            .find_templates(patterns)?
            .iter()
            .map(|name| self.get_template(name))
            .collect();
        inspected.into_iter().collect()
    }

    /// The template engine, built once per context.
    pub fn template_engine(&self) -> Result<&minijinja::Environment<'static>> {
        let config = self.config()?;
        Ok(self
            .engine
            .get_or_init(|| engine::build_engine(&config.project)))
    }

    async fn render(&self, template: &Template) -> Result<String> {
        let issues = self.template_issues(&template.template);
        let engine = self.template_engine()?;
        let data = self.template_data().await?;
        engine
            .get_template(&template.template)
            .and_then(|compiled| compiled.render(&data))
            .collect_into(&issues)
    }

    /// Render a template without writing its output.
    pub async fn render_template(&self, name: &str) -> Result<String> {
        let template = self.get_template(name)?;
        self.render(&template).await
    }

    /// Render a template and replace its output.
    pub async fn write_template_output(&self, name: &str) -> Result<Template> {
        let template = self.get_template(name)?;
        let rendered = self.render(&template).await?;

        io::write_text(&NormalizedPath::new(&template.output_path), &rendered)
            .collect_into(&self.template_issues(&template.template))?;
        tracing::info!(template = %template.template, output = %template.output, "wrote template output");

        Ok(Template {
            last_output: io::modified(&NormalizedPath::new(&template.output_path)),
            ..template
        })
    }

    /// Absolute path of the output of a template, whether or not it exists.
    pub fn template_output_path(&self, name: &str) -> Result<PathBuf> {
        let config = self.config()?;
        let output = self.output_name(&NormalizedPath::new(name), &config.extension)?;
        Ok(config.project.join(output.as_str()))
    }

    /// Delete the output of a template. The template itself is kept.
    ///
    /// Returns `false` when there was no output.
    pub fn delete_template_output(&self, name: &str) -> Result<bool> {
        let output_path = self.template_output_path(name)?;
        let removed = io::remove_file(&NormalizedPath::new(&output_path))
            .collect_into(&self.template_issues(name))?;
        if removed {
            tracing::info!(template = name, output = %output_path.display(), "deleted template output");
        }
        Ok(removed)
    }
}
