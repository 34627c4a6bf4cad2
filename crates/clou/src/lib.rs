//! # clou - cloud deployment templating
//!
//! ## Introduction for developers
//!
//! Read this to understand how `clou` works internally.
//!
//! ### Documents
//!
//! Everything `clou` touches (the configuration, templates, parameter values) is a [value::Value]: null, booleans,
//! integers, decimals, strings, lists and objects. YAML and JSON are parsed into it by [source], which also expands
//! CloudFormation short-form tags (`!Ref x`, `!GetAtt a.b`, `!Sub ...`) into their long form so later stages only
//! ever see plain objects.
//!
//! ### Placeholders
//!
//! Any string may contain `{{ expression }}` placeholders:
//!
//! ```yaml
//! vars:
//!   env: npr
//!   nprBucket: assets-npr
//! deployments:
//!   web:
//!     parameters:
//!       Bucket: '{{ ref vars.{{ ref vars.env }}Bucket }}'   # assets-npr
//!       Policy: '{{ file policies/web.json }}'              # file contents
//! ```
//!
//! - [expression] parses and evaluates a single expression (`ref <path>`, `file <path>`)
//! - [path] is the small query language behind `ref` (`a.b[0]."quoted key"`)
//! - [interpolate] finds the (possibly nested) placeholders of one string and replaces them
//! - [substitute] applies [interpolate] to every string of a whole document
//!
//! A string that is exactly one placeholder keeps the type of what it evaluates to, so `'{{ ref vars.count }}'` can be
//! a number.
//!
//! ### Templates
//!
//! A template is a CloudFormation document that declares where parameters go in `Metadata.Substitution`, see
//! [template]. A deployment either uses one template, or composes several named specs into a single template
//! ([compose]). Composition prefixes resources, conditions and outputs per spec and rewrites the references to them.
//!
//! ### Rendering
//!
//! [render::Renderer] ties it together:
//!
//! 1. the configuration is substituted against itself
//! 2. it is parsed as a [config::Config] and the deployments to render are selected
//! 3. each deployment's template is loaded, filled in (or composed) and returned as a [render::RenderedDeployment]
//!
//! Deploying the result is out of scope. Errors abort the whole render, see [error::Error].
//!
pub mod compose;
pub mod config;
pub mod error;
pub mod expression;
pub mod interpolate;
pub mod options;
pub mod path;
pub mod render;
mod rewrite;
pub mod source;
pub mod substitute;
pub mod template;
pub mod value;
mod visit;

pub use error::{Error, Result};
pub use value::Value;
