//! Template resources: the downstream form of a package.

mod builder;
pub mod naming;
mod types;

pub use builder::build_template;
pub use naming::{is_upgradeable, parse_version, template_name, template_version_name};
pub use types::{TemplateOwner, TemplateResource, TemplateSpec, TemplateVersionSpec};
