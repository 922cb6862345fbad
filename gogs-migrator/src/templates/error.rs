//! Attribution note rendering errors.

/// Failure to compile or render one of the attribution templates.
#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    /// The content did not fit the template.
    #[error("Failed to render attribution note: {0}")]
    RenderError(#[from] handlebars::RenderError),

    /// A built-in template failed to compile.
    #[error("Failed to compile attribution template: {0}")]
    RegistrationError(#[from] handlebars::TemplateError),
}
