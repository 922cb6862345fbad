//! Template renderer.

use crate::templates::{CommentContent, CommentTemplate, ItemContent, MergeContent, TemplateError};
use handlebars::{no_escape, Context, Handlebars, Helper, HelperResult, Output, RenderContext};
use serde::Serialize;

const ITEM: &str = "item";
const COMMENT: &str = "comment";
const STATE_CHANGE: &str = "state_change";
const COMMIT_REFERENCE: &str = "commit_reference";
const MERGE: &str = "merge";

const ITEM_TEMPLATE: &str = "<sub>\
{{#if branches}}This issue was originally a pull request from branch `{{branches.head}}` to branch `{{branches.base}}`\n{{/if}}\
This {{kind}} was originally created by {{creator}} on _{{created}}_\
{{#if updated}} and later updated on _{{updated}}_{{/if}}\
{{#if assignee}}\nThis {{kind}} was originally assigned to {{assignee}}{{/if}}\
</sub>\n\n{{body}}";

const COMMENT_TEMPLATE: &str = "<sub>\
This comment was originally placed by {{author}} on _{{created}}_\
{{#if updated}} and later updated on _{{updated}}_{{/if}}\
</sub>\n\n{{content}}";

const STATE_CHANGE_TEMPLATE: &str = "<sub>\
This {{kind}} was originally {{#if (eq state \"open\")}}reopened{{else}}closed{{/if}} by {{author}} on _{{created}}_\
</sub>{{#if content}}\n\n{{content}}{{/if}}";

const COMMIT_REFERENCE_TEMPLATE: &str = "<sub>\
{{author}} referenced this {{kind}} from commit {{commit}} on _{{created}}_\
</sub>{{#if content}}\n\n{{content}}{{/if}}";

const MERGE_TEMPLATE: &str = "<sub>\
This pull request for branch `{{head}}` was merged into commit {{merge_base}} of branch `{{base}}` \
in commit {{merged_commit}} by {{author}} on _{{created}}_\
</sub>";

/// Creates a configured Handlebars registry with custom helpers.
///
/// The registry is configured with:
/// - No HTML escaping (for markdown output)
/// - Strict mode (catches missing variables)
/// - `eq` helper for equality comparisons
#[must_use]
pub fn create_handlebars_registry() -> Handlebars<'static> {
    let mut hbs = Handlebars::new();

    // Markdown output
    hbs.register_escape_fn(no_escape);
    hbs.set_strict_mode(true);
    hbs.register_helper("eq", Box::new(eq_helper));

    hbs
}

/// Helper function for equality comparison in templates.
///
/// Usage: `{{#if (eq variable "value")}}...{{/if}}`
fn eq_helper(
    h: &Helper,
    _: &Handlebars,
    _: &Context,
    _: &mut RenderContext,
    out: &mut dyn Output,
) -> HelperResult {
    let param1 = h.param(0).and_then(|v| v.value().as_str());
    let param2 = h.param(1).and_then(|v| v.value().as_str());

    let result = match (param1, param2) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    };

    out.write(if result { "true" } else { "" })?;
    Ok(())
}

/// Renders the attribution headers of migrated items and comments.
pub struct TemplateRenderer {
    handlebars: Handlebars<'static>,
}

impl TemplateRenderer {
    /// Creates a renderer with all templates registered.
    ///
    /// # Errors
    ///
    /// Returns an error if a template fails to compile.
    pub fn new() -> Result<Self, TemplateError> {
        let mut handlebars = create_handlebars_registry();
        for (name, template) in [
            (ITEM, ITEM_TEMPLATE),
            (COMMENT, COMMENT_TEMPLATE),
            (STATE_CHANGE, STATE_CHANGE_TEMPLATE),
            (COMMIT_REFERENCE, COMMIT_REFERENCE_TEMPLATE),
            (MERGE, MERGE_TEMPLATE),
        ] {
            handlebars.register_template_string(name, template)?;
        }
        Ok(Self { handlebars })
    }

    /// Renders an issue or pull request body.
    ///
    /// # Errors
    ///
    /// Returns an error if template rendering fails.
    pub fn render_item(&self, item: &ItemContent) -> Result<String, TemplateError> {
        self.render(ITEM, item)
    }

    /// Renders a comment body.
    ///
    /// # Errors
    ///
    /// Returns an error if template rendering fails.
    pub fn render_comment(
        &self,
        template: CommentTemplate,
        comment: &CommentContent,
    ) -> Result<String, TemplateError> {
        let name = match template {
            CommentTemplate::General => COMMENT,
            CommentTemplate::StateChange => STATE_CHANGE,
            CommentTemplate::CommitReference => COMMIT_REFERENCE,
        };
        self.render(name, comment)
    }

    /// Renders the note added for a merged pull request.
    ///
    /// # Errors
    ///
    /// Returns an error if template rendering fails.
    pub fn render_merge(&self, merge: &MergeContent) -> Result<String, TemplateError> {
        self.render(MERGE, merge)
    }

    fn render<T: Serialize>(&self, name: &str, data: &T) -> Result<String, TemplateError> {
        Ok(self.handlebars.render(name, data)?)
    }
}
