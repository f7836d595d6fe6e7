use serde::Serialize;
use tera::{Context, Tera};

use crate::assets::TemplateAssets;
use crate::errors::RenderError;
use crate::types::{DisplayModel, DisplayRow};

pub const BLOCK_TEMPLATE: &str = "block_list.html";

/// Turns a `DisplayModel` into the HTML fragment placed inside the block
pub struct HtmlRenderer {
    tera: Tera,
    pix_url: String,
}

#[derive(Serialize)]
struct RowView<'a> {
    label: &'a str,
    is_link: bool,
    href: &'a str,
    new_window: bool,
    icon_src: String,
}

impl HtmlRenderer {
    /// Load the embedded templates. `pix_url` is the base icon identifiers
    /// are appended to.
    pub fn new(pix_url: &str) -> Result<Self, RenderError> {
        let mut tera = Tera::default();
        for name in TemplateAssets::iter() {
            let file = TemplateAssets::get(&name)
                .ok_or_else(|| RenderError::TemplateNotFound(name.to_string()))?;
            let source = std::str::from_utf8(&file.data)?;
            tera.add_raw_template(&name, source)?;
        }

        if !tera.get_template_names().any(|n| n == BLOCK_TEMPLATE) {
            return Err(RenderError::TemplateNotFound(BLOCK_TEMPLATE.to_string()));
        }

        Ok(Self {
            tera,
            pix_url: pix_url.to_string(),
        })
    }

    pub fn icon_src(&self, row: &DisplayRow) -> String {
        format!("{}{}", self.pix_url, row.icon.pix())
    }

    /// Render the block body. The empty model renders to an empty string.
    pub fn render(&self, model: &DisplayModel) -> Result<String, RenderError> {
        if model.is_empty() {
            return Ok(String::new());
        }

        let rows: Vec<RowView> = model
            .rows
            .iter()
            .map(|row| RowView {
                label: &row.label,
                is_link: row.href.is_some(),
                href: row.href.as_deref().unwrap_or_default(),
                new_window: row.new_window,
                icon_src: self.icon_src(row),
            })
            .collect();

        let mut context = Context::new();
        context.insert("rows", &rows);
        context.insert("footer", &model.footer);
        context.insert("has_footer", &!model.footer.is_empty());

        Ok(self.tera.render(BLOCK_TEMPLATE, &context)?)
    }
}
