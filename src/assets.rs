use rust_embed::RustEmbed;

/// Tera templates compiled into the binary
#[derive(RustEmbed)]
#[folder = "src/assets/templates/"]
pub struct TemplateAssets;
