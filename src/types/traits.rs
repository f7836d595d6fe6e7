use crate::block::RenderContext;
use crate::types::DisplayModel;

/// Narrow interface a host page uses to place a widget
pub trait Widget {
    /// Title shown in the block header
    fn title(&self) -> &str;

    /// Produce the content for one page render
    fn render(&self, ctx: &RenderContext) -> DisplayModel;

    fn allows_multiple_instances(&self) -> bool {
        false
    }

    fn has_config(&self) -> bool {
        false
    }
}
