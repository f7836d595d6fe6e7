/// # Retention block
///
/// Host-facing entry point. A host builds one `RetentionBlock` per page,
/// asks it for content, and places the rows it gets back.
///
/// ```rust,no_run
/// use retention_block::block::{RenderContext, RetentionBlock};
/// use retention_block::config::RetentionConfig;
///
/// let config = RetentionConfig::from_env()?;
/// let block = RetentionBlock::new(&config, |_: &RenderContext| true)?;
/// let content = block.content(&RenderContext::new("jdoe", 42));
/// for row in &content.rows {
///     println!("{}", row.label);
/// }
/// # Ok::<(), retention_block::errors::RetentionError>(())
/// ```
use std::borrow::Cow;
use std::cell::OnceCell;

use crate::config::RetentionConfig;
use crate::errors::RetentionError;
use crate::fetcher::{AlertFetcher, ReqwestTransport, Transport};
use crate::presenter;
use crate::types::{DisplayModel, Widget};

pub const BLOCK_TITLE: &str = "Retention Alerts";

/// Who is looking at which course page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderContext {
    pub user_name: String,
    pub course_id: u64,
}

impl RenderContext {
    pub fn new(user_name: &str, course_id: u64) -> Self {
        Self {
            user_name: user_name.to_string(),
            course_id,
        }
    }
}

/// Host authorization deciding whether the block shows anything
pub trait CapabilityCheck {
    /// Whether the viewer may update the course in `ctx`
    fn can_update_course(&self, ctx: &RenderContext) -> bool;
}

impl<F> CapabilityCheck for F
where
    F: Fn(&RenderContext) -> bool,
{
    fn can_update_course(&self, ctx: &RenderContext) -> bool {
        self(ctx)
    }
}

pub struct RetentionBlock<C: CapabilityCheck, T: Transport = ReqwestTransport> {
    fetcher: AlertFetcher<T>,
    capability: C,
    home_url: String,
    content: OnceCell<(RenderContext, DisplayModel)>,
}

impl<C: CapabilityCheck> RetentionBlock<C, ReqwestTransport> {
    pub fn new(config: &RetentionConfig, capability: C) -> Result<Self, RetentionError> {
        let fetcher = AlertFetcher::new(config)?;
        Ok(Self::from_parts(fetcher, capability, &config.site.home_url))
    }
}

impl<C: CapabilityCheck, T: Transport> RetentionBlock<C, T> {
    pub fn from_parts(fetcher: AlertFetcher<T>, capability: C, home_url: &str) -> Self {
        Self {
            fetcher,
            capability,
            home_url: home_url.to_string(),
            content: OnceCell::new(),
        }
    }

    /// Content for this block instance. Rendered on first call; later calls
    /// with the same context return the same rows without contacting the
    /// retention system again. A different context is rendered fresh and not
    /// kept.
    pub fn content(&self, ctx: &RenderContext) -> Cow<'_, DisplayModel> {
        let (kept_ctx, model) = self
            .content
            .get_or_init(|| (ctx.clone(), self.render(ctx)));

        if kept_ctx == ctx {
            Cow::Borrowed(model)
        } else {
            log::debug!(
                "Block content was rendered for '{}'; rendering again for '{}'",
                kept_ctx.user_name,
                ctx.user_name
            );
            Cow::Owned(self.render(ctx))
        }
    }
}

impl<C: CapabilityCheck, T: Transport> Widget for RetentionBlock<C, T> {
    fn title(&self) -> &str {
        BLOCK_TITLE
    }

    fn render(&self, ctx: &RenderContext) -> DisplayModel {
        if !self.capability.can_update_course(ctx) {
            log::debug!(
                "'{}' may not update course {}; rendering nothing",
                ctx.user_name,
                ctx.course_id
            );
            return DisplayModel::empty();
        }

        let result = self.fetcher.fetch(&ctx.user_name);
        presenter::present(&result, &ctx.user_name, &self.home_url)
    }
}
