//! Call configuration shared by every batch entry point.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use ansiflow_core::{
    ControlCategories, CsiRecovery, CursorConfig, Diagnostics, Error, Limits, Result, TermCaps,
    WarnPolicy,
};

/// Elements processed between cancellation checks.
pub const CANCEL_CHECK_INTERVAL: usize = 1000;

/// Cooperative cancellation flag.
///
/// Clones share the flag. The host sets it from any thread; batch calls check
/// it every [`CANCEL_CHECK_INTERVAL`] elements and stop with
/// [`Error::Cancelled`].
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    inner: Arc<AtomicBool>,
}

impl CancelToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.inner.store(true, Ordering::Relaxed);
    }

    /// Check if cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.inner.load(Ordering::Relaxed)
    }
}

/// How text is interpreted, and the resource limits of a call.
#[derive(Debug, Clone)]
pub struct TextOptions {
    /// Control categories recognized as zero-width sequences.
    pub categories: ControlCategories,
    /// Colour capabilities of the target terminal.
    pub caps: TermCaps,
    pub warn: WarnPolicy,
    pub recovery: CsiRecovery,
    pub limits: Limits,
    pub cancel: Option<CancelToken>,
}

impl Default for TextOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl TextOptions {
    /// Every category enabled, default capabilities, warn once.
    #[must_use]
    pub fn new() -> Self {
        Self {
            categories: ControlCategories::all(),
            caps: TermCaps::default(),
            warn: WarnPolicy::default(),
            recovery: CsiRecovery::default(),
            limits: Limits::default(),
            cancel: None,
        }
    }

    #[must_use]
    pub fn categories(mut self, categories: ControlCategories) -> Self {
        self.categories = categories;
        self
    }

    #[must_use]
    pub fn caps(mut self, caps: TermCaps) -> Self {
        self.caps = caps;
        self
    }

    #[must_use]
    pub fn warn(mut self, warn: WarnPolicy) -> Self {
        self.warn = warn;
        self
    }

    #[must_use]
    pub fn recovery(mut self, recovery: CsiRecovery) -> Self {
        self.recovery = recovery;
        self
    }

    #[must_use]
    pub fn limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    /// Attach a cancellation token.
    #[must_use]
    pub fn cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Cursor configuration for one walk.
    ///
    /// Flags are only raised while `diag` would still record them.
    #[must_use]
    pub(crate) fn cursor(&self, diag: &Diagnostics) -> CursorConfig {
        CursorConfig {
            categories: self.categories,
            caps: self.caps,
            warn: diag.enabled(),
            recovery: self.recovery,
        }
    }

    /// Cancellation checkpoint for the element at `index`.
    pub(crate) fn checkpoint(&self, index: usize) -> Result<()> {
        if index % CANCEL_CHECK_INTERVAL == 0
            && let Some(token) = &self.cancel
            && token.is_cancelled()
        {
            tracing::debug!(processed = index, "batch cancelled");
            return Err(Error::Cancelled { processed: index });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    #[test]
    fn defaults() {
        let opts = TextOptions::default();
        assert_eq!(opts.categories, ControlCategories::all());
        assert_eq!(opts.warn, WarnPolicy::Once);
        assert!(opts.cancel.is_none());
    }

    #[test]
    fn builder_chain() {
        let opts = TextOptions::new()
            .categories(ControlCategories::SGR)
            .caps(TermCaps::all())
            .warn(WarnPolicy::Every)
            .recovery(CsiRecovery::Strict);
        assert_eq!(opts.categories, ControlCategories::SGR);
        assert_eq!(opts.caps, TermCaps::all());
        assert_eq!(opts.recovery, CsiRecovery::Strict);
    }

    #[test]
    fn cursor_config_follows_diagnostics() {
        let opts = TextOptions::new();
        assert!(opts.cursor(&Diagnostics::new(WarnPolicy::Every)).warn);
        assert!(!opts.cursor(&Diagnostics::new(WarnPolicy::Silent)).warn);
    }

    #[test]
    fn token_clones_share_state() {
        let token = CancelToken::new();
        let other = token.clone();
        assert!(!other.is_cancelled());
        token.cancel();
        assert!(other.is_cancelled());
    }

    #[test]
    fn checkpoint_only_on_interval() {
        let token = CancelToken::new();
        token.cancel();
        let opts = TextOptions::new().cancel(token);
        assert!(opts.checkpoint(1).is_ok());
        assert!(opts.checkpoint(999).is_ok());
        assert_eq!(
            opts.checkpoint(1000),
            Err(Error::Cancelled { processed: 1000 })
        );
        assert!(opts.checkpoint(0).is_err());
    }

    #[test]
    #[traced_test]
    fn cancellation_is_logged() {
        let token = CancelToken::new();
        token.cancel();
        assert!(TextOptions::new().cancel(token).checkpoint(0).is_err());
        assert!(logs_contain("batch cancelled"));
    }

    #[test]
    fn checkpoint_without_token() {
        assert!(TextOptions::new().checkpoint(0).is_ok());
    }
}
