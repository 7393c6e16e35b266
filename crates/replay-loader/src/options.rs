//! Loader configuration.

use replay_types::env_var_or;

/// Error events requested per page.
pub const DEFAULT_ERRORS_PER_PAGE: usize = 50;
/// Recording segments requested per page.
pub const DEFAULT_SEGMENTS_PER_PAGE: usize = 100;

/// What to load and how to page through it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderOptions {
    /// Organization slug.
    pub org_slug: String,
    /// `{replayId}` or the legacy `{projectSlug}:{replayId}`.
    pub replay_slug: String,
    pub errors_per_page: usize,
    pub segments_per_page: usize,
}

impl LoaderOptions {
    pub fn new(org_slug: impl Into<String>, replay_slug: impl Into<String>) -> Self {
        Self {
            org_slug: org_slug.into(),
            replay_slug: replay_slug.into(),
            errors_per_page: DEFAULT_ERRORS_PER_PAGE,
            segments_per_page: DEFAULT_SEGMENTS_PER_PAGE,
        }
    }

    /// Like [`new`](Self::new), with page sizes read from
    /// `REPLAY_ERRORS_PER_PAGE` / `REPLAY_SEGMENTS_PER_PAGE` when set.
    pub fn from_env(org_slug: impl Into<String>, replay_slug: impl Into<String>) -> Self {
        Self::new(org_slug, replay_slug)
            .errors_per_page(env_var_or("REPLAY_ERRORS_PER_PAGE", DEFAULT_ERRORS_PER_PAGE))
            .segments_per_page(env_var_or("REPLAY_SEGMENTS_PER_PAGE", DEFAULT_SEGMENTS_PER_PAGE))
    }

    /// Page sizes below one are clamped to one.
    pub fn errors_per_page(mut self, per_page: usize) -> Self {
        self.errors_per_page = per_page.max(1);
        self
    }

    pub fn segments_per_page(mut self, per_page: usize) -> Self {
        self.segments_per_page = per_page.max(1);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_and_overrides() {
        let options = LoaderOptions::new("acme", "abc");
        assert_eq!(options.errors_per_page, 50);
        assert_eq!(options.segments_per_page, 100);

        let options = options.errors_per_page(5).segments_per_page(0);
        assert_eq!(options.errors_per_page, 5);
        assert_eq!(options.segments_per_page, 1);
    }

    #[test]
    fn test_from_env() {
        std::env::set_var("REPLAY_SEGMENTS_PER_PAGE", "25");
        let options = LoaderOptions::from_env("acme", "abc");
        assert_eq!(options.segments_per_page, 25);
        assert_eq!(options.errors_per_page, DEFAULT_ERRORS_PER_PAGE);
        std::env::remove_var("REPLAY_SEGMENTS_PER_PAGE");
    }
}
