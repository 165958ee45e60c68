use std::sync::{Mutex, MutexGuard, PoisonError};

/// How a target shows its image.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TargetKind {
    /// The image source itself.
    Source,
    /// A `url(...)` background reference.
    Background,
}

/// Something that displays an image and can be pointed at a cached payload.
///
/// Implementations use interior mutability; the engine only ever holds a
/// shared reference across a fill.
pub trait Target: Send + Sync {
    fn kind(&self) -> TargetKind;

    /// What the target currently shows, unwrapped from any `url(...)`.
    fn current_source(&self) -> Option<String>;

    /// The source recorded before the first payload was applied.
    fn original_source(&self) -> Option<String>;

    fn remember_source(&self, source: &str);

    /// Show `payload`.
    fn apply(&self, payload: &str);

    /// Show nothing.
    fn clear(&self);

    /// Hidden helper targets are discarded once filled.
    fn is_transient(&self) -> bool {
        false
    }

    fn remove(&self) {}
}

#[derive(Debug, Default)]
struct TargetState {
    current: Option<String>,
    original: Option<String>,
    removed: bool,
}

/// Thread-safe in-memory [`Target`].
#[derive(Debug)]
pub struct ImageTarget {
    kind: TargetKind,
    transient: bool,
    state: Mutex<TargetState>,
}

impl ImageTarget {
    /// An image showing `source`.
    pub fn new(source: impl Into<String>) -> Self {
        Self::build(TargetKind::Source, false, Some(source.into()))
    }

    /// An image with nothing to show yet.
    pub fn empty() -> Self {
        Self::build(TargetKind::Source, false, None)
    }

    /// A background referencing `source`.
    pub fn background(source: impl Into<String>) -> Self {
        let wrapped = wrap_url(&source.into());
        Self::build(TargetKind::Background, false, Some(wrapped))
    }

    /// A hidden image used only to drive a fill.
    pub fn transient() -> Self {
        Self::build(TargetKind::Source, true, None)
    }

    fn build(kind: TargetKind, transient: bool, current: Option<String>) -> Self {
        Self {
            kind,
            transient,
            state: Mutex::new(TargetState {
                current,
                ..TargetState::default()
            }),
        }
    }

    /// The raw displayed value, `url(...)` wrapper included.
    pub fn raw(&self) -> Option<String> {
        self.lock().current.clone()
    }

    pub fn is_removed(&self) -> bool {
        self.lock().removed
    }

    fn lock(&self) -> MutexGuard<'_, TargetState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Target for ImageTarget {
    fn kind(&self) -> TargetKind {
        self.kind
    }

    fn current_source(&self) -> Option<String> {
        let raw = self.lock().current.clone()?;
        let source = match self.kind {
            TargetKind::Source => raw,
            TargetKind::Background => unwrap_url(&raw).to_string(),
        };
        (!source.is_empty()).then_some(source)
    }

    fn original_source(&self) -> Option<String> {
        self.lock().original.clone()
    }

    fn remember_source(&self, source: &str) {
        let mut state = self.lock();
        if state.original.is_none() {
            state.original = Some(source.to_string());
        }
    }

    fn apply(&self, payload: &str) {
        let value = match self.kind {
            TargetKind::Source => payload.to_string(),
            TargetKind::Background => wrap_url(payload),
        };
        self.lock().current = Some(value);
    }

    fn clear(&self) {
        self.lock().current = None;
    }

    fn is_transient(&self) -> bool {
        self.transient
    }

    fn remove(&self) {
        self.lock().removed = true;
    }
}

fn wrap_url(source: &str) -> String {
    format!("url(\"{source}\")")
}

/// Strip `url(...)` and surrounding quotes.
fn unwrap_url(raw: &str) -> &str {
    let inner = raw
        .trim()
        .strip_prefix("url(")
        .and_then(|s| s.strip_suffix(')'))
        .unwrap_or(raw);
    inner.trim().trim_matches(|c| c == '"' || c == '\'')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_target_round_trip() {
        let t = ImageTarget::new("http://ex.com/a.png");
        assert_eq!(t.kind(), TargetKind::Source);
        assert_eq!(t.current_source().as_deref(), Some("http://ex.com/a.png"));

        t.apply("data:image/png;base64,AA==");
        assert_eq!(t.raw().as_deref(), Some("data:image/png;base64,AA=="));

        t.clear();
        assert!(t.current_source().is_none());
    }

    #[test]
    fn background_wraps_and_unwraps() {
        let t = ImageTarget::background("http://ex.com/bg.jpg");
        assert_eq!(t.raw().as_deref(), Some("url(\"http://ex.com/bg.jpg\")"));
        assert_eq!(t.current_source().as_deref(), Some("http://ex.com/bg.jpg"));

        t.apply("data:image/jpeg;base64,AA==");
        assert_eq!(t.current_source().as_deref(), Some("data:image/jpeg;base64,AA=="));
    }

    #[test]
    fn unwrap_handles_quote_styles() {
        assert_eq!(unwrap_url("url('a.png')"), "a.png");
        assert_eq!(unwrap_url("url(a.png)"), "a.png");
        assert_eq!(unwrap_url("url(\"a.png\")"), "a.png");
        assert_eq!(unwrap_url("a.png"), "a.png");
    }

    #[test]
    fn original_source_is_remembered_once() {
        let t = ImageTarget::empty();
        t.remember_source("http://ex.com/first.png");
        t.remember_source("http://ex.com/second.png");
        assert_eq!(t.original_source().as_deref(), Some("http://ex.com/first.png"));
    }

    #[test]
    fn transient_targets() {
        let t = ImageTarget::transient();
        assert!(t.is_transient());
        assert!(!t.is_removed());
        t.remove();
        assert!(t.is_removed());
        assert!(!ImageTarget::empty().is_transient());
    }
}
