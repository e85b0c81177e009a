#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tracing_subscriber::layer::SubscriberExt as _;
use wavyte_latex::{
    DependencyContext, ImageRuntime, LatexEnv, LatexResult, RenderCache, RenderOptions,
    TypesetEngine,
};

pub const MJX_ERROR: &str = r"Undefined control sequence \foo";

/// Engine stand-in that counts conversions and emits a small valid SVG whose width tracks the
/// markup length. Markup containing `\foo` gets a MathJax error marker; markup containing
/// `!broken` yields a document that cannot be decoded.
#[derive(Default)]
pub struct CountingEngine {
    calls: AtomicUsize,
}

impl CountingEngine {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl TypesetEngine for CountingEngine {
    fn convert(&self, tex: &str, options: &RenderOptions) -> LatexResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if tex.contains("!broken") {
            return Ok("<svg".to_string());
        }
        let w = 8 * tex.chars().count().max(1);
        let h = if options.get("display") == Some(&serde_json::Value::Bool(true)) {
            16
        } else {
            8
        };
        let body = if tex.contains(r"\foo") {
            format!(
                r#"<g data-mml-node="merror" data-mjx-error="{MJX_ERROR}"><rect width="{w}" height="{h}" fill="red"/></g>"#
            )
        } else {
            format!(r#"<g data-mml-node="math"><rect width="{w}" height="{h}"/></g>"#)
        };
        Ok(format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">{body}</svg>"#
        ))
    }
}

pub struct Harness {
    pub engine: Arc<CountingEngine>,
    pub cache: RenderCache,
    pub images: ImageRuntime,
    pub dependencies: Arc<DependencyContext>,
}

impl Harness {
    pub fn new() -> Self {
        Self {
            engine: Arc::new(CountingEngine::default()),
            cache: RenderCache::new(),
            images: ImageRuntime::default(),
            dependencies: Arc::new(DependencyContext::new()),
        }
    }

    pub fn env(&self) -> LatexEnv {
        LatexEnv::new(self.engine.clone())
            .with_cache(Arc::new(self.cache.clone()))
            .with_images(self.images.clone())
            .with_dependencies(Arc::clone(&self.dependencies))
    }
}

/// Events captured from `tracing`, as `(level, message)`.
#[derive(Clone, Default)]
pub struct CapturedLogs(Arc<Mutex<Vec<(tracing::Level, String)>>>);

impl CapturedLogs {
    pub fn at(&self, level: tracing::Level) -> Vec<String> {
        self.0
            .lock()
            .unwrap()
            .iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, m)| m.clone())
            .collect()
    }
}

struct MessageVisitor(String);

impl tracing::field::Visit for MessageVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.0 = format!("{value:?}");
        }
    }
}

impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for CapturedLogs {
    fn on_event(
        &self,
        event: &tracing::Event<'_>,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        let mut visitor = MessageVisitor(String::new());
        event.record(&mut visitor);
        self.0
            .lock()
            .unwrap()
            .push((*event.metadata().level(), visitor.0));
    }
}

/// Run `f` with a subscriber that records every event emitted on this thread.
pub fn capture_logs<T>(f: impl FnOnce() -> T) -> (T, CapturedLogs) {
    let logs = CapturedLogs::default();
    let subscriber = tracing_subscriber::registry().with(logs.clone());
    let out = tracing::subscriber::with_default(subscriber, f);
    (out, logs)
}
