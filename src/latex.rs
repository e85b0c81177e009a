use std::fmt;
use std::sync::Arc;

use crate::cache::{RenderCache, RenderStore};
use crate::data_uri::DataUri;
use crate::dependency::DependencyContext;
use crate::display::element::ImageElement;
use crate::display::runtime::ImageRuntime;
use crate::engine::{TypesetEngine, mathjax_error};
use crate::foundation::error::LatexResult;
use crate::foundation::signal::SignalValue;
use crate::node::ImageSource;
use crate::options::{RenderOptions, cache_key};

/// Collaborators a [`Latex`] element renders through.
#[derive(Clone)]
pub struct LatexEnv {
    pub engine: Arc<dyn TypesetEngine>,
    pub cache: Arc<dyn RenderStore>,
    pub images: ImageRuntime,
    pub dependencies: Arc<DependencyContext>,
}

impl LatexEnv {
    /// Environment backed by the process-wide [`RenderCache`], a fresh image runtime and a fresh
    /// dependency context.
    pub fn new(engine: Arc<dyn TypesetEngine>) -> Self {
        Self {
            engine,
            cache: Arc::new(RenderCache::global()),
            images: ImageRuntime::default(),
            dependencies: Arc::new(DependencyContext::new()),
        }
    }

    pub fn with_cache(mut self, cache: Arc<dyn RenderStore>) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_images(mut self, images: ImageRuntime) -> Self {
        self.images = images;
        self
    }

    pub fn with_dependencies(mut self, dependencies: Arc<DependencyContext>) -> Self {
        self.dependencies = dependencies;
        self
    }
}

impl fmt::Debug for LatexEnv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LatexEnv")
            .field("cached", &self.cache.len())
            .field("pending_images", &self.images.pending())
            .field("dependencies", &self.dependencies)
            .finish_non_exhaustive()
    }
}

/// Construction-time attributes of a [`Latex`] element.
#[derive(Clone, Debug)]
pub struct LatexProps {
    pub tex: SignalValue<String>,
    pub options: SignalValue<RenderOptions>,
}

impl LatexProps {
    pub fn new(tex: impl Into<SignalValue<String>>) -> Self {
        Self {
            tex: tex.into(),
            options: SignalValue::default(),
        }
    }

    pub fn options(mut self, options: impl Into<SignalValue<RenderOptions>>) -> Self {
        self.options = options.into();
        self
    }
}

/// Image source that typesets TeX markup into an SVG image, memoized per `(tex, options)`.
pub struct Latex {
    tex: SignalValue<String>,
    options: SignalValue<RenderOptions>,
    image_element: ImageElement,
    env: LatexEnv,
}

impl Latex {
    pub fn new(props: LatexProps, env: LatexEnv) -> Self {
        Self {
            tex: props.tex,
            options: props.options,
            image_element: env.images.create_element(),
            env,
        }
    }

    pub fn tex(&self) -> String {
        self.tex.get()
    }

    pub fn set_tex(&mut self, tex: impl Into<SignalValue<String>>) {
        self.tex = tex.into();
    }

    pub fn options(&self) -> RenderOptions {
        self.options.get()
    }

    pub fn set_options(&mut self, options: impl Into<SignalValue<RenderOptions>>) {
        self.options = options.into();
    }

    pub fn env(&self) -> &LatexEnv {
        &self.env
    }

    /// Resolve the current markup and options to an image element.
    ///
    /// A cache hit never invokes the engine and returns the element's reusable handle; a miss
    /// typesets, caches and returns a new element. Markup errors reported by the engine are
    /// logged and do not fail the call. Whenever a source is assigned and the element is still
    /// decoding, one dependency is registered with [`LatexEnv::dependencies`]; a hit that leaves
    /// the source unchanged registers nothing.
    pub fn image(&self) -> LatexResult<ImageElement> {
        let tex = self.tex();
        let options = self.options();
        let key = cache_key(&tex, &options)?;

        if let Some(uri) = self.env.cache.lookup(&key) {
            tracing::debug!(tex = %tex, "latex cache hit");
            if self.image_element.set_src(uri) {
                self.track_decode(&self.image_element);
            }
            return Ok(self.image_element.clone());
        }

        tracing::debug!(tex = %tex, "latex cache miss");
        let svg = self.env.engine.convert(&tex, &options)?;
        if let Some(message) = mathjax_error(&svg) {
            tracing::error!("Invalid MathJax: {message}");
        }

        let uri = DataUri::encode_svg(&svg);
        self.env.cache.store(key, uri.clone());

        let image = self.env.images.create_element();
        image.set_src(uri);
        self.track_decode(&image);
        Ok(image)
    }

    fn track_decode(&self, image: &ImageElement) {
        if !image.complete() {
            self.env.dependencies.collect_promise(image.decoded());
        }
    }
}

impl ImageSource for Latex {
    fn image(&self) -> LatexResult<ImageElement> {
        Latex::image(self)
    }
}

impl fmt::Debug for Latex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Latex")
            .field("tex", &self.tex)
            .field("options", &self.options)
            .field("image_element", &self.image_element)
            .finish_non_exhaustive()
    }
}
