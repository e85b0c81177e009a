//! TeX markup rendered as cached SVG images for Wavyte scenes.
//!
//! A [`Latex`] element resolves its current markup and [`RenderOptions`] to an
//! [`ImageElement`]. Rendered documents are memoized as [`DataUri`]s in a [`RenderStore`]
//! (by default the process-wide [`RenderCache`]), so each distinct `(tex, options)` pair is
//! typeset at most once per process. Decoding happens out-of-band in an [`ImageRuntime`];
//! pending decodes are registered with a [`DependencyContext`] the host awaits before
//! measuring.
#![forbid(unsafe_code)]

pub mod cache;
pub mod data_uri;
pub mod dependency;
pub mod display;
pub mod engine;
pub mod foundation;
pub mod latex;
pub mod node;
pub mod options;

pub use crate::cache::{RenderCache, RenderStore};
pub use crate::data_uri::DataUri;
pub use crate::dependency::{
    DependencyContext, DependencyHandle, DependencyId, TrackedDependency,
};
pub use crate::display::decode::{DecodeOpts, DecodedImage, decode_data_uri};
pub use crate::display::element::{DecodeStatus, ImageElement, ImageReady};
pub use crate::display::runtime::ImageRuntime;
pub use crate::engine::process::{ProcessEngine, ProcessEngineOpts, TexInput};
pub use crate::engine::{TypesetEngine, mathjax_error};
pub use crate::foundation::error::{LatexError, LatexResult};
pub use crate::foundation::signal::SignalValue;
pub use crate::latex::{Latex, LatexEnv, LatexProps};
pub use crate::node::{ImageNode, ImageSource};
pub use crate::options::{RenderOptions, cache_key};
