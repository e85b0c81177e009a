pub mod process;

use crate::foundation::error::LatexResult;
use crate::options::RenderOptions;

const MJX_ERROR_ATTR: &str = "data-mjx-error=\"";

/// TeX-to-SVG converter.
///
/// Implementations are expected to report malformed markup by embedding a `data-mjx-error`
/// attribute in the returned document rather than failing. An `Err` is reserved for engines that
/// could not produce a document at all.
pub trait TypesetEngine: Send + Sync {
    fn convert(&self, tex: &str, options: &RenderOptions) -> LatexResult<String>;
}

impl<F> TypesetEngine for F
where
    F: Fn(&str, &RenderOptions) -> LatexResult<String> + Send + Sync,
{
    fn convert(&self, tex: &str, options: &RenderOptions) -> LatexResult<String> {
        self(tex, options)
    }
}

/// First `data-mjx-error` message embedded in an engine document, if any.
///
/// A marker whose value is not closed on the same line is skipped and the scan resumes after it.
pub fn mathjax_error(svg: &str) -> Option<&str> {
    let mut rest = svg;
    loop {
        let start = rest.find(MJX_ERROR_ATTR)? + MJX_ERROR_ATTR.len();
        rest = &rest[start..];
        let end = rest.find(['"', '\n'])?;
        if rest.as_bytes()[end] == b'"' {
            return Some(&rest[..end]);
        }
        rest = &rest[end..];
    }
}
