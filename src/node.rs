use std::sync::Arc;

use crate::display::decode::DecodedImage;
use crate::display::element::ImageElement;
use crate::foundation::error::{LatexError, LatexResult};

/// Anything able to produce its current image element on demand.
pub trait ImageSource {
    fn image(&self) -> LatexResult<ImageElement>;
}

/// Generic image display entity, composed over an [`ImageSource`].
///
/// Measurement is only available once the current element has decoded; until then the size
/// queries return `None` and the host should wait on its dependency context.
#[derive(Debug)]
pub struct ImageNode<S> {
    source: S,
}

impl<S: ImageSource> ImageNode<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    pub fn into_source(self) -> S {
        self.source
    }

    pub fn current(&self) -> LatexResult<ImageElement> {
        self.source.image()
    }

    pub fn natural_size(&self) -> LatexResult<Option<kurbo::Size>> {
        Ok(self.current()?.natural_size())
    }

    /// Layout size for the requested dimensions, filling in whichever is missing from the
    /// decoded aspect ratio.
    pub fn desired_size(
        &self,
        width: Option<f64>,
        height: Option<f64>,
    ) -> LatexResult<Option<kurbo::Size>> {
        for v in [width, height].into_iter().flatten() {
            if !v.is_finite() || v < 0.0 {
                return Err(LatexError::validation(
                    "requested image size must be finite and >= 0",
                ));
            }
        }

        let Some(natural) = self.natural_size()? else {
            return Ok(None);
        };
        let ratio = if natural.height > 0.0 {
            natural.width / natural.height
        } else {
            1.0
        };

        let size = match (width, height) {
            (Some(w), Some(h)) => kurbo::Size::new(w, h),
            (Some(w), None) => kurbo::Size::new(w, if ratio > 0.0 { w / ratio } else { 0.0 }),
            (None, Some(h)) => kurbo::Size::new(h * ratio, h),
            (None, None) => natural,
        };
        Ok(Some(size))
    }

    /// Decoded raster of the current element, once available.
    pub fn pixels(&self) -> LatexResult<Option<Arc<DecodedImage>>> {
        Ok(self.current()?.decoded_image())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_uri::DataUri;
    use crate::display::runtime::ImageRuntime;

    struct Fixed(ImageElement);

    impl ImageSource for Fixed {
        fn image(&self) -> LatexResult<ImageElement> {
            Ok(self.0.clone())
        }
    }

    fn node(w: u32, h: u32) -> (ImageRuntime, ImageNode<Fixed>) {
        let rt = ImageRuntime::default();
        let el = rt.create_element();
        el.set_src(DataUri::encode_svg(&format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}"><rect width="{w}" height="{h}"/></svg>"#
        )));
        (rt, ImageNode::new(Fixed(el)))
    }

    #[test]
    fn sizes_unknown_until_decoded() {
        let (rt, node) = node(8, 2);
        assert_eq!(node.natural_size().unwrap(), None);
        assert_eq!(node.desired_size(Some(4.0), None).unwrap(), None);
        assert!(node.pixels().unwrap().is_none());

        rt.pump();
        assert_eq!(
            node.natural_size().unwrap(),
            Some(kurbo::Size::new(8.0, 2.0))
        );
        assert!(node.pixels().unwrap().is_some());
    }

    #[test]
    fn desired_size_preserves_aspect_ratio() {
        let (rt, node) = node(8, 2);
        rt.pump();
        assert_eq!(
            node.desired_size(Some(4.0), None).unwrap(),
            Some(kurbo::Size::new(4.0, 1.0))
        );
        assert_eq!(
            node.desired_size(None, Some(3.0)).unwrap(),
            Some(kurbo::Size::new(12.0, 3.0))
        );
        assert_eq!(
            node.desired_size(Some(1.0), Some(1.0)).unwrap(),
            Some(kurbo::Size::new(1.0, 1.0))
        );
        assert_eq!(
            node.desired_size(None, None).unwrap(),
            Some(kurbo::Size::new(8.0, 2.0))
        );
    }

    #[test]
    fn desired_size_rejects_bad_input() {
        let (_rt, node) = node(8, 2);
        assert!(node.desired_size(Some(f64::NAN), None).is_err());
        assert!(node.desired_size(None, Some(-1.0)).is_err());
    }
}
