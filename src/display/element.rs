use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll, Waker};

use crate::data_uri::DataUri;
use crate::display::decode::DecodedImage;
use crate::display::runtime::DecodeQueue;
use crate::foundation::error::{LatexError, LatexResult};

/// Decode progress of an [`ImageElement`].
#[derive(Clone, Debug)]
pub enum DecodeStatus {
    /// No source assigned yet.
    Empty,
    /// Source assigned, decode not finished.
    Pending,
    Ready(Arc<DecodedImage>),
    Failed(String),
}

impl DecodeStatus {
    fn kind(&self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::Pending => "pending",
            Self::Ready(_) => "ready",
            Self::Failed(_) => "failed",
        }
    }
}

pub(crate) struct ElementState {
    pub(crate) src: Option<DataUri>,
    pub(crate) status: DecodeStatus,
    pub(crate) generation: u64,
    pub(crate) queued: bool,
    wakers: Vec<Waker>,
}

pub(crate) struct ElementShared {
    state: Mutex<ElementState>,
    queue: Arc<DecodeQueue>,
}

impl ElementShared {
    pub(crate) fn lock_state(&self) -> MutexGuard<'_, ElementState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record a decode outcome. Outcomes for a superseded source are dropped.
    pub(crate) fn settle(&self, generation: u64, outcome: LatexResult<DecodedImage>) -> bool {
        let wakers = {
            let mut st = self.lock_state();
            if st.generation != generation || !matches!(st.status, DecodeStatus::Pending) {
                return false;
            }
            st.status = match outcome {
                Ok(img) => DecodeStatus::Ready(Arc::new(img)),
                Err(e) => {
                    tracing::debug!(error = %e, "image decode failed");
                    DecodeStatus::Failed(e.to_string())
                }
            };
            std::mem::take(&mut st.wakers)
        };
        for waker in wakers {
            waker.wake();
        }
        true
    }
}

/// Display handle for an encoded image, decoded out-of-band by its
/// [`ImageRuntime`](crate::display::runtime::ImageRuntime).
///
/// Clones refer to the same element.
#[derive(Clone)]
pub struct ImageElement {
    shared: Arc<ElementShared>,
}

impl ImageElement {
    pub(crate) fn new(queue: Arc<DecodeQueue>) -> Self {
        Self {
            shared: Arc::new(ElementShared {
                state: Mutex::new(ElementState {
                    src: None,
                    status: DecodeStatus::Empty,
                    generation: 0,
                    queued: false,
                    wakers: Vec::new(),
                }),
                queue,
            }),
        }
    }

    pub fn src(&self) -> Option<DataUri> {
        self.shared.lock_state().src.clone()
    }

    /// Assign a new source and schedule it for decoding.
    ///
    /// Re-assigning the current source is a no-op once a source has been set. Returns whether
    /// the source changed.
    pub fn set_src(&self, uri: DataUri) -> bool {
        let mut st = self.shared.lock_state();
        if st.src.as_ref() == Some(&uri) {
            return false;
        }
        st.src = Some(uri);
        st.generation += 1;
        st.status = DecodeStatus::Pending;
        if !st.queued {
            st.queued = true;
            self.shared.queue.push(Arc::downgrade(&self.shared));
        }
        true
    }

    /// `false` while a decode is outstanding.
    pub fn complete(&self) -> bool {
        !matches!(self.shared.lock_state().status, DecodeStatus::Pending)
    }

    pub fn status(&self) -> DecodeStatus {
        self.shared.lock_state().status.clone()
    }

    pub fn decoded_image(&self) -> Option<Arc<DecodedImage>> {
        match &self.shared.lock_state().status {
            DecodeStatus::Ready(img) => Some(Arc::clone(img)),
            _ => None,
        }
    }

    pub fn natural_size(&self) -> Option<kurbo::Size> {
        self.decoded_image().map(|img| img.natural_size)
    }

    /// Future resolving when the element becomes ready and rejecting when decoding fails.
    pub fn decoded(&self) -> ImageReady {
        ImageReady {
            shared: Arc::clone(&self.shared),
        }
    }

    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.shared, &b.shared)
    }
}

impl fmt::Debug for ImageElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let st = self.shared.lock_state();
        f.debug_struct("ImageElement")
            .field("src", &st.src)
            .field("status", &st.status.kind())
            .finish()
    }
}

/// See [`ImageElement::decoded`].
pub struct ImageReady {
    shared: Arc<ElementShared>,
}

impl Future for ImageReady {
    type Output = LatexResult<()>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut guard = self.shared.lock_state();
        let st = &mut *guard;
        match &st.status {
            DecodeStatus::Ready(_) => Poll::Ready(Ok(())),
            DecodeStatus::Failed(msg) => Poll::Ready(Err(LatexError::decode(msg.clone()))),
            DecodeStatus::Empty => Poll::Ready(Err(LatexError::decode(
                "image element has no source",
            ))),
            DecodeStatus::Pending => {
                if !st.wakers.iter().any(|w| w.will_wake(cx.waker())) {
                    st.wakers.push(cx.waker().clone());
                }
                Poll::Pending
            }
        }
    }
}
