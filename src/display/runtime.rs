use std::sync::{Arc, Mutex, PoisonError, Weak};

use rayon::prelude::*;

use crate::data_uri::DataUri;
use crate::display::decode::{DecodeOpts, decode_data_uri};
use crate::display::element::{DecodeStatus, ElementShared, ImageElement};

#[derive(Default)]
pub(crate) struct DecodeQueue {
    pending: Mutex<Vec<Weak<ElementShared>>>,
}

impl DecodeQueue {
    pub(crate) fn push(&self, element: Weak<ElementShared>) {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(element);
    }

    fn take(&self) -> Vec<Weak<ElementShared>> {
        std::mem::take(&mut *self.pending.lock().unwrap_or_else(PoisonError::into_inner))
    }

    fn len(&self) -> usize {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Creates [`ImageElement`]s and decodes their sources when pumped.
///
/// Decoding never happens inside [`ImageElement::set_src`]; the host calls [`ImageRuntime::pump`]
/// at a point of its choosing, which settles every queued element and wakes its waiters.
#[derive(Clone, Default)]
pub struct ImageRuntime {
    queue: Arc<DecodeQueue>,
    opts: DecodeOpts,
}

impl ImageRuntime {
    pub fn new(opts: DecodeOpts) -> Self {
        Self {
            queue: Arc::default(),
            opts,
        }
    }

    pub fn opts(&self) -> &DecodeOpts {
        &self.opts
    }

    pub fn create_element(&self) -> ImageElement {
        ImageElement::new(Arc::clone(&self.queue))
    }

    /// Number of queued decodes, including entries for elements dropped since.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Decode every queued element and return how many were settled.
    ///
    /// Elements dropped before the pump are skipped.
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn pump(&self) -> usize {
        let jobs: Vec<(Arc<ElementShared>, DataUri, u64)> = self
            .queue
            .take()
            .into_iter()
            .filter_map(|weak| weak.upgrade())
            .filter_map(|el| {
                let job = {
                    let mut st = el.lock_state();
                    st.queued = false;
                    match (&st.status, &st.src) {
                        (DecodeStatus::Pending, Some(src)) => Some((src.clone(), st.generation)),
                        _ => None,
                    }
                };
                job.map(|(src, generation)| (el, src, generation))
            })
            .collect();

        if jobs.is_empty() {
            return 0;
        }

        let opts = self.opts;
        let outcomes: Vec<_> = jobs
            .par_iter()
            .map(|(_, src, _)| decode_data_uri(src, &opts))
            .collect();

        let settled = jobs
            .into_iter()
            .zip(outcomes)
            .map(|((el, _, generation), outcome)| el.settle(generation, outcome))
            .filter(|settled| *settled)
            .count();
        tracing::debug!(settled, "image decodes settled");
        settled
    }
}
