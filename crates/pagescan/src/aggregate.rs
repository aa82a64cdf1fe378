//! Result collection and page-ordered reassembly.
//!
//! Pages finish in whatever order the pool produces them. [`ResultCollector`]
//! stores each result in a write-once slot keyed by page number and remembers
//! completion order for the progress trail; [`aggregate`] then renders the
//! slots in page order.

use crate::types::{PageError, PageResult, PageStatusEntry, ProgressEntry};
use crate::{PageScanError, Result};
use parking_lot::Mutex;
use std::time::Instant;

/// Marker rendered in place of a page that could not be rasterized.
pub const CONVERSION_ERROR_MARKER: &str = "[Conversion Error]";

const SECTION_SEPARATOR: &str = "\n\n";

/// Ordered text plus the per-page status log.
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregate {
    pub text: String,
    pub pages_recognized: usize,
    pub per_page_status: Vec<PageStatusEntry>,
}

#[derive(Debug)]
struct CollectorState {
    slots: Vec<Option<PageResult>>,
    progress: Vec<ProgressEntry>,
}

/// One write-once slot per page, safe to fill from several tasks.
#[derive(Debug)]
pub struct ResultCollector {
    started: Instant,
    state: Mutex<CollectorState>,
}

impl ResultCollector {
    pub fn new(total_pages: usize, started: Instant) -> Self {
        Self {
            started,
            state: Mutex::new(CollectorState {
                slots: vec![None; total_pages],
                progress: Vec::with_capacity(total_pages),
            }),
        }
    }

    /// Store a page result and append it to the progress trail.
    ///
    /// # Errors
    ///
    /// `PageScanError::Aggregation` if the page number is outside `1..=total`
    /// or the page already has a result.
    pub fn record(&self, result: PageResult) -> Result<()> {
        let mut state = self.state.lock();
        // Read the clock under the lock so the trail stays monotonic.
        let elapsed_ms = self.started.elapsed().as_millis() as u64;
        let total = state.slots.len();
        let page = result.page_number;

        let slot = page
            .checked_sub(1)
            .and_then(|index| state.slots.get_mut(index))
            .ok_or_else(|| PageScanError::aggregation(format!("page {} is outside 1..={}", page, total)))?;

        if slot.is_some() {
            return Err(PageScanError::aggregation(format!("page {} was recorded twice", page)));
        }

        let status = result.status();
        *slot = Some(result);
        state.progress.push(ProgressEntry {
            page,
            status,
            elapsed_ms,
        });

        tracing::debug!(page, status = %status, elapsed_ms, "Page completed");
        Ok(())
    }

    pub fn recorded(&self) -> usize {
        self.state.lock().progress.len()
    }

    /// Completion-ordered progress trail so far.
    pub fn progress(&self) -> Vec<ProgressEntry> {
        self.state.lock().progress.clone()
    }

    /// Consume the collector, returning the filled results and the trail.
    ///
    /// # Errors
    ///
    /// `PageScanError::Aggregation` if any page is still missing.
    pub fn finish(self) -> Result<(Vec<PageResult>, Vec<ProgressEntry>)> {
        let state = self.state.into_inner();
        let missing: Vec<usize> = state
            .slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_none())
            .map(|(index, _)| index + 1)
            .collect();

        if !missing.is_empty() {
            return Err(PageScanError::aggregation(format!("no result for pages {:?}", missing)));
        }

        Ok((state.slots.into_iter().flatten().collect(), state.progress))
    }
}

/// Render one page section.
fn render_section(result: &PageResult) -> String {
    let body = match &result.outcome {
        Ok(text) => text.trim_end().to_string(),
        Err(PageError::Conversion { .. }) => CONVERSION_ERROR_MARKER.to_string(),
        Err(PageError::Recognition { cause, .. }) => format!("[Error: {}]", cause),
    };
    format!("--- Page {} ---\n{}", result.page_number, body)
}

/// Reassemble `results` into page order.
///
/// Requires exactly one result for every page in `1..=total`, in any order.
///
/// # Errors
///
/// `PageScanError::Aggregation` when coverage is incomplete or a page repeats.
pub fn aggregate(total: usize, results: impl IntoIterator<Item = PageResult>) -> Result<Aggregate> {
    let mut slots: Vec<Option<PageResult>> = vec![None; total];

    for result in results {
        let page = result.page_number;
        let slot = page
            .checked_sub(1)
            .and_then(|index| slots.get_mut(index))
            .ok_or_else(|| PageScanError::aggregation(format!("page {} is outside 1..={}", page, total)))?;
        if slot.replace(result).is_some() {
            return Err(PageScanError::aggregation(format!("duplicate result for page {}", page)));
        }
    }

    let mut sections = Vec::with_capacity(total);
    let mut per_page_status = Vec::with_capacity(total);
    let mut pages_recognized = 0;

    for (index, slot) in slots.iter().enumerate() {
        let result = slot
            .as_ref()
            .ok_or_else(|| PageScanError::aggregation(format!("no result for page {}", index + 1)))?;
        if result.is_ok() {
            pages_recognized += 1;
        }
        sections.push(render_section(result));
        per_page_status.push(PageStatusEntry::from(result));
    }

    Ok(Aggregate {
        text: sections.join(SECTION_SEPARATOR),
        pages_recognized,
        per_page_status,
    })
}
