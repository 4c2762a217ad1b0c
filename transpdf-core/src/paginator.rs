use tracing::debug;

/// Owner of the current page (1-based).
///
/// Every method takes the document's known page count; `None` means no
/// document is loaded or the engine has not reported the count yet, and all
/// navigation is refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paginator {
    current_page: usize,
}

impl Default for Paginator {
    fn default() -> Self {
        Self { current_page: 1 }
    }
}

impl Paginator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn reset(&mut self) {
        self.current_page = 1;
    }

    /// Moves to `target` when it lies in `1..=page_count`. A `true` return
    /// means the content view has to restart at the top of the page.
    pub fn go_to(&mut self, page_count: Option<usize>, target: i64) -> bool {
        let Some(page_count) = page_count else {
            debug!(target, "page change refused: no page count");
            return false;
        };
        match usize::try_from(target) {
            Ok(page) if (1..=page_count).contains(&page) => {
                self.current_page = page;
                true
            }
            _ => {
                debug!(target, page_count, "page change refused: out of range");
                false
            }
        }
    }

    pub fn next(&mut self, page_count: Option<usize>) -> bool {
        let target = self.current_page as i64 + 1;
        self.go_to(page_count, target)
    }

    pub fn previous(&mut self, page_count: Option<usize>) -> bool {
        let target = self.current_page as i64 - 1;
        self.go_to(page_count, target)
    }
}
