use crate::engine::PAGE_SIZE;
use crate::error::{EngineResult, SessionError, SessionResult};
use std::collections::HashMap;

/// Fetch `[start, start + size)` page by page, clamped to `total`.
///
/// A single failed or short page fails the whole call; callers never see a
/// partially filled range.
pub fn fetch_range<T, F>(total: usize, start: usize, size: usize, mut page: F) -> SessionResult<Vec<T>>
where
    F: FnMut(usize, usize) -> EngineResult<Vec<T>>,
{
    let size = size.min(total.saturating_sub(start));
    let mut out = Vec::with_capacity(size);
    let mut position = start;
    while out.len() < size {
        let want = (size - out.len()).min(PAGE_SIZE);
        let got = page(position, want).map_err(|source| SessionError::Page {
            start: position,
            source,
        })?;
        if got.len() != want {
            return Err(SessionError::ShortPage {
                expected: want,
                got: got.len(),
            });
        }
        out.extend(got);
        position += want;
    }
    Ok(out)
}

/// Per-page cache over an engine list. Any generation change discards every
/// cached page.
#[derive(Debug)]
pub struct PageCache<T> {
    generation: u64,
    pages: HashMap<usize, Vec<T>>,
}

impl<T> Default for PageCache<T> {
    fn default() -> Self {
        Self {
            generation: 0,
            pages: HashMap::new(),
        }
    }
}

impl<T: Clone> PageCache<T> {
    /// Item `index`, fetching its page through `fetch(start, max)` on a miss.
    pub fn get<F>(
        &mut self,
        generation: u64,
        index: usize,
        total: usize,
        fetch: F,
    ) -> SessionResult<Option<T>>
    where
        F: FnOnce(usize, usize) -> EngineResult<Vec<T>>,
    {
        if generation != self.generation {
            self.pages.clear();
            self.generation = generation;
        }
        if index >= total {
            return Ok(None);
        }
        let page = index / PAGE_SIZE;
        if !self.pages.contains_key(&page) {
            let start = page * PAGE_SIZE;
            let max = PAGE_SIZE.min(total - start);
            let items = fetch(start, max).map_err(|source| SessionError::Page { start, source })?;
            if items.len() != max {
                return Err(SessionError::ShortPage {
                    expected: max,
                    got: items.len(),
                });
            }
            self.pages.insert(page, items);
        }
        Ok(self
            .pages
            .get(&page)
            .and_then(|items| items.get(index % PAGE_SIZE))
            .cloned())
    }

    pub fn cached_pages(&self) -> usize {
        self.pages.len()
    }
}
