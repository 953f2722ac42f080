use std::{fmt::Write as _, sync::Arc};

use client_core::FlagsApi;
use shared::domain::OrgId;
use tracing::warn;

use crate::view::{join_sizes, pagination_label, DEFAULT_ORG_PAGE_SIZE, ORG_PAGE_SIZES};

/// Server-paginated organization list. Every page or size change is a
/// fresh request; nothing from earlier pages is kept.
pub struct OrgBrowser {
    api: Arc<dyn FlagsApi>,
    ids: Vec<OrgId>,
    total: u64,
    page: u32,
    page_size: u32,
    error: Option<String>,
}

impl OrgBrowser {
    pub fn new(api: Arc<dyn FlagsApi>) -> Self {
        Self {
            api,
            ids: Vec::new(),
            total: 0,
            page: 0,
            page_size: DEFAULT_ORG_PAGE_SIZE,
            error: None,
        }
    }

    pub fn ids(&self) -> &[OrgId] {
        &self.ids
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Loads `page` at the current size. On failure the previous rows stay
    /// and the error is kept for display.
    pub async fn load(&mut self, page: u32) {
        self.fetch(page, self.page_size).await;
    }

    /// Page, size and rows change together, and only when the request
    /// succeeds.
    async fn fetch(&mut self, page: u32, page_size: u32) {
        self.error = None;
        match self.api.fetch_org_page(page, page_size).await {
            Ok(result) => {
                self.ids = result.ids;
                self.total = result.total;
                self.page = result.page;
                self.page_size = result.page_size;
            }
            Err(err) => {
                warn!(page, page_size, error = %err, "failed to load organizations");
                self.error = Some(err.to_string());
            }
        }
    }

    pub async fn reload(&mut self) {
        self.load(self.page).await;
    }

    pub async fn next_page(&mut self) {
        if self.has_next() {
            self.load(self.page.saturating_add(1)).await;
        }
    }

    pub async fn prev_page(&mut self) {
        if self.page > 0 {
            self.load(self.page - 1).await;
        }
    }

    /// Changing the size always returns to the first page.
    pub async fn set_page_size(&mut self, page_size: u32) -> Result<(), String> {
        self.open(0, page_size).await
    }

    pub async fn open(&mut self, page: u32, page_size: u32) -> Result<(), String> {
        if !ORG_PAGE_SIZES.contains(&page_size) {
            return Err(format!(
                "page size must be one of {}",
                join_sizes(&ORG_PAGE_SIZES)
            ));
        }
        self.fetch(page, page_size).await;
        Ok(())
    }

    pub fn has_next(&self) -> bool {
        u64::from(self.page)
            .saturating_add(1)
            .saturating_mul(u64::from(self.page_size))
            < self.total
    }

    /// Resolves a 1-based row number on the current page.
    pub fn row(&self, number: usize) -> Option<&OrgId> {
        number.checked_sub(1).and_then(|index| self.ids.get(index))
    }

    pub fn render(&self, selected: Option<&OrgId>) -> String {
        let mut out = String::new();
        if let Some(error) = &self.error {
            let _ = writeln!(out, "Error: {error}");
        }
        let _ = writeln!(out, "{:>3}  Org ID", "#");
        for (index, id) in self.ids().iter().enumerate() {
            let marker = if selected == Some(id) { "*" } else { " " };
            let _ = writeln!(out, "{:>3} {marker}{id}", index + 1);
        }
        let total = usize::try_from(self.total).unwrap_or(usize::MAX);
        let _ = writeln!(
            out,
            "{}  (rows per page: {})",
            pagination_label(self.page as usize, self.page_size as usize, total),
            self.page_size
        );
        out
    }
}

#[cfg(test)]
#[path = "tests/orgs_tests.rs"]
mod tests;
