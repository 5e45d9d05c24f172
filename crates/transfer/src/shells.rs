//! Page-shell pre-creation
//!
//! Pages reference each other by identifier, so copying a flow's pages needs
//! every target page to exist in the destination first. A shell is an empty
//! page carrying only the display name; the full page is written over it once
//! all identifiers are known.

use cx_porter_core::{Page, ResourceCategory};

use crate::copier::AgentCopier;
use crate::error::Result;
use crate::report::CopyReport;

/// Display names of `pages`, in order
pub fn page_shell_names(pages: &[Page]) -> Vec<String> {
    pages.iter().map(|p| p.display_name.clone()).collect()
}

impl AgentCopier {
    /// Create an empty page per display name in `destination_flow`
    ///
    /// Names that already exist are recorded as `SkippedDuplicate`. An unknown
    /// destination flow aborts before any page is created.
    pub async fn create_page_shells<S: AsRef<str>>(
        &self,
        display_names: &[S],
        destination_agent: &str,
        destination_flow: &str,
    ) -> Result<CopyReport> {
        let flow = self.resolve_flow(destination_agent, destination_flow).await?;
        let mut report = CopyReport::new();

        for display_name in display_names {
            let display_name = display_name.as_ref();
            let result = self.client().create_page(&flow, &Page::shell(display_name)).await;
            self.record(&mut report, ResourceCategory::Pages, display_name, result);
        }

        tracing::info!(flow = %flow, shells = %report, "Page shells created");
        Ok(report)
    }

    /// `create_page_shells` in the copier's destination flow
    pub async fn create_page_shells_in_configured_flow<S: AsRef<str>>(
        &self,
        display_names: &[S],
        destination_agent: &str,
    ) -> Result<CopyReport> {
        self.create_page_shells(display_names, destination_agent, self.destination_flow())
            .await
    }
}
