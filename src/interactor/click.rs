//! `simulateRealClick` (spec §4.2): scroll-into-view, dispatch
//! mousedown/mouseup/click, then fall back to the native click. The
//! scroll+event dispatch is a real-browser concern implemented inside the
//! production `Page`; this module is the policy wrapper that every caller
//! goes through (so a future change to the dispatch sequence has one call
//! site, not one per tool).

use crate::page::{ElementHandle, Page, PageResult};

pub async fn simulate_real_click(page: &dyn Page, handle: &ElementHandle) -> PageResult<()> {
    page.simulate_real_click(handle).await
}
