//! `navigateToOrderHistory` (spec §4.3).

use crate::error::CopilotError;
use crate::selectors::Resolver;
use crate::tools::{ToolContext, ToolOutcome};
use std::time::Duration;

const ORDER_HISTORY_PAGE_ID: &str = "order_history";
const ORDER_LIST_CONTAINER_KEY: &str = "order_list_container";

pub(crate) fn looks_like_auth_redirect(url: &str) -> bool {
    let lower = url.to_lowercase();
    lower.contains("/login") || lower.contains("/signin") || lower.contains("/authenticate")
}

pub async fn navigate_to_order_history(
    ctx: &ToolContext<'_>,
    order_history_url: &str,
    wait_for_container: bool,
) -> ToolOutcome<()> {
    const MAX_ATTEMPTS: u32 = 2;

    let mut last_err: Option<CopilotError> = None;
    for attempt in 0..MAX_ATTEMPTS {
        match ctx
            .page
            .navigate(order_history_url, ctx.config.navigation_timeout)
            .await
        {
            Ok(()) => {
                last_err = None;
                break;
            }
            Err(e) => {
                last_err = Some(CopilotError::new(
                    crate::error::ErrorCode::TimeoutError,
                    format!("navigation attempt {attempt} failed: {e}"),
                    true,
                ));
            }
        }
    }

    if let Some(err) = last_err {
        return ToolOutcome::err(err);
    }

    let current_url = ctx.page.current_url().await;
    if looks_like_auth_redirect(&current_url) {
        return ToolOutcome::err(CopilotError::auth(format!(
            "redirected to login page: {current_url}"
        )));
    }

    if wait_for_container {
        let resolver = Resolver::new(ctx.registry);
        match resolver
            .try_resolve(
                ctx.page,
                ORDER_HISTORY_PAGE_ID,
                ORDER_LIST_CONTAINER_KEY,
                Duration::max(
                    ctx.config.element_visibility_timeout,
                    Duration::from_millis(1),
                ),
            )
            .await
        {
            Ok(Some(_)) => {}
            Ok(None) => {
                return ToolOutcome::ok(()).with_warning("order list container never appeared");
            }
            Err(e) => return ToolOutcome::err(e),
        }
    }

    ToolOutcome::ok(())
}
