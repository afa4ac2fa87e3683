//! Activity feed writes.

use pipeline::{ActivityKind, BlogStore, NewActivity};
use tracing::warn;

/// Appends a feed entry. The feed is informational, so a failed write is
/// logged and otherwise ignored.
pub async fn record_activity(
    store: &dyn BlogStore,
    user: &str,
    kind: ActivityKind,
    action_text: impl Into<String>,
    blog_title: &str,
) {
    let entry = NewActivity {
        user: user.to_string(),
        kind,
        action_text: action_text.into(),
        blog_title: blog_title.to_string(),
    };
    if let Err(err) = store.log_activity(entry).await {
        warn!(error = %err, kind = kind.as_str(), "failed to record activity");
    }
}
