//! JSON view models for the page routes.

use chrono::Timelike;
use pipeline::{humanize_age, ActivityEntry, BlogRecord, Category, Page, Timestamp};
use serde::Serialize;

use crate::state::ClientConfig;

/// Greeting for the local hour: morning before noon, afternoon before six.
pub fn greeting(hour: u32) -> &'static str {
    match hour {
        0..=11 => "Good Morning",
        12..=17 => "Good Afternoon",
        _ => "Good Evening",
    }
}

pub fn local_greeting() -> &'static str {
    greeting(chrono::Local::now().hour())
}

#[derive(Debug, Serialize)]
pub struct LoginView<'a> {
    pub page: &'static str,
    pub identity_config: &'a ClientConfig,
}

#[derive(Debug, Serialize)]
pub struct ActivityView {
    pub user: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub action_text: String,
    pub blog_title: String,
    pub timestamp: Timestamp,
    /// `"3h ago"`, relative to the time of the request.
    pub time_ago: String,
}

impl ActivityView {
    pub fn new(entry: ActivityEntry, now: Timestamp) -> Self {
        Self {
            time_ago: humanize_age(entry.timestamp, now),
            user: entry.user,
            kind: entry.kind.as_str(),
            action_text: entry.action_text,
            blog_title: entry.blog_title,
            timestamp: entry.timestamp,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DashboardView {
    pub greeting: &'static str,
    pub username: String,
    pub total_blogs_count: u64,
    pub drafts_count: u64,
    pub pending_count: u64,
    pub categories_count: u64,
    pub recent_activity: Vec<ActivityView>,
}

impl DashboardView {
    /// The view shown when the store cannot be read.
    pub fn empty(greeting: &'static str, username: String) -> Self {
        Self {
            greeting,
            username,
            total_blogs_count: 0,
            drafts_count: 0,
            pending_count: 0,
            categories_count: 0,
            recent_activity: Vec::new(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CreateView {
    pub username: String,
}

#[derive(Debug, Serialize)]
pub struct EditView {
    pub username: String,
    pub blog: BlogRecord,
}

/// One page of the drafts or approval queue.
#[derive(Debug, Serialize)]
pub struct QueueView {
    pub blogs: Vec<BlogRecord>,
    pub total: u64,
    pub current_page: u32,
    pub total_pages: u64,
    pub has_next: bool,
    pub has_prev: bool,
}

impl From<Page<BlogRecord>> for QueueView {
    fn from(page: Page<BlogRecord>) -> Self {
        Self {
            total: page.total,
            current_page: page.page,
            total_pages: page.total_pages(),
            has_next: page.has_next(),
            has_prev: page.has_prev(),
            blogs: page.items,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CategoriesView {
    pub categories: Vec<Category>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn greeting_boundaries() {
        assert_eq!(greeting(0), "Good Morning");
        assert_eq!(greeting(11), "Good Morning");
        assert_eq!(greeting(12), "Good Afternoon");
        assert_eq!(greeting(17), "Good Afternoon");
        assert_eq!(greeting(18), "Good Evening");
    }
}
