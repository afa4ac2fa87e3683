//! Prompt templates for the generation nodes.

use pipeline::CategoryName;

/// Characters of article body shown to the categorizer.
pub const CATEGORY_CONTEXT_CHARS: usize = 1500;

pub fn outline(topic: &str) -> String {
    format!("Create a structured SEO blog outline for: {topic}. Return ONLY a JSON list of strings.")
}

pub fn content(outline: &[String]) -> String {
    let sections = outline
        .iter()
        .map(|section| format!("- {section}"))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "You are an expert copywriter. Expand the following outline into a \
         comprehensive, engaging blog post (approx 1200 words). \
         Use Markdown for structure, including bold text for emphasis and \
         bullet points for readability. \n\nOUTLINE:\n{sections}"
    )
}

pub fn category(title: &str, body_excerpt: &str, existing: &[CategoryName]) -> String {
    let existing = if existing.is_empty() {
        "None".to_string()
    } else {
        existing
            .iter()
            .map(CategoryName::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    };
    format!(
        "Role: Senior Content Taxonomist.\n\
         Task: Categorize the following blog post.\n\n\
         Existing Categories: {existing}\n\n\
         Blog Title: {title}\n\
         Blog Content: {body_excerpt}\n\n\
         Instructions:\n\
         1. If a category in 'Existing Categories' fits perfectly, use it.\n\
         2. If none fit, create a new, professional 1-2 word category.\n\
         3. Return ONLY the category name. No quotes, no explanation."
    )
}
