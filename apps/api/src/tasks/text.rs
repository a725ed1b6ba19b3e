/// Title used when a task has a description but no title.
pub const PLACEHOLDER_TITLE: &str = "Untitled";

/// Normalized task text as stored on the task row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CombinedText {
    pub title: String,
    pub description: String,
    /// `title`, plus `"\n\n" + description` when a description exists.
    pub text: String,
}

/// Trims both fields and joins them. Returns `None` when both are empty.
pub fn build_combined_text(title: &str, description: &str) -> Option<CombinedText> {
    let title = title.trim();
    let description = description.trim();

    if title.is_empty() && description.is_empty() {
        return None;
    }

    let title = if title.is_empty() {
        PLACEHOLDER_TITLE
    } else {
        title
    };

    let text = if description.is_empty() {
        title.to_string()
    } else {
        format!("{title}\n\n{description}")
    };

    Some(CombinedText {
        title: title.to_string(),
        description: description.to_string(),
        text,
    })
}
