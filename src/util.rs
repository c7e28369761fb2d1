pub mod id_generator;
pub mod shutdown;
pub mod tracing;

pub mod text {
    use itertools::Itertools;

    /// Collapse every whitespace run into a single space and trim both ends
    pub fn normalize_whitespace(text: &str) -> String {
        text.split_whitespace().join(" ")
    }

    /// First `max_chars` characters, for log previews
    pub fn preview(text: &str, max_chars: usize) -> String {
        text.chars().take(max_chars).collect()
    }

}
