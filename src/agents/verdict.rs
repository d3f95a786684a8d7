//! Boolean reading of model replies.

/// Tokens accepted as "yes", compared after trimming and lowercasing
pub const AFFIRMATIVE_TOKENS: [&str; 3] = ["true", "yes", "1"];

/// Whether a model reply is an affirmative answer.
///
/// The whole reply, trimmed and lowercased, must be one of
/// [`AFFIRMATIVE_TOKENS`]. Everything else is negative, including
/// transport error text, punctuation and qualified answers.
pub fn parse_affirmative(reply: &str) -> bool {
    let normalized = reply.trim().to_lowercase();
    AFFIRMATIVE_TOKENS.contains(&normalized.as_str())
}
