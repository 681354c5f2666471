// Shared prompt fragments.
// Each module that calls the model defines its own prompts.rs alongside it;
// this file holds the pieces they have in common.

/// Appended to every prompt that expects a marker/label convention back.
pub const NO_CODE_FENCES: &str = "\
Return ONLY the requested format. \
Do NOT wrap the answer in markdown code fences. \
Do NOT add greetings, explanations or apologies before or after it.";

/// Appended on the single phase-level retry after a malformed answer.
pub const STRICT_FORMAT_REMINDER: &str = "\
IMPORTANT: your previous answer could not be read. \
Reproduce the marker lines and field labels EXACTLY as shown, byte for byte, each on its own line. \
Anything outside the requested format is discarded.";
