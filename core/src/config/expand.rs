//! Placeholder expansion for configuration values.
//!
//! Supports `${env:NAME}` substitution (unset variables expand to the
//! empty string) and leading-`~` home expansion.

/// Replace every `${env:NAME}` placeholder with the variable's value.
pub fn expand_env_placeholders(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(start) = rest.find("${env:") {
        out.push_str(&rest[..start]);
        let tail = &rest[start + 6..];
        match tail.find('}') {
            Some(end) => {
                let name = &tail[..end];
                if let Ok(value) = std::env::var(name) {
                    out.push_str(&value);
                }
                rest = &tail[end + 1..];
            }
            None => {
                // Unterminated placeholder, keep it verbatim.
                out.push_str(&rest[start..]);
                return out;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(input: &str) -> String {
    shellexpand::tilde(input).into_owned()
}
