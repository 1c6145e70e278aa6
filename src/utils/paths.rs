use std::path::PathBuf;

/// Terminals wrap dropped paths in quotes; strip them before using the path.
pub fn clean_dropped_path(input: &str) -> PathBuf {
    let trimmed = input.trim();
    let unquoted = trimmed
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .or_else(|| {
            trimmed
                .strip_prefix('\'')
                .and_then(|rest| rest.strip_suffix('\''))
        })
        .unwrap_or(trimmed);
    PathBuf::from(unquoted.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_matching_quotes() {
        assert_eq!(
            clean_dropped_path("  \"/tmp/My File.png\" "),
            PathBuf::from("/tmp/My File.png")
        );
        assert_eq!(clean_dropped_path("'notes.md'"), PathBuf::from("notes.md"));
        assert_eq!(clean_dropped_path("plain.txt"), PathBuf::from("plain.txt"));
    }

    #[test]
    fn keeps_unbalanced_quotes() {
        assert_eq!(clean_dropped_path("\"half.txt"), PathBuf::from("\"half.txt"));
    }
}
