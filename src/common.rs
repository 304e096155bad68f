use once_cell::sync::Lazy;
use regex::Regex;

use std::fs::File;
use std::io::Write;
use std::path::Path;

static NON_ALNUM: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9]+").unwrap());

/// Normalizes a display name into a reference usable as an utterance set
/// name: lowercased, with every run of non-alphanumeric characters collapsed
/// into a single dash.
pub fn slug(input: &str) -> String {
    let lowered = input.to_lowercase();
    NON_ALNUM
        .replace_all(&lowered, "-")
        .trim_matches('-')
        .to_string()
}

pub fn write_string_to_file(filename: &Path, content: &str) -> std::io::Result<()> {
    let mut file = File::create(filename)?;
    file.write_all(content.as_bytes())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_lowercases_and_dashes() {
        assert_eq!(slug("Book Flight"), "book-flight");
        assert_eq!(slug("Book Flight_input"), "book-flight-input");
    }

    #[test]
    fn slug_collapses_runs() {
        assert_eq!(slug("  A -- b/c  "), "a-b-c");
    }

    #[test]
    fn slug_of_empty_is_empty() {
        assert_eq!(slug(""), "");
        assert_eq!(slug("---"), "");
    }
}
