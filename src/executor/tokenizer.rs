//! Quote-aware command tokenization
//!
//! The synthesizer instructs the model to quote paths, so naive whitespace
//! splitting would corrupt any path with embedded spaces. The tokenizer
//! tracks single/double quote state character by character; quotes delimit
//! but are not part of the argument. An unterminated quote consumes to the
//! end of the input.

/// Split a command line into an argument vector
pub fn tokenize(command: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_single = false;
    let mut in_double = false;
    // Distinguishes "" (an empty argument) from no argument at all
    let mut quoted = false;

    for c in command.chars() {
        match c {
            '\'' if !in_double => {
                in_single = !in_single;
                quoted = true;
            }
            '"' if !in_single => {
                in_double = !in_double;
                quoted = true;
            }
            c if c.is_whitespace() && !in_single && !in_double => {
                if !current.is_empty() || quoted {
                    args.push(std::mem::take(&mut current));
                }
                quoted = false;
            }
            c => current.push(c),
        }
    }

    if !current.is_empty() || quoted {
        args.push(current);
    }

    args
}

/// Rejoin an argument vector into a command line
///
/// Arguments containing whitespace (or nothing) are double-quoted; the
/// result tokenizes back to the same vector.
pub fn rejoin(args: &[String]) -> String {
    args.iter()
        .map(|arg| {
            if arg.is_empty() || arg.chars().any(|c| c.is_whitespace()) {
                format!("\"{}\"", arg)
            } else {
                arg.clone()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_split() {
        assert_eq!(
            tokenize("ffmpeg -i input.mp4 output.mp4"),
            vec!["ffmpeg", "-i", "input.mp4", "output.mp4"]
        );
    }

    #[test]
    fn test_double_quoted_path_with_spaces() {
        let args = tokenize(r#"ffmpeg -i "my clip.mp4" "out file.mp4""#);
        assert_eq!(args, vec!["ffmpeg", "-i", "my clip.mp4", "out file.mp4"]);
    }

    #[test]
    fn test_single_quoted_path() {
        let args = tokenize("ffmpeg -i 'my clip.mp4' out.mp4");
        assert_eq!(args, vec!["ffmpeg", "-i", "my clip.mp4", "out.mp4"]);
    }

    #[test]
    fn test_double_quotes_inside_single_quotes() {
        let args = tokenize(r#"echo 'he said "hi"'"#);
        assert_eq!(args, vec!["echo", r#"he said "hi""#]);
    }

    #[test]
    fn test_adjacent_quoted_and_bare() {
        // Quote state toggles mid-token, as the shell would see it
        let args = tokenize(r#"ffmpeg -vf scale="1280:720""#);
        assert_eq!(args, vec!["ffmpeg", "-vf", "scale=1280:720"]);
    }

    #[test]
    fn test_empty_quoted_argument() {
        let args = tokenize(r#"cmd "" after"#);
        assert_eq!(args, vec!["cmd", "", "after"]);
    }

    #[test]
    fn test_collapses_runs_of_whitespace() {
        assert_eq!(tokenize("a   b\t c"), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_empty_input() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("   ").is_empty());
    }

    #[test]
    fn test_unterminated_quote_consumes_rest() {
        let args = tokenize(r#"ffmpeg -i "broken.mp4 out.mp4"#);
        assert_eq!(args, vec!["ffmpeg", "-i", "broken.mp4 out.mp4"]);
    }

    #[test]
    fn test_roundtrip_preserves_quoted_segments() {
        let original = r#"ffmpeg -i "my clip.mp4" -ss 00:00:05 "out file.mp4""#;
        let args = tokenize(original);
        let rejoined = rejoin(&args);

        assert_eq!(rejoined, original);
        assert_eq!(tokenize(&rejoined), args);
    }

    #[test]
    fn test_roundtrip_arbitrary_args() {
        let args: Vec<String> = ["ffmpeg", "-i", "a b c.mp4", "-codec", "copy", "out.mp4"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        assert_eq!(tokenize(&rejoin(&args)), args);
    }
}
