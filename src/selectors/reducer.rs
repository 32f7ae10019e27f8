use super::oracle::UniquenessOracle;

/// Shorten `//a/b/c/...` to its shortest trailing suffix (at least two
/// segments) that is still unique. Anything else is returned unchanged.
///
/// Suffixes are tried shortest first, so the result is a fixed point:
/// reducing it again finds nothing shorter.
pub fn reduce<N>(locator: &str, oracle: &dyn UniquenessOracle<N>) -> String {
    let Some(segments) = chain_segments(locator) else {
        return locator.to_string();
    };
    if segments.len() <= 2 {
        return locator.to_string();
    }

    for start in (1..=segments.len() - 2).rev() {
        let candidate = format!("//{}", segments[start..].join("/"));
        if oracle.is_unique(&candidate) {
            return candidate;
        }
    }
    locator.to_string()
}

/// Top-level `/`-separated steps of a `//`-prefixed child-axis chain.
/// `None` for relative paths, a second `//`, or explicit axes.
fn chain_segments(locator: &str) -> Option<Vec<&str>> {
    let body = locator.strip_prefix("//")?;
    let segments = split_top_level(body)?;
    let valid = segments.iter().all(|seg| !seg.is_empty() && !has_top_level_axis(seg));
    valid.then_some(segments)
}

/// Split on `/` outside brackets, parentheses and string literals
fn split_top_level(path: &str) -> Option<Vec<&str>> {
    let mut segments = Vec::new();
    let mut depth: i32 = 0;
    let mut quote: Option<char> = None;
    let mut start = 0;

    for (i, c) in path.char_indices() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None => match c {
                '\'' | '"' => quote = Some(c),
                '[' | '(' => depth += 1,
                ']' | ')' => {
                    depth -= 1;
                    if depth < 0 {
                        return None;
                    }
                }
                '/' if depth == 0 => {
                    segments.push(&path[start..i]);
                    start = i + 1;
                }
                _ => {}
            },
        }
    }
    if depth != 0 || quote.is_some() {
        return None;
    }
    segments.push(&path[start..]);
    Some(segments)
}

fn has_top_level_axis(segment: &str) -> bool {
    let head = segment.split(['[', '(']).next().unwrap_or(segment);
    head.contains("::")
}
