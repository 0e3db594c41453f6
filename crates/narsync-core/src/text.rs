//! Text normalization shared by alignment and trigger lookup.

/// Words shorter than this must match exactly.
const MIN_FUZZY_LEN: usize = 4;

/// A whitespace-delimited word of segment text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Token {
    /// The word as written, punctuation included.
    pub text: String,
    /// Lowercased alphanumerics only; never empty.
    pub norm: String,
    /// Char index of the word's first char in the source text.
    pub char_offset: usize,
}

/// Lowercases and drops everything that is not alphanumeric.
pub(crate) fn normalize_word(word: &str) -> String {
    word.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Splits text on whitespace, skipping words with nothing speakable in them.
pub(crate) fn tokenize(text: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut start = 0;

    let mut flush = |current: &mut String, start: usize| {
        if current.is_empty() {
            return;
        }
        let norm = normalize_word(current);
        if !norm.is_empty() {
            tokens.push(Token {
                text: std::mem::take(current),
                norm,
                char_offset: start,
            });
        }
        current.clear();
    };

    for (i, c) in text.chars().enumerate() {
        if c.is_whitespace() {
            flush(&mut current, start);
        } else {
            if current.is_empty() {
                start = i;
            }
            current.push(c);
        }
    }
    flush(&mut current, start);

    tokens
}

/// Levenshtein distance over chars.
pub(crate) fn edit_distance(a: &str, b: &str) -> usize {
    let b: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != *cb);
            curr[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// Whether two normalized words count as the same spoken word.
pub(crate) fn words_match(a: &str, b: &str, tolerance: usize) -> bool {
    if a == b {
        return true;
    }
    if tolerance == 0 || a.chars().count().min(b.chars().count()) < MIN_FUZZY_LEN {
        return false;
    }
    edit_distance(a, b) <= tolerance
}

/// Lowercased chars of `text`, each paired with its source char index.
///
/// Whitespace runs collapse to a single space and leading or trailing
/// whitespace is dropped.
pub(crate) fn fold(text: &str) -> Vec<(char, usize)> {
    let mut folded = Vec::with_capacity(text.len());
    let mut pending_space: Option<usize> = None;

    for (i, c) in text.chars().enumerate() {
        if c.is_whitespace() {
            if !folded.is_empty() && pending_space.is_none() {
                pending_space = Some(i);
            }
            continue;
        }
        if let Some(space_at) = pending_space.take() {
            folded.push((' ', space_at));
        }
        for lower in c.to_lowercase() {
            folded.push((lower, i));
        }
    }

    folded
}

/// Char index in the source text of the first occurrence of `needle`.
pub(crate) fn find_folded(haystack: &[(char, usize)], needle: &[char]) -> Option<usize> {
    if needle.is_empty() || needle.len() > haystack.len() {
        return None;
    }
    haystack
        .windows(needle.len())
        .find(|window| window.iter().map(|(c, _)| c).eq(needle.iter()))
        .map(|window| window[0].1)
}

/// `value * num / den`, truncated toward zero. Returns `value` when `den` is zero.
pub(crate) fn scale(value: i64, num: usize, den: usize) -> i64 {
    if den == 0 {
        return value;
    }
    let scaled = i128::from(value) * num as i128 / den as i128;
    i64::try_from(scaled).unwrap_or(if scaled < 0 { i64::MIN } else { i64::MAX })
}

/// First few words of `text`, for messages.
pub(crate) fn preview(text: &str) -> String {
    const MAX_CHARS: usize = 40;
    let trimmed = text.trim();
    if trimmed.chars().count() <= MAX_CHARS {
        return trimmed.to_string();
    }
    let cut: String = trimmed.chars().take(MAX_CHARS).collect();
    format!("{}...", cut.trim_end())
}
