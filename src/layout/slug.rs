use std::collections::HashSet;

/// Fallback slug for titles that sanitize down to nothing
const EMPTY_TITLE_FALLBACK: &str = "episode";

/// Stop-word and abbreviation parameters for the shortening pipeline.
///
/// Modeled as a configuration table so that per-language word lists are data,
/// not code. The default covers English and French closed-class words.
#[derive(Debug, Clone)]
pub struct ShorteningRules {
    stop_words: HashSet<String>,
    /// Shortest prefix a token may be abbreviated to
    pub abbreviation_floor: usize,
}

const DEFAULT_STOP_WORDS: &[&str] = &[
    // English
    "a", "an", "the", "and", "or", "but", "of", "in", "on", "at", "to", "for", "with", "from",
    "by", "is", "are", "it", "its",
    // French (ASCII-folded, as tokens are after transliteration)
    "le", "la", "les", "un", "une", "des", "de", "du", "au", "aux", "et", "ou", "en", "sur",
    "dans", "pour", "par", "avec", "est", "es", "tu", "il", "elle", "ce", "ca", "se", "y",
];

impl ShorteningRules {
    pub fn new<I, S>(stop_words: I, abbreviation_floor: usize) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            stop_words: stop_words
                .into_iter()
                .map(|w| w.into().to_ascii_lowercase())
                .collect(),
            abbreviation_floor,
        }
    }

    pub fn is_stop_word(&self, token: &str) -> bool {
        self.stop_words.contains(&token.to_ascii_lowercase())
    }
}

impl Default for ShorteningRules {
    fn default() -> Self {
        Self::new(DEFAULT_STOP_WORDS.iter().copied(), 3)
    }
}

/// Reduce a raw episode title to a filesystem-safe, ASCII slug within `budget`
/// characters.
///
/// The pipeline applies transliteration and sanitization unconditionally, then
/// escalates only while the budget is still exceeded: stop-word removal, token
/// abbreviation (longest token first, down to the floor), and finally a hard
/// truncation. Pure and deterministic: the same title under the same budget
/// always yields the same slug.
pub fn shorten_title(title: &str, budget: Option<usize>, rules: &ShorteningRules) -> String {
    let slug = sanitize(&transliterate(title));

    let Some(budget) = budget else {
        return fallback_if_empty(slug, None);
    };

    if slug.len() <= budget {
        return fallback_if_empty(slug, Some(budget));
    }

    let mut tokens: Vec<String> = split_tokens(&slug)
        .filter(|t| !rules.is_stop_word(t))
        .map(str::to_string)
        .collect();
    if tokens.is_empty() {
        // Every token was a stop word; keep them rather than emit nothing
        tokens = split_tokens(&slug).map(str::to_string).collect();
    }

    if joined_len(&tokens) > budget {
        abbreviate_tokens(&mut tokens, budget, rules.abbreviation_floor);
    }

    let mut slug = tokens.join("_");
    if slug.len() > budget {
        slug.truncate(budget);
        slug = slug
            .trim_end_matches(|c| c == '_' || c == '-' || c == '.')
            .to_string();
    }

    fallback_if_empty(slug, Some(budget))
}

/// Map accented and typographic characters to their closest ASCII equivalent.
///
/// Characters with no reasonable ASCII counterpart are dropped.
pub fn transliterate(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if c.is_ascii() {
            out.push(c);
        } else {
            out.push_str(fold_char(c));
        }
    }
    out
}

fn fold_char(c: char) -> &'static str {
    match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' => "a",
        'À' | 'Á' | 'Â' | 'Ã' | 'Ä' | 'Å' => "A",
        'æ' => "ae",
        'Æ' => "Ae",
        'ç' => "c",
        'Ç' => "C",
        'è' | 'é' | 'ê' | 'ë' => "e",
        'È' | 'É' | 'Ê' | 'Ë' => "E",
        'ì' | 'í' | 'î' | 'ï' => "i",
        'Ì' | 'Í' | 'Î' | 'Ï' => "I",
        'ñ' => "n",
        'Ñ' => "N",
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' => "o",
        'Ò' | 'Ó' | 'Ô' | 'Õ' | 'Ö' | 'Ø' => "O",
        'ù' | 'ú' | 'û' | 'ü' => "u",
        'Ù' | 'Ú' | 'Û' | 'Ü' => "U",
        'ý' | 'ÿ' => "y",
        'Ý' => "Y",
        'ß' => "ss",
        'œ' => "oe",
        'Œ' => "Oe",
        'š' => "s",
        'Š' => "S",
        'ž' => "z",
        'Ž' => "Z",
        'ð' => "d",
        'Ð' => "D",
        'þ' => "th",
        'Þ' => "Th",
        '–' | '—' | '‐' | '‑' => "-",
        '‘' | '’' => "'",
        '“' | '”' => "\"",
        '\u{a0}' => " ",
        _ => "",
    }
}

/// Replace filesystem-unsafe characters with underscores and collapse
/// separator runs.
///
/// Whitelist approach: ASCII alphanumerics, `-`, `_` and `.` pass through,
/// everything else becomes a substitute. A run of mixed separators collapses
/// to a single `-` if the run contained one, otherwise to a single `_`.
pub fn sanitize(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut run_dash = false;
    let mut in_run = false;

    for c in s.chars() {
        if c.is_ascii_alphanumeric() || c == '.' {
            if in_run {
                if !out.is_empty() {
                    out.push(if run_dash { '-' } else { '_' });
                }
                in_run = false;
                run_dash = false;
            }
            out.push(c);
        } else {
            in_run = true;
            run_dash |= c == '-';
        }
    }

    out.trim_matches(|c| c == '_' || c == '-' || c == '.').to_string()
}

fn split_tokens(slug: &str) -> impl Iterator<Item = &str> {
    slug.split(['_', '-']).filter(|t| !t.is_empty())
}

fn joined_len(tokens: &[String]) -> usize {
    if tokens.is_empty() {
        return 0;
    }
    tokens.iter().map(String::len).sum::<usize>() + tokens.len() - 1
}

/// Trim tokens one character at a time, longest token first, until the joined
/// slug fits the budget or every token is at the floor.
fn abbreviate_tokens(tokens: &mut [String], budget: usize, floor: usize) {
    let floor = floor.max(1);
    loop {
        if joined_len(tokens) <= budget {
            return;
        }
        let longest = tokens
            .iter()
            .enumerate()
            .filter(|(_, t)| t.len() > floor)
            .max_by_key(|&(i, t)| (t.len(), usize::MAX - i))
            .map(|(i, _)| i);
        match longest {
            Some(i) => {
                let token = &mut tokens[i];
                token.truncate(token.len() - 1);
            }
            None => return,
        }
    }
}

fn fallback_if_empty(slug: String, budget: Option<usize>) -> String {
    if !slug.is_empty() {
        return slug;
    }
    let mut fallback = EMPTY_TITLE_FALLBACK.to_string();
    if let Some(budget) = budget {
        fallback.truncate(budget);
    }
    fallback
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shorten(title: &str, budget: usize) -> String {
        shorten_title(title, Some(budget), &ShorteningRules::default())
    }

    // === Transliteration tests ===

    #[test]
    fn transliterate_folds_french_diacritics() {
        assert_eq!(transliterate("Noël chez l'évêque"), "Noel chez l'eveque");
    }

    #[test]
    fn transliterate_folds_ligatures() {
        assert_eq!(transliterate("cœur"), "coeur");
        assert_eq!(transliterate("Straße"), "Strasse");
    }

    #[test]
    fn transliterate_maps_dashes_and_quotes() {
        assert_eq!(transliterate("a – b’s"), "a - b's");
    }

    #[test]
    fn transliterate_drops_unmappable_chars() {
        assert_eq!(transliterate("Hello 🎙️ 中文 World"), "Hello   World");
    }

    #[test]
    fn transliterate_keeps_ascii_untouched() {
        assert_eq!(transliterate("plain ASCII 123"), "plain ASCII 123");
    }

    // === Sanitization tests ===

    #[test]
    fn sanitize_replaces_unsafe_chars() {
        assert_eq!(sanitize("a:b/c\\d"), "a_b_c_d");
    }

    #[test]
    fn sanitize_replaces_quotes() {
        assert_eq!(sanitize("\"quoted\" 'single'"), "quoted_single");
    }

    #[test]
    fn sanitize_collapses_separator_runs() {
        assert_eq!(sanitize("a  ,  b???c"), "a_b_c");
    }

    #[test]
    fn sanitize_prefers_dash_in_mixed_runs() {
        assert_eq!(sanitize("la ? - Jour"), "la-Jour");
    }

    #[test]
    fn sanitize_keeps_inner_hyphens() {
        assert_eq!(sanitize("es-tu la"), "es-tu_la");
    }

    #[test]
    fn sanitize_trims_leading_trailing_separators() {
        assert_eq!(sanitize("  --hello--  "), "hello");
    }

    #[test]
    fn sanitize_handles_only_unsafe_chars() {
        assert_eq!(sanitize(":::///"), "");
    }

    #[test]
    fn sanitize_handles_newlines_and_tabs() {
        assert_eq!(sanitize("line1\nline2\ttab"), "line1_line2_tab");
    }

    // === Pipeline tests ===

    #[test]
    fn short_titles_pass_through_unshortened() {
        assert_eq!(shorten("Episode 42", 30), "Episode_42");
    }

    #[test]
    fn no_budget_means_no_shortening() {
        let slug = shorten_title(
            "The Quick Brown Fox Jumps Over The Lazy Dog",
            None,
            &ShorteningRules::default(),
        );
        assert_eq!(slug, "The_Quick_Brown_Fox_Jumps_Over_The_Lazy_Dog");
    }

    #[test]
    fn stop_words_removed_only_when_over_budget() {
        // Fits: stop words stay
        assert_eq!(shorten("The Fox and the Dog", 30), "The_Fox_and_the_Dog");
        // Over budget: closed-class words drop out, token order preserved
        assert_eq!(shorten("The Fox and the Dog", 10), "Fox_Dog");
    }

    #[test]
    fn abbreviation_trims_longest_tokens_first() {
        let slug = shorten("Extraordinary Tiny Broadcasting", 20);
        assert!(slug.len() <= 20, "slug too long: {slug}");
        // The short token survives intact; the long ones give up characters
        assert!(slug.contains("Tiny"), "unexpected slug: {slug}");
    }

    #[test]
    fn abbreviation_never_goes_below_floor() {
        let slug = shorten("Amazing Wonderful Spectacular", 11);
        assert_eq!(slug, "Ama_Won_Spe");
    }

    #[test]
    fn hard_truncation_as_last_resort() {
        // Single unabridgeable token longer than the budget
        let slug = shorten("Supercalifragilistic", 8);
        assert_eq!(slug, "Supercal");
    }

    #[test]
    fn truncation_does_not_leave_trailing_separator() {
        let slug = shorten("abc def ghi jkl mno", 8);
        assert!(slug.len() <= 8);
        assert!(!slug.ends_with('_'));
        assert!(!slug.ends_with('-'));
    }

    #[test]
    fn french_advent_title_is_deterministic_and_fits() {
        let title = "Esprit de Noël, es-tu là ? – Jour 23";
        let first = shorten(title, 27);
        let second = shorten(title, 27);

        assert_eq!(first, second);
        assert!(first.is_ascii());
        assert!(first.len() <= 27, "slug too long: {first}");
        assert_eq!(first, "Esprit_Noel_Jour_23");
    }

    #[test]
    fn all_stop_word_title_keeps_its_tokens() {
        let slug = shorten("De la en du et", 10);
        assert!(!slug.is_empty());
        assert!(slug.len() <= 10);
    }

    #[test]
    fn empty_title_falls_back() {
        assert_eq!(shorten("", 27), "episode");
        assert_eq!(shorten(":::", 27), "episode");
    }

    #[test]
    fn fallback_respects_tiny_budget() {
        assert_eq!(shorten("", 3), "epi");
    }

    #[test]
    fn emoji_only_title_falls_back() {
        assert_eq!(shorten("🎙️🎧", 27), "episode");
    }

    #[test]
    fn custom_rules_are_honored() {
        let rules = ShorteningRules::new(["jour"], 3);
        let slug = shorten_title("Esprit de Noël Jour 23", Some(15), &rules);
        assert!(!slug.to_ascii_lowercase().contains("jour"), "{slug}");
    }
}
