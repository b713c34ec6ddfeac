//! Human-readable names for resources, and URL component escaping.
//!
//! Menu labels and notification messages fall back to a friendly form of the
//! resource name when no translation exists: `"blog_posts"` becomes
//! `"Blog posts"` in plural position and `"Blog post"` in singular position.

use convert_case::{Case, Casing};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};

/// Grammatical number for [`user_friendly_resource_name`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Plurality {
    /// "Post"
    Singular,
    /// "Posts"
    Plural,
}

const UNCOUNTABLE: &[&str] = &[
    "data",
    "equipment",
    "feedback",
    "fish",
    "information",
    "media",
    "metadata",
    "money",
    "news",
    "rice",
    "series",
    "sheep",
    "species",
    "staff",
];

const IRREGULAR: &[(&str, &str)] = &[
    ("child", "children"),
    ("foot", "feet"),
    ("goose", "geese"),
    ("man", "men"),
    ("mouse", "mice"),
    ("ox", "oxen"),
    ("person", "people"),
    ("tooth", "teeth"),
    ("woman", "women"),
    ("movie", "movies"),
];

/// Turn an identifier into a sentence-cased label: `"blogPosts"` and
/// `"blog-posts"` both become `"Blog posts"`.
pub fn humanize(name: &str) -> String {
    capitalize(&name.to_case(Case::Lower))
}

/// Plural form of the last word of `word`. Already-plural words are kept.
pub fn pluralize(word: &str) -> String {
    inflect(word, pluralize_lower)
}

/// Singular form of the last word of `word`.
pub fn singularize(word: &str) -> String {
    inflect(word, singularize_lower)
}

/// Friendly label for a resource name.
pub fn user_friendly_resource_name(name: &str, plurality: Plurality) -> String {
    let inflected = match plurality {
        Plurality::Singular => singularize(name),
        Plurality::Plural => pluralize(name),
    };
    humanize(&inflected)
}

fn inflect(word: &str, rule: fn(&str) -> String) -> String {
    let split = word
        .rfind(|c: char| !c.is_alphabetic())
        .map(|idx| idx + word[idx..].chars().next().map_or(1, char::len_utf8))
        .unwrap_or(0);
    let (head, tail) = word.split_at(split);
    if tail.is_empty() {
        return word.to_string();
    }
    format!("{head}{}", restore_case(tail, &rule(&tail.to_lowercase())))
}

fn restore_case(original: &str, inflected: &str) -> String {
    if original.chars().all(|c| c.is_uppercase()) && original.chars().count() > 1 {
        inflected.to_uppercase()
    } else if original.chars().next().is_some_and(char::is_uppercase) {
        capitalize(inflected)
    } else {
        inflected.to_string()
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn is_vowel(c: char) -> bool {
    matches!(c, 'a' | 'e' | 'i' | 'o' | 'u')
}

fn char_before(word: &str, suffix_len: usize) -> Option<char> {
    word[..word.len() - suffix_len].chars().last()
}

fn pluralize_lower(word: &str) -> String {
    if UNCOUNTABLE.contains(&word) {
        return word.to_string();
    }
    if let Some((_, plural)) = IRREGULAR.iter().find(|(singular, _)| *singular == word) {
        return (*plural).to_string();
    }
    if IRREGULAR.iter().any(|(_, plural)| *plural == word) {
        return word.to_string();
    }

    if ["ss", "x", "ch", "sh", "zz"].iter().any(|s| word.ends_with(s)) {
        return format!("{word}es");
    }
    if word.ends_with('y') && char_before(word, 1).is_some_and(|c| !is_vowel(c)) {
        return format!("{}ies", &word[..word.len() - 1]);
    }
    if word.ends_with("fe") && char_before(word, 2).is_some_and(|c| c != 'f') {
        return format!("{}ves", &word[..word.len() - 2]);
    }
    if (word.ends_with("lf") || word.ends_with("rf")) && word.len() > 2 {
        return format!("{}ves", &word[..word.len() - 1]);
    }
    if word.ends_with("us") && char_before(word, 2).is_some_and(|c| !matches!(c, 'a' | 'o' | 'u')) {
        return format!("{word}es");
    }
    if word.ends_with('s') {
        return word.to_string();
    }
    format!("{word}s")
}

fn singularize_lower(word: &str) -> String {
    if UNCOUNTABLE.contains(&word) {
        return word.to_string();
    }
    if let Some((singular, _)) = IRREGULAR.iter().find(|(_, plural)| *plural == word) {
        return (*singular).to_string();
    }
    if IRREGULAR.iter().any(|(singular, _)| *singular == word) {
        return word.to_string();
    }

    if word.ends_with("ies") && word.len() > 3 {
        return format!("{}y", &word[..word.len() - 3]);
    }
    if word.ends_with("ves") {
        match char_before(word, 3) {
            Some('l') | Some('r') => return format!("{}f", &word[..word.len() - 3]),
            Some(c) if c != 'f' && c != 'o' => return format!("{}fe", &word[..word.len() - 3]),
            _ => {}
        }
    }
    if ["sses", "xes", "ches", "shes", "zzes"]
        .iter()
        .any(|s| word.ends_with(s))
    {
        return word[..word.len() - 2].to_string();
    }
    if word.ends_with("uses") && char_before(word, 4).is_some_and(|c| !matches!(c, 'a' | 'o' | 'u'))
    {
        return word[..word.len() - 2].to_string();
    }
    if word.ends_with("ss") || word.ends_with("us") || word.ends_with("is") {
        return word.to_string();
    }
    if let Some(stem) = word.strip_suffix('s') {
        return stem.to_string();
    }
    word.to_string()
}

/// Bytes `encodeURIComponent` escapes: everything but ASCII alphanumerics
/// and `-_.!~*'()`.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Escape a URL component the way browsers' `encodeURIComponent` does.
pub fn percent_encode(input: &str) -> String {
    utf8_percent_encode(input, COMPONENT).to_string()
}

/// Reverse [`percent_encode`]; `+` decodes to a space as in form encoding.
/// Malformed escapes are kept verbatim.
pub fn percent_decode(input: &str) -> String {
    percent_decode_str(&input.replace('+', " "))
        .decode_utf8_lossy()
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_humanize() {
        assert_eq!(humanize("posts"), "Posts");
        assert_eq!(humanize("blog_posts"), "Blog posts");
        assert_eq!(humanize("blog-posts"), "Blog posts");
        assert_eq!(humanize("blogPosts"), "Blog posts");
        assert_eq!(humanize(""), "");
    }

    #[test]
    fn test_pluralize() {
        assert_eq!(pluralize("post"), "posts");
        assert_eq!(pluralize("posts"), "posts");
        assert_eq!(pluralize("category"), "categories");
        assert_eq!(pluralize("day"), "days");
        assert_eq!(pluralize("box"), "boxes");
        assert_eq!(pluralize("status"), "statuses");
        assert_eq!(pluralize("knife"), "knives");
        assert_eq!(pluralize("person"), "people");
        assert_eq!(pluralize("people"), "people");
        assert_eq!(pluralize("news"), "news");
        assert_eq!(pluralize("blog_post"), "blog_posts");
        assert_eq!(pluralize("User"), "Users");
    }

    #[test]
    fn test_singularize() {
        assert_eq!(singularize("posts"), "post");
        assert_eq!(singularize("post"), "post");
        assert_eq!(singularize("categories"), "category");
        assert_eq!(singularize("boxes"), "box");
        assert_eq!(singularize("statuses"), "status");
        assert_eq!(singularize("status"), "status");
        assert_eq!(singularize("wolves"), "wolf");
        assert_eq!(singularize("knives"), "knife");
        assert_eq!(singularize("people"), "person");
        assert_eq!(singularize("movies"), "movie");
        assert_eq!(singularize("blog_posts"), "blog_post");
    }

    #[test]
    fn test_user_friendly_resource_name() {
        assert_eq!(user_friendly_resource_name("posts", Plurality::Plural), "Posts");
        assert_eq!(user_friendly_resource_name("posts", Plurality::Singular), "Post");
        assert_eq!(
            user_friendly_resource_name("blog_category", Plurality::Plural),
            "Blog categories"
        );
        assert_eq!(
            user_friendly_resource_name("blog_categories", Plurality::Singular),
            "Blog category"
        );
    }

    #[test]
    fn test_percent_encode() {
        assert_eq!(percent_encode("/posts?page=2"), "%2Fposts%3Fpage%3D2");
        assert_eq!(percent_encode("a-b_c.d~"), "a-b_c.d~");
        assert_eq!(percent_encode("!*'() +&"), "!*'()%20%2B%26");
        assert_eq!(percent_encode("é"), "%C3%A9");
    }

    #[test]
    fn test_percent_decode() {
        assert_eq!(percent_decode("%2Fposts%3Fpage%3D2"), "/posts?page=2");
        assert_eq!(percent_decode("a+b"), "a b");
        assert_eq!(percent_decode("%C3%A9"), "é");
        assert_eq!(percent_decode("100%"), "100%");
        assert_eq!(percent_decode("%zz"), "%zz");
    }
}
