use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref EXTENSION: Regex = Regex::new(r"\.[^./]+$").unwrap();
    static ref SEPARATORS: Regex = Regex::new(r"[-_.\s]+").unwrap();
}

/// Turns an audio file name into a button label:
/// `"hit_him-loud.mp3"` becomes `"Hit Him Loud"`.
pub fn label_from_filename(file_name: &str) -> String {
    let stem = EXTENSION.replace(file_name, "");
    SEPARATORS
        .split(&stem)
        .filter(|word| !word.is_empty())
        .map(title_case_word)
        .collect::<Vec<_>>()
        .join(" ")
}

fn title_case_word(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
