//! Remote-safe file names
//!
//! Turns arbitrary text (mail subjects, user-typed file names) into a string
//! SharePoint accepts as a path segment:
//!
//! - links and characters SharePoint rejects are removed
//! - line breaks, ampersands and runs of periods are rewritten
//! - reserved device and system names get a random numeric suffix
//!
//! The result can then be percent-encoded per RFC 3986 for use in a URL.

mod suffix;


use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use regex::Regex;
use std::fmt;
use std::sync::{Arc, OnceLock};

pub use suffix::{RandomSuffix, SeededSuffix, SuffixSource, SUFFIX_BOUND};

/// Characters SharePoint does not allow in a file name
pub const FORBIDDEN_CHARS: &[char] = &['"', '{', '}', '*', ':', '<', '>', '?', '/', '%', '+', '|'];

/// Names SharePoint refuses regardless of their characters
pub const RESERVED_NAMES: &[&str] = &[
    ".lock",
    "CON",
    "PRN",
    "AUX",
    "NUL",
    "_vti_",
    "desktop.ini",
    "COM0",
    "COM1",
    "COM2",
    "COM3",
    "COM4",
    "COM5",
    "COM6",
    "COM7",
    "COM8",
    "COM9",
    "LPT0",
    "LPT1",
    "LPT2",
    "LPT3",
    "LPT4",
    "LPT5",
    "LPT6",
    "LPT7",
    "LPT8",
    "LPT9",
];

/// Marker that makes any name containing it reserved
const VTI_MARKER: &str = "_vti_";

/// Unreserved characters of RFC 3986 plus `*`, which URI-component
/// encoding leaves alone. `! ' ( )` are escaped.
const COMPONENT_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b'*');

fn link_regex() -> &'static Regex {
    static LINK_REGEX: OnceLock<Regex> = OnceLock::new();
    LINK_REGEX.get_or_init(|| Regex::new(r"https?://[^ ~]*").expect("valid link pattern"))
}

fn period_run_regex() -> &'static Regex {
    static PERIOD_RUN_REGEX: OnceLock<Regex> = OnceLock::new();
    PERIOD_RUN_REGEX.get_or_init(|| Regex::new(r"\.{2,}").expect("valid period pattern"))
}

fn whitespace_run_regex() -> &'static Regex {
    static WHITESPACE_RUN_REGEX: OnceLock<Regex> = OnceLock::new();
    WHITESPACE_RUN_REGEX.get_or_init(|| Regex::new(r"\s+").expect("valid whitespace pattern"))
}

/// Remove every `http://` or `https://` link, up to the next space or tilde
pub fn strip_links(text: &str) -> String {
    link_regex().replace_all(text, "").into_owned()
}

/// Character cleanup part of [`NameNormalizer::normalize`], without the
/// reserved-name step
pub fn clean(text: &str) -> String {
    let without_links = strip_links(text);

    let mut out = String::with_capacity(without_links.len());
    for c in without_links.chars() {
        match c {
            c if FORBIDDEN_CHARS.contains(&c) => {}
            '\r' | '\t' => {}
            '\n' => out.push_str(" - "),
            '&' => out.push_str("and"),
            c => out.push(c),
        }
    }

    // Only the first run is collapsed
    let collapsed = period_run_regex().replacen(&out, 1, ".");

    let out: &str = &collapsed;
    let out = out.strip_prefix('~').unwrap_or(out);
    // One period at most: the leading one, else the trailing one
    let out = out
        .strip_prefix('.')
        .or_else(|| out.strip_suffix('.'))
        .unwrap_or(out);

    // Only the first run is collapsed
    let out = whitespace_run_regex().replacen(out, 1, " ");

    out.trim().to_string()
}

/// Percent-encode a URI component, also escaping `! ' ( )`
pub fn percent_encode(text: &str) -> String {
    utf8_percent_encode(text, COMPONENT_ENCODE_SET).to_string()
}

/// Reverse of [`percent_encode`]; invalid UTF-8 is replaced lossily
pub fn percent_decode(text: &str) -> String {
    percent_decode_str(text).decode_utf8_lossy().into_owned()
}

/// Name normalization with a pluggable suffix source
#[derive(Clone)]
pub struct NameNormalizer {
    suffix: Arc<dyn SuffixSource>,
}

impl fmt::Debug for NameNormalizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NameNormalizer").finish_non_exhaustive()
    }
}

impl Default for NameNormalizer {
    fn default() -> Self {
        Self::new(Arc::new(RandomSuffix))
    }
}

impl NameNormalizer {
    /// Create a normalizer drawing reserved-name suffixes from `suffix`
    pub fn new(suffix: Arc<dyn SuffixSource>) -> Self {
        Self { suffix }
    }

    /// Make `text` safe as a SharePoint file name
    pub fn normalize(&self, text: &str) -> String {
        self.resolve_reserved_name(&clean(text))
    }

    /// Replace reserved names.
    ///
    /// Anything containing `_vti_` becomes `vti<n>`; an exact reserved name
    /// gets `<n>` appended. `n` is drawn fresh on every call.
    pub fn resolve_reserved_name(&self, name: &str) -> String {
        if name.contains(VTI_MARKER) {
            return format!("vti{}", self.suffix.next_suffix());
        }
        if RESERVED_NAMES.contains(&name) {
            return format!("{}{}", name, self.suffix.next_suffix());
        }
        name.to_string()
    }

    /// Normalize, then percent-encode for a URL path segment
    pub fn encode(&self, text: &str) -> String {
        percent_encode(&self.normalize(text))
    }

    /// Percent-decode, then normalize
    pub fn decode(&self, text: &str) -> String {
        self.normalize(&percent_decode(text))
    }
}

/// [`NameNormalizer::normalize`] with random suffixes
pub fn normalize(text: &str) -> String {
    NameNormalizer::default().normalize(text)
}

/// [`NameNormalizer::resolve_reserved_name`] with random suffixes
pub fn resolve_reserved_name(name: &str) -> String {
    NameNormalizer::default().resolve_reserved_name(name)
}

/// [`NameNormalizer::encode`] with random suffixes
pub fn encode(text: &str) -> String {
    NameNormalizer::default().encode(text)
}

/// [`NameNormalizer::decode`] with random suffixes
pub fn decode(text: &str) -> String {
    NameNormalizer::default().decode(text)
}
