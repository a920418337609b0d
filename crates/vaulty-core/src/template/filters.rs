//! Template filters
//!
//! Plain functions over strings and serializable values. The engine wraps
//! each one so a failure is reported as `<filter name> filter: <message>`.

use std::sync::LazyLock;

use aes::Aes256;
use base64::Engine as _;
use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD};
use cbc::cipher::block_padding::Pkcs7;
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Timelike, Utc};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};
use serde::Serialize;
use sha2::{Digest, Sha224, Sha256, Sha384, Sha512};

/// Error message of a failed filter, without the filter name.
pub type FilterResult<T> = std::result::Result<T, String>;

/// Default `hash` algorithm.
pub const DEFAULT_HASH: &str = "sha256";

/// Default `encrypt` / `decrypt` algorithm, the only one supported.
pub const DEFAULT_CIPHER: &str = "aes-256-cbc";

/// Default initialization vector of `encrypt` / `decrypt`, hex encoded.
pub const DEFAULT_IV: &str = "0123456789abcdef0123456789abcdef";

/// Default `formatDate` format.
pub const DEFAULT_DATE_FORMAT: &str = "YYYY-MM-DD HH:mm:ss";

/// Default `json` indentation.
pub const DEFAULT_JSON_INDENT: usize = 2;

/// Characters left alone by `encodeURIComponent`.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

pub fn encode_uri_component(value: &str) -> String {
    utf8_percent_encode(value, URI_COMPONENT).to_string()
}

pub fn decode_uri_component(value: &str) -> FilterResult<String> {
    percent_decode_str(value)
        .decode_utf8()
        .map(|decoded| decoded.into_owned())
        .map_err(|_| "URI malformed".to_string())
}

pub fn base64_encode(value: &str) -> String {
    STANDARD.encode(value.as_bytes())
}

/// Decode base64 text. Padding is optional and whitespace is ignored.
pub fn base64_decode(value: &str) -> FilterResult<String> {
    let compact: String = value.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = STANDARD
        .decode(&compact)
        .or_else(|_| STANDARD_NO_PAD.decode(compact.trim_end_matches('=')))
        .map_err(|e| format!("Invalid base64 input: {e}"))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Hex digest of `value`.
pub fn hash(value: &str, algorithm: &str) -> FilterResult<String> {
    let bytes = value.as_bytes();
    let digest = match algorithm.to_ascii_lowercase().as_str() {
        "sha224" => hex::encode(Sha224::digest(bytes)),
        "sha256" => hex::encode(Sha256::digest(bytes)),
        "sha384" => hex::encode(Sha384::digest(bytes)),
        "sha512" => hex::encode(Sha512::digest(bytes)),
        _ => return Err("Digest method not supported".to_string()),
    };
    Ok(digest)
}

/// Parameters of `encrypt` and `decrypt`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CipherOptions {
    /// Passphrase, hashed with SHA-256 to form the key.
    pub secret: String,
    /// Hex encoded initialization vector.
    pub iv: String,
    pub algorithm: String,
}

impl Default for CipherOptions {
    fn default() -> Self {
        Self {
            secret: String::new(),
            iv: DEFAULT_IV.to_string(),
            algorithm: DEFAULT_CIPHER.to_string(),
        }
    }
}

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

impl CipherOptions {
    fn key_and_iv(&self) -> FilterResult<([u8; 32], Vec<u8>)> {
        if !self.algorithm.eq_ignore_ascii_case(DEFAULT_CIPHER) {
            return Err(format!("Unsupported algorithm \"{}\"", self.algorithm));
        }
        let iv = hex::decode(&self.iv)
            .ok()
            .filter(|iv| iv.len() == 16)
            .ok_or_else(|| "Invalid initialization vector".to_string())?;
        Ok((Sha256::digest(self.secret.as_bytes()).into(), iv))
    }
}

/// Encrypt `value`, returning hex.
pub fn encrypt(value: &str, options: &CipherOptions) -> FilterResult<String> {
    let (key, iv) = options.key_and_iv()?;
    let cipher = Aes256CbcEnc::new_from_slices(&key, &iv).map_err(|e| e.to_string())?;
    Ok(hex::encode(
        cipher.encrypt_padded_vec_mut::<Pkcs7>(value.as_bytes()),
    ))
}

/// Decrypt hex produced by [`encrypt`] with the same options.
pub fn decrypt(value: &str, options: &CipherOptions) -> FilterResult<String> {
    let (key, iv) = options.key_and_iv()?;
    let encrypted = hex::decode(value.trim()).map_err(|_| "Invalid hex input".to_string())?;
    let cipher = Aes256CbcDec::new_from_slices(&key, &iv).map_err(|e| e.to_string())?;
    let decrypted = cipher
        .decrypt_padded_vec_mut::<Pkcs7>(&encrypted)
        .map_err(|_| "bad decrypt".to_string())?;
    Ok(String::from_utf8_lossy(&decrypted).into_owned())
}

/// Input of `formatDate`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateInput<'a> {
    /// Current time, used when the template value is undefined.
    Now,
    /// Milliseconds since the Unix epoch.
    Millis(i64),
    Text(&'a str),
}

/// Resolve a date input to a UTC instant.
pub fn parse_date(input: DateInput<'_>) -> FilterResult<DateTime<Utc>> {
    let invalid = || "Invalid Date".to_string();
    match input {
        DateInput::Now => Ok(Utc::now()),
        DateInput::Millis(millis) => DateTime::from_timestamp_millis(millis).ok_or_else(invalid),
        DateInput::Text(text) => parse_date_text(text.trim()).ok_or_else(invalid),
    }
}

fn parse_date_text(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(parsed.with_timezone(&Utc));
    }
    const NAIVE_FORMATS: &[&str] = &[
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
    ];
    if let Some(naive) = NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
    {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

const MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

const WEEKDAYS: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

/// Format tokens, longest first so `MMMM` wins over `MM`.
static DATE_TOKENS: LazyLock<Vec<&'static str>> = LazyLock::new(|| {
    let mut tokens = vec![
        "YYYY", "YY", "MMMM", "MMM", "MM", "M", "DD", "D", "dddd", "ddd", "dd", "d", "HH", "H",
        "hh", "h", "mm", "m", "ss", "s", "SSS", "A", "a", "ZZ", "Z",
    ];
    tokens.sort_by_key(|token| std::cmp::Reverse(token.len()));
    tokens
});

fn render_token(token: &str, date: &DateTime<Utc>) -> String {
    let hour12 = match date.hour() % 12 {
        0 => 12,
        hour => hour,
    };
    let weekday = date.weekday().num_days_from_sunday() as usize;
    let month = date.month0() as usize;
    match token {
        "YYYY" => format!("{:04}", date.year()),
        "YY" => format!("{:02}", date.year().rem_euclid(100)),
        "MMMM" => MONTHS[month].to_string(),
        "MMM" => MONTHS[month][..3].to_string(),
        "MM" => format!("{:02}", date.month()),
        "M" => date.month().to_string(),
        "DD" => format!("{:02}", date.day()),
        "D" => date.day().to_string(),
        "dddd" => WEEKDAYS[weekday].to_string(),
        "ddd" => WEEKDAYS[weekday][..3].to_string(),
        "dd" => WEEKDAYS[weekday][..2].to_string(),
        "d" => weekday.to_string(),
        "HH" => format!("{:02}", date.hour()),
        "H" => date.hour().to_string(),
        "hh" => format!("{hour12:02}"),
        "h" => hour12.to_string(),
        "mm" => format!("{:02}", date.minute()),
        "m" => date.minute().to_string(),
        "ss" => format!("{:02}", date.second()),
        "s" => date.second().to_string(),
        "SSS" => format!("{:03}", date.timestamp_subsec_millis()),
        "A" => (if date.hour() < 12 { "AM" } else { "PM" }).to_string(),
        "a" => (if date.hour() < 12 { "am" } else { "pm" }).to_string(),
        "ZZ" => "+0000".to_string(),
        "Z" => "+00:00".to_string(),
        _ => token.to_string(),
    }
}

/// Format `date` with dayjs-style tokens. Text in `[brackets]` is copied.
pub fn format_datetime(date: &DateTime<Utc>, format: &str) -> String {
    let mut out = String::with_capacity(format.len() + 8);
    let mut rest = format;

    while let Some(c) = rest.chars().next() {
        if c == '[' {
            if let Some(end) = rest.find(']') {
                out.push_str(&rest[1..end]);
                rest = &rest[end + 1..];
                continue;
            }
        }
        if let Some(token) = DATE_TOKENS.iter().find(|token| rest.starts_with(**token)) {
            out.push_str(&render_token(token, date));
            rest = &rest[token.len()..];
            continue;
        }
        out.push(c);
        rest = &rest[c.len_utf8()..];
    }
    out
}

pub fn format_date(input: DateInput<'_>, format: &str) -> FilterResult<String> {
    Ok(format_datetime(&parse_date(input)?, format))
}

/// JSON text indented by `indent` spaces; `0` is compact.
pub fn to_json<T: Serialize + ?Sized>(value: &T, indent: usize) -> FilterResult<String> {
    let mut buf = Vec::new();
    if indent == 0 {
        serde_json::to_writer(&mut buf, value).map_err(|e| e.to_string())?;
    } else {
        let indent = " ".repeat(indent);
        let formatter = serde_json::ser::PrettyFormatter::with_indent(indent.as_bytes());
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
        value
            .serialize(&mut serializer)
            .map_err(|e| e.to_string())?;
    }
    String::from_utf8(buf).map_err(|e| e.to_string())
}

pub fn to_yaml<T: Serialize + ?Sized>(value: &T) -> FilterResult<String> {
    serde_yaml::to_string(value).map_err(|e| e.to_string())
}

/// `key=value` lines. Values are written as-is, without quoting.
pub fn key_value<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> String
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    pairs
        .into_iter()
        .map(|(key, value)| format!("{}={}", key.as_ref(), value.as_ref()))
        .collect::<Vec<_>>()
        .join("\n")
}
