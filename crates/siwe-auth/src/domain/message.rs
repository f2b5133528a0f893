//! # Sign-In Message Parsing
//!
//! Line-oriented parser for the EIP-4361 message template:
//!
//! ```text
//! ${domain} wants you to sign in with your Ethereum account:
//! ${address}
//!
//! ${statement}
//!
//! URI: ${uri}
//! Version: ${version}
//! Chain ID: ${chain-id}
//! Nonce: ${nonce}
//! Issued At: ${issued-at}
//! Expiration Time: ${expiration-time}
//! Not Before: ${not-before}
//! Request ID: ${request-id}
//! Resources:
//! - ${resources[0]}
//! ```
//!
//! The parser is pure and never panics: every malformed input maps to
//! [`AuthError::MalformedMessage`] or [`AuthError::UnsupportedVersion`].
//! Labeled fields may appear in any order; unknown labels are ignored.

use super::entities::{Address, AuthenticationClaim, MessageVersion};
use super::errors::AuthError;
use chrono::{DateTime, Datelike, SecondsFormat, Utc};
use std::fmt;
use std::str::FromStr;

/// Default upper bound on the raw message size.
pub const DEFAULT_MAX_MESSAGE_BYTES: usize = 16 * 1024;

const HEADER_SUFFIX: &str = " wants you to sign in with your Ethereum account:";
const HEADER_SUFFIX_CHAIN_NEUTRAL: &str = " wants you to sign in with your account:";

const URI_TAG: &str = "URI";
const VERSION_TAG: &str = "Version";
const CHAIN_ID_TAG: &str = "Chain ID";
const NONCE_TAG: &str = "Nonce";
const ISSUED_AT_TAG: &str = "Issued At";
const EXPIRATION_TIME_TAG: &str = "Expiration Time";
const NOT_BEFORE_TAG: &str = "Not Before";
const REQUEST_ID_TAG: &str = "Request ID";
const RESOURCES_LINE: &str = "Resources:";

const KNOWN_TAGS: [&str; 8] = [
    URI_TAG,
    VERSION_TAG,
    CHAIN_ID_TAG,
    NONCE_TAG,
    ISSUED_AT_TAG,
    EXPIRATION_TIME_TAG,
    NOT_BEFORE_TAG,
    REQUEST_ID_TAG,
];

/// Parse a raw signed message, rejecting anything over [`DEFAULT_MAX_MESSAGE_BYTES`].
pub fn parse_message(raw: &str) -> Result<AuthenticationClaim, AuthError> {
    parse_message_with_limit(raw, DEFAULT_MAX_MESSAGE_BYTES)
}

/// Parse a raw signed message with an explicit size limit.
pub fn parse_message_with_limit(
    raw: &str,
    max_bytes: usize,
) -> Result<AuthenticationClaim, AuthError> {
    if raw.len() > max_bytes {
        return Err(AuthError::malformed(format!(
            "message is {} bytes, limit is {}",
            raw.len(),
            max_bytes
        )));
    }

    let mut lines = raw.lines();

    // Header and address
    let header = lines
        .next()
        .ok_or_else(|| AuthError::malformed("empty message"))?;
    let domain = parse_header(header)?;

    let address: Address = lines
        .next()
        .ok_or_else(|| AuthError::malformed("missing address line"))?
        .parse()?;

    if lines.next() != Some("") {
        return Err(AuthError::malformed("expected a blank line after the address"));
    }

    let rest: Vec<&str> = lines.collect();
    let mut idx = 0;

    // Optional statement
    let mut statement = None;
    if let Some(first) = rest.first() {
        if first.is_empty() {
            // Older template: an empty statement slot
            idx = 1;
        } else if !is_field_line(first) && rest.get(1) == Some(&"") {
            statement = Some((*first).to_string());
            idx = 2;
        }
    }

    let mut fields = FieldBlock::default();
    while idx < rest.len() {
        let line = rest[idx];
        idx += 1;

        if line.is_empty() {
            continue;
        }

        if line == RESOURCES_LINE {
            if fields.resources.is_some() {
                return Err(duplicate(RESOURCES_LINE));
            }
            let mut resources = Vec::new();
            while let Some(item) = rest.get(idx).and_then(|l| l.strip_prefix("- ")) {
                resources.push(parse_uri(item, "resource")?);
                idx += 1;
            }
            fields.resources = Some(resources);
            continue;
        }

        let (tag, value) = line
            .split_once(": ")
            .ok_or_else(|| AuthError::malformed(format!("unexpected line: {line:?}")))?;

        match tag {
            URI_TAG => set_once(&mut fields.uri, parse_uri(value, "URI")?, tag)?,
            VERSION_TAG => set_once(&mut fields.version, value.parse::<MessageVersion>()?, tag)?,
            CHAIN_ID_TAG => set_once(&mut fields.chain_id, parse_chain_id(value)?, tag)?,
            NONCE_TAG => set_once(&mut fields.nonce, parse_nonce(value)?, tag)?,
            ISSUED_AT_TAG => set_once(&mut fields.issued_at, parse_timestamp(value, tag)?, tag)?,
            EXPIRATION_TIME_TAG => {
                set_once(&mut fields.expiration_time, parse_timestamp(value, tag)?, tag)?
            }
            NOT_BEFORE_TAG => set_once(&mut fields.not_before, parse_timestamp(value, tag)?, tag)?,
            REQUEST_ID_TAG => set_once(&mut fields.request_id, value.to_string(), tag)?,
            _ => {}
        }
    }

    Ok(AuthenticationClaim {
        domain,
        address,
        statement,
        uri: required(fields.uri, URI_TAG)?,
        version: required(fields.version, VERSION_TAG)?,
        chain_id: required(fields.chain_id, CHAIN_ID_TAG)?,
        nonce: required(fields.nonce, NONCE_TAG)?,
        issued_at: required(fields.issued_at, ISSUED_AT_TAG)?,
        expiration_time: fields.expiration_time,
        not_before: fields.not_before,
        request_id: fields.request_id,
        resources: fields.resources.unwrap_or_default(),
    })
}

#[derive(Default)]
struct FieldBlock {
    uri: Option<String>,
    version: Option<MessageVersion>,
    chain_id: Option<u64>,
    nonce: Option<String>,
    issued_at: Option<DateTime<Utc>>,
    expiration_time: Option<DateTime<Utc>>,
    not_before: Option<DateTime<Utc>>,
    request_id: Option<String>,
    resources: Option<Vec<String>>,
}

fn parse_header(header: &str) -> Result<String, AuthError> {
    let domain = header
        .strip_suffix(HEADER_SUFFIX)
        .or_else(|| header.strip_suffix(HEADER_SUFFIX_CHAIN_NEUTRAL))
        .ok_or_else(|| AuthError::malformed("missing sign-in header"))?;

    if domain.is_empty() || domain.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(AuthError::malformed("invalid domain"));
    }
    Ok(domain.to_string())
}

fn is_field_line(line: &str) -> bool {
    line == RESOURCES_LINE
        || line
            .split_once(": ")
            .is_some_and(|(tag, _)| KNOWN_TAGS.contains(&tag))
}

fn set_once<T>(slot: &mut Option<T>, value: T, tag: &str) -> Result<(), AuthError> {
    if slot.is_some() {
        return Err(duplicate(tag));
    }
    *slot = Some(value);
    Ok(())
}

fn required<T>(slot: Option<T>, tag: &str) -> Result<T, AuthError> {
    slot.ok_or_else(|| AuthError::malformed(format!("missing {tag} field")))
}

fn duplicate(tag: &str) -> AuthError {
    AuthError::malformed(format!("duplicate {tag} field"))
}

/// Validate an absolute URI. The original text is kept verbatim so the
/// claim echoes exactly what was signed.
fn parse_uri(value: &str, what: &str) -> Result<String, AuthError> {
    url::Url::parse(value)
        .map(|_| value.to_string())
        .map_err(|e| AuthError::malformed(format!("invalid {what} {value:?}: {e}")))
}

fn parse_chain_id(value: &str) -> Result<u64, AuthError> {
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AuthError::malformed("Chain ID must be a decimal integer"));
    }
    value
        .parse()
        .map_err(|_| AuthError::malformed("Chain ID out of range"))
}

fn parse_nonce(value: &str) -> Result<String, AuthError> {
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_alphanumeric()) {
        return Err(AuthError::malformed("Nonce must be alphanumeric"));
    }
    Ok(value.to_string())
}

/// Parse and normalize to UTC. The UTC year must stay within 0000-9999 so the
/// rendered form is itself valid RFC 3339.
fn parse_timestamp(value: &str, tag: &str) -> Result<DateTime<Utc>, AuthError> {
    let ts = DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| AuthError::malformed(format!("{tag} is not RFC 3339: {e}")))?;
    if !(0..=9999).contains(&ts.year()) {
        return Err(AuthError::malformed(format!(
            "{tag} falls outside years 0000-9999 in UTC"
        )));
    }
    Ok(ts)
}

fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

impl FromStr for AuthenticationClaim {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_message(s)
    }
}

/// Renders the canonical message text for this claim.
impl fmt::Display for AuthenticationClaim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}\n{}\n\n", self.domain, HEADER_SUFFIX, self.address)?;
        if let Some(statement) = &self.statement {
            writeln!(f, "{statement}\n")?;
        }
        writeln!(f, "{URI_TAG}: {}", self.uri)?;
        writeln!(f, "{VERSION_TAG}: {}", self.version.as_str())?;
        writeln!(f, "{CHAIN_ID_TAG}: {}", self.chain_id)?;
        writeln!(f, "{NONCE_TAG}: {}", self.nonce)?;
        write!(f, "{ISSUED_AT_TAG}: {}", format_timestamp(&self.issued_at))?;
        if let Some(ts) = &self.expiration_time {
            write!(f, "\n{EXPIRATION_TIME_TAG}: {}", format_timestamp(ts))?;
        }
        if let Some(ts) = &self.not_before {
            write!(f, "\n{NOT_BEFORE_TAG}: {}", format_timestamp(ts))?;
        }
        if let Some(id) = &self.request_id {
            write!(f, "\n{REQUEST_ID_TAG}: {id}")?;
        }
        if !self.resources.is_empty() {
            write!(f, "\n{RESOURCES_LINE}")?;
            for resource in &self.resources {
                write!(f, "\n- {resource}")?;
            }
        }
        Ok(())
    }
}
