//! Connection string normalization
//!
//! The deployment hands us an ADO.NET style connection string
//! (`Server=...;Initial Catalog=...;User ID=...;Encrypt=True`). The ODBC
//! driver wants its own key names and `yes`/`no` flags, plus a `Driver`
//! clause. Rather than rewriting the text, the raw string is parsed into a
//! [`ConnectionConfig`] and rendered back out by [`ConnectionConfig::to_odbc`].

use crate::error::{DbError, Result};
use secrecy::{ExposeSecret, SecretString};
use std::fmt;

/// Driver used when the configuration does not name one.
pub const DEFAULT_ODBC_DRIVER: &str = "ODBC Driver 18 for SQL Server";

/// Replaces password values in anything that gets logged.
pub const PASSWORD_MASK: &str = "********";

/// How the connection authenticates.
#[derive(Debug)]
pub enum Authentication {
    /// Nothing in the string; the driver decides
    Unspecified,
    /// Windows / Kerberos integrated authentication
    Integrated,
    /// SQL login
    SqlLogin {
        user: String,
        password: Option<SecretString>,
    },
}

/// A boolean connection flag.
///
/// Values that are not recognizably boolean (`Encrypt=strict`) are carried
/// through unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Flag {
    Bool(bool),
    Other(String),
}

impl Flag {
    fn parse(value: &str) -> Self {
        match parse_bool(value) {
            Some(b) => Flag::Bool(b),
            None => Flag::Other(value.to_string()),
        }
    }

    fn render(&self) -> &str {
        match self {
            Flag::Bool(true) => "yes",
            Flag::Bool(false) => "no",
            Flag::Other(raw) => raw,
        }
    }
}

/// Structured form of a SQL Server connection string.
#[derive(Debug)]
pub struct ConnectionConfig {
    pub server: String,
    pub database: String,
    pub auth: Authentication,
    pub encrypt: Option<Flag>,
    pub trust_server_certificate: Option<Flag>,
    /// Any other `key=value` pair, in input order
    pub extra: Vec<(String, String)>,
}

/// Recognized keys, after alias resolution.
enum Key {
    Server,
    Database,
    User,
    Password,
    Encrypt,
    TrustServerCertificate,
    Integrated,
    Driver,
    Other,
}

impl Key {
    fn classify(key: &str) -> Self {
        match key.to_ascii_lowercase().as_str() {
            "server" | "data source" | "address" | "addr" | "network address" => Key::Server,
            "database" | "initial catalog" => Key::Database,
            "user id" | "uid" | "user" => Key::User,
            "password" | "pwd" => Key::Password,
            "encrypt" => Key::Encrypt,
            "trustservercertificate" | "trust server certificate" => Key::TrustServerCertificate,
            "integrated security" | "trusted_connection" => Key::Integrated,
            "driver" => Key::Driver,
            _ => Key::Other,
        }
    }
}

impl ConnectionConfig {
    /// Parse a connection string.
    ///
    /// Keys are matched case-insensitively and the usual ADO.NET aliases are
    /// accepted. A repeated key keeps its last value. Any `Driver` clause is
    /// discarded; rendering adds its own.
    pub fn parse(raw: &str) -> Result<Self> {
        if raw.trim().is_empty() {
            return Err(DbError::config("Connection string cannot be empty"));
        }

        let mut server = None;
        let mut database = None;
        let mut user = None;
        let mut password = None;
        let mut integrated = false;
        let mut encrypt = None;
        let mut trust_server_certificate = None;
        let mut extra: Vec<(String, String)> = Vec::new();

        for (key, value) in split_pairs(raw)? {
            match Key::classify(&key) {
                Key::Server => server = Some(value),
                Key::Database => database = Some(value),
                Key::User => user = Some(value),
                Key::Password => password = Some(SecretString::from(value)),
                Key::Encrypt => encrypt = Some(Flag::parse(&value)),
                Key::TrustServerCertificate => trust_server_certificate = Some(Flag::parse(&value)),
                Key::Integrated => {
                    integrated =
                        value.eq_ignore_ascii_case("sspi") || parse_bool(&value) == Some(true)
                }
                Key::Driver => {}
                Key::Other => {
                    extra.retain(|(k, _)| !k.eq_ignore_ascii_case(&key));
                    extra.push((key, value));
                }
            }
        }

        let server = server
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| DbError::config("Connection string is missing a Server"))?;
        let database = database
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| DbError::config("Connection string is missing a Database"))?;

        let auth = match (integrated, user, password) {
            (true, _, _) => Authentication::Integrated,
            (false, Some(user), password) => Authentication::SqlLogin { user, password },
            (false, None, Some(_)) => {
                return Err(DbError::config(
                    "Connection string has a Password but no User ID",
                ));
            }
            (false, None, None) => Authentication::Unspecified,
        };

        Ok(Self {
            server,
            database,
            auth,
            encrypt,
            trust_server_certificate,
            extra,
        })
    }

    /// Render the ODBC connection string for `driver`.
    pub fn to_odbc(&self, driver: &str) -> NormalizedConnectionConfig {
        NormalizedConnectionConfig {
            value: SecretString::from(self.render(driver, false)),
            masked: self.render(driver, true),
        }
    }

    fn render(&self, driver: &str, mask_password: bool) -> String {
        let mut out = String::new();
        push_pair(&mut out, "Server", &self.server);
        push_pair(&mut out, "Database", &self.database);

        match &self.auth {
            Authentication::Unspecified => {}
            Authentication::Integrated => push_pair(&mut out, "Trusted_Connection", "yes"),
            Authentication::SqlLogin { user, password } => {
                push_pair(&mut out, "UID", user);
                if let Some(password) = password {
                    if mask_password {
                        push_pair(&mut out, "PWD", PASSWORD_MASK);
                    } else {
                        push_pair(&mut out, "PWD", password.expose_secret());
                    }
                }
            }
        }

        if let Some(flag) = &self.encrypt {
            push_pair(&mut out, "Encrypt", flag.render());
        }
        if let Some(flag) = &self.trust_server_certificate {
            push_pair(&mut out, "TrustServerCertificate", flag.render());
        }
        for (key, value) in &self.extra {
            push_pair(&mut out, key, value);
        }

        out.push_str("Driver={");
        out.push_str(&driver.replace('}', "}}"));
        out.push('}');
        out
    }
}

/// An ODBC connection string whose password never reaches a log line.
///
/// `Display` and `Debug` show the masked form. The real string is only
/// available through [`NormalizedConnectionConfig::expose_secret`].
pub struct NormalizedConnectionConfig {
    value: SecretString,
    masked: String,
}

impl NormalizedConnectionConfig {
    pub fn expose_secret(&self) -> &str {
        self.value.expose_secret()
    }

    pub fn masked(&self) -> &str {
        &self.masked
    }
}

impl fmt::Display for NormalizedConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.masked)
    }
}

impl fmt::Debug for NormalizedConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("NormalizedConnectionConfig")
            .field(&self.masked)
            .finish()
    }
}

/// Normalize a raw connection string for the default ODBC driver.
///
/// ```
/// use salesgate_db::normalize;
///
/// let normalized = normalize("Server=db;Initial Catalog=sales;User ID=app;Password=s3cret").unwrap();
/// assert_eq!(
///     normalized.to_string(),
///     "Server=db;Database=sales;UID=app;PWD=********;Driver={ODBC Driver 18 for SQL Server}"
/// );
/// ```
pub fn normalize(raw: &str) -> Result<NormalizedConnectionConfig> {
    normalize_for_driver(raw, DEFAULT_ODBC_DRIVER)
}

/// Normalize a raw connection string for a specific ODBC driver.
pub fn normalize_for_driver(raw: &str, driver: &str) -> Result<NormalizedConnectionConfig> {
    Ok(ConnectionConfig::parse(raw)?.to_odbc(driver))
}

/// Mask password values in arbitrary text, such as a driver error message
/// that echoes the connection string.
///
/// Keys match case-insensitively, with optional spaces before the `=`, the
/// same way [`ConnectionConfig::parse`] reads them.
pub fn mask_password(text: &str) -> String {
    let lower = text.to_ascii_lowercase();
    let mut out = String::with_capacity(text.len());
    let mut pos = 0;

    while let Some(value_start) = password_value_start(text, &lower, pos) {
        let rest = &text[value_start..];
        let trimmed = value_start + (rest.len() - rest.trim_start_matches([' ', '\t']).len());
        let value_end = if text[trimmed..].starts_with('{') {
            braced_value_end(text, trimmed)
        } else {
            text[value_start..]
                .find(';')
                .map_or(text.len(), |i| value_start + i)
        };

        out.push_str(&text[pos..value_start]);
        out.push_str(PASSWORD_MASK);
        pos = value_end;
    }

    out.push_str(&text[pos..]);
    out
}

/// Offset just past the `=` of the first `pwd`/`password` key at or after
/// `from`. Keys must start at a word boundary.
fn password_value_start(text: &str, lower: &str, from: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    ["pwd", "password"]
        .iter()
        .filter_map(|key| {
            lower[from..]
                .match_indices(key)
                .map(|(i, _)| from + i)
                .find_map(|start| {
                    let at_boundary = start == 0 || {
                        let prev = bytes[start - 1];
                        !prev.is_ascii_alphanumeric() && prev != b'_'
                    };
                    if !at_boundary {
                        return None;
                    }
                    let after_key = start + key.len();
                    let rest = &text[after_key..];
                    let eq = after_key + (rest.len() - rest.trim_start_matches([' ', '\t']).len());
                    (bytes.get(eq) == Some(&b'=')).then_some(eq + 1)
                })
        })
        .min()
}

/// End offset (exclusive) of a `{...}` value starting at `start`, honouring
/// `}}` escapes. Runs to the end of the text when unterminated.
fn braced_value_end(text: &str, start: usize) -> usize {
    let bytes = text.as_bytes();
    let mut i = start + 1;
    while i < bytes.len() {
        if bytes[i] == b'}' {
            if bytes.get(i + 1) == Some(&b'}') {
                i += 2;
                continue;
            }
            return i + 1;
        }
        i += 1;
    }
    bytes.len()
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" => Some(true),
        "false" | "no" | "0" => Some(false),
        _ => None,
    }
}

fn push_pair(out: &mut String, key: &str, value: &str) {
    out.push_str(key);
    out.push('=');
    if needs_braces(value) {
        out.push('{');
        out.push_str(&value.replace('}', "}}"));
        out.push('}');
    } else {
        out.push_str(value);
    }
    out.push(';');
}

fn needs_braces(value: &str) -> bool {
    value.contains([';', '{', '}']) || value.trim() != value
}

/// Split `key=value;key={braced;value}` pairs.
///
/// Error messages never quote segment text, since an unquoted password
/// containing `;` would otherwise end up in them.
fn split_pairs(raw: &str) -> Result<Vec<(String, String)>> {
    let mut pairs = Vec::new();
    let mut chars = raw.chars().peekable();
    let mut segment = 0usize;

    loop {
        while matches!(chars.peek(), Some(c) if *c == ';' || c.is_whitespace()) {
            chars.next();
        }
        if chars.peek().is_none() {
            break;
        }
        segment += 1;

        let mut key = String::new();
        let mut saw_equals = false;
        while let Some(c) = chars.next() {
            match c {
                '=' => {
                    saw_equals = true;
                    break;
                }
                ';' => break,
                _ => key.push(c),
            }
        }
        if !saw_equals {
            return Err(DbError::config(format!(
                "Connection string segment {segment} has no '='"
            )));
        }
        let key = key.trim().to_string();
        if key.is_empty() {
            return Err(DbError::config(format!(
                "Connection string segment {segment} has an empty key"
            )));
        }

        while matches!(chars.peek(), Some(c) if *c == ' ' || *c == '\t') {
            chars.next();
        }

        let value = if chars.peek() == Some(&'{') {
            chars.next();
            let mut value = String::new();
            let mut closed = false;
            while let Some(c) = chars.next() {
                if c == '}' {
                    if chars.peek() == Some(&'}') {
                        chars.next();
                        value.push('}');
                    } else {
                        closed = true;
                        break;
                    }
                } else {
                    value.push(c);
                }
            }
            if !closed {
                return Err(DbError::config(format!(
                    "Connection string segment {segment} has an unterminated '{{' value"
                )));
            }
            while let Some(c) = chars.next() {
                if c == ';' {
                    break;
                }
                if !c.is_whitespace() {
                    return Err(DbError::config(format!(
                        "Connection string segment {segment} has text after a braced value"
                    )));
                }
            }
            value
        } else {
            let mut value = String::new();
            for c in chars.by_ref() {
                if c == ';' {
                    break;
                }
                value.push(c);
            }
            value.trim().to_string()
        };

        pairs.push((key, value));
    }

    Ok(pairs)
}
