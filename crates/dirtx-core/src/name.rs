use std::fmt;
use std::iter::Peekable;
use std::str::{Chars, FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{DirectoryError, Result};

/// A single `type=value` pair of a relative distinguished name.
///
/// Attribute types are case-folded to lower case; values keep their case.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RdnComponent {
    key: String,
    value: String,
}

impl RdnComponent {
    #[must_use]
    pub fn new(key: &str, value: impl Into<String>) -> Self {
        Self {
            key: key.trim().to_lowercase(),
            value: value.into(),
        }
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    #[must_use]
    pub fn with_value(&self, value: impl Into<String>) -> Self {
        Self {
            key: self.key.clone(),
            value: value.into(),
        }
    }
}

impl fmt::Display for RdnComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.key, escape_value(&self.value))
    }
}

/// One level of a distinguished name. Holds at least one component; more
/// than one makes it a multi-valued RDN (`cn=john doe+sn=doe`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Rdn {
    components: Vec<RdnComponent>,
}

impl Rdn {
    #[must_use]
    pub fn new(key: &str, value: impl Into<String>) -> Self {
        Self {
            components: vec![RdnComponent::new(key, value)],
        }
    }

    /// # Errors
    ///
    /// Returns `DirectoryError::InvalidName` if `components` is empty.
    pub fn from_components(components: Vec<RdnComponent>) -> Result<Self> {
        if components.is_empty() {
            return Err(DirectoryError::invalid_name("", "empty relative name"));
        }
        Ok(Self { components })
    }

    #[must_use]
    pub fn components(&self) -> &[RdnComponent] {
        &self.components
    }

    /// The first (most significant) component.
    #[must_use]
    pub fn first(&self) -> &RdnComponent {
        &self.components[0]
    }

    #[must_use]
    pub fn key(&self) -> &str {
        self.first().key()
    }

    #[must_use]
    pub fn value(&self) -> &str {
        self.first().value()
    }

    /// Copy of this RDN with `suffix` appended to the value of the first
    /// component only. Other components of a multi-valued RDN are kept as is.
    #[must_use]
    pub fn with_value_suffix(&self, suffix: &str) -> Self {
        let mut components = self.components.clone();
        let first = &components[0];
        components[0] = first.with_value(format!("{}{suffix}", first.value()));
        Self { components }
    }
}

impl fmt::Display for Rdn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, component) in self.components.iter().enumerate() {
            if index > 0 {
                f.write_str("+")?;
            }
            write!(f, "{component}")?;
        }
        Ok(())
    }
}

/// Hierarchical name of a directory entry, stored leaf first as written:
/// `cn=john doe, ou=somecompany, c=SE` has leaf `cn=john doe` and
/// root-most component `c=SE`. The empty name denotes the directory root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DistinguishedName {
    rdns: Vec<Rdn>,
}

impl DistinguishedName {
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// # Errors
    ///
    /// Returns `DirectoryError::InvalidName` if `input` is not a valid
    /// string representation of a distinguished name.
    pub fn parse(input: &str) -> Result<Self> {
        NameParser::new(input).parse()
    }

    #[must_use]
    pub fn from_rdns(rdns: Vec<Rdn>) -> Self {
        Self { rdns }
    }

    #[must_use]
    pub fn rdns(&self) -> &[Rdn] {
        &self.rdns
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rdns.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rdns.is_empty()
    }

    #[must_use]
    pub fn leaf(&self) -> Option<&Rdn> {
        self.rdns.first()
    }

    /// The name with its leaf removed, or `None` for the empty name.
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        if self.rdns.is_empty() {
            return None;
        }
        Some(Self {
            rdns: self.rdns[1..].to_vec(),
        })
    }

    /// A new name one level below this one.
    #[must_use]
    pub fn child(&self, leaf: Rdn) -> Self {
        let mut rdns = Vec::with_capacity(self.rdns.len() + 1);
        rdns.push(leaf);
        rdns.extend(self.rdns.iter().cloned());
        Self { rdns }
    }

    /// This name placed below `base` on the root side.
    #[must_use]
    pub fn with_base(&self, base: &Self) -> Self {
        let mut rdns = self.rdns.clone();
        rdns.extend(base.rdns.iter().cloned());
        Self { rdns }
    }

    /// Strictly below `ancestor` in the tree.
    #[must_use]
    pub fn is_descendant_of(&self, ancestor: &Self) -> bool {
        self.rdns.len() > ancestor.rdns.len() && self.rdns.ends_with(&ancestor.rdns)
    }

    /// Rewrites the `old_base` part of this name to `new_base`. Returns
    /// `None` unless this name equals or lies below `old_base`.
    #[must_use]
    pub fn replace_base(&self, old_base: &Self, new_base: &Self) -> Option<Self> {
        if !self.rdns.ends_with(&old_base.rdns) {
            return None;
        }
        let keep = self.rdns.len() - old_base.rdns.len();
        let mut rdns = self.rdns[..keep].to_vec();
        rdns.extend(new_base.rdns.iter().cloned());
        Some(Self { rdns })
    }
}

impl fmt::Display for DistinguishedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, rdn) in self.rdns.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{rdn}")?;
        }
        Ok(())
    }
}

impl FromStr for DistinguishedName {
    type Err = DirectoryError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<&str> for DistinguishedName {
    type Error = DirectoryError;

    fn try_from(value: &str) -> Result<Self> {
        Self::parse(value)
    }
}

impl Serialize for DistinguishedName {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DistinguishedName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

fn escape_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    let last = value.chars().count().saturating_sub(1);
    for (index, c) in value.chars().enumerate() {
        let needs_escape = matches!(c, ',' | '+' | '"' | '\\' | '<' | '>' | ';' | '=')
            || (index == 0 && matches!(c, '#' | ' '))
            || (index == last && c == ' ');
        if needs_escape {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

struct NameParser<'a> {
    input: &'a str,
    chars: Peekable<Chars<'a>>,
}

#[derive(Default)]
struct PendingComponent {
    key: String,
    value: Vec<u8>,
    in_value: bool,
    escaped_any: bool,
    protected_len: usize,
}

impl<'a> NameParser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            chars: input.trim().chars().peekable(),
        }
    }

    fn parse(mut self) -> Result<DistinguishedName> {
        if self.input.trim().is_empty() {
            return Ok(DistinguishedName::empty());
        }

        let mut rdns = Vec::new();
        let mut components = Vec::new();
        let mut pending = PendingComponent::default();

        while let Some(c) = self.chars.next() {
            match c {
                '\\' if pending.in_value => {
                    self.decode_escape(&mut pending.value)?;
                    pending.escaped_any = true;
                    pending.protected_len = pending.value.len();
                }
                '\\' => return Err(self.invalid("escape outside attribute value")),
                '=' if !pending.in_value => pending.in_value = true,
                ',' | ';' | '+' if pending.in_value => {
                    components.push(self.finish(std::mem::take(&mut pending))?);
                    if c != '+' {
                        rdns.push(Rdn {
                            components: std::mem::take(&mut components),
                        });
                    }
                }
                ',' | ';' | '+' => return Err(self.invalid("missing '='")),
                ' ' if pending.in_value && pending.value.is_empty() && !pending.escaped_any => {}
                _ if pending.in_value => {
                    let mut buf = [0_u8; 4];
                    pending
                        .value
                        .extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
                }
                _ => pending.key.push(c),
            }
        }

        if !pending.in_value {
            return Err(self.invalid("missing '='"));
        }
        components.push(self.finish(pending)?);
        rdns.push(Rdn { components });

        Ok(DistinguishedName { rdns })
    }

    fn decode_escape(&mut self, value: &mut Vec<u8>) -> Result<()> {
        let Some(first) = self.chars.next() else {
            return Err(self.invalid("trailing escape"));
        };
        let second_is_hex = self.chars.peek().is_some_and(char::is_ascii_hexdigit);
        if first.is_ascii_hexdigit() && second_is_hex {
            let second = self.chars.next().unwrap_or('0');
            let hex = format!("{first}{second}");
            let byte =
                u8::from_str_radix(&hex, 16).map_err(|_| self.invalid("invalid hex escape"))?;
            value.push(byte);
        } else {
            let mut buf = [0_u8; 4];
            value.extend_from_slice(first.encode_utf8(&mut buf).as_bytes());
        }
        Ok(())
    }

    fn finish(&self, mut pending: PendingComponent) -> Result<RdnComponent> {
        let key = pending.key.trim();
        if key.is_empty() {
            return Err(self.invalid("empty attribute type"));
        }
        while pending.value.len() > pending.protected_len && pending.value.last() == Some(&b' ') {
            pending.value.pop();
        }
        let value = String::from_utf8(pending.value)
            .map_err(|_| self.invalid("attribute value is not valid UTF-8"))?;
        Ok(RdnComponent::new(key, value))
    }

    fn invalid(&self, reason: &'static str) -> DirectoryError {
        DirectoryError::invalid_name(self.input, reason)
    }
}
