// SPDX-License-Identifier: MIT

//! Identifier generation.
//!
//! Every aggregate gets an opaque prefixed id (`proj_`, `task_`, `sess_`,
//! `mail_`, `evt_`, `doc_`, `tm_`, `team_`, `tmpl_`, `list_`, `ord_`).
//! Generated suffixes are monotonic: a fixed-width base36 encoding of
//! `epoch_ms << SEQ_BITS | sequence`, so lexicographic order on ids of one
//! type equals creation order.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Maximum byte length for an inline ID.
///
/// Generated IDs are at most 18 bytes (5-char prefix + 13-char base36
/// suffix). `from_string` accepts longer external ids up to this capacity
/// and debug-asserts they fit.
pub const ID_MAX_LEN: usize = 23;

/// Width of the base36 suffix produced by [`IdGen`].
const SUFFIX_LEN: usize = 13;

/// Low bits of the generator state reserved for the per-millisecond sequence.
const SEQ_BITS: u32 = 20;

/// Fixed-size inline ID buffer. Always ≤ 23 ASCII bytes, `Copy`.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct IdBuf {
    len: u8,
    buf: [u8; ID_MAX_LEN],
}

impl Ord for IdBuf {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // Compare the active bytes, matching str ordering.
        self.as_str().cmp(other.as_str())
    }
}

impl PartialOrd for IdBuf {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl std::hash::Hash for IdBuf {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        // Hash only the active bytes so it matches str::hash,
        // which is required for Borrow<str> HashMap lookups.
        self.as_str().hash(state);
    }
}

impl IdBuf {
    pub const fn empty() -> Self {
        Self { len: 0, buf: [0; ID_MAX_LEN] }
    }

    pub fn new(s: &str) -> Self {
        debug_assert!(
            s.len() <= ID_MAX_LEN,
            "ID exceeds {} bytes ({} bytes): {:?}",
            ID_MAX_LEN,
            s.len(),
            s,
        );
        let len = s.len().min(ID_MAX_LEN);
        let mut buf = [0u8; ID_MAX_LEN];
        buf[..len].copy_from_slice(&s.as_bytes()[..len]);
        Self { len: len as u8, buf }
    }

    pub fn as_str(&self) -> &str {
        // Invariant: only constructed from &str, always valid UTF-8.
        match std::str::from_utf8(&self.buf[..self.len as usize]) {
            Ok(s) => s,
            Err(_) => unreachable!("IdBuf constructed from non-UTF-8"),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl std::borrow::Borrow<str> for IdBuf {
    fn borrow(&self) -> &str {
        self.as_str()
    }
}

impl std::fmt::Debug for IdBuf {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self.as_str())
    }
}

impl std::fmt::Display for IdBuf {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl serde::Serialize for IdBuf {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

struct IdBufVisitor;

impl serde::de::Visitor<'_> for IdBufVisitor {
    type Value = IdBuf;

    fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "an id string of at most {} bytes", ID_MAX_LEN)
    }

    fn visit_str<E>(self, s: &str) -> Result<IdBuf, E>
    where
        E: serde::de::Error,
    {
        if s.len() > ID_MAX_LEN {
            return Err(E::custom(format!("ID exceeds {} bytes: {:?}", ID_MAX_LEN, s)));
        }
        Ok(IdBuf::new(s))
    }
}

impl<'de> serde::Deserialize<'de> for IdBuf {
    // Visitor-based so IdBuf works as a JSON map key, where only
    // transient &str access is available.
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_str(IdBufVisitor)
    }
}

/// Monotonic id generator shared by all id types.
///
/// State is `epoch_ms << SEQ_BITS | seq`. Each call takes
/// `max(prev + 1, now_ms << SEQ_BITS)`, so values strictly increase even
/// when the wall clock stalls or many ids are minted in one millisecond.
#[derive(Debug)]
pub struct IdGen {
    last: AtomicU64,
}

impl IdGen {
    pub fn new() -> Self {
        Self { last: AtomicU64::new(0) }
    }

    /// Mint the next id for the given prefix.
    pub fn next(&self, prefix: &str) -> String {
        let floor = epoch_ms_now() << SEQ_BITS;
        let mut prev = self.last.load(Ordering::Relaxed);
        loop {
            let candidate = floor.max(prev + 1);
            match self.last.compare_exchange_weak(
                prev,
                candidate,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => return format!("{}{}", prefix, base36_fixed(candidate)),
                Err(observed) => prev = observed,
            }
        }
    }
}

impl Default for IdGen {
    fn default() -> Self {
        Self::new()
    }
}

fn epoch_ms_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Encode a u64 as a fixed-width base36 string (lexicographic == numeric).
fn base36_fixed(mut value: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let mut out = [b'0'; SUFFIX_LEN];
    let mut i = SUFFIX_LEN;
    while value > 0 && i > 0 {
        i -= 1;
        out[i] = DIGITS[(value % 36) as usize];
        value /= 36;
    }
    // SUFFIX_LEN base36 digits always cover a u64.
    match std::str::from_utf8(&out) {
        Ok(s) => s.to_string(),
        Err(_) => unreachable!("base36 output is ASCII"),
    }
}

/// Define a newtype ID wrapper around [`IdBuf`] with a type prefix.
///
/// Generates `generate()` for minting via an [`IdGen`], `from_string()` for
/// parsing, `as_str()`, `suffix()`, `Display`, `From<String>`, `From<&str>`,
/// `PartialEq<str>`, `Borrow<str>`, and `Deref` implementations.
///
/// ```ignore
/// crate::define_id! {
///     /// Doc comment for the ID type.
///     pub struct TaskId("task_");
/// }
/// ```
#[macro_export]
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        pub struct $name:ident($prefix:literal);
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub $crate::id::IdBuf);

        impl $name {
            pub const PREFIX: &'static str = $prefix;

            /// Mint a new id via the generator.
            pub fn generate(ids: &$crate::id::IdGen) -> Self {
                Self($crate::id::IdBuf::new(&ids.next(Self::PREFIX)))
            }

            /// Create ID from existing string (for parsing/deserialization)
            pub fn from_string(id: impl AsRef<str>) -> Self {
                Self($crate::id::IdBuf::new(id.as_ref()))
            }

            pub fn as_str(&self) -> &str {
                self.0.as_str()
            }

            /// Get the ID suffix (without prefix)
            pub fn suffix(&self) -> &str {
                self.0.as_str().strip_prefix(Self::PREFIX).unwrap_or(self.0.as_str())
            }

            /// Returns true if the ID is an empty string.
            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl Default for $name {
            /// The empty id; placeholder only, never minted.
            fn default() -> Self {
                Self($crate::id::IdBuf::empty())
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0.as_str())
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self::from_string(s)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self::from_string(s)
            }
        }

        impl From<&String> for $name {
            fn from(s: &String) -> Self {
                Self::from_string(s)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                self.0.as_str()
            }
        }

        impl PartialEq<str> for $name {
            fn eq(&self, other: &str) -> bool {
                self.0.as_str() == other
            }
        }

        impl PartialEq<&str> for $name {
            fn eq(&self, other: &&str) -> bool {
                self.0.as_str() == *other
            }
        }

        impl std::borrow::Borrow<str> for $name {
            fn borrow(&self) -> &str {
                self.0.as_str()
            }
        }

        impl std::ops::Deref for $name {
            type Target = str;

            fn deref(&self) -> &str {
                self.0.as_str()
            }
        }
    };
}

crate::define_id! {
    /// Unique identifier for a project.
    pub struct ProjectId("proj_");
}

crate::define_id! {
    /// Unique identifier for a task.
    pub struct TaskId("task_");
}

crate::define_id! {
    /// Unique identifier for an agent session.
    pub struct SessionId("sess_");
}

crate::define_id! {
    /// Unique identifier for a mail message.
    pub struct MailId("mail_");
}

crate::define_id! {
    /// Unique identifier for a timeline event.
    pub struct EventId("evt_");
}

crate::define_id! {
    /// Unique identifier for a session doc entry.
    pub struct DocId("doc_");
}

crate::define_id! {
    /// Unique identifier for a team member.
    pub struct TeamMemberId("tm_");
}

crate::define_id! {
    /// Unique identifier for a team.
    pub struct TeamId("team_");
}

crate::define_id! {
    /// Unique identifier for a prompt template.
    pub struct TemplateId("tmpl_");
}

crate::define_id! {
    /// Unique identifier for a task list.
    pub struct TaskListId("list_");
}

crate::define_id! {
    /// Unique identifier for an ordering record.
    pub struct OrderingId("ord_");
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
