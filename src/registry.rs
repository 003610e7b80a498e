//! Name to handler lookup tables.
//!
//! Handlers are offered to a registry as a list of candidates.  Each candidate goes through
//! [`Admit::admit`], which either yields the key to file it under or the reason it was turned
//! away.  Rejected candidates are logged and skipped; loading never fails as a whole.

use log::{info, warn};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

/// Why a candidate handler was not admitted
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    #[error("handler has an empty name")]
    EmptyName,
    #[error("\"{0}\" is not a valid command name")]
    InvalidName(String),
    #[error("handler \"{name}\" declares a command schema named \"{schema_name}\"")]
    SchemaMismatch { name: String, schema_name: String },
    #[error("\"{0}\" is not a known event")]
    UnknownEvent(String),
    #[error("\"{0}\" is already registered")]
    Duplicate(String),
}

/// Validation step run on every candidate before it enters a registry
pub trait Admit {
    /// The key the candidate should be filed under, or why it cannot be admitted
    fn admit(&self) -> Result<String, Rejection>;
}

pub struct Entry<H: ?Sized> {
    handler: Box<H>,
    fired: AtomicBool,
}

impl<H: ?Sized> Entry<H> {
    pub fn handler(&self) -> &H {
        &self.handler
    }

    /// Mark the entry as fired.  Returns `false` if it had already been fired before.
    pub fn fire(&self) -> bool {
        !self.fired.swap(true, Ordering::SeqCst)
    }
}

pub struct Registry<H: ?Sized> {
    /// `command` or `event`, used for logging only
    kind: &'static str,
    /// Insertion order, kept for registration with Discord
    order: Vec<String>,
    entries: HashMap<String, Entry<H>>,
}

impl<H: ?Sized + Admit> Registry<H> {
    /// Admit every acceptable candidate, first come first served.
    pub fn load(kind: &'static str, candidates: Vec<Box<H>>) -> Self {
        let mut registry = Self {
            kind,
            order: Vec::new(),
            entries: HashMap::new(),
        };

        for (index, candidate) in candidates.into_iter().enumerate() {
            if let Err(rejection) = registry.insert(candidate) {
                warn!("Skipping {} candidate #{}: {}", kind, index, rejection);
            }
        }

        registry
    }

    fn insert(&mut self, candidate: Box<H>) -> Result<(), Rejection> {
        let name = candidate.admit()?;
        if self.entries.contains_key(&name) {
            return Err(Rejection::Duplicate(name));
        }

        info!("Loaded {}: {}", self.kind, name);
        self.order.push(name.clone());
        self.entries.insert(
            name,
            Entry {
                handler: candidate,
                fired: AtomicBool::new(false),
            },
        );
        Ok(())
    }
}

impl<H: ?Sized> Registry<H> {
    pub fn entry(&self, name: &str) -> Option<&Entry<H>> {
        self.entries.get(name)
    }

    pub fn get(&self, name: &str) -> Option<&H> {
        self.entry(name).map(Entry::handler)
    }

    /// Handlers in the order they were admitted
    pub fn iter(&self) -> impl Iterator<Item = &H> + '_ {
        self.order.iter().filter_map(|name| self.get(name))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.order.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Candidate(&'static str);

    impl Admit for Candidate {
        fn admit(&self) -> Result<String, Rejection> {
            match self.0 {
                "" => Err(Rejection::EmptyName),
                name if name.starts_with('!') => Err(Rejection::InvalidName(name.to_owned())),
                name => Ok(name.to_owned()),
            }
        }
    }

    fn load(names: &[&'static str]) -> Registry<Candidate> {
        let candidates = names.iter().map(|name| Box::new(Candidate(*name))).collect();
        Registry::load("test", candidates)
    }

    #[test]
    fn test_rejected_candidates_are_skipped_and_loading_continues() {
        let registry = load(&["first", "", "!bad", "last"]);

        assert_eq!(registry.len(), 2);
        assert!(registry.get("first").is_some());
        assert!(registry.get("last").is_some());
        assert!(registry.get("").is_none());
        assert!(registry.get("!bad").is_none());
    }

    #[test]
    fn test_duplicates_keep_first() {
        let mut registry = load(&["ping"]);
        let rejection = registry.insert(Box::new(Candidate("ping"))).unwrap_err();

        assert_eq!(rejection, Rejection::Duplicate("ping".to_owned()));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_iteration_keeps_admission_order() {
        let registry = load(&["c", "a", "b", "a"]);
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["c", "a", "b"]);
        assert_eq!(
            registry.iter().map(|c| c.0).collect::<Vec<_>>(),
            vec!["c", "a", "b"]
        );
    }

    #[test]
    fn test_unknown_name_is_absent() {
        let registry = load(&[]);
        assert!(registry.is_empty());
        assert!(registry.entry("missing").is_none());
    }

    #[test]
    fn test_entry_fires_once() {
        let registry = load(&["ready"]);
        let entry = registry.entry("ready").unwrap();

        assert!(entry.fire());
        assert!(!entry.fire());
    }
}
