use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_DUMMY_ID: AtomicU64 = AtomicU64::new(1);

/// A named placeholder inside an [`Expr`](super::Expr).
///
/// Dummies carry a unique id, so two dummies called `p` never collide with each
/// other or with a plain `p`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Symbol {
    name: String,
    dummy: Option<u64>,
}

impl Symbol {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            dummy: None,
        }
    }

    /// Fresh dummy symbol, distinct from every other symbol.
    pub fn dummy(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            dummy: Some(NEXT_DUMMY_ID.fetch_add(1, Ordering::Relaxed)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_dummy(&self) -> bool {
        self.dummy.is_some()
    }

    /// Plain symbol with the same name.
    pub fn undummied(&self) -> Symbol {
        Symbol::new(self.name.clone())
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_dummy() {
            write!(f, "_{}", self.name)
        } else {
            write!(f, "{}", self.name)
        }
    }
}

impl From<&str> for Symbol {
    fn from(name: &str) -> Self {
        Symbol::new(name)
    }
}

impl From<String> for Symbol {
    fn from(name: String) -> Self {
        Symbol::new(name)
    }
}
