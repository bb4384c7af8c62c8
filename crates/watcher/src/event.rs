//! Filesystem events flowing through the watcher
//!
//! The same [`Event`] type is used for raw notifications coming out of an
//! event source and for the settled events handed to consumers.

use serde::{Serialize, Serializer};
use std::fmt;
use std::ops::{BitOr, BitOrAssign};
use std::path::{Path, PathBuf};

/// Set of operations reported for a path
///
/// Sources may combine several bits in one event (e.g. a rename that also
/// removed the target), so this is a bitmask rather than a plain enum.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct Op(u8);

impl Op {
    /// File was created
    pub const CREATE: Op = Op(1);
    /// File content was written
    pub const WRITE: Op = Op(1 << 1);
    /// File was removed
    pub const REMOVE: Op = Op(1 << 2);
    /// File was renamed away from this path
    pub const RENAME: Op = Op(1 << 3);
    /// Permissions or other metadata changed
    pub const CHMOD: Op = Op(1 << 4);
    /// Anything the source could not classify
    pub const OTHER: Op = Op(1 << 5);

    const NAMES: [(Op, &'static str); 6] = [
        (Op::CREATE, "CREATE"),
        (Op::WRITE, "WRITE"),
        (Op::REMOVE, "REMOVE"),
        (Op::RENAME, "RENAME"),
        (Op::CHMOD, "CHMOD"),
        (Op::OTHER, "OTHER"),
    ];

    /// Raw bit representation
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// True if every bit of `other` is set
    pub const fn contains(self, other: Op) -> bool {
        self.0 & other.0 == other.0
    }

    /// True if any bit of `other` is set
    pub const fn intersects(self, other: Op) -> bool {
        self.0 & other.0 != 0
    }

    /// True if no bit is set
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// How the debounce engine treats an event carrying these bits
    ///
    /// Create/Write win over everything else, then Remove, then Rename.
    /// An event carrying both Remove and Rename is therefore a Remove.
    pub(crate) fn class(self) -> OpClass {
        if self.intersects(Op::CREATE | Op::WRITE) {
            OpClass::Activity
        } else if self.contains(Op::REMOVE) {
            OpClass::Remove
        } else if self.contains(Op::RENAME) {
            OpClass::Rename
        } else {
            OpClass::Other
        }
    }
}

impl BitOr for Op {
    type Output = Op;

    fn bitor(self, rhs: Op) -> Op {
        Op(self.0 | rhs.0)
    }
}

impl BitOrAssign for Op {
    fn bitor_assign(&mut self, rhs: Op) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (bit, name) in Self::NAMES {
            if self.contains(bit) {
                if !first {
                    f.write_str("|")?;
                }
                f.write_str(name)?;
                first = false;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Op({})", self)
    }
}

impl Serialize for Op {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Routing class of an event inside the debounce engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OpClass {
    /// Create or Write: opens or extends a debounce window
    Activity,
    /// Ends a window; the file is gone
    Remove,
    /// Ends a window; the file lives on under another name
    Rename,
    /// Anything else; ignored while a window is open
    Other,
}

/// A filesystem event for a single path
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Event {
    /// Path that changed
    pub path: PathBuf,
    /// Operations reported for the path
    pub op: Op,
}

impl Event {
    /// Create a new event
    pub fn new(path: impl Into<PathBuf>, op: Op) -> Self {
        Self {
            path: path.into(),
            op,
        }
    }

    /// Path that changed
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.op, self.path.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_and_write_are_activity() {
        assert_eq!(Op::CREATE.class(), OpClass::Activity);
        assert_eq!(Op::WRITE.class(), OpClass::Activity);
        assert_eq!((Op::CREATE | Op::CHMOD).class(), OpClass::Activity);
    }

    #[test]
    fn test_remove_wins_over_rename() {
        assert_eq!((Op::REMOVE | Op::RENAME).class(), OpClass::Remove);
        assert_eq!(Op::RENAME.class(), OpClass::Rename);
    }

    #[test]
    fn test_unrecognized_ops_are_other() {
        assert_eq!(Op::CHMOD.class(), OpClass::Other);
        assert_eq!(Op::OTHER.class(), OpClass::Other);
    }

    #[test]
    fn test_op_display() {
        assert_eq!(Op::WRITE.to_string(), "WRITE");
        assert_eq!((Op::REMOVE | Op::RENAME).to_string(), "REMOVE|RENAME");
        assert_eq!(format!("{:?}", Op::CREATE), "Op(CREATE)");
    }

    #[test]
    fn test_op_bit_helpers() {
        let mut op = Op::CREATE;
        op |= Op::WRITE;
        assert!(op.contains(Op::CREATE));
        assert!(op.contains(Op::WRITE));
        assert!(!op.contains(Op::CREATE | Op::REMOVE));
        assert!(op.intersects(Op::CREATE | Op::REMOVE));
        assert_eq!(op.bits(), 0b11);
        assert!(!op.is_empty());
    }

    #[test]
    fn test_event_display() {
        let event = Event::new("src/main.rs", Op::WRITE);
        assert_eq!(event.to_string(), "WRITE src/main.rs");
        assert_eq!(event.path(), Path::new("src/main.rs"));
    }
}
