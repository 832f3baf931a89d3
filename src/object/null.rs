//! The null object.

use crate::reader::{Readable, Reader};
use std::fmt::{Debug, Formatter};

/// The null object.
///
/// A null can carry a diagnostic explaining why it exists. Dangling
/// references are not an error in PDF, so a failed lookup is reported as a
/// null object whose diagnostic names the position and cause of the failure
/// instead of aborting the operation.
#[derive(Clone, Default, Eq)]
pub struct Null {
    reason: Option<String>,
}

impl Null {
    /// Create a new null object.
    pub fn new() -> Self {
        Self { reason: None }
    }

    /// Create a new null object carrying a diagnostic.
    pub fn with_reason(reason: impl Into<String>) -> Self {
        Self {
            reason: Some(reason.into()),
        }
    }

    /// Returns the diagnostic attached to this null, if any.
    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }
}

// There is only one null value. The diagnostic is incidental and must not
// make two nulls compare unequal.
impl PartialEq for Null {
    fn eq(&self, _: &Self) -> bool {
        true
    }
}

impl Debug for Null {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.reason {
            Some(reason) => write!(f, "Null({reason})"),
            None => write!(f, "Null"),
        }
    }
}

impl Readable for Null {
    fn read(r: &mut Reader<'_>) -> Option<Self> {
        r.forward_tag(b"null")?;

        Some(Null::new())
    }
}
