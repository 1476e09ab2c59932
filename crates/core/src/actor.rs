//! The person performing a workflow operation.

use opd_types::NonEmptyText;

/// The authenticated user on whose behalf a consultation is completed.
///
/// This is deliberately thin: claims extraction and authentication live
/// outside this crate, which only records who did what.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct Actor {
    name: NonEmptyText,
    role: NonEmptyText,
}

impl Actor {
    pub fn new(name: NonEmptyText, role: NonEmptyText) -> Self {
        Self { name, role }
    }

    pub fn name(&self) -> &NonEmptyText {
        &self.name
    }

    pub fn role(&self) -> &NonEmptyText {
        &self.role
    }
}

impl std::fmt::Display for Actor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.role)
    }
}
