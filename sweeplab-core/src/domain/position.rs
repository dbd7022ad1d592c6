use serde::{Deserialize, Serialize};

/// Holding state of a single-position account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Position {
    #[default]
    Flat,
    Long,
}

impl Position {
    pub fn is_long(&self) -> bool {
        matches!(self, Position::Long)
    }

    pub fn is_flat(&self) -> bool {
        matches!(self, Position::Flat)
    }
}
