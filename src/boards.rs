//! Read only view over the kanban boards. The aggregation only ever needs a board's name.

use std::{collections::HashMap, io::ErrorKind, path::Path};

use anyhow::Result;
use serde::Deserialize;
use tracing::debug;

/// Resolves a board id into a human readable project name.
pub trait BoardNameResolver {
    fn board_name(&self, id: &str) -> Option<&str>;
}

/// A kanban board. Boards carry lists, cards and settings which are of no interest here, so
/// everything except the name is ignored during deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Board {
    pub name: String,
}

/// Boards keyed by their id, in the shape the board state is stored in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct BoardTable {
    boards: HashMap<String, Board>,
}

impl BoardTable {
    /// Loads the board table from a json object file. A missing file means there are no boards.
    pub async fn load(path: &Path) -> Result<Self> {
        match tokio::fs::read(path).await {
            Ok(data) => {
                let table: BoardTable = serde_json::from_slice(&data)?;
                debug!("Loaded {} boards from {path:?}", table.boards.len());
                Ok(table)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No board file at {path:?}");
                Ok(Self::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn insert(&mut self, id: impl Into<String>, name: impl Into<String>) {
        self.boards.insert(id.into(), Board { name: name.into() });
    }

    /// Finds the id of a board by its name. When several boards share a name the smallest id
    /// wins so the lookup is stable.
    pub fn find_by_name(&self, name: &str) -> Option<&str> {
        self.boards
            .iter()
            .filter(|(_, board)| board.name == name)
            .map(|(id, _)| id.as_str())
            .min()
    }
}

impl BoardNameResolver for BoardTable {
    fn board_name(&self, id: &str) -> Option<&str> {
        self.boards.get(id).map(|v| v.name.as_str())
    }
}

impl FromIterator<(String, String)> for BoardTable {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        let mut table = Self::default();
        for (id, name) in iter {
            table.insert(id, name);
        }
        table
    }
}
