use crate::graph::Machine;
use crate::loader::MachineLoader;
use crate::types::{AutomatonError, MachineKind};

use std::sync::{Once, RwLock};
use tracing::warn;

// Default embedded machines
const MACHINE_TEXTS: [&str; 3] = [
    include_str!("../machines/ends-with-ab.json"),
    include_str!("../machines/anbn.json"),
    include_str!("../machines/palindrome.json"),
];

lazy_static::lazy_static! {
    pub static ref MACHINES: RwLock<Vec<Machine>> = RwLock::new(Vec::new());
}

static INITIAL_LOAD: Once = Once::new();

pub struct MachineLibrary;

impl MachineLibrary {
    /// Parses the embedded machines into [`MACHINES`]. Calling it again reloads them.
    pub fn load() -> Result<(), AutomatonError> {
        let mut machines = Vec::new();

        for text in MACHINE_TEXTS {
            match MachineLoader::load_machine_from_string(text) {
                Ok(machine) => machines.push(machine),
                Err(e) => warn!(error = %e, "failed to parse bundled machine"),
            }
        }

        let mut guard = MACHINES
            .write()
            .map_err(|_| AutomatonError::FileError("Failed to acquire write lock".to_string()))?;
        *guard = machines;

        Ok(())
    }

    /// Runs [`MachineLibrary::load`] on first use only, even if it loads nothing.
    fn ensure_loaded() {
        INITIAL_LOAD.call_once(|| {
            if let Err(e) = Self::load() {
                warn!(error = %e, "failed to load bundled machines");
            }
        });
    }

    /// Returns true once the first access has loaded the bundled machines.
    pub fn is_loaded() -> bool {
        INITIAL_LOAD.is_completed()
    }

    /// Get the number of available machines
    pub fn count() -> usize {
        Self::ensure_loaded();

        MACHINES.read().map(|machines| machines.len()).unwrap_or(0)
    }

    pub fn by_index(index: usize) -> Result<Machine, AutomatonError> {
        Self::ensure_loaded();

        MACHINES
            .read()
            .map_err(|_| AutomatonError::FileError("Failed to acquire read lock".to_string()))?
            .get(index)
            .cloned()
            .ok_or_else(|| AutomatonError::Validation(format!("Machine index {} out of range", index)))
    }

    /// Looks a machine up by its exact name.
    pub fn by_name(name: &str) -> Result<Machine, AutomatonError> {
        Self::ensure_loaded();

        MACHINES
            .read()
            .map_err(|_| AutomatonError::FileError("Failed to acquire read lock".to_string()))?
            .iter()
            .find(|machine| machine.name == name)
            .cloned()
            .ok_or_else(|| AutomatonError::Validation(format!("Machine '{}' not found", name)))
    }

    pub fn names() -> Vec<String> {
        Self::ensure_loaded();

        MACHINES
            .read()
            .map(|machines| machines.iter().map(|machine| machine.name.clone()).collect())
            .unwrap_or_default()
    }

    /// Get summary information about a machine by its index
    pub fn info(index: usize) -> Result<MachineInfo, AutomatonError> {
        let machine = Self::by_index(index)?;

        Ok(MachineInfo {
            index,
            name: machine.name.clone(),
            kind: machine.kind,
            description: machine.description.clone(),
            state_count: machine.graph.len(),
            transition_count: machine.graph.edges().count(),
        })
    }

    /// Case-insensitive search over machine names. Returns matching indices.
    pub fn search(query: &str) -> Vec<usize> {
        Self::ensure_loaded();

        let query = query.to_lowercase();
        MACHINES
            .read()
            .map(|machines| {
                machines
                    .iter()
                    .enumerate()
                    .filter(|(_, machine)| machine.name.to_lowercase().contains(&query))
                    .map(|(index, _)| index)
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone)]
pub struct MachineInfo {
    pub index: usize,
    pub name: String,
    pub kind: MachineKind,
    pub description: String,
    pub state_count: usize,
    pub transition_count: usize,
}
