//! This module provides the `MachineLoader` struct, responsible for loading and saving machine
//! descriptions as JSON, from files, directories and strings.

use crate::analyzer::{analyze, check_start};
use crate::graph::Machine;
use crate::types::{AutomatonError, MAX_GRAPH_SIZE};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// `MachineLoader` is a utility struct for loading machines.
/// It provides methods to load machines from individual files, from string content,
/// to discover and load all `.json` files within a directory, and to write a machine back.
pub struct MachineLoader;

impl MachineLoader {
    /// Loads a single machine from the specified file path.
    ///
    /// # Returns
    ///
    /// * `Ok(Machine)` if the file is successfully read, parsed and validated.
    /// * `Err(AutomatonError::FileError)` if the file cannot be read or is too large.
    /// * `Err(AutomatonError::Json)` if the content is not a valid machine description.
    /// * `Err(AutomatonError::NoStartState)` if the graph has vertices but no start vertex.
    pub fn load_machine(path: &Path) -> Result<Machine, AutomatonError> {
        let content = fs::read_to_string(path).map_err(|e| {
            AutomatonError::FileError(format!("Failed to read file {}: {}", path.display(), e))
        })?;

        Self::load_machine_from_string(&content)
    }

    /// Loads a single machine from the provided JSON content.
    ///
    /// The graph is checked for dangling edges, duplicate names and duplicate edges while
    /// deserializing, and must have a start vertex. The remaining analysis (unreachable states,
    /// Turing determinism) only logs a warning: such machines still run.
    pub fn load_machine_from_string(content: &str) -> Result<Machine, AutomatonError> {
        if content.len() > MAX_GRAPH_SIZE {
            return Err(AutomatonError::FileError(format!(
                "Machine description exceeds {} bytes",
                MAX_GRAPH_SIZE
            )));
        }

        let machine: Machine = serde_json::from_str(content)?;
        check_start(&machine.graph)?;

        if let Err(e) = analyze(&machine.graph, machine.kind) {
            warn!(name = %machine.name, error = %e, "loaded machine has analysis warnings");
        }

        debug!(
            name = %machine.name,
            kind = %machine.kind,
            states = machine.graph.len(),
            "loaded machine"
        );
        Ok(machine)
    }

    /// Loads all machine files (`.json` extension) from a given directory.
    ///
    /// Directories and other files are skipped. Each element of the result is either the path
    /// and the loaded machine, or the error that occurred for that file.
    pub fn load_machines(directory: &Path) -> Vec<Result<(PathBuf, Machine), AutomatonError>> {
        if !directory.exists() {
            return vec![Err(AutomatonError::FileError(format!(
                "Directory {} does not exist",
                directory.display()
            )))];
        }

        let entries = match fs::read_dir(directory) {
            Ok(entries) => entries,
            Err(e) => {
                return vec![Err(AutomatonError::FileError(format!(
                    "Failed to read directory {}: {}",
                    directory.display(),
                    e
                )))]
            }
        };

        let mut results: Vec<_> = entries
            .filter_map(|entry| {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(e) => {
                        return Some(Err(AutomatonError::FileError(format!(
                            "Failed to read directory entry: {}",
                            e
                        ))))
                    }
                };

                let path = entry.path();

                if path.is_dir() || path.extension().is_none_or(|ext| ext != "json") {
                    return None;
                }

                match Self::load_machine(&path) {
                    Ok(machine) => Some(Ok((path, machine))),
                    Err(e) => Some(Err(AutomatonError::FileError(format!(
                        "Failed to load machine from {}: {}",
                        path.display(),
                        e
                    )))),
                }
            })
            .collect();

        // read_dir order is platform dependent
        results.sort_by(|a, b| match (a, b) {
            (Ok((a, _)), Ok((b, _))) => a.cmp(b),
            (Ok(_), Err(_)) => std::cmp::Ordering::Less,
            (Err(_), Ok(_)) => std::cmp::Ordering::Greater,
            (Err(_), Err(_)) => std::cmp::Ordering::Equal,
        });
        results
    }

    /// Writes `machine` to `path` as pretty-printed JSON.
    pub fn save_machine(machine: &Machine, path: &Path) -> Result<(), AutomatonError> {
        let content = serde_json::to_string_pretty(machine)?;
        fs::write(path, content).map_err(|e| {
            AutomatonError::FileError(format!("Failed to write file {}: {}", path.display(), e))
        })
    }
}
