//! Parent lookups over one pull of a reader.

use std::collections::{HashMap, HashSet};

use crate::error::{Result, ScanError};
use crate::reader::Reader;
use crate::types::Process;

/// Static pid → process map. Build a new one to see later changes.
#[derive(Debug, Clone, Default)]
pub struct Tree {
    processes: HashMap<i32, Process>,
}

impl Tree {
    pub fn new(reader: &dyn Reader) -> Result<Self> {
        let mut processes = HashMap::new();
        reader.processes(&mut |p| {
            processes.insert(p.pid, p);
        })?;
        Ok(Self { processes })
    }

    pub fn parent(&self, pid: i32) -> Result<i32> {
        self.processes
            .get(&pid)
            .map(|p| p.ppid)
            .ok_or(ScanError::PidNotFound(pid))
    }

    pub fn get(&self, pid: i32) -> Option<&Process> {
        self.processes.get(&pid)
    }

    /// Walk the PPID chain from `pid` upward, starting with `pid` itself.
    ///
    /// Stops at PID 0, at a parent missing from the tree, or on a cycle.
    pub fn ancestors(&self, pid: i32) -> Result<Vec<i32>> {
        let mut chain = Vec::new();
        let mut visited = HashSet::new();
        let mut current = pid;

        let mut ppid = self.parent(current)?;
        loop {
            if !visited.insert(current) {
                break;
            }
            chain.push(current);
            if ppid == 0 {
                break;
            }
            current = ppid;
            ppid = match self.parent(current) {
                Ok(ppid) => ppid,
                Err(_) => break,
            };
        }

        Ok(chain)
    }

    pub fn len(&self) -> usize {
        self.processes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::cache::tests::{process, MockReader};

    fn tree(processes: Vec<Process>) -> Tree {
        let mock = Arc::new(MockReader::default());
        *mock.processes.lock().unwrap() = processes;
        Tree::new(&mock).unwrap()
    }

    #[test]
    fn test_parent_lookup() {
        let t = tree(vec![process(1, 0, "init"), process(2, 1, "bash"), process(3, 2, "curl")]);

        assert_eq!(t.parent(3).unwrap(), 2);
        assert_eq!(t.parent(1).unwrap(), 0);
        assert_eq!(t.len(), 3);
    }

    #[test]
    fn test_unknown_pid_is_an_error() {
        let t = tree(vec![process(1, 0, "init")]);

        let err = t.parent(42).unwrap_err();

        assert!(matches!(err, ScanError::PidNotFound(42)));
        assert_eq!(err.to_string(), "PID 42 not found");
    }

    #[test]
    fn test_ancestors_walk_to_root() {
        let t = tree(vec![process(1, 0, "init"), process(2, 1, "bash"), process(3, 2, "curl")]);
        assert_eq!(t.ancestors(3).unwrap(), vec![3, 2, 1]);
    }

    #[test]
    fn test_ancestors_stop_at_missing_parent() {
        let t = tree(vec![process(7, 5, "orphan")]);
        assert_eq!(t.ancestors(7).unwrap(), vec![7]);
    }

    #[test]
    fn test_ancestors_survive_cycles() {
        let t = tree(vec![process(8, 9, "a"), process(9, 8, "b")]);
        assert_eq!(t.ancestors(8).unwrap(), vec![8, 9]);
    }

    #[test]
    fn test_tree_is_a_static_view() {
        let mock = Arc::new(MockReader::default());
        *mock.processes.lock().unwrap() = vec![process(1, 0, "init")];
        let t = Tree::new(&mock).unwrap();

        mock.processes.lock().unwrap().push(process(2, 1, "late"));

        assert!(t.parent(2).is_err());
        assert!(Tree::new(&mock).unwrap().parent(2).is_ok());
    }
}
