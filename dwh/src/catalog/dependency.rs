//! Foreign key dependency graph between warehouse tables.
//!
//! Orders are computed with Kahn's algorithm. Whenever several tables are ready at the same time
//! the caller supplied priority decides, so every order is deterministic.

use std::collections::{BTreeSet, HashMap};

use dwh_postgres::schema::TableName;

use crate::bail;
use crate::catalog::table::{TableDefinition, TableRole};
use crate::error::{DwhResult, ErrorKind};

/// Graph of `table -> referenced tables` edges.
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    tables: Vec<(TableName, TableRole)>,
    /// For each table index, the indexes of the tables it references.
    references: Vec<BTreeSet<usize>>,
}

impl DependencyGraph {
    /// Builds the graph from table definitions.
    ///
    /// Fails when a table is declared twice or references a table that is not declared.
    pub fn from_tables(definitions: &[TableDefinition]) -> DwhResult<DependencyGraph> {
        let mut positions: HashMap<&TableName, usize> = HashMap::new();
        for (index, definition) in definitions.iter().enumerate() {
            if positions.insert(&definition.name, index).is_some() {
                bail!(
                    ErrorKind::InvalidState,
                    "Table declared more than once",
                    format!("table `{}` appears more than once", definition.name)
                );
            }
        }

        let mut references = Vec::with_capacity(definitions.len());
        for definition in definitions {
            let mut edges = BTreeSet::new();
            for referenced in definition.referenced_tables() {
                let Some(&target) = positions.get(referenced) else {
                    bail!(
                        ErrorKind::CatalogUnknownTable,
                        "Foreign key references an undeclared table",
                        format!(
                            "table `{}` references `{}`, which is not declared",
                            definition.name, referenced
                        )
                    );
                };
                edges.insert(target);
            }
            references.push(edges);
        }

        Ok(DependencyGraph {
            tables: definitions
                .iter()
                .map(|definition| (definition.name.clone(), definition.role))
                .collect(),
            references,
        })
    }

    /// Returns the tables `table` references, or `None` when `table` is not in the graph.
    pub fn referenced_by(&self, table: &TableName) -> Option<Vec<&TableName>> {
        let index = self.position(table)?;
        Some(
            self.references[index]
                .iter()
                .map(|&target| &self.tables[target].0)
                .collect(),
        )
    }

    /// Returns `true` when `table` has a foreign key to `referenced`.
    pub fn references(&self, table: &TableName, referenced: &TableName) -> bool {
        match (self.position(table), self.position(referenced)) {
            (Some(from), Some(to)) => self.references[from].contains(&to),
            _ => false,
        }
    }

    /// Order in which tables can be created: every table after the tables it references.
    ///
    /// Ties are broken by declaration order.
    pub fn create_order(&self) -> DwhResult<Vec<TableName>> {
        self.topological_order(Direction::ReferencedFirst, |index, _| index)
    }

    /// Order in which tables can be dropped: every table before the tables it references.
    ///
    /// Ties are broken by role (staging, then fact, then dimension) and then by declaration order.
    pub fn drop_order(&self) -> DwhResult<Vec<TableName>> {
        self.topological_order(Direction::ReferencingFirst, |index, role| (role, index))
    }

    fn position(&self, table: &TableName) -> Option<usize> {
        self.tables.iter().position(|(name, _)| name == table)
    }

    fn topological_order<K, F>(&self, direction: Direction, priority: F) -> DwhResult<Vec<TableName>>
    where
        K: Ord,
        F: Fn(usize, TableRole) -> K,
    {
        let count = self.tables.len();

        // `prerequisites[i]` are the tables that must be emitted before table `i`.
        let mut prerequisites: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); count];
        for (from, targets) in self.references.iter().enumerate() {
            for &to in targets {
                match direction {
                    Direction::ReferencedFirst => prerequisites[from].insert(to),
                    Direction::ReferencingFirst => prerequisites[to].insert(from),
                };
            }
        }

        let mut pending: Vec<usize> = prerequisites.iter().map(BTreeSet::len).collect();
        let mut ready: BTreeSet<(K, usize)> = pending
            .iter()
            .enumerate()
            .filter(|(_, remaining)| **remaining == 0)
            .map(|(index, _)| (priority(index, self.tables[index].1), index))
            .collect();

        let mut order = Vec::with_capacity(count);
        while let Some((_, index)) = ready.pop_first() {
            order.push(self.tables[index].0.clone());

            for (dependent, required) in prerequisites.iter().enumerate() {
                if required.contains(&index) {
                    pending[dependent] -= 1;
                    if pending[dependent] == 0 {
                        ready.insert((priority(dependent, self.tables[dependent].1), dependent));
                    }
                }
            }
        }

        if order.len() < count {
            let cyclic = self
                .tables
                .iter()
                .enumerate()
                .filter(|(index, _)| pending[*index] > 0)
                .map(|(_, (name, _))| name.as_str())
                .collect::<Vec<_>>()
                .join(", ");

            bail!(
                ErrorKind::CatalogDependencyCycle,
                "Foreign keys form a cycle",
                format!("tables involved in or blocked by the cycle: {cyclic}")
            );
        }

        Ok(order)
    }
}

#[derive(Debug, Clone, Copy)]
enum Direction {
    ReferencedFirst,
    ReferencingFirst,
}
