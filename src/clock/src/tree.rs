//! The clock tree, as data.
//!
//! Definitions live in an arena and refer to their parent by index. Before anything
//! is registered, [`ClockTree::topological_order`] checks that the definitions form
//! a single tree and produces a parents-first registration order.

use crate::{
    hw::RegisterView,
    registry::{self, Clock, ClockNode, MAX_CLOCKS, Registry},
    variant::{ClockKind, Derivation, Variant},
};
use heapless::Vec;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    #[error("clock tree contains a cycle")]
    CyclicTree,

    #[error("clock tree must have exactly one root (found {0})")]
    InvalidRoot(usize),

    #[error("clock `{clock}` refers to nonexistent parent #{parent}")]
    UnknownParent { clock: &'static str, parent: usize },

    #[error("clock tree is full")]
    TreeFull,

    #[error(transparent)]
    Register(#[from] registry::Error),
}

/// A clock definition within a [`ClockTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockDef {
    pub name: &'static str,
    /// Index of the parent definition within the same tree.
    pub parent: Option<usize>,
    pub derivation: Derivation,
}

#[derive(Debug, Default, Clone)]
pub struct ClockTree {
    defs: Vec<ClockDef, MAX_CLOCKS>,
}

impl ClockTree {
    pub const fn new() -> Self {
        Self { defs: Vec::new() }
    }

    /// The Loongson-1 clock tree on `variant`.
    pub fn ls1x(variant: Variant) -> Self {
        let defs = ClockKind::ALL
            .iter()
            .map(|&kind| ClockDef {
                name: kind.name(),
                parent: variant
                    .parent_of(kind)
                    .and_then(|parent| ClockKind::ALL.iter().position(|&other| other == parent)),
                derivation: Derivation::new(kind, variant),
            })
            .collect();

        Self { defs }
    }

    /// Adds `def` to the tree, returning its index.
    pub fn push(&mut self, def: ClockDef) -> Result<usize, Error> {
        let index = self.defs.len();
        self.defs.push(def).map_err(|_| Error::TreeFull)?;

        Ok(index)
    }

    pub fn defs(&self) -> &[ClockDef] {
        &self.defs
    }

    /// Indices of the definitions, ordered so every clock comes after its parent.
    pub fn topological_order(&self) -> Result<Vec<usize, MAX_CLOCKS>, Error> {
        if let Some(def) = self
            .defs
            .iter()
            .find(|def| def.parent.is_some_and(|parent| parent >= self.defs.len()))
        {
            return Err(Error::UnknownParent {
                clock: def.name,
                parent: def.parent.unwrap_or_default(),
            });
        }

        let mut order = Vec::<usize, MAX_CLOCKS>::new();
        let mut placed = [false; MAX_CLOCKS];

        for (index, _) in self.defs.iter().enumerate().filter(|(_, def)| def.parent.is_none()) {
            order.push(index).map_err(|_| Error::TreeFull)?;
            placed[index] = true;
        }

        if order.len() != 1 {
            return Err(Error::InvalidRoot(order.len()));
        }

        // Each pass places every clock whose parent has been placed. A pass that
        // places nothing means the remaining clocks only reach each other.
        while order.len() < self.defs.len() {
            let placed_before = order.len();

            for (index, def) in self.defs.iter().enumerate() {
                if !placed[index] && def.parent.is_some_and(|parent| placed[parent]) {
                    order.push(index).map_err(|_| Error::TreeFull)?;
                    placed[index] = true;
                }
            }

            if order.len() == placed_before {
                return Err(Error::CyclicTree);
            }
        }

        trace!("Clock registration order: {order:?}");

        Ok(order)
    }

    /// Registers every clock into `registry`, parents first.
    ///
    /// Stops at the first clock that fails to register; clocks registered before it
    /// stay registered.
    pub fn register_all(
        &self,
        registry: &Registry,
        registers: &dyn RegisterView,
    ) -> Result<Vec<Clock, MAX_CLOCKS>, Error> {
        let order = self.topological_order()?;
        let mut clocks = Vec::new();

        for index in order {
            let def = &self.defs[index];
            let clock = registry.register(
                ClockNode {
                    name: def.name,
                    parent: def.parent.map(|parent| self.defs[parent].name),
                    derivation: def.derivation,
                },
                registers,
            )?;

            clocks.push(clock).map_err(|_| Error::TreeFull)?;
        }

        Ok(clocks)
    }
}
