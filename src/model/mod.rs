//! Molecular graph types shared by the SMILES reader and the embedders.
//!
//! - [`types`] – Periodic table elements, valence tables and bond orders.
//! - [`molecule`] – Atoms, bonds and the adjacency-indexed [`Molecule`] graph.
//!
//! [`Molecule`]: molecule::Molecule

pub mod molecule;
pub mod types;
