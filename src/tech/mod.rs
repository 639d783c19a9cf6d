//! The tech-tree pipeline: parse a hand-authored tree description,
//! verify its declared costs, synthesise the missing intermediates
//! deterministically, verify the result, and dump the canonical
//! database plus a graphviz view of the dependency DAG.

pub mod bits;
pub mod check;
pub mod dump;
pub mod edges;
pub mod r#gen;
pub mod node;
pub mod parse;
pub mod tree;


pub use tree::Tree;

use crate::config::{Errors, Reader};
use std::path::Path;

/// run the full pipeline; returns the number of recorded errors. Any
/// error suppresses the dumps so stale outputs never reach the build.
pub fn run(res: &Path, src: &Path, output: &Path) -> anyhow::Result<usize> {
    let mut tree = Tree::new();

    let mut input = Reader::from_path(&res.join("tech.lisp"))?;
    parse::parse(&mut tree, &mut input);
    let mut errs: Errors = input.into_errors();

    check::inputs(&mut tree, &mut errs);
    r#gen::generate(&mut tree);
    check::outputs(&tree, &mut errs);

    if !errs.is_empty() {
        return Ok(errs.len());
    }

    dump::dump(&tree, src, output)?;
    log::info!("tech: {} nodes", tree.live().count());
    Ok(0)
}
