//! Operation: display a module's dependency tree, closure, or dependents.

use std::path::Path;

use modguard_core::config::ModguardConfig;
use modguard_graph::closure::closure;

use crate::ops_scan;

/// Options for `modguard tree`.
#[derive(Debug, Default)]
pub struct TreeOptions {
    /// Module whose tree is shown.
    pub module: String,
    /// Maximum tree depth to display.
    pub depth: Option<usize>,
    /// Show the dependency chain from `module` to this module.
    pub why: Option<String>,
    /// Show the modules that depend on `module` instead.
    pub inverted: bool,
    /// Print the flat closure instead of a tree.
    pub flat: bool,
}

/// Display the dependency tree for one module.
pub fn tree(root: &Path, config: &ModguardConfig, opts: &TreeOptions) -> miette::Result<()> {
    let graph = ops_scan::load_graph(root, config)?;

    if let Some(ref target) = opts.why {
        match graph.find_path(&opts.module, target)? {
            Some(path) => {
                println!("Path from {} to {target}:", opts.module);
                for (i, module) in path.iter().enumerate() {
                    let indent = "  ".repeat(i);
                    println!("{indent}{module}");
                }
            }
            None => println!("'{target}' is not a dependency of '{}'.", opts.module),
        }
        return Ok(());
    }

    if opts.inverted {
        print!("{}", graph.print_inverted_tree(&opts.module)?);
        return Ok(());
    }

    if opts.flat {
        let members = closure(&graph, &opts.module)?;
        println!("{} ({} module(s))", opts.module, members.len());
        for id in &members {
            println!("  {id}");
        }
        return Ok(());
    }

    print!("{}", graph.print_tree(&opts.module, opts.depth)?);
    Ok(())
}
