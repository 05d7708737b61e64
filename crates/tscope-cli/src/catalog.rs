use std::io::Write;

use clap::Args;
use tscope::{Outline, OutlineGuides};

use crate::error::Result;
use crate::store::StoreArgs;

#[derive(Debug, Clone, Args)]
pub struct CatalogArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    /// Draw the tree with ASCII guides.
    #[arg(long)]
    pub ascii: bool,

    /// List every tensor with its element type and shape instead of the tree.
    #[arg(long)]
    pub long: bool,
}

pub fn run_catalog(args: CatalogArgs, out: &mut dyn Write) -> Result<()> {
    let inspector = args.store.open()?;
    if args.long {
        for meta in inspector.catalog().iter() {
            writeln!(
                out,
                "{}\t{}\t{:?}",
                meta.identifier, meta.element_type, meta.shape
            )?;
        }
    } else {
        let guides = if args.ascii {
            OutlineGuides::Ascii
        } else {
            OutlineGuides::Unicode
        };
        for line in Outline::new(inspector.tree()).guides(guides).lines() {
            writeln!(out, "{line}")?;
        }
    }
    writeln!(out, "{} tensors", inspector.catalog().len())?;
    Ok(())
}
