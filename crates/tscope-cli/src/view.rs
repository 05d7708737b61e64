use std::io::Write;

use clap::Args;
use tscope::{Inspector, ManifestStore};

use crate::error::Result;
use crate::heatmap;
use crate::store::{StoreArgs, parse_fixed, parse_identifier, parse_pair};

/// How the slice is laid out on the character surface.
#[derive(Debug, Clone, Args)]
pub struct SurfaceArgs {
    /// Surface width in characters; pooling keeps the grid near this width.
    #[arg(long, default_value_t = 64)]
    pub width: u32,

    /// Surface height in characters.
    #[arg(long, default_value_t = 32)]
    pub height: u32,

    /// Wheel steps to zoom around the slice center (negative zooms out).
    #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
    pub zoom: i32,

    /// Print the value under data point `X,Y`.
    #[arg(long)]
    pub probe: Option<String>,
}

#[derive(Debug, Clone, Args)]
pub struct ViewArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    #[command(flatten)]
    pub surface: SurfaceArgs,

    /// Tensor identifier.
    pub id: String,

    /// Displayed axes as `Y,X`.
    #[arg(long)]
    pub axes: Option<String>,

    /// Pin a non-displayed axis, `AXIS=INDEX`; repeatable.
    #[arg(long = "fix")]
    pub fixed: Vec<String>,
}

#[derive(Debug, Clone, Args)]
pub struct DiffArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    #[command(flatten)]
    pub surface: SurfaceArgs,

    /// Left tensor identifier.
    pub left: String,

    /// Right tensor identifier.
    pub right: String,
}

pub fn run_view(args: ViewArgs, out: &mut dyn Write) -> Result<()> {
    let mut inspector = args.store.open()?;
    inspector.on_resize(args.surface.width, args.surface.height);
    inspector.show_tensor(&parse_identifier(&args.id)?)?;
    if let Some(raw) = &args.axes {
        let (y, x) = parse_pair(raw, "--axes")?;
        inspector.select_axes(y, x)?;
    }
    for raw in &args.fixed {
        let (axis, index) = parse_fixed(raw)?;
        inspector.set_fixed_index(axis, index)?;
    }
    if let Some(projector) = inspector.projector() {
        for fixed in projector.fixed_axes() {
            writeln!(out, "{}: {} of {}", fixed.label, fixed.index, fixed.len)?;
        }
    }
    present(&mut inspector, &args.surface, out)
}

pub fn run_diff(args: DiffArgs, out: &mut dyn Write) -> Result<()> {
    let mut inspector = args.store.open()?;
    inspector.on_resize(args.surface.width, args.surface.height);
    let left = parse_identifier(&args.left)?;
    let right = parse_identifier(&args.right)?;
    inspector.show_difference(&left, &right)?;
    writeln!(out, "|{left} - {right}|")?;
    present(&mut inspector, &args.surface, out)
}

fn present(
    inspector: &mut Inspector<ManifestStore>,
    surface: &SurfaceArgs,
    out: &mut dyn Write,
) -> Result<()> {
    if surface.zoom != 0
        && let Some(viewport) = inspector.viewport()
    {
        let (x0, x1) = viewport.x_range();
        let (y0, y1) = viewport.y_range();
        inspector.on_wheel(surface.zoom, (x0 + x1) / 2.0, (y0 + y1) / 2.0)?;
    }

    let viewport = inspector.viewport();
    for line in heatmap::render_lines(&inspector.render(), viewport.as_ref()) {
        writeln!(out, "{line}")?;
    }
    if let Some(raw) = &surface.probe {
        let (x, y) = parse_pair(raw, "--probe")?;
        if let Some(text) = inspector.probe(x, y) {
            writeln!(out, "{text}")?;
        }
    }
    Ok(())
}
