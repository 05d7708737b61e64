use std::io::Write;
use std::path::PathBuf;

use clap::Args;
use tscope::{Identifier, ManifestStore, Tensor};

use crate::error::{CliError, Result};

#[derive(Debug, Clone, Args)]
pub struct SeedDemoArgs {
    /// Directory to write the demo store into.
    #[arg(long)]
    pub out: PathBuf,

    /// Number of records to capture (`rec1`, `rec2`, ...).
    #[arg(long, default_value_t = 2, value_parser = clap::value_parser!(u32).range(1..=9))]
    pub records: u32,
}

/// Smooth pattern in `[0, 1]`.
fn wave(i: usize, j: usize, phase: f32) -> f32 {
    let (y, x) = (i as f32 / 8.0, j as f32 / 8.0);
    0.5 + 0.25 * (x + phase).sin() + 0.25 * (y - phase).cos()
}

fn activation(record: u32) -> Result<Tensor> {
    let (c, h, w) = (4, 32, 32);
    let mut values = Vec::with_capacity(c * h * w);
    for ch in 0..c {
        for i in 0..h {
            for j in 0..w {
                let mut v = wave(i, j, ch as f32 * 0.7);
                // Later records carry a hot spot in channel 2.
                if record > 1 && ch == 2 && (12..16).contains(&i) && (20..24).contains(&j) {
                    v += 0.3 * (record - 1) as f32;
                }
                values.push(v);
            }
        }
    }
    Ok(Tensor::from_f32(&[1, c, h, w], values)?)
}

fn weights(record: u32) -> Result<Tensor> {
    let n = 8 * 3 * 3 * 3;
    let values = (0..n)
        .map(|k| ((k % 17) as f32 - 8.0) / 16.0 + 1e-3 * (record - 1) as f32)
        .collect();
    Ok(Tensor::from_f32(&[8, 3, 3, 3], values)?)
}

fn logits(record: u32) -> Result<Tensor> {
    let values = (0..10).map(|k| k as f32 * 0.1 + 0.05 * (record - 1) as f32).collect();
    Ok(Tensor::from_f32(&[1, 10], values)?)
}

fn demo_tensors(records: u32) -> Result<Vec<(Identifier, Tensor)>> {
    let mut tensors = Vec::new();
    for record in 1..=records {
        let id = |leaf: &str| Identifier::new(format!("demo.rec{record}.{leaf}"));
        tensors.push((id("stem.conv.weight")?, weights(record)?));
        tensors.push((id("stem.act")?, activation(record)?));
        tensors.push((id("head.logits")?, logits(record)?));
        tensors.push((id("head.labels")?, Tensor::from_i32(&[4], vec![3, 1, 4, 1])?));
        tensors.push((id("step")?, Tensor::scalar_f32(record as f32)));
    }
    // Only the first record has a probe, so later records see it unmatched.
    tensors.push((
        Identifier::new("demo.rec1.stem.probe")?,
        Tensor::from_f32(&[16], (0..16).map(|v| v as f32).collect())?,
    ));
    Ok(tensors)
}

pub fn run_seed_demo(args: SeedDemoArgs, out: &mut dyn Write) -> Result<()> {
    if args.out.is_file() {
        return Err(CliError::invalid(format!(
            "{} exists and is not a directory",
            args.out.display()
        )));
    }
    let tensors = demo_tensors(args.records)?;
    let store = ManifestStore::create(&args.out, tensors.iter().map(|(id, t)| (id.clone(), t)))?;
    tracing::info!(
        target: "tscope.cli",
        root = %store.root().display(),
        tensors = tensors.len(),
        "demo store written"
    );
    writeln!(
        out,
        "wrote {} tensors for {} records to {}",
        tensors.len(),
        args.records,
        store.root().display()
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_records_share_a_layout() {
        let tensors = demo_tensors(2).unwrap();
        assert_eq!(tensors.len(), 11);
        let rec2: Vec<_> = tensors
            .iter()
            .filter(|(id, _)| id.contains_segment("rec2"))
            .collect();
        assert_eq!(rec2.len(), 5);
    }

    #[test]
    fn hot_spot_only_in_later_records() {
        let a = activation(1).unwrap();
        let b = activation(2).unwrap();
        assert_eq!(a.value_at(&[0, 0, 13, 21]), Some(f64::from(wave(13, 21, 0.0))));
        let delta = b.value_at(&[0, 2, 13, 21]).unwrap() - a.value_at(&[0, 2, 13, 21]).unwrap();
        assert!((delta - 0.3).abs() < 1e-6);
        assert_eq!(a.value_at(&[0, 1, 13, 21]), b.value_at(&[0, 1, 13, 21]));
    }
}
