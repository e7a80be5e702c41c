use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use env_logger::Env;
use log::{debug, info};
use nalgebra::Matrix2;
use num_bigint::BigInt;

use moire::config::SearchLimits;
use moire::exact::{
    find_nicer_cell_with_limits, hex_index, prim_rotation_moire_abc, prim_rotation_moire_pq,
    prim_scaled_rotation_moire_abck, prim_special_reflection_moire, rotation_diophantine_triple,
    ugliness, MoirePattern, PatternReport,
};
use moire::symbolic::{format_matrix, Expr, ExprMatrix};

#[derive(Parser)]
#[command(name = "moire")]
#[command(about = "Exact commensurate supercells of twisted and reflected 2D lattices")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Print reports as JSON
    #[arg(long, global = true)]
    json: bool,

    /// JSON file overriding the search limits
    #[arg(long, global = true)]
    limits: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Rotation moire indexed by coprime (p, q)
    RotationPq {
        #[arg(long, default_value = "3")]
        beta: Expr,
        #[arg(allow_negative_numbers = true)]
        p: Expr,
        #[arg(allow_negative_numbers = true)]
        q: Expr,
        /// Express both cells in the hexagonal basis (β = 3)
        #[arg(long)]
        hex: bool,
    },
    /// Rotation moire with cos = a/c and sin = b√β/c
    RotationAbc {
        #[arg(long, default_value = "3")]
        beta: Expr,
        #[arg(allow_negative_numbers = true)]
        a: Expr,
        #[arg(allow_negative_numbers = true)]
        b: Expr,
        #[arg(allow_negative_numbers = true)]
        c: Expr,
        #[arg(long)]
        hex: bool,
    },
    /// Rotation combined with a scaling of determinant k
    ScaledRotation {
        #[arg(long, default_value = "3")]
        beta: Expr,
        #[arg(allow_negative_numbers = true)]
        a: Expr,
        #[arg(allow_negative_numbers = true)]
        b: Expr,
        #[arg(allow_negative_numbers = true)]
        c: Expr,
        k: Expr,
    },
    /// Reflection of the cell [[1, 0], [t, √(1 - t²)]]
    Reflection {
        #[arg(allow_negative_numbers = true)]
        t: Expr,
    },
    /// Solution of a² + β·b² = c² for the parameters (p, q)
    Triple {
        #[arg(long, default_value = "3")]
        beta: Expr,
        #[arg(allow_negative_numbers = true)]
        p: Expr,
        #[arg(allow_negative_numbers = true)]
        q: Expr,
    },
    /// Reduce an integer basis, given row by row
    NicerCell {
        #[arg(num_args = 4, allow_negative_numbers = true)]
        entries: Vec<i64>,
    },
    /// Pattern of two arbitrary cells, each given row by row
    Cells {
        #[arg(long, num_args = 4, allow_hyphen_values = true)]
        a: Vec<Expr>,
        #[arg(long, num_args = 4, allow_hyphen_values = true)]
        b: Vec<Expr>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    info!("Starting moire v{}", moire::VERSION);

    let limits = match &cli.limits {
        Some(path) => load_limits(path)?,
        None => SearchLimits::default(),
    };
    debug!("Search limits: {:?}", limits);

    match cli.command {
        Commands::RotationPq { beta, p, q, hex } => {
            info!("Rotation moire for β = {}, (p, q) = ({}, {})", beta, p, q);
            let pattern = prim_rotation_moire_pq(beta, p, q)?;
            report(in_frame(pattern, hex)?, limits, cli.json)
        }
        Commands::RotationAbc { beta, a, b, c, hex } => {
            info!("Rotation moire for β = {}, (a, b, c) = ({}, {}, {})", beta, a, b, c);
            let pattern = prim_rotation_moire_abc(beta, a, b, c)?;
            report(in_frame(pattern, hex)?, limits, cli.json)
        }
        Commands::ScaledRotation { beta, a, b, c, k } => {
            info!("Scaled rotation moire for β = {}, (a, b, c, k) = ({}, {}, {}, {})", beta, a, b, c, k);
            let pattern = prim_scaled_rotation_moire_abck(beta, a, b, c, k)?;
            report(pattern, limits, cli.json)
        }
        Commands::Reflection { t } => {
            info!("Reflection moire for t = {}", t);
            report(prim_special_reflection_moire(t)?, limits, cli.json)
        }
        Commands::Triple { beta, p, q } => {
            let (a, b, c) = rotation_diophantine_triple(beta.clone(), p, q)?;
            if cli.json {
                let triple = [a.to_string(), b.to_string(), c.to_string()];
                println!("{}", serde_json::to_string_pretty(&triple)?);
            } else {
                println!("({}, {}, {}) solves a² + {}·b² = c²", a, b, c, beta);
            }
            Ok(())
        }
        Commands::NicerCell { entries } => {
            let cell = Matrix2::from_row_slice(&entries).map(BigInt::from);
            let nicer = find_nicer_cell_with_limits(&cell, &limits)?;
            if cli.json {
                let rows = [
                    [nicer[(0, 0)].to_string(), nicer[(0, 1)].to_string()],
                    [nicer[(1, 0)].to_string(), nicer[(1, 1)].to_string()],
                ];
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else {
                println!(
                    "{} (ugliness {}) -> {} (ugliness {})",
                    format_matrix(&cell),
                    ugliness(&cell),
                    format_matrix(&nicer),
                    ugliness(&nicer)
                );
            }
            Ok(())
        }
        Commands::Cells { a, b } => {
            let pattern = MoirePattern::from_cells_with_limits(to_matrix(&a)?, to_matrix(&b)?, limits)?;
            report(pattern, limits, cli.json)
        }
    }
}

fn load_limits(path: &Path) -> Result<SearchLimits> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read limits from {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Invalid limits in {}", path.display()))
}

fn in_frame(pattern: MoirePattern, hex: bool) -> Result<MoirePattern> {
    if hex {
        Ok(pattern.visit_family_same(&hex_index())?)
    } else {
        Ok(pattern)
    }
}

fn to_matrix(entries: &[Expr]) -> Result<ExprMatrix> {
    if entries.len() != 4 {
        bail!("expected 4 matrix entries, got {}", entries.len());
    }
    Ok(Matrix2::from_row_slice(entries))
}

fn report(pattern: MoirePattern, limits: SearchLimits, json: bool) -> Result<()> {
    let pattern = if pattern.limits() == &limits {
        pattern
    } else {
        pattern.with_limits(limits)?
    };
    let report = PatternReport::from_pattern(&pattern)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", report);
    }
    Ok(())
}
