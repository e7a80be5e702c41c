use std::fmt;

use nalgebra::Matrix2;
use serde::{Deserialize, Serialize};

use super::pattern::MoirePattern;
use crate::symbolic::format_matrix;
use crate::Result;

type MatrixText = [[String; 2]; 2];
type MatrixValues = [[f64; 2]; 2];

fn text<T: ToString>(mat: &Matrix2<T>) -> MatrixText {
    [
        [mat[(0, 0)].to_string(), mat[(0, 1)].to_string()],
        [mat[(1, 0)].to_string(), mat[(1, 1)].to_string()],
    ]
}

fn values(mat: &Matrix2<f64>) -> MatrixValues {
    [[mat[(0, 0)], mat[(0, 1)]], [mat[(1, 0)], mat[(1, 1)]]]
}

/// Everything known about a pattern, rendered for printing or JSON export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternReport {
    pub a: MatrixText,
    pub b: MatrixText,
    pub e: MatrixText,
    pub free_symbols: Vec<String>,
    pub supercell: Option<SupercellReport>,
    pub approx_a: Option<MatrixValues>,
    pub approx_b: Option<MatrixValues>,
}

/// Supercell data, present once `C` is known.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupercellReport {
    pub c: MatrixText,
    pub d: MatrixText,
    pub d_hnf: MatrixText,
    pub m: MatrixText,
    pub relative_volume: String,
    pub commensurate_cell: MatrixText,
    pub approx_commensurate_cell: Option<MatrixValues>,
}

impl PatternReport {
    pub fn from_pattern(pattern: &MoirePattern) -> Result<Self> {
        let supercell = if pattern.is_fully_determined() {
            Some(SupercellReport {
                c: text(&pattern.c_matrix()?),
                d: text(&pattern.d_matrix()?),
                d_hnf: text(&pattern.d_matrix_hnf()?),
                m: text(&pattern.m_matrix()?),
                relative_volume: pattern.relative_supercell_volume()?.to_string(),
                commensurate_cell: text(&pattern.commensurate_cell()?),
                approx_commensurate_cell: pattern.approx_commensurate_cell().ok().map(|m| values(&m)),
            })
        } else {
            None
        };

        let approx = pattern.approx_cells().ok();
        Ok(Self {
            a: text(pattern.a_matrix()),
            b: text(pattern.b_matrix()),
            e: text(pattern.e_matrix()),
            free_symbols: pattern.free_symbols().iter().map(|s| s.to_string()).collect(),
            supercell,
            approx_a: approx.as_ref().map(|(a, _)| values(a)),
            approx_b: approx.as_ref().map(|(_, b)| values(b)),
        })
    }
}

fn rows(mat: &MatrixText) -> String {
    format!("[[{}, {}], [{}, {}]]", mat[0][0], mat[0][1], mat[1][0], mat[1][1])
}

fn float_rows(mat: &MatrixValues) -> String {
    format_matrix(&Matrix2::new(mat[0][0], mat[0][1], mat[1][0], mat[1][1]).map(|x| format!("{:.6}", x)))
}

impl fmt::Display for PatternReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "A = {}", rows(&self.a))?;
        writeln!(f, "B = {}", rows(&self.b))?;
        writeln!(f, "E = {}", rows(&self.e))?;
        if !self.free_symbols.is_empty() {
            writeln!(f, "free symbols: {}", self.free_symbols.join(", "))?;
        }
        match &self.supercell {
            Some(cell) => {
                writeln!(f, "C = {}", rows(&cell.c))?;
                writeln!(f, "D = {}", rows(&cell.d))?;
                writeln!(f, "D (HNF) = {}", rows(&cell.d_hnf))?;
                writeln!(f, "M = {}", rows(&cell.m))?;
                writeln!(f, "relative supercell volume = {}", cell.relative_volume)?;
                writeln!(f, "C·A = {}", rows(&cell.commensurate_cell))?;
                if let Some(approx) = &cell.approx_commensurate_cell {
                    writeln!(f, "C·A ≈ {}", float_rows(approx))?;
                }
            }
            None => writeln!(f, "C not determined yet")?,
        }
        if let (Some(a), Some(b)) = (&self.approx_a, &self.approx_b) {
            writeln!(f, "A ≈ {}", float_rows(a))?;
            writeln!(f, "B ≈ {}", float_rows(b))?;
        }
        Ok(())
    }
}
