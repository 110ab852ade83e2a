//! Physicochemical properties of a protein sequence
//!
//! Average residue masses and pK values follow the ExPASy ProtParam tables, so
//! results agree with ProtParam and Biopython for the same sequence.

use abseq_common::{AbseqError, Result};
use serde::{Deserialize, Serialize};

/// Average mass of water, lost once per peptide bond
pub const WATER_MASS: f64 = 18.01528;

/// Letters dropped before the pI and extinction calculations
const AMBIGUOUS: &[char] = &['B', 'J', 'O', 'U', 'X', 'Z'];

const PH_MIN: f64 = 4.05;
const PH_MAX: f64 = 12.0;
const PH_START: f64 = 7.775;
const PH_TOLERANCE: f64 = 1e-4;

const PK_N_TERM: f64 = 9.0;
const PK_C_TERM: f64 = 2.0;

/// Side chains that carry positive charge
const POSITIVE_PK: &[(char, f64)] = &[('K', 10.0), ('R', 12.0), ('H', 5.98)];

/// Side chains that carry negative charge
const NEGATIVE_PK: &[(char, f64)] = &[('D', 4.05), ('E', 4.45), ('C', 9.0), ('Y', 10.0)];

/// Average mass of a free amino acid in Daltons
fn amino_acid_mass(residue: char) -> Option<f64> {
    let mass = match residue {
        'A' => 89.0932,
        'C' => 121.1582,
        'D' => 133.1027,
        'E' => 147.1293,
        'F' => 165.1891,
        'G' => 75.0666,
        'H' => 155.1546,
        'I' => 131.1729,
        'K' => 146.1876,
        'L' => 131.1729,
        'M' => 149.2113,
        'N' => 132.1179,
        'O' => 255.3134,
        'P' => 115.1305,
        'Q' => 146.1445,
        'R' => 174.201,
        'S' => 105.0926,
        'T' => 119.1192,
        'U' => 168.0532,
        'V' => 117.1463,
        'W' => 204.2252,
        'Y' => 181.1885,
        _ => return None,
    };
    Some(mass)
}

/// N-terminal pK for residues that shift it
fn n_terminal_pk(residue: char) -> f64 {
    match residue {
        'A' => 7.59,
        'M' => 7.0,
        'S' => 6.93,
        'P' => 8.36,
        'T' => 6.82,
        'V' => 7.44,
        'E' => 7.7,
        _ => PK_N_TERM,
    }
}

/// C-terminal pK for residues that shift it
fn c_terminal_pk(residue: char) -> f64 {
    match residue {
        'D' => 4.55,
        'E' => 4.75,
        _ => PK_C_TERM,
    }
}

/// Summary properties of one sequence
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhysicochemicalProperties {
    pub molecular_weight_kda: f64,
    pub isoelectric_point: f64,
    /// Per kDa, assuming all cysteines form cystines
    pub extinction_coefficient: f64,
}

impl PhysicochemicalProperties {
    pub fn calculate(sequence: &str) -> Result<Self> {
        let molecular_weight_kda = molecular_weight_kda(sequence)?;
        Ok(Self {
            molecular_weight_kda,
            isoelectric_point: isoelectric_point(sequence)?,
            extinction_coefficient: extinction_coefficient(sequence, molecular_weight_kda)?,
        })
    }
}

/// Molecular weight in kDa, ignoring `X`
pub fn molecular_weight_kda(sequence: &str) -> Result<f64> {
    let residues: Vec<char> = sequence
        .chars()
        .map(|c| c.to_ascii_uppercase())
        .filter(|&c| c != 'X')
        .collect();
    if residues.is_empty() {
        return Err(AbseqError::InvalidSequence("no residues to weigh".to_string()));
    }

    let mut total = 0.0;
    for &residue in &residues {
        total += amino_acid_mass(residue).ok_or_else(|| {
            AbseqError::InvalidSequence(format!("'{residue}' is not an unambiguous amino acid"))
        })?;
    }

    let bonds = (residues.len() - 1) as f64;
    Ok((total - bonds * WATER_MASS) / 1000.0)
}

/// Isoelectric point by bisection on the net charge
pub fn isoelectric_point(sequence: &str) -> Result<f64> {
    let residues: Vec<char> = sequence
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| c.to_ascii_uppercase())
        .filter(|c| !AMBIGUOUS.contains(c))
        .collect();

    let (Some(&first), Some(&last)) = (residues.first(), residues.last()) else {
        return Err(AbseqError::InvalidSequence(
            "no residues left for the isoelectric point".to_string(),
        ));
    };

    let count = |aa: char| residues.iter().filter(|&&c| c == aa).count() as f64;
    let positive: Vec<(f64, f64)> = POSITIVE_PK
        .iter()
        .map(|&(aa, pk)| (count(aa), pk))
        .chain(std::iter::once((1.0, n_terminal_pk(first))))
        .collect();
    let negative: Vec<(f64, f64)> = NEGATIVE_PK
        .iter()
        .map(|&(aa, pk)| (count(aa), pk))
        .chain(std::iter::once((1.0, c_terminal_pk(last))))
        .collect();

    let (mut low, mut high, mut ph) = (PH_MIN, PH_MAX, PH_START);
    while high - low > PH_TOLERANCE {
        if net_charge(ph, &positive, &negative) > 0.0 {
            low = ph;
        } else {
            high = ph;
        }
        ph = (low + high) / 2.0;
    }

    Ok(ph)
}

fn net_charge(ph: f64, positive: &[(f64, f64)], negative: &[(f64, f64)]) -> f64 {
    let positive: f64 = positive
        .iter()
        .map(|&(n, pk)| n / (10f64.powf(ph - pk) + 1.0))
        .sum();
    let negative: f64 = negative
        .iter()
        .map(|&(n, pk)| n / (10f64.powf(pk - ph) + 1.0))
        .sum();
    positive - negative
}

/// Mass extinction coefficient at 280 nm
pub fn extinction_coefficient(sequence: &str, molecular_weight_kda: f64) -> Result<f64> {
    if !(molecular_weight_kda.is_finite() && molecular_weight_kda > 0.0) {
        return Err(AbseqError::InvalidSequence(format!(
            "molecular weight must be positive, got {molecular_weight_kda}"
        )));
    }

    let (mut w, mut y, mut c) = (0u32, 0u32, 0u32);
    for residue in sequence.chars().map(|c| c.to_ascii_uppercase()) {
        match residue {
            'W' => w += 1,
            'Y' => y += 1,
            'C' => c += 1,
            _ => {},
        }
    }
    let cystines = c / 2;

    let molar = f64::from(w) * 5500.0 + f64::from(y) * 1490.0 + f64::from(cystines) * 125.0;
    Ok(molar / molecular_weight_kda / 1000.0)
}
