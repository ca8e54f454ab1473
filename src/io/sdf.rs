//! Multi-conformer SDF layout: one `<id>.sdf` per molecule.
//!
//! Every V2000 block is one conformation of the same molecule. The first
//! block supplies elements and bonds. Labels travel as data items:
//!
//! ```text
//! > <energy>
//! -76.402
//!
//! > <forces>
//! 0.01 0.00 -0.02
//! ...
//! ```
//!
//! `<gradients>` may replace `<forces>`, and the first block may carry a
//! whitespace separated `<partial_charges>` item.

use super::error::Error;
use super::units::Units;
use crate::model::conformation::Conformation;
use crate::model::molecule::{Bond, Molecule};
use crate::model::types::{BondOrder, Element};
use std::collections::HashMap;
use std::io::BufRead;
use std::path::Path;

type Lines = Vec<(usize, String)>;

struct Block {
    elements: Vec<Element>,
    positions: Vec<[f64; 3]>,
    bonds: Vec<Bond>,
    data: HashMap<String, Lines>,
    first_line: usize,
}

pub fn read<R: BufRead>(reader: R, path: &Path, id: &str, units: Units) -> Result<Molecule, Error> {
    let blocks = split_blocks(reader, path)?;
    if blocks.is_empty() {
        return Err(Error::invalid(path, "file contains no SDF blocks"));
    }

    let parsed: Vec<Block> = blocks
        .iter()
        .map(|lines| parse_block(lines, path))
        .collect::<Result<_, _>>()?;

    let first = &parsed[0];
    let mut molecule = Molecule::new(id);
    molecule.elements = first.elements.clone();
    molecule.bonds = first.bonds.clone();
    if let Some(lines) = first.data.get("partial_charges") {
        molecule.partial_charges = Some(parse_floats(lines, path)?);
    }

    let (e, l, f) = (units.energy_factor(), units.length_factor(), units.force_factor());
    for block in &parsed {
        if block.elements.len() == first.elements.len() && block.elements != first.elements {
            return Err(Error::parse(
                path,
                block.first_line,
                "element sequence differs from the first block",
            ));
        }

        let energy_lines = block.data.get("energy").ok_or_else(|| {
            Error::parse(path, block.first_line, "block has no <energy> data item")
        })?;
        let energy = parse_floats(energy_lines, path)?
            .first()
            .copied()
            .ok_or_else(|| Error::parse(path, block.first_line, "empty <energy> data item"))?
            * e;

        let mut positions = block.positions.clone();
        Units::scale_vectors(l, &mut positions);

        let conformation = match (block.data.get("forces"), block.data.get("gradients")) {
            (Some(lines), None) => {
                let mut forces = parse_vectors(lines, path)?;
                Units::scale_vectors(f, &mut forces);
                Conformation::new(positions, energy, forces)
            }
            (None, Some(lines)) => {
                let mut gradients = parse_vectors(lines, path)?;
                Units::scale_vectors(f, &mut gradients);
                Conformation::from_gradient(positions, energy, &gradients)
            }
            _ => {
                return Err(Error::parse(
                    path,
                    block.first_line,
                    "block needs exactly one of <forces> or <gradients>",
                ));
            }
        };
        molecule.conformations.push(conformation);
    }

    Ok(molecule)
}

fn split_blocks<R: BufRead>(reader: R, path: &Path) -> Result<Vec<Lines>, Error> {
    let mut blocks = Vec::new();
    let mut current = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let content = line.map_err(|e| Error::io(path, e))?;
        if content.trim() == "$$$$" {
            blocks.push(std::mem::take(&mut current));
            continue;
        }
        current.push((i + 1, content));
    }
    if current.iter().any(|(_, l)| !l.trim().is_empty()) {
        blocks.push(current);
    }
    Ok(blocks)
}

fn parse_block(lines: &[(usize, String)], path: &Path) -> Result<Block, Error> {
    let first_line = lines.first().map(|(ln, _)| *ln).unwrap_or(1);
    if lines.len() < 4 {
        return Err(Error::parse(
            path,
            first_line,
            "SDF block must contain at least a header and counts line",
        ));
    }

    let (counts_line_no, counts_line) = (&lines[3].0, &lines[3].1);
    if counts_line.contains("V3000") {
        return Err(Error::parse(path, *counts_line_no, "V3000 is not supported"));
    }

    let (atom_count, bond_count) = parse_counts(counts_line, *counts_line_no, path)?;
    let atom_start = 4;
    let bond_start = atom_start + atom_count;
    let bond_end = bond_start + bond_count;

    if lines.len() < bond_end {
        return Err(Error::parse(
            path,
            lines.last().map(|(ln, _)| *ln).unwrap_or(*counts_line_no),
            "SDF block ended before atoms/bonds were fully specified",
        ));
    }

    let (elements, positions) = parse_atoms(&lines[atom_start..bond_start], path)?;
    let bonds = parse_bonds(&lines[bond_start..bond_end], atom_count, path)?;
    let data = parse_data_items(&lines[bond_end..]);

    Ok(Block {
        elements,
        positions,
        bonds,
        data,
        first_line,
    })
}

fn parse_counts(line: &str, line_no: usize, path: &Path) -> Result<(usize, usize), Error> {
    let padded = format!("{line:<6}");
    let field = |range: std::ops::Range<usize>, what: &str| {
        padded
            .get(range)
            .and_then(|s| s.trim().parse::<usize>().ok())
            .ok_or_else(|| Error::parse(path, line_no, format!("invalid {what} count")))
    };
    Ok((field(0..3, "atom")?, field(3..6, "bond")?))
}

fn parse_atoms(
    lines: &[(usize, String)],
    path: &Path,
) -> Result<(Vec<Element>, Vec<[f64; 3]>), Error> {
    let mut elements = Vec::with_capacity(lines.len());
    let mut positions = Vec::with_capacity(lines.len());
    for (ln, raw) in lines {
        let padded = format!("{raw:<40}");
        let coord = |range: std::ops::Range<usize>, axis: &str| {
            padded
                .get(range)
                .and_then(|s| s.trim().parse::<f64>().ok())
                .ok_or_else(|| {
                    Error::parse(path, *ln, format!("invalid {axis} coordinate in atom line"))
                })
        };
        let position = [coord(0..10, "x")?, coord(10..20, "y")?, coord(20..30, "z")?];
        let element = padded
            .get(31..34)
            .and_then(Element::from_symbol_lenient)
            .ok_or_else(|| Error::parse(path, *ln, "unable to infer element symbol"))?;
        elements.push(element);
        positions.push(position);
    }
    Ok((elements, positions))
}

fn parse_bonds(
    lines: &[(usize, String)],
    atom_count: usize,
    path: &Path,
) -> Result<Vec<Bond>, Error> {
    let mut bonds = Vec::with_capacity(lines.len());
    for (ln, raw) in lines {
        let padded = format!("{raw:<9}");
        let field = |range: std::ops::Range<usize>, what: &str| {
            padded
                .get(range)
                .and_then(|s| s.trim().parse::<usize>().ok())
                .ok_or_else(|| Error::parse(path, *ln, format!("invalid {what} in bond line")))
        };
        let a1 = field(0..3, "first atom index")?;
        let a2 = field(3..6, "second atom index")?;
        let order = match field(6..9, "bond order")? {
            1 => BondOrder::Single,
            2 => BondOrder::Double,
            3 => BondOrder::Triple,
            4 => BondOrder::Aromatic,
            _ => return Err(Error::parse(path, *ln, "unsupported bond order in bond line")),
        };

        if a1 == 0 || a2 == 0 || a1 > atom_count || a2 > atom_count {
            return Err(Error::parse(
                path,
                *ln,
                "bond references atom outside declared range",
            ));
        }

        bonds.push(Bond::new(a1 - 1, a2 - 1, order));
    }
    Ok(bonds)
}

/// Collects `> <name>` items; each value runs until the next blank line.
fn parse_data_items(lines: &[(usize, String)]) -> HashMap<String, Lines> {
    let mut items = HashMap::new();
    let mut current: Option<(String, Lines)> = None;
    for (ln, raw) in lines {
        let trimmed = raw.trim();
        if trimmed.starts_with('>') {
            if let Some((name, values)) = current.take() {
                items.insert(name, values);
            }
            let name = trimmed
                .split_once('<')
                .and_then(|(_, rest)| rest.split_once('>'))
                .map(|(name, _)| name.trim().to_ascii_lowercase());
            current = name.map(|n| (n, Vec::new()));
        } else if trimmed.is_empty() {
            if let Some((name, values)) = current.take() {
                items.insert(name, values);
            }
        } else if let Some((_, values)) = current.as_mut() {
            values.push((*ln, trimmed.to_string()));
        }
    }
    if let Some((name, values)) = current {
        items.insert(name, values);
    }
    items
}

fn parse_line(ln: usize, line: &str, path: &Path) -> Result<Vec<f64>, Error> {
    line.split_whitespace()
        .map(|token| {
            token
                .parse::<f64>()
                .map_err(|_| Error::parse(path, ln, format!("invalid number '{token}'")))
        })
        .collect()
}

fn parse_floats(lines: &[(usize, String)], path: &Path) -> Result<Vec<f64>, Error> {
    let mut values = Vec::new();
    for (ln, line) in lines {
        values.extend(parse_line(*ln, line, path)?);
    }
    Ok(values)
}

fn parse_vectors(lines: &[(usize, String)], path: &Path) -> Result<Vec<[f64; 3]>, Error> {
    lines
        .iter()
        .map(|(ln, line)| match parse_line(*ln, line, path)?[..] {
            [x, y, z] => Ok([x, y, z]),
            _ => Err(Error::parse(path, *ln, "expected three components per line")),
        })
        .collect()
}
