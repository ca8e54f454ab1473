#![allow(dead_code)]

use std::fs;
use std::path::Path;

use serde_json::{Value, json};

/// Water with one conformation per energy, each slightly more stretched.
pub fn water_entry(energies: &[f64]) -> Value {
    let conformations: Vec<Value> = energies
        .iter()
        .enumerate()
        .map(|(i, energy)| {
            let stretch = 0.957 + 0.02 * i as f64;
            json!({
                "positions": [[0.0, 0.0, 0.0], [stretch, 0.0, 0.0], [-0.240, 0.927, 0.0]],
                "energy": energy,
                "forces": [[0.5 * i as f64, 0.0, 0.0], [-0.5 * i as f64, 0.0, 0.0], [0.0, 0.0, 0.0]]
            })
        })
        .collect();

    json!({
        "elements": ["O", "H", "H"],
        "bonds": [[0, 1, "single"], [0, 2, "single"]],
        "conformations": conformations
    })
}

/// Hydrogen chloride without declared bonds; connectivity comes from geometry.
pub fn hcl_entry() -> Value {
    json!({
        "elements": ["Cl", "H"],
        "conformations": [
            {
                "positions": [[0.0, 0.0, 0.0], [1.27, 0.0, 0.0]],
                "energy": -290.2,
                "gradients": [[-2.0, 0.0, 0.0], [2.0, 0.0, 0.0]]
            },
            {
                "positions": [[0.0, 0.0, 0.0], [1.35, 0.0, 0.0]],
                "energy": -290.0,
                "gradients": [[1.5, 0.0, 0.0], [-1.5, 0.0, 0.0]]
            }
        ]
    })
}

/// Two chlorine atoms far apart: perceived as two fragments.
pub fn split_entry() -> Value {
    json!({
        "elements": ["Cl", "Cl"],
        "conformations": [
            {
                "positions": [[0.0, 0.0, 0.0], [9.0, 0.0, 0.0]],
                "energy": -1.0,
                "forces": [[0.0, 0.0, 0.0], [0.0, 0.0, 0.0]]
            }
        ]
    })
}

pub fn write_json(dir: &Path, id: &str, value: &Value) {
    fs::create_dir_all(dir).unwrap();
    let text = serde_json::to_string_pretty(value).unwrap();
    fs::write(dir.join(format!("{id}.json")), text).unwrap();
}

/// A store with one failing molecule and two good ones, in that file order.
pub fn mixed_store(dir: &Path) {
    write_json(dir, "a_split", &split_entry());
    write_json(dir, "hcl", &hcl_entry());
    write_json(dir, "water", &water_entry(&[-76.40, -76.35, -50.0]));
}
