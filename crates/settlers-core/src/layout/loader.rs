use std::collections::BTreeMap;

use serde::Deserialize;
use settlers_protocol::{Coord, Hex, Side};
use thiserror::Error;

use super::{geometry, BoardLayout, HexTile, PortKind, Terrain};

#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("yaml parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("utf-8 error: {0}")]
    Utf8(#[from] std::str::Utf8Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid layout: {0}")]
    Invalid(String),
}

pub enum LayoutSource<'a> {
    Embedded,
    Path(String),
    Bytes(&'a [u8]),
}

#[derive(Debug, Deserialize)]
struct RawLayout {
    name: String,
    hexes: Vec<RawHex>,
    #[serde(default)]
    ports: Vec<RawPort>,
    #[serde(default)]
    robber: Option<RawHexRef>,
    #[serde(default)]
    pirate: Option<RawHexRef>,
}

#[derive(Debug, Deserialize)]
struct RawHex {
    q: i32,
    r: i32,
    terrain: Terrain,
    #[serde(default)]
    number: Option<u8>,
}

#[derive(Debug, Deserialize)]
struct RawPort {
    q: i32,
    r: i32,
    side: Side,
    kind: PortKind,
}

#[derive(Debug, Deserialize)]
struct RawHexRef {
    q: i32,
    r: i32,
}

pub fn load_layout(source: LayoutSource<'_>) -> Result<BoardLayout, LayoutError> {
    let raw: RawLayout = match source {
        LayoutSource::Embedded => serde_yaml::from_str(include_str!("../../data/harbor.yaml"))?,
        LayoutSource::Path(path) => serde_yaml::from_str(&std::fs::read_to_string(path)?)?,
        LayoutSource::Bytes(bytes) => serde_yaml::from_str(std::str::from_utf8(bytes)?)?,
    };

    compile_layout(raw)
}

fn compile_layout(raw: RawLayout) -> Result<BoardLayout, LayoutError> {
    let mut hexes = BTreeMap::new();
    for h in &raw.hexes {
        let hex = Hex::new(h.q, h.r);
        if h.terrain.produces() {
            match h.number {
                Some(n) if (2..=12).contains(&n) && n != 7 => {}
                other => {
                    return Err(LayoutError::Invalid(format!(
                        "hex ({}, {}) needs a dice number in 2..=12 except 7, got {other:?}",
                        h.q, h.r
                    )))
                }
            }
        }
        let tile = HexTile {
            terrain: h.terrain,
            number: if h.terrain.produces() { h.number } else { None },
        };
        if hexes.insert(hex, tile).is_some() {
            return Err(LayoutError::Invalid(format!(
                "hex ({}, {}) listed twice",
                h.q, h.r
            )));
        }
    }

    let mut ports = BTreeMap::new();
    for p in &raw.ports {
        let edge = Coord::edge(p.q, p.r, p.side);
        let touches_land = geometry::edge_hexes(edge)
            .into_iter()
            .any(|h| hexes.get(&h).is_some_and(|t: &HexTile| t.terrain.is_land()));
        if !touches_land {
            return Err(LayoutError::Invalid(format!(
                "port at ({}, {}) {:?} is not on a coast",
                p.q, p.r, p.side
            )));
        }
        for node in geometry::edge_nodes(edge) {
            ports.insert(node, p.kind);
        }
    }

    let robber_hex = match &raw.robber {
        Some(r) => Some(Hex::new(r.q, r.r)),
        None => hexes
            .iter()
            .find(|(_, t)| t.terrain == Terrain::Desert)
            .map(|(h, _)| *h),
    };
    let robber_hex = robber_hex
        .filter(|h| hexes.get(h).is_some_and(|t| t.terrain.is_land()))
        .ok_or_else(|| LayoutError::Invalid("robber needs a land hex (or a desert)".into()))?;

    let pirate_start = match &raw.pirate {
        Some(p) => {
            let hex = Hex::new(p.q, p.r);
            if !hexes.get(&hex).is_some_and(|t| t.terrain == Terrain::Sea) {
                return Err(LayoutError::Invalid(format!(
                    "pirate start ({}, {}) is not a sea hex",
                    p.q, p.r
                )));
            }
            Some(Coord::hex(hex.q, hex.r))
        }
        None => None,
    };

    Ok(BoardLayout {
        name: raw.name,
        hexes,
        ports,
        robber_start: Coord::hex(robber_hex.q, robber_hex.r),
        pirate_start,
    })
}
