//! Positions in the hierarchical address space.
//!
//! A coordinate is a depth plus one selector digit per level below the root:
//! `0`, `1` and `2` pick a solid child, `3` picks the central void. The text
//! form is `d<depth>p<digits>`, so `d3p031` is three levels down through the
//! void at the second step and the root is `d0p`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoordinateError;

/// Highest digit in the path alphabet.
pub const VOID_DIGIT: u8 = 3;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(try_from = "RawCoordinate")]
pub struct Coordinate {
    depth: u32,
    path: Vec<u8>,
}

#[derive(Deserialize)]
struct RawCoordinate {
    depth: u32,
    path: Vec<u8>,
}

impl TryFrom<RawCoordinate> for Coordinate {
    type Error = CoordinateError;

    fn try_from(raw: RawCoordinate) -> Result<Self, Self::Error> {
        Self::new(raw.depth, raw.path)
    }
}

impl Coordinate {
    /// Validates `path` against `depth` and the digit alphabet.
    pub fn new(depth: u32, path: Vec<u8>) -> Result<Self, CoordinateError> {
        if path.len() != depth as usize {
            return Err(CoordinateError::PathLengthMismatch {
                depth,
                path_len: path.len(),
            });
        }
        if let Some((position, &digit)) = path.iter().enumerate().find(|(_, d)| **d > VOID_DIGIT) {
            return Err(CoordinateError::InvalidDigit { digit, position });
        }
        Ok(Self { depth, path })
    }

    /// Builds a coordinate whose depth is the path length.
    pub fn from_path(path: Vec<u8>) -> Result<Self, CoordinateError> {
        let depth = u32::try_from(path.len()).map_err(|_| {
            CoordinateError::Parse(format!("path of {} digits is too deep", path.len()))
        })?;
        Self::new(depth, path)
    }

    /// The root of the hierarchy: depth 0, empty path.
    pub fn root() -> Self {
        Self {
            depth: 0,
            path: Vec::new(),
        }
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn path(&self) -> &[u8] {
        &self.path
    }

    pub fn is_root(&self) -> bool {
        self.depth == 0 && self.path.is_empty()
    }

    /// True if any step of the path goes through a void.
    pub fn is_void_path(&self) -> bool {
        self.path.contains(&VOID_DIGIT)
    }

    pub fn is_solid_path(&self) -> bool {
        !self.is_void_path()
    }

    /// The slot this coordinate occupies under its parent, `None` for the root.
    pub fn child_index(&self) -> Option<u8> {
        self.path.last().copied()
    }

    /// Descends one level through `digit`.
    pub fn child(&self, digit: u8) -> Result<Self, CoordinateError> {
        let mut path = self.path.clone();
        path.push(digit);
        Self::new(self.depth + 1, path)
    }

    /// Ascends one level; the root has no parent.
    pub fn parent(&self) -> Option<Self> {
        let (_, prefix) = self.path.split_last()?;
        Some(Self {
            depth: self.depth - 1,
            path: prefix.to_vec(),
        })
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "d{}p", self.depth)?;
        for digit in &self.path {
            write!(f, "{digit}")?;
        }
        Ok(())
    }
}

impl FromStr for Coordinate {
    type Err = CoordinateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || CoordinateError::Parse(s.to_string());

        let (depth, digits) = s
            .strip_prefix('d')
            .and_then(|rest| rest.split_once('p'))
            .ok_or_else(malformed)?;
        if depth.is_empty() || !depth.bytes().all(|b| b.is_ascii_digit()) {
            return Err(malformed());
        }
        let depth: u32 = depth.parse().map_err(|_| malformed())?;
        let path = digits
            .chars()
            .map(|c| c.to_digit(10).map(|d| d as u8))
            .collect::<Option<Vec<u8>>>()
            .ok_or_else(malformed)?;

        Self::new(depth, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_path_length_mismatch() {
        assert_eq!(
            Coordinate::new(2, vec![0]),
            Err(CoordinateError::PathLengthMismatch {
                depth: 2,
                path_len: 1
            })
        );
    }

    #[test]
    fn rejects_digits_outside_alphabet() {
        assert_eq!(
            Coordinate::new(2, vec![1, 4]),
            Err(CoordinateError::InvalidDigit {
                digit: 4,
                position: 1
            })
        );
    }

    #[test]
    fn void_and_solid_paths() {
        let solid = Coordinate::new(2, vec![0, 1]).unwrap();
        let void = Coordinate::new(3, vec![0, 3, 1]).unwrap();
        assert!(solid.is_solid_path());
        assert!(void.is_void_path());
        assert!(Coordinate::root().is_solid_path());
    }

    #[test]
    fn text_form_round_trips() {
        let coord = Coordinate::new(3, vec![0, 3, 1]).unwrap();
        assert_eq!(coord.to_string(), "d3p031");
        assert_eq!("d3p031".parse::<Coordinate>().unwrap(), coord);
        assert_eq!(Coordinate::root().to_string(), "d0p");
        assert_eq!("d0p".parse::<Coordinate>().unwrap(), Coordinate::root());
    }

    #[test]
    fn rejects_malformed_text() {
        for bad in [
            "d2p0", "dp01", "d-1p0", "d+1p0", "d p0", "d1p012", "d1pA", "d1p0x1", "x1p0", "d1p4",
        ] {
            assert!(bad.parse::<Coordinate>().is_err(), "{bad} should not parse");
        }
    }

    #[test]
    fn navigation() {
        let root = Coordinate::root();
        assert!(root.is_root());
        assert_eq!(root.parent(), None);
        assert_eq!(root.child_index(), None);

        let child = root.child(2).unwrap().child(3).unwrap();
        assert_eq!(child.depth(), 2);
        assert_eq!(child.path(), &[2, 3]);
        assert_eq!(child.child_index(), Some(3));
        assert_eq!(child.parent().unwrap().parent().unwrap(), root);
        assert!(root.child(7).is_err());
    }

    #[test]
    fn serde_form_validates() {
        let coord = Coordinate::new(1, vec![2]).unwrap();
        let value = serde_json::to_value(&coord).unwrap();
        assert_eq!(value, serde_json::json!({"depth": 1, "path": [2]}));
        assert_eq!(serde_json::from_value::<Coordinate>(value).unwrap(), coord);

        let bad = serde_json::json!({"depth": 2, "path": [2]});
        assert!(serde_json::from_value::<Coordinate>(bad).is_err());
    }
}
