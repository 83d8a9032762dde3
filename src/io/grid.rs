//! Voxel grid text format.
//!
//! ```text
//! 3 2 2
//! 0 1 0
//! 0 0 0
//!
//! 1 1 0
//! 0 0 1
//! ```
//!
//! The first line holds the dimensions `nx ny nz`. Each z-plane follows as a
//! block of `ny` lines with `nx` space-separated `0`/`1` tokens; blocks are
//! separated by a blank line.

use std::path::Path;

use log::info;

use crate::error::{MeshError, Result};
use crate::voxel::{VoxelGrid, VoxelVolume};

/// Read a voxel grid file.
pub fn read_grid<P: AsRef<Path>>(path: P) -> Result<VoxelGrid> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)?;
    let grid = parse_grid(&text)?;
    info!(
        "loaded {}: {:?} voxels, {} filled",
        path.display(),
        grid.dimensions(),
        grid.filled_count()
    );
    Ok(grid)
}

/// Write a voxel volume in the grid text format.
pub fn write_grid<V: VoxelVolume + ?Sized, P: AsRef<Path>>(volume: &V, path: P) -> Result<()> {
    let path = path.as_ref();
    std::fs::write(path, format_grid(volume)).map_err(|e| MeshError::save(path, e.to_string()))?;
    info!("saved {}", path.display());
    Ok(())
}

/// Render a voxel volume as grid text.
pub fn format_grid<V: VoxelVolume + ?Sized>(volume: &V) -> String {
    let [nx, ny, nz] = volume.dimensions();
    let mut out = format!("{} {} {}\n", nx, ny, nz);
    for z in 0..nz {
        if z > 0 {
            out.push('\n');
        }
        for y in 0..ny {
            let row: Vec<&str> = (0..nx)
                .map(|x| if volume.occupied(x, y, z) { "1" } else { "0" })
                .collect();
            out.push_str(&row.join(" "));
            out.push('\n');
        }
    }
    out
}

fn invalid(line: usize, message: impl Into<String>) -> MeshError {
    MeshError::InvalidGrid {
        line,
        message: message.into(),
    }
}

/// Parse grid text.
///
/// # Errors
///
/// [`MeshError::InvalidGrid`] naming the offending line for a bad header,
/// a token other than `0`/`1`, a row of the wrong length, a block with the
/// wrong number of rows, or missing or trailing data.
pub fn parse_grid(text: &str) -> Result<VoxelGrid> {
    let mut lines = text.lines().enumerate().map(|(i, l)| (i + 1, l.trim()));

    let (header_line, header) = lines
        .by_ref()
        .find(|(_, l)| !l.is_empty())
        .ok_or_else(|| invalid(1, "missing dimensions"))?;
    let dims: Vec<usize> = header
        .split_whitespace()
        .map(str::parse)
        .collect::<std::result::Result<_, _>>()
        .map_err(|_| invalid(header_line, format!("bad dimensions '{}'", header)))?;
    let [nx, ny, nz] = dims[..] else {
        return Err(invalid(header_line, "expected three dimensions"));
    };
    let mut grid = VoxelGrid::new(nx, ny, nz).map_err(|e| invalid(header_line, e.to_string()))?;

    let mut last_line = header_line;
    for z in 0..nz {
        // Blocks after the first must be preceded by a blank line.
        let mut saw_blank = z == 0;
        for y in 0..ny {
            let (number, row) = loop {
                match lines.next() {
                    Some((n, l)) if l.is_empty() => {
                        if y > 0 {
                            return Err(invalid(n, format!("block {} ends after {} rows", z, y)));
                        }
                        saw_blank = true;
                    }
                    Some(found) => break found,
                    None => {
                        return Err(invalid(
                            last_line + 1,
                            format!("unexpected end of data in block {} (row {})", z, y),
                        ))
                    }
                }
            };
            if y == 0 && !saw_blank {
                return Err(invalid(number, format!("block {} has more than {} rows", z - 1, ny)));
            }
            last_line = number;

            let tokens: Vec<&str> = row.split_whitespace().collect();
            if tokens.len() != nx {
                return Err(invalid(number, format!("expected {} values, found {}", nx, tokens.len())));
            }
            for (x, token) in tokens.into_iter().enumerate() {
                let filled = match token {
                    "0" => false,
                    "1" => true,
                    other => return Err(invalid(number, format!("invalid token '{}'", other))),
                };
                if filled {
                    grid.set(x, y, z, true)?;
                }
            }
        }
    }

    if let Some((n, _)) = lines.find(|(_, l)| !l.is_empty()) {
        return Err(invalid(n, "unexpected data after last block"));
    }
    Ok(grid)
}
