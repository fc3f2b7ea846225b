//! Whitespace-separated text layout for DDG trees and weight files.
//!
//! Integer trees:
//!
//! ```text
//! n m k r
//! h[0] .. h[k-1]
//! H[0][0] .. H[0][k-1]
//! ..
//! H[n][0] .. H[n][k-1]
//! ```
//!
//! Real trees replace the first line with `n k` followed by one line of
//! digits of `m` and one (possibly empty) line of digits of `r`. Empty
//! leaf slots are written as `-1`. Every line ends in a newline.
//!
//! Parsing checks the structure as well as the syntax, so a parsed tree
//! always samples correctly.

use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::ddg::{
    DdgTree, LeafTable, Levels, RealDdgTree, padded_digit, reject_digits, reject_weight,
};
use crate::digits::Digits;
use crate::error::{FldrError, Result};

/// Extension used for exported integer trees.
pub const INTEGER_EXTENSION: &str = "fldr";
/// Extension used for exported real trees.
pub const REAL_EXTENSION: &str = "fldrf";

fn write_row<I>(f: &mut fmt::Formatter<'_>, values: I) -> fmt::Result
where
    I: IntoIterator,
    I::Item: fmt::Display,
{
    for (i, v) in values.into_iter().enumerate() {
        if i > 0 {
            f.write_str(" ")?;
        }
        write!(f, "{v}")?;
    }
    f.write_str("\n")
}

fn write_levels(f: &mut fmt::Formatter<'_>, levels: &Levels) -> fmt::Result {
    write_row(f, levels.h())?;
    let table = levels.table();
    for row in 0..table.rows() {
        write_row(
            f,
            table
                .row(row)
                .iter()
                .map(|cell| cell.map_or(-1, |z| z as i64)),
        )?;
    }
    Ok(())
}

impl fmt::Display for DdgTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} {} {} {}", self.n, self.m, self.depth(), self.r)?;
        write_levels(f, &self.levels)
    }
}

impl fmt::Display for RealDdgTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} {}", self.n, self.depth())?;
        writeln!(f, "{}", self.m)?;
        writeln!(f, "{}", self.r)?;
        write_levels(f, &self.levels)
    }
}

/// Line cursor with 1-based line numbers for error messages.
struct Cursor<'a> {
    lines: std::iter::Enumerate<std::str::Lines<'a>>,
    last: usize,
}

impl<'a> Cursor<'a> {
    fn new(s: &'a str) -> Self {
        Self {
            lines: s.lines().enumerate(),
            last: 0,
        }
    }

    fn next_line(&mut self) -> Result<(usize, &'a str)> {
        match self.lines.next() {
            Some((i, text)) => {
                self.last = i + 1;
                Ok((i + 1, text))
            }
            None => Err(FldrError::parse(self.last + 1, "unexpected end of input")),
        }
    }

    fn numbers<T: FromStr>(&mut self) -> Result<(usize, Vec<T>)> {
        let (line, text) = self.next_line()?;
        let values = text
            .split_whitespace()
            .map(|tok| {
                tok.parse::<T>()
                    .map_err(|_| FldrError::parse(line, format!("invalid number `{tok}`")))
            })
            .collect::<Result<Vec<T>>>()?;
        Ok((line, values))
    }

    fn row<T: FromStr>(&mut self, expected: usize, what: &str) -> Result<(usize, Vec<T>)> {
        let (line, values) = self.numbers::<T>()?;
        if values.len() != expected {
            return Err(FldrError::parse(
                line,
                format!("expected {expected} values for {what}, found {}", values.len()),
            ));
        }
        Ok((line, values))
    }

    fn digits(&mut self) -> Result<(usize, Digits)> {
        let (line, values) = self.numbers::<u8>()?;
        if values.iter().any(|&b| b > 1) {
            return Err(FldrError::parse(line, "binary digits must be 0 or 1"));
        }
        Ok((line, Digits::from_bits(values)))
    }

    /// Lines not yet read.
    fn remaining(&self) -> usize {
        self.lines.clone().count()
    }

    fn finish(mut self) -> Result<()> {
        for (i, text) in self.lines.by_ref() {
            if !text.trim().is_empty() {
                return Err(FldrError::parse(i + 1, "trailing data after leaf table"));
            }
        }
        Ok(())
    }
}

fn read_levels(cursor: &mut Cursor<'_>, n: usize, k: usize) -> Result<(usize, Levels)> {
    let (h_line, h) = cursor.row::<usize>(k, "h")?;
    // rows are read before the table is sized, so its size is bounded by the input
    let mut rows = Vec::with_capacity(n + 1);
    for _ in 0..=n {
        rows.push(cursor.row::<i64>(k, "a leaf table row")?);
    }
    let mut table = LeafTable::new(n + 1, k)
        .map_err(|_| FldrError::parse(h_line, "leaf table too large"))?;
    for (row, (line, cells)) in rows.into_iter().enumerate() {
        for (col, cell) in cells.into_iter().enumerate() {
            match cell {
                -1 => {}
                z if z >= 0 && (z as usize) <= n => table.set(row, col, z as usize),
                z => return Err(FldrError::parse(line, format!("leaf label {z} out of range"))),
            }
        }
    }
    let levels = Levels::from_parts(n, h, table).map_err(|e| match e {
        FldrError::Invariant(reason) => FldrError::parse(h_line, reason),
        other => other,
    })?;
    Ok((h_line, levels))
}

/// The reject outcome owns a leaf exactly where `r` has a one digit. With the
/// tree closed, the other leaves then add up to `m`.
fn check_reject<F>(levels: &Levels, n: usize, line: usize, mut digit: F) -> Result<()>
where
    F: FnMut(usize) -> bool,
{
    for j in 0..levels.depth() {
        if levels.has_leaf(n, j) != digit(j) {
            return Err(FldrError::parse(
                line,
                format!("reject leaves at level {j} do not match the reject weight"),
            ));
        }
    }
    Ok(())
}

/// Outcome count from a header. `skip` lines precede the `n + 2` lines of
/// levels, and all of them must be present.
fn outcome_count(cursor: &Cursor<'_>, line: usize, n: u64, skip: usize) -> Result<usize> {
    let n = usize::try_from(n)
        .ok()
        .filter(|&n| n > 0)
        .ok_or_else(|| FldrError::parse(line, "outcome count must be positive"))?;
    match n.checked_add(2).and_then(|rows| rows.checked_add(skip)) {
        Some(needed) if needed <= cursor.remaining() => Ok(n),
        _ => Err(FldrError::parse(
            line,
            format!("outcome count {n} exceeds the rows present"),
        )),
    }
}

impl FromStr for DdgTree {
    type Err = FldrError;

    fn from_str(s: &str) -> Result<Self> {
        let mut cursor = Cursor::new(s);
        let (line, header) = cursor.row::<u64>(4, "`n m k r`")?;
        let n = outcome_count(&cursor, line, header[0], 0)?;
        let (m, k, r) = (header[1], header[2], header[3]);
        if m == 0 {
            return Err(FldrError::parse(line, "total weight must be positive"));
        }
        let k = usize::try_from(k)
            .ok()
            .filter(|&k| k == crate::ddg::ceil_log2(m) as usize)
            .ok_or_else(|| FldrError::parse(line, "k does not match the total weight"))?;
        if r != reject_weight(m, k) {
            return Err(FldrError::parse(line, "reject weight does not match 2^k - m"));
        }

        let (h_line, levels) = read_levels(&mut cursor, n, k)?;
        check_reject(&levels, n, h_line, |j| (r >> (k - 1 - j)) & 1 == 1)?;
        cursor.finish()?;
        Ok(DdgTree { n, m, r, levels })
    }
}

impl FromStr for RealDdgTree {
    type Err = FldrError;

    fn from_str(s: &str) -> Result<Self> {
        let mut cursor = Cursor::new(s);
        let (line, header) = cursor.row::<u64>(2, "`n k`")?;
        let n = outcome_count(&cursor, line, header[0], 2)?;
        let (m_line, m) = cursor.digits()?;
        if m.bit(0) != Some(1) {
            return Err(FldrError::parse(m_line, "total weight must start with a 1 digit"));
        }
        let (r_line, r) = cursor.digits()?;
        let (k, expected_r) = reject_digits(&m).map_err(|_| FldrError::parse(m_line, "bad total"))?;
        if header[1] != k as u64 {
            return Err(FldrError::parse(line, "k does not match the total weight"));
        }
        if r != expected_r {
            return Err(FldrError::parse(r_line, "reject digits do not match 2^k - m"));
        }

        let (h_line, levels) = read_levels(&mut cursor, n, k)?;
        check_reject(&levels, n, h_line, |j| padded_digit(&r, k, j))?;
        cursor.finish()?;
        Ok(RealDdgTree { n, m, r, levels })
    }
}

/// Write a tree in text form to `path`.
pub fn write_file<T: fmt::Display>(path: impl AsRef<Path>, tree: &T) -> Result<()> {
    fs::write(path, tree.to_string())?;
    Ok(())
}

/// Read a tree written by [`write_file`].
pub fn read_file<T>(path: impl AsRef<Path>) -> Result<T>
where
    T: FromStr<Err = FldrError>,
{
    fs::read_to_string(path)?.parse()
}

/// Parse a weight file: a count `n` followed by `n` weights, separated by
/// any whitespace.
pub fn parse_weights<T: FromStr>(s: &str) -> Result<Vec<T>> {
    let mut tokens = s
        .lines()
        .enumerate()
        .flat_map(|(i, text)| text.split_whitespace().map(move |tok| (i + 1, tok)));

    let (line, count) = tokens
        .next()
        .ok_or_else(|| FldrError::parse(1, "missing weight count"))?;
    let n: usize = count
        .parse()
        .map_err(|_| FldrError::parse(line, format!("invalid weight count `{count}`")))?;

    let mut weights = Vec::with_capacity(n);
    for _ in 0..n {
        let (line, tok) = tokens
            .next()
            .ok_or_else(|| FldrError::parse(line, format!("expected {n} weights")))?;
        let w = tok
            .parse::<T>()
            .map_err(|_| FldrError::parse(line, format!("invalid weight `{tok}`")))?;
        weights.push(w);
    }
    if let Some((line, tok)) = tokens.next() {
        return Err(FldrError::parse(line, format!("unexpected token `{tok}` after weights")));
    }
    Ok(weights)
}
