use crate::ast::MatrixExpression;
use crate::simplifier::simplify;

/// A vector in the plane, drawn from the origin by a plotting surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaneVector {
    pub x: f64,
    pub y: f64,
}

/// Interpret a simplified matrix as a set of plane vectors: row 0 carries the
/// x components and row 1 the y components; a missing second row defaults
/// every y to 0. Returns `None` unless the matrix is a valid 1×n or 2×n grid
/// of scalars.
pub fn plane_vectors(matrix: &MatrixExpression) -> Option<Vec<PlaneVector>> {
    if !matrix.is_valid() {
        return None;
    }

    let ys: Option<&Vec<_>> = match matrix.row_count() {
        1 => None,
        2 => Some(&matrix.rows[1]),
        _ => return None,
    };

    matrix.rows[0]
        .iter()
        .enumerate()
        .map(|(i, element)| {
            let x = simplify(element).as_number()?;
            let y = match ys {
                Some(row) => simplify(&row[i]).as_number()?,
                None => 0.0,
            };
            Some(PlaneVector { x, y })
        })
        .collect()
}
