use crate::ast::{BinaryExpression, BinaryOperator, Expression, MatrixExpression, NumberLiteral};
use crate::token::Span;

/// A fully-reduced result: a scalar or a matrix, nothing else.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(NumberLiteral),
    Matrix(MatrixExpression),
}

impl Value {
    fn scalar(value: f64) -> Value {
        Value::Number(NumberLiteral {
            value,
            span: Span::SENTINEL,
        })
    }

    /// The universal "invalid operation" sentinel. No operation here ever
    /// fails any other way.
    fn nan() -> Value {
        Value::scalar(f64::NAN)
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(n.value),
            Value::Matrix(_) => None,
        }
    }

    /// Whether this is the NaN scalar sentinel.
    pub fn is_nan(&self) -> bool {
        matches!(self, Value::Number(n) if n.value.is_nan())
    }

    /// The value as a plain expression, e.g. to feed a reduced result back
    /// through the pipeline.
    pub fn into_expression(self) -> Expression {
        match self {
            Value::Number(n) => Expression::Number(n),
            Value::Matrix(m) => Expression::Matrix(m),
        }
    }
}

/// Reduce an expression to a scalar or a matrix. Pure and total: shape
/// mismatches, division by zero, and non-value nodes all collapse to the NaN
/// scalar rather than failing.
pub fn simplify(expr: &Expression) -> Value {
    match expr {
        Expression::Number(n) => Value::Number(n.clone()),
        Expression::Paren(p) => simplify(&p.expr),
        // Matrices pass through verbatim; their elements are reduced lazily
        // by whichever operator consumes them.
        Expression::Matrix(m) => Value::Matrix(m.clone()),
        Expression::Binary(b) => simplify_binary(b),
        // Placeholders, loose characters, and anything else without a value.
        _ => Value::nan(),
    }
}

fn simplify_binary(expr: &BinaryExpression) -> Value {
    match expr.op {
        BinaryOperator::Add => simplify_elementwise(&expr.left, &expr.right, |a, b| a + b),
        BinaryOperator::Sub => simplify_elementwise(&expr.left, &expr.right, |a, b| a - b),
        BinaryOperator::Mul => simplify_multiplication(&expr.left, &expr.right),
        BinaryOperator::Div => simplify_division(&expr.left, &expr.right),
        BinaryOperator::Pow => simplify_exponent(expr),
        // Reserved for vector dot and cross products.
        BinaryOperator::Dot | BinaryOperator::Cross => Value::nan(),
    }
}

/// The element of a matrix, reduced and required to be scalar.
fn scalar_element(expr: &Expression) -> Option<f64> {
    simplify(expr).as_number()
}

fn same_shape(left: &MatrixExpression, right: &MatrixExpression) -> bool {
    left.is_valid()
        && right.is_valid()
        && left.row_count() == right.row_count()
        && left.cols() == right.cols()
}

fn matrix_of(values: Vec<Vec<f64>>) -> Value {
    let rows = values
        .into_iter()
        .map(|row| {
            row.into_iter()
                .map(|value| {
                    Expression::Number(NumberLiteral {
                        value,
                        span: Span::SENTINEL,
                    })
                })
                .collect()
        })
        .collect();
    Value::Matrix(MatrixExpression {
        rows,
        span: Span::SENTINEL,
    })
}

/// Addition and subtraction: scalar with scalar, or two matrices of identical
/// shape combined element by element. Anything else is invalid.
fn simplify_elementwise(
    left: &Expression,
    right: &Expression,
    combine: impl Fn(f64, f64) -> f64,
) -> Value {
    match (simplify(left), simplify(right)) {
        (Value::Number(a), Value::Number(b)) => Value::scalar(combine(a.value, b.value)),
        (Value::Matrix(a), Value::Matrix(b)) => {
            if !same_shape(&a, &b) {
                return Value::nan();
            }
            let mut values = Vec::with_capacity(a.rows.len());
            for (row_a, row_b) in a.rows.iter().zip(&b.rows) {
                let mut row = Vec::with_capacity(row_a.len());
                for (elem_a, elem_b) in row_a.iter().zip(row_b) {
                    let (Some(x), Some(y)) = (scalar_element(elem_a), scalar_element(elem_b))
                    else {
                        return Value::nan();
                    };
                    row.push(combine(x, y));
                }
                values.push(row);
            }
            matrix_of(values)
        }
        _ => Value::nan(),
    }
}

/// Every element scaled by `scale(element)`; a non-scalar element anywhere
/// poisons the whole result.
fn scale_matrix(matrix: &MatrixExpression, scale: impl Fn(f64) -> f64) -> Value {
    let mut values = Vec::with_capacity(matrix.rows.len());
    for row in &matrix.rows {
        let mut scaled = Vec::with_capacity(row.len());
        for element in row {
            let Some(value) = scalar_element(element) else {
                return Value::nan();
            };
            scaled.push(scale(value));
        }
        values.push(scaled);
    }
    matrix_of(values)
}

fn simplify_multiplication(left: &Expression, right: &Expression) -> Value {
    match (simplify(left), simplify(right)) {
        (Value::Number(a), Value::Number(b)) => Value::scalar(a.value * b.value),
        (Value::Number(s), Value::Matrix(m)) | (Value::Matrix(m), Value::Number(s)) => {
            scale_matrix(&m, |value| value * s.value)
        }
        (Value::Matrix(a), Value::Matrix(b)) => matrix_product(&a, &b),
    }
}

/// The standard matrix product: left rows by right columns, inner dimensions
/// must agree.
fn matrix_product(left: &MatrixExpression, right: &MatrixExpression) -> Value {
    if !left.is_valid() || !right.is_valid() {
        return Value::nan();
    }

    let rows = left.row_count();
    let inner = left.cols();
    let cols = right.cols();
    if inner == 0 || cols == 0 || inner != right.row_count() {
        return Value::nan();
    }

    let mut values = vec![vec![0.0; cols]; rows];
    for (i, row) in values.iter_mut().enumerate() {
        for (j, cell) in row.iter_mut().enumerate() {
            let mut sum = 0.0;
            for k in 0..inner {
                let (Some(a), Some(b)) = (
                    scalar_element(&left.rows[i][k]),
                    scalar_element(&right.rows[k][j]),
                ) else {
                    return Value::nan();
                };
                sum += a * b;
            }
            *cell = sum;
        }
    }
    matrix_of(values)
}

/// Division requires a scalar, non-zero divisor; a matrix is divided element
/// by element.
fn simplify_division(left: &Expression, right: &Expression) -> Value {
    let Some(divisor) = simplify(right).as_number() else {
        return Value::nan();
    };
    if divisor == 0.0 {
        return Value::nan();
    }

    match simplify(left) {
        Value::Number(n) => Value::scalar(n.value / divisor),
        Value::Matrix(m) => scale_matrix(&m, |value| value / divisor),
    }
}

fn simplify_exponent(expr: &BinaryExpression) -> Value {
    // The transpose marker is the literal character `T` in exponent position;
    // it is matched structurally, before the right side is reduced.
    if let Expression::Char(marker) = &*expr.right {
        if marker.value == Some('T') {
            return match simplify(&expr.left) {
                Value::Matrix(m) => transpose(&m),
                Value::Number(_) => Value::nan(),
            };
        }
        return Value::nan();
    }

    let Some(exponent) = simplify(&expr.right).as_number() else {
        return Value::nan();
    };

    match simplify(&expr.left) {
        Value::Number(base) => Value::scalar(base.value.powf(exponent)),
        Value::Matrix(base) => matrix_power(&base, exponent),
    }
}

fn transpose(matrix: &MatrixExpression) -> Value {
    if !matrix.is_valid() {
        return Value::nan();
    }
    let rows = (0..matrix.cols())
        .map(|j| {
            matrix
                .rows
                .iter()
                .map(|row| row[j].clone())
                .collect::<Vec<_>>()
        })
        .collect();
    Value::Matrix(MatrixExpression {
        rows,
        span: Span::SENTINEL,
    })
}

/// A square matrix raised to a positive integer power, by repeated
/// multiplication. An exponent of -1 is reserved for the inverse, which is
/// not implemented yet.
fn matrix_power(base: &MatrixExpression, exponent: f64) -> Value {
    if exponent == -1.0 {
        // TODO: matrix inverse.
        return Value::nan();
    }
    if !base.is_valid()
        || base.row_count() != base.cols()
        || base.row_count() == 0
        || exponent < 1.0
        || exponent.fract() != 0.0
    {
        return Value::nan();
    }

    let mut result = Value::Matrix(base.clone());
    for _ in 1..exponent as u64 {
        let Value::Matrix(m) = result else {
            return Value::nan();
        };
        result = matrix_product(&m, base);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{CharLiteral, Placeholder};
    use crate::lexer::lex;
    use crate::parser::parse;

    fn eval(input: &str) -> Value {
        let tokens = lex(input);
        let (expr, _) = parse(&tokens);
        simplify(&expr)
    }

    fn matrix_values(value: &Value) -> Vec<Vec<f64>> {
        match value {
            Value::Matrix(m) => m
                .rows
                .iter()
                .map(|row| {
                    row.iter()
                        .map(|e| scalar_element(e).expect("matrix element should be scalar"))
                        .collect()
                })
                .collect(),
            Value::Number(n) => panic!("expected a matrix, got {}", n.value),
        }
    }

    #[test]
    fn scalar_arithmetic() {
        for (input, expected) in [
            ("1+2", 3.0),
            ("7-10", -3.0),
            ("6*7", 42.0),
            ("9/2", 4.5),
            ("2^10", 1024.0),
            ("4^0.5", 2.0),
            ("(2+3)*4", 20.0),
        ] {
            assert_eq!(eval(input).as_number(), Some(expected), "for '{input}'");
        }
    }

    #[test]
    fn division_by_zero_is_nan() {
        assert!(eval("5/0").is_nan());
        assert!(eval("[1,2]/0").is_nan());
    }

    #[test]
    fn negative_base_fractional_exponent_is_nan() {
        // Floating-point power semantics: no real result.
        assert!(eval("(0-8)^0.5").is_nan());
    }

    #[test]
    fn literals_simplify_to_themselves() {
        let value = eval("3.25");
        assert_eq!(value.as_number(), Some(3.25));
        // And the span survives: a bare literal is returned as-is.
        let Value::Number(n) = value else {
            panic!("expected a number");
        };
        assert_eq!(n.span, Span::new(0, 4));
    }

    #[test]
    fn matrices_pass_through_verbatim() {
        let tokens = lex("[1,1+1]");
        let (expr, _) = parse(&tokens);
        let Value::Matrix(matrix) = simplify(&expr) else {
            panic!("expected a matrix");
        };
        // Elements stay unreduced until an operator consumes them.
        assert!(matches!(matrix.rows[0][1], Expression::Binary(_)));
    }

    #[test]
    fn simplification_is_idempotent() {
        for input in ["17", "[1,2;3,4]+[5,6;7,8]"] {
            let value = eval(input);
            assert_eq!(simplify(&value.clone().into_expression()), value);
        }
    }

    #[test]
    fn matrix_addition_and_subtraction() {
        assert_eq!(
            matrix_values(&eval("[1,2;3,4]+[10,20;30,40]")),
            vec![vec![11.0, 22.0], vec![33.0, 44.0]]
        );
        assert_eq!(
            matrix_values(&eval("[5,5]-[2,3]")),
            vec![vec![3.0, 2.0]]
        );
    }

    #[test]
    fn matrix_addition_shape_mismatch_is_nan() {
        assert!(eval("[1,2]+[1,2,3]").is_nan());
        assert!(eval("[1,2]+[1;2]").is_nan());
        assert!(eval("[1,2]+3").is_nan());
        assert!(eval("3-[1,2]").is_nan());
    }

    #[test]
    fn ragged_matrix_operands_are_nan() {
        assert!(eval("[1,2;3]+[1,2;3]").is_nan());
    }

    #[test]
    fn a_single_bad_element_poisons_the_whole_result() {
        // `[]` holds a placeholder, which has no scalar value.
        assert!(eval("[1,[]]+[1,2]").is_nan());
        assert!(eval("[1,2]*[]").is_nan());
    }

    #[test]
    fn scalar_times_matrix_scales_elementwise() {
        let expected = vec![vec![2.0, 4.0], vec![6.0, 8.0]];
        assert_eq!(matrix_values(&eval("2*[1,2;3,4]")), expected);
        assert_eq!(matrix_values(&eval("[1,2;3,4]*2")), expected);
    }

    #[test]
    fn matrix_product() {
        assert_eq!(
            matrix_values(&eval("[1,2;3,4]*[5,6;7,8]")),
            vec![vec![19.0, 22.0], vec![43.0, 50.0]]
        );
        // Non-square shapes agree on the inner dimension.
        assert_eq!(
            matrix_values(&eval("[1,2,3]*[4;5;6]")),
            vec![vec![32.0]]
        );
    }

    #[test]
    fn matrix_product_inner_dimension_mismatch_is_nan() {
        assert!(eval("[1,2,3]*[4,5,6]").is_nan());
    }

    #[test]
    fn matrix_division_by_scalar() {
        assert_eq!(
            matrix_values(&eval("[2,4;6,8]/2")),
            vec![vec![1.0, 2.0], vec![3.0, 4.0]]
        );
    }

    #[test]
    fn matrix_divided_by_matrix_is_nan() {
        assert!(eval("[1,2]/[1,2]").is_nan());
    }

    #[test]
    fn matrix_squared_is_self_multiplication() {
        assert_eq!(
            matrix_values(&eval("[1,2;3,4]^2")),
            vec![vec![7.0, 10.0], vec![15.0, 22.0]]
        );
    }

    #[test]
    fn matrix_to_the_first_power_is_unchanged() {
        assert_eq!(
            matrix_values(&eval("[1,2;3,4]^1")),
            vec![vec![1.0, 2.0], vec![3.0, 4.0]]
        );
    }

    #[test]
    fn unsupported_matrix_exponents_are_nan() {
        // Inverse is reserved but not implemented.
        assert!(eval("[1,2;3,4]^-1").is_nan());
        assert!(eval("[1,2;3,4]^0").is_nan());
        assert!(eval("[1,2;3,4]^0.5").is_nan());
        // Non-square base.
        assert!(eval("[1,2,3]^2").is_nan());
        // Matrix exponent.
        assert!(eval("2^[1,2]").is_nan());
    }

    fn transpose_of(expr: Expression) -> Value {
        simplify(&Expression::Binary(BinaryExpression {
            op: BinaryOperator::Pow,
            op_span: Span::SENTINEL,
            span: expr.span(),
            left: Box::new(expr),
            right: Box::new(Expression::Char(CharLiteral {
                value: Some('T'),
                span: Span::SENTINEL,
            })),
        }))
    }

    #[test]
    fn transpose_swaps_rows_and_columns() {
        let tokens = lex("[1,2,3;4,5,6]");
        let (matrix, _) = parse(&tokens);
        let transposed = transpose_of(matrix);
        assert_eq!(
            matrix_values(&transposed),
            vec![vec![1.0, 4.0], vec![2.0, 5.0], vec![3.0, 6.0]]
        );
    }

    #[test]
    fn transpose_twice_is_identity() {
        let tokens = lex("[1,2,3;4,5,6]");
        let (matrix, _) = parse(&tokens);
        let original = matrix_values(&simplify(&matrix));
        let once = transpose_of(matrix);
        let twice = transpose_of(once.into_expression());
        assert_eq!(matrix_values(&twice), original);
    }

    #[test]
    fn transpose_of_a_scalar_is_nan() {
        let tokens = lex("5");
        let (scalar, _) = parse(&tokens);
        assert!(transpose_of(scalar).is_nan());
    }

    #[test]
    fn dot_and_cross_are_reserved() {
        assert!(eval("1 . 2").is_nan());
        assert!(eval("[1,2] x [3,4]").is_nan());
    }

    #[test]
    fn non_value_nodes_are_nan() {
        assert!(simplify(&Expression::Placeholder(Placeholder {
            span: Span::SENTINEL,
        }))
        .is_nan());
        assert!(simplify(&Expression::Char(CharLiteral {
            value: None,
            span: Span::SENTINEL,
        }))
        .is_nan());
        assert!(eval("1+").is_nan());
    }
}
