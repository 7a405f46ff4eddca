use clap::Parser;
use matrix_calculator::simplifier::{simplify, Value};
use matrix_calculator::token::Token;
use matrix_calculator::{lexer, parser, plot};
use miette::NamedSource;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Input {
    /// The expression to evaluate
    expression: String,

    /// Debug the lexer, printing out each token. Does not parse or evaluate.
    #[clap(long, default_value = "false")]
    debug_lexer: bool,

    /// Debug the parser, printing out the AST. Does not evaluate.
    #[clap(long, default_value = "false")]
    debug_parser: bool,

    /// Interpret the result as plane vectors and print one per line.
    #[clap(long, default_value = "false")]
    vectors: bool,
}

fn main() {
    let Input {
        expression,
        debug_lexer,
        debug_parser,
        vectors,
    } = Input::parse();

    let tokens = lexer::lex(&expression);

    if debug_lexer {
        run_debug_lexer(&tokens, &expression);
        return;
    }

    let (expr, diagnostics) = parser::parse(&tokens);
    for diagnostic in diagnostics {
        let report = miette::Report::new(diagnostic)
            .with_source_code(NamedSource::new("<input>", expression.clone()));
        eprintln!("{report:?}");
    }

    if debug_parser {
        dbg!(expr);
        return;
    }

    let value = simplify(&expr);

    if vectors {
        let Value::Matrix(matrix) = &value else {
            eprintln!("not a matrix: {}", render(&value));
            std::process::exit(1);
        };
        match plot::plane_vectors(matrix) {
            Some(vectors) => {
                for vector in vectors {
                    println!("({}, {})", vector.x, vector.y);
                }
            }
            None => {
                eprintln!("not a plottable 1xN or 2xN matrix");
                std::process::exit(1);
            }
        }
        return;
    }

    println!("{}", render(&value));
}

fn run_debug_lexer(tokens: &[Token], source: &str) {
    let source_code = NamedSource::new("<input>", source.to_string());
    for token in tokens {
        let diag = miette::miette!(
            labels = vec![token.span.labeled(format!("{:?}", token.kind))],
            severity = miette::Severity::Advice,
            "found a token",
        )
        .with_source_code(source_code.clone());
        eprintln!("{diag:?}");
    }
}

fn render(value: &Value) -> String {
    match value {
        Value::Number(n) => format!("{}", n.value),
        Value::Matrix(m) => {
            let rows: Vec<String> = m
                .rows
                .iter()
                .map(|row| {
                    row.iter()
                        .map(|element| match simplify(element) {
                            Value::Number(n) => format!("{}", n.value),
                            Value::Matrix(_) => "[..]".to_string(),
                        })
                        .collect::<Vec<_>>()
                        .join(", ")
                })
                .collect();
            format!("[{}]", rows.join("; "))
        }
    }
}
