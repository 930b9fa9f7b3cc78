//! Thin demonstration binary for the semantic analysis core.
//!
//! No parser ships in this repository, so the program it analyzes is built
//! directly with `tarnc_ast`'s constructors rather than read from a file.
//! This is also the one place that installs a `tracing-subscriber` layer
//! and the one place that turns a missing module declaration into a
//! driver-level exit code rather than a library error.

use anyhow::bail;
use clap::Parser;
use tarnc_ast::{
    BinOp, Block, BodyItem, ConstDecl, Expr, Literal, ModuleDecl, Parameter, Pattern, Program,
};
use tarnc_sem::Compilation;
use tarnc_util::{Span, Symbol};

#[derive(Parser)]
#[command(name = "tarnc", about = "Runs the binder/collector/unifier pipeline over a sample program")]
struct Cli {
    /// Module namespace segments, dot-separated (e.g. "A.B").
    #[arg(long, default_value = "demo")]
    module: String,

    /// Emit debug-level tracing instead of info-level.
    #[arg(long)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let filter = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
        .init();
}

/// `const multi = 4` followed by `const calc = (factor: number) => factor * multi`.
fn sample_program(module: &str) -> Program {
    let path = module.split('.').map(Symbol::intern).collect();
    Program {
        module: Some(ModuleDecl {
            path,
            span: Span::DUMMY,
        }),
        opens: vec![],
        imports: vec![],
        body: vec![
            BodyItem::Const(ConstDecl {
                pattern: Pattern::Ident {
                    name: Symbol::intern("multi"),
                    span: Span::DUMMY,
                },
                annotation: None,
                init: Expr::Primitive {
                    value: Literal::Number(4.0),
                    span: Span::DUMMY,
                },
                span: Span::DUMMY,
            }),
            BodyItem::Const(ConstDecl {
                pattern: Pattern::Ident {
                    name: Symbol::intern("calc"),
                    span: Span::DUMMY,
                },
                annotation: None,
                init: Expr::Function {
                    name: None,
                    params: vec![Parameter {
                        name: Symbol::intern("factor"),
                        annotation: Some(tarnc_ast::Type::NUMBER),
                        is_spread: false,
                        span: Span::DUMMY,
                    }],
                    return_annotation: None,
                    body: Box::new(Block {
                        items: vec![BodyItem::Expr(Expr::Binary {
                            op: BinOp::Mul,
                            left: Box::new(Expr::Identifier {
                                name: Symbol::intern("factor"),
                                span: Span::DUMMY,
                            }),
                            right: Box::new(Expr::Identifier {
                                name: Symbol::intern("multi"),
                                span: Span::DUMMY,
                            }),
                            span: Span::DUMMY,
                        })],
                        span: Span::DUMMY,
                    }),
                    span: Span::DUMMY,
                },
                span: Span::DUMMY,
            }),
        ],
        span: Span::DUMMY,
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let program = sample_program(&cli.module);
    if program.module.is_none() {
        bail!("missing module declaration");
    }

    let mut compilation = Compilation::new();
    match compilation.analyze(&program) {
        Ok(()) => {
            let root = compilation.scopes.root();
            if let Some(id) = compilation.scopes.resolve_value(root, Symbol::intern("calc")) {
                tracing::info!(ty = %compilation.scopes.value(id).ty, "calc resolved");
            }
            println!("analysis succeeded for module `{}`", cli.module);
            Ok(())
        }
        Err(err) => {
            tracing::error!(%err, "analysis failed");
            bail!(err);
        }
    }
}
