//! sqlsem - SQL expression type resolution from the command line

use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use clap::{Parser as ClapParser, Subcommand};
use rust_decimal::Decimal;
use sqlsem::catalog::{Catalog, OperatorId};
use sqlsem::coercion::infer_common_type;
use sqlsem::config::{CompatMode, DivisionScale};
use sqlsem::expression::{CollectionKind, Expr};
use sqlsem::resolver::resolve;
use sqlsem::types::{Domain, TypeTag};
use sqlsem::value::Value;
use sqlsem::{ResolutionStats, Resolver, ResolverConfig, SessionContext};

/// sqlsem - Inspect operator signatures, resolve argument types and fold literals
#[derive(ClapParser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Resolver configuration file (JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    /// Treat + between two strings as concatenation
    #[arg(long, global = true)]
    plus_as_concat: bool,

    /// Concatenation reads NULL as the empty string
    #[arg(long, global = true)]
    oracle_empty_string: bool,

    /// Use MySQL-like numeric coercions
    #[arg(long, global = true)]
    mysql: bool,

    /// Function and cast errors produce NULL
    #[arg(long, global = true)]
    null_on_error: bool,

    /// Use the legacy NUMERIC division scale
    #[arg(long, global = true)]
    legacy_division: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List typed operators, or the overloads of one operator
    Catalog {
        /// Operator name, e.g. PLUS or CONCAT
        op: Option<String>,
    },
    /// Pick the overload of an operator for argument types
    Resolve {
        op: String,
        /// Argument types, e.g. INTEGER DATE; NULL and ? are accepted
        types: Vec<String>,
    },
    /// Resolve an operator over literals and fold it
    Fold {
        op: String,
        /// Literals, e.g. 1 2.5 'text' DATE'2020-01-01' NULL TRUE
        literals: Vec<String>,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let config = load_config(&args)?;
    match &args.command {
        Command::Catalog { op } => show_catalog(op.as_deref()),
        Command::Resolve { op, types } => resolve_types(config, op, types),
        Command::Fold { op, literals } => fold_literals(config, op, literals),
    }
}

fn load_config(args: &Args) -> Result<ResolverConfig> {
    let mut config = match &args.config {
        Some(path) => ResolverConfig::from_json_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => ResolverConfig::new(),
    };
    if args.plus_as_concat {
        config = config.with_plus_as_concat(true);
    }
    if args.oracle_empty_string {
        config = config.with_oracle_style_empty_string(true);
    }
    if args.mysql {
        config = config.with_compat_mode(CompatMode::MySql);
    }
    if args.null_on_error {
        config = config.with_return_null_on_function_errors(true);
    }
    if args.legacy_division {
        config = config.with_numeric_division_scale(DivisionScale::Legacy);
    }
    Ok(config)
}

fn show_catalog(op: Option<&str>) -> Result<()> {
    let catalog = Catalog::global()?;
    let Some(name) = op else {
        for def in catalog.operators() {
            println!("{:<20} {} overload(s)", def.op, def.overloads.len());
        }
        println!("{} typed operators", catalog.len());
        return Ok(());
    };

    let op = OperatorId::from_str(name)?;
    match catalog.lookup(op) {
        Some(def) => {
            for (index, signature) in def.overloads.iter().enumerate() {
                println!("{index:>3}: {signature}");
            }
        }
        None => println!("{op} is typed structurally and has no signatures"),
    }
    Ok(())
}

fn resolve_types(config: ResolverConfig, op: &str, types: &[String]) -> Result<()> {
    let op = OperatorId::from_str(op)?;
    let tags = types
        .iter()
        .map(|t| TypeTag::from_str(t))
        .collect::<Result<Vec<_>, _>>()?;

    let (signature, index) = resolve(op, &tags)?;
    println!("overload {index}: {signature}");
    if op.is_symmetric() {
        let common = infer_common_type(op, &tags, None, config.compat_mode);
        println!("common type: {common}");
    }

    let operands = tags
        .iter()
        .enumerate()
        .map(|(index, tag)| operand(index, *tag))
        .collect();
    run(config, build(op, operands))
}

fn fold_literals(config: ResolverConfig, op: &str, literals: &[String]) -> Result<()> {
    let op = OperatorId::from_str(op)?;
    let operands = literals
        .iter()
        .map(|text| parse_literal(text).map(Expr::literal))
        .collect::<Result<Vec<_>>>()?;
    run(config, build(op, operands))
}

fn run(config: ResolverConfig, mut expr: Expr) -> Result<()> {
    let resolver = Resolver::new(config, SessionContext::default());
    let (stats, diagnostics) = resolver.resolve_collecting(&mut expr);
    for diagnostic in diagnostics.iter() {
        eprintln!("{diagnostic}");
    }
    if diagnostics.has_errors() {
        bail!("{} error(s)", diagnostics.error_count());
    }

    println!("{expr} : {}", expr.domain());
    print_stats(&stats);
    Ok(())
}

fn print_stats(stats: &ResolutionStats) {
    println!(
        "casts: {}, deferred: {}, folds: {}, enum rewrites: {}",
        stats.casts_inserted, stats.domains_deferred, stats.folds, stats.enum_rewrites
    );
}

/// Build the call as the parser would: n-ary chains nest, and IN takes a
/// list of the remaining operands.
fn build(op: OperatorId, mut operands: Vec<Expr>) -> Expr {
    if matches!(op, OperatorId::IsIn | OperatorId::IsNotIn) && operands.len() > 1 {
        let list = operands.split_off(1);
        if let Some(probe) = operands.pop() {
            return Expr::binary(op, probe, Expr::collection(CollectionKind::Sequence, list));
        }
    }
    if op.is_chain() && operands.len() > 2 {
        return Expr::chain(op, operands).unwrap_or_default();
    }
    Expr::operation(op, operands)
}

/// A column of type `tag`, NULL, or a host parameter for MAYBE.
fn operand(index: usize, tag: TypeTag) -> Expr {
    match tag {
        TypeTag::Null => Expr::null(),
        TypeTag::Maybe => Expr::parameter(index),
        _ => {
            let name = char::from(b'a' + (index % 26) as u8).to_string();
            Expr::column(name, Domain::of(tag).or_default_descriptor())
        }
    }
}

fn parse_literal(text: &str) -> Result<Value> {
    let text = text.trim();
    match text.to_ascii_uppercase().as_str() {
        "NULL" => return Ok(Value::Null),
        "TRUE" => return Ok(Value::Logical(true)),
        "FALSE" => return Ok(Value::Logical(false)),
        _ => {}
    }

    if let Some(body) = keyword_literal(text, "TIMESTAMP") {
        let dt = NaiveDateTime::parse_from_str(&body, "%Y-%m-%d %H:%M:%S")
            .with_context(|| format!("Invalid timestamp literal: {text}"))?;
        return Ok(Value::Timestamp(dt));
    }
    if let Some(body) = keyword_literal(text, "DATE") {
        let date = NaiveDate::parse_from_str(&body, "%Y-%m-%d")
            .with_context(|| format!("Invalid date literal: {text}"))?;
        return Ok(Value::Date(date));
    }
    if let Some(body) = keyword_literal(text, "TIME") {
        let time = NaiveTime::parse_from_str(&body, "%H:%M:%S")
            .with_context(|| format!("Invalid time literal: {text}"))?;
        return Ok(Value::Time(time));
    }
    if let Some(body) = quoted(text) {
        return Ok(Value::String(body));
    }

    if let Ok(v) = text.parse::<i32>() {
        return Ok(Value::Integer(v));
    }
    if let Ok(v) = text.parse::<i64>() {
        return Ok(Value::BigInt(v));
    }
    if text.contains(['e', 'E']) {
        if let Ok(v) = text.parse::<f64>() {
            return Ok(Value::Double(v));
        }
    }
    if let Ok(v) = Decimal::from_str(text) {
        return Ok(Value::Numeric(v));
    }
    bail!("Cannot read literal: {text}")
}

/// Body of `KEYWORD'...'`.
fn keyword_literal(text: &str, keyword: &str) -> Option<String> {
    let (head, tail) = text.split_at_checked(keyword.len())?;
    if !head.eq_ignore_ascii_case(keyword) {
        return None;
    }
    quoted(tail.trim_start())
}

fn quoted(text: &str) -> Option<String> {
    let body = text.strip_prefix('\'')?.strip_suffix('\'')?;
    Some(body.replace("''", "'"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlsem::expression::ExprKind;

    fn ints(values: &[i32]) -> Vec<Expr> {
        values.iter().map(|v| Expr::literal(Value::Integer(*v))).collect()
    }

    #[test]
    fn test_build_in_list() {
        let expr = build(OperatorId::IsIn, ints(&[1, 2, 3]));
        assert_eq!(expr.op(), Some(OperatorId::IsIn));
        assert_eq!(expr.args().len(), 2);
        assert_eq!(expr.args()[0].literal_value(), Some(&Value::Integer(1)));
        match &expr.args()[1].kind {
            ExprKind::Collection { kind, items } => {
                assert_eq!(*kind, CollectionKind::Sequence);
                assert_eq!(items.len(), 2);
            }
            other => panic!("expected a list, got {other:?}"),
        }
    }

    #[test]
    fn test_build_chain_and_plain_calls() {
        let chain = build(OperatorId::Greatest, ints(&[1, 2, 3]));
        assert_eq!(chain.op(), Some(OperatorId::Greatest));
        assert_eq!(chain.args()[0].op(), Some(OperatorId::Greatest));

        let plus = build(OperatorId::Plus, ints(&[1, 2]));
        assert_eq!(plus.args().len(), 2);
        assert!(plus.args().iter().all(Expr::is_literal));

        let single = build(OperatorId::IsIn, ints(&[1]));
        assert_eq!(single.args().len(), 1);
    }

    #[test]
    fn test_parse_literal() {
        assert_eq!(parse_literal("42").unwrap(), Value::Integer(42));
        assert_eq!(parse_literal("'it''s'").unwrap(), Value::String("it's".into()));
        assert!(matches!(parse_literal("DATE'2020-01-06'").unwrap(), Value::Date(_)));
        assert_eq!(parse_literal("null").unwrap(), Value::Null);
        assert!(parse_literal("DATE'nope'").is_err());
    }
}
