use clap::{Arg, Command};
use color_eyre::eyre::{eyre, Result};
use std::fs;
use std::path::PathBuf;

use xcllex::{to_dot, LexicalAnalyzer, PatternKind, Symbol};

fn lookup_pattern(name: &str) -> Result<PatternKind> {
    PatternKind::from_name(name).ok_or_else(|| {
        let known: Vec<&str> = PatternKind::ALL.iter().map(|kind| kind.name()).collect();
        eyre!(
            "unknown pattern '{}', expected one of: {}",
            name,
            known.join(", ")
        )
    })
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let args = Command::new("xcllex")
        .version("0.1.0")
        .about("Lexical analyzer for the xcl language")
        .arg(
            Arg::new("input")
                .short('i')
                .long("input")
                .help("The xcl source file to scan and tokenize")
                .value_name("INPUT SOURCE FILE")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("json")
                .short('j')
                .long("json")
                .help("Emit tokens, symbols and diagnostics as JSON instead of plain text")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("dump-dfa")
                .short('d')
                .long("dump-dfa")
                .help("Print the transition table of a built-in pattern's compiled DFA")
                .value_name("PATTERN NAME")
                .value_parser(clap::value_parser!(String)),
        )
        .arg(
            Arg::new("dot")
                .short('g')
                .long("dot")
                .help("Print the Graphviz dot graph of a built-in pattern's compiled DFA")
                .value_name("PATTERN NAME")
                .value_parser(clap::value_parser!(String)),
        )
        .arg(
            Arg::new("save-dfa")
                .short('s')
                .long("save-dfa")
                .help("Save a built-in pattern's compiled DFA as <name>.json")
                .value_name("PATTERN NAME")
                .value_parser(clap::value_parser!(String)),
        )
        .get_matches();

    let mut analyzer = LexicalAnalyzer::new()?;
    let mut did_something = false;

    if let Some(name) = args.get_one::<String>("dump-dfa") {
        let kind = lookup_pattern(name)?;
        print!("{}", analyzer.transition_table(kind));
        did_something = true;
    }

    if let Some(name) = args.get_one::<String>("dot") {
        let kind = lookup_pattern(name)?;
        print!("{}", to_dot(analyzer.get_dfa(kind)));
        did_something = true;
    }

    if let Some(name) = args.get_one::<String>("save-dfa") {
        let kind = lookup_pattern(name)?;
        let path = PathBuf::from(format!("{}.json", kind.name()));
        analyzer.get_dfa(kind).save(&path)?;
        println!("DFA for pattern '{}' saved to {}", kind.name(), path.display());
        did_something = true;
    }

    let input = match args.get_one::<PathBuf>("input") {
        Some(input) => input,
        None => {
            if did_something {
                return Ok(());
            }
            return Err(eyre!("no input file provided, see --help"));
        }
    };

    let source = fs::read_to_string(input)?;
    analyzer.analyze(&source);

    if args.get_flag("json") {
        let symbols: Vec<&Symbol> = analyzer.get_symbol_table().iter().collect();
        let report = serde_json::json!({
            "tokens": analyzer.get_tokens(),
            "symbols": symbols,
            "diagnostics": analyzer.get_diagnostics(),
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("Tokens:");
    for token in analyzer.get_tokens() {
        println!("  {}", token);
    }

    println!("\nSymbol table:");
    for symbol in analyzer.get_symbol_table().iter() {
        println!(
            "  {} [{}] scope={} value={}",
            symbol.get_name(),
            symbol.get_type(),
            symbol.get_scope(),
            symbol.get_value()
        );
    }

    if analyzer.has_errors() {
        println!("\nDiagnostics:");
        for diagnostic in analyzer.get_diagnostics() {
            println!("  {}", diagnostic);
        }
    }

    Ok(())
}
