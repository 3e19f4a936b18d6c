#[macro_use]
extern crate log;

use std::{fs, io::Read, process};

use ll1_helper::{
    EliminationPolicy, Grammar, GrammarError, LL1ParsingTable, DEFAULT_ITERATION_LIMIT,
};

fn print_help() {
    println!("Usage: ll1-helper [actions] outputs [options] [grammar file]");
    println!("actions:");
    println!("  elf: Eliminate left recursion");
    println!("  lf: Left factoring");
    println!("outputs:");
    println!("  prod: Productions");
    println!("  ff: Nullable, first and follow");
    println!("  ll1: LL(1) parsing table");
    println!("  trace: Parse the input given with -i and print every step");
    println!("options:");
    println!("  -h: Print this help");
    println!("  -l: Print in LaTeX format");
    println!("  -j: Print in JSON format");
    println!("  -m: Only substitute when it exposes left recursion");
    println!("  -i INPUT: Input string for `trace`");
    println!("Set RUST_LOG=debug to see what each step does.");
}

enum OutputFormat {
    Plain,
    LaTeX,
    JSON,
}

fn render(
    plain: impl FnOnce() -> String,
    latex: impl FnOnce() -> String,
    json: impl FnOnce() -> serde_json::Result<String>,
    format: &OutputFormat,
) -> String {
    match format {
        OutputFormat::Plain => plain(),
        OutputFormat::LaTeX => latex(),
        OutputFormat::JSON => json()
            .unwrap_or_else(|e| serde_json::json!({ "error": e.to_string() }).to_string()),
    }
}

fn run(
    input: &str,
    actions: &[&str],
    outputs: &[&str],
    policy: EliminationPolicy,
    parse_input: Option<&str>,
    format: &OutputFormat,
) -> Result<(), GrammarError> {
    let mut g = Grammar::parse(input)?;

    for &action in actions {
        if action == "elf" {
            g = g.eliminate_left_recursion_with(policy, DEFAULT_ITERATION_LIMIT)?;
        } else if action == "lf" {
            g = g.left_factor();
        }
    }

    let first = g.first_sets()?;
    let follow = g.follow_sets(&first)?;

    for &output in outputs {
        if output == "prod" {
            let t = g.to_production_output_vec();
            println!("{}", render(|| t.to_plaintext(), || t.to_latex(), || t.to_json(), format));
        }
        if output == "ff" {
            let t = g.to_non_terminal_output_vec(&first, &follow);
            println!("{}", render(|| t.to_plaintext(), || t.to_latex(), || t.to_json(), format));
        }
        if output == "ll1" {
            let (t, conflicts) = LL1ParsingTable::build(&g, &first, &follow);
            println!(
                "{}",
                render(
                    || t.to_plaintext(),
                    || t.to_latex(),
                    || serde_json::to_string(&t),
                    format
                )
            );
            for conflict in &conflicts {
                eprintln!("conflict {}", conflict);
            }
        }
        if output == "trace" {
            let table = g.generate_ll1_parsing_table(&first, &follow)?;
            let start = g.start_symbol().ok_or(GrammarError::EmptyGrammar)?;
            let t = table.parse(start, parse_input.unwrap_or_default())?;
            println!("{}", render(|| t.to_plaintext(), || t.to_latex(), || t.to_json(), format));
        }
    }

    Ok(())
}

fn main() {
    pretty_env_logger::init();

    let mut actions: Vec<&str> = Vec::new();
    let mut outputs: Vec<&str> = Vec::new();
    let args = std::env::args().skip(1).collect::<Vec<String>>();
    let mut i: usize = 0;
    while i < args.len() && ["elf", "lf"].contains(&args[i].as_str()) {
        actions.push(args[i].as_str());
        i += 1;
    }
    while i < args.len() && ["prod", "ff", "ll1", "trace"].contains(&args[i].as_str()) {
        outputs.push(args[i].as_str());
        i += 1;
    }

    let mut output_format = OutputFormat::Plain;
    let mut policy = EliminationPolicy::Always;
    let mut parse_input: Option<&str> = None;

    while i < args.len() && ["-h", "--help", "-l", "-j", "-m", "-i"].contains(&args[i].as_str()) {
        if args[i] == "-h" || args[i] == "--help" {
            print_help();
            return;
        } else if args[i] == "-l" {
            output_format = OutputFormat::LaTeX;
        } else if args[i] == "-j" {
            output_format = OutputFormat::JSON;
        } else if args[i] == "-m" {
            policy = EliminationPolicy::OnlyWhenRecursive;
        } else if args[i] == "-i" {
            i += 1;
            parse_input = args.get(i).map(|s| s.as_str());
        }
        i += 1;
    }

    if i > args.len() || i + 1 < args.len() || outputs.is_empty() {
        print_help();
        return;
    }

    let input: String = if i == args.len() {
        let mut buffer = String::new();
        if let Err(e) = std::io::stdin().read_to_string(&mut buffer) {
            error!("failed to read stdin: {}", e);
            process::exit(1);
        }
        buffer
    } else {
        match fs::read_to_string(args[i].as_str()) {
            Ok(s) => s,
            Err(e) => {
                error!("failed to read {}: {}", args[i], e);
                process::exit(1);
            }
        }
    };

    debug!("actions {:?}, outputs {:?}", actions, outputs);
    if let Err(e) = run(&input, &actions, &outputs, policy, parse_input, &output_format) {
        eprintln!("{}", e);
        process::exit(1);
    }
}
