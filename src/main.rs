//! Command-line interface: parse text from a file or interactively and
//! emit the forest as XML or JSON.

use std::fs;
use std::io::{self, BufRead, Read, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser as ClapParser;

use syntagma::outnode::{forest_to_xml, OutNode};
use syntagma::{compile, Parser};

#[derive(ClapParser)]
#[command(name = "syntagma")]
#[command(about = "Rule-driven English parser", long_about = None)]
#[command(version)]
struct Cli {
    /// Parse this file and write the result to OUT (or stdout)
    #[arg(short = 'f', long, value_name = "IN")]
    file: Option<PathBuf>,

    /// Output file for --file mode
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// Read and parse the file in sections, streaming output
    #[arg(long, requires = "file")]
    sections: bool,

    /// Loop interactively, parsing each input line
    #[arg(short, long)]
    interactive: bool,

    /// Load rules from a serialized rule file instead of compiling the
    /// shipped lexicon
    #[arg(long)]
    rules: Option<PathBuf>,

    /// Write the compiled rules to a file and exit
    #[arg(long)]
    write_rules: Option<PathBuf>,

    /// Print the parse rules and exit
    #[arg(long)]
    print_rules: bool,

    /// Emit JSON instead of XML
    #[arg(long)]
    json: bool,

    /// Include source-location attributes in the output
    #[arg(long)]
    loc: bool,

    /// Trace the parse (graph dumps per transform, via the trace sink)
    #[arg(long)]
    trace: bool,
}

fn emit(nds: &[OutNode], json: bool, loc: bool) -> String {
    if json {
        serde_json::to_string_pretty(nds).unwrap_or_else(|_| "[]".to_string())
    } else {
        forest_to_xml(nds, loc)
    }
}

/// Read a file in sections. A section ends at a blank line, an indented
/// line, or after `max_lines` once a boundary shows up. Each section is
/// parsed with its starting line number; the number of preceding blank
/// lines is recorded on its first node.
fn parse_sections(
    parser: &mut Parser,
    text: &str,
    mut sink: impl FnMut(Vec<OutNode>),
) {
    let lines: Vec<&str> = text.lines().collect();
    let mut i = 0;
    while i < lines.len() {
        let mut n_blanks = 0u32;
        while i < lines.len() && lines[i].trim().is_empty() {
            n_blanks += 1;
            i += 1;
        }
        if i >= lines.len() {
            break;
        }
        let section_lno = (i + 1) as u32;
        let section_indent = indent_of(lines[i]);
        let mut body = String::new();
        while i < lines.len() {
            let li = lines[i];
            if li.trim().is_empty() {
                break;
            }
            if !body.is_empty() && indent_of(li) > section_indent {
                break;
            }
            body.push_str(li);
            body.push('\n');
            i += 1;
        }
        let mut nds = parser.parse_text(&body, section_lno);
        if n_blanks > 0 {
            if let Some(first) = nds.first_mut() {
                first.blank = Some(n_blanks);
            }
        }
        sink(nds);
    }
}

fn indent_of(line: &str) -> usize {
    let mut indent = 0;
    for c in line.chars() {
        match c {
            ' ' => indent += 1,
            '\t' => indent += 4,
            _ => break,
        }
    }
    indent
}

fn run(cli: Cli) -> Result<(), String> {
    let mut parser = match &cli.rules {
        Some(path) => Parser::from_file(path).map_err(|e| e.to_string())?,
        None => compile::build_parser().map_err(|e| e.to_string())?,
    };
    parser.trace = cli.trace;

    if let Some(path) = &cli.write_rules {
        parser.to_file(path).map_err(|e| e.to_string())?;
        println!("wrote rules to {}", path.display());
        return Ok(());
    }
    if cli.print_rules {
        print!("{}", parser.dump_rules());
        return Ok(());
    }

    if let Some(path) = &cli.file {
        let mut text = String::new();
        fs::File::open(path)
            .and_then(|mut f| f.read_to_string(&mut text))
            .map_err(|e| format!("could not read {}: {e}", path.display()))?;
        let mut out: Box<dyn Write> = match &cli.out {
            Some(p) => Box::new(
                fs::File::create(p).map_err(|e| format!("could not create {}: {e}", p.display()))?,
            ),
            None => Box::new(io::stdout()),
        };
        if cli.sections {
            parse_sections(&mut parser, &text, |nds| {
                let _ = writeln!(out, "{}", emit(&nds, cli.json, cli.loc));
            });
        } else {
            let nds = parser.parse_text(&text, 1);
            writeln!(out, "{}", emit(&nds, cli.json, cli.loc)).map_err(|e| e.to_string())?;
        }
        return Ok(());
    }

    if cli.interactive {
        println!("Enter text (\"q\" to quit):");
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let line = line.map_err(|e| e.to_string())?;
            let line = line.trim();
            if line == "q" || line == "quit" {
                break;
            }
            if line.is_empty() {
                continue;
            }
            let nds = parser.parse_text(line, 1);
            println!("{}", emit(&nds, cli.json, cli.loc));
        }
        return Ok(());
    }

    Err("nothing to do: pass --file, --interactive, or --print-rules".to_string())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(msg) => {
            eprintln!("error: {msg}");
            ExitCode::FAILURE
        }
    }
}
