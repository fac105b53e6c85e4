// XAML compiler
//
//  Copyright (C) 2014-2021 Ryan Specialty Group, LLC.
//
//  This file is part of XAMLC.
//
//  This program is free software: you can redistribute it and/or modify
//  it under the terms of the GNU General Public License as published by
//  the Free Software Foundation, either version 3 of the License, or
//  (at your option) any later version.
//
//  This program is distributed in the hope that it will be useful,
//  but WITHOUT ANY WARRANTY; without even the implied warranty of
//  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
//  GNU General Public License for more details.
//
//  You should have received a copy of the GNU General Public License
//  along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! Command-line interface of the XAML compiler.
//!
//! Compiles a single document against a type catalog and writes either an
//!   instruction listing or the transformed tree to standard output.
//! Diagnostics are written to standard error.

extern crate xamlc;

use getopts::{Fail, Options};
use std::{env, fs, io, process};
use xamlc::{
    diagnose::{Diagnostic, Reporter, SourceResolver, VisualReporter},
    pipeline::{Config, Pipeline},
    ts::catalog,
    xmlns::CompatMap,
};

/// Output produced for a compiled document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Emit {
    Il,
    Ast,
}

#[derive(Debug, PartialEq)]
struct Compile {
    input: String,
    types: String,
    emit: Emit,
    config: Config,
}

#[derive(Debug, PartialEq)]
enum Command {
    Compile(Compile),
    Usage,
}

fn read(path: &str) -> Result<String, i32> {
    fs::read_to_string(path).map_err(|e: io::Error| {
        eprintln!("error: failed to read `{path}`: {e}");
        exitcode::IOERR
    })
}

/// Render `e` against the source `src` named `name`.
fn report<D: Diagnostic>(name: &str, src: &str, e: &D) -> String {
    let mut reporter = VisualReporter::new(SourceResolver::new(name, src));

    // Rendering to a string ensures buffering so that we don't interleave
    //   output between processes.
    reporter.render(e).to_string()
}

fn compile(cmd: &Compile) -> Result<(), i32> {
    let types_src = read(&cmd.types)?;
    let src = read(&cmd.input)?;

    let ts = catalog::load(&types_src).map_err(|e| {
        eprintln!("{}", report(&cmd.types, &types_src, &e));
        eprintln!("fatal: failed to load types from `{}`", cmd.types);
        1
    })?;

    let doc = Pipeline::default()
        .compile(&ts, &cmd.config, &src)
        .map_err(|e| {
            eprintln!("{}", report(&cmd.input, &src, &e));
            eprintln!("fatal: failed to compile `{}`", cmd.input);
            1
        })?;

    for e in &doc.diagnostics {
        eprintln!("{}", report(&cmd.input, &src, e));
    }

    match cmd.emit {
        Emit::Il => print!("{}", doc.instructions.listing(&ts)),
        Emit::Ast => println!("{:#?}", doc.root),
    }

    Ok(())
}

pub fn main() {
    let args: Vec<String> = env::args().collect();
    let program = &args[0];
    let opts = get_opts();
    let usage = opts.usage(&format!("Usage: {} [OPTIONS] INPUT", program));

    match parse_options(opts, args) {
        Ok(Command::Compile(cmd)) => match compile(&cmd) {
            Ok(()) => process::exit(exitcode::OK),
            Err(code) => process::exit(code),
        },
        Ok(Command::Usage) => {
            println!("{}", usage);
            process::exit(exitcode::OK);
        }
        Err(e) => {
            eprintln!("{}", e);
            println!("{}", usage);
            process::exit(exitcode::USAGE);
        }
    }
}

fn get_opts() -> Options {
    let mut opts = Options::new();
    opts.optopt(
        "t",
        "types",
        "type catalog describing the target types",
        "CATALOG",
    );
    opts.optflag("", "lenient", "skip nodes that cannot be resolved");
    opts.optmulti(
        "",
        "compat",
        "substitute namespace TO for namespace FROM",
        "FROM=TO",
    );
    opts.optopt("", "emit", "set output type", "il|ast");
    opts.optflag("h", "help", "print this help menu");

    opts
}

fn parse_options(opts: Options, args: Vec<String>) -> Result<Command, Fail> {
    let matches = opts.parse(&args[1..])?;

    if matches.opt_present("h") {
        return Ok(Command::Usage);
    }

    let input = match matches.free.len() {
        0 => return Err(Fail::OptionMissing(String::from("INPUT"))),
        1 => matches.free[0].clone(),
        _ => return Err(Fail::UnrecognizedOption(matches.free[1].clone())),
    };

    let types = matches
        .opt_str("t")
        .ok_or_else(|| Fail::OptionMissing(String::from("--types")))?;

    let emit = match matches.opt_str("emit").as_deref() {
        None | Some("il") => Emit::Il,
        Some("ast") => Emit::Ast,
        Some(_) => {
            return Err(Fail::ArgumentMissing(String::from("--emit il|ast")))
        }
    };

    let compat = matches
        .opt_strs("compat")
        .into_iter()
        .map(|pair| match pair.split_once('=') {
            Some((from, to)) if !from.is_empty() && !to.is_empty() => {
                Ok((from.to_string(), to.to_string()))
            }
            _ => Err(Fail::UnexpectedArgument(format!("--compat {pair}"))),
        })
        .collect::<Result<CompatMap, _>>()?;

    Ok(Command::Compile(Compile {
        input,
        types,
        emit,
        config: Config {
            strict: !matches.opt_present("lenient"),
            compat,
        },
    }))
}

#[cfg(test)]
mod test {
    use super::*;

    fn args(args: &[&str]) -> Vec<String> {
        std::iter::once("program")
            .chain(args.iter().copied())
            .map(String::from)
            .collect()
    }

    #[test]
    fn parse_options_help() {
        let opts = get_opts();
        let result = parse_options(opts, args(&["-h"]));

        match result {
            Ok(Command::Usage) => {}
            _ => panic!("Help option did not parse"),
        }
    }

    #[test]
    fn parse_options_help_long() {
        let opts = get_opts();
        let result = parse_options(opts, args(&["--help"]));

        match result {
            Ok(Command::Usage) => {}
            _ => panic!("Long help option did not parse"),
        }
    }

    #[test]
    fn parse_options_invalid() {
        let opts = get_opts();
        let result = parse_options(opts, args(&["-q"]));

        match result {
            Err(Fail::UnrecognizedOption(_)) => {}
            _ => panic!("Invalid option not caught"),
        }
    }

    #[test]
    fn parse_options_missing_input() {
        let opts = get_opts();
        let result = parse_options(opts, args(&[]));

        match result {
            Err(Fail::OptionMissing(message)) => {
                assert_eq!("INPUT", message);
            }
            _ => panic!("Missing input not caught"),
        }
    }

    #[test]
    fn parse_options_missing_types() {
        let opts = get_opts();
        let result = parse_options(opts, args(&["doc.xaml"]));

        match result {
            Err(Fail::OptionMissing(message)) => {
                assert_eq!("--types", message);
            }
            _ => panic!("Missing types not caught"),
        }
    }

    #[test]
    fn parse_options_invalid_emit() {
        let opts = get_opts();
        let result = parse_options(
            opts,
            args(&["doc.xaml", "-t", "types.xml", "--emit", "foo"]),
        );

        match result {
            Err(Fail::ArgumentMissing(message)) => {
                assert_eq!("--emit il|ast", message);
            }
            _ => panic!("Invalid emit not caught"),
        }
    }

    #[test]
    fn parse_options_too_many_args() {
        let opts = get_opts();
        let result = parse_options(
            opts,
            args(&["doc.xaml", "-t", "types.xml", "extra"]),
        );

        match result {
            Err(Fail::UnrecognizedOption(message)) => {
                assert_eq!("extra", message);
            }
            _ => panic!("Extra option not caught"),
        }
    }

    #[test]
    fn parse_options_invalid_compat() {
        let opts = get_opts();
        let result = parse_options(
            opts,
            args(&["doc.xaml", "-t", "types.xml", "--compat", "urn:a"]),
        );

        match result {
            Err(Fail::UnexpectedArgument(message)) => {
                assert_eq!("--compat urn:a", message);
            }
            _ => panic!("Invalid compat not caught"),
        }
    }

    #[test]
    fn parse_options_defaults() {
        let opts = get_opts();
        let result = parse_options(opts, args(&["doc.xaml", "-t", "t.xml"]));

        assert_eq!(
            Ok(Command::Compile(Compile {
                input: "doc.xaml".into(),
                types: "t.xml".into(),
                emit: Emit::Il,
                config: Config::default(),
            })),
            result,
        );
    }

    #[test]
    fn parse_options_all() {
        let opts = get_opts();
        let result = parse_options(
            opts,
            args(&[
                "--types",
                "t.xml",
                "--lenient",
                "--emit",
                "ast",
                "--compat",
                "urn:old=urn:new",
                "--compat",
                "urn:a=urn:b",
                "doc.xaml",
            ]),
        );

        let compat = [("urn:old", "urn:new"), ("urn:a", "urn:b")]
            .into_iter()
            .map(|(from, to)| (from.to_string(), to.to_string()))
            .collect();

        assert_eq!(
            Ok(Command::Compile(Compile {
                input: "doc.xaml".into(),
                types: "t.xml".into(),
                emit: Emit::Ast,
                config: Config {
                    strict: false,
                    compat,
                },
            })),
            result,
        );
    }
}
