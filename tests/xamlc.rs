// Tests for xamlc
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

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;

type TestResult = Result<(), Box<dyn std::error::Error>>;

fn data(name: &str) -> String {
    format!("{}/tests/data/{name}", env!("CARGO_MANIFEST_DIR"))
}

fn xamlc() -> Result<Command, Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("xamlc")?;
    cmd.arg("--types").arg(data("ui.xml"));
    Ok(cmd)
}

#[test]
fn compile_invalid_argument() -> TestResult {
    let mut cmd = Command::cargo_bin("xamlc")?;
    cmd.arg("-q");
    cmd.assert()
        .failure()
        .code(exitcode::USAGE)
        .stderr(predicate::str::contains("Unrecognized option:"));

    Ok(())
}

#[test]
fn compile_missing_input_file() -> TestResult {
    let mut cmd = xamlc()?;
    cmd.assert()
        .failure()
        .code(exitcode::USAGE)
        .stderr(predicate::str::contains("INPUT"));

    Ok(())
}

#[test]
fn compile_missing_types() -> TestResult {
    let mut cmd = Command::cargo_bin("xamlc")?;
    cmd.arg(data("button.xaml"));
    cmd.assert()
        .failure()
        .code(exitcode::USAGE)
        .stderr(predicate::str::contains("--types"));

    Ok(())
}

#[test]
fn compile_invalid_emit() -> TestResult {
    let mut cmd = xamlc()?;
    cmd.arg(data("button.xaml"));
    cmd.arg("--emit").arg("foo");
    cmd.assert()
        .failure()
        .code(exitcode::USAGE)
        .stderr(predicate::str::contains("--emit il|ast"));

    Ok(())
}

#[test]
fn compile_input_file_does_not_exist() -> TestResult {
    let mut cmd = xamlc()?;
    cmd.arg("foobar.xaml");
    cmd.assert()
        .failure()
        .code(exitcode::IOERR)
        .stderr(predicate::str::contains("failed to read `foobar.xaml`"));

    Ok(())
}

#[test]
fn compile_emits_listing() -> TestResult {
    let mut cmd = xamlc()?;
    cmd.arg(data("button.xaml"));
    cmd.assert().success().stdout(
        "\
IL_0000: newobj Demo.Button::.ctor()
IL_0001: dup
IL_0002: ldstr \"Hi\"
IL_0003: callvirt Demo.Button::set_Content(System.Object)
IL_0004: ret
",
    );

    Ok(())
}

#[test]
fn compile_collection_content() -> TestResult {
    let mut cmd = xamlc()?;
    cmd.arg(data("panel.xaml"));
    cmd.assert()
        .success()
        .stdout(predicate::str::contains(
            "callvirt Demo.UIElement::set_Name(System.String)",
        ))
        .stdout(predicate::str::contains(
            "callvirt Demo.StackPanel::get_Children()",
        ))
        .stdout(predicate::str::contains(
            "callvirt Demo.UIElementCollection::Add(Demo.UIElement)",
        ))
        .stdout(predicate::str::contains(
            "call Demo.Grid::SetRow(Demo.UIElement, System.Int32)",
        ))
        .stdout(predicate::str::contains(r#"ldstr "{Literal}""#))
        .stdout(predicate::str::ends_with("ret\n"));

    Ok(())
}

#[test]
fn compile_emits_ast() -> TestResult {
    let mut cmd = xamlc()?;
    cmd.arg(data("button.xaml"));
    cmd.arg("--emit").arg("ast");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("NewObject"))
        .stdout(predicate::str::contains("PropertyAssignment"));

    Ok(())
}

#[test]
fn compile_undeclared_property_strict() -> TestResult {
    let mut cmd = xamlc()?;
    cmd.arg(data("undeclared.xaml"));
    cmd.assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains(
            "type `Demo.Button` has no property `Undeclared`",
        ))
        .stderr(predicate::str::contains("fatal: failed to compile"));

    Ok(())
}

#[test]
fn compile_undeclared_property_lenient() -> TestResult {
    let mut cmd = xamlc()?;
    cmd.arg(data("undeclared.xaml"));
    cmd.arg("--lenient");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains(
            "callvirt Demo.Button::set_Title(System.String)",
        ))
        .stdout(predicate::str::contains("Undeclared").not())
        .stderr(predicate::str::contains(
            "type `Demo.Button` has no property `Undeclared`",
        ));

    Ok(())
}

#[test]
fn compile_compat_namespace() -> TestResult {
    let mut cmd = xamlc()?;
    cmd.arg(data("legacy.xaml"));
    cmd.arg("--compat").arg("urn:legacy=urn:ui");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("newobj Demo.Button::.ctor()"));

    Ok(())
}

#[test]
fn compile_unknown_namespace_without_compat() -> TestResult {
    let mut cmd = xamlc()?;
    cmd.arg(data("legacy.xaml"));
    cmd.assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("fatal: failed to compile"));

    Ok(())
}

#[test]
fn compile_malformed_document() -> TestResult {
    let mut cmd = xamlc()?;
    cmd.arg(data("malformed.xaml"));
    cmd.assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("malformed.xaml"))
        .stderr(predicate::str::contains("fatal: failed to compile"));

    Ok(())
}

#[test]
fn compile_bad_catalog() -> TestResult {
    let mut cmd = Command::cargo_bin("xamlc")?;
    cmd.arg("--types").arg(data("bad-catalog.xml"));
    cmd.arg(data("button.xaml"));
    cmd.assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Demo.Missing"))
        .stderr(predicate::str::contains("failed to load types"));

    Ok(())
}
