use super::*;
use crate::metadata::parse_metadata;
use crate::testing::{failed, ok, FakeConsole};
use std::cell::RefCell;
use std::rc::Rc;

fn foo_descriptor() -> PackageDescriptor {
    parse_metadata(Path::new("m.xml"), r#"<package name="Foo" version="2.1"/>"#)
        .expect("parse")
        .package
}

fn rows(text: &str) -> Vec<PackageRow> {
    parse_package_report(&format!("Name    Version   Status\n{text}\n")).expect("parse")
}

#[test]
fn matching_version_is_noop() {
    assert_eq!(reconcile(&foo_descriptor(), &rows("Foo     2.1")), Action::NoOp);
}

#[test]
fn different_version_is_reinstall() {
    assert_eq!(
        reconcile(&foo_descriptor(), &rows("Foo     2.0")),
        Action::Reinstall {
            name: "Foo".to_string(),
            version: "2.1".to_string(),
            installed: "2.0".to_string(),
        }
    );
}

#[test]
fn missing_package_is_install() {
    assert_eq!(
        reconcile(&foo_descriptor(), &rows("Bar     2.1")),
        Action::Install {
            name: "Foo".to_string(),
            version: "2.1".to_string(),
        }
    );
}

#[test]
fn versions_compare_as_literal_strings() {
    assert!(matches!(
        reconcile(&foo_descriptor(), &rows("Foo     2.1.0")),
        Action::Reinstall { .. }
    ));
}

#[test]
fn first_duplicate_row_wins() {
    let installed = rows("Foo     2.1\nFoo     1.0");
    assert_eq!(reconcile(&foo_descriptor(), &installed), Action::NoOp);
}

#[test]
fn sync_is_idempotent_once_installed() {
    let installed = Rc::new(RefCell::new("1.9".to_string()));
    let state = Rc::clone(&installed);
    let console = FakeConsole::new(move |command| match command {
        ConsoleCommand::ListPackages { .. } => {
            ok(&format!("Name   Version   Status\nFoo    {}      OK\n", state.borrow()))
        }
        ConsoleCommand::AddPackage { version, .. } => {
            *state.borrow_mut() = version.clone();
            ok("added")
        }
        other => panic!("unexpected command {other:?}"),
    });
    let lib = Path::new("/work/lib.ssim");

    let first = sync_package_version(&console, lib, &foo_descriptor());
    assert!(matches!(first, Action::Reinstall { .. }));
    let second = sync_package_version(&console, lib, &foo_descriptor());
    assert_eq!(second, Action::NoOp);
    assert_eq!(
        console.labels(),
        vec!["list-packages", "add-package", "list-packages"]
    );
    assert_eq!(
        console.calls()[1],
        ConsoleCommand::AddPackage {
            package: "Foo".to_string(),
            version: "2.1".to_string(),
            lib: lib.to_path_buf(),
        }
    );
    assert_eq!(*installed.borrow(), "2.1");
}

#[test]
fn failed_listing_falls_back_to_install() {
    let console = FakeConsole::new(|command| match command {
        ConsoleCommand::ListPackages { .. } => failed(1, "cannot open library"),
        _ => ok(""),
    });
    let action = sync_package_version(&console, Path::new("lib.ssim"), &foo_descriptor());
    assert!(matches!(action, Action::Install { .. }));
    assert_eq!(console.labels(), vec!["list-packages", "add-package"]);
}

#[test]
fn failed_add_is_not_retried() {
    let console = FakeConsole::new(|command| match command {
        ConsoleCommand::ListPackages { .. } => ok("Name   Version\n"),
        _ => failed(2, "package server unavailable"),
    });
    let action = sync_package_version(&console, Path::new("lib.ssim"), &foo_descriptor());
    assert!(matches!(action, Action::Install { .. }));
    assert_eq!(console.labels(), vec!["list-packages", "add-package"]);
}
