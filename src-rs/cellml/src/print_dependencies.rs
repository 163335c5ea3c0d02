//! Dependency tree printing for the CellML CLI

use anstream::println;
use cellml_importer::{ImportedItem, ModelDependencies, SourceDependencies};
use owo_colors::OwoColorize;

use crate::stylesheet;

/// Prints the import dependencies of a model as a tree
pub fn print(dependencies: &ModelDependencies, print_debug: bool) {
    if print_debug {
        println!("{dependencies:#?}");
        return;
    }

    println!("{}", dependencies.name().bold());
    print_sources(dependencies.sources(), "");
}

fn print_sources(sources: &[SourceDependencies], indent: &str) {
    for (i, source) in sources.iter().enumerate() {
        let is_last = i == sources.len() - 1;
        let (branch, continuation) = guides(is_last);

        let url = stylesheet::DOCUMENT_KEY.style(source.url());
        println!("{indent}{branch}{url}");

        let indent = format!("{indent}{continuation}");
        let nested = source.model();
        let items: Vec<(&str, &ImportedItem)> = source
            .components()
            .iter()
            .map(|item| ("component", item))
            .chain(source.units().iter().map(|item| ("units", item)))
            .collect();

        for (j, (kind, item)) in items.iter().enumerate() {
            let is_last = j == items.len() - 1 && nested.is_none();
            let (branch, _) = guides(is_last);
            let reference = stylesheet::IMPORT_REFERENCE.style(&item.reference);
            println!("{indent}{branch}{kind} {} <- {reference}", item.name);
        }

        if let Some(nested) = nested {
            let (branch, continuation) = guides(true);
            println!("{indent}{branch}{}", nested.name().bold());
            print_sources(nested.sources(), &format!("{indent}{continuation}"));
        }
    }
}

/// Returns the guide for an entry and the indent for what is under it
fn guides(is_last: bool) -> (String, String) {
    let (branch, continuation) = if is_last {
        ("└── ", "    ")
    } else {
        ("├── ", "│   ")
    };
    (
        stylesheet::TREE_GUIDE.style(branch).to_string(),
        stylesheet::TREE_GUIDE.style(continuation).to_string(),
    )
}
