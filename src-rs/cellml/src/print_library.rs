//! Library listing for the CellML CLI

use anstream::println;
use cellml_importer::ResolutionCache;
use owo_colors::OwoColorize;

use crate::stylesheet;

/// Prints the documents in the library, in load order
pub fn print(library: &ResolutionCache, print_debug: bool) {
    if print_debug {
        println!("{library:#?}");
        return;
    }

    if library.is_empty() {
        println!("[no documents]");
        return;
    }

    for (key, model) in library {
        let key = stylesheet::DOCUMENT_KEY.style(key);
        let components = model.all_components().count();
        let units = model.units().len();
        let unresolved = if model.has_unresolved_imports() {
            stylesheet::WARNING_COLOR
                .style(" (has unresolved imports)")
                .to_string()
        } else {
            String::new()
        };

        println!(
            "{key}: {} with {components} component(s) and {units} units{unresolved}",
            model.name().bold()
        );
    }
}
