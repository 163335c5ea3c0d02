//! Issue message formatting and display functionality
//
//       error[importer-missing-component]: Import of component 'importedGateH' from ...
//        --> resources/HodgkinHuxley.cellml
//        |  in component 'importedGateH'
//        = help: ...

use anstream::eprintln;
use cellml_shared::{Context, Issue, Level};
use owo_colors::{OwoColorize, Style};

use crate::stylesheet;

/// Prints a formatted issue to standard error
pub fn print(issue: &Issue, print_debug: bool) {
    if print_debug {
        eprintln!("{issue:?}");
    } else {
        let issue_string = issue_to_string(issue);
        eprintln!("{issue_string}");
    }
}

/// Prints every issue followed by a count of errors and warnings
pub fn print_all<'a>(issues: impl IntoIterator<Item = &'a Issue>, print_debug: bool) {
    let mut errors = 0;
    let mut warnings = 0;

    for issue in issues {
        print(issue, print_debug);
        match issue.level() {
            Level::Error => errors += 1,
            Level::Warning => warnings += 1,
            Level::Hint | Level::Message => {}
        }
    }

    if errors + warnings > 0 {
        let summary = format!("{errors} error(s), {warnings} warning(s)");
        eprintln!("{}", summary.bold());
    }
}

/// Converts an issue to a formatted string representation
fn issue_to_string(issue: &Issue) -> String {
    let mut lines = vec![get_message_line(issue)];
    lines.extend(get_location_line(issue.url()));

    let bar = stylesheet::SOURCE_ANNOTATION.style("|");
    if let Some(item) = issue.item() {
        lines.push(format!(" {bar}  in {item}"));
    }
    lines.extend(issue.context().iter().map(get_context_line));
    lines.push(String::new());

    lines.join("\n")
}

/// Formats the main message line
fn get_message_line(issue: &Issue) -> String {
    // <level>[<rule>]: <message>
    let color = level_color(issue.level());
    let kind = issue.reference_rule().map_or_else(
        || issue.level().to_string(),
        |rule| format!("{}[{rule}]", issue.level()),
    );
    let kind_str = color.style(kind);
    let message_line = format!("{kind_str}: {}", issue.description());

    message_line.bold().to_string()
}

/// Formats the location line, if the issue is tied to a document
fn get_location_line(url: Option<&str>) -> Option<String> {
    //  --> <url>
    let arrow = stylesheet::SOURCE_ANNOTATION.style("-->");
    url.map(|url| format!(" {arrow} {url}"))
}

fn get_context_line(context: &Context) -> String {
    let (kind, color, message) = match context {
        Context::Note(message) => ("note", stylesheet::NOTE_COLOR, message),
        Context::Help(message) => ("help", stylesheet::HELP_COLOR, message),
    };
    let equals = color.bold().style("=");
    let kind = color.style(kind);
    format!(" {equals} {}", format!("{kind}: {message}").bold())
}

const fn level_color(level: Level) -> Style {
    match level {
        Level::Error => stylesheet::ERROR_COLOR,
        Level::Warning => stylesheet::WARNING_COLOR,
        Level::Hint | Level::Message => stylesheet::INFO_COLOR,
    }
}
