//! Reading, inspecting and writing an NMR-STAR entry.
//!
//! Run with: cargo run --example roundtrip [path/to/entry.str]

use nmrstar::{from_str_with_options, to_string, ParseOptions, TokenizerBackend, WarningCategory};
use std::error::Error;

const SAMPLE: &str = r#"data_demo

save_entry_information
   _Entry.Sf_category   entry_information
   _Entry.ID            demo
   _Entry.Title
; A short title that spans
two lines
;
   _Entry.Details       "it's quoted"

   loop_
      _Entry_author.Ordinal
      _Entry_author.Given_name
      _Entry_author.Family_name

     1   Ada    Lovelace
     2   Alan   Turing

   stop_

   loop_
      _Related_entries.Database_name
   stop_
save_
"#;

fn main() -> Result<(), Box<dyn Error>> {
    let text = match std::env::args().nth(1) {
        Some(path) => std::fs::read_to_string(path)?,
        None => SAMPLE.to_string(),
    };

    // Strict, but allow loops that declare tags without data
    let options = ParseOptions::strict()
        .suppress(WarningCategory::EmptyLoop)
        .with_backend(TokenizerBackend::Accelerated);
    let entry = from_str_with_options(&text, &options)?;

    println!("Entry {} holds {} saveframe(s)", entry.id(), entry.len());
    for frame in entry.saveframes() {
        println!(
            "  save_{} ({} tags, {} loops)",
            frame.name(),
            frame.tags().count(),
            frame.loops().len()
        );
        for lp in frame.loops() {
            println!(
                "    {} x {} in {}",
                lp.rows().len(),
                lp.tags().len(),
                lp.category().unwrap_or("<no category>")
            );
        }
    }

    println!("\nAs JSON:\n{}", serde_json::to_string_pretty(&entry)?);

    let rendered = to_string(&entry)?;
    println!("\nRendered:\n{}", rendered);

    let reparsed = from_str_with_options(&rendered, &options)?;
    assert_eq!(reparsed, entry);
    println!("Round trip preserved the entry");
    Ok(())
}
