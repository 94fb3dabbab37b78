use nmrstar::{
    from_str, from_str_with_options, to_string, to_string_with_options, Entry, Error, Loop,
    ParseOptions, Saveframe, TokenizerBackend, WriteOptions,
};

fn roundtrip(entry: &Entry) -> Entry {
    let text = to_string(entry).unwrap();
    println!("Rendered:\n{}", text);
    for backend in [TokenizerBackend::Portable, TokenizerBackend::Accelerated] {
        let options = ParseOptions::default().with_backend(backend);
        let parsed = from_str_with_options(&text, &options).unwrap();
        assert_eq!(&parsed, entry, "backend {}", backend);
    }
    from_str(&text).unwrap()
}

fn awkward_values() -> Vec<&'static str> {
    vec![
        "",
        "plain",
        "two words",
        "it's",
        "a' b",
        "\"double\"",
        "'single'",
        "$framecode",
        "$",
        "_underscore",
        "#hash",
        ";semicolon",
        "semi;colon",
        "data_x",
        "Save_frame",
        "stop_",
        "global_",
        "tab\tinside",
        "one line\n",
        "two\nlines\n",
        "\nleading newline\n",
        "  indented\n   text\n",
    ]
}

#[test]
fn test_saveframe_tags_roundtrip() {
    let mut entry = Entry::new("tags");
    let frame = entry.append_saveframe("values").unwrap();
    for (i, value) in awkward_values().into_iter().enumerate() {
        frame.add_tag(&format!("_Values.Tag_{}", i), value).unwrap();
    }
    roundtrip(&entry);
}

#[test]
fn test_loop_values_roundtrip() {
    let mut lp = Loop::new();
    lp.append_tag("_Values.Ordinal").unwrap();
    lp.append_tag("_Values.Text").unwrap();
    lp.append_tag("_Values.Other").unwrap();
    for (i, value) in awkward_values().into_iter().enumerate() {
        lp.add_row([i.to_string().as_str(), value, "x"]).unwrap();
    }

    let mut entry = Entry::new("loops");
    let frame = entry.append_saveframe("values").unwrap();
    frame.add_tag("_Values_list.ID", "1").unwrap();
    frame.append_loop(lp).unwrap();
    roundtrip(&entry);
}

#[test]
fn test_structure_roundtrip() {
    let mut entry = Entry::new("15000");
    {
        let info = entry.append_saveframe("entry_information").unwrap();
        info.add_tag("_Entry.Sf_category", "entry_information").unwrap();
        info.add_tag("Title", "Solution structure\nof something\n").unwrap();
        info.add_tag("Submission_date", "2006-09-07").unwrap();

        let mut authors = Loop::new();
        authors.append_tag("_Entry_author.Ordinal").unwrap();
        authors.append_tag("Given_name").unwrap();
        authors.append_tag("Family_name").unwrap();
        authors.add_row(["1", "Ada", "Lovelace"]).unwrap();
        authors.add_row(["2", "Alan", "Turing"]).unwrap();
        info.append_loop(authors).unwrap();

        let mut empty = Loop::new();
        empty.append_tag("_Related_entries.Database_name").unwrap();
        info.append_loop(empty).unwrap();
    }
    entry
        .append_saveframe("citation_1")
        .unwrap()
        .add_tag("_Citation.Entry_ID", "$entry_information")
        .unwrap();

    let parsed = roundtrip(&entry);
    let names: Vec<_> = parsed.saveframes().map(Saveframe::name).collect();
    assert_eq!(names, vec!["entry_information", "citation_1"]);
    let authors = parsed
        .saveframe("entry_information")
        .and_then(|f| f.get_loop("_Entry_author"))
        .unwrap();
    assert_eq!(
        authors.column_values("Family_name").unwrap(),
        vec!["Lovelace", "Turing"]
    );
}

#[test]
fn test_nested_documents() {
    let mut current = Entry::new("level_0");
    current
        .append_saveframe("notes")
        .unwrap()
        .add_tag("_Note.Text", "first\nsecond\n")
        .unwrap();

    let mut levels = vec![current.clone()];
    for depth in 1..=3 {
        let embedded = format!("\n{}", to_string(&current).unwrap());
        let mut outer = Entry::new(format!("level_{}", depth));
        outer
            .append_saveframe("notes")
            .unwrap()
            .add_tag("_Note.Text", embedded)
            .unwrap();
        current = outer;
        levels.push(current.clone());
    }

    let mut parsed = roundtrip(&current);
    for expected in levels.iter().rev().skip(1) {
        let value = parsed
            .saveframe("notes")
            .and_then(|f| f.tag("Text"))
            .unwrap()
            .to_string();
        parsed = from_str(&value).unwrap();
        assert_eq!(&parsed, expected);
    }
    assert_eq!(parsed.id(), "level_0");
}

#[test]
fn test_saveframe_and_loop_roots() {
    let mut frame = Saveframe::new("assembly");
    frame.add_tag("_Assembly.ID", "1").unwrap();
    frame.add_tag("_Assembly.Name", "a name").unwrap();
    let mut lp = Loop::new();
    lp.append_tag("_Entity_assembly.ID").unwrap();
    lp.add_row(["1"]).unwrap();
    frame.append_loop(lp.clone()).unwrap();

    let text = to_string(&frame).unwrap();
    assert_eq!(text.parse::<Saveframe>().unwrap(), frame);

    let text = to_string(&lp).unwrap();
    assert_eq!(text.parse::<Loop>().unwrap(), lp);
}

#[test]
fn test_skip_empty_loops() {
    let mut entry = Entry::new("1");
    let frame = entry.append_saveframe("f").unwrap();
    frame.add_tag("_F.ID", "1").unwrap();
    let mut lp = Loop::new();
    lp.append_tag("_Empty.ID").unwrap();
    frame.append_loop(lp).unwrap();

    let text = to_string_with_options(&entry, WriteOptions::new().with_skip_empty_loops(true)).unwrap();
    let parsed = from_str(&text).unwrap();
    assert!(parsed.saveframe("f").unwrap().loops().is_empty());
}

#[test]
fn test_unrepresentable_values() {
    for value in ["a' \" b", "carriage\rreturn", "no final\nnewline", "trailing\n;\n", ";\nleading\n"] {
        let mut frame = Saveframe::new("f");
        frame.add_tag("_F.Value", value).unwrap();
        let err = to_string(&frame).unwrap_err();
        assert!(matches!(err, Error::Unrepresentable(_)), "{:?}", value);
    }
}

#[test]
fn test_saveframe_without_prefix_is_unrepresentable() {
    let mut lp = Loop::new();
    lp.append_tag("_L.a").unwrap();
    lp.add_row(["1"]).unwrap();
    let mut only_loop = Entry::new("e");
    only_loop.append_saveframe("only_loop").unwrap().append_loop(lp).unwrap();

    let mut undotted = Entry::new("e");
    undotted
        .append_saveframe("legacy")
        .unwrap()
        .add_tag("_Legacy_tag", "1")
        .unwrap();

    for entry in [only_loop, undotted] {
        let err = to_string(&entry).unwrap_err();
        assert!(matches!(err, Error::Unrepresentable(_)), "{:?}", err);
    }
}
