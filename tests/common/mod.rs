#![allow(dead_code)]

use papergen::Item;
use papergen::constants::tags::*;

pub const TOPIC: &str = "syn";

/// Pool that every built-in profile can be generated from.
pub fn catalog_items() -> Vec<Item> {
    let mut items: Vec<Item> = Vec::new();

    for (idx, marks) in [6, 8, 10, 12].iter().cycle().take(20).enumerate() {
        items.push(Item::new(format!("nested-{idx}"), TOPIC, *marks).with_nested(true));
    }
    for marks in 1..=5 {
        for idx in 0..10 {
            items.push(Item::new(format!("short-{marks}-{idx}"), TOPIC, marks));
        }
    }
    for marks in [10, 11, 12, 13] {
        for idx in 0..6 {
            items.push(Item::new(format!("long-{marks}-{idx}"), TOPIC, marks));
        }
    }

    for idx in 0..30 {
        items.push(Item::new(format!("math-i-{idx}"), TOPIC, 3).with_section(SECTION_I));
    }
    for idx in 0..2 {
        items.push(Item::new(format!("math-i-five-{idx}"), TOPIC, 5).with_section(SECTION_I));
    }
    for idx in 0..12 {
        items.push(Item::new(format!("math-ii-{idx}"), TOPIC, 10).with_section(SECTION_II));
    }

    let english = [
        ("func", KIND_FUNCTIONAL, 3, 20),
        ("cloze", KIND_CLOZE, 3, 10),
        ("oral-ten", KIND_ORAL, 4, 10),
        ("oral-five", KIND_ORAL, 6, 5),
        ("comp", KIND_COMPREHENSION, 2, 20),
        ("excerpt", KIND_EXCERPT, 2, 25),
        ("poem", KIND_POEM, 2, 20),
        ("grammar", KIND_GRAMMAR, 6, 5),
        ("composition", KIND_COMPOSITION, 2, 20),
        ("essay-c", KIND_COMPULSORY_ESSAY, 3, 20),
        ("essay-o", KIND_OPTIONAL_ESSAY, 2, 20),
    ];
    for (prefix, kind, count, marks) in english {
        for idx in 0..count {
            items.push(Item::new(format!("{prefix}-{idx}"), TOPIC, marks).with_kind(kind));
        }
    }

    for idx in 0..8 {
        items.push(Item::new(format!("geo-a-{idx}"), TOPIC, 5).with_section(SECTION_A));
    }
    for idx in 0..4 {
        items.push(Item::new(format!("geo-b-{idx}"), TOPIC, 25).with_section(SECTION_B));
    }
    for idx in 0..2 {
        items.push(
            Item::new(format!("geo-map-{idx}"), TOPIC, 25)
                .with_section(SECTION_B)
                .with_kind(KIND_MAP),
        );
    }
    items
}

/// `count` standalone items named `{prefix}-{n}` worth `marks`, tagged `kind`.
pub fn tagged(prefix: &str, kind: &str, count: usize, marks: u32) -> Vec<Item> {
    (0..count)
        .map(|idx| Item::new(format!("{prefix}-{idx}"), TOPIC, marks).with_kind(kind))
        .collect()
}
