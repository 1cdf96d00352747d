//! English pluralization for resource names.

/// Words whose plural is not formed by a suffix rule.
const IRREGULARS: &[(&str, &str)] = &[
    ("person", "people"),
    ("child", "children"),
    ("man", "men"),
    ("woman", "women"),
    ("mouse", "mice"),
    ("goose", "geese"),
    ("foot", "feet"),
    ("tooth", "teeth"),
    ("ox", "oxen"),
    ("datum", "data"),
    ("medium", "media"),
    ("criterion", "criteria"),
    ("phenomenon", "phenomena"),
    ("index", "indices"),
    ("matrix", "matrices"),
    ("vertex", "vertices"),
    ("analysis", "analyses"),
    ("axis", "axes"),
    ("basis", "bases"),
    ("cactus", "cacti"),
    ("radius", "radii"),
    ("leaf", "leaves"),
    ("knife", "knives"),
    ("life", "lives"),
    ("wife", "wives"),
    ("half", "halves"),
    ("wolf", "wolves"),
    ("shelf", "shelves"),
    ("hero", "heroes"),
    ("potato", "potatoes"),
    ("tomato", "tomatoes"),
];

/// Irregular words that may end a compound name (`SalesPerson`).
const IRREGULAR_SUFFIXES: &[(&str, &str)] = &[
    ("person", "people"),
    ("child", "children"),
    ("woman", "women"),
    ("index", "indices"),
    ("vertex", "vertices"),
    ("matrix", "matrices"),
    ("analysis", "analyses"),
];

/// Words with identical singular and plural.
const UNCOUNTABLE: &[&str] = &[
    "sheep",
    "fish",
    "deer",
    "series",
    "species",
    "equipment",
    "information",
    "news",
    "data",
    "metadata",
    "imagery",
];

/// Pluralize a lower-case English word.
pub fn pluralize(word: &str) -> String {
    if word.is_empty() {
        return String::new();
    }

    if UNCOUNTABLE.iter().any(|u| word == *u || word.ends_with(u)) {
        return word.to_string();
    }

    if let Some((_, plural)) = IRREGULARS.iter().find(|(singular, _)| word == *singular) {
        return plural.to_string();
    }

    for (singular, plural) in IRREGULAR_SUFFIXES {
        if let Some(stem) = word.strip_suffix(singular) {
            return format!("{}{}", stem, plural);
        }
    }

    if let Some(stem) = word.strip_suffix('y') {
        if !stem.ends_with(is_vowel) && !stem.is_empty() {
            return format!("{}ies", stem);
        }
    }

    if ["s", "x", "z", "ch", "sh"].iter().any(|s| word.ends_with(s)) {
        return format!("{}es", word);
    }

    format!("{}s", word)
}

fn is_vowel(c: char) -> bool {
    matches!(c, 'a' | 'e' | 'i' | 'o' | 'u')
}
