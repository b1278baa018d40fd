//! Atom naming conventions used in PDB-like atom index files.


/// Prefix rules, checked in order. The first matching prefix wins, unless the name is listed as
/// an exception of that rule.
const PREFIX_RULES: &[(&str, u8, &[&str])] = &[
    ("C", 6,  &[]),
    ("H", 1,  &[]),
    ("Q", 1,  &[]),             // hydrogen placeholder used by AMBER/CHARMM, e.g. QQH
    ("O", 8,  &[]),
    ("N", 7,  &[]),
    ("S", 16, &[]),
    ("P", 15, &[]),
    ("F", 9,  &["FAD"]),
];

/// Single-letter element symbols, used when no prefix rule applies.
const SINGLE_LETTER: &[(char, u8)] = &[
    ('C', 6),
    ('H', 1),
    ('O', 8),
    ('N', 7),
    ('S', 16),
    ('P', 15),
    ('F', 9),
];

/// Element symbols of the atomic numbers appearing in the datasets.
const SYMBOLS: &[(u8, &str)] = &[
    (1,  "H"),
    (6,  "C"),
    (7,  "N"),
    (8,  "O"),
    (9,  "F"),
    (15, "P"),
    (16, "S"),
    (17, "Cl"),
];

pub const UNKNOWN_SYMBOL: &str = "X";


/// Deduce the atomic number from a PDB atom name, e.g. `CA1` -> 6, `HB2` -> 1.
///
/// Returns 0 if the name cannot be recognized.
pub fn atomic_number_from_name(atom_name: &str) -> u8 {
    let name = atom_name.trim();

    for (prefix, z, exceptions) in PREFIX_RULES {
        if name.starts_with(prefix) && !exceptions.contains(&name) {
            return *z;
        }
    }

    name.chars()
        .next()
        .and_then(|c| SINGLE_LETTER.iter().find(|(s, _)| *s == c))
        .map(|(_, z)| *z)
        .unwrap_or(0)
}


/// Element symbol of atomic number `z`, `"X"` for the ones not in the table.
pub fn symbol_from_atomic_number(z: u8) -> &'static str {
    SYMBOLS.iter()
        .find(|(n, _)| *n == z)
        .map(|(_, s)| *s)
        .unwrap_or(UNKNOWN_SYMBOL)
}


pub fn symbols_from_atomic_numbers<'a, I>(zs: I) -> Vec<String>
where I: IntoIterator<Item=&'a u8> {
    zs.into_iter()
        .map(|z| symbol_from_atomic_number(*z).to_string())
        .collect()
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_atomic_number_from_name() {
        assert_eq!(atomic_number_from_name("CA1"), 6);
        assert_eq!(atomic_number_from_name("HB2"), 1);
        assert_eq!(atomic_number_from_name("OXT"), 8);
        assert_eq!(atomic_number_from_name("ZZZZ"), 0);
        assert_eq!(atomic_number_from_name("QQH"), 1);
        assert_eq!(atomic_number_from_name("  NZ "), 7);
        assert_eq!(atomic_number_from_name("SG"), 16);
        assert_eq!(atomic_number_from_name("P1"), 15);
        assert_eq!(atomic_number_from_name("F3"), 9);
        assert_eq!(atomic_number_from_name(""), 0);
        assert_eq!(atomic_number_from_name("ca"), 0);
    }

    #[test]
    fn test_fad_falls_back_to_single_letter() {
        // `FAD` escapes the prefix rule but still starts with the fluorine symbol.
        assert_eq!(atomic_number_from_name("FAD"), 9);
    }

    #[test]
    fn test_symbols() {
        assert_eq!(symbol_from_atomic_number(6), "C");
        assert_eq!(symbol_from_atomic_number(17), "Cl");
        assert_eq!(symbol_from_atomic_number(26), "X");
        assert_eq!(symbols_from_atomic_numbers(&[8, 1, 1]), vec!["O", "H", "H"]);
    }
}
