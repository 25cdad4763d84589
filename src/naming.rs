// Copyright Catenary Transit Initiatives
// Name normalization and sequence parsing for imported structure names.
//
// Structure names follow the "<structure>/<sequence>[suffix]" convention
// (e.g. "202/1", "1/1A"); parallel circuits share a structure number and
// differ by the trailing letter.

use crate::models::Tower;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref SITE_CORE: Regex = Regex::new(r"^(\d+[/-]\d+)").unwrap();
    static ref STRUCTURE_SEQUENCE: Regex = Regex::new(r"(\d+)/(\d+)([A-Z])?").unwrap();
    static ref FIRST_INTEGER: Regex = Regex::new(r"\d+").unwrap();
    static ref PARALLEL_SUFFIX: Regex = Regex::new(r"^\d+[/-]\d+([A-Z])$").unwrap();
    static ref PHASE_NOISE: Regex = Regex::new(r"FASE|PHASE|\s").unwrap();
}

const SUBSTATION_MARKERS: [&str; 4] = ["TRIO", "SUB", "SE ", "BOP"];

/// Bucket for names with no usable number.
const UNNUMBERED_SEQUENCE: i64 = 2000;

pub fn normalize_name(name: &str) -> String {
    name.trim().to_uppercase()
}

/// Leading "N/N" (or "N-N") of a name, else the whole normalized name.
pub fn site_core(name: &str) -> String {
    let n = normalize_name(name);
    match SITE_CORE.captures(&n) {
        Some(caps) => caps[1].to_string(),
        None => n,
    }
}

/// Grouping key for structures at the same site: the name's site core when it
/// has one, else the coordinates rounded to `decimals` places.
pub fn site_key(tower: &Tower, decimals: usize) -> String {
    let n = normalize_name(&tower.name);
    if let Some(caps) = SITE_CORE.captures(&n) {
        return caps[1].to_string();
    }
    format!(
        "{:.prec$},{:.prec$}",
        tower.lng,
        tower.lat,
        prec = decimals
    )
}

fn first_integer(s: &str) -> Option<i64> {
    FIRST_INTEGER
        .find(s)
        .and_then(|m| m.as_str().parse::<i64>().ok())
}

/// Ordering key along the line. Explicit sequence wins, then name parsing.
pub fn sequence_number(tower: &Tower) -> i64 {
    if let Some(seq) = tower.sequence {
        return seq;
    }
    name_sequence(&tower.name)
}

pub fn name_sequence(name: &str) -> i64 {
    let upper = name.to_uppercase();

    if SUBSTATION_MARKERS.iter().any(|m| upper.contains(m)) {
        return first_integer(&upper).unwrap_or(0);
    }

    if let Some(caps) = STRUCTURE_SEQUENCE.captures(&upper) {
        let structure = caps[1].parse::<i64>().ok();
        let sequence = caps[2].parse::<i64>().ok();
        let letter = caps
            .get(3)
            .and_then(|m| m.as_str().chars().next())
            .map_or(0, |l| l as i64 - 'A' as i64 + 1);
        let val = structure.zip(sequence).and_then(|(structure, sequence)| {
            structure
                .checked_mul(10_000)?
                .checked_add(sequence.checked_mul(100)?)?
                .checked_add(letter)
        });
        return val.unwrap_or(UNNUMBERED_SEQUENCE);
    }

    first_integer(&upper)
        .and_then(|n| n.checked_add(1000))
        .unwrap_or(UNNUMBERED_SEQUENCE)
}

/// Trailing circuit letter of a parallel structure ("1/1A" -> "A").
pub fn parallel_suffix(name: &str) -> Option<String> {
    let n = normalize_name(name);
    PARALLEL_SUFFIX.captures(&n).map(|caps| caps[1].to_string())
}

/// "Fase A", "PHASE a", "A" all normalize to "A".
pub fn normalize_phase(phase: &str) -> String {
    PHASE_NOISE
        .replace_all(&phase.to_uppercase(), "")
        .into_owned()
}

/// Canonical unordered key for a pair of normalized names.
pub fn pair_key(a: &str, b: &str) -> String {
    if a <= b {
        format!("{a}:::{b}")
    } else {
        format!("{b}:::{a}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_site_core() {
        assert_eq!(site_core(" 12/3a "), "12/3");
        assert_eq!(site_core("7-1"), "7-1");
        assert_eq!(site_core("Portico SE Norte"), "PORTICO SE NORTE");
    }

    #[test]
    fn test_site_key_falls_back_to_coordinates() {
        let t = Tower::new("x", "Estrutura", -23.55049, -46.63331);
        assert_eq!(site_key(&t, 3), "-46.633,-23.550");
        let named = Tower::new("y", "1/2", -23.55, -46.63);
        assert_eq!(site_key(&named, 3), "1/2");
    }

    #[test]
    fn test_name_sequence() {
        assert_eq!(name_sequence("1/1"), 10_100);
        assert_eq!(name_sequence("1/2"), 10_200);
        assert_eq!(name_sequence("202/1B"), 2_020_102);
        assert_eq!(name_sequence("SE Norte 4"), 4);
        assert_eq!(name_sequence("T15"), 1015);
        assert_eq!(name_sequence("Portal"), 2000);
    }

    #[test]
    fn test_oversized_numbers_fall_into_unnumbered_bucket() {
        assert_eq!(name_sequence("99999999999999999/1"), 2000);
        assert_eq!(name_sequence("1/99999999999999999"), 2000);
        assert_eq!(name_sequence("T9223372036854775807"), 2000);
        assert_eq!(name_sequence("T99999999999999999999"), 2000);

        let mut t = Tower::new("x", "99999999999999999/1", 0.0, 0.0);
        assert_eq!(sequence_number(&t), 2000);
        t.name = "922337203685478/1".to_string();
        assert_eq!(sequence_number(&t), 2000);
    }

    #[test]
    fn test_explicit_sequence_wins() {
        let mut t = Tower::new("x", "1/9", 0.0, 0.0);
        t.sequence = Some(3);
        assert_eq!(sequence_number(&t), 3);
    }

    #[test]
    fn test_parallel_suffix() {
        assert_eq!(parallel_suffix("1/1a").as_deref(), Some("A"));
        assert_eq!(parallel_suffix("1/1"), None);
    }

    #[test]
    fn test_normalize_phase() {
        assert_eq!(normalize_phase("Fase A"), "A");
        assert_eq!(normalize_phase("phase b"), "B");
        assert_eq!(normalize_phase("C"), "C");
        assert_eq!(normalize_phase("PARA-RAIO"), "PARA-RAIO");
    }

    #[test]
    fn test_pair_key_is_unordered() {
        assert_eq!(pair_key("1/2", "1/1"), pair_key("1/1", "1/2"));
        assert_eq!(pair_key("1/1", "1/2"), "1/1:::1/2");
    }
}
