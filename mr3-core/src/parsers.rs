//! File parsers for Monster Rancher 3 text dumps.

use crate::error::{Mr3Error, Result};
use crate::file_utils::{normalize_lines, read_text_file};
use crate::models::{Attack, Characteristic, NO_EFFECT, UNKNOWN};
use std::path::Path;
use tracing::{debug, info, warn};

/// Any line containing this starts a new derivation section.
const DERIVATION_MARKER: &str = "Derivation:";
/// Any line containing this starts an attack record.
const ATTACK_MARKER: &str = "Attack:";
/// Placeholder the dumps use for "no value".
const ABSENT: &str = "-";
/// Literal first column of the characteristic header row.
const CHARACTERISTIC_HEADER: &str = "Name";

/// State carried through the line walk.
#[derive(Debug, Default)]
struct ParseContext {
    /// Number of derivation headers seen so far.
    derivation_id: u32,
}

/// Raw numeric value and the line it came from, for error reporting.
type RawNumber = Option<(String, usize)>;

/// Field values collected for one attack record before defaults are applied.
#[derive(Debug, Default)]
struct AttackBuilder {
    name: Option<String>,
    stat_used: Option<String>,
    attack_type: Option<String>,
    item_required: Option<String>,
    guts_used: RawNumber,
    damage: RawNumber,
    guts_down: RawNumber,
    critical_chance: RawNumber,
    hit_chance: RawNumber,
    max_level: RawNumber,
    range: Option<String>,
    growth: Option<String>,
    effect: Option<String>,
}

impl AttackBuilder {
    /// Store a value for a known key. Returns false for unknown keys.
    fn set(&mut self, key: &str, value: &str, line: usize) -> bool {
        let value = match value {
            "" | ABSENT => None,
            v => Some(v.to_string()),
        };

        match key {
            "Attack" => self.name = value,
            "Stat Used" => self.stat_used = value,
            "Type" => self.attack_type = value,
            "Item" => self.item_required = value,
            "Guts Used" => self.guts_used = value.map(|v| (v, line)),
            "Damage" => self.damage = value.map(|v| (v, line)),
            "Guts Down" => self.guts_down = value.map(|v| (v, line)),
            "Critical" => self.critical_chance = value.map(|v| (v, line)),
            "Hit" => self.hit_chance = value.map(|v| (v, line)),
            "Max Level" => self.max_level = value.map(|v| (v, line)),
            "Range" => self.range = value,
            "Growth" => self.growth = value,
            "Effect" => self.effect = value,
            _ => return false,
        }
        true
    }

    fn build(self, derivation_id: u32) -> Result<Attack> {
        Ok(Attack {
            derivation_id,
            name: self.name.unwrap_or_else(|| UNKNOWN.to_string()),
            stat_used: self.stat_used.unwrap_or_else(|| UNKNOWN.to_string()),
            attack_type: self.attack_type.unwrap_or_else(|| UNKNOWN.to_string()),
            item_required: self.item_required.unwrap_or_else(|| UNKNOWN.to_string()),
            guts_used: parse_int("Guts Used", self.guts_used)?,
            damage: parse_int("Damage", self.damage)?,
            guts_down: parse_int("Guts Down", self.guts_down)?,
            critical_chance: parse_int("Critical", self.critical_chance)?,
            hit_chance: parse_int("Hit", self.hit_chance)?,
            max_level: parse_int("Max Level", self.max_level)?,
            range: self.range.unwrap_or_else(|| UNKNOWN.to_string()),
            growth: self.growth.unwrap_or_else(|| UNKNOWN.to_string()),
            effect: self.effect.unwrap_or_else(|| NO_EFFECT.to_string()),
        })
    }
}

fn parse_int(field: &'static str, raw: RawNumber) -> Result<i32> {
    match raw {
        None => Ok(0),
        Some((value, line)) => value
            .parse()
            .map_err(|_| Mr3Error::InvalidNumber { field, value, line }),
    }
}

/// Split `Key: Value` on the first separator. `Key:` alone yields an empty value.
fn split_key_value(line: &str) -> Option<(&str, &str)> {
    line.split_once(": ")
        .or_else(|| line.strip_suffix(':').map(|key| (key, "")))
        .map(|(key, value)| (key.trim(), value.trim()))
}

/// Parse an attack dump file.
pub fn parse_attack_file(file_path: &Path) -> Result<Vec<Attack>> {
    let text = read_text_file(file_path)?;
    let attacks = parse_attack_text(&text)?;
    info!("Parsed {} attacks from {}", attacks.len(), file_path.display());
    Ok(attacks)
}

/// Parse attack records from the text of an attack dump.
///
/// Records keep source order. Each record takes the number of `Derivation:` headers
/// seen before it as its derivation id. A record runs from its `Attack:` line to the
/// next blank line, so a header inside an unterminated record is read as an ignored key.
pub fn parse_attack_text(text: &str) -> Result<Vec<Attack>> {
    let normalized = normalize_lines(text);
    let mut lines = normalized.lines().enumerate().map(|(idx, line)| (idx + 1, line));

    let mut ctx = ParseContext::default();
    let mut attacks = Vec::new();

    while let Some((line_no, line)) = lines.next() {
        if line.is_empty() {
            continue;
        }

        if line.contains(DERIVATION_MARKER) {
            ctx.derivation_id += 1;
            debug!("Line {}: derivation section {}", line_no, ctx.derivation_id);
        } else if line.contains(ATTACK_MARKER) {
            let attack = read_attack(&mut lines, (line_no, line), &ctx)?;
            debug!("Line {}: attack {:?} (derivation {})", line_no, attack.name, attack.derivation_id);
            attacks.push(attack);
        }
    }

    Ok(attacks)
}

/// Consume key/value lines starting at `first` until a blank line or the end of input.
fn read_attack<'a, I>(lines: &mut I, first: (usize, &'a str), ctx: &ParseContext) -> Result<Attack>
where
    I: Iterator<Item = (usize, &'a str)>,
{
    let mut builder = AttackBuilder::default();
    let mut current = Some(first);

    while let Some((line_no, line)) = current {
        if line.is_empty() {
            break;
        }

        let (key, value) = split_key_value(line).ok_or_else(|| {
            Mr3Error::Parse(format!("Line {}: expected `Key: Value`, found {:?}", line_no, line))
        })?;

        if !builder.set(key, value, line_no) {
            if line.contains(DERIVATION_MARKER) {
                warn!(
                    "Line {}: derivation header inside an unterminated attack record, ignored",
                    line_no
                );
            } else {
                debug!("Line {}: ignoring unknown attack key {:?}", line_no, key);
            }
        }

        current = lines.next();
    }

    builder.build(ctx.derivation_id)
}

/// Parse a characteristic dump file.
pub fn parse_characteristic_file(file_path: &Path) -> Result<Vec<Characteristic>> {
    let text = read_text_file(file_path)?;
    let characteristics = parse_characteristic_text(&text)?;
    info!(
        "Parsed {} characteristics from {}",
        characteristics.len(),
        file_path.display()
    );
    Ok(characteristics)
}

/// Parse `Name;Description` rows. The first line is the header and is discarded.
///
/// Any later row whose name is literally `Name` is dropped as well.
pub fn parse_characteristic_text(text: &str) -> Result<Vec<Characteristic>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b';')
        .has_headers(true)
        .quoting(false)
        .flexible(true)
        .trim(csv::Trim::None)
        .from_reader(text.as_bytes());

    let mut characteristics = Vec::new();
    for result in reader.records() {
        let record = result?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);

        if record.iter().all(|field| field.trim().is_empty()) {
            continue;
        }
        if record.len() < 2 {
            return Err(Mr3Error::Parse(format!(
                "Line {}: expected `Name;Description`, found {:?}",
                line,
                record.get(0).unwrap_or_default()
            )));
        }

        let name = record[0].trim();
        if name == CHARACTERISTIC_HEADER {
            debug!("Line {}: skipping header-like row", line);
            continue;
        }

        // Split on the first ';' only; later ones belong to the description
        let description = record.iter().skip(1).collect::<Vec<_>>().join(";");
        let characteristic = Characteristic {
            name: name.to_string(),
            description: description.trim().to_string(),
        };
        debug!("Line {}: {}", line, characteristic);
        characteristics.push(characteristic);
    }

    Ok(characteristics)
}
