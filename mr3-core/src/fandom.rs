//! Monster scraper for the Monster Rancher fandom wiki.
//!
//! The encyclopedia page has one `h2` per derivation followed by a table of
//! `Location | Monster` rows. Every derivation's block starts with a Brillia row,
//! which is the only signal that the next derivation has begun. Descriptions
//! come from each monster's own page, where a `wikitable` lists one row per game.

use crate::config::ScraperConfig;
use crate::error::{Mr3Error, Result};
use crate::http::PageSource;
use crate::models::{FIRST_REGION, Monster, region_id};
use regex::Regex;
use scraper::{ElementRef, Html, Node, Selector};
use std::sync::LazyLock;
use std::time::Duration;
use tracing::{debug, info, trace, warn};

/// Marks the column-header rows of the encyclopedia tables.
const HEADER_MARKER: &str = "Location";
/// Monster cell for a region/derivation combination that has no monster.
const NO_MONSTER: &str = "-";
/// Region cell the wiki uses for the Special region.
const SPECIAL_REGION_CELL: &str = "?";

static HEADINGS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("#mw-content-text h2").expect("valid selector"));
static ROWS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("#mw-content-text tr").expect("valid selector"));
static SUMMARY_TABLE: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("div.mw-parser-output table.wikitable").expect("valid selector")
});
static ANNOTATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s) \(.*|\[.*").expect("valid regex"));

/// Spellings the encyclopedia uses that differ from the in-game names.
const NAME_CORRECTIONS: [(&str, &str); 3] = [
    ("Color Pandora", "Colorpandora"),
    ("Henger", "Hengar"),
    ("Beaclon", "Beaklon"),
];

fn apply_name_corrections(name: &str) -> String {
    NAME_CORRECTIONS
        .iter()
        .fold(name.to_string(), |acc, (from, to)| acc.replace(from, to))
}

/// Turn an encyclopedia heading into a derivation name.
///
/// `"Bakus (30)"` becomes `"Baku"`, `"Beaclons[edit]"` becomes `"Beaklon"`.
pub fn wrangle_derivation_heading(heading: &str) -> String {
    let corrected = apply_name_corrections(heading.trim());
    let without_annotation = ANNOTATION.replace(&corrected, "");
    let name = without_annotation.trim();
    name.strip_suffix('s').unwrap_or(name).to_string()
}

/// Page slug for a monster name: spaces become underscores.
///
/// The wiki spells Cactun as Cactan in its URLs.
pub fn format_monster_for_url(monster: &str) -> String {
    monster.replace(' ', "_").replace("Cactun", "Cactan")
}

/// Species name as stored in the database.
pub fn format_species_name(monster: &str) -> String {
    apply_name_corrections(monster)
}

/// Lowercase form used to recognize the name column on a monster page.
fn normalize_for_comparison(name: &str) -> String {
    apply_name_corrections(&name.replace(['_', '-'], " ")).to_lowercase()
}

/// Candidate page slugs in the order they are tried.
pub fn candidate_slugs(slug: &str, derivation: &str) -> [String; 4] {
    [
        slug.to_string(),
        format!("{}_({})", slug, derivation),
        format!("{}_(Monster)", slug),
        format!("{}_(%3F%3F%3F_Sub)", slug),
    ]
}

/// Derivation names in page order, from every `h2` after the table of contents.
pub fn derivations_from_index(html: &Html) -> Result<Vec<String>> {
    let derivations: Vec<String> = html
        .select(&HEADINGS)
        .skip(1)
        .map(|h| wrangle_derivation_heading(&h.text().collect::<String>()))
        .collect();

    if derivations.is_empty() {
        return Err(Mr3Error::Parse(
            "No derivation headings found on the encyclopedia page".to_string(),
        ));
    }
    Ok(derivations)
}

/// One `region | monster` row of the encyclopedia.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexRow {
    pub region: String,
    pub monster: String,
}

/// Data rows of the encyclopedia tables in page order, header rows excluded.
pub fn index_rows(html: &Html) -> Vec<IndexRow> {
    let mut rows = Vec::new();

    for row in html.select(&ROWS) {
        let text: String = row.text().collect();
        if text.contains(HEADER_MARKER) {
            continue;
        }

        let cells: Vec<String> = row
            .children()
            .filter_map(ElementRef::wrap)
            .filter(|cell| matches!(cell.value().name(), "td" | "th"))
            .map(|cell| cell.text().collect::<String>().trim().to_string())
            .collect();

        let [region, monster, ..] = cells.as_slice() else {
            trace!("Skipping row with {} cells: {:?}", cells.len(), text.trim());
            continue;
        };

        let region = if region == SPECIAL_REGION_CELL {
            "Special".to_string()
        } else {
            region.clone()
        };
        rows.push(IndexRow {
            region,
            monster: monster.clone(),
        });
    }

    rows
}

/// Position in the derivation list while walking the encyclopedia rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WalkState {
    AwaitingDerivationStart,
    InDerivationBlock { index: usize },
}

/// Tracks which derivation the current row belongs to.
struct DerivationWalk<'a> {
    derivations: &'a [String],
    state: WalkState,
}

impl<'a> DerivationWalk<'a> {
    fn new(derivations: &'a [String]) -> Self {
        Self {
            derivations,
            state: WalkState::AwaitingDerivationStart,
        }
    }

    /// Advance to the next derivation when `region` opens a new block.
    fn observe_region(&mut self, region: &str) -> Result<()> {
        if region != FIRST_REGION {
            return Ok(());
        }

        let next = match self.state {
            WalkState::AwaitingDerivationStart => 0,
            WalkState::InDerivationBlock { index } => index + 1,
        };
        if next >= self.derivations.len() {
            return Err(Mr3Error::Parse(format!(
                "Found derivation block {} but only {} derivation headings",
                next + 1,
                self.derivations.len()
            )));
        }
        self.state = WalkState::InDerivationBlock { index: next };
        Ok(())
    }

    /// 1-based id and name of the current derivation.
    fn current(&self) -> Result<(u32, &'a str)> {
        match self.state {
            WalkState::InDerivationBlock { index } => {
                Ok((index as u32 + 1, self.derivations[index].as_str()))
            }
            WalkState::AwaitingDerivationStart => Err(Mr3Error::Parse(format!(
                "Monster row before the first {} row",
                FIRST_REGION
            ))),
        }
    }
}

/// Recognizes the name column of a monster's summary table.
struct NameMatcher {
    variants: [String; 4],
}

impl NameMatcher {
    fn new(slug: &str, derivation: &str, region: &str) -> Self {
        let base = normalize_for_comparison(slug);
        Self {
            variants: [
                format!("{} ({})", base, derivation.to_lowercase()),
                format!("{} ({})", base, region.to_lowercase()),
                format!("{} (???)", base),
                base,
            ],
        }
    }

    fn is_name(&self, cell_text: &str) -> bool {
        let cell = cell_text.to_lowercase();
        self.variants.iter().any(|v| *v == cell)
    }
}

/// A node following the game's cell: stray text between cells, or another cell.
enum Sibling<'a> {
    Text(&'a str),
    Element(ElementRef<'a>),
}

/// First `wikitable` in the article body, if any.
fn summary_table(html: &Html) -> Option<ElementRef<'_>> {
    html.select(&SUMMARY_TABLE).next()
}

fn game_link_selector(game_title: &str) -> Result<Selector> {
    let css = format!("a[title=\"{}\"]", game_title.replace('"', "\\\""));
    Selector::parse(&css).map_err(|e| Mr3Error::Parse(format!("Invalid selector {:?}: {}", css, e)))
}

/// Description cell text from a summary table, or why it could not be found.
fn description_from_table(
    table: ElementRef<'_>,
    game_link: &Selector,
    matcher: &NameMatcher,
) -> std::result::Result<String, &'static str> {
    let link = table.select(game_link).next().ok_or("no row links to the game")?;

    // The link sits inside formatting tags; climb to its cell
    let cell = link
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|e| matches!(e.value().name(), "td" | "th"))
        .ok_or("game link is not inside a table cell")?;

    for node in cell.next_siblings() {
        let sibling = match node.value() {
            Node::Text(text) => Sibling::Text(&**text),
            Node::Element(_) => match ElementRef::wrap(node) {
                Some(element) => Sibling::Element(element),
                None => continue,
            },
            _ => continue,
        };

        match sibling {
            Sibling::Text(text) => trace!("Skipping text between cells: {:?}", text),
            Sibling::Element(element) => {
                let text = element.text().collect::<String>().trim().replace('\n', " ");
                if matcher.is_name(&text) {
                    continue;
                }
                return Ok(text);
            }
        }
    }

    Err("no description cell after the game's name")
}

/// Scrapes every monster listed on the encyclopedia page.
pub struct MonsterScraper<S> {
    source: S,
    config: ScraperConfig,
}

impl<S: PageSource> MonsterScraper<S> {
    pub fn new(source: S, config: ScraperConfig) -> Self {
        Self { source, config }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Fetch the encyclopedia and return its derivation names and data rows.
    pub async fn fetch_index(&self) -> Result<(Vec<String>, Vec<IndexRow>)> {
        let url = self.config.index_url();
        let page = self
            .source
            .fetch(&url)
            .await?
            .ok_or_else(|| Mr3Error::NotFound(url.clone()))?;

        let html = Html::parse_document(&page);
        let derivations = derivations_from_index(&html)?;
        let rows = index_rows(&html);
        info!(
            "Encyclopedia lists {} derivations and {} rows",
            derivations.len(),
            rows.len()
        );
        Ok((derivations, rows))
    }

    /// Find the in-game description of `monster` on its own wiki page.
    pub async fn find_description(&self, monster: &str, derivation: &str, region: &str) -> Result<String> {
        let missing = |reason: &str| Mr3Error::MissingWikiData {
            monster: monster.to_string(),
            reason: reason.to_string(),
        };

        let slug = format_monster_for_url(monster);
        let game_link = game_link_selector(&self.config.game_title)?;
        let matcher = NameMatcher::new(&slug, derivation, region);

        for candidate in candidate_slugs(&slug, derivation) {
            let url = self.config.page_url(&candidate);
            let Some(page) = self.source.fetch(&url).await? else {
                debug!("{} does not exist", url);
                continue;
            };

            let html = Html::parse_document(&page);
            let Some(table) = summary_table(&html) else {
                debug!("No wikitable on {}", url);
                continue;
            };

            debug!("Using summary table from {}", url);
            return description_from_table(table, &game_link, &matcher).map_err(missing);
        }

        Err(missing("no candidate page has a wikitable"))
    }

    /// Collect monsters in encyclopedia order.
    ///
    /// `count` caps how many are collected; 0 means all. `on_monster` is called with the
    /// 1-based running count as each monster is collected.
    pub async fn scrape<F>(&self, count: usize, mut on_monster: F) -> Result<Vec<Monster>>
    where
        F: FnMut(usize, &Monster) -> Result<()>,
    {
        let (derivations, rows) = self.fetch_index().await?;
        let delay = Duration::from_millis(self.config.delay_ms);

        let mut walk = DerivationWalk::new(&derivations);
        let mut monsters = Vec::new();

        for row in rows {
            if count != 0 && monsters.len() == count {
                break;
            }

            let region = region_id(&row.region)?;
            walk.observe_region(&row.region)?;

            if row.monster == NO_MONSTER {
                trace!("No monster for region {}", row.region);
                continue;
            }

            let (derivation_id, derivation) = walk.current()?;

            tokio::time::sleep(delay).await;
            let description = match self.find_description(&row.monster, derivation, &row.region).await {
                Ok(description) => description,
                Err(e @ Mr3Error::MissingWikiData { .. }) if self.config.skip_missing => {
                    warn!("Skipping {}: {}", row.monster, e);
                    continue;
                }
                Err(e) => return Err(e),
            };

            let monster = Monster {
                species: format_species_name(&row.monster),
                derivation_id,
                region_id: region,
                description,
            };
            on_monster(monsters.len() + 1, &monster)?;
            monsters.push(monster);
        }

        info!("Scraped {} monsters", monsters.len());
        Ok(monsters)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;

    const BASE: &str = "https://wiki.test/wiki/";

    /// Pages served from memory, recording every requested URL.
    #[derive(Default)]
    struct StaticPages {
        pages: HashMap<String, String>,
        requests: RefCell<Vec<String>>,
    }

    impl StaticPages {
        fn with(mut self, slug: &str, body: &str) -> Self {
            self.pages.insert(format!("{}{}", BASE, slug), body.to_string());
            self
        }
    }

    impl PageSource for StaticPages {
        async fn fetch(&self, url: &str) -> Result<Option<String>> {
            self.requests.borrow_mut().push(url.to_string());
            Ok(self.pages.get(url).cloned())
        }
    }

    fn test_config() -> ScraperConfig {
        ScraperConfig {
            base_url: BASE.to_string(),
            delay_ms: 0,
            ..ScraperConfig::default()
        }
    }

    const INDEX: &str = r#"<html><body><div id="mw-content-text">
<h2>Contents</h2>
<h2>Bakus (2)</h2>
<table>
<tr><th>Location</th><th>Monster</th></tr>
<tr><td>Brillia</td><td>Baku</td></tr>
<tr><td>Goat</td><td>-</td></tr>
<tr><td>Takrama</td><td>Gobi</td></tr>
</table>
<h2>Beaclons[edit]</h2>
<table>
<tr><th>Location</th><th>Monster</th></tr>
<tr><td>Brillia</td><td>Beaclon</td></tr>
<tr><td>Goat</td><td>-</td></tr>
<tr><td>?</td><td>Cactun</td></tr>
</table>
</div></body></html>"#;

    fn monster_page(name_cell: &str, description: &str) -> String {
        format!(
            r#"<html><body><div class="mw-parser-output">
<table class="wikitable">
<tbody>
<tr><th>Game</th><th>Name</th><th>Description</th></tr>
<tr>
<td><i><a href="/wiki/MR2" title="Monster Rancher 2">MR2</a></i></td>
<td>Old name</td>
<td>Old description</td>
</tr>
<tr>
<td><i><a href="/wiki/MR3" title="Monster Rancher 3">MR3</a></i></td>
<td>{}</td>
<td>{}</td>
</tr>
</tbody>
</table>
</div></body></html>"#,
            name_cell, description
        )
    }

    fn wiki() -> StaticPages {
        StaticPages::default()
            .with("Monster_Rancher_3_Encyclopedia", INDEX)
            .with("Baku", &monster_page("Baku", "\"A big furry loveable monster.\""))
            .with("Gobi_(Baku)", &monster_page("Gobi (Takrama)", "Lives in the\ndesert."))
            .with("Beaclon", "<html><body><div class=\"mw-parser-output\"><p>Disambiguation</p></div></body></html>")
            .with("Beaclon_(Monster)", &monster_page("Beaklon", "Its horn is its pride."))
            .with("Cactan_(%3F%3F%3F_Sub)", &monster_page("Cactan (???)", "Prickly."))
    }

    #[test]
    fn test_wrangle_derivation_heading() {
        assert_eq!(wrangle_derivation_heading("Bakus (30)"), "Baku");
        assert_eq!(wrangle_derivation_heading("  Dragons[edit]  "), "Dragon");
        assert_eq!(wrangle_derivation_heading("Color Pandoras (4)"), "Colorpandora");
        assert_eq!(wrangle_derivation_heading("Hengers"), "Hengar");
        assert_eq!(wrangle_derivation_heading("Zan"), "Zan");
    }

    #[test]
    fn test_format_monster_for_url() {
        assert_eq!(format_monster_for_url("Color Pandora"), "Color_Pandora");
        assert_eq!(format_monster_for_url("Cactun"), "Cactan");
    }

    #[test]
    fn test_format_species_name() {
        assert_eq!(format_species_name("Color Pandora"), "Colorpandora");
        assert_eq!(format_species_name("Beaclon"), "Beaklon");
        assert_eq!(format_species_name("Cactun"), "Cactun");
    }

    #[test]
    fn test_name_matcher_variants() {
        let matcher = NameMatcher::new("Color_Pandora", "Colorpandora", "Goat");
        assert!(matcher.is_name("Colorpandora"));
        assert!(matcher.is_name("Colorpandora (Goat)"));
        assert!(matcher.is_name("COLORPANDORA (COLORPANDORA)"));
        assert!(matcher.is_name("Colorpandora (???)"));
        assert!(!matcher.is_name("A living jigsaw."));
    }

    #[test]
    fn test_candidate_slugs_order() {
        assert_eq!(
            candidate_slugs("Gobi", "Baku"),
            [
                "Gobi".to_string(),
                "Gobi_(Baku)".to_string(),
                "Gobi_(Monster)".to_string(),
                "Gobi_(%3F%3F%3F_Sub)".to_string(),
            ]
        );
    }

    #[test]
    fn test_derivations_from_index() {
        let html = Html::parse_document(INDEX);
        assert_eq!(derivations_from_index(&html).unwrap(), vec!["Baku", "Beaklon"]);

        let empty = Html::parse_document("<div id=\"mw-content-text\"><h2>Contents</h2></div>");
        assert!(derivations_from_index(&empty).is_err());
    }

    #[test]
    fn test_index_rows_skip_headers_and_map_special() {
        let rows = index_rows(&Html::parse_document(INDEX));
        assert_eq!(rows.len(), 6);
        assert_eq!(
            rows[0],
            IndexRow {
                region: "Brillia".to_string(),
                monster: "Baku".to_string()
            }
        );
        assert_eq!(rows[5].region, "Special");
        assert_eq!(rows[5].monster, "Cactun");
    }

    #[test]
    fn test_derivation_walk() {
        let derivations = vec!["Baku".to_string(), "Beaklon".to_string()];
        let mut walk = DerivationWalk::new(&derivations);
        assert!(walk.current().is_err());

        walk.observe_region("Brillia").unwrap();
        assert_eq!(walk.current().unwrap(), (1, "Baku"));
        walk.observe_region("Goat").unwrap();
        walk.observe_region("Takrama").unwrap();
        assert_eq!(walk.current().unwrap(), (1, "Baku"));
        walk.observe_region("Brillia").unwrap();
        assert_eq!(walk.current().unwrap(), (2, "Beaklon"));
        assert!(walk.observe_region("Brillia").is_err());
    }

    #[test]
    fn test_description_skips_name_column() {
        let html = Html::parse_document(&monster_page("Gobi (Takrama)", " Lives in the\ndesert. "));
        let table = summary_table(&html).unwrap();
        let link = game_link_selector("Monster Rancher 3").unwrap();
        let matcher = NameMatcher::new("Gobi", "Baku", "Takrama");
        assert_eq!(
            description_from_table(table, &link, &matcher).unwrap(),
            "Lives in the desert."
        );

        let other_game = game_link_selector("Monster Rancher 4").unwrap();
        assert!(description_from_table(table, &other_game, &matcher).is_err());
    }

    #[tokio::test]
    async fn test_scrape_all_monsters() {
        let scraper = MonsterScraper::new(wiki(), test_config());
        let mut progress = Vec::new();
        let monsters = scraper
            .scrape(0, |n, m| {
                progress.push(format!("Got #{:03}: {}", n, m.summary()?));
                Ok(())
            })
            .await
            .unwrap();

        let summary: Vec<(&str, u32, u32)> = monsters
            .iter()
            .map(|m| (m.species.as_str(), m.derivation_id, m.region_id))
            .collect();
        assert_eq!(
            summary,
            vec![("Baku", 1, 1), ("Gobi", 1, 3), ("Beaklon", 2, 1), ("Cactun", 2, 6)]
        );
        assert_eq!(monsters[0].description, "\"A big furry loveable monster.\"");
        assert_eq!(monsters[1].description, "Lives in the desert.");
        assert_eq!(monsters[2].description, "Its horn is its pride.");
        assert_eq!(monsters[3].description, "Prickly.");

        assert_eq!(progress.len(), 4);
        assert_eq!(
            progress[0],
            "Got #001: Baku | Baku | Brillia | \"A big furry loveable monster.\""
        );
        assert_eq!(progress[3], "Got #004: Cactun | Beaklon | Special | Prickly.");

        let requests = scraper.source().requests.borrow();
        let cactan: Vec<&String> = requests.iter().filter(|u| u.contains("Cactan")).collect();
        assert_eq!(cactan.len(), 4);
        assert!(cactan[1].ends_with("Cactan_(Beaklon)"));
        assert!(cactan[3].ends_with("Cactan_(%3F%3F%3F_Sub)"));
    }

    #[tokio::test]
    async fn test_scrape_respects_count() {
        let scraper = MonsterScraper::new(wiki(), test_config());
        let monsters = scraper.scrape(2, |_, _| Ok(())).await.unwrap();
        assert_eq!(monsters.len(), 2);
        assert_eq!(monsters[1].species, "Gobi");

        let scraper = MonsterScraper::new(wiki(), test_config());
        let monsters = scraper.scrape(50, |_, _| Ok(())).await.unwrap();
        assert_eq!(monsters.len(), 4);
    }

    #[tokio::test]
    async fn test_missing_page_aborts_by_default() {
        let pages = StaticPages::default()
            .with("Monster_Rancher_3_Encyclopedia", INDEX)
            .with("Baku", &monster_page("Baku", "Furry."));
        let scraper = MonsterScraper::new(pages, test_config());
        let err = scraper.scrape(0, |_, _| Ok(())).await.unwrap_err();
        match err {
            Mr3Error::MissingWikiData { monster, .. } => assert_eq!(monster, "Gobi"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_missing_page_skipped_when_configured() {
        let pages = StaticPages::default()
            .with("Monster_Rancher_3_Encyclopedia", INDEX)
            .with("Baku", &monster_page("Baku", "Furry."));
        let config = ScraperConfig {
            skip_missing: true,
            ..test_config()
        };
        let scraper = MonsterScraper::new(pages, config);
        let monsters = scraper.scrape(0, |_, _| Ok(())).await.unwrap();
        assert_eq!(monsters.len(), 1);
        assert_eq!(monsters[0].species, "Baku");
    }

    #[tokio::test]
    async fn test_missing_index_is_not_found() {
        let scraper = MonsterScraper::new(StaticPages::default(), test_config());
        assert!(matches!(
            scraper.scrape(0, |_, _| Ok(())).await,
            Err(Mr3Error::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_row_before_brillia_is_error() {
        let index = r#"<div id="mw-content-text"><h2>Contents</h2><h2>Bakus</h2>
<table><tr><td>Goat</td><td>Gobi</td></tr></table></div>"#;
        let pages = StaticPages::default().with("Monster_Rancher_3_Encyclopedia", index);
        let scraper = MonsterScraper::new(pages, test_config());
        assert!(matches!(
            scraper.scrape(0, |_, _| Ok(())).await,
            Err(Mr3Error::Parse(_))
        ));
    }
}
