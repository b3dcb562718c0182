use super::error::ScriptParseError;
use crate::panel::PanelScript;
use log::debug;
use regex::Regex;
use std::sync::LazyLock;

/// Placeholder used when a panel block carries no usable `Description:` section.
pub const DEFAULT_DESCRIPTION: &str = "No description provided.";

// Markdown emphasis (`**Panel 1:**`, `## Panel 1:`) is tolerated around markers and labels.
static PANEL_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)^[ \t]*[*_#>]*[ \t]*panel[ \t]+(\d+)[ \t]*[*_]*[ \t]*:")
        .expect("panel marker pattern is valid")
});

// Same shape as PANEL_MARKER without the line anchor.
static INLINE_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bpanel[ \t]+\d+[ \t]*[*_]*[ \t]*:").expect("inline marker pattern is valid")
});

static DESCRIPTION_LABEL: LazyLock<Regex> = LazyLock::new(|| label_pattern("description"));
static DIALOGUE_LABEL: LazyLock<Regex> = LazyLock::new(|| label_pattern("dialogue"));
static SFX_LABEL: LazyLock<Regex> = LazyLock::new(|| label_pattern("sfx"));

static DEFAULT_PARSER: LazyLock<ScriptParser> = LazyLock::new(ScriptParser::new);

fn label_pattern(label: &str) -> Regex {
    let pattern = format!(
        r"(?i)[*_]*\b{label}[ \t]*[*_]*[ \t]*:[*_]*",
        label = regex::escape(label)
    );
    Regex::new(&pattern).expect("label pattern is valid")
}

/// Parses a raw script into panel records using the shared default parser.
///
/// See [`ScriptParser::parse`] for the exact rules.
pub fn parse_script(text: &str) -> Result<Vec<PanelScript>, ScriptParseError> {
    DEFAULT_PARSER.parse(text)
}

/// Decomposes a multi-panel script into ordered [`PanelScript`] records.
#[derive(Debug, Clone, Default)]
pub struct ScriptParser {
    debug_mode: bool,
}

impl ScriptParser {
    pub fn new() -> Self {
        Self { debug_mode: false }
    }

    pub fn with_debug(mut self) -> Self {
        self.debug_mode = true;
        self
    }

    /// Parses `text` into panel records sorted ascending by panel number.
    ///
    /// A block whose panel number is missing or zero is dropped without
    /// affecting the others. Duplicate panel numbers are kept in the order
    /// they appear.
    ///
    /// # Errors
    ///
    /// - [`ScriptParseError::NoPanelsFound`] when the text holds no non-blank block.
    /// - [`ScriptParseError::NoExtractableData`] when every block was dropped.
    pub fn parse(&self, text: &str) -> Result<Vec<PanelScript>, ScriptParseError> {
        let blocks = self.split_blocks(text);
        if blocks.is_empty() {
            return Err(ScriptParseError::NoPanelsFound);
        }

        let mut panels: Vec<PanelScript> = blocks
            .iter()
            .filter_map(|block| self.parse_block(block))
            .collect();

        if panels.is_empty() {
            return Err(ScriptParseError::NoExtractableData);
        }

        // `sort_by_key` is stable, so duplicates keep their block order.
        panels.sort_by_key(|p| p.panel);

        if self.debug_mode {
            debug!(
                "Parsed {} panel(s) from {} block(s)",
                panels.len(),
                blocks.len()
            );
        }

        Ok(panels)
    }

    /// Splits `text` at every panel marker line, keeping each marker at the
    /// start of its block. Text before the first marker forms its own block.
    /// Blank blocks are discarded.
    pub fn split_blocks<'a>(&self, text: &'a str) -> Vec<&'a str> {
        let mut boundaries: Vec<usize> = PANEL_MARKER.find_iter(text).map(|m| m.start()).collect();
        if boundaries.first() != Some(&0) {
            boundaries.insert(0, 0);
        }
        boundaries.push(text.len());

        boundaries
            .windows(2)
            .map(|w| &text[w[0]..w[1]])
            .filter(|block| !block.trim().is_empty())
            .collect()
    }

    fn parse_block(&self, block: &str) -> Option<PanelScript> {
        let panel = Self::extract_ordinal(block);
        if panel == 0 {
            if self.debug_mode {
                debug!("Dropping block without a usable panel number: {:?}", block.trim());
            }
            return None;
        }
        Self::note_inline_markers(panel, block);

        let description = extract_section(block, &DESCRIPTION_LABEL, &[&DIALOGUE_LABEL, &SFX_LABEL])
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_DESCRIPTION)
            .to_string();

        let dialogue = extract_section(block, &DIALOGUE_LABEL, &[&SFX_LABEL])
            .unwrap_or_default()
            .to_string();

        let sfx = extract_section(block, &SFX_LABEL, &[])
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        Some(PanelScript {
            panel,
            description,
            dialogue,
            sfx,
        })
    }

    /// Markers that do not start a line never split a block, so their text
    /// ends up inside a field of the surrounding panel.
    fn note_inline_markers(panel: u32, block: &str) {
        let body_start = PANEL_MARKER.find(block).map_or(0, |m| m.end());
        for marker in INLINE_MARKER.find_iter(&block[body_start..]) {
            debug!(
                "Panel {panel}: mid-line marker {:?} kept as field text",
                marker.as_str()
            );
        }
    }

    /// Returns the declared panel number, or 0 when it is absent or unparsable.
    fn extract_ordinal(block: &str) -> u32 {
        PANEL_MARKER
            .captures(block)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse::<u32>().ok())
            .unwrap_or(0)
    }
}

/// Returns the trimmed text after `label`, bounded by the first following
/// terminator label or the end of the block.
fn extract_section<'a>(block: &'a str, label: &Regex, terminators: &[&Regex]) -> Option<&'a str> {
    let start = label.find(block)?.end();
    let rest = &block[start..];
    let end = terminators
        .iter()
        .filter_map(|t| t.find(rest))
        .map(|m| m.start())
        .min()
        .unwrap_or(rest.len());
    Some(rest[..end].trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_single_panel() {
        let text = "Panel 1:\nDescription: A cat on a roof.\nDialogue: Meow?\nSFX: CREAK";
        let panels = parse_script(text).unwrap();

        assert_eq!(panels.len(), 1);
        assert_eq!(panels[0].panel, 1);
        assert_eq!(panels[0].description, "A cat on a roof.");
        assert_eq!(panels[0].dialogue, "Meow?");
        assert_eq!(panels[0].sfx.as_deref(), Some("CREAK"));
    }

    #[test]
    fn test_parse_empty_input() {
        assert_eq!(parse_script(""), Err(ScriptParseError::NoPanelsFound));
        assert_eq!(parse_script("   \n\t "), Err(ScriptParseError::NoPanelsFound));
    }

    #[test]
    fn test_parse_text_without_markers() {
        let result = parse_script("no markers here");
        assert_eq!(result, Err(ScriptParseError::NoExtractableData));
    }

    #[test]
    fn test_zero_ordinal_block_is_dropped() {
        let text = "Panel 0:\nDescription: Invisible.\nPanel 2:\nDescription: Visible.";
        let panels = parse_script(text).unwrap();

        assert_eq!(panels.len(), 1);
        assert_eq!(panels[0].panel, 2);
        assert_eq!(panels[0].description, "Visible.");
    }

    #[test]
    fn test_only_zero_ordinals_fails() {
        let text = "Panel 0:\nDescription: Nothing to see.";
        assert_eq!(parse_script(text), Err(ScriptParseError::NoExtractableData));
    }

    #[test]
    fn test_overflowing_ordinal_is_dropped() {
        let text = "Panel 99999999999:\nDescription: Too big.\nPanel 1:\nDescription: Fine.";
        let panels = parse_script(text).unwrap();
        assert_eq!(panels.len(), 1);
        assert_eq!(panels[0].panel, 1);
    }

    #[test]
    fn test_out_of_order_panels_are_sorted() {
        let text = "Panel 3:\nDescription: c\nPanel 1:\nDescription: a\nPanel 2:\nDescription: b";
        let panels = parse_script(text).unwrap();
        let order: Vec<u32> = panels.iter().map(|p| p.panel).collect();
        assert_eq!(order, vec![1, 2, 3]);
        assert_eq!(panels[0].description, "a");
    }

    #[test]
    fn test_duplicate_panels_keep_appearance_order() {
        let text = "Panel 2:\nDescription: first two\nPanel 1:\nDescription: one\nPanel 2:\nDescription: second two";
        let panels = parse_script(text).unwrap();

        assert_eq!(panels.len(), 3);
        assert_eq!(panels[1].description, "first two");
        assert_eq!(panels[2].description, "second two");
    }

    #[test]
    fn test_missing_description_uses_placeholder() {
        let text = "Panel 1:\nDialogue: Hello";
        let panels = parse_script(text).unwrap();
        assert_eq!(panels[0].description, DEFAULT_DESCRIPTION);
        assert_eq!(panels[0].dialogue, "Hello");
    }

    #[test]
    fn test_missing_dialogue_is_empty() {
        let text = "Panel 1:\nDescription: Silence.";
        let panels = parse_script(text).unwrap();
        assert_eq!(panels[0].dialogue, "");
        assert_eq!(panels[0].sfx, None);
    }

    #[test]
    fn test_empty_sfx_is_absent() {
        let text = "Panel 1:\nDescription: Quiet.\nDialogue: ...\nSFX:   \n";
        let panels = parse_script(text).unwrap();
        assert_eq!(panels[0].sfx, None);
    }

    #[test]
    fn test_labels_are_case_insensitive() {
        let text = "PANEL 1:\ndescription: lower\nDIALOGUE: upper\nsfx: bam";
        let panels = parse_script(text).unwrap();
        assert_eq!(panels[0].panel, 1);
        assert_eq!(panels[0].description, "lower");
        assert_eq!(panels[0].dialogue, "upper");
        assert_eq!(panels[0].sfx.as_deref(), Some("bam"));
    }

    #[test]
    fn test_multiline_description() {
        let text = "Panel 1:\nDescription: A long scene\nthat spans lines.\nDialogue: Hi";
        let panels = parse_script(text).unwrap();
        assert_eq!(panels[0].description, "A long scene\nthat spans lines.");
    }

    #[test]
    fn test_description_bounded_by_sfx_when_dialogue_missing() {
        let text = "Panel 1:\nDescription: Explosion.\nSFX: BOOM";
        let panels = parse_script(text).unwrap();
        assert_eq!(panels[0].description, "Explosion.");
        assert_eq!(panels[0].dialogue, "");
        assert_eq!(panels[0].sfx.as_deref(), Some("BOOM"));
    }

    #[test]
    fn test_markdown_emphasis_is_tolerated() {
        let text = "**Panel 1:**\n**Description:** A hero.\n**Dialogue:** \"Onward!\"\n**SFX:** ZOOM";
        let panels = parse_script(text).unwrap();
        assert_eq!(panels[0].panel, 1);
        assert_eq!(panels[0].description, "A hero.");
        assert_eq!(panels[0].dialogue, "\"Onward!\"");
        assert_eq!(panels[0].sfx.as_deref(), Some("ZOOM"));
    }

    #[test]
    fn test_preamble_is_ignored() {
        let text = "Sure! Here is your manga:\n\nPanel 1:\nDescription: Start.";
        let parser = ScriptParser::new();
        assert_eq!(parser.split_blocks(text).len(), 2);

        let panels = parser.parse(text).unwrap();
        assert_eq!(panels.len(), 1);
        assert_eq!(panels[0].description, "Start.");
    }

    #[test]
    fn test_split_blocks_keeps_marker() {
        let text = "Panel 1:\nDescription: a\nPanel 2:\nDescription: b\n";
        let blocks = ScriptParser::new().split_blocks(text);
        assert_eq!(blocks.len(), 2);
        assert!(blocks[0].starts_with("Panel 1:"));
        assert!(blocks[1].starts_with("Panel 2:"));
    }

    #[test]
    fn test_mid_line_marker_stays_in_field() {
        let text = "Panel 1: Description: a Dialogue: x Panel 2: Description: b";
        let panels = parse_script(text).unwrap();

        assert_eq!(panels.len(), 1);
        assert_eq!(panels[0].description, "a");
        assert_eq!(panels[0].dialogue, "x Panel 2: Description: b");
        assert_eq!(INLINE_MARKER.find_iter(text).count(), 2);
    }
}
