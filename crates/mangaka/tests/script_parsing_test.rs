//! Parsing tests against realistic text-model output.

use mangaka::script::DEFAULT_DESCRIPTION;
use mangaka::{MangaError, ScriptParseError, parse_script, validate_panel_count};

const SIX_PANEL_SCRIPT: &str = r#"Here is a manga about the water cycle!

Panel 1:
Description: A sunny ocean. A tiny water droplet named Drip wakes up on a wave.
Dialogue: DRIP: What a beautiful morning!
SFX: SPLASH

Panel 2:
Description: Drip floats upward as heat shimmers rise from the sea.
Dialogue: DRIP: Whoa, I'm turning into vapor!
SFX: FWOOSH

Panel 3:
Description: Drip joins thousands of droplets inside a fluffy cloud.
Dialogue: CLOUD: Welcome aboard, little one.

Panel 4:
Description: The cloud darkens and grows heavy over a mountain range.
Dialogue: DRIP: It's getting crowded in here...
SFX: RUMBLE

Panel 5:
Description: Drip falls as rain onto a pine forest.
Dialogue: DRIP: Wheee!
SFX: PITTER PATTER

Panel 6:
Description: Drip flows down a river back toward the ocean, smiling.
Dialogue: DRIP: Quiz time! What do we call water falling from clouds?
SFX: GURGLE
"#;

#[test]
fn test_six_panel_script_with_missing_sfx() {
    let panels = parse_script(SIX_PANEL_SCRIPT).unwrap();

    assert_eq!(panels.len(), 6);
    let numbers: Vec<u32> = panels.iter().map(|p| p.panel).collect();
    assert_eq!(numbers, vec![1, 2, 3, 4, 5, 6]);

    let third = &panels[2];
    assert_eq!(third.panel, 3);
    assert_eq!(
        third.description,
        "Drip joins thousands of droplets inside a fluffy cloud."
    );
    assert_eq!(third.dialogue, "CLOUD: Welcome aboard, little one.");
    assert_eq!(third.sfx, None);

    for (i, panel) in panels.iter().enumerate() {
        assert_ne!(panel.description, DEFAULT_DESCRIPTION, "panel index {i}");
        assert!(!panel.dialogue.is_empty(), "panel index {i}");
        if i != 2 {
            assert!(panel.sfx.is_some(), "panel index {i} should carry SFX");
        }
    }

    assert_eq!(panels[0].sfx.as_deref(), Some("SPLASH"));
    assert_eq!(panels[4].sfx.as_deref(), Some("PITTER PATTER"));
    assert!(validate_panel_count(&panels, 4).is_ok());
}

#[test]
fn test_k_markers_yield_k_sorted_records() {
    for k in 1..=8u32 {
        let text: String = (1..=k)
            .rev()
            .map(|n| format!("Panel {n}:\nDescription: scene {n}\nDialogue: line {n}\n\n"))
            .collect();

        let panels = parse_script(&text).unwrap();
        assert_eq!(panels.len(), k as usize);
        assert!(panels.windows(2).all(|w| w[0].panel <= w[1].panel));
        assert_eq!(panels[0].description, "scene 1");
    }
}

#[test]
fn test_malformed_block_does_not_abort_others() {
    let text = "Panel 1:\nDescription: first\n\nPanel 0:\nDescription: broken\n\nPanel 2:\nDescription: second";
    let panels = parse_script(text).unwrap();

    let descriptions: Vec<&str> = panels.iter().map(|p| p.description.as_str()).collect();
    assert_eq!(descriptions, vec!["first", "second"]);
}

#[test]
fn test_unlabeled_blocks_degrade_to_defaults() {
    let text = "Panel 1:\nJust some free text without labels.\nPanel 2:\nSFX: BANG";
    let panels = parse_script(text).unwrap();

    assert_eq!(panels[0].description, DEFAULT_DESCRIPTION);
    assert_eq!(panels[0].dialogue, "");
    assert_eq!(panels[0].sfx, None);
    assert_eq!(panels[1].description, DEFAULT_DESCRIPTION);
    assert_eq!(panels[1].sfx.as_deref(), Some("BANG"));
}

#[test]
fn test_failures_are_parse_errors() {
    assert!(matches!(parse_script(""), Err(ScriptParseError::NoPanelsFound)));
    assert!(parse_script("no markers here").is_err());
}

#[test]
fn test_short_script_fails_validation() {
    let text = "Panel 1:\nDescription: a\nPanel 2:\nDescription: b\nPanel 3:\nDescription: c";
    let panels = parse_script(text).unwrap();

    let err = validate_panel_count(&panels, 4).unwrap_err();
    assert!(matches!(
        err,
        MangaError::InsufficientPanels {
            found: 3,
            required: 4
        }
    ));
}
